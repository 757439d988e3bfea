//! Unit tests for multi-vector framing, record schemas, and argument families.

use std::sync::{Arc, Mutex};

use super::*;
use crate::block_pipeline::PipelineContext;
use crate::config::{
    CodecConfig, ColumnSettings, CompressionLevel, FinisherKind, Granularity, Monotonicity,
    TransformKind,
};
use crate::error::DeltaCodecError;
use crate::finishers::{finisher_for, Finisher};

#[derive(Debug, Clone, Default, PartialEq)]
struct Tick {
    seq: i64,
    price: f64,
    venue: String,
    is_buy: bool,
}

fn ticks(n: usize) -> Vec<Tick> {
    (0..n)
        .map(|i| Tick {
            seq: 1_000 + i as i64 * 2,
            price: (10_000 + (i % 13) as i64 * 5) as f64 / 100.0,
            venue: ["XNYS", "XNAS", "BATS"][i % 3].to_string(),
            is_buy: i % 4 != 0,
        })
        .collect()
}

fn tick_schema() -> RecordSchema<Tick> {
    RecordSchema::new()
        .column("seq", |t: &Tick| t.seq, |t, v| t.seq = v)
        .column("price", |t: &Tick| t.price, |t, v| t.price = v)
        .column("venue", |t: &Tick| t.venue.clone(), |t, v| t.venue = v)
        .column("is_buy", |t: &Tick| t.is_buy, |t, v| t.is_buy = v)
}

fn finisher() -> Arc<dyn Finisher> {
    finisher_for(FinisherKind::Lz4)
}

fn ctx(transform: TransformKind) -> PipelineContext {
    PipelineContext::new(finisher(), transform)
}

fn settings(n: usize) -> Vec<ColumnSettings> {
    vec![ColumnSettings::new(CompressionLevel::Fastest); n]
}

//==================================================================================
// 1. Frame Encoding
//==================================================================================

#[test]
fn test_single_vector_frame_roundtrip() {
    let values: Vec<u32> = (0..5_000).map(|i| i * 7).collect();
    let settings = ColumnSettings::new(CompressionLevel::Optimal).with_monotonicity(Monotonicity::Increasing);
    let vectors: Vec<Box<dyn VectorEncoder + '_>> = vec![Box::new(TypedVector::borrowed(&values, &settings).unwrap())];
    let bytes = encode_frame(&vectors, 6, 64, &ctx(TransformKind::Delta)).unwrap();

    let reader = FrameReader::open(&bytes, 1, finisher()).unwrap();
    assert_eq!(reader.num_blocks_per_vector(), 6);
    assert_eq!(reader.decode_vector::<u32>(0).unwrap(), values);
    assert!(reader.decode_vector::<u32>(1).is_err());
}

#[test]
fn test_requested_blocks_are_clamped() {
    let values: Vec<i16> = (0..100).collect();
    let s = ColumnSettings::default();
    let vectors: Vec<Box<dyn VectorEncoder + '_>> = vec![Box::new(TypedVector::borrowed(&values, &s).unwrap())];

    let bytes = encode_frame(&vectors, 500, 8, &ctx(TransformKind::Delta)).unwrap();
    assert_eq!(FrameReader::open(&bytes, 1, finisher()).unwrap().num_blocks_per_vector(), 8);

    let bytes = encode_frame(&vectors, 0, 8, &ctx(TransformKind::Delta)).unwrap();
    assert_eq!(FrameReader::open(&bytes, 1, finisher()).unwrap().num_blocks_per_vector(), 1);
}

#[test]
#[cfg(target_pointer_width = "64")]
fn test_block_count_beyond_the_header_range_is_rejected() {
    let values: Vec<i16> = (0..10).collect();
    let s = ColumnSettings::default();
    let vectors: Vec<Box<dyn VectorEncoder + '_>> = vec![Box::new(TypedVector::borrowed(&values, &s).unwrap())];
    let result = encode_frame(&vectors, usize::MAX, usize::MAX, &ctx(TransformKind::Delta));
    assert!(matches!(result, Err(DeltaCodecError::InvalidArgument(msg)) if msg.contains("blocks per vector")));
}

#[test]
fn test_vectors_must_share_a_length() {
    let a: Vec<i64> = vec![1, 2, 3];
    let b: Vec<i64> = vec![1, 2];
    let s = ColumnSettings::default();
    let vectors: Vec<Box<dyn VectorEncoder + '_>> = vec![
        Box::new(TypedVector::borrowed(&a, &s).unwrap()),
        Box::new(TypedVector::borrowed(&b, &s).unwrap()),
    ];
    assert!(matches!(
        encode_frame(&vectors, 2, 64, &ctx(TransformKind::Delta)),
        Err(DeltaCodecError::InvalidArgument(_))
    ));
    assert!(matches!(
        encode_frame(&[], 2, 64, &ctx(TransformKind::Delta)),
        Err(DeltaCodecError::InvalidArgument(_))
    ));
}

#[test]
fn test_wrong_granularity_kind_is_invalid_argument() {
    let values: Vec<i32> = vec![1, 2, 3];
    let s = ColumnSettings::new(CompressionLevel::Fastest).with_granularity(0.5f64);
    assert!(matches!(
        TypedVector::borrowed(&values, &s),
        Err(DeltaCodecError::InvalidArgument(_))
    ));
}

#[test]
fn test_null_transform_is_read_from_the_frame() {
    let values: Vec<f64> = (0..300).map(|i| i as f64 * 0.5).collect();
    let s = ColumnSettings::default();
    let vectors: Vec<Box<dyn VectorEncoder + '_>> = vec![Box::new(TypedVector::borrowed(&values, &s).unwrap())];
    let bytes = encode_frame(&vectors, 3, 64, &ctx(TransformKind::Null)).unwrap();

    let info = crate::block_pipeline::frame::read_frame_header(&bytes).unwrap();
    assert!(info.is_null_transform());
    let reader = FrameReader::open(&bytes, 1, finisher()).unwrap();
    assert_eq!(reader.decode_vector::<f64>(0).unwrap(), values);
}

//==================================================================================
// 2. Record Schemas
//==================================================================================

#[test]
fn test_record_roundtrip_across_block_counts() {
    let records = ticks(2_001);
    let schema = tick_schema();
    for num_blocks in [1, 4, 9] {
        let bytes = encode_records(&records, &schema, &settings(4), num_blocks, 64, &ctx(TransformKind::Delta)).unwrap();
        let decoded: Vec<Tick> = decode_records(&bytes, &schema, finisher()).unwrap();
        assert_eq!(decoded, records);
    }
}

#[test]
fn test_records_are_read_in_a_single_pass() {
    let visits: Arc<Mutex<Vec<(i64, &'static str)>>> = Arc::new(Mutex::new(Vec::new()));
    let (seq_log, price_log) = (visits.clone(), visits.clone());
    let schema = RecordSchema::new()
        .column(
            "seq",
            move |t: &Tick| {
                seq_log.lock().unwrap().push((t.seq, "seq"));
                t.seq
            },
            |t, v| t.seq = v,
        )
        .column(
            "price",
            move |t: &Tick| {
                price_log.lock().unwrap().push((t.seq, "price"));
                t.price
            },
            |t, v| t.price = v,
        );

    let records = ticks(3);
    encode_records(&records, &schema, &settings(2), 2, 64, &ctx(TransformKind::Delta)).unwrap();
    assert_eq!(
        *visits.lock().unwrap(),
        vec![(1_000, "seq"), (1_000, "price"), (1_002, "seq"), (1_002, "price"), (1_004, "seq"), (1_004, "price")]
    );
}

#[test]
fn test_empty_records_roundtrip() {
    let schema = tick_schema();
    let bytes = encode_records(&[], &schema, &settings(4), 4, 64, &ctx(TransformKind::Delta)).unwrap();
    let decoded: Vec<Tick> = decode_records(&bytes, &schema, finisher()).unwrap();
    assert!(decoded.is_empty());
}

#[test]
fn test_schema_validation() {
    let empty: RecordSchema<Tick> = RecordSchema::new();
    assert!(matches!(empty.validate(), Err(DeltaCodecError::InvalidArgument(_))));

    let duplicated = tick_schema().column("seq", |t: &Tick| t.seq, |t, v| t.seq = v);
    assert!(matches!(duplicated.validate(), Err(DeltaCodecError::InvalidArgument(_))));

    let schema = tick_schema();
    assert_eq!(schema.names(), vec!["seq", "price", "venue", "is_buy"]);
    assert!(matches!(
        encode_records(&ticks(3), &schema, &settings(3), 1, 64, &ctx(TransformKind::Delta)),
        Err(DeltaCodecError::InvalidArgument(_))
    ));
}

#[test]
fn test_decoding_with_another_schema_fails() {
    let records = ticks(50);
    let bytes = encode_records(&records, &tick_schema(), &settings(4), 2, 64, &ctx(TransformKind::Delta)).unwrap();

    let narrower: RecordSchema<Tick> = RecordSchema::new()
        .column("seq", |t: &Tick| t.seq, |t, v| t.seq = v)
        .column("price", |t: &Tick| t.price, |t, v| t.price = v);
    let err = decode_records(&bytes, &narrower, finisher()).unwrap_err();
    assert!(matches!(err, DeltaCodecError::FormatError(_)));

    let reordered: RecordSchema<Tick> = RecordSchema::new()
        .column("price", |t: &Tick| t.price, |t, v| t.price = v)
        .column("seq", |t: &Tick| t.seq, |t, v| t.seq = v)
        .column("venue", |t: &Tick| t.venue.clone(), |t, v| t.venue = v)
        .column("is_buy", |t: &Tick| t.is_buy, |t, v| t.is_buy = v);
    let err = decode_records(&bytes, &reordered, finisher()).unwrap_err();
    assert!(matches!(err.root_cause(), DeltaCodecError::TypeMismatch { .. }));
}

#[test]
fn test_raw_byte_size_counts_every_field() {
    let records = ticks(3);
    let schema = tick_schema();
    // 8 (seq) + 8 (price) + 4 (venue) + 1 (is_buy) per record.
    assert_eq!(schema.raw_byte_size(&records), 3 * 21);
}

//==================================================================================
// 3. Argument Families
//==================================================================================

#[test]
fn test_record_args_reset_and_zip() {
    let records = ticks(10);
    let schema = tick_schema();
    let mut args = RecordEncodingArgs::new(&records, 4, &schema, CompressionLevel::Optimal);
    assert_eq!(args.element_count(), 10);
    assert_eq!(args.levels(), vec![CompressionLevel::Optimal; 4]);

    args.set_column(0, ColumnSettings::new(CompressionLevel::Fastest).with_granularity(2i64)).unwrap();
    assert!(args.set_column(4, ColumnSettings::default()).is_err());
    let zipped = args.column_settings().unwrap();
    assert_eq!(zipped[0].granularity, Some(Granularity::Integer(2)));
    assert_eq!(zipped[0].level, CompressionLevel::Fastest);

    args.reset_levels(CompressionLevel::NoCompression);
    args.reset_granularities();
    args.reset_monotonicities(Monotonicity::Increasing);
    assert!(args.levels().iter().all(|l| *l == CompressionLevel::NoCompression));
    assert!(args.granularities().iter().all(Option::is_none));
    assert!(args.monotonicities().iter().all(|m| *m == Monotonicity::Increasing));

    args.monotonicities.pop();
    assert!(matches!(args.column_settings(), Err(DeltaCodecError::InvalidArgument(_))));
}

#[test]
fn test_record_args_from_config() {
    let config = CodecConfig::from_json(
        r#"{
            "default_level": "optimal",
            "columns": { "seq": { "level": "fastest", "monotonicity": "increasing" } }
        }"#,
    )
    .unwrap();
    let records = ticks(4);
    let schema = tick_schema();
    let args = RecordEncodingArgs::from_config(&records, 2, &schema, &config);
    assert_eq!(args.levels[0], CompressionLevel::Fastest);
    assert_eq!(args.monotonicities[0], Monotonicity::Increasing);
    assert_eq!(args.levels[1], CompressionLevel::Optimal);
}

#[test]
fn test_single_and_map_args_describe_their_vectors() {
    let values: Vec<i32> = vec![1, 2, 3];
    let args = EncodingArgs::new(&values, 2, CompressionLevel::Optimal)
        .with_granularity(1i32)
        .with_monotonicity(Monotonicity::Increasing)
        .with_custom(serde_json::json!({ "source": "test" }));
    assert_eq!(args.column_settings().unwrap().len(), 1);
    assert_eq!(args.raw_byte_size(), 12);
    assert_eq!(args.custom().and_then(|c| c["source"].as_str()), Some("test"));

    let map: std::collections::HashMap<u16, f32> = [(1, 0.5), (2, 1.5)].into_iter().collect();
    let mut map_args = MapEncodingArgs::new(&map, 1, CompressionLevel::Fastest);
    map_args.reset_monotonicities(Monotonicity::Decreasing);
    assert_eq!(map_args.element_count(), 2);
    assert_eq!(map_args.monotonicities(), vec![Monotonicity::Decreasing; 2]);
    assert_eq!(map_args.raw_byte_size(), 2 * (2 + 4));
}
