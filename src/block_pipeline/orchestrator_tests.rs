//! Unit tests for the per-vector fan-out and reassembly.

use super::*;
use crate::block_pipeline::partition::OrderedRangeFactory;
use crate::config::{CompressionLevel, FinisherKind, Monotonicity, TransformKind};
use crate::finishers::finisher_for;

fn ctx() -> PipelineContext {
    PipelineContext::new(finisher_for(FinisherKind::Deflate), TransformKind::Delta)
}

fn encode_i64(values: &[i64], num_blocks: usize) -> Vec<Vec<u8>> {
    let ranges = OrderedRangeFactory::create(0, values.len(), num_blocks).unwrap();
    let settings = BlockSettings {
        level: CompressionLevel::Fastest,
        granularity: None,
        monotonicity: Monotonicity::Increasing,
    };
    encode_vector(values, &ranges, &settings, &ctx(), 0).unwrap()
}

#[test]
fn test_clamp_num_blocks() {
    assert_eq!(clamp_num_blocks(0, 64), 1);
    assert_eq!(clamp_num_blocks(8, 64), 8);
    assert_eq!(clamp_num_blocks(1_000, 64), 64);
    assert_eq!(clamp_num_blocks(5, 0), 1);
}

#[test]
fn test_vector_roundtrip_across_block_counts() {
    let values: Vec<i64> = (0..10_007).map(|i| i * 3 + (i % 5)).collect();
    for num_blocks in [1, 2, 7, 64] {
        let blocks = encode_i64(&values, num_blocks);
        assert_eq!(blocks.len(), num_blocks);
        let slices: Vec<&[u8]> = blocks.iter().map(Vec::as_slice).collect();
        let decoded: Vec<i64> = decode_vector(&slices, &ctx(), 0).unwrap();
        assert_eq!(decoded, values);
    }
}

#[test]
fn test_blocks_are_placed_by_recorded_index() {
    let values: Vec<i64> = (0..100).collect();
    let blocks = encode_i64(&values, 4);
    let shuffled: Vec<&[u8]> = [2, 0, 3, 1].iter().map(|&i| blocks[i].as_slice()).collect();
    let decoded: Vec<i64> = decode_vector(&shuffled, &ctx(), 0).unwrap();
    assert_eq!(decoded, values);
}

#[test]
fn test_duplicate_block_index_is_corrupt() {
    let values: Vec<i64> = (0..100).collect();
    let blocks = encode_i64(&values, 2);
    let duplicated: Vec<&[u8]> = vec![blocks[0].as_slice(), blocks[0].as_slice()];
    let err = decode_vector::<i64>(&duplicated, &ctx(), 0).unwrap_err();
    assert!(matches!(err, DeltaCodecError::CorruptData(_)));
}

#[test]
fn test_out_of_range_block_index_is_corrupt() {
    let values: Vec<i64> = (0..100).collect();
    let blocks = encode_i64(&values, 2);
    let only_second: Vec<&[u8]> = vec![blocks[1].as_slice()];
    let err = decode_vector::<i64>(&only_second, &ctx(), 0).unwrap_err();
    assert!(matches!(err, DeltaCodecError::CorruptData(_)));
}

#[test]
fn test_block_failures_carry_their_position() {
    let values: Vec<i64> = (0..100).collect();
    let mut blocks = encode_i64(&values, 3);
    let last = blocks[1].len() - 1;
    blocks[1][last] ^= 0xFF;
    blocks[1].push(0);
    let slices: Vec<&[u8]> = blocks.iter().map(Vec::as_slice).collect();

    let err = decode_vector::<i64>(&slices, &ctx(), 5).unwrap_err();
    match &err {
        DeltaCodecError::BlockFailure { stage, vector, block, .. } => {
            assert_eq!(*stage, "decode");
            assert_eq!(*vector, 5);
            assert_eq!(*block, 1);
        }
        other => panic!("expected a block failure, got {:?}", other),
    }
    assert!(matches!(err.root_cause(), DeltaCodecError::CorruptData(_)));
}

#[test]
fn test_wrong_element_type_is_reported() {
    let values: Vec<i64> = (0..10).collect();
    let blocks = encode_i64(&values, 1);
    let slices: Vec<&[u8]> = blocks.iter().map(Vec::as_slice).collect();
    let err = decode_vector::<f64>(&slices, &ctx(), 0).unwrap_err();
    assert!(matches!(err.root_cause(), DeltaCodecError::TypeMismatch { .. }));
}
