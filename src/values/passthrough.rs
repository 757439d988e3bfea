//! Types without delta semantics. Anchor and factor are written but ignored, and
//! any granularity or monotonicity setting is accepted and has no effect.

use std::io::Cursor;

use bitvec::prelude::*;

use crate::config::{Granularity, Monotonicity};
use crate::error::DeltaCodecError;
use crate::kernels::leb128;
use crate::traits::{DeltaEncoding, DeltaValue};
use crate::types::DeltaDataType;
use crate::utils::{take_array, take_bytes};

use super::truncated;

//==================================================================================
// 1. Booleans (bit-packed)
//==================================================================================

impl DeltaValue for bool {
    type Factor = ();
    const DATA_TYPE: DeltaDataType = DeltaDataType::Boolean;

    fn write_scalar(&self, buf: &mut Vec<u8>) {
        buf.push(u8::from(*self));
    }

    fn read_scalar(cursor: &mut Cursor<&[u8]>) -> Result<Self, DeltaCodecError> {
        match take_array::<1>(cursor) {
            Some([0]) => Ok(false),
            Some([1]) => Ok(true),
            Some([other]) => Err(DeltaCodecError::CorruptData(format!(
                "invalid boolean byte {}",
                other
            ))),
            None => Err(truncated("scalar", Self::DATA_TYPE)),
        }
    }

    fn write_factor(_factor: &(), _buf: &mut Vec<u8>) {}

    fn read_factor(_cursor: &mut Cursor<&[u8]>) -> Result<(), DeltaCodecError> {
        Ok(())
    }

    fn factor_from_granularity(_granularity: &Granularity) -> Result<(), DeltaCodecError> {
        Ok(())
    }

    fn encode_deltas(
        block: &[Self],
        _anchor: &Self,
        _granularity: Option<&()>,
        _monotonicity: Monotonicity,
    ) -> Result<DeltaEncoding<()>, DeltaCodecError> {
        let bits: BitVec<u8, Lsb0> = block.iter().copied().collect();
        Ok(DeltaEncoding::plain(bits.into_vec()))
    }

    fn decode_deltas(
        _anchor: &Self,
        _factor: Option<&()>,
        _monotonicity: Monotonicity,
        count: usize,
        payload: &[u8],
    ) -> Result<Vec<Self>, DeltaCodecError> {
        if payload.len() != count.div_ceil(8) {
            return Err(DeltaCodecError::CorruptData(format!(
                "expected {} bytes for {} packed booleans, found {}",
                count.div_ceil(8),
                count,
                payload.len()
            )));
        }
        let bits = payload.view_bits::<Lsb0>();
        Ok(bits.iter().by_vals().take(count).collect())
    }
}

//==================================================================================
// 2. Text (length-prefixed UTF-8)
//==================================================================================

/// LEB128 length prefix, read back by `leb128::decode_one`.
fn write_len_prefix(mut len: u64, buf: &mut Vec<u8>) {
    while len >= 0x80 {
        buf.push((len as u8 & 0x7F) | 0x80);
        len >>= 7;
    }
    buf.push(len as u8);
}

impl DeltaValue for String {
    type Factor = ();
    const DATA_TYPE: DeltaDataType = DeltaDataType::Text;

    fn write_scalar(&self, buf: &mut Vec<u8>) {
        write_len_prefix(self.len() as u64, buf);
        buf.extend_from_slice(self.as_bytes());
    }

    fn read_scalar(cursor: &mut Cursor<&[u8]>) -> Result<Self, DeltaCodecError> {
        let len: u64 = leb128::decode_one(cursor)
            .map_err(|_| truncated("string length", Self::DATA_TYPE))?;
        let len = usize::try_from(len)
            .map_err(|_| DeltaCodecError::CorruptData(format!("string length {} too large", len)))?;
        let bytes = take_bytes(cursor, len).ok_or_else(|| truncated("string", Self::DATA_TYPE))?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| DeltaCodecError::CorruptData(format!("invalid UTF-8 in text block: {}", e)))
    }

    fn write_factor(_factor: &(), _buf: &mut Vec<u8>) {}

    fn read_factor(_cursor: &mut Cursor<&[u8]>) -> Result<(), DeltaCodecError> {
        Ok(())
    }

    fn factor_from_granularity(_granularity: &Granularity) -> Result<(), DeltaCodecError> {
        Ok(())
    }

    fn encode_deltas(
        block: &[Self],
        _anchor: &Self,
        _granularity: Option<&()>,
        _monotonicity: Monotonicity,
    ) -> Result<DeltaEncoding<()>, DeltaCodecError> {
        let mut bytes = Vec::with_capacity(block.iter().map(|s| s.len() + 1).sum());
        Self::encode_raw(block, &mut bytes);
        Ok(DeltaEncoding::plain(bytes))
    }

    fn decode_deltas(
        _anchor: &Self,
        _factor: Option<&()>,
        _monotonicity: Monotonicity,
        count: usize,
        payload: &[u8],
    ) -> Result<Vec<Self>, DeltaCodecError> {
        Self::decode_raw(count, payload)
    }

    fn raw_size(&self) -> usize {
        self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_packing() {
        let values: Vec<bool> = (0..19).map(|i| i % 3 == 0).collect();
        let encoded = bool::encode_deltas(&values, &true, None, Monotonicity::Increasing).unwrap();
        assert_eq!(encoded.bytes.len(), 3);
        assert_eq!(encoded.monotonicity, Monotonicity::None);
        assert_eq!(encoded.bytes[0], 0b0100_1001);
        let decoded = bool::decode_deltas(&true, None, Monotonicity::None, 19, &encoded.bytes).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_bool_length_mismatch() {
        assert!(bool::decode_deltas(&false, None, Monotonicity::None, 9, &[0xFF]).is_err());
        assert!(bool::decode_deltas(&false, None, Monotonicity::None, 0, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_bool_scalar_rejects_garbage() {
        let mut cursor = Cursor::new(&[2u8][..]);
        assert!(matches!(bool::read_scalar(&mut cursor), Err(DeltaCodecError::CorruptData(_))));
    }

    #[test]
    fn test_text_roundtrip() {
        let values: Vec<String> = vec!["".into(), "héllo".into(), "wörld 🌍".into(), "x".repeat(300)];
        let encoded = String::encode_deltas(&values, &values[0], None, Monotonicity::None).unwrap();
        let decoded =
            String::decode_deltas(&values[0], None, Monotonicity::None, values.len(), &encoded.bytes).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_text_length_prefix_matches_leb128() {
        for len in [0usize, 1, 127, 128, 300, 16_384] {
            let text = "x".repeat(len);
            let mut buf = Vec::new();
            text.write_scalar(&mut buf);
            let mut expected = Vec::new();
            leb128::encode_one(len as u64, &mut expected).unwrap();
            assert_eq!(&buf[..expected.len()], &expected[..]);
            let mut cursor = Cursor::new(&buf[..]);
            assert_eq!(String::read_scalar(&mut cursor).unwrap(), text);
        }
    }

    #[test]
    fn test_text_invalid_utf8_is_corrupt() {
        let payload = [2u8, 0xC3, 0x28];
        let result = String::decode_deltas(&String::new(), None, Monotonicity::None, 1, &payload);
        assert!(matches!(result, Err(DeltaCodecError::CorruptData(msg)) if msg.contains("UTF-8")));
    }

    #[test]
    fn test_text_truncated_is_corrupt() {
        let payload = [5u8, b'a', b'b'];
        let result = String::decode_deltas(&String::new(), None, Monotonicity::None, 1, &payload);
        assert!(matches!(result, Err(DeltaCodecError::CorruptData(_))));
    }
}
