//! Raw DEFLATE via `flate2`. This is the default finisher.

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use super::Finisher;
use crate::config::CompressionLevel;
use crate::error::DeltaCodecError;

#[derive(Debug, Default, Clone, Copy)]
pub struct DeflateFinisher;

fn deflate_error(e: std::io::Error) -> DeltaCodecError {
    DeltaCodecError::Finisher {
        finisher: "deflate",
        message: e.to_string(),
    }
}

impl Finisher for DeflateFinisher {
    fn name(&self) -> &'static str {
        "deflate"
    }

    fn compress(&self, input: &[u8], level: CompressionLevel) -> Result<Vec<u8>, DeltaCodecError> {
        let compression = match level {
            CompressionLevel::Optimal => Compression::best(),
            CompressionLevel::Fastest | CompressionLevel::NoCompression => Compression::fast(),
        };
        let mut encoder = DeflateEncoder::new(Vec::with_capacity(input.len() / 2 + 16), compression);
        encoder.write_all(input).map_err(deflate_error)?;
        encoder.finish().map_err(deflate_error)
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, DeltaCodecError> {
        let mut decoder = DeflateDecoder::new(input);
        let mut output = Vec::with_capacity(input.len() * 4);
        decoder.read_to_end(&mut output).map_err(deflate_error)?;
        Ok(output)
    }
}
