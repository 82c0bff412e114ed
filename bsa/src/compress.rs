use std::io::Read;

use crate::error::Error;

/// The two codecs a Bethesda archive can compress an entry with, chosen
/// once per entry by the caller (archive version for BSA, always zlib for
/// BA2) rather than dispatched through a trait object per spec.md §9's
/// "Codec sum type" redesign note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Zlib,
    Lz4,
}

impl Codec {
    pub fn name(&self) -> &'static str {
        match self {
            Codec::Zlib => "zlib",
            Codec::Lz4 => "lz4",
        }
    }

    /// Decompress `data`, logging (not failing) if the result doesn't match
    /// `expected_len` — per spec.md §4.2 step 4, a length mismatch is a
    /// warn-and-continue condition, while an outright codec failure is
    /// fatal to the entry.
    pub fn decompress(&self, data: &[u8], expected_len: usize) -> Result<Vec<u8>, Error> {
        let out = match self {
            Codec::Zlib => {
                let mut decoder = libflate::zlib::Decoder::new(data)
                    .map_err(|e| Error::CodecError { codec: self.name(), cause: e.to_string() })?;
                let mut out = Vec::with_capacity(expected_len);
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| Error::CodecError { codec: self.name(), cause: e.to_string() })?;
                out
            }
            Codec::Lz4 => {
                let mut decoder = lz4::Decoder::new(data)
                    .map_err(|e| Error::CodecError { codec: self.name(), cause: e.to_string() })?;
                let mut out = Vec::with_capacity(expected_len);
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| Error::CodecError { codec: self.name(), cause: e.to_string() })?;
                out
            }
        };
        if out.len() != expected_len {
            log::warn!(
                "{} decompressed to {} bytes, expected {}",
                self.name(),
                out.len(),
                expected_len
            );
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zlib_round_trip() {
        let original = b"the quick brown fox jumps over the lazy dog".to_vec();
        let mut encoder = libflate::zlib::Encoder::new(Vec::new()).unwrap();
        std::io::Write::write_all(&mut encoder, &original).unwrap();
        let compressed = encoder.finish().into_result().unwrap();

        let decoded = Codec::Zlib.decompress(&compressed, original.len()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn lz4_round_trip() {
        let original = b"the quick brown fox jumps over the lazy dog".to_vec();
        let mut encoder = lz4::EncoderBuilder::new().auto_flush(true).build(Vec::new()).unwrap();
        std::io::Write::write_all(&mut encoder, &original).unwrap();
        let (compressed, result) = encoder.finish();
        result.unwrap();

        let decoded = Codec::Lz4.decompress(&compressed, original.len()).unwrap();
        assert_eq!(decoded, original);
    }
}
