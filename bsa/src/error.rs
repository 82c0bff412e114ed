/// Errors produced while parsing or extracting a BSA/BA2 archive.
///
/// Mirrors the taxonomy every decoder in this crate reports against: a
/// truncated read always bubbles up, an unsupported magic/version is
/// something the front door can recover from by trying another decoder,
/// and everything else is a structural or codec failure tied to one
/// entry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("truncated input: wanted {want} bytes at offset {at}, only {have} available")]
    TruncatedInput { want: usize, have: usize, at: usize },

    #[error("unsupported format: magic {magic:?} version {version}")]
    UnsupportedFormat { magic: [u8; 4], version: u32 },

    #[error("{codec} codec error: {cause}")]
    CodecError { codec: &'static str, cause: String },

    #[error("schema violation: {detail}")]
    SchemaViolation { detail: String },

    #[error("encoding error at offset {at}")]
    EncodingError { at: usize },
}

impl Error {
    pub fn schema(detail: impl Into<String>) -> Self {
        Error::SchemaViolation { detail: detail.into() }
    }
}

