/// Errors produced while walking a plugin file or its schema engine.
///
/// Matches spec.md §7's taxonomy exactly, plus `UnexpectedSubrecord`,
/// which is specific to the schema engine (C3) and carries enough
/// context to explain the rejection.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EspError {
    #[error("truncated input: wanted {want} bytes at offset {at}, only {have} available")]
    TruncatedInput { want: usize, have: usize, at: usize },

    #[error("unsupported format: magic {magic:?} format_version {format_version}")]
    UnsupportedFormat { magic: [u8; 4], format_version: u16 },

    #[error("{codec} codec error: {cause}")]
    CodecError { codec: &'static str, cause: String },

    #[error("schema violation: {detail}")]
    SchemaViolation { detail: String },

    #[error("unexpected subrecord {got} in {record_type} (expected {expected})")]
    UnexpectedSubrecord { expected: String, got: String, record_type: String },

    #[error("encoding error at offset {at}")]
    EncodingError { at: usize },
}

impl EspError {
    pub fn schema(detail: impl Into<String>) -> Self {
        EspError::SchemaViolation { detail: detail.into() }
    }
}
