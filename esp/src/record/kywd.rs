//! `KYWD` (Keyword). Adapted from the teacher's `esp/src/typed/kywd.rs`.

use crate::error::EspError;
use crate::record::{decode_zstr, slot, FieldValue};
use crate::schema::{Cardinality, CollectionDef, SchemaNode};
use crate::types::{Color, EditorId};

fn decode_edid(bytes: &[u8]) -> Result<FieldValue, EspError> {
    Ok(FieldValue::EditorId(EditorId(decode_zstr(bytes)?)))
}

fn decode_cnam(bytes: &[u8]) -> Result<FieldValue, EspError> {
    if bytes.len() != 4 {
        return Err(EspError::schema(format!("CNAM expected 4 bytes, got {}", bytes.len())));
    }
    Ok(FieldValue::Color(Color { r: bytes[0], g: bytes[1], b: bytes[2], a: bytes[3] }))
}

pub fn schema() -> CollectionDef {
    CollectionDef {
        id: "KYWD",
        cardinality: Cardinality::RequiredSingle,
        children: vec![
            SchemaNode::Slot(slot("edid", *b"EDID", Cardinality::RequiredSingle, decode_edid)),
            SchemaNode::Slot(slot("color", *b"CNAM", Cardinality::OptionalSingle, decode_cnam)),
        ],
    }
}
