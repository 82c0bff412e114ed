//! `GLOB` (Global Variable). Adapted from the teacher's
//! `esp/src/typed/glob.rs`; the `FNAM` variable-type char plus `FLTV`
//! float pair stays as two independent slots rather than a cross-field
//! `VarValue` resolution, since a slot decoder only ever sees its own
//! subrecord's bytes.

use crate::error::EspError;
use crate::record::{decode_f32, decode_zstr, slot, FieldValue};
use crate::schema::{Cardinality, CollectionDef, SchemaNode};
use crate::types::EditorId;

fn decode_edid(bytes: &[u8]) -> Result<FieldValue, EspError> {
    Ok(FieldValue::EditorId(EditorId(decode_zstr(bytes)?)))
}

fn decode_fnam(bytes: &[u8]) -> Result<FieldValue, EspError> {
    match bytes.first() {
        Some(&b) => Ok(FieldValue::U8(b)),
        None => Err(EspError::schema("FNAM expected 1 byte, got 0")),
    }
}

fn decode_fltv(bytes: &[u8]) -> Result<FieldValue, EspError> {
    Ok(FieldValue::F32(decode_f32(bytes)?))
}

pub fn schema() -> CollectionDef {
    CollectionDef {
        id: "GLOB",
        cardinality: Cardinality::RequiredSingle,
        children: vec![
            SchemaNode::Slot(slot("edid", *b"EDID", Cardinality::RequiredSingle, decode_edid)),
            SchemaNode::Slot(slot("var_type", *b"FNAM", Cardinality::RequiredSingle, decode_fnam)),
            SchemaNode::Slot(slot("value", *b"FLTV", Cardinality::RequiredSingle, decode_fltv)),
        ],
    }
}
