//! `GMST` (Game Setting). Adapted from the teacher's
//! `esp/src/typed/gmst.rs`. The teacher resolves `DATA`'s type (string,
//! int, float, bool) from `EDID`'s first character, but a slot decoder
//! only ever sees its own subrecord's bytes — that cross-field
//! resolution is left to the caller, keyed off the decoded `EditorId`.

use crate::error::EspError;
use crate::record::{decode_zstr, slot, FieldValue};
use crate::schema::{Cardinality, CollectionDef, SchemaNode};
use crate::types::EditorId;

fn decode_edid(bytes: &[u8]) -> Result<FieldValue, EspError> {
    Ok(FieldValue::EditorId(EditorId(decode_zstr(bytes)?)))
}

fn decode_data(bytes: &[u8]) -> Result<FieldValue, EspError> {
    Ok(FieldValue::Raw(bytes.to_vec()))
}

pub fn schema() -> CollectionDef {
    CollectionDef {
        id: "GMST",
        cardinality: Cardinality::RequiredSingle,
        children: vec![
            SchemaNode::Slot(slot("edid", *b"EDID", Cardinality::RequiredSingle, decode_edid)),
            SchemaNode::Slot(slot("data", *b"DATA", Cardinality::RequiredSingle, decode_data)),
        ],
    }
}
