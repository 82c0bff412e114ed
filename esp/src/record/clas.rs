//! `CLAS` (Class). Adapted from the teacher's `esp/src/typed/clas.rs`
//! field set, re-expressed as a schema tree.

use crate::error::EspError;
use crate::record::{decode_zstr, slot, FieldValue};
use crate::schema::{Cardinality, CollectionDef, SchemaNode};
use crate::types::EditorId;

fn decode_edid(bytes: &[u8]) -> Result<FieldValue, EspError> {
    Ok(FieldValue::EditorId(EditorId(decode_zstr(bytes)?)))
}

fn decode_zstr_field(bytes: &[u8]) -> Result<FieldValue, EspError> {
    Ok(FieldValue::ZStr(decode_zstr(bytes)?))
}

fn decode_raw(bytes: &[u8]) -> Result<FieldValue, EspError> {
    Ok(FieldValue::Raw(bytes.to_vec()))
}

pub fn schema() -> CollectionDef {
    CollectionDef {
        id: "CLAS",
        cardinality: Cardinality::RequiredSingle,
        children: vec![
            SchemaNode::Slot(slot("edid", *b"EDID", Cardinality::RequiredSingle, decode_edid)),
            SchemaNode::Slot(slot("full", *b"FULL", Cardinality::OptionalSingle, decode_zstr_field)),
            SchemaNode::Slot(slot("desc", *b"DESC", Cardinality::OptionalSingle, decode_zstr_field)),
            SchemaNode::Slot(slot("icon", *b"ICON", Cardinality::OptionalSingle, decode_zstr_field)),
            SchemaNode::Slot(slot("data", *b"DATA", Cardinality::RequiredSingle, decode_raw)),
        ],
    }
}
