//! `TES4` (Plugin Header). Field set adapted from the teacher's
//! `esp/src/typed/tes4.rs`; the `MAST`+`DATA` master-file pairs become a
//! nested schema collection (spec.md §3 `PluginHeader`), the worked
//! "arbitrary nested collections" example of spec.md §4.4.

use crate::error::EspError;
use crate::record::{decode_f32, decode_u32, decode_zstr, slot, FieldValue};
use crate::schema::{Cardinality, CollectionDef, SchemaNode};

fn decode_hedr(bytes: &[u8]) -> Result<FieldValue, EspError> {
    if bytes.len() != 12 {
        return Err(EspError::schema(format!("HEDR expected 12 bytes, got {}", bytes.len())));
    }
    let version = decode_f32(&bytes[0..4])?;
    let next_object_id = decode_u32(&bytes[4..8])?;
    Ok(FieldValue::PluginHeader { version, next_object_id })
}

fn decode_zstr_field(bytes: &[u8]) -> Result<FieldValue, EspError> {
    Ok(FieldValue::ZStr(decode_zstr(bytes)?))
}

fn decode_data_size(bytes: &[u8]) -> Result<FieldValue, EspError> {
    bytes
        .get(0..8)
        .map(|b| FieldValue::U64(u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])))
        .ok_or_else(|| EspError::schema(format!("DATA expected 8 bytes, got {}", bytes.len())))
}

fn decode_u32_field(bytes: &[u8]) -> Result<FieldValue, EspError> {
    Ok(FieldValue::U32(decode_u32(bytes)?))
}

fn decode_raw(bytes: &[u8]) -> Result<FieldValue, EspError> {
    Ok(FieldValue::Raw(bytes.to_vec()))
}

pub fn schema() -> CollectionDef {
    CollectionDef {
        id: "TES4",
        cardinality: Cardinality::RequiredSingle,
        children: vec![
            SchemaNode::Slot(slot("hedr", *b"HEDR", Cardinality::RequiredSingle, decode_hedr)),
            SchemaNode::Slot(slot("author", *b"CNAM", Cardinality::OptionalSingle, decode_zstr_field)),
            SchemaNode::Slot(slot("description", *b"SNAM", Cardinality::OptionalSingle, decode_zstr_field)),
            SchemaNode::Collection(CollectionDef {
                id: "master_file",
                cardinality: Cardinality::OptionalMultiple,
                children: vec![
                    SchemaNode::Slot(slot("mast", *b"MAST", Cardinality::RequiredSingle, decode_zstr_field)),
                    SchemaNode::Slot(slot("data", *b"DATA", Cardinality::RequiredSingle, decode_data_size)),
                ],
            }),
            SchemaNode::Slot(slot("overridden_forms", *b"ONAM", Cardinality::OptionalSingle, decode_raw)),
            SchemaNode::Slot(slot("next_tagifiable_strings", *b"INTV", Cardinality::OptionalSingle, decode_u32_field)),
            SchemaNode::Slot(slot("increment", *b"INCC", Cardinality::OptionalSingle, decode_u32_field)),
        ],
    }
}
