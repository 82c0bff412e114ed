//! `ACTI` (Activator). New relative to the teacher — grounded directly on
//! spec.md §4.4's own worked example: `EDID`, `OBND`, `FULL`, all
//! required singles in document order (spec.md §8 scenario S5).

use crate::error::EspError;
use crate::record::{decode_u32, decode_zstr, slot, FieldValue};
use crate::schema::{Cardinality, CollectionDef, SchemaNode};
use crate::types::{EditorId, LString, ObjectBounds};

fn decode_edid(bytes: &[u8]) -> Result<FieldValue, EspError> {
    Ok(FieldValue::EditorId(EditorId(decode_zstr(bytes)?)))
}

fn decode_obnd(bytes: &[u8]) -> Result<FieldValue, EspError> {
    if bytes.len() != 12 {
        return Err(EspError::schema(format!("OBND expected 12 bytes, got {}", bytes.len())));
    }
    let read_i16 = |off: usize| i16::from_le_bytes([bytes[off], bytes[off + 1]]);
    Ok(FieldValue::ObjectBounds(ObjectBounds {
        low: [read_i16(0), read_i16(2), read_i16(4)],
        high: [read_i16(6), read_i16(8), read_i16(10)],
    }))
}

fn decode_full(bytes: &[u8]) -> Result<FieldValue, EspError> {
    if bytes.len() == 4 {
        Ok(FieldValue::LString(LString::StringId(decode_u32(bytes)?)))
    } else {
        Ok(FieldValue::LString(LString::Inline(decode_zstr(bytes)?)))
    }
}

pub fn schema() -> CollectionDef {
    CollectionDef {
        id: "ACTI",
        cardinality: Cardinality::RequiredSingle,
        children: vec![
            SchemaNode::Slot(slot("edid", *b"EDID", Cardinality::RequiredSingle, decode_edid)),
            SchemaNode::Slot(slot("obnd", *b"OBND", Cardinality::RequiredSingle, decode_obnd)),
            SchemaNode::Slot(slot("full", *b"FULL", Cardinality::RequiredSingle, decode_full)),
        ],
    }
}
