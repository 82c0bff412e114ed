//! `FACT` (Faction). Adapted from the teacher's `esp/src/typed/fact.rs`;
//! the rank list (`RNAM`/`MNAM`/`FNAM` triples) is the schema's second
//! worked example of a `multiple` nested collection alongside `TES4`'s
//! master-file list, here with an optional trailing pair inside a
//! required leading slot.

use crate::error::EspError;
use crate::record::{decode_u32, decode_zstr, slot, FieldValue};
use crate::schema::{Cardinality, CollectionDef, SchemaNode};
use crate::types::{EditorId, FormId, LString};

fn decode_edid(bytes: &[u8]) -> Result<FieldValue, EspError> {
    Ok(FieldValue::EditorId(EditorId(decode_zstr(bytes)?)))
}

fn decode_lstring(bytes: &[u8]) -> Result<FieldValue, EspError> {
    if bytes.len() == 4 {
        Ok(FieldValue::LString(LString::StringId(decode_u32(bytes)?)))
    } else {
        Ok(FieldValue::LString(LString::Inline(decode_zstr(bytes)?)))
    }
}

fn decode_xnam(bytes: &[u8]) -> Result<FieldValue, EspError> {
    if bytes.len() != 12 {
        return Err(EspError::schema(format!("XNAM expected 12 bytes, got {}", bytes.len())));
    }
    Ok(FieldValue::Raw(bytes.to_vec()))
}

fn decode_flags32(bytes: &[u8]) -> Result<FieldValue, EspError> {
    Ok(FieldValue::Flags32 { raw: decode_u32(bytes)? })
}

fn decode_form_id(bytes: &[u8]) -> Result<FieldValue, EspError> {
    Ok(FieldValue::FormId(FormId(decode_u32(bytes)?)))
}

fn decode_rank_id(bytes: &[u8]) -> Result<FieldValue, EspError> {
    Ok(FieldValue::U32(decode_u32(bytes)?))
}

fn decode_raw(bytes: &[u8]) -> Result<FieldValue, EspError> {
    Ok(FieldValue::Raw(bytes.to_vec()))
}

pub fn schema() -> CollectionDef {
    CollectionDef {
        id: "FACT",
        cardinality: Cardinality::RequiredSingle,
        children: vec![
            SchemaNode::Slot(slot("edid", *b"EDID", Cardinality::RequiredSingle, decode_edid)),
            SchemaNode::Slot(slot("name", *b"FULL", Cardinality::OptionalSingle, decode_lstring)),
            SchemaNode::Slot(slot("relation", *b"XNAM", Cardinality::OptionalMultiple, decode_xnam)),
            SchemaNode::Slot(slot("flags", *b"DATA", Cardinality::RequiredSingle, decode_flags32)),
            SchemaNode::Slot(slot("crime_gold", *b"CRVA", Cardinality::OptionalSingle, decode_raw)),
            SchemaNode::Collection(CollectionDef {
                id: "rank",
                cardinality: Cardinality::OptionalMultiple,
                children: vec![
                    SchemaNode::Slot(slot("rank_id", *b"RNAM", Cardinality::RequiredSingle, decode_rank_id)),
                    SchemaNode::Slot(slot("title_male", *b"MNAM", Cardinality::OptionalSingle, decode_lstring)),
                    SchemaNode::Slot(slot("title_female", *b"FNAM", Cardinality::OptionalSingle, decode_lstring)),
                ],
            }),
            SchemaNode::Slot(slot("vendor_buy", *b"VEND", Cardinality::OptionalSingle, decode_form_id)),
            SchemaNode::Slot(slot("vendor_chest", *b"VENC", Cardinality::OptionalSingle, decode_form_id)),
            SchemaNode::Slot(slot("vendor_hours", *b"VENV", Cardinality::OptionalSingle, decode_raw)),
            SchemaNode::Slot(slot("jail_cell", *b"JAIL", Cardinality::OptionalSingle, decode_form_id)),
            SchemaNode::Slot(slot("wait_marker", *b"WAIT", Cardinality::OptionalSingle, decode_form_id)),
            SchemaNode::Slot(slot("stolen_goods_chest", *b"STOL", Cardinality::OptionalSingle, decode_form_id)),
            SchemaNode::Slot(slot("player_inventory_chest", *b"PLCN", Cardinality::OptionalSingle, decode_form_id)),
            SchemaNode::Slot(slot("merchant_container_location", *b"PLVD", Cardinality::OptionalSingle, decode_raw)),
            SchemaNode::Slot(slot("crime_group", *b"CRGR", Cardinality::OptionalSingle, decode_form_id)),
            SchemaNode::Slot(slot("jail_outfit", *b"JOUT", Cardinality::OptionalSingle, decode_form_id)),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::discover;

    #[test]
    fn two_ranks_both_match_the_rank_collection() {
        let schema = schema();
        let mut history = Vec::new();
        for tag in [*b"EDID", *b"DATA", *b"RNAM", *b"FNAM", *b"RNAM", *b"MNAM"] {
            let found = discover(&schema, &history, tag, true, "FACT").unwrap();
            assert!(found.is_some(), "expected a slot for {:?}", tag);
            history.push(tag);
        }
    }
}
