//! Declarative subrecord schema language and the `discover()` shape-check
//! matcher (spec component C3).
//!
//! The teacher has no generic version of this — every `typed/*.rs` module
//! hand-writes a `match` over subrecord tags. This engine is grounded
//! instead on `bethesda_structs.plugin._common.Subrecord` /
//! `SubrecordCollection` (`_lookahead`, `_parse`, `discover`,
//! `handle_working`) from the original Python implementation,
//! re-expressed as Rust enums and ordinary `match`es rather than a
//! dynamic dict-of-regexes.

use crate::error::EspError;
use crate::record::FieldValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    RequiredSingle,
    OptionalSingle,
    RequiredMultiple,
    OptionalMultiple,
}

impl Cardinality {
    fn is_required(self) -> bool {
        matches!(self, Cardinality::RequiredSingle | Cardinality::RequiredMultiple)
    }

    fn is_multiple(self) -> bool {
        matches!(self, Cardinality::RequiredMultiple | Cardinality::OptionalMultiple)
    }
}

pub type SlotDecoder = fn(&[u8]) -> Result<FieldValue, EspError>;

/// Schema leaf: a named, decodable subrecord slot (spec.md §3
/// `SubrecordSlot`).
#[derive(Clone, Copy)]
pub struct SlotDef {
    pub id: &'static str,
    pub tag: [u8; 4],
    pub cardinality: Cardinality,
    pub decode: SlotDecoder,
}

/// Schema node: an ordered sequence of slots and/or nested collections
/// (spec.md §3 `SubrecordCollection`).
#[derive(Clone)]
pub struct CollectionDef {
    pub id: &'static str,
    pub children: Vec<SchemaNode>,
    pub cardinality: Cardinality,
}

#[derive(Clone)]
pub enum SchemaNode {
    Slot(SlotDef),
    Collection(CollectionDef),
}

/// The top-level schema for one record type (spec.md §3 `RecordSchema`).
#[derive(Clone)]
pub struct RecordSchema {
    pub record_type: [u8; 4],
    pub root: CollectionDef,
}

fn tag_str(tag: [u8; 4]) -> String {
    String::from_utf8_lossy(&tag).into_owned()
}

/// Depth-first, in-order flattening of a schema (sub)tree into
/// `(is_required, slot)` pairs — used both to search the remaining-expected
/// tree and, in non-strict fallback, the full schema tree.
fn flatten(nodes: &[SchemaNode]) -> Vec<(bool, SlotDef)> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            SchemaNode::Slot(slot) => out.push((slot.cardinality.is_required(), *slot)),
            SchemaNode::Collection(coll) => out.extend(flatten(&coll.children)),
        }
    }
    out
}

/// Greedily consume `history` against `children`, left to right, returning
/// how many history tags were consumed and the sub-tree of schema nodes
/// still unsatisfied afterward (the "remaining-expected" tree of
/// spec.md §4.5 step 1).
fn walk_children(children: &[SchemaNode], history: &[[u8; 4]]) -> (usize, Vec<SchemaNode>) {
    let mut hist_idx = 0;
    let mut remaining = Vec::new();

    for child in children {
        match child {
            SchemaNode::Slot(slot) => match slot.cardinality {
                Cardinality::RequiredSingle | Cardinality::OptionalSingle => {
                    if hist_idx < history.len() && history[hist_idx] == slot.tag {
                        hist_idx += 1;
                    } else {
                        remaining.push(SchemaNode::Slot(*slot));
                    }
                }
                Cardinality::RequiredMultiple | Cardinality::OptionalMultiple => {
                    while hist_idx < history.len() && history[hist_idx] == slot.tag {
                        hist_idx += 1;
                    }
                    // a multiple slot can always match more occurrences later
                    remaining.push(SchemaNode::Slot(*slot));
                }
            },
            SchemaNode::Collection(coll) if coll.cardinality.is_multiple() => {
                // A `multiple` collection matches one-or-more adjacent
                // repeats of its child sequence: keep re-running the walk
                // over the collection's own children against whatever
                // history remains. A repeat that leaves only optional
                // children unconsumed still counts as complete (those
                // optionals were simply absent from that repeat); only a
                // leftover *required* child blocks starting another.
                let mut last_remaining = coll.children.clone();
                loop {
                    let (consumed, rem_children) = walk_children(&coll.children, &history[hist_idx..]);
                    if consumed == 0 {
                        last_remaining = rem_children;
                        break;
                    }
                    hist_idx += consumed;
                    if flatten(&rem_children).iter().any(|(required, _)| *required) {
                        last_remaining = rem_children;
                        break;
                    }
                    // this repeat was fully satisfied; a fresh one may follow
                    last_remaining = coll.children.clone();
                }
                remaining.push(SchemaNode::Collection(CollectionDef {
                    id: coll.id,
                    children: last_remaining,
                    cardinality: coll.cardinality,
                }));
            }
            SchemaNode::Collection(coll) => {
                let (consumed, rem_children) = walk_children(&coll.children, &history[hist_idx..]);
                hist_idx += consumed;
                if !rem_children.is_empty() {
                    remaining.push(SchemaNode::Collection(CollectionDef {
                        id: coll.id,
                        children: rem_children,
                        cardinality: coll.cardinality,
                    }));
                }
            }
        }
    }
    (hist_idx, remaining)
}

/// Determine which slot, if any, the subrecord `target` (occurring after
/// `history` within a record of type `record_type`) satisfies.
///
/// `Ok(Some(slot))`: decode with this slot.
/// `Ok(None))`: `target` isn't declared anywhere in this schema; the
/// caller should yield the subrecord undecoded (spec.md §4.4).
/// `Err(UnexpectedSubrecord)`: strict-mode rejection.
pub fn discover(
    schema: &CollectionDef,
    history: &[[u8; 4]],
    target: [u8; 4],
    strict: bool,
    record_type: &str,
) -> Result<Option<SlotDef>, EspError> {
    let (_, remaining) = walk_children(&schema.children, history);
    let flat = flatten(&remaining);

    let expected = flat.first().map(|(_, s)| tag_str(s.tag)).unwrap_or_else(|| "end".to_string());
    let mut passed_required = false;

    for (required, slot) in &flat {
        if slot.tag == target {
            if passed_required {
                if strict {
                    return Err(EspError::UnexpectedSubrecord {
                        expected: expected.clone(),
                        got: tag_str(target),
                        record_type: record_type.to_string(),
                    });
                }
                log::warn!(
                    "non-strict: {} matched {} out of schema order in record {}",
                    tag_str(target),
                    slot.id,
                    record_type
                );
            }
            return Ok(Some(*slot));
        }
        if *required {
            passed_required = true;
        }
    }

    if strict {
        return Err(EspError::UnexpectedSubrecord { expected, got: tag_str(target), record_type: record_type.to_string() });
    }

    // Non-strict fallback: search the whole schema (not just what remains)
    // for a first-name match, e.g. a repeated single slot.
    for (_, slot) in flatten(&[SchemaNode::Collection(schema.clone())]) {
        if slot.tag == target {
            log::warn!("non-strict: {} re-matched {} outside remaining-expected tree in record {}", tag_str(target), slot.id, record_type);
            return Ok(Some(slot));
        }
    }
    Ok(None)
}
