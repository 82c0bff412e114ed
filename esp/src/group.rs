//! Typed decoding of a `PluginGroup`'s 4-byte label, whose meaning depends
//! on the group's `group_type` discriminant (spec.md §3 `PluginGroup`).
//! Carried over from the teacher's `esp/src/typed/group.rs`; the I/O
//! model around it changed (buffer cursor instead of seek) but this
//! decode logic is unchanged.

use num_enum::TryFromPrimitive;

use crate::types::{BlockId, FormId, Point2D};

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(i32)]
pub enum GroupType {
    Top = 0,
    WorldChildren = 1,
    CellBlockInterior = 2,
    CellSubBlockInterior = 3,
    CellBlockExterior = 4,
    CellSubBlockExterior = 5,
    CellChildren = 6,
    TopicChildren = 7,
    CellPersistentChildren = 8,
    CellTemporaryChildren = 9,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellChildKind {
    Normal,
    Persistent,
    Temporary,
}

#[derive(Debug, Clone, Copy)]
pub enum GroupInfo {
    TopLevel([u8; 4]),
    WorldChildren(FormId),
    CellBlock(BlockId),
    CellSubBlock(BlockId),
    ExteriorCellBlock(Point2D<i8>),
    ExteriorCellSubBlock(Point2D<i8>),
    CellChildren { owner: FormId, kind: CellChildKind },
    TopicChildren(FormId),
    /// `group_type` didn't match a known discriminant; the raw label and
    /// type are preserved rather than discarded (no silent data loss).
    Unknown { group_type: i32, label: [u8; 4] },
}

pub fn decode(label: [u8; 4], group_type: i32) -> GroupInfo {
    let form_id = || FormId(u32::from_le_bytes(label));
    match GroupType::try_from(group_type) {
        Ok(GroupType::Top) => GroupInfo::TopLevel(label),
        Ok(GroupType::WorldChildren) => GroupInfo::WorldChildren(form_id()),
        Ok(GroupType::CellBlockInterior) => GroupInfo::CellBlock(BlockId(i32::from_le_bytes(label))),
        Ok(GroupType::CellSubBlockInterior) => GroupInfo::CellSubBlock(BlockId(i32::from_le_bytes(label))),
        Ok(GroupType::CellBlockExterior) => {
            GroupInfo::ExteriorCellBlock(Point2D { y: label[0] as i8, x: label[1] as i8 })
        }
        Ok(GroupType::CellSubBlockExterior) => {
            GroupInfo::ExteriorCellSubBlock(Point2D { y: label[0] as i8, x: label[1] as i8 })
        }
        Ok(GroupType::CellChildren) => GroupInfo::CellChildren { owner: form_id(), kind: CellChildKind::Normal },
        Ok(GroupType::CellPersistentChildren) => {
            GroupInfo::CellChildren { owner: form_id(), kind: CellChildKind::Persistent }
        }
        Ok(GroupType::CellTemporaryChildren) => {
            GroupInfo::CellChildren { owner: form_id(), kind: CellChildKind::Temporary }
        }
        Ok(GroupType::TopicChildren) => GroupInfo::TopicChildren(form_id()),
        Err(_) => GroupInfo::Unknown { group_type, label },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_label_is_record_type_tag() {
        match decode(*b"ACTI", 0) {
            GroupInfo::TopLevel(tag) => assert_eq!(&tag, b"ACTI"),
            other => panic!("unexpected {:?}", std::mem::discriminant(&other)),
        }
    }

    #[test]
    fn unknown_group_type_preserves_raw_fields() {
        match decode(*b"XXXX", 42) {
            GroupInfo::Unknown { group_type, label } => {
                assert_eq!(group_type, 42);
                assert_eq!(&label, b"XXXX");
            }
            other => panic!("unexpected {:?}", std::mem::discriminant(&other)),
        }
    }
}
