//! Reader for TES-family plugin files (the group/record/subrecord format
//! shared by Fallout 3, Fallout: New Vegas, and format-version-15
//! derivatives): walks the header and group tree and dispatches each
//! record's subrecords to a per-record-type schema (`crate::record`).
//!
//! The crate never writes plugins, edits records in place, or resolves
//! cross-plugin master references — only decodes a single buffer.

pub mod cursor;
pub mod error;
pub mod group;
pub mod raw;
pub mod record;
pub mod schema;
pub mod types;

pub use error::EspError;
pub use raw::{DecodedSubrecord, GroupChildren, Plugin, PluginGroup, Record};
pub use record::{FieldValue, RecordType};

/// Front door (spec component C0f): does `buf` look like a plugin this
/// crate understands?
pub fn accepts(buf: &[u8]) -> bool {
    raw::accepts(buf)
}

/// Parse a whole plugin buffer (spec.md §4.4's acceptance test, then
/// header + top-level group tree).
pub fn parse_plugin(buf: &[u8]) -> Result<Plugin<'_>, EspError> {
    raw::parse(buf)
}

fn flatten_groups<'a, 'b>(groups: &'b [PluginGroup<'a>], out: &mut Vec<&'b Record<'a>>) {
    for group in groups {
        match &group.children {
            GroupChildren::Groups(children) => flatten_groups(children, out),
            GroupChildren::Records(records) => out.extend(records.iter()),
        }
    }
}

/// Every record in the plugin, in document order, optionally including the
/// `TES4` header and filtered to a single record-type tag (spec.md §4.4
/// `iter_records`).
pub fn iter_records<'a, 'b>(
    plugin: &'b Plugin<'a>,
    type_filter: Option<[u8; 4]>,
    include_header: bool,
) -> impl Iterator<Item = &'b Record<'a>> {
    let mut records = Vec::new();
    if include_header {
        records.push(&plugin.header);
    }
    flatten_groups(&plugin.top_level, &mut records);
    records.into_iter().filter(move |r| type_filter.map_or(true, |t| r.record_type == t))
}

/// One subrecord together with the record it belongs to, yielded by
/// [`iter_subrecords`].
pub struct SubrecordOccurrence {
    pub record_type: [u8; 4],
    pub form_id: u32,
    pub subrecord: DecodedSubrecord,
}

/// Every subrecord across the plugin, in document order within each
/// record, optionally filtered by subrecord tag and/or owning record type
/// (spec.md §4.4 `iter_subrecords`). Strict-mode schema checking is used
/// throughout; a record whose own framing is corrupt is skipped with its
/// error logged rather than aborting the whole walk.
pub fn iter_subrecords(
    plugin: &Plugin<'_>,
    subrecord_type_filter: Option<[u8; 4]>,
    record_type_filter: Option<[u8; 4]>,
    include_header: bool,
) -> Vec<SubrecordOccurrence> {
    let mut out = Vec::new();
    for record in iter_records(plugin, record_type_filter, include_header) {
        let subs = match record.subrecords(true) {
            Ok(subs) => subs,
            Err(e) => {
                log::warn!("skipping record {:?} ({:#010x}): {}", record.record_type, record.form_id, e);
                continue;
            }
        };
        for sub in subs {
            if subrecord_type_filter.map_or(true, |t| sub.tag == t) {
                out.push(SubrecordOccurrence { record_type: record.record_type, form_id: record.form_id, subrecord: sub });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subrecord_bytes(tag: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(tag);
        out.extend_from_slice(&(data.len() as u16).to_le_bytes());
        out.extend_from_slice(data);
        out
    }

    fn record_bytes(record_type: &[u8; 4], form_id: u32, format_version: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(record_type);
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // flags
        out.extend_from_slice(&form_id.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // revision
        out.extend_from_slice(&format_version.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // reserved
        out.extend_from_slice(payload);
        out
    }

    fn group_bytes(label: &[u8; 4], group_type: i32, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"GRUP");
        out.extend_from_slice(&((24 + payload.len()) as u32).to_le_bytes());
        out.extend_from_slice(label);
        out.extend_from_slice(&group_type.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&[0u8; 6]);
        out.extend_from_slice(payload);
        out
    }

    fn sample_plugin_bytes() -> Vec<u8> {
        let hedr = {
            let mut b = Vec::new();
            b.extend_from_slice(&1.0f32.to_le_bytes());
            b.extend_from_slice(&0u32.to_le_bytes());
            b.extend_from_slice(&0u32.to_le_bytes());
            b
        };
        let mut buf = record_bytes(b"TES4", 0, 15, &subrecord_bytes(b"HEDR", &hedr));

        let acti = record_bytes(b"ACTI", 0x1000, 0, &subrecord_bytes(b"EDID", b"FirstActivator\0"));
        let kywd = record_bytes(b"KYWD", 0x2000, 0, &subrecord_bytes(b"EDID", b"MyKeyword\0"));
        let acti_group = group_bytes(b"ACTI", 0, &acti);
        let kywd_group = group_bytes(b"KYWD", 0, &kywd);
        buf.extend_from_slice(&acti_group);
        buf.extend_from_slice(&kywd_group);
        buf
    }

    #[test]
    fn iter_records_honors_type_filter_and_header_inclusion() {
        let buf = sample_plugin_bytes();
        let plugin = parse_plugin(&buf).unwrap();

        let all: Vec<_> = iter_records(&plugin, None, true).collect();
        assert_eq!(all.len(), 3); // TES4 + ACTI + KYWD

        let only_acti: Vec<_> = iter_records(&plugin, Some(*b"ACTI"), false).collect();
        assert_eq!(only_acti.len(), 1);
        assert_eq!(only_acti[0].form_id, 0x1000);
    }

    #[test]
    fn iter_subrecords_yields_document_order_across_records() {
        let buf = sample_plugin_bytes();
        let plugin = parse_plugin(&buf).unwrap();

        let edids = iter_subrecords(&plugin, Some(*b"EDID"), None, false);
        assert_eq!(edids.len(), 2);
        assert_eq!(edids[0].record_type, *b"ACTI");
        assert_eq!(edids[1].record_type, *b"KYWD");
    }

    #[test]
    fn accepts_delegates_to_raw_acceptance_test() {
        let buf = sample_plugin_bytes();
        assert!(accepts(&buf));
        assert!(!accepts(&[0u8; 4]));
    }
}
