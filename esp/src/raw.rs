//! Plugin Walker (spec component C2): parses the top-level record/group
//! tree out of a whole plugin buffer and dispatches each record's
//! subrecords through the schema engine (C3).
//!
//! Grounded on the teacher's `esp/src/record.rs` `Entry`/`Record`/`Group`/
//! `Field` shape, re-expressed over a borrowed buffer cursor (`crate::
//! cursor::Cursor`) instead of the teacher's `Read + Seek` reader, so a
//! `Record`'s uncompressed payload can borrow straight from the plugin
//! buffer with no copy. A `COMPRESSED` record's payload is decompressed
//! into an owned buffer instead, since nothing else can borrow out of a
//! zlib stream.

use enumflags2::{bitflags, BitFlags};
use libflate::zlib::Decoder;
use std::io::Read;

use crate::cursor::Cursor;
use crate::error::EspError;
use crate::group::{self, GroupInfo};
use crate::record::{self, FieldValue};
use crate::schema::discover;

pub const HEADER_TAG: [u8; 4] = *b"TES4";
pub const SUPPORTED_FORMAT_VERSION: u16 = 15;
const RECORD_HEADER_LEN: usize = 24;
const GROUP_HEADER_LEN: usize = 24;

#[bitflags]
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordFlag {
    Master = 0x0000_0001,
    Deleted = 0x0000_0020,
    Constant = 0x0000_0040,
    Persistent = 0x0000_0400,
    InitiallyDisabled = 0x0000_0800,
    Ignored = 0x0000_1000,
    Compressed = 0x0004_0000,
}

/// One record's own framing plus its still-encoded payload.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    pub record_type: [u8; 4],
    pub flags: BitFlags<RecordFlag>,
    pub flags_raw: u32,
    pub form_id: u32,
    pub revision: u32,
    pub format_version: u16,
    pub reserved: u16,
    stored: &'a [u8],
    compressed: bool,
}

/// A single decoded (or undecoded) subrecord.
#[derive(Debug, Clone)]
pub struct DecodedSubrecord {
    pub tag: [u8; 4],
    pub data: Vec<u8>,
    pub value: Option<FieldValue>,
    /// Set when the owning schema slot's decoder failed, or (strict mode)
    /// when the tag itself couldn't be placed in the schema at all. The
    /// raw tag + bytes above are always preserved regardless.
    pub diagnostic: Option<EspError>,
}

impl<'a> Record<'a> {
    fn parse(c: &mut Cursor<'a>) -> Result<Self, EspError> {
        let record_type = c.read_array4()?;
        let data_size = c.read_u32()?;
        let (flags, flags_raw) = c.read_flags_u32::<RecordFlag>()?;
        let form_id = c.read_u32()?;
        let revision = c.read_u32()?;
        let format_version = c.read_u16()?;
        let reserved = c.read_u16()?;

        let stored = c.take(data_size as usize)?;
        let compressed = flags.contains(RecordFlag::Compressed);

        Ok(Record {
            record_type,
            flags,
            flags_raw,
            form_id,
            revision,
            format_version,
            reserved,
            stored,
            compressed,
        })
    }

    /// The record's subrecord stream, decompressed if `COMPRESSED` is set.
    /// Owned because a compressed record has nothing else to borrow from.
    pub fn payload(&self) -> Result<std::borrow::Cow<'a, [u8]>, EspError> {
        if !self.compressed {
            return Ok(std::borrow::Cow::Borrowed(self.stored));
        }
        if self.stored.len() < 4 {
            return Err(EspError::TruncatedInput { want: 4, have: self.stored.len(), at: 0 });
        }
        let original_size =
            u32::from_le_bytes([self.stored[0], self.stored[1], self.stored[2], self.stored[3]]) as usize;
        let mut decoder = Decoder::new(&self.stored[4..])
            .map_err(|e| EspError::CodecError { codec: "zlib", cause: e.to_string() })?;
        let mut out = Vec::with_capacity(original_size);
        decoder
            .read_to_end(&mut out)
            .map_err(|e| EspError::CodecError { codec: "zlib", cause: e.to_string() })?;
        if out.len() != original_size {
            log::warn!(
                "record {} ({:#010x}): decompressed {} bytes, header declared {}",
                tag_str(self.record_type),
                self.form_id,
                out.len(),
                original_size
            );
        }
        Ok(std::borrow::Cow::Owned(out))
    }

    /// Walk this record's subrecord stream, decoding each against the
    /// type's registered schema (spec.md §4.4 "Subrecord dispatch").
    /// Decoder failures and (strict-mode) schema rejections are attached
    /// as diagnostics rather than aborting the record.
    pub fn subrecords(&self, strict: bool) -> Result<Vec<DecodedSubrecord>, EspError> {
        let payload = self.payload()?;
        let record_type_str = tag_str(self.record_type);
        let schema = record::schema_for(self.record_type);
        let mut history: Vec<[u8; 4]> = Vec::new();
        let mut out = Vec::new();

        let mut c = Cursor::new(&payload);
        while !c.is_empty() {
            let (tag, data) = read_subrecord(&mut c)?;

            let (value, diagnostic) = match &schema {
                None => (None, None),
                Some(schema) => match discover(schema, &history, tag, strict, &record_type_str) {
                    Ok(Some(slot)) => match (slot.decode)(&data) {
                        Ok(v) => (Some(v), None),
                        Err(e) => (None, Some(e)),
                    },
                    Ok(None) => (None, None),
                    Err(e) => (None, Some(e)),
                },
            };

            out.push(DecodedSubrecord { tag, data, value, diagnostic });
            history.push(tag);
        }
        Ok(out)
    }
}

/// Read one `tag + size + data` subrecord, resolving the `XXXX` large-field
/// override (spec.md §4.4: a 4-byte `u32` real size, then the following
/// tag's declared `u16` size is discarded in favor of it).
fn read_subrecord(c: &mut Cursor) -> Result<([u8; 4], Vec<u8>), EspError> {
    let tag = c.read_array4()?;
    let size = c.read_u16()?;
    if &tag == b"XXXX" {
        if size != 4 {
            return Err(EspError::schema(format!("XXXX override expected size 4, got {}", size)));
        }
        let real_size = c.read_u32()?;
        let real_tag = c.read_array4()?;
        let _declared_size = c.read_u16()?;
        let data = c.take(real_size as usize)?.to_vec();
        return Ok((real_tag, data));
    }
    let data = c.take(size as usize)?.to_vec();
    Ok((tag, data))
}

fn tag_str(tag: [u8; 4]) -> String {
    String::from_utf8_lossy(&tag).into_owned()
}

#[derive(Debug, Clone)]
pub enum GroupChildren<'a> {
    Groups(Vec<PluginGroup<'a>>),
    Records(Vec<Record<'a>>),
}

#[derive(Debug, Clone)]
pub struct PluginGroup<'a> {
    pub info: GroupInfo,
    pub group_type_raw: i32,
    pub label_raw: [u8; 4],
    pub timestamp: u16,
    pub children: GroupChildren<'a>,
}

impl<'a> PluginGroup<'a> {
    fn parse(c: &mut Cursor<'a>) -> Result<Self, EspError> {
        let tag = c.read_array4()?;
        if &tag != b"GRUP" {
            return Err(EspError::schema(format!("expected GRUP, got {}", tag_str(tag))));
        }
        let group_size = c.read_u32()?;
        let label_raw = c.read_array4()?;
        let group_type_raw = c.read_i32()?;
        let timestamp = c.read_u16()?;
        c.skip(6)?; // reserved

        if group_size < GROUP_HEADER_LEN as u32 {
            return Err(EspError::schema(format!("group_size {} smaller than header", group_size)));
        }
        let payload_len = group_size as usize - GROUP_HEADER_LEN;
        let payload = c.take(payload_len)?;
        let mut payload_c = Cursor::new(payload);

        let children = if payload.len() >= 4 && &payload[0..4] == b"GRUP" {
            let mut groups = Vec::new();
            while !payload_c.is_empty() {
                groups.push(PluginGroup::parse(&mut payload_c)?);
            }
            GroupChildren::Groups(groups)
        } else {
            let mut records = Vec::new();
            while !payload_c.is_empty() {
                records.push(Record::parse(&mut payload_c)?);
            }
            GroupChildren::Records(records)
        };

        let info = group::decode(label_raw, group_type_raw);
        Ok(PluginGroup { info, group_type_raw, label_raw, timestamp, children })
    }
}

/// A fully-parsed plugin: its `TES4` header record plus the top-level
/// group tree.
#[derive(Debug, Clone)]
pub struct Plugin<'a> {
    pub header: Record<'a>,
    pub top_level: Vec<PluginGroup<'a>>,
}

/// Acceptance test (spec.md §4.4): first record tag `TES4`, header's
/// `format_version` field equal to 15.
pub fn accepts(buf: &[u8]) -> bool {
    if buf.len() < RECORD_HEADER_LEN {
        return false;
    }
    let mut c = Cursor::new(buf);
    match Record::parse(&mut c) {
        Ok(header) => header.record_type == HEADER_TAG && header.format_version == SUPPORTED_FORMAT_VERSION,
        Err(_) => false,
    }
}

pub fn parse(buf: &[u8]) -> Result<Plugin<'_>, EspError> {
    let mut c = Cursor::new(buf);
    let header = Record::parse(&mut c)?;
    if header.record_type != HEADER_TAG || header.format_version != SUPPORTED_FORMAT_VERSION {
        return Err(EspError::UnsupportedFormat { magic: header.record_type, format_version: header.format_version });
    }

    let mut top_level = Vec::new();
    while !c.is_empty() {
        top_level.push(PluginGroup::parse(&mut c)?);
    }
    Ok(Plugin { header, top_level })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_bytes(record_type: &[u8; 4], flags: u32, form_id: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(record_type);
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&flags.to_le_bytes());
        out.extend_from_slice(&form_id.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // revision
        out.extend_from_slice(&0u16.to_le_bytes()); // format_version
        out.extend_from_slice(&0u16.to_le_bytes()); // reserved
        out.extend_from_slice(payload);
        out
    }

    fn subrecord_bytes(tag: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(tag);
        out.extend_from_slice(&(data.len() as u16).to_le_bytes());
        out.extend_from_slice(data);
        out
    }

    fn tes4_header_bytes(payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"TES4");
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // flags
        out.extend_from_slice(&0u32.to_le_bytes()); // form_id
        out.extend_from_slice(&0u32.to_le_bytes()); // revision
        out.extend_from_slice(&15u16.to_le_bytes()); // format_version
        out.extend_from_slice(&0u16.to_le_bytes()); // reserved
        out.extend_from_slice(payload);
        out
    }

    fn group_bytes(label: &[u8; 4], group_type: i32, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"GRUP");
        out.extend_from_slice(&((GROUP_HEADER_LEN + payload.len()) as u32).to_le_bytes());
        out.extend_from_slice(label);
        out.extend_from_slice(&group_type.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // stamp
        out.extend_from_slice(&[0u8; 6]); // reserved
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn s1_accepts_requires_tes4_tag_and_format_version_15() {
        let hedr = {
            let mut b = Vec::new();
            b.extend_from_slice(&1.0f32.to_le_bytes());
            b.extend_from_slice(&0u32.to_le_bytes());
            b.extend_from_slice(&0u32.to_le_bytes());
            b
        };
        let header_payload = subrecord_bytes(b"HEDR", &hedr);
        let buf = tes4_header_bytes(&header_payload);
        assert!(accepts(&buf));

        let mut wrong_version = buf.clone();
        wrong_version[20] = 3; // clobber format-version low byte
        assert!(!accepts(&wrong_version));
    }

    #[test]
    fn parses_header_then_one_top_level_group_of_records() {
        let hedr = {
            let mut b = Vec::new();
            b.extend_from_slice(&1.0f32.to_le_bytes());
            b.extend_from_slice(&0u32.to_le_bytes());
            b.extend_from_slice(&0u32.to_le_bytes());
            b
        };
        let header_payload = subrecord_bytes(b"HEDR", &hedr);
        let mut buf = tes4_header_bytes(&header_payload);

        let acti_subrecords = {
            let mut p = Vec::new();
            p.extend_from_slice(&subrecord_bytes(b"EDID", b"MyActivator\0"));
            p
        };
        let acti_record = record_bytes(b"ACTI", 0, 0x1234, &acti_subrecords);
        let group = group_bytes(b"ACTI", 0, &acti_record);
        buf.extend_from_slice(&group);

        let plugin = parse(&buf).unwrap();
        assert_eq!(plugin.header.record_type, *b"TES4");
        assert_eq!(plugin.top_level.len(), 1);
        match &plugin.top_level[0].children {
            GroupChildren::Records(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].record_type, *b"ACTI");
                let subs = records[0].subrecords(true).unwrap();
                assert_eq!(subs[0].tag, *b"EDID");
                assert!(matches!(subs[0].value, Some(FieldValue::EditorId(_))));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn nested_group_payload_detected_by_grup_prefix() {
        let inner_record = record_bytes(b"ACTI", 0, 1, &subrecord_bytes(b"EDID", b"Inner\0"));
        let inner_group = group_bytes(b"ACTI", 0, &inner_record);
        let outer_group = group_bytes(b"CELL", 6, &inner_group);

        let mut c = Cursor::new(&outer_group);
        let parsed = PluginGroup::parse(&mut c).unwrap();
        match parsed.children {
            GroupChildren::Groups(groups) => assert_eq!(groups.len(), 1),
            other => panic!("expected nested groups, got {:?}", other),
        }
    }

    #[test]
    fn xxxx_override_replaces_the_following_tags_declared_size() {
        let mut payload = Vec::new();
        payload.extend_from_slice(b"XXXX");
        payload.extend_from_slice(&4u16.to_le_bytes());
        payload.extend_from_slice(&300u32.to_le_bytes());
        payload.extend_from_slice(b"DATA");
        payload.extend_from_slice(&0u16.to_le_bytes()); // discarded declared size
        payload.extend_from_slice(&vec![0xABu8; 300]);

        let mut c = Cursor::new(&payload);
        let (tag, data) = read_subrecord(&mut c).unwrap();
        assert_eq!(tag, *b"DATA");
        assert_eq!(data.len(), 300);
        assert!(c.is_empty());
    }

    #[test]
    fn unknown_record_type_yields_raw_subrecords_only() {
        let record = record_bytes(b"ZZZZ", 0, 1, &subrecord_bytes(b"EDID", b"X\0"));
        let mut c = Cursor::new(&record);
        let parsed = Record::parse(&mut c).unwrap();
        let subs = parsed.subrecords(true).unwrap();
        assert!(subs[0].value.is_none());
        assert!(subs[0].diagnostic.is_none());
        assert_eq!(subs[0].data, b"X\0");
    }

    #[test]
    fn decoder_failure_is_attached_as_diagnostic_not_aborted() {
        // ACTI's schema requires OBND to be exactly 12 bytes.
        let mut subrecords = Vec::new();
        subrecords.extend_from_slice(&subrecord_bytes(b"EDID", b"X\0"));
        subrecords.extend_from_slice(&subrecord_bytes(b"OBND", &[0u8; 3]));
        subrecords.extend_from_slice(&subrecord_bytes(b"FULL", b"Name\0"));
        let record = record_bytes(b"ACTI", 0, 1, &subrecords);

        let mut c = Cursor::new(&record);
        let parsed = Record::parse(&mut c).unwrap();
        let subs = parsed.subrecords(true).unwrap();
        assert_eq!(subs.len(), 3);
        assert!(subs[1].diagnostic.is_some());
        assert!(subs[2].value.is_some(), "walker should keep going after the OBND failure");
    }
}
