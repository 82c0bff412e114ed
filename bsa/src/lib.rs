//! Reader for Bethesda Softworks archives: BSA (v103/104/105, used by
//! Oblivion/Fallout 3/New Vegas/Skyrim) and BA2/BTDX (used by Fallout 4).
//!
//! The crate never writes archives — only decodes them — and never
//! touches the filesystem except through [`extract_to`], which is a thin,
//! synchronous loop over an already-open [`Archive`].

pub mod ba2;
pub mod bsa;
pub mod compress;
pub mod cursor;
pub mod dds;
pub mod error;
pub mod fourcc;

use std::fs;
use std::path::{Path, PathBuf};

pub use error::Error;

/// A single extractable entry: a logical, forward-slash path plus its
/// fully decompressed bytes (spec.md §3 `ArchiveFile`).
///
/// `hash` carries the entry's raw on-disk identity hash even once `path`
/// is known (BSA: the file record's own 64-bit hash; BA2: the 32-bit name
/// hash widened to 64 bits) — lets a caller cross-reference against
/// tooling that only knows hashes (teacher: `bsa::read::EntryId`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    pub path: String,
    pub hash: u64,
    pub data: Vec<u8>,
}

/// Either archive family this crate understands, dispatched on magic
/// number by [`Archive::open`] (spec component C0f).
pub enum Archive<'a> {
    Bsa(bsa::BsaArchive<'a>),
    Ba2(ba2::Ba2Archive<'a>),
}

impl<'a> Archive<'a> {
    /// Try each registered decoder's acceptance test in turn (BSA, then
    /// BTDX) and parse with the first one that accepts.
    pub fn open(buf: &'a [u8]) -> Result<Self, Error> {
        if bsa::accepts(buf) {
            log::debug!("front door: BSA decoder accepted input");
            return Ok(Archive::Bsa(bsa::parse(buf)?));
        }
        if ba2::accepts(buf) {
            log::debug!("front door: BTDX decoder accepted input");
            return Ok(Archive::Ba2(ba2::parse(buf)?));
        }
        let magic = buf.get(0..4).map(|m| [m[0], m[1], m[2], m[3]]).unwrap_or([0; 4]);
        let version = buf.get(4..8).map(|v| u32::from_le_bytes([v[0], v[1], v[2], v[3]])).unwrap_or(0);
        log::debug!("front door: no decoder accepted input (magic {:?})", magic);
        Err(Error::UnsupportedFormat { magic, version })
    }

    pub fn files<'b>(&'b self) -> Box<dyn Iterator<Item = Result<ArchiveFile, Error>> + 'b> {
        match self {
            Archive::Bsa(a) => Box::new(a.files()),
            Archive::Ba2(a) => Box::new(a.files()),
        }
    }
}

/// Observer invoked twice per extracted file: once before the write and
/// once after, with cumulative and total byte counts (spec.md §4.7).
/// Must not retain the `path` reference past the call (spec.md §5).
pub trait ProgressSink {
    fn on_progress(&mut self, done_bytes: u64, total_bytes: u64, path: &str);
}

/// Decode every entry of `archive` and write it under `to_dir`, creating
/// parent directories as needed. Rejects any entry whose path attempts to
/// traverse above `to_dir`.
pub fn extract_to(archive: &Archive, to_dir: &Path, mut progress: Option<&mut dyn ProgressSink>) -> Result<(), Error> {
    let entries: Vec<ArchiveFile> = archive.files().collect::<Result<_, _>>()?;
    let total_bytes: u64 = entries.iter().map(|f| f.data.len() as u64).sum();
    let mut done_bytes = 0u64;

    for entry in entries {
        let dest = join_checked(to_dir, &entry.path)?;
        if let Some(sink) = progress.as_deref_mut() {
            sink.on_progress(done_bytes, total_bytes, &entry.path);
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::schema(format!("creating {}: {}", parent.display(), e)))?;
        }
        fs::write(&dest, &entry.data).map_err(|e| Error::schema(format!("writing {}: {}", dest.display(), e)))?;
        done_bytes += entry.data.len() as u64;
        if let Some(sink) = progress.as_deref_mut() {
            sink.on_progress(done_bytes, total_bytes, &entry.path);
        }
    }
    Ok(())
}

fn join_checked(base: &Path, rel: &str) -> Result<PathBuf, Error> {
    let mut out = base.to_path_buf();
    for segment in rel.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            return Err(Error::schema(format!("path traversal attempt in extracted entry: {}", rel)));
        }
        out.push(segment);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_magic() {
        let buf = [0u8; 16];
        match Archive::open(&buf) {
            Err(Error::UnsupportedFormat { .. }) => {}
            other => panic!("expected UnsupportedFormat, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn join_checked_rejects_traversal() {
        let base = Path::new("/tmp/out");
        assert!(join_checked(base, "textures/../../etc/passwd").is_err());
        assert_eq!(join_checked(base, "textures/a.dds").unwrap(), base.join("textures").join("a.dds"));
    }
}
