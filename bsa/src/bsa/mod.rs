//! BSA (v103/104/105) archive decoding (spec component C1a).

use bytemuck::{Pod, Zeroable};
use enumflags2::{bitflags, BitFlags};

use crate::compress::Codec;
use crate::cursor::Cursor;
use crate::error::Error;
use crate::ArchiveFile;

pub const MAGIC: [u8; 4] = *b"BSA\0";
pub const SIZE_MASK: u32 = 0x3FFF_FFFF;
pub const COMPRESSED_MASK: u32 = 0xC000_0000;

#[bitflags]
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFlag {
    DirectoriesNamed = 0x001,
    FilesNamed = 0x002,
    FilesCompressed = 0x004,
    Xbox360 = 0x040,
    FilesPrefixed = 0x100,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct RawHeader {
    magic: [u8; 4],
    version: u32,
    directory_offset: u32,
    archive_flags: u32,
    directory_count: u32,
    file_count: u32,
    directory_names_length: u32,
    file_names_length: u32,
    file_flags: u32,
}

/// Immutable parsed BSA header. `archive_flags_raw`/`file_flags` keep the
/// full 32-bit word so unknown bits survive a round trip untouched.
#[derive(Debug, Clone)]
pub struct BsaHeader {
    pub version: u32,
    pub directory_offset: u32,
    pub archive_flags: BitFlags<ArchiveFlag>,
    pub archive_flags_raw: u32,
    pub directory_count: u32,
    pub file_count: u32,
    pub directory_names_length: u32,
    pub file_names_length: u32,
    pub file_flags: u32,
}

impl BsaHeader {
    fn parse(c: &mut Cursor) -> Result<Self, Error> {
        let bytes = c.take(36)?;
        let raw: RawHeader = bytemuck::pod_read_unaligned(bytes);
        if raw.magic != MAGIC {
            return Err(Error::UnsupportedFormat { magic: raw.magic, version: raw.version });
        }
        if !matches!(raw.version, 103 | 104 | 105) {
            return Err(Error::UnsupportedFormat { magic: raw.magic, version: raw.version });
        }
        let archive_flags = BitFlags::<ArchiveFlag>::from_bits_truncate(raw.archive_flags);
        Ok(BsaHeader {
            version: raw.version,
            directory_offset: raw.directory_offset,
            archive_flags,
            archive_flags_raw: raw.archive_flags,
            directory_count: raw.directory_count,
            file_count: raw.file_count,
            directory_names_length: raw.directory_names_length,
            file_names_length: raw.file_names_length,
            file_flags: raw.file_flags,
        })
    }

    /// Byte-perfect re-encode (spec.md §8 property 8).
    pub fn encode(&self) -> Vec<u8> {
        let raw = RawHeader {
            magic: MAGIC,
            version: self.version,
            directory_offset: self.directory_offset,
            archive_flags: self.archive_flags_raw,
            directory_count: self.directory_count,
            file_count: self.file_count,
            directory_names_length: self.directory_names_length,
            file_names_length: self.file_names_length,
            file_flags: self.file_flags,
        };
        bytemuck::bytes_of(&raw).to_vec()
    }
}

/// Hash, file count, and name-table offset for one directory. v105 widens
/// the name offset to a u64 and inserts a reserved u32 (spec.md §6).
#[derive(Debug, Clone)]
pub struct DirectoryRecord {
    pub hash: u64,
    pub file_count: u32,
    pub reserved: Option<u32>,
    pub name_offset: u64,
}

impl DirectoryRecord {
    fn parse(c: &mut Cursor, version: u32) -> Result<Self, Error> {
        let hash = c.read_u64()?;
        let file_count = c.read_u32()?;
        if version == 105 {
            let reserved = c.read_u32()?;
            let name_offset = c.read_u64()?;
            Ok(DirectoryRecord { hash, file_count, reserved: Some(reserved), name_offset })
        } else {
            let name_offset = c.read_u32()? as u64;
            Ok(DirectoryRecord { hash, file_count, reserved: None, name_offset })
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct RawFileRecord {
    hash: u64,
    size_with_flags: u32,
    offset: u32,
}

#[derive(Debug, Clone)]
pub struct FileRecord {
    pub hash: u64,
    pub size_with_flags: u32,
    pub offset: u32,
}

impl FileRecord {
    fn parse(c: &mut Cursor) -> Result<Self, Error> {
        let bytes = c.take(16)?;
        let raw: RawFileRecord = bytemuck::pod_read_unaligned(bytes);
        Ok(FileRecord { hash: raw.hash, size_with_flags: raw.size_with_flags, offset: raw.offset })
    }

    pub fn stored_size(&self) -> u32 {
        self.size_with_flags & SIZE_MASK
    }

    pub fn compressed_bit(&self) -> bool {
        self.size_with_flags & COMPRESSED_MASK != 0
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryBlock {
    pub name: Option<String>,
    pub dir_hash: u64,
    pub files: Vec<FileRecord>,
}

/// A fully-indexed BSA archive over a borrowed buffer. Parsing reads the
/// header, directory table, and directory blocks eagerly (they're small
/// and needed to plan iteration); file contents are decoded lazily by
/// `files()`.
#[derive(Debug, Clone)]
pub struct BsaArchive<'a> {
    pub header: BsaHeader,
    pub directories: Vec<DirectoryRecord>,
    pub blocks: Vec<DirectoryBlock>,
    pub file_names: Vec<String>,
    buf: &'a [u8],
}

pub fn accepts(buf: &[u8]) -> bool {
    buf.len() >= 8 && buf[0..4] == MAGIC && matches!(u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]), 103 | 104 | 105)
}

pub fn parse(buf: &[u8]) -> Result<BsaArchive<'_>, Error> {
    let mut c = Cursor::new(buf);
    let header = BsaHeader::parse(&mut c)?;

    let mut directories = Vec::with_capacity(header.directory_count as usize);
    for _ in 0..header.directory_count {
        directories.push(DirectoryRecord::parse(&mut c, header.version)?);
    }

    let mut blocks = Vec::with_capacity(header.directory_count as usize);
    for dir in &directories {
        let name = if header.archive_flags.contains(ArchiveFlag::DirectoriesNamed) {
            Some(c.read_u8_len_nul_string()?)
        } else {
            None
        };
        let mut files = Vec::with_capacity(dir.file_count as usize);
        for _ in 0..dir.file_count {
            files.push(FileRecord::parse(&mut c)?);
        }
        blocks.push(DirectoryBlock { name, dir_hash: dir.hash, files });
    }

    let file_names = if header.archive_flags.contains(ArchiveFlag::FilesNamed) {
        let mut v = Vec::with_capacity(header.file_count as usize);
        for _ in 0..header.file_count {
            v.push(c.read_nul_string()?);
        }
        v
    } else {
        Vec::new()
    };

    Ok(BsaArchive { header, directories, blocks, file_names, buf })
}

impl<'a> BsaArchive<'a> {
    /// Lazily decode and yield every file, in header-declaration order
    /// (spec.md §5 ordering guarantee).
    pub fn files<'b>(&'b self) -> BsaFileIter<'a, 'b> {
        BsaFileIter { archive: self, dir_idx: 0, file_idx_in_dir: 0, running_index: 0 }
    }

    fn decode_entry(&self, block: &DirectoryBlock, fr: &FileRecord, file_index: usize) -> Result<ArchiveFile, Error> {
        let stored_size = fr.stored_size() as usize;
        let per_file_compressed = fr.compressed_bit();
        let archive_compressed = self.header.archive_flags.contains(ArchiveFlag::FilesCompressed);
        let entry_compressed = archive_compressed ^ per_file_compressed;

        let start = fr.offset as usize;
        let end = start
            .checked_add(stored_size)
            .filter(|&e| e <= self.buf.len())
            .ok_or(Error::TruncatedInput { want: stored_size, have: self.buf.len().saturating_sub(start), at: start })?;
        let mut blob = Cursor::new(&self.buf[start..end]);

        if self.header.archive_flags.contains(ArchiveFlag::FilesPrefixed) && self.header.version >= 104 {
            blob.read_nul_string()?;
        }

        let data = if entry_compressed {
            let original_size = blob.read_u32()? as usize;
            let codec = if self.header.version == 105 { Codec::Lz4 } else { Codec::Zlib };
            codec.decompress(blob.rest(), original_size)?
        } else {
            blob.rest().to_vec()
        };

        let name = if self.header.archive_flags.contains(ArchiveFlag::FilesNamed) {
            match self.file_names.get(file_index) {
                Some(n) => n.clone(),
                None => {
                    return Err(Error::schema(format!(
                        "file_index {} out of range for file-names table of length {} (corrupt or misversioned archive)",
                        file_index,
                        self.file_names.len()
                    )))
                }
            }
        } else {
            format!("{:016x}", fr.hash)
        };

        let mut segments: Vec<String> = Vec::new();
        if let Some(dir_name) = &block.name {
            segments.extend(split_path(dir_name));
        }
        segments.extend(split_path(&name));
        if segments.iter().any(|s| s == "..") {
            return Err(Error::schema("path traversal attempt in archive entry"));
        }

        Ok(ArchiveFile { path: segments.join("/"), hash: fr.hash, data })
    }
}

fn split_path(s: &str) -> Vec<String> {
    s.replace('\\', "/").split('/').filter(|s| !s.is_empty()).map(String::from).collect()
}

pub struct BsaFileIter<'a, 'b> {
    archive: &'b BsaArchive<'a>,
    dir_idx: usize,
    file_idx_in_dir: usize,
    running_index: usize,
}

impl<'a, 'b> Iterator for BsaFileIter<'a, 'b> {
    type Item = Result<ArchiveFile, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let block = self.archive.blocks.get(self.dir_idx)?;
            if self.file_idx_in_dir >= block.files.len() {
                self.dir_idx += 1;
                self.file_idx_in_dir = 0;
                continue;
            }
            let fr = &block.files[self.file_idx_in_dir];
            let result = self.archive.decode_entry(block, fr, self.running_index);
            self.file_idx_in_dir += 1;
            self.running_index += 1;
            return Some(result);
        }
    }
}
