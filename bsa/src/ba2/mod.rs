//! BA2/BTDX archive decoding: GNRL (general files) and DX10 (textures)
//! variants (spec component C1b). The teacher project has no BA2 support
//! at all; this module is built directly from spec.md §6 and
//! cross-checked against `bethesda_structs.archive.btdx` in the original
//! implementation.

use crate::compress::Codec;
use crate::cursor::Cursor;
use crate::dds::{build_dds_header, DxgiFormat, TextureDescriptor, CUBEMAP_RESERVED_MARKER};
use crate::error::Error;
use crate::ArchiveFile;

pub const MAGIC: [u8; 4] = *b"BTDX";
pub const TYPE_GNRL: [u8; 4] = *b"GNRL";
pub const TYPE_DX10: [u8; 4] = *b"DX10";

#[derive(Debug, Clone)]
pub struct Ba2Header {
    pub version: u32,
    pub kind: [u8; 4],
    pub file_count: u32,
    pub names_offset: u64,
}

impl Ba2Header {
    fn parse(c: &mut Cursor) -> Result<Self, Error> {
        let magic = c.read_array4()?;
        if magic != MAGIC {
            return Err(Error::UnsupportedFormat { magic, version: 0 });
        }
        let version = c.read_u32()?;
        if version < 1 {
            return Err(Error::UnsupportedFormat { magic, version });
        }
        let kind = c.read_array4()?;
        if kind != TYPE_GNRL && kind != TYPE_DX10 {
            return Err(Error::UnsupportedFormat { magic, version });
        }
        let file_count = c.read_u32()?;
        let names_offset = c.read_u64()?;
        Ok(Ba2Header { version, kind, file_count, names_offset })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(24);
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.kind);
        out.extend_from_slice(&self.file_count.to_le_bytes());
        out.extend_from_slice(&self.names_offset.to_le_bytes());
        out
    }
}

#[derive(Debug, Clone)]
pub struct GnrlFile {
    pub name_hash: u32,
    pub ext: [u8; 4],
    pub dir_hash: u32,
    pub offset: u64,
    pub packed_size: u32,
    pub original_size: u32,
}

impl GnrlFile {
    /// Read field-by-field rather than casting a `Pod` struct over the raw
    /// bytes: the `u64 offset` field would force 8-byte alignment on a
    /// packed `u32, [u8;4], u32, u32, u64, u32, u32, u32` layout, padding
    /// its `size_of` to 40 bytes against the format's 36-byte record.
    fn parse(c: &mut Cursor) -> Result<Self, Error> {
        let name_hash = c.read_u32()?;
        let ext = c.read_array4()?;
        let dir_hash = c.read_u32()?;
        c.skip(4)?; // reserved
        let offset = c.read_u64()?;
        let packed_size = c.read_u32()?;
        let original_size = c.read_u32()?;
        c.skip(4)?; // reserved
        Ok(GnrlFile { name_hash, ext, dir_hash, offset, packed_size, original_size })
    }
}

#[derive(Debug, Clone)]
pub struct TexChunk {
    pub offset: u64,
    pub packed_size: u32,
    pub unpacked_size: u32,
    pub start_mip: u16,
    pub end_mip: u16,
}

impl TexChunk {
    fn parse(c: &mut Cursor) -> Result<Self, Error> {
        let offset = c.read_u64()?;
        let packed_size = c.read_u32()?;
        let unpacked_size = c.read_u32()?;
        let start_mip = c.read_u16()?;
        let end_mip = c.read_u16()?;
        c.skip(4)?; // reserved
        Ok(TexChunk { offset, packed_size, unpacked_size, start_mip, end_mip })
    }
}

#[derive(Debug, Clone)]
pub struct TexFile {
    pub hash: u32,
    pub ext: [u8; 4],
    pub dir_hash: u32,
    pub chunk_header_size: u16,
    pub height: u16,
    pub width: u16,
    pub mip_count: u8,
    pub dxgi_format: u8,
    /// Preserved unconditionally; only the literal value
    /// `CUBEMAP_RESERVED_MARKER` (2049) is given special meaning.
    pub reserved: u16,
    pub chunks: Vec<TexChunk>,
}

impl TexFile {
    fn parse(c: &mut Cursor) -> Result<Self, Error> {
        let hash = c.read_u32()?;
        let ext = c.read_array4()?;
        let dir_hash = c.read_u32()?;
        c.skip(1)?; // _r
        let chunk_count = c.read_u8()?;
        let chunk_header_size = c.read_u16()?;
        let height = c.read_u16()?;
        let width = c.read_u16()?;
        let mip_count = c.read_u8()?;
        let dxgi_format = c.read_u8()?;
        let reserved = c.read_u16()?;
        let mut chunks = Vec::with_capacity(chunk_count as usize);
        for _ in 0..chunk_count {
            chunks.push(TexChunk::parse(c)?);
        }
        Ok(TexFile { hash, ext, dir_hash, chunk_header_size, height, width, mip_count, dxgi_format, reserved, chunks })
    }

    fn is_cubemap(&self) -> bool {
        self.reserved == CUBEMAP_RESERVED_MARKER
    }
}

#[derive(Debug, Clone)]
pub enum FileDescriptor {
    Gnrl(GnrlFile),
    Tex(TexFile),
}

#[derive(Debug, Clone)]
pub struct Ba2Archive<'a> {
    pub header: Ba2Header,
    pub entries: Vec<FileDescriptor>,
    pub names: Vec<String>,
    buf: &'a [u8],
}

pub fn accepts(buf: &[u8]) -> bool {
    buf.len() >= 12
        && buf[0..4] == MAGIC
        && u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]) >= 1
        && (buf[8..12] == TYPE_GNRL || buf[8..12] == TYPE_DX10)
}

pub fn parse(buf: &[u8]) -> Result<Ba2Archive<'_>, Error> {
    let mut c = Cursor::new(buf);
    let header = Ba2Header::parse(&mut c)?;

    let mut entries = Vec::with_capacity(header.file_count as usize);
    for _ in 0..header.file_count {
        let entry = if header.kind == TYPE_GNRL {
            FileDescriptor::Gnrl(GnrlFile::parse(&mut c)?)
        } else {
            FileDescriptor::Tex(TexFile::parse(&mut c)?)
        };
        entries.push(entry);
    }

    let mut name_cursor = c.at(header.names_offset as usize)?;
    let mut names = Vec::with_capacity(header.file_count as usize);
    for _ in 0..header.file_count {
        names.push(
            name_cursor
                .read_u16_len_string()
                .map_err(|_| Error::schema("BA2 name table shorter than file_count"))?,
        );
    }

    Ok(Ba2Archive { header, entries, names, buf })
}

impl<'a> Ba2Archive<'a> {
    pub fn files<'b>(&'b self) -> Ba2FileIter<'a, 'b> {
        Ba2FileIter { archive: self, index: 0 }
    }

    fn decode_gnrl(&self, file: &GnrlFile) -> Result<Vec<u8>, Error> {
        let start = file.offset as usize;
        let stored_len = if file.packed_size > 0 { file.packed_size } else { file.original_size } as usize;
        let end = start
            .checked_add(stored_len)
            .filter(|&e| e <= self.buf.len())
            .ok_or(Error::TruncatedInput { want: stored_len, have: self.buf.len().saturating_sub(start), at: start })?;
        let raw = &self.buf[start..end];
        if file.packed_size > 0 {
            Codec::Zlib.decompress(raw, file.original_size as usize)
        } else {
            Ok(raw.to_vec())
        }
    }

    fn decode_tex(&self, tex: &TexFile) -> Result<Option<Vec<u8>>, Error> {
        let format = match DxgiFormat::from_code(tex.dxgi_format) {
            Some(f) => f,
            None => {
                log::warn!("skipping DX10 texture with unrecognized DXGI format {}", tex.dxgi_format);
                return Ok(None);
            }
        };
        let desc = TextureDescriptor {
            width: tex.width,
            height: tex.height,
            mip_count: tex.mip_count,
            format,
            cubemap: tex.is_cubemap(),
        };
        let (mut out, _linear_size) = build_dds_header(&desc);

        for chunk in &tex.chunks {
            let start = chunk.offset as usize;
            let stored_len = if chunk.packed_size > 0 { chunk.packed_size } else { chunk.unpacked_size } as usize;
            let end = start
                .checked_add(stored_len)
                .filter(|&e| e <= self.buf.len())
                .ok_or(Error::TruncatedInput { want: stored_len, have: self.buf.len().saturating_sub(start), at: start })?;
            let raw = &self.buf[start..end];
            if chunk.packed_size > 0 {
                out.extend_from_slice(&Codec::Zlib.decompress(raw, chunk.unpacked_size as usize)?);
            } else {
                out.extend_from_slice(raw);
            }
        }

        Ok(Some(out))
    }
}

pub struct Ba2FileIter<'a, 'b> {
    archive: &'b Ba2Archive<'a>,
    index: usize,
}

impl<'a, 'b> Iterator for Ba2FileIter<'a, 'b> {
    type Item = Result<ArchiveFile, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = self.archive.entries.get(self.index)?;
            let name = self.archive.names.get(self.index).cloned().unwrap_or_default();
            let path = name.replace('\\', "/");
            let result = match entry {
                FileDescriptor::Gnrl(f) => {
                    let hash = f.name_hash as u64;
                    self.archive.decode_gnrl(f).map(|data| Some(ArchiveFile { path, hash, data }))
                }
                FileDescriptor::Tex(t) => {
                    let hash = t.hash as u64;
                    self.archive.decode_tex(t).map(|maybe| maybe.map(|data| ArchiveFile { path, hash, data }))
                }
            };
            self.index += 1;
            match result {
                Ok(Some(file)) => return Some(Ok(file)),
                Ok(None) => continue, // unrecognized DXGI format: skip, already logged
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
