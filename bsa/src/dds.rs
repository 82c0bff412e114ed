//! DDS header reconstruction from a compact BA2/DX10 texture descriptor
//! (spec component C0d). Byte layout follows the Microsoft DDS_HEADER /
//! DDS_HEADER_DX10 specification, cross-checked against
//! `bethesda_structs.contrib.dds` in the original implementation.

const DDS_MAGIC: [u8; 4] = *b"DDS ";

const DDSD_CAPS: u32 = 0x1;
const DDSD_HEIGHT: u32 = 0x2;
const DDSD_WIDTH: u32 = 0x4;
const DDSD_PIXELFORMAT: u32 = 0x1000;
const DDSD_MIPMAPCOUNT: u32 = 0x2_0000;
const DDSD_LINEARSIZE: u32 = 0x8_0000;
const HEADER_FLAGS: u32 = DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT | DDSD_MIPMAPCOUNT | DDSD_LINEARSIZE;

const DDSCAPS_COMPLEX: u32 = 0x8;
const DDSCAPS_TEXTURE: u32 = 0x1000;
const DDSCAPS_MIPMAP: u32 = 0x40_0000;
const CAPS: u32 = DDSCAPS_COMPLEX | DDSCAPS_TEXTURE | DDSCAPS_MIPMAP;

const DDSCAPS2_CUBEMAP: u32 = 0x200;
const DDSCAPS2_CUBEMAP_POSITIVEX: u32 = 0x400;
const DDSCAPS2_CUBEMAP_NEGATIVEX: u32 = 0x800;
const DDSCAPS2_CUBEMAP_POSITIVEY: u32 = 0x1000;
const DDSCAPS2_CUBEMAP_NEGATIVEY: u32 = 0x2000;
const DDSCAPS2_CUBEMAP_POSITIVEZ: u32 = 0x4000;
const DDSCAPS2_CUBEMAP_NEGATIVEZ: u32 = 0x8000;
const CAPS2_CUBEMAP_ALL_FACES: u32 = DDSCAPS2_CUBEMAP
    | DDSCAPS2_CUBEMAP_POSITIVEX
    | DDSCAPS2_CUBEMAP_NEGATIVEX
    | DDSCAPS2_CUBEMAP_POSITIVEY
    | DDSCAPS2_CUBEMAP_NEGATIVEY
    | DDSCAPS2_CUBEMAP_POSITIVEZ
    | DDSCAPS2_CUBEMAP_NEGATIVEZ;

const DDPF_ALPHAPIXELS: u32 = 0x1;
const DDPF_FOURCC: u32 = 0x4;
const DDPF_RGB: u32 = 0x40;

/// The reserved-field value that, per a community reverse-engineering
/// convention (spec.md §9 open question), marks a DX10 texture as a
/// cubemap. No other value of this field has documented meaning.
pub const CUBEMAP_RESERVED_MARKER: u16 = 2049;

/// DXGI formats this decoder knows how to turn into a DDS pixel format.
/// Anything else is an "unknown format" per spec.md §4.3's edge policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DxgiFormat {
    Bc1Unorm,
    Bc2Unorm,
    Bc3Unorm,
    Bc5Unorm,
    Bc7Unorm,
    Bc7UnormSrgb,
    B8g8r8a8Unorm,
    R8Unorm,
}

impl DxgiFormat {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            71 => Some(DxgiFormat::Bc1Unorm),
            74 => Some(DxgiFormat::Bc2Unorm),
            77 => Some(DxgiFormat::Bc3Unorm),
            83 => Some(DxgiFormat::Bc5Unorm),
            98 => Some(DxgiFormat::Bc7Unorm),
            99 => Some(DxgiFormat::Bc7UnormSrgb),
            87 => Some(DxgiFormat::B8g8r8a8Unorm),
            61 => Some(DxgiFormat::R8Unorm),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            DxgiFormat::Bc1Unorm => 71,
            DxgiFormat::Bc2Unorm => 74,
            DxgiFormat::Bc3Unorm => 77,
            DxgiFormat::Bc5Unorm => 83,
            DxgiFormat::Bc7Unorm => 98,
            DxgiFormat::Bc7UnormSrgb => 99,
            DxgiFormat::B8g8r8a8Unorm => 87,
            DxgiFormat::R8Unorm => 61,
        }
    }

    fn needs_dx10_header(&self) -> bool {
        matches!(self, DxgiFormat::Bc7Unorm | DxgiFormat::Bc7UnormSrgb)
    }
}

pub const fn fourcc(c0: u8, c1: u8, c2: u8, c3: u8) -> u32 {
    (c0 as u32) | (c1 as u32) << 8 | (c2 as u32) << 16 | (c3 as u32) << 24
}

/// Compact description of one BA2/DX10 texture, enough to rebuild its DDS
/// header without touching the mip payload.
#[derive(Debug, Clone, Copy)]
pub struct TextureDescriptor {
    pub width: u16,
    pub height: u16,
    pub mip_count: u8,
    pub format: DxgiFormat,
    pub cubemap: bool,
}

/// Build `"DDS "` + DDS_HEADER (+ optional DDS_HEADER_DX10) for the given
/// descriptor. Returns the header bytes and the `dwPitchOrLinearSize`
/// value, which callers need to assemble the first mip's chunk.
pub fn build_dds_header(desc: &TextureDescriptor) -> (Vec<u8>, u32) {
    let w = desc.width as u32;
    let h = desc.height as u32;

    let (ddspf_flags, fourcc_value, rgb_bit_count, masks, linear_size) = match desc.format {
        DxgiFormat::Bc1Unorm => (DDPF_FOURCC, fourcc(b'D', b'X', b'T', b'1'), 0, [0u32; 4], w * h / 2),
        DxgiFormat::Bc2Unorm => (DDPF_FOURCC, fourcc(b'D', b'X', b'T', b'3'), 0, [0u32; 4], w * h),
        DxgiFormat::Bc3Unorm => (DDPF_FOURCC, fourcc(b'D', b'X', b'T', b'5'), 0, [0u32; 4], w * h),
        DxgiFormat::Bc5Unorm => (DDPF_FOURCC, fourcc(b'A', b'T', b'I', b'2'), 0, [0u32; 4], w * h),
        DxgiFormat::Bc7Unorm | DxgiFormat::Bc7UnormSrgb => {
            (DDPF_FOURCC, fourcc(b'D', b'X', b'1', b'0'), 0, [0u32; 4], w * h)
        }
        DxgiFormat::B8g8r8a8Unorm => (
            DDPF_RGB | DDPF_ALPHAPIXELS,
            0,
            32,
            [0x00FF0000, 0x0000FF00, 0x000000FF, 0xFF000000],
            w * h * 4,
        ),
        DxgiFormat::R8Unorm => (DDPF_RGB, 0, 8, [0x000000FF, 0, 0, 0], w * h),
    };

    let mut caps2 = 0u32;
    if desc.cubemap {
        caps2 = CAPS2_CUBEMAP_ALL_FACES;
    }

    let mut out = Vec::with_capacity(4 + 124 + if desc.format.needs_dx10_header() { 20 } else { 0 });
    out.extend_from_slice(&DDS_MAGIC);

    // DDS_HEADER
    out.extend_from_slice(&124u32.to_le_bytes()); // dwSize
    out.extend_from_slice(&HEADER_FLAGS.to_le_bytes());
    out.extend_from_slice(&h.to_le_bytes());
    out.extend_from_slice(&w.to_le_bytes());
    out.extend_from_slice(&linear_size.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // dwDepth
    out.extend_from_slice(&(desc.mip_count as u32).to_le_bytes());
    for _ in 0..11 {
        out.extend_from_slice(&0u32.to_le_bytes()); // dwReserved1
    }
    // DDS_PIXELFORMAT
    out.extend_from_slice(&32u32.to_le_bytes()); // dwSize
    out.extend_from_slice(&ddspf_flags.to_le_bytes());
    out.extend_from_slice(&fourcc_value.to_le_bytes());
    out.extend_from_slice(&rgb_bit_count.to_le_bytes());
    for mask in masks {
        out.extend_from_slice(&mask.to_le_bytes());
    }
    out.extend_from_slice(&CAPS.to_le_bytes());
    out.extend_from_slice(&caps2.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // dwCaps3
    out.extend_from_slice(&0u32.to_le_bytes()); // dwCaps4
    out.extend_from_slice(&0u32.to_le_bytes()); // dwReserved2

    if desc.format.needs_dx10_header() {
        const D3D10_RESOURCE_DIMENSION_TEXTURE2D: u32 = 3;
        const D3D10_RESOURCE_MISC_TEXTURECUBE: u32 = 0x4;
        out.extend_from_slice(&(desc.format.code() as u32).to_le_bytes());
        out.extend_from_slice(&D3D10_RESOURCE_DIMENSION_TEXTURE2D.to_le_bytes());
        let misc_flag = if desc.cubemap { D3D10_RESOURCE_MISC_TEXTURECUBE } else { 0 };
        out.extend_from_slice(&misc_flag.to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes()); // arraySize
        out.extend_from_slice(&0u32.to_le_bytes()); // miscFlags2
    }

    (out, linear_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s4_bc1_header_shape() {
        let desc = TextureDescriptor { width: 4, height: 4, mip_count: 1, format: DxgiFormat::Bc1Unorm, cubemap: false };
        let (header, linear_size) = build_dds_header(&desc);
        assert_eq!(&header[0..4], b"DDS ");
        assert_eq!(header.len(), 4 + 124);
        let dw_size = u32::from_le_bytes(header[4..8].try_into().unwrap());
        assert_eq!(dw_size, 124);
        let ddspf_size = u32::from_le_bytes(header[4 + 72..4 + 76].try_into().unwrap());
        assert_eq!(ddspf_size, 32);
        let width = u32::from_le_bytes(header[4 + 12..4 + 16].try_into().unwrap());
        let height = u32::from_le_bytes(header[4 + 8..4 + 12].try_into().unwrap());
        assert_eq!(width, 4);
        assert_eq!(height, 4);
        assert_eq!(linear_size, 8);
        let fourcc_value = u32::from_le_bytes(header[4 + 80..4 + 84].try_into().unwrap());
        assert_eq!(fourcc_value, fourcc(b'D', b'X', b'T', b'1'));
    }

    #[test]
    fn bc7_emits_dx10_header() {
        let desc = TextureDescriptor { width: 8, height: 8, mip_count: 1, format: DxgiFormat::Bc7Unorm, cubemap: false };
        let (header, _) = build_dds_header(&desc);
        assert_eq!(header.len(), 4 + 124 + 20);
    }

    #[test]
    fn cubemap_sets_all_six_caps2_faces() {
        let desc = TextureDescriptor { width: 8, height: 8, mip_count: 1, format: DxgiFormat::Bc1Unorm, cubemap: true };
        let (header, _) = build_dds_header(&desc);
        let caps2 = u32::from_le_bytes(header[4 + 108..4 + 112].try_into().unwrap());
        assert_eq!(caps2, CAPS2_CUBEMAP_ALL_FACES);
    }

    #[test]
    fn unknown_dxgi_code_is_none() {
        assert_eq!(DxgiFormat::from_code(255), None);
    }
}
