//! Crate-root integration tests for spec.md §8 scenarios S1-S4.
//!
//! Each test builds its input as a raw byte array in-place (no fixture
//! files) and drives the crate exclusively through its public API
//! (`bsa::Archive::open` / `ArchiveFile`), rather than any internal
//! module's `parse()`.

use bsa::bsa::ArchiveFlag;
use bsa::ba2::{TYPE_DX10, TYPE_GNRL};
use bsa::Archive;
use enumflags2::BitFlags;

fn le_u16(v: u16) -> [u8; 2] {
    v.to_le_bytes()
}
fn le_u32(v: u32) -> [u8; 4] {
    v.to_le_bytes()
}
fn le_u64(v: u64) -> [u8; 8] {
    v.to_le_bytes()
}

#[test]
fn s1_single_uncompressed_bsa_file() {
    let mut v = Vec::new();
    v.extend_from_slice(b"BSA\0");
    v.extend_from_slice(&le_u32(104));
    v.extend_from_slice(&le_u32(36)); // directory_offset, unused by parse
    let flags = BitFlags::<ArchiveFlag>::from(ArchiveFlag::DirectoriesNamed) | ArchiveFlag::FilesNamed;
    v.extend_from_slice(&le_u32(flags.bits()));
    v.extend_from_slice(&le_u32(1)); // directory_count
    v.extend_from_slice(&le_u32(1)); // file_count
    v.extend_from_slice(&le_u32(0)); // directory_names_length
    v.extend_from_slice(&le_u32(0)); // file_names_length
    v.extend_from_slice(&le_u32(0)); // file_flags

    // directory record (v104: hash, file_count, u32 name_offset)
    v.extend_from_slice(&le_u64(0x1234));
    v.extend_from_slice(&le_u32(1));
    v.extend_from_slice(&le_u32(0));

    // directory block: name "textures", one file record
    v.push(9);
    v.extend_from_slice(b"textures\0");
    v.extend_from_slice(&le_u64(0x5678));
    v.extend_from_slice(&le_u32(4)); // size_with_flags: 4 bytes, uncompressed
    let offset_pos = v.len();
    v.extend_from_slice(&le_u32(0));

    v.extend_from_slice(b"a.dds\0");

    let data_start = v.len() as u32;
    v.extend_from_slice(&[0x01, 0x02, 0x03, 0x04]);
    v[offset_pos..offset_pos + 4].copy_from_slice(&le_u32(data_start));

    let archive = Archive::open(&v).expect("BSA header accepted");
    let files: Vec<_> = archive.files().map(|r| r.expect("entry decodes")).collect();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "textures/a.dds");
    assert_eq!(files[0].data, vec![0x01, 0x02, 0x03, 0x04]);
}

#[test]
fn s2_compressed_bit_xor_global_flag_yields_uncompressed_file() {
    // v105 archive, files_compressed flag set; the single file's
    // size_with_flags has the compressed-mask bit set too, which
    // inverts the global flag off for this entry.
    let mut v = Vec::new();
    v.extend_from_slice(b"BSA\0");
    v.extend_from_slice(&le_u32(105));
    v.extend_from_slice(&le_u32(0));
    let flags = BitFlags::<ArchiveFlag>::from(ArchiveFlag::FilesCompressed);
    v.extend_from_slice(&le_u32(flags.bits()));
    v.extend_from_slice(&le_u32(1));
    v.extend_from_slice(&le_u32(1));
    v.extend_from_slice(&le_u32(0));
    v.extend_from_slice(&le_u32(0));
    v.extend_from_slice(&le_u32(0));

    // v105 directory record: hash, file_count, reserved u32, u64 name_offset
    v.extend_from_slice(&le_u64(0));
    v.extend_from_slice(&le_u32(1));
    v.extend_from_slice(&le_u32(0));
    v.extend_from_slice(&le_u64(0));

    // directory block (no name: DirectoriesNamed not set), one file record
    v.extend_from_slice(&le_u64(0));
    const COMPRESSED_MASK: u32 = 0xC000_0000;
    let size_with_flags = 3u32 | COMPRESSED_MASK;
    v.extend_from_slice(&le_u32(size_with_flags));
    let offset_pos = v.len();
    v.extend_from_slice(&le_u32(0));

    let data_start = v.len() as u32;
    v.extend_from_slice(&[9, 9, 9]);
    v[offset_pos..offset_pos + 4].copy_from_slice(&le_u32(data_start));

    let archive = Archive::open(&v).expect("BSA header accepted");
    let files: Vec<_> = archive.files().map(|r| r.expect("entry decodes")).collect();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].data, vec![9, 9, 9]);
}

#[test]
fn s3_ba2_gnrl_two_files_in_declaration_order() {
    let mut v = Vec::new();
    v.extend_from_slice(b"BTDX");
    v.extend_from_slice(&le_u32(1));
    v.extend_from_slice(&TYPE_GNRL);
    v.extend_from_slice(&le_u32(2));
    v.extend_from_slice(&le_u64(0)); // names_offset, patched below

    let entry1_offset = v.len() as u64 + 36 * 2;
    let original1 = b"hello world, hello world, hello".to_vec();
    let mut encoder = libflate::zlib::Encoder::new(Vec::new()).unwrap();
    std::io::Write::write_all(&mut encoder, &original1).unwrap();
    let compressed1 = encoder.finish().into_result().unwrap();

    v.extend_from_slice(&le_u32(0)); // name_hash
    v.extend_from_slice(b"TEX\0"); // ext
    v.extend_from_slice(&le_u32(0)); // dir_hash
    v.extend_from_slice(&le_u32(0)); // reserved
    v.extend_from_slice(&le_u64(entry1_offset));
    v.extend_from_slice(&le_u32(compressed1.len() as u32));
    v.extend_from_slice(&le_u32(original1.len() as u32));
    v.extend_from_slice(&le_u32(0));

    let entry2_offset = entry1_offset + compressed1.len() as u64;
    let original2 = b"uncompressed payload, second entry".to_vec();
    v.extend_from_slice(&le_u32(0));
    v.extend_from_slice(b"TEX\0");
    v.extend_from_slice(&le_u32(0));
    v.extend_from_slice(&le_u32(0));
    v.extend_from_slice(&le_u64(entry2_offset));
    v.extend_from_slice(&le_u32(0)); // packed_size = 0 (stored uncompressed)
    v.extend_from_slice(&le_u32(original2.len() as u32));
    v.extend_from_slice(&le_u32(0));

    v.extend_from_slice(&compressed1);
    v.extend_from_slice(&original2);

    let names_offset = v.len() as u64;
    v.extend_from_slice(&le_u16(5));
    v.extend_from_slice(b"a.dds");
    v.extend_from_slice(&le_u16(5));
    v.extend_from_slice(b"b.dds");
    v[16..24].copy_from_slice(&le_u64(names_offset));

    let archive = Archive::open(&v).expect("BTDX/GNRL header accepted");
    let files: Vec<_> = archive.files().map(|r| r.expect("entry decodes")).collect();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].path, "a.dds");
    assert_eq!(files[0].data, original1);
    assert_eq!(files[1].path, "b.dds");
    assert_eq!(files[1].data.len(), original2.len());
    assert_eq!(files[1].data, original2);
}

#[test]
fn s4_ba2_dx10_bc1_texture_reconstructs_dds_header() {
    let mut v = Vec::new();
    v.extend_from_slice(b"BTDX");
    v.extend_from_slice(&le_u32(1));
    v.extend_from_slice(&TYPE_DX10);
    v.extend_from_slice(&le_u32(1));
    v.extend_from_slice(&le_u64(0)); // names_offset, patched below

    let chunk_data: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];
    let chunk_offset = v.len() as u64 + 24 + 24; // file header (24) + one chunk header (24)

    v.extend_from_slice(&le_u32(0)); // hash
    v.extend_from_slice(b"dds\0"); // ext
    v.extend_from_slice(&le_u32(0)); // dir_hash
    v.push(0); // reserved byte
    v.push(1); // chunk_count
    v.extend_from_slice(&le_u16(0)); // chunk_header_size
    v.extend_from_slice(&le_u16(4)); // height
    v.extend_from_slice(&le_u16(4)); // width
    v.push(1); // mip_count
    v.push(71); // dxgi_format: BC1_UNORM
    v.extend_from_slice(&le_u16(0)); // reserved (not cubemap)

    // one chunk, stored uncompressed
    v.extend_from_slice(&le_u64(chunk_offset));
    v.extend_from_slice(&le_u32(0)); // packed_size = 0
    v.extend_from_slice(&le_u32(chunk_data.len() as u32));
    v.extend_from_slice(&le_u16(0)); // start_mip
    v.extend_from_slice(&le_u16(0)); // end_mip
    v.extend_from_slice(&le_u32(0)); // reserved

    v.extend_from_slice(&chunk_data);

    let names_offset = v.len() as u64;
    v.extend_from_slice(&le_u16(7));
    v.extend_from_slice(b"t00.dds");
    v[16..24].copy_from_slice(&le_u64(names_offset));

    let archive = Archive::open(&v).expect("BTDX/DX10 header accepted");
    let files: Vec<_> = archive.files().map(|r| r.expect("entry decodes")).collect();
    assert_eq!(files.len(), 1);
    let data = &files[0].data;
    assert_eq!(&data[0..4], b"DDS ");
    let header = &data[4..4 + 124];
    let dw_pitch_or_linear_size = u32::from_le_bytes(header[16..20].try_into().unwrap());
    let dw_height = u32::from_le_bytes(header[8..12].try_into().unwrap());
    let dw_width = u32::from_le_bytes(header[12..16].try_into().unwrap());
    let dw_mip_map_count = u32::from_le_bytes(header[24..28].try_into().unwrap());
    let fourcc = u32::from_le_bytes(header[80..84].try_into().unwrap());
    assert_eq!(dw_width, 4);
    assert_eq!(dw_height, 4);
    assert_eq!(dw_mip_map_count, 1);
    assert_eq!(fourcc, bsa::dds::fourcc(b'D', b'X', b'T', b'1'));
    assert_eq!(dw_pitch_or_linear_size, 8);
    assert_eq!(&data[4 + 124..], &chunk_data[..]);
}
