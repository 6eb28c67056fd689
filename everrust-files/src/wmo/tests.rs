use std::io::Cursor;

use crate::wmo::reader::WMOReader;
use crate::wmo::types::WMOGroupFlags;

fn push_chunk(buf: &mut Vec<u8>, magic: &str, data: &[u8]) {
    // fourcc is stored reversed on disk
    buf.extend(magic.bytes().rev());
    buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
    buf.extend_from_slice(data);
}

fn push_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn push_f32s(buf: &mut Vec<u8>, values: &[f32]) {
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

fn synthetic_root() -> Vec<u8> {
    let mut buf = Vec::new();
    push_chunk(&mut buf, "MVER", &17u32.to_le_bytes());

    let mut mohd = Vec::new();
    push_u32(&mut mohd, 1); // textures
    push_u32(&mut mohd, 1); // groups
    for _ in 0..5 {
        push_u32(&mut mohd, 0); // portals up to doodad sets
    }
    push_u32(&mut mohd, 0xFF101010); // ambient color
    push_u32(&mut mohd, 42); // wmo id
    push_f32s(&mut mohd, &[-5.0, -5.0, 0.0, 5.0, 5.0, 10.0]);
    mohd.extend_from_slice(&0u16.to_le_bytes());
    mohd.extend_from_slice(&0u16.to_le_bytes());
    push_chunk(&mut buf, "MOHD", &mohd);

    push_chunk(&mut buf, "MOTX", b"STONE.BLP\0\0\0");

    let mut momt = Vec::new();
    push_u32(&mut momt, 0); // flags
    push_u32(&mut momt, 0); // shader
    push_u32(&mut momt, 0); // blend mode
    push_u32(&mut momt, 0); // texture_1 offset into MOTX
    for _ in 0..12 {
        push_u32(&mut momt, 0);
    }
    assert_eq!(momt.len(), 64);
    push_chunk(&mut buf, "MOMT", &momt);

    push_chunk(&mut buf, "MOGN", b"\0Hall\0\0\0");

    let mut mogi = Vec::new();
    push_u32(&mut mogi, WMOGroupFlags::EXTERIOR.bits());
    push_f32s(&mut mogi, &[-5.0, -5.0, 0.0, 5.0, 5.0, 10.0]);
    mogi.extend_from_slice(&1i32.to_le_bytes());
    push_chunk(&mut buf, "MOGI", &mogi);

    buf
}

#[test]
fn wmo_root_parsing() -> Result<(), anyhow::Error> {
    let root = WMOReader::parse_root(&mut Cursor::new(synthetic_root()))?;

    assert_eq!(root.mohd.n_groups, 1);
    assert_eq!(root.mohd.wmo_id, 42);
    assert_eq!(root.motx.textures.strings, vec!["STONE.BLP".to_string()]);
    assert_eq!(root.motx.textures.offset_lookup[&0], 0);
    assert_eq!(root.momt.materials.len(), 1);
    assert_eq!(root.mogn.group_names.strings, vec!["Hall".to_string()]);
    assert_eq!(root.mogi.groups.len(), 1);
    assert!(root.mogi.groups[0].flags.contains(WMOGroupFlags::EXTERIOR));
    Ok(())
}

#[test]
fn wmo_root_rejects_unknown_version() {
    let mut buf = Vec::new();
    push_chunk(&mut buf, "MVER", &16u32.to_le_bytes());
    assert!(WMOReader::parse_root(&mut Cursor::new(buf)).is_err());
}

fn synthetic_group() -> Vec<u8> {
    let mut buf = Vec::new();
    push_chunk(&mut buf, "MVER", &17u32.to_le_bytes());

    let mut mogp = Vec::new();
    mogp.extend_from_slice(&1i32.to_le_bytes()); // group name offset
    mogp.extend_from_slice(&(-1i32).to_le_bytes()); // descriptive name offset
    push_u32(&mut mogp, WMOGroupFlags::EXTERIOR.bits());
    push_f32s(&mut mogp, &[-1.0, -1.0, 0.0, 1.0, 1.0, 2.0]);
    for _ in 0..6 {
        mogp.extend_from_slice(&0u16.to_le_bytes()); // portal + batch counts
    }
    mogp.extend_from_slice(&[0, 0, 0, 0]); // fog ids
    push_u32(&mut mogp, 0); // liquid
    push_u32(&mut mogp, 7); // group id
    push_u32(&mut mogp, 0); // flags_2
    push_u32(&mut mogp, 0); // unused
    assert_eq!(mogp.len(), 0x44);

    push_chunk(&mut mogp, "MOPY", &[0, 0, 0, 0]); // two triangles, material 0
    let mut movi = Vec::new();
    for i in [0u16, 1, 2, 2, 1, 3] {
        movi.extend_from_slice(&i.to_le_bytes());
    }
    push_chunk(&mut mogp, "MOVI", &movi);
    let mut movt = Vec::new();
    push_f32s(
        &mut movt,
        &[
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, //
            1.0, 1.0, 0.0,
        ],
    );
    push_chunk(&mut mogp, "MOVT", &movt);
    let mut monr = Vec::new();
    for _ in 0..4 {
        push_f32s(&mut monr, &[0.0, 0.0, 1.0]);
    }
    push_chunk(&mut mogp, "MONR", &monr);
    let mut motv = Vec::new();
    for _ in 0..4 {
        push_f32s(&mut motv, &[0.5, 0.5]);
    }
    push_chunk(&mut mogp, "MOTV", &motv);

    let mut moba = Vec::new();
    for _ in 0..6 {
        moba.extend_from_slice(&0i16.to_le_bytes()); // batch bounding box
    }
    push_u32(&mut moba, 0); // start index
    moba.extend_from_slice(&6u16.to_le_bytes()); // index count
    moba.extend_from_slice(&0u16.to_le_bytes()); // min vertex
    moba.extend_from_slice(&3u16.to_le_bytes()); // max vertex
    moba.push(0); // flags
    moba.push(0); // material id
    assert_eq!(moba.len(), 24);
    push_chunk(&mut mogp, "MOBA", &moba);

    push_chunk(&mut buf, "MOGP", &mogp);
    buf
}

#[test]
fn wmo_group_parsing() -> Result<(), anyhow::Error> {
    let group = WMOReader::parse_group(&mut Cursor::new(synthetic_group()))?;

    assert_eq!(group.mogp.group_id, 7);
    assert!(group.mogp.flags.contains(WMOGroupFlags::EXTERIOR));
    assert_eq!(group.mopy.poly_materials.len(), 2);
    assert_eq!(group.movi.indices, vec![0, 1, 2, 2, 1, 3]);
    assert_eq!(group.movt.vertices.len(), 4);
    assert_eq!(group.monr.normals.len(), 4);
    assert_eq!(group.motv.tex_coords.len(), 4);
    assert_eq!(group.moba.batches.len(), 1);
    assert_eq!(group.moba.batches[0].index_count, 6);
    Ok(())
}
