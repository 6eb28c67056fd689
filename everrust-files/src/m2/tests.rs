use std::io::Cursor;

use crate::m2::reader::M2Reader;
use crate::m2::types::FOURCC_M2HEADER;

fn push_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn push_f32(buf: &mut Vec<u8>, value: f32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn push_array(buf: &mut Vec<u8>, size: u32, offset: u32) {
    push_u32(buf, size);
    push_u32(buf, offset);
}

fn push_vertex(buf: &mut Vec<u8>, position: [f32; 3]) {
    for c in position {
        push_f32(buf, c);
    }
    push_u32(buf, 0); // bone weights
    push_u32(buf, 0); // bone indices
    for c in [0.0, 0.0, 1.0] {
        push_f32(buf, c);
    }
    for c in [0.0f32, 0.0, 0.0, 0.0] {
        push_f32(buf, c);
    }
}

/// Emits a WotLK m2 header with only name, vertices, one texture and the bounds populated.
fn synthetic_m2() -> Vec<u8> {
    const HEADER_END: u32 = 304;
    const NAME_OFFSET: u32 = HEADER_END;
    const VERTEX_OFFSET: u32 = NAME_OFFSET + 5;
    const TEXTURE_OFFSET: u32 = VERTEX_OFFSET + 3 * 48;
    const TEXTURE_NAME_OFFSET: u32 = TEXTURE_OFFSET + 16;

    let mut buf = Vec::new();
    push_u32(&mut buf, FOURCC_M2HEADER);
    push_u32(&mut buf, u32::from_le_bytes([8, 1, 0, 0])); // version 1.8
    push_array(&mut buf, 5, NAME_OFFSET);
    push_u32(&mut buf, 0); // global flags
    for _ in 0..5 {
        push_array(&mut buf, 0, 0); // global loops up to bone lookups
    }
    push_array(&mut buf, 3, VERTEX_OFFSET);
    push_u32(&mut buf, 1); // num skin profiles
    push_array(&mut buf, 0, 0); // colors
    push_array(&mut buf, 1, TEXTURE_OFFSET);
    for _ in 0..9 {
        push_array(&mut buf, 0, 0); // texture weights up to texture transform combos
    }
    for c in [-1.0f32, -1.0, -1.0, 1.0, 1.0, 1.0] {
        push_f32(&mut buf, c); // bounding box
    }
    push_f32(&mut buf, 1.75); // bounding sphere radius
    for _ in 0..7 {
        push_f32(&mut buf, 0.0); // collision box + radius
    }
    for _ in 0..11 {
        push_array(&mut buf, 0, 0); // collision indices up to particle emitters
    }
    assert_eq!(buf.len() as u32, HEADER_END);

    buf.extend_from_slice(b"Cube\0");
    push_vertex(&mut buf, [0.0, 0.0, 0.0]);
    push_vertex(&mut buf, [1.0, 0.0, 0.0]);
    push_vertex(&mut buf, [0.0, 1.0, 0.0]);

    assert_eq!(buf.len() as u32, TEXTURE_OFFSET);
    push_u32(&mut buf, 0); // texture type
    push_u32(&mut buf, 0); // texture flags
    push_array(&mut buf, 6, TEXTURE_NAME_OFFSET);
    buf.extend_from_slice(b"X.BLP\0");

    buf
}

#[test]
fn m2_header_parsing() -> Result<(), anyhow::Error> {
    let asset = M2Reader::parse_asset(&mut Cursor::new(synthetic_m2()))?;

    assert_eq!(asset.name, "Cube");
    assert_eq!(asset.vertices.len(), 3);
    assert_eq!(asset.vertices[1].position.x, 1.0);
    assert_eq!(asset.num_skin_profiles, 1);
    assert_eq!(asset.textures.len(), 1);
    assert_eq!(asset.textures[0].filename, "X.BLP");
    assert_eq!(asset.bounding_box.max.z, 1.0);
    assert_eq!(asset.bounding_sphere_radius, 1.75);
    Ok(())
}

#[test]
fn m2_rejects_foreign_magic() {
    let mut buf = synthetic_m2();
    buf[0] = b'X';
    assert!(M2Reader::parse_asset(&mut Cursor::new(buf)).is_err());
}

#[test]
fn skin_profile_parsing() -> Result<(), anyhow::Error> {
    const HEADER_END: u32 = 48;

    let mut buf = Vec::new();
    buf.extend_from_slice(b"SKIN");
    push_array(&mut buf, 3, HEADER_END);
    push_array(&mut buf, 3, HEADER_END + 6);
    for _ in 0..3 {
        push_array(&mut buf, 0, 0); // bones, submeshes, batches
    }
    push_u32(&mut buf, 21);
    assert_eq!(buf.len() as u32, HEADER_END);

    for v in [0u16, 1, 2] {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    for i in [2u16, 1, 0] {
        buf.extend_from_slice(&i.to_le_bytes());
    }

    let skin = M2Reader::parse_skin_profile(&mut Cursor::new(buf))?;
    assert_eq!(skin.vertices, vec![0, 1, 2]);
    assert_eq!(skin.indices, vec![2, 1, 0]);
    assert_eq!(skin.bone_count_max, 21);
    Ok(())
}
