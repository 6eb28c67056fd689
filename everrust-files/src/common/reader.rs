use std::collections::HashMap;
use std::ffi::CString;
use std::io::ErrorKind::UnexpectedEof;
use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::ParserError;
use crate::common::types::{C2Vector, C3Vector, CAaBox, CArgb, CImVector, IffChunk};

pub trait Parseable<T> {
    fn parse<R: Read>(rdr: &mut R) -> Result<T, ParserError>;
}

impl Parseable<C3Vector> for C3Vector {
    fn parse<R: Read>(rdr: &mut R) -> Result<C3Vector, ParserError> {
        Ok(C3Vector {
            x: rdr.read_f32::<LittleEndian>()?,
            y: rdr.read_f32::<LittleEndian>()?,
            z: rdr.read_f32::<LittleEndian>()?,
        })
    }
}

impl Parseable<C2Vector> for C2Vector {
    fn parse<R: Read>(rdr: &mut R) -> Result<C2Vector, ParserError> {
        Ok(C2Vector {
            x: rdr.read_f32::<LittleEndian>()?,
            y: rdr.read_f32::<LittleEndian>()?,
        })
    }
}

impl Parseable<CAaBox> for CAaBox {
    fn parse<R: Read>(rdr: &mut R) -> Result<CAaBox, ParserError> {
        Ok(CAaBox {
            min: C3Vector::parse(rdr)?,
            max: C3Vector::parse(rdr)?,
        })
    }
}

impl Parseable<CImVector> for CImVector {
    fn parse<R: Read>(rdr: &mut R) -> Result<CImVector, ParserError> {
        let bytes = rdr.read_u32::<LittleEndian>()?.to_le_bytes();
        Ok(CImVector {
            b: bytes[0],
            g: bytes[1],
            r: bytes[2],
            a: bytes[3],
        })
    }
}

impl Parseable<CArgb> for CArgb {
    fn parse<R: Read>(rdr: &mut R) -> Result<CArgb, ParserError> {
        let bytes = rdr.read_u32::<LittleEndian>()?.to_le_bytes();
        Ok(CArgb {
            r: bytes[0],
            g: bytes[1],
            b: bytes[2],
            a: bytes[3],
        })
    }
}

impl Parseable<u8> for u8 {
    fn parse<R: Read>(rdr: &mut R) -> Result<u8, ParserError> {
        Ok(rdr.read_u8()?)
    }
}

impl Parseable<u16> for u16 {
    fn parse<R: Read>(rdr: &mut R) -> Result<u16, ParserError> {
        Ok(rdr.read_u16::<LittleEndian>()?)
    }
}

impl Parseable<i16> for i16 {
    fn parse<R: Read>(rdr: &mut R) -> Result<i16, ParserError> {
        Ok(rdr.read_i16::<LittleEndian>()?)
    }
}

impl Parseable<u32> for u32 {
    fn parse<R: Read>(rdr: &mut R) -> Result<u32, ParserError> {
        Ok(rdr.read_u32::<LittleEndian>()?)
    }
}

impl Parseable<i32> for i32 {
    fn parse<R: Read>(rdr: &mut R) -> Result<i32, ParserError> {
        Ok(rdr.read_i32::<LittleEndian>()?)
    }
}

impl Parseable<f32> for f32 {
    fn parse<R: Read>(rdr: &mut R) -> Result<f32, ParserError> {
        Ok(rdr.read_f32::<LittleEndian>()?)
    }
}

// Helper Type because we have multiple chunks that are merely NUL-separated string blobs.
// Some referencing chunks address strings by their byte offset into the blob, so we track those too.
#[derive(Debug, Clone)]
pub struct StringBlock {
    pub strings: Vec<String>,
    pub offset_lookup: HashMap<u32, usize>,
}

impl Parseable<StringBlock> for StringBlock {
    fn parse<R: Read>(rdr: &mut R) -> Result<StringBlock, ParserError> {
        let mut lookup = HashMap::new();
        let mut strings = Vec::new();
        let mut byte_ctr = 0u32;
        loop {
            match read_cstring(rdr) {
                Ok(cstring) => {
                    let string = cstring.into_string()?;
                    // empty strings are padding between entries, but they still advance the offset
                    if !string.is_empty() {
                        lookup.insert(byte_ctr, strings.len());
                        byte_ctr += string.len() as u32 + 1;
                        strings.push(string);
                    } else {
                        byte_ctr += 1;
                    }
                }
                Err(ParserError::IOError(internal)) if internal.kind() == UnexpectedEof => break,
                Err(err) => return Err(err),
            }
        }

        Ok(StringBlock {
            strings,
            offset_lookup: lookup,
        })
    }
}

pub(crate) fn read_cstring<R: Read>(rdr: &mut R) -> Result<CString, ParserError> {
    let mut buf = Vec::new();
    loop {
        let c = rdr.read_u8()?;
        if c == 0 {
            // SAFETY: We can ensure, that there are no nul-bytes in buf
            return Ok(unsafe { CString::from_vec_unchecked(buf) });
        }
        buf.push(c);
    }
}

/// Reads `T`s until the reader runs dry. Chunk payloads are exactly sized, so EoF is the terminator.
pub(crate) fn read_chunk_array<T: Parseable<T>, R: Read>(rdr: &mut R) -> Result<Vec<T>, ParserError> {
    let mut list = Vec::<T>::new();
    loop {
        match T::parse(rdr) {
            Ok(element) => list.push(element),
            Err(ParserError::IOError(internal)) if internal.kind() == UnexpectedEof => break,
            Err(err) => return Err(err),
        }
    }
    Ok(list)
}

pub(crate) fn get_mandatory_chunk_by_name<T: Parseable<T>>(
    chunk_list: &[IffChunk],
    chunk_magic: &str,
) -> Result<T, ParserError> {
    chunk_list
        .iter()
        .find(|chunk| chunk.magic_str().eq(chunk_magic))
        .ok_or(ParserError::FormatError {
            reason: "Missing a mandatory chunk",
        })?
        .parse::<T>()
}
