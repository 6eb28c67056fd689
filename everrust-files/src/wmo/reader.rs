use std::io::ErrorKind::UnexpectedEof;
use std::io::{Cursor, Read, Seek, SeekFrom};

use crate::ParserError;
use crate::common::reader::get_mandatory_chunk_by_name;
use crate::common::types::{IffChunk, MVerChunk};
use crate::wmo::types::{
    MOBAChunk, MOGIChunk, MOGNChunk, MOGPHeader, MOGP_HEADER_SIZE, MOHDChunk, MOMTChunk, MONRChunk, MOPYChunk,
    MOTVChunk, MOTXChunk, MOVIChunk, MOVTChunk, WMOGroupAsset, WMORootAsset,
};

pub struct WMOReader {}

impl WMOReader {
    pub fn parse_root<R: Read>(rdr: &mut R) -> Result<WMORootAsset, ParserError> {
        let mver = WMOReader::expect_version_chunk(rdr)?;
        let chunk_list = WMOReader::read_remaining_chunks(rdr)?;

        let momt_chunk = chunk_list
            .iter()
            .find(|chunk| chunk.magic_str().eq("MOMT"))
            .ok_or(ParserError::FormatError {
                reason: "Missing mandatory MOMT chunk",
            })?;
        if momt_chunk.size % 64 != 0 {
            return Err(ParserError::FormatError {
                reason: "Invalid MOMT Chunk Size",
            });
        }

        Ok(WMORootAsset {
            mver,
            mohd: get_mandatory_chunk_by_name::<MOHDChunk>(&chunk_list, "MOHD")?,
            motx: get_mandatory_chunk_by_name::<MOTXChunk>(&chunk_list, "MOTX")?,
            momt: momt_chunk.parse::<MOMTChunk>()?,
            mogn: get_mandatory_chunk_by_name::<MOGNChunk>(&chunk_list, "MOGN")?,
            mogi: get_mandatory_chunk_by_name::<MOGIChunk>(&chunk_list, "MOGI")?,
        })
    }

    pub fn parse_group<R: Read>(rdr: &mut R) -> Result<WMOGroupAsset, ParserError> {
        let mver = WMOReader::expect_version_chunk(rdr)?;

        let mogp_chunk = IffChunk::read_next_chunk(rdr)?;
        if !mogp_chunk.magic_str().eq("MOGP") {
            return Err(ParserError::InvalidMagicValue {
                magic: mogp_chunk.magic,
            });
        }

        let mogp = mogp_chunk.parse::<MOGPHeader>()?;

        // The geometry sub-chunks are nested within the MOGP payload, right after its fixed header.
        let mut mogp_reader = Cursor::new(mogp_chunk.data);
        mogp_reader.seek(SeekFrom::Start(MOGP_HEADER_SIZE))?;
        let rdr = &mut mogp_reader;

        // This order is apparently guaranteed, at least vanilla can't read the files otherwise
        let mopy = IffChunk::read_next_chunk(rdr)?.parse::<MOPYChunk>()?;
        let movi = IffChunk::read_next_chunk(rdr)?.parse::<MOVIChunk>()?;
        let movt = IffChunk::read_next_chunk(rdr)?.parse::<MOVTChunk>()?;
        let monr = IffChunk::read_next_chunk(rdr)?.parse::<MONRChunk>()?;
        let motv = IffChunk::read_next_chunk(rdr)?.parse::<MOTVChunk>()?;
        let moba = IffChunk::read_next_chunk(rdr)?.parse::<MOBAChunk>()?;

        Ok(WMOGroupAsset {
            mver,
            mogp,
            mopy,
            movi,
            movt,
            monr,
            motv,
            moba,
        })
    }

    fn expect_version_chunk<R: Read>(rdr: &mut R) -> Result<MVerChunk, ParserError> {
        // TODO: We don't necessarily have MVER as the first chunk, we don't need to depend on that.
        let version_hdr = IffChunk::read_next_chunk(rdr)?;
        if !version_hdr.magic_str().eq("MVER") {
            return Err(ParserError::InvalidMagicValue {
                magic: version_hdr.magic,
            });
        }

        let mver = version_hdr.parse::<MVerChunk>()?;
        if mver.version != 17 {
            return Err(ParserError::FormatError {
                reason: "Unknown MVER Version",
            });
        }

        Ok(mver)
    }

    fn read_remaining_chunks<R: Read>(rdr: &mut R) -> Result<Vec<IffChunk>, ParserError> {
        let mut chunk_list = Vec::<IffChunk>::new();
        loop {
            match IffChunk::read_next_chunk(rdr) {
                Ok(chunk) => chunk_list.push(chunk),
                Err(ParserError::IOError(internal)) if internal.kind() == UnexpectedEof => break,
                Err(err) => return Err(err),
            }
        }
        Ok(chunk_list)
    }
}
