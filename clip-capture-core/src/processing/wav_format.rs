//! WAV container utilities.
//!
//! Generates the canonical 44-byte RIFF/WAVE header for a PCM payload and
//! parses it back.

use thiserror::Error;

use crate::models::audio_models::{AudioFormatSpec, SampleEncoding};

/// Size of the canonical WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Header bytes counted by ChunkSize: everything after the first 8 bytes.
pub const RIFF_HEADER_OVERHEAD: u32 = 36;

const PCM_FORMAT_CODE: u16 = 1;
const FMT_CHUNK_SIZE: u32 = 16;

/// Generate a 44-byte WAV RIFF header for `data_size` bytes of PCM.
///
/// Layout (all multi-byte fields little-endian):
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = bits * sample_rate * channels / 8
/// [32-33]  block_align = channels * bits / 8
/// [34-35]  bits_per_sample
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
///
/// `data_size` must leave room for the overhead; callers check with
/// [`riff_chunk_size`] first.
pub fn generate_wav_header(format: &AudioFormatSpec, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let chunk_size = data_size.saturating_add(RIFF_HEADER_OVERHEAD);

    let mut header = [0u8; WAV_HEADER_SIZE];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&FMT_CHUNK_SIZE.to_le_bytes());
    header[20..22].copy_from_slice(&PCM_FORMAT_CODE.to_le_bytes());
    header[22..24].copy_from_slice(&format.channels.to_le_bytes());
    header[24..28].copy_from_slice(&format.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&format.byte_rate().to_le_bytes());
    header[32..34].copy_from_slice(&format.block_align().to_le_bytes());
    header[34..36].copy_from_slice(&format.bits_per_sample.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// ChunkSize for a payload of `data_size` bytes, or None if either length
/// field would overflow.
pub fn riff_chunk_size(data_size: u64) -> Option<u32> {
    let data = u32::try_from(data_size).ok()?;
    data.checked_add(RIFF_HEADER_OVERHEAD)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WavHeaderError {
    #[error("header too short: {0} bytes")]
    TooShort(usize),

    #[error("missing {0} marker")]
    BadMagic(&'static str),

    #[error("unsupported audio format code {0}")]
    UnsupportedFormat(u16),

    #[error("chunk size does not match data size")]
    InconsistentSizes,

    #[error("invalid format fields: {0}")]
    InvalidFormat(String),
}

/// Fields of a canonical 44-byte PCM WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub chunk_size: u32,
    pub format: AudioFormatSpec,
    pub byte_rate: u32,
    pub block_align: u16,
    pub data_size: u32,
}

impl WavHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, WavHeaderError> {
        if bytes.len() < WAV_HEADER_SIZE {
            return Err(WavHeaderError::TooShort(bytes.len()));
        }
        if &bytes[0..4] != b"RIFF" {
            return Err(WavHeaderError::BadMagic("RIFF"));
        }
        if &bytes[8..12] != b"WAVE" {
            return Err(WavHeaderError::BadMagic("WAVE"));
        }
        if &bytes[12..16] != b"fmt " {
            return Err(WavHeaderError::BadMagic("fmt "));
        }
        if &bytes[36..40] != b"data" {
            return Err(WavHeaderError::BadMagic("data"));
        }

        let format_code = le_u16(bytes, 20);
        if format_code != PCM_FORMAT_CODE {
            return Err(WavHeaderError::UnsupportedFormat(format_code));
        }

        let chunk_size = le_u32(bytes, 4);
        let data_size = le_u32(bytes, 40);
        if data_size.checked_add(RIFF_HEADER_OVERHEAD) != Some(chunk_size) {
            return Err(WavHeaderError::InconsistentSizes);
        }

        let format = AudioFormatSpec {
            sample_rate: le_u32(bytes, 24),
            bits_per_sample: le_u16(bytes, 34),
            channels: le_u16(bytes, 22),
            encoding: SampleEncoding::PcmSigned,
        };
        format.validate().map_err(WavHeaderError::InvalidFormat)?;

        Ok(Self {
            chunk_size,
            format,
            byte_rate: le_u32(bytes, 28),
            block_align: le_u16(bytes, 32),
            data_size,
        })
    }
}

fn le_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_matches_reference_layout() {
        let header = generate_wav_header(&AudioFormatSpec::VOICE_CLIP, 1000);

        let expected: [u8; 44] = [
            b'R', b'I', b'F', b'F', 0x0c, 0x04, 0x00, 0x00, // ChunkSize 1036
            b'W', b'A', b'V', b'E', b'f', b'm', b't', b' ',
            16, 0, 0, 0, // Subchunk1Size
            1, 0, // PCM
            2, 0, // channels
            0x44, 0xac, 0x00, 0x00, // 44100
            0x10, 0xb1, 0x02, 0x00, // 176400
            4, 0, // block align
            16, 0, // bits
            b'd', b'a', b't', b'a', 0xe8, 0x03, 0x00, 0x00, // 1000
        ];
        assert_eq!(header, expected);
    }

    #[test]
    fn header_follows_format() {
        let mono = AudioFormatSpec {
            sample_rate: 16_000,
            channels: 1,
            ..AudioFormatSpec::VOICE_CLIP
        };
        let header = generate_wav_header(&mono, 0);

        let parsed = WavHeader::parse(&header).unwrap();
        assert_eq!(parsed.format, mono);
        assert_eq!(parsed.byte_rate, 32_000);
        assert_eq!(parsed.block_align, 2);
        assert_eq!(parsed.chunk_size, 36);
        assert_eq!(parsed.data_size, 0);
    }

    #[test]
    fn chunk_size_guards_overflow() {
        assert_eq!(riff_chunk_size(1000), Some(1036));
        assert_eq!(riff_chunk_size(u32::MAX as u64 - 36), Some(u32::MAX));
        assert_eq!(riff_chunk_size(u32::MAX as u64 - 35), None);
        assert_eq!(riff_chunk_size(u64::MAX), None);
    }

    #[test]
    fn parse_rejects_malformed_headers() {
        let good = generate_wav_header(&AudioFormatSpec::VOICE_CLIP, 8);

        assert_eq!(WavHeader::parse(&good[..20]), Err(WavHeaderError::TooShort(20)));

        let mut bad = good;
        bad[0..4].copy_from_slice(b"RIFX");
        assert_eq!(WavHeader::parse(&bad), Err(WavHeaderError::BadMagic("RIFF")));

        let mut bad = good;
        bad[20] = 3; // IEEE float
        assert_eq!(WavHeader::parse(&bad), Err(WavHeaderError::UnsupportedFormat(3)));

        let mut bad = good;
        bad[40] = 9;
        assert_eq!(WavHeader::parse(&bad), Err(WavHeaderError::InconsistentSizes));
    }

    #[test]
    fn parse_rejects_out_of_range_format_fields() {
        let good = generate_wav_header(&AudioFormatSpec::VOICE_CLIP, 8);

        let mut bad = good;
        bad[22..24].copy_from_slice(&u16::MAX.to_le_bytes());
        bad[34..36].copy_from_slice(&u16::MAX.to_le_bytes());
        assert!(matches!(WavHeader::parse(&bad), Err(WavHeaderError::InvalidFormat(_))));

        let mut bad = good;
        bad[24..28].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(WavHeader::parse(&bad), Err(WavHeaderError::InvalidFormat(_))));

        let mut bad = good;
        bad[22..24].copy_from_slice(&0u16.to_le_bytes());
        assert!(matches!(WavHeader::parse(&bad), Err(WavHeaderError::InvalidFormat(_))));
    }
}
