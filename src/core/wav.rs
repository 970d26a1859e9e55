//! WAV (RIFF) container encoding for raw linear PCM.
//!
//! The upstream speech API returns bare little-endian PCM samples with no
//! framing. Browsers and audio players need a self-describing container, so
//! [`encode`] prepends the canonical 44-byte RIFF/WAVE header.
//!
//! # Layout
//!
//! | offset | size | field |
//! |--------|------|-------|
//! | 0  | 4 | `"RIFF"` |
//! | 4  | 4 | 36 + payload length |
//! | 8  | 4 | `"WAVE"` |
//! | 12 | 4 | `"fmt "` |
//! | 16 | 4 | 16 |
//! | 20 | 2 | 1 (linear PCM) |
//! | 22 | 2 | channel count |
//! | 24 | 4 | sample rate |
//! | 28 | 4 | byte rate |
//! | 32 | 2 | block alignment |
//! | 34 | 2 | bits per sample |
//! | 36 | 4 | `"data"` |
//! | 40 | 4 | payload length |
//! | 44 | n | payload |

use thiserror::Error;

/// Size of the canonical PCM WAV header in bytes.
pub const HEADER_SIZE: usize = 44;

/// Sample rate of the upstream speech models.
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// Upstream audio is mono.
pub const DEFAULT_CHANNELS: u16 = 1;

/// Upstream audio is signed 16-bit.
pub const DEFAULT_BITS_PER_SAMPLE: u16 = 16;

/// MIME type reported for encoded output.
pub const WAV_MIME_TYPE: &str = "audio/wav";

const AUDIO_FORMAT_PCM: u16 = 1;
const FMT_CHUNK_SIZE: u32 = 16;

/// PCM stream parameters carried in the `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            bits_per_sample: DEFAULT_BITS_PER_SAMPLE,
        }
    }
}

impl PcmFormat {
    /// Bytes per second of audio, truncated to the 32-bit header field.
    #[inline]
    pub fn byte_rate(&self) -> u32 {
        let rate = u64::from(self.sample_rate)
            * u64::from(self.channels)
            * u64::from(self.bits_per_sample)
            / 8;
        rate as u32
    }

    /// Bytes per sample frame across all channels, truncated to the 16-bit
    /// header field.
    #[inline]
    pub fn block_align(&self) -> u16 {
        (u32::from(self.channels) * u32::from(self.bits_per_sample) / 8) as u16
    }
}

/// Header fields recovered from an encoded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub format: PcmFormat,
    pub riff_size: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub data_size: u32,
}

/// Errors returned by [`parse_header`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WavError {
    #[error("buffer too short for WAV header: {0} bytes")]
    TooShort(usize),
    #[error("missing {0} tag")]
    MissingTag(&'static str),
    #[error("unsupported audio format {0}, expected linear PCM")]
    UnsupportedFormat(u16),
}

/// Wrap raw PCM samples in a WAV container.
///
/// This is a purely structural transform: the payload is copied verbatim and
/// never inspected, so any byte sequence (including an empty one) is accepted.
/// Output length is always `HEADER_SIZE + pcm.len()`.
pub fn encode(pcm: &[u8], format: PcmFormat) -> Vec<u8> {
    let data_size = pcm.len() as u32;

    let mut wav = Vec::with_capacity(HEADER_SIZE + pcm.len());

    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&data_size.wrapping_add(36).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&FMT_CHUNK_SIZE.to_le_bytes());
    wav.extend_from_slice(&AUDIO_FORMAT_PCM.to_le_bytes());
    wav.extend_from_slice(&format.channels.to_le_bytes());
    wav.extend_from_slice(&format.sample_rate.to_le_bytes());
    wav.extend_from_slice(&format.byte_rate().to_le_bytes());
    wav.extend_from_slice(&format.block_align().to_le_bytes());
    wav.extend_from_slice(&format.bits_per_sample.to_le_bytes());

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    wav.extend_from_slice(pcm);

    wav
}

/// Encode with the upstream defaults (24kHz, mono, 16-bit).
pub fn encode_default(pcm: &[u8]) -> Vec<u8> {
    encode(pcm, PcmFormat::default())
}

/// Read back the header written by [`encode`].
pub fn parse_header(buf: &[u8]) -> Result<WavHeader, WavError> {
    if buf.len() < HEADER_SIZE {
        return Err(WavError::TooShort(buf.len()));
    }

    let u16_at = |off: usize| u16::from_le_bytes([buf[off], buf[off + 1]]);
    let u32_at =
        |off: usize| u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]]);

    if &buf[0..4] != b"RIFF" {
        return Err(WavError::MissingTag("RIFF"));
    }
    if &buf[8..12] != b"WAVE" {
        return Err(WavError::MissingTag("WAVE"));
    }
    if &buf[12..16] != b"fmt " {
        return Err(WavError::MissingTag("fmt "));
    }
    if &buf[36..40] != b"data" {
        return Err(WavError::MissingTag("data"));
    }

    let audio_format = u16_at(20);
    if audio_format != AUDIO_FORMAT_PCM {
        return Err(WavError::UnsupportedFormat(audio_format));
    }

    Ok(WavHeader {
        format: PcmFormat {
            channels: u16_at(22),
            sample_rate: u32_at(24),
            bits_per_sample: u16_at(34),
        },
        riff_size: u32_at(4),
        byte_rate: u32_at(28),
        block_align: u16_at(32),
        data_size: u32_at(40),
    })
}
