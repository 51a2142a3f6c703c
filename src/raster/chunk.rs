use std::{borrow::Cow, io::Cursor};

use anyhow::Context;
use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{ResError, ResResult},
    raster::{pixel, sniff::RawFormat},
};

/// Size of the custom chunk header.
pub const CHUNK_HEADER_LEN: usize = 16;
/// Largest `payload_len` representable in the 24-bit field.
pub const MAX_PAYLOAD_LEN: u32 = 0x00FF_FFFF;
/// Largest width or height representable in the 12-bit fields.
pub const MAX_DIMENSION: u16 = 0x0FFF;

/// Pixel/container format of a chunk payload (header byte 0).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImgType {
    /// Embedded GIF file.
    Gif,
    /// Embedded JPEG file.
    Jpg,
    /// 32-bit B,G,R,A.
    Rgb8888,
    /// RGB565 little-endian followed by an 8-bit alpha.
    Rgb8565,
    /// RGB565 little-endian, opaque.
    Rgb565,
    /// 1-bit alpha (bit 15) plus 5-bit channels, little-endian.
    Rgb1555,
    /// BGRA palette followed by 8-bit indices.
    Index8,
}

impl ImgType {
    /// Every known type.
    pub const ALL: [Self; 7] = [
        Self::Gif,
        Self::Jpg,
        Self::Rgb8888,
        Self::Rgb8565,
        Self::Rgb565,
        Self::Rgb1555,
        Self::Index8,
    ];

    /// On-disk code.
    pub const fn code(self) -> u8 {
        match self {
            Self::Gif => 3,
            Self::Jpg => 9,
            Self::Rgb8888 => 71,
            Self::Rgb8565 => 72,
            Self::Rgb565 => 73,
            Self::Rgb1555 => 74,
            Self::Index8 => 75,
        }
    }

    /// Look up an on-disk code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Bytes per pixel for raw pixel formats; `None` for embedded files.
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            Self::Rgb8888 => Some(4),
            Self::Rgb8565 => Some(3),
            Self::Rgb565 | Self::Rgb1555 => Some(2),
            Self::Index8 => Some(1),
            Self::Gif | Self::Jpg => None,
        }
    }

    /// True when the payload is a complete GIF/JPEG file.
    pub fn is_embedded_file(self) -> bool {
        matches!(self, Self::Gif | Self::Jpg)
    }
}

/// Decoded 16-byte chunk header.
///
/// Byte 0 type, byte 1 compressed flag, bytes 2..5 `payload_len` (24-bit LE,
/// decompressed size), byte 5 plus the low nibble of byte 6 `height`, the high
/// nibble of byte 6 plus byte 7 `width`, bytes 8..16 reserved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkHeader {
    /// Payload format.
    pub img_type: ImgType,
    /// Payload is an LZ4 block.
    pub compressed: bool,
    /// Decompressed payload size.
    pub payload_len: u32,
    /// Width in pixels (12 bits).
    pub width: u16,
    /// Height in pixels (12 bits).
    pub height: u16,
    /// Bytes 8..16, zero in observed data but kept verbatim.
    #[serde(default, skip_serializing_if = "is_zeroed")]
    pub reserved: [u8; 8],
}

fn is_zeroed(bytes: &[u8; 8]) -> bool {
    bytes.iter().all(|b| *b == 0)
}

impl ChunkHeader {
    /// Parse a structurally valid header, or `None` if `bytes` does not start with one.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..CHUNK_HEADER_LEN)?;
        let img_type = ImgType::from_code(bytes[0])?;
        let compressed = match bytes[1] {
            0 => false,
            1 => true,
            _ => return None,
        };
        let payload_len = LittleEndian::read_u24(&bytes[2..5]);
        let height = u16::from(bytes[5]) | (u16::from(bytes[6] & 0x0F) << 8);
        let width = u16::from(bytes[6] >> 4) | (u16::from(bytes[7]) << 4);
        let mut reserved = [0u8; 8];
        reserved.copy_from_slice(&bytes[8..16]);

        Some(Self {
            img_type,
            compressed,
            payload_len,
            width,
            height,
            reserved,
        })
    }

    /// Serialize, rejecting fields wider than their on-disk slots.
    pub fn to_bytes(&self) -> ResResult<[u8; CHUNK_HEADER_LEN]> {
        if self.payload_len > MAX_PAYLOAD_LEN {
            return Err(ResError::structural(format!(
                "chunk payload_len {} exceeds 24 bits",
                self.payload_len
            )));
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(ResError::structural(format!(
                "chunk dimensions {}x{} exceed 12 bits",
                self.width, self.height
            )));
        }

        let mut out = [0u8; CHUNK_HEADER_LEN];
        out[0] = self.img_type.code();
        out[1] = u8::from(self.compressed);
        LittleEndian::write_u24(&mut out[2..5], self.payload_len);
        out[5] = (self.height & 0xFF) as u8;
        out[6] = ((self.height >> 8) & 0x0F) as u8 | (((self.width & 0x0F) as u8) << 4);
        out[7] = ((self.width >> 4) & 0xFF) as u8;
        out[8..16].copy_from_slice(&self.reserved);
        Ok(out)
    }

    /// Whether a span of `span_len` bytes is consistent with this header.
    ///
    /// Uncompressed chunks occupy exactly header + `payload_len`; compressed ones
    /// carry at least one payload byte unless empty.
    pub fn fits_span(&self, span_len: usize) -> bool {
        let Some(data_len) = span_len.checked_sub(CHUNK_HEADER_LEN) else {
            return false;
        };
        if self.compressed {
            data_len > 0 || self.payload_len == 0
        } else {
            data_len == self.payload_len as usize
        }
    }
}

/// A header plus its on-disk payload bytes (still compressed when flagged).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageChunk {
    header: ChunkHeader,
    data: Vec<u8>,
}

impl ImageChunk {
    /// Assemble from parts.
    pub fn new(header: ChunkHeader, data: Vec<u8>) -> Self {
        Self { header, data }
    }

    /// Interpret a referenced span as a chunk; `None` if its header is not valid.
    pub fn from_span(span: &[u8]) -> Option<Self> {
        let header = ChunkHeader::parse(span)?;
        Some(Self {
            header,
            data: span[CHUNK_HEADER_LEN..].to_vec(),
        })
    }

    /// Build from an uncompressed payload, optionally LZ4-compressing it.
    pub fn from_payload(
        img_type: ImgType,
        width: u32,
        height: u32,
        payload: Vec<u8>,
        compress: bool,
    ) -> ResResult<Self> {
        let dim = |v: u32, what: &str| {
            u16::try_from(v)
                .ok()
                .filter(|v| *v <= MAX_DIMENSION)
                .ok_or_else(|| ResError::structural(format!("chunk {what} {v} exceeds 12 bits")))
        };
        let width = dim(width, "width")?;
        let height = dim(height, "height")?;
        let payload_len = u32::try_from(payload.len())
            .ok()
            .filter(|len| *len <= MAX_PAYLOAD_LEN)
            .ok_or_else(|| {
                ResError::structural(format!(
                    "chunk payload of {} bytes exceeds 24 bits",
                    payload.len()
                ))
            })?;

        let data = if compress {
            lz4_flex::block::compress(&payload)
        } else {
            payload
        };

        Ok(Self {
            header: ChunkHeader {
                img_type,
                compressed: compress,
                payload_len,
                width,
                height,
                reserved: [0; 8],
            },
            data,
        })
    }

    /// Quantize `raster` to `img_type` and wrap it in a chunk.
    pub fn encode_rgba(
        raster: &image::RgbaImage,
        img_type: ImgType,
        compress: bool,
    ) -> ResResult<Self> {
        let payload = pixel::encode(raster, img_type)?;
        Self::from_payload(
            img_type,
            raster.width(),
            raster.height(),
            payload,
            compress && !img_type.is_embedded_file(),
        )
    }

    /// Wrap a complete GIF or JPEG file, reading its dimensions.
    pub fn from_embedded_file(file: Vec<u8>) -> ResResult<Self> {
        let img_type = match RawFormat::sniff(&file) {
            RawFormat::Gif => ImgType::Gif,
            RawFormat::Jpeg => ImgType::Jpg,
            other => {
                return Err(ResError::pixel(format!(
                    "only gif/jpg files can be embedded as chunks, got {other:?}"
                )));
            }
        };
        let (width, height) = image::ImageReader::new(Cursor::new(&file))
            .with_guessed_format()
            .context("detect embedded image format")?
            .into_dimensions()
            .context("read embedded image dimensions")?;
        Self::from_payload(img_type, width, height, file, false)
    }

    /// Header fields.
    pub fn header(&self) -> &ChunkHeader {
        &self.header
    }

    /// On-disk payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Header plus data length as stored in a pool.
    pub fn span_len(&self) -> usize {
        CHUNK_HEADER_LEN + self.data.len()
    }

    /// Serialized header followed by the on-disk payload.
    pub fn to_bytes(&self) -> ResResult<Vec<u8>> {
        let mut out = Vec::with_capacity(self.span_len());
        out.extend_from_slice(&self.header.to_bytes()?);
        out.extend_from_slice(&self.data);
        Ok(out)
    }

    /// Decompressed payload of exactly `payload_len` bytes.
    pub fn payload(&self) -> ResResult<Cow<'_, [u8]>> {
        let expected = self.header.payload_len as usize;
        if self.header.compressed {
            let out = lz4_flex::block::decompress(&self.data, expected).map_err(|e| {
                ResError::decompression(format!(
                    "lz4 block of {} bytes (expected {expected} out): {e}",
                    self.data.len()
                ))
            })?;
            if out.len() != expected {
                return Err(ResError::decompression(format!(
                    "lz4 block decompressed to {} bytes, header declares {expected}",
                    out.len()
                )));
            }
            return Ok(Cow::Owned(out));
        }

        self.data
            .get(..expected)
            .map(Cow::Borrowed)
            .ok_or_else(|| {
                ResError::structural(format!(
                    "chunk payload has {} bytes, header declares {expected}",
                    self.data.len()
                ))
            })
    }

    /// Decode to straight-alpha RGBA8.
    pub fn decode_rgba(&self) -> ResResult<image::RgbaImage> {
        let payload = self.payload()?;
        pixel::decode(
            self.header.img_type,
            u32::from(self.header.width),
            u32::from(self.header.height),
            &payload,
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/chunk.rs"]
mod tests;
