use crate::{
    foundation::error::{ResError, ResResult},
    raster::{chunk::ImageChunk, pixel, sniff::RawFormat},
};

/// Bytes of one referenced image span: a chunk when it carries a valid chunk
/// header, otherwise the bare bytes with their sniffed format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageBlob {
    /// Custom 16-byte-header chunk.
    Chunk(ImageChunk),
    /// Header-less blob.
    Raw {
        /// Sniffed container format.
        format: RawFormat,
        /// Span bytes.
        bytes: Vec<u8>,
    },
}

impl ImageBlob {
    /// Classify a span. Always lossless: [`Self::to_bytes`] reproduces `span`.
    pub fn from_span(span: &[u8]) -> Self {
        match ImageChunk::from_span(span) {
            Some(chunk) => Self::Chunk(chunk),
            None => Self::Raw {
                format: RawFormat::sniff(span),
                bytes: span.to_vec(),
            },
        }
    }

    /// Stored length in bytes.
    pub fn span_len(&self) -> usize {
        match self {
            Self::Chunk(chunk) => chunk.span_len(),
            Self::Raw { bytes, .. } => bytes.len(),
        }
    }

    /// Bytes as stored in a pool or thumbnail section.
    pub fn to_bytes(&self) -> ResResult<Vec<u8>> {
        match self {
            Self::Chunk(chunk) => chunk.to_bytes(),
            Self::Raw { bytes, .. } => Ok(bytes.clone()),
        }
    }

    /// The chunk, if this blob is one.
    pub fn as_chunk(&self) -> Option<&ImageChunk> {
        match self {
            Self::Chunk(chunk) => Some(chunk),
            Self::Raw { .. } => None,
        }
    }

    /// Best-effort decode to straight-alpha RGBA8.
    pub fn decode_rgba(&self) -> ResResult<image::RgbaImage> {
        match self {
            Self::Chunk(chunk) => chunk.decode_rgba(),
            Self::Raw {
                format: RawFormat::Unknown,
                bytes,
            } => Err(ResError::pixel(format!(
                "raw blob of {} bytes has no recognizable image signature",
                bytes.len()
            ))),
            Self::Raw { bytes, .. } => pixel::decode_file(bytes),
        }
    }

    /// Short description for manifests and logs.
    pub fn kind(&self) -> String {
        match self {
            Self::Chunk(chunk) => format!("chunk:{:?}", chunk.header().img_type).to_lowercase(),
            Self::Raw { format, .. } => format!("raw:{}", format.extension()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/blob.rs"]
mod tests;
