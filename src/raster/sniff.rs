use serde::{Deserialize, Serialize};

/// Container format of a bare (header-less) image blob, detected from magic bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawFormat {
    /// `GIF87a` / `GIF89a`.
    Gif,
    /// JPEG SOI marker.
    Jpeg,
    /// PNG signature.
    Png,
    /// Windows bitmap (`BM`).
    Bmp,
    /// Nothing recognizable.
    Unknown,
}

const PNG_SIG: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

impl RawFormat {
    /// Detect the format from the leading bytes.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Self::Gif
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else if bytes.starts_with(&PNG_SIG) {
            Self::Png
        } else if bytes.len() >= 14 && bytes.starts_with(b"BM") {
            Self::Bmp
        } else {
            Self::Unknown
        }
    }

    /// File extension used when exporting the blob.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Bmp => "bmp",
            Self::Unknown => "bin",
        }
    }

    /// Matching `image` crate format, if decodable.
    pub fn image_format(self) -> Option<image::ImageFormat> {
        match self {
            Self::Gif => Some(image::ImageFormat::Gif),
            Self::Jpeg => Some(image::ImageFormat::Jpeg),
            Self::Png => Some(image::ImageFormat::Png),
            Self::Bmp => Some(image::ImageFormat::Bmp),
            Self::Unknown => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/sniff.rs"]
mod tests;
