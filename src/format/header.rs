use serde::{Deserialize, Serialize};

use crate::{
    format::clock_id::ClockId,
    foundation::{
        bytes::{BeReader, BeWriter},
        error::{ResError, ResResult},
    },
};

/// Size of the fixed container header in bytes.
pub const HEADER_LEN: usize = 32;

/// The two recognized 8-byte magic tags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Magic {
    /// `Sb@*O2GG`, regular watchface.
    #[default]
    Standard,
    /// `II@*24dG`, idle/always-on watchface.
    Idle,
}

impl Magic {
    /// Tag bytes as written at offset 0.
    pub const fn bytes(self) -> &'static [u8; 8] {
        match self {
            Self::Standard => b"Sb@*O2GG",
            Self::Idle => b"II@*24dG",
        }
    }

    /// Match a tag, or `None` if unrecognized.
    pub fn from_bytes(tag: &[u8]) -> Option<Self> {
        [Self::Standard, Self::Idle]
            .into_iter()
            .find(|m| m.bytes().as_slice() == tag)
    }
}

/// Fixed 32-byte container header; all integers big-endian.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHeader {
    /// Magic tag variant.
    pub magic: Magic,
    /// Raw clock identifier.
    pub clock_id: u32,
    /// Absolute offset of the thumbnail.
    pub thumb_start: u32,
    /// Thumbnail length in bytes.
    pub thumb_len: u32,
    /// Absolute offset of the image pool.
    pub img_start: u32,
    /// Image pool length in bytes.
    pub img_len: u32,
    /// Absolute offset of the layer data; the z-image pool ends here.
    pub layer_start: u32,
}

impl ResourceHeader {
    /// Parse the header at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> ResResult<Self> {
        let mut r = BeReader::new(bytes, 0);
        let tag = r.read_bytes(8, "magic")?;
        let magic = Magic::from_bytes(tag).ok_or_else(|| {
            ResError::structural(format!(
                "unrecognized magic tag {:?}",
                String::from_utf8_lossy(tag)
            ))
        })?;
        Ok(Self {
            magic,
            clock_id: r.read_u32("clock_id")?,
            thumb_start: r.read_u32("thumb_start")?,
            thumb_len: r.read_u32("thumb_len")?,
            img_start: r.read_u32("img_start")?,
            img_len: r.read_u32("img_len")?,
            layer_start: r.read_u32("layer_start")?,
        })
    }

    pub(crate) fn write(&self, w: &mut BeWriter) {
        w.put_bytes(self.magic.bytes());
        w.put_u32(self.clock_id);
        w.put_u32(self.thumb_start);
        w.put_u32(self.thumb_len);
        w.put_u32(self.img_start);
        w.put_u32(self.img_len);
        w.put_u32(self.layer_start);
    }

    /// Decoded clock identifier.
    pub fn clock(&self) -> ClockId {
        ClockId::decode(self.clock_id)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/format/header.rs"]
mod tests;
