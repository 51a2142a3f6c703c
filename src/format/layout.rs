use std::ops::Range;

use crate::{
    format::header::ResourceHeader,
    foundation::error::{ResError, ResResult},
};

/// Absolute byte ranges of the four container sections.
///
/// On disk the order is thumbnail, image pool, z-image pool, layer data. The
/// z-image pool has no header field of its own: it spans
/// `img_start + img_len .. layer_start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SectionLayout {
    /// Thumbnail offset.
    pub thumb_start: u32,
    /// Thumbnail length.
    pub thumb_len: u32,
    /// Image pool offset.
    pub img_start: u32,
    /// Image pool length.
    pub img_len: u32,
    /// Derived z-image pool offset, `img_start + img_len`.
    pub z_img_start: u32,
    /// Layer data offset and end of the z-image pool.
    pub layer_start: u32,
    /// Total container length.
    pub file_len: usize,
}

impl SectionLayout {
    /// Validate header offsets against each other and the file length.
    pub fn from_header(header: &ResourceHeader, file_len: usize) -> ResResult<Self> {
        let z_img_start = header.img_start.checked_add(header.img_len).ok_or_else(|| {
            ResError::structural(format!(
                "img_start 0x{:08X} + img_len 0x{:08X} overflows",
                header.img_start, header.img_len
            ))
        })?;
        if z_img_start > header.layer_start {
            return Err(ResError::structural(format!(
                "image pool ends at 0x{z_img_start:08X}, past layer_start 0x{:08X}",
                header.layer_start
            )));
        }
        if header.layer_start as usize > file_len {
            return Err(ResError::structural(format!(
                "layer_start 0x{:08X} beyond end of file ({file_len} bytes)",
                header.layer_start
            )));
        }
        let thumb_end = u64::from(header.thumb_start) + u64::from(header.thumb_len);
        if thumb_end > file_len as u64 {
            return Err(ResError::structural(format!(
                "thumbnail 0x{:08X}+0x{:X} beyond end of file ({file_len} bytes)",
                header.thumb_start, header.thumb_len
            )));
        }

        Ok(Self {
            thumb_start: header.thumb_start,
            thumb_len: header.thumb_len,
            img_start: header.img_start,
            img_len: header.img_len,
            z_img_start,
            layer_start: header.layer_start,
            file_len,
        })
    }

    /// Lay sections out back to back starting at `thumb_start`.
    pub fn packed(
        thumb_start: u32,
        thumb_len: usize,
        img_len: usize,
        z_img_len: usize,
        layer_len: usize,
    ) -> ResResult<Self> {
        let to_u32 = |v: u64, what: &str| {
            u32::try_from(v).map_err(|_| {
                ResError::structural(format!("{what} 0x{v:X} does not fit a 32-bit offset"))
            })
        };
        let thumb_len = to_u32(thumb_len as u64, "thumbnail length")?;
        let img_start = to_u32(u64::from(thumb_start) + u64::from(thumb_len), "img_start")?;
        let img_len = to_u32(img_len as u64, "image pool length")?;
        let z_img_start = to_u32(u64::from(img_start) + u64::from(img_len), "z_img_start")?;
        let layer_start = to_u32(u64::from(z_img_start) + z_img_len as u64, "layer_start")?;
        let file_len = layer_start as usize + layer_len;

        Ok(Self {
            thumb_start,
            thumb_len,
            img_start,
            img_len,
            z_img_start,
            layer_start,
            file_len,
        })
    }

    /// Thumbnail byte range.
    pub fn thumb(&self) -> Range<usize> {
        self.thumb_start as usize..(self.thumb_start as usize + self.thumb_len as usize)
    }

    /// Image pool byte range.
    pub fn img(&self) -> Range<usize> {
        self.img_start as usize..self.z_img_start as usize
    }

    /// Z-image pool byte range.
    pub fn z_img(&self) -> Range<usize> {
        self.z_img_start as usize..self.layer_start as usize
    }

    /// Z-image pool length.
    pub fn z_img_len(&self) -> u32 {
        self.layer_start - self.z_img_start
    }

    /// Layer data byte range, to end of file.
    pub fn layers(&self) -> Range<usize> {
        self.layer_start as usize..self.file_len
    }
}

#[cfg(test)]
#[path = "../../tests/unit/format/layout.rs"]
mod tests;
