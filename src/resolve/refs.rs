use std::{collections::HashMap, ops::Range};

use serde::{Deserialize, Serialize};

use crate::{
    format::layout::SectionLayout,
    foundation::error::{ResError, ResResult},
};

/// Which image pool a reference points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pool {
    /// Primary pool; offsets are relative to `img_start`.
    Image,
    /// Secondary pool; offsets are absolute file positions.
    ZImage,
}

/// Deduplication key assigned to each distinct `(offset, length)` pair.
pub type RefId = u32;

/// A raw `(offset, length)` pair as stored in layer data, plus its resolved pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageReference {
    /// Offset exactly as stored.
    pub offset: u32,
    /// Span length in bytes.
    pub length: u32,
    /// Pool the offset classified into.
    pub pool: Pool,
}

impl ImageReference {
    /// Absolute byte range of the referenced span.
    pub fn span(&self, layout: &SectionLayout) -> Range<usize> {
        let start = match self.pool {
            Pool::Image => layout.img_start as usize + self.offset as usize,
            Pool::ZImage => self.offset as usize,
        };
        start..start + self.length as usize
    }
}

/// Classify a stored offset.
///
/// `0..=img_len` is image-pool relative and is tested first; only then is
/// `z_img_start..=layer_start` tried as an absolute z-pool position. With an
/// empty image pool the first range is just `{0}`.
pub fn classify(raw_offset: u32, layout: &SectionLayout) -> Option<Pool> {
    if raw_offset <= layout.img_len {
        Some(Pool::Image)
    } else if layout.z_img_start <= raw_offset && raw_offset <= layout.layer_start {
        Some(Pool::ZImage)
    } else {
        None
    }
}

/// True when `raw_offset + length` stays inside the pool's addressing bound.
pub fn fits_pool(raw_offset: u32, length: u32, pool: Pool, layout: &SectionLayout) -> bool {
    let end = u64::from(raw_offset) + u64::from(length);
    match pool {
        Pool::Image => end <= u64::from(layout.img_len),
        Pool::ZImage => end <= u64::from(layout.layer_start),
    }
}

/// Classify and bounds-check a pair that the layer grammar says must be a reference.
pub fn resolve(raw_offset: u32, length: u32, layout: &SectionLayout) -> ResResult<ImageReference> {
    let pool = classify(raw_offset, layout).ok_or_else(|| {
        ResError::structural(format!(
            "offset 0x{raw_offset:08X} is in neither the image pool (0..=0x{:X}) nor the z-image pool (0x{:08X}..=0x{:08X})",
            layout.img_len, layout.z_img_start, layout.layer_start
        ))
    })?;
    if !fits_pool(raw_offset, length, pool, layout) {
        return Err(ResError::structural(format!(
            "{pool:?} reference 0x{raw_offset:08X}+0x{length:X} runs past the end of its pool"
        )));
    }
    Ok(ImageReference {
        offset: raw_offset,
        length,
        pool,
    })
}

/// Offset to store for an image placed at `local` bytes into its pool.
///
/// Image-pool references stay relative; z-pool references become absolute.
pub fn emit_offset(pool: Pool, local: u32, layout: &SectionLayout) -> ResResult<u32> {
    match pool {
        Pool::Image => Ok(local),
        Pool::ZImage => layout.z_img_start.checked_add(local).ok_or_else(|| {
            ResError::structural(format!(
                "z-image offset 0x{:08X}+0x{local:X} overflows",
                layout.z_img_start
            ))
        }),
    }
}

/// Insertion-ordered map from distinct references to sequential ids.
///
/// Identity is the raw `(offset, length)` pair; content is never compared.
#[derive(Clone, Debug, Default)]
pub struct RefTable {
    ids: HashMap<(u32, u32), RefId>,
    refs: Vec<ImageReference>,
}

impl RefTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id already assigned to a pair, if any.
    pub fn get(&self, offset: u32, length: u32) -> Option<RefId> {
        self.ids.get(&(offset, length)).copied()
    }

    /// Return the pair's id, assigning the next one on first sight.
    /// The flag is true when the id is new.
    pub fn intern(&mut self, reference: ImageReference) -> (RefId, bool) {
        if let Some(id) = self.get(reference.offset, reference.length) {
            return (id, false);
        }
        let id = self.refs.len() as RefId;
        self.ids.insert((reference.offset, reference.length), id);
        self.refs.push(reference);
        (id, true)
    }

    /// Reference for an id.
    pub fn reference(&self, id: RefId) -> Option<&ImageReference> {
        self.refs.get(id as usize)
    }

    /// References in id order.
    pub fn references(&self) -> &[ImageReference] {
        &self.refs
    }

    /// Number of distinct references.
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// True before anything was interned.
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub(crate) fn into_references(self) -> Vec<ImageReference> {
        self.refs
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resolve/refs.rs"]
mod tests;
