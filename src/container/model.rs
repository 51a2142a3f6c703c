use crate::{
    format::{clock_id::ClockId, header::Magic, layout::SectionLayout},
    foundation::{diag::Diagnostics, error::ResResult},
    layer::record::LayerRecord,
    raster::blob::ImageBlob,
    resolve::{
        refs::{ImageReference, Pool, RefId},
        session::PooledImage,
    },
};

/// Location-independent contents of a `.res` container.
///
/// Layers refer to images by [`RefId`], which indexes `images`. Section
/// offsets are not stored; encoding recomputes them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceModel {
    /// Header tag variant.
    pub magic: Magic,
    /// Clock identifier.
    pub clock_id: ClockId,
    /// Thumbnail, absent when the section is empty.
    pub thumbnail: Option<ImageBlob>,
    /// Layer records in file order.
    pub layers: Vec<LayerRecord>,
    /// Deduplicated images; position is the [`RefId`].
    pub images: Vec<PooledImage>,
    /// Bytes after the last complete layer record.
    pub trailer: Vec<u8>,
}

impl ResourceModel {
    /// Empty model for a clock id.
    pub fn new(magic: Magic, clock_id: ClockId) -> Self {
        Self {
            magic,
            clock_id,
            thumbnail: None,
            layers: Vec::new(),
            images: Vec::new(),
            trailer: Vec::new(),
        }
    }

    /// Append an image and return its id.
    pub fn push_image(&mut self, pool: Pool, blob: ImageBlob) -> RefId {
        self.images.push(PooledImage { pool, blob });
        (self.images.len() - 1) as RefId
    }

    /// Image for an id.
    pub fn image(&self, ref_id: RefId) -> Option<&PooledImage> {
        self.images.get(ref_id as usize)
    }

    /// `(ref_id, image)` pairs in id order.
    pub fn images(&self) -> impl Iterator<Item = (RefId, &PooledImage)> {
        self.images
            .iter()
            .enumerate()
            .map(|(id, image)| (id as RefId, image))
    }

    /// `(ref_id, raster)` pairs; images whose pixels cannot be decoded yield
    /// their error without stopping the iteration.
    pub fn rasters(&self) -> impl Iterator<Item = (RefId, ResResult<image::RgbaImage>)> + '_ {
        self.images().map(|(id, image)| (id, image.blob.decode_rgba()))
    }
}

/// Side information from one decode: where each image came from and what
/// looked suspicious.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeReport {
    /// Section layout of the source file.
    pub layout: SectionLayout,
    /// Source `(offset, length)` of each image, indexed by [`RefId`].
    pub origins: Vec<ImageReference>,
    /// Non-fatal findings.
    pub diagnostics: Diagnostics,
}

/// Result of [`crate::decode`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoded {
    /// The container contents.
    pub model: ResourceModel,
    /// Provenance and diagnostics.
    pub report: DecodeReport,
}
