use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::{
    container::{
        codec,
        model::{DecodeReport, ResourceModel},
        opts::DecodeOpts,
    },
    format::{clock_id::ClockId, header::Magic},
    foundation::{
        diag::Diagnostic,
        error::{ResError, ResResult},
    },
    raster::{blob::ImageBlob, chunk::ChunkHeader},
    resolve::refs::{Pool, RefId},
};

/// Header, thumbnail and image table.
pub const MANIFEST_FILE: &str = "manifest.json";
/// All layer records.
pub const LAYERS_FILE: &str = "layers.json";
/// Directory of `<ref_id>.bin` / `<ref_id>.png` files.
pub const IMAGES_DIR: &str = "images";
/// File stem of the thumbnail.
pub const THUMBNAIL_STEM: &str = "thumbnail";
/// Bytes after the last layer record.
pub const TRAILER_FILE: &str = "trailer.bin";

/// Stored bytes of one image plus what is known about them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    /// Exact stored bytes, relative to the unpacked directory.
    pub file: String,
    /// Short description such as `chunk:rgb565` or `raw:png`.
    pub kind: String,
    /// Chunk header fields, when the blob is a chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk: Option<ChunkHeader>,
    /// Best-effort PNG rendering, relative to the unpacked directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub png: Option<String>,
}

/// One row of the image table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    /// Deduplication id used by `layers.json`.
    pub ref_id: RefId,
    /// Pool the image belongs to.
    pub pool: Pool,
    /// Offset as stored in the source container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    /// Span length in the source container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// Stored bytes.
    #[serde(flatten)]
    pub asset: AssetEntry,
}

/// Contents of `manifest.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Header tag variant.
    pub magic: Magic,
    /// Clock identifier fields.
    pub clock_id: ClockId,
    /// Raw identifier, for reference only.
    pub clock_id_raw: u32,
    /// Pixel resolution of the clock's prefix, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<(u32, u32)>,
    /// Assumed `area_num` length used while decoding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_num_count: Option<usize>,
    /// Thumbnail, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<AssetEntry>,
    /// Image table ordered by `ref_id`.
    pub images: Vec<ImageEntry>,
    /// Trailer file, if the container had trailing bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailer: Option<String>,
    /// Findings from decoding.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// What [`write_dir`] produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnpackSummary {
    /// Output directory.
    pub dir: PathBuf,
    /// Number of layer records.
    pub layers: usize,
    /// Number of distinct images.
    pub images: usize,
    /// Images that also got a PNG.
    pub pngs: usize,
    /// Number of diagnostics.
    pub diagnostics: usize,
}

/// Decode `src` and unpack it into `dir`.
pub fn unpack_file(src: &Path, dir: &Path, opts: &DecodeOpts) -> ResResult<UnpackSummary> {
    let bytes = std::fs::read(src).with_context(|| format!("read '{}'", src.display()))?;
    let decoded = codec::decode(&bytes, opts).map_err(|e| e.context(src.display()))?;
    write_dir(&decoded.model, Some((&decoded.report, opts)), dir)
}

/// Write a model to `dir`. `source` adds provenance and diagnostics from a decode.
pub fn write_dir(
    model: &ResourceModel,
    source: Option<(&DecodeReport, &DecodeOpts)>,
    dir: &Path,
) -> ResResult<UnpackSummary> {
    let images_dir = dir.join(IMAGES_DIR);
    std::fs::create_dir_all(&images_dir)
        .with_context(|| format!("create output dir '{}'", images_dir.display()))?;

    let mut pngs = 0;
    let thumbnail = match &model.thumbnail {
        Some(blob) => Some(write_asset(dir, THUMBNAIL_STEM, blob, &mut pngs)?),
        None => None,
    };

    let mut images = Vec::with_capacity(model.images.len());
    for (ref_id, image) in model.images() {
        let stem = format!("{IMAGES_DIR}/{ref_id}");
        let origin = source.and_then(|(report, _)| report.origins.get(ref_id as usize));
        images.push(ImageEntry {
            ref_id,
            pool: image.pool,
            offset: origin.map(|o| o.offset),
            length: origin.map(|o| o.length),
            asset: write_asset(dir, &stem, &image.blob, &mut pngs)?,
        });
    }

    let trailer = if model.trailer.is_empty() {
        None
    } else {
        write_file(&dir.join(TRAILER_FILE), &model.trailer)?;
        Some(TRAILER_FILE.to_owned())
    };

    let diagnostics = source
        .map(|(report, _)| report.diagnostics.items().to_vec())
        .unwrap_or_default();
    let manifest = Manifest {
        magic: model.magic,
        clock_id: model.clock_id,
        clock_id_raw: model.clock_id.encode(),
        resolution: model.clock_id.resolution(),
        area_num_count: source.map(|(_, opts)| opts.area_num_count),
        thumbnail,
        images,
        trailer,
        diagnostics,
    };
    write_json(&dir.join(MANIFEST_FILE), &manifest)?;
    write_json(&dir.join(LAYERS_FILE), &model.layers)?;

    tracing::info!(
        dir = %dir.display(),
        layers = model.layers.len(),
        images = model.images.len(),
        pngs,
        "unpacked"
    );
    Ok(UnpackSummary {
        dir: dir.to_path_buf(),
        layers: model.layers.len(),
        images: model.images.len(),
        pngs,
        diagnostics: manifest.diagnostics.len(),
    })
}

fn write_asset(dir: &Path, stem: &str, blob: &ImageBlob, pngs: &mut usize) -> ResResult<AssetEntry> {
    let file = format!("{stem}.bin");
    write_file(&dir.join(&file), &blob.to_bytes()?)?;

    let png = match blob.decode_rgba() {
        Ok(raster) => {
            let name = format!("{stem}.png");
            let path = dir.join(&name);
            raster
                .save_with_format(&path, image::ImageFormat::Png)
                .with_context(|| format!("write png '{}'", path.display()))?;
            *pngs += 1;
            Some(name)
        }
        Err(err) => {
            tracing::debug!(%stem, %err, "no png rendering");
            None
        }
    };

    Ok(AssetEntry {
        file,
        kind: blob.kind(),
        chunk: blob.as_chunk().map(|c| *c.header()),
        png,
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> ResResult<()> {
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> ResResult<()> {
    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| ResError::serde(format!("serialize '{}': {e}", path.display())))?;
    write_file(path, &json)
}

#[cfg(test)]
#[path = "../../tests/unit/export/unpack.rs"]
mod tests;
