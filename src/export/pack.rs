use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::de::DeserializeOwned;

use crate::{
    container::{
        codec,
        model::ResourceModel,
        opts::EncodeOpts,
    },
    export::unpack::{AssetEntry, LAYERS_FILE, MANIFEST_FILE, Manifest},
    foundation::error::{ResError, ResResult},
    layer::record::LayerRecord,
    raster::{blob::ImageBlob, chunk::ImageChunk},
    resolve::session::PooledImage,
};

/// What [`pack_dir`] produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackSummary {
    /// Written container.
    pub out: PathBuf,
    /// Container size in bytes.
    pub bytes: usize,
    /// Number of layer records.
    pub layers: usize,
    /// Number of images in the model, referenced or not.
    pub images: usize,
}

/// Rebuild a model from an unpacked directory.
///
/// Each image comes from its `.bin` file. When that file is missing but a PNG
/// and the chunk header are present, the PNG is re-encoded with the recorded
/// pixel format and compression flag.
pub fn read_dir(dir: &Path) -> ResResult<ResourceModel> {
    let manifest: Manifest = read_json(&dir.join(MANIFEST_FILE))?;
    let layers: Vec<LayerRecord> = read_json(&dir.join(LAYERS_FILE))?;

    let mut entries = manifest.images;
    entries.sort_by_key(|e| e.ref_id);
    let mut images = Vec::with_capacity(entries.len());
    for (expected, entry) in entries.iter().enumerate() {
        if entry.ref_id as usize != expected {
            return Err(ResError::structural(format!(
                "image table must number ref_ids 0..{}, found {} at position {expected}",
                entries.len(),
                entry.ref_id
            )));
        }
        images.push(PooledImage {
            pool: entry.pool,
            blob: read_asset(dir, &entry.asset)
                .map_err(|e| e.context(format!("image {}", entry.ref_id)))?,
        });
    }

    let thumbnail = match &manifest.thumbnail {
        Some(asset) => Some(read_asset(dir, asset).map_err(|e| e.context("thumbnail"))?),
        None => None,
    };
    let trailer = match &manifest.trailer {
        Some(file) => read_file(&dir.join(file))?,
        None => Vec::new(),
    };

    Ok(ResourceModel {
        magic: manifest.magic,
        clock_id: manifest.clock_id,
        thumbnail,
        layers,
        images,
        trailer,
    })
}

/// Encode an unpacked directory into `out`.
pub fn pack_dir(dir: &Path, out: &Path, opts: &EncodeOpts) -> ResResult<PackSummary> {
    let model = read_dir(dir)?;
    let bytes = codec::encode(&model, opts)?;
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(out, &bytes).with_context(|| format!("write '{}'", out.display()))?;

    tracing::info!(out = %out.display(), bytes = bytes.len(), "packed");
    Ok(PackSummary {
        out: out.to_path_buf(),
        bytes: bytes.len(),
        layers: model.layers.len(),
        images: model.images.len(),
    })
}

fn read_asset(dir: &Path, asset: &AssetEntry) -> ResResult<ImageBlob> {
    let bin = dir.join(&asset.file);
    if bin.exists() {
        let blob = ImageBlob::from_span(&read_file(&bin)?);
        if blob.kind() != asset.kind {
            tracing::warn!(
                file = %bin.display(),
                recorded = %asset.kind,
                found = %blob.kind(),
                "image kind changed since unpacking"
            );
        }
        return Ok(blob);
    }

    let (Some(png), Some(header)) = (&asset.png, &asset.chunk) else {
        return Err(ResError::structural(format!(
            "'{}' is missing and there is no png plus chunk header to rebuild it from",
            bin.display()
        )));
    };
    if header.img_type.is_embedded_file() {
        return Err(ResError::structural(format!(
            "'{}' is missing; {:?} chunks can only be rebuilt from the original file",
            bin.display(),
            header.img_type
        )));
    }
    let path = dir.join(png);
    let raster = crate::raster::pixel::decode_file(&read_file(&path)?)
        .map_err(|e| e.context(path.display()))?;
    tracing::debug!(png = %path.display(), img_type = ?header.img_type, "re-encoding from png");
    Ok(ImageBlob::Chunk(ImageChunk::encode_rgba(
        &raster,
        header.img_type,
        header.compressed,
    )?))
}

fn read_file(path: &Path) -> ResResult<Vec<u8>> {
    Ok(std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> ResResult<T> {
    let bytes = read_file(path)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ResError::serde(format!("parse '{}': {e}", path.display())))
}

#[cfg(test)]
#[path = "../../tests/unit/export/pack.rs"]
mod tests;
