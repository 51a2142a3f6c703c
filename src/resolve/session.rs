use std::collections::HashMap;

use crate::{
    container::opts::{DecodeOpts, Plausibility},
    format::layout::SectionLayout,
    foundation::{
        diag::{Diagnostic, DiagnosticKind, Diagnostics},
        error::{ResError, ResResult},
    },
    raster::{blob::ImageBlob, chunk::ChunkHeader, sniff::RawFormat},
    resolve::refs::{self, ImageReference, Pool, RefId, RefTable},
};

/// One deduplicated image: its pool and stored bytes. Position in
/// `ResourceModel::images` is its [`RefId`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PooledImage {
    /// Pool the image lives in.
    pub pool: Pool,
    /// Stored bytes.
    pub blob: ImageBlob,
}

/// Outcome of the fallback rule's plausibility test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// Read the pair as a reference. `confident` is false when accepted without a signature.
    Reference {
        reference: ImageReference,
        confident: bool,
    },
    /// Read the first word as a literal. `plausible` marks near-misses worth reporting.
    Literal { plausible: bool, reason: String },
}

/// Per-file decode state: reference table, collected images and diagnostics.
///
/// Never shared between files.
pub(crate) struct DecodeContext<'a> {
    file: &'a [u8],
    pub(crate) layout: SectionLayout,
    pub(crate) opts: &'a DecodeOpts,
    refs: RefTable,
    images: Vec<PooledImage>,
    pub(crate) diagnostics: Diagnostics,
}

impl<'a> DecodeContext<'a> {
    pub(crate) fn new(file: &'a [u8], layout: SectionLayout, opts: &'a DecodeOpts) -> Self {
        Self {
            file,
            layout,
            opts,
            refs: RefTable::new(),
            images: Vec::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Id for `reference`, copying its span on first sight.
    pub(crate) fn intern(&mut self, reference: ImageReference) -> ResResult<RefId> {
        let (id, fresh) = self.refs.intern(reference);
        if fresh {
            let span = reference.span(&self.layout);
            let bytes = self.file.get(span.clone()).ok_or_else(|| {
                ResError::structural(format!(
                    "image span 0x{:08X}..0x{:08X} beyond end of file",
                    span.start, span.end
                ))
            })?;
            let blob = ImageBlob::from_span(bytes);
            tracing::debug!(
                ref_id = id,
                pool = ?reference.pool,
                offset = reference.offset,
                length = reference.length,
                kind = %blob.kind(),
                "new image reference"
            );
            self.images.push(PooledImage {
                pool: reference.pool,
                blob,
            });
        }
        Ok(id)
    }

    /// Decide whether a speculative pair reads as an image reference.
    pub(crate) fn judge(&self, raw_offset: u32, length: u32) -> Verdict {
        let literal = |plausible: bool, reason: String| Verdict::Literal { plausible, reason };

        if length == 0 {
            return literal(false, "zero length".into());
        }
        let Some(pool) = refs::classify(raw_offset, &self.layout) else {
            return literal(false, "offset outside both pools".into());
        };
        let reference = ImageReference {
            offset: raw_offset,
            length,
            pool,
        };
        if self.refs.get(raw_offset, length).is_some() {
            return Verdict::Reference {
                reference,
                confident: true,
            };
        }
        if length < self.opts.min_chunk_len {
            return literal(
                true,
                format!("length {length} below minimum {}", self.opts.min_chunk_len),
            );
        }
        if !refs::fits_pool(raw_offset, length, pool, &self.layout) {
            return literal(true, format!("{pool:?} span overruns its pool"));
        }

        let span = self.file.get(reference.span(&self.layout)).unwrap_or(&[]);
        let has_signature = ChunkHeader::parse(span).is_some_and(|h| h.fits_span(span.len()))
            || RawFormat::sniff(span) != RawFormat::Unknown;
        match (has_signature, self.opts.plausibility) {
            (true, _) => Verdict::Reference {
                reference,
                confident: true,
            },
            (false, Plausibility::Lenient) => Verdict::Reference {
                reference,
                confident: false,
            },
            (false, Plausibility::Signature) => {
                literal(true, format!("{pool:?} span has no image signature"))
            }
        }
    }

    pub(crate) fn report(
        &mut self,
        kind: DiagnosticKind,
        layer: Option<usize>,
        entry: Option<usize>,
        offset: usize,
        message: String,
    ) {
        self.diagnostics.push(Diagnostic {
            kind,
            layer,
            entry,
            offset,
            message,
        });
    }

    pub(crate) fn finish(self) -> (Vec<PooledImage>, Vec<ImageReference>, Diagnostics) {
        (self.images, self.refs.into_references(), self.diagnostics)
    }
}

/// Encode-side pool assembly: images are placed in first-use order, each
/// [`RefId`] once.
pub(crate) struct PoolBuilder<'m> {
    images: &'m [PooledImage],
    slots: HashMap<RefId, (Pool, u32, u32)>,
    img_pool: Vec<u8>,
    z_pool: Vec<u8>,
}

impl<'m> PoolBuilder<'m> {
    pub(crate) fn new(images: &'m [PooledImage]) -> Self {
        Self {
            images,
            slots: HashMap::new(),
            img_pool: Vec::new(),
            z_pool: Vec::new(),
        }
    }

    /// Place `ref_id` on first use; `pool` is the pool the entry expects.
    pub(crate) fn place(&mut self, pool: Pool, ref_id: RefId) -> ResResult<()> {
        let image = self.images.get(ref_id as usize).ok_or_else(|| {
            ResError::structural(format!(
                "reference to unknown ref_id {ref_id} ({} images in model)",
                self.images.len()
            ))
        })?;
        if image.pool != pool {
            return Err(ResError::structural(format!(
                "ref_id {ref_id} lives in the {:?} pool but is referenced as {pool:?}",
                image.pool
            )));
        }
        if self.slots.contains_key(&ref_id) {
            return Ok(());
        }

        let bytes = image.blob.to_bytes()?;
        let target = match pool {
            Pool::Image => &mut self.img_pool,
            Pool::ZImage => &mut self.z_pool,
        };
        let to_u32 = |v: usize| {
            u32::try_from(v)
                .map_err(|_| ResError::structural(format!("{pool:?} pool exceeds 32-bit offsets")))
        };
        let local = to_u32(target.len())?;
        let length = to_u32(bytes.len())?;
        target.extend_from_slice(&bytes);
        self.slots.insert(ref_id, (pool, local, length));
        Ok(())
    }

    pub(crate) fn is_placed(&self, ref_id: RefId) -> bool {
        self.slots.contains_key(&ref_id)
    }

    pub(crate) fn img_len(&self) -> usize {
        self.img_pool.len()
    }

    pub(crate) fn z_img_len(&self) -> usize {
        self.z_pool.len()
    }

    /// Stored `(offset, length)` for a placed id under `layout`.
    pub(crate) fn address(&self, ref_id: RefId, layout: &SectionLayout) -> ResResult<(u32, u32)> {
        let (pool, local, length) = self.slots.get(&ref_id).copied().ok_or_else(|| {
            ResError::structural(format!("ref_id {ref_id} was never placed"))
        })?;
        Ok((refs::emit_offset(pool, local, layout)?, length))
    }

    pub(crate) fn img_bytes(&self) -> &[u8] {
        &self.img_pool
    }

    pub(crate) fn z_img_bytes(&self) -> &[u8] {
        &self.z_pool
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resolve/session.rs"]
mod tests;
