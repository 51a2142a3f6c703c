use crate::{
    container::{
        model::{DecodeReport, Decoded, ResourceModel},
        opts::{DecodeOpts, EncodeOpts},
    },
    format::{
        header::{HEADER_LEN, ResourceHeader},
        layout::SectionLayout,
    },
    foundation::{
        bytes::{BeReader, BeWriter},
        diag::DiagnosticKind,
        error::{ResError, ResResult},
    },
    layer::codec as layer_codec,
    raster::blob::ImageBlob,
    resolve::session::{DecodeContext, PoolBuilder},
};

/// drawType, dataType, alignType, x, y, num.
const MIN_RECORD_LEN: usize = 24;

/// Decode a whole container.
///
/// Fails on the first structural problem; ambiguous entries and other
/// non-fatal findings end up in [`DecodeReport::diagnostics`].
#[tracing::instrument(skip(bytes, opts), fields(len = bytes.len()))]
pub fn decode(bytes: &[u8], opts: &DecodeOpts) -> ResResult<Decoded> {
    let header = ResourceHeader::parse(bytes)?;
    let layout = SectionLayout::from_header(&header, bytes.len())?;
    tracing::debug!(?layout, clock = %header.clock(), "section layout");

    let thumbnail = (layout.thumb_len > 0).then(|| ImageBlob::from_span(&bytes[layout.thumb()]));

    let mut ctx = DecodeContext::new(bytes, layout, opts);
    let mut r = BeReader::new(&bytes[layout.layers()], layout.layer_start as usize);
    let mut layers = Vec::new();
    while r.remaining() >= MIN_RECORD_LEN {
        let record = layer_codec::decode_record(&mut r, &mut ctx, layers.len())?;
        layers.push(record);
    }

    let trailer_at = r.position();
    let trailer = r.rest().to_vec();
    if !trailer.is_empty() {
        ctx.report(
            DiagnosticKind::TrailingData,
            None,
            None,
            trailer_at,
            format!(
                "{} bytes after the last layer record kept as trailer",
                trailer.len()
            ),
        );
    }

    let (images, origins, diagnostics) = ctx.finish();
    tracing::debug!(
        layers = layers.len(),
        images = images.len(),
        diagnostics = diagnostics.len(),
        "decoded container"
    );

    Ok(Decoded {
        model: ResourceModel {
            magic: header.magic,
            clock_id: header.clock(),
            thumbnail,
            layers,
            images,
            trailer,
        },
        report: DecodeReport {
            layout,
            origins,
            diagnostics,
        },
    })
}

/// Encode a model into container bytes.
///
/// Images are laid out in the order layers first reference them; the output
/// depends only on the model and `opts`. Fails rather than return bytes that
/// would decode to a different model: entries must match the rule table, and
/// entries at fallback positions must read back as written.
#[tracing::instrument(skip_all, fields(layers = model.layers.len(), images = model.images.len()))]
pub fn encode(model: &ResourceModel, opts: &EncodeOpts) -> ResResult<Vec<u8>> {
    if (opts.thumb_start as usize) < HEADER_LEN {
        return Err(ResError::structural(format!(
            "thumb_start {} overlaps the {HEADER_LEN}-byte header",
            opts.thumb_start
        )));
    }
    if model.trailer.len() >= MIN_RECORD_LEN {
        return Err(ResError::structural(format!(
            "trailer of {} bytes would read back as a layer record",
            model.trailer.len()
        )));
    }

    let mut pools = PoolBuilder::new(&model.images);
    for (layer, record) in model.layers.iter().enumerate() {
        layer_codec::place_record(record, &mut pools, layer)?;
    }
    for (ref_id, image) in model.images() {
        if !pools.is_placed(ref_id) {
            tracing::warn!(ref_id, pool = ?image.pool, "image is not referenced by any layer; skipped");
        }
    }

    let thumbnail = match &model.thumbnail {
        Some(blob) => blob.to_bytes()?,
        None => Vec::new(),
    };
    let layer_len = model
        .layers
        .iter()
        .map(layer_codec::encoded_len)
        .sum::<usize>()
        + model.trailer.len();
    let layout = SectionLayout::packed(
        opts.thumb_start,
        thumbnail.len(),
        pools.img_len(),
        pools.z_img_len(),
        layer_len,
    )?;

    let header = ResourceHeader {
        magic: model.magic,
        clock_id: model.clock_id.encode(),
        thumb_start: layout.thumb_start,
        thumb_len: layout.thumb_len,
        img_start: layout.img_start,
        img_len: layout.img_len,
        layer_start: layout.layer_start,
    };

    let mut w = BeWriter::new();
    header.write(&mut w);
    w.put_bytes(&vec![0; opts.thumb_start as usize - HEADER_LEN]);
    w.put_bytes(&thumbnail);
    w.put_bytes(pools.img_bytes());
    w.put_bytes(pools.z_img_bytes());
    let mut checks = Vec::new();
    for (layer, record) in model.layers.iter().enumerate() {
        layer_codec::encode_record(record, &pools, &layout, &mut w, layer, &mut checks)?;
    }
    w.put_bytes(&model.trailer);

    if w.len() != layout.file_len {
        return Err(ResError::structural(format!(
            "encoded {} bytes but the layout expects {}",
            w.len(),
            layout.file_len
        )));
    }
    let bytes = w.into_inner();
    layer_codec::verify_readback(&bytes, layout, &checks, opts.min_chunk_len)?;
    Ok(bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/container/codec.rs"]
mod tests;
