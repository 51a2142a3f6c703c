use crate::{
    container::opts::{DecodeOpts, Plausibility},
    format::layout::SectionLayout,
    foundation::{
        bytes::{BeReader, BeWriter},
        diag::DiagnosticKind,
        error::{ResError, ResResult},
    },
    layer::{
        record::{LayerEntry, LayerHeader, LayerRecord, ParamShape, TEXT_FIELD_LEN},
        rules::{self, EntryShape},
    },
    resolve::{
        refs::{self, Pool},
        session::{DecodeContext, PoolBuilder, Verdict},
    },
};

/// Fields that always follow the optional header fields: alignType, x, y, num.
const HEADER_TAIL_LEN: usize = 16;

/// Smallest possible entry.
const MIN_ENTRY_LEN: usize = 4;

/// Decode the record starting at the reader's position.
pub(crate) fn decode_record(
    r: &mut BeReader<'_>,
    ctx: &mut DecodeContext<'_>,
    layer: usize,
) -> ResResult<LayerRecord> {
    let header_at = r.position();
    let (header, num) =
        decode_header(r, ctx, layer).map_err(|e| e.context(format!("layer {layer} header")))?;

    let mut entries = Vec::with_capacity(num);
    let mut inferred = false;
    for idx in 0..num {
        let entry = decode_entry(r, ctx, &header, layer, idx)
            .map_err(|e| e.context(format!("layer {layer} entry {idx}")))?;
        inferred |= matches!(
            entry,
            LayerEntry::IntParam {
                shape: ParamShape::Inferred,
                ..
            }
        );
        entries.push(entry);
    }

    if inferred && !rules::draw_type_is_known(header.draw_type) {
        ctx.report(
            DiagnosticKind::UnknownField,
            Some(layer),
            None,
            header_at,
            format!(
                "drawType {} (dataType {}) has no explicit entry rule; some entries were stored as inferred integers",
                header.draw_type, header.data_type
            ),
        );
    }

    tracing::debug!(
        layer,
        draw_type = header.draw_type,
        data_type = header.data_type,
        num,
        "decoded layer record"
    );
    Ok(LayerRecord { header, entries })
}

fn decode_header(
    r: &mut BeReader<'_>,
    ctx: &mut DecodeContext<'_>,
    layer: usize,
) -> ResResult<(LayerHeader, usize)> {
    let draw_type = r.read_i32("drawType")?;
    let data_type = r.read_i32("dataType")?;
    let mut header = LayerHeader::new(draw_type, data_type, 0, 0, 0);

    if header.expects_interval() {
        header.interval = Some(r.read_i32("interval")?);
    }
    if header.expects_area_num() {
        header.area_num = Some(decode_area_num(r, ctx, layer)?);
    }

    header.align_type = r.read_i32("alignType")?;
    header.x = r.read_i32("x")?;
    header.y = r.read_i32("y")?;
    let num_at = r.position();
    let num = r.read_i32("num")?;
    let num = usize::try_from(num)
        .map_err(|_| ResError::structural(format!("negative entry count {num} at 0x{num_at:08X}")))?;
    if num.saturating_mul(MIN_ENTRY_LEN) > r.remaining() {
        return Err(ResError::structural(format!(
            "entry count {num} at 0x{num_at:08X} needs more than the {} bytes left",
            r.remaining()
        )));
    }
    Ok((header, num))
}

/// Read up to `area_num_count` values.
///
/// The list length is not stored, so this is an approximation: it stops early
/// when a value is outside `0..=0xFFFF` or when consuming it would leave too
/// little room for the rest of the header.
fn decode_area_num(
    r: &mut BeReader<'_>,
    ctx: &mut DecodeContext<'_>,
    layer: usize,
) -> ResResult<Vec<i32>> {
    let want = ctx.opts.area_num_count;
    let mut values = Vec::with_capacity(want);
    while values.len() < want {
        let at = r.position();
        let stop = if r.remaining() < MIN_ENTRY_LEN + HEADER_TAIL_LEN {
            Some("too few bytes left for the rest of the header".to_owned())
        } else {
            match r.peek_u32() {
                Some(raw) if raw <= 0xFFFF => None,
                Some(raw) => Some(format!("value 0x{raw:08X} is not a plausible area number")),
                None => Some("end of layer data".to_owned()),
            }
        };
        if let Some(reason) = stop {
            ctx.report(
                DiagnosticKind::AreaCount,
                Some(layer),
                None,
                at,
                format!(
                    "area_num stopped after {} of {want} values: {reason}",
                    values.len()
                ),
            );
            break;
        }
        values.push(r.read_i32("area_num")?);
    }
    Ok(values)
}

fn decode_entry(
    r: &mut BeReader<'_>,
    ctx: &mut DecodeContext<'_>,
    header: &LayerHeader,
    layer: usize,
    idx: usize,
) -> ResResult<LayerEntry> {
    let rule = rules::select(header.draw_type, header.data_type, idx);
    match rule.shape {
        EntryShape::Pointer => {
            let x_off = r.read_i32("pointer x")?;
            let y_off = r.read_i32("pointer y")?;
            let (pool, ref_id) = decode_pair(r, ctx)?;
            Ok(LayerEntry::Pointer {
                x_off,
                y_off,
                pool,
                ref_id,
            })
        }
        EntryShape::Literal => Ok(LayerEntry::int(r.read_i32("parameter")?)),
        EntryShape::FixedText => {
            let at = r.position();
            let field = r.read_bytes(TEXT_FIELD_LEN, "text field")?;
            let (entry, lossy) = decode_text(field);
            if lossy {
                ctx.report(
                    DiagnosticKind::LossyText,
                    Some(layer),
                    Some(idx),
                    at,
                    "text field is not clean NUL-padded UTF-8; raw bytes kept".to_owned(),
                );
            }
            Ok(entry)
        }
        EntryShape::ImagePair => {
            let (pool, ref_id) = decode_pair(r, ctx)?;
            Ok(LayerEntry::reference(pool, ref_id))
        }
        EntryShape::Heuristic => decode_speculative(r, ctx, layer, idx),
    }
}

/// A pair the grammar says is a reference; anything else is fatal.
fn decode_pair(r: &mut BeReader<'_>, ctx: &mut DecodeContext<'_>) -> ResResult<(Pool, u32)> {
    let offset = r.read_u32("image offset")?;
    let length = r.read_u32("image length")?;
    let reference = refs::resolve(offset, length, &ctx.layout)?;
    Ok((reference.pool, ctx.intern(reference)?))
}

fn decode_speculative(
    r: &mut BeReader<'_>,
    ctx: &mut DecodeContext<'_>,
    layer: usize,
    idx: usize,
) -> ResResult<LayerEntry> {
    let at = r.position();
    let raw = r.read_u32("entry")?;
    let verdict = match r.peek_u32() {
        Some(length) => ctx.judge(raw, length),
        None => Verdict::Literal {
            plausible: false,
            reason: "no room for a length".to_owned(),
        },
    };

    match verdict {
        Verdict::Reference {
            reference,
            confident,
        } => {
            r.read_u32("image length")?;
            let ref_id = ctx.intern(reference)?;
            if !confident {
                ctx.report(
                    DiagnosticKind::LowConfidenceReference,
                    Some(layer),
                    Some(idx),
                    at,
                    format!(
                        "accepted 0x{:08X}+0x{:X} as a {:?} reference without an image signature",
                        reference.offset, reference.length, reference.pool
                    ),
                );
            }
            Ok(LayerEntry::reference(reference.pool, ref_id))
        }
        Verdict::Literal { plausible, reason } => {
            if plausible {
                ctx.report(
                    DiagnosticKind::AmbiguousEntry,
                    Some(layer),
                    Some(idx),
                    at,
                    format!("read 0x{raw:08X} as an integer: {reason}"),
                );
            }
            Ok(LayerEntry::IntParam {
                value: raw as i32,
                shape: ParamShape::Inferred,
            })
        }
    }
}

/// Text up to the first NUL. Lossy when bytes follow the NUL or the text is
/// not UTF-8; the raw field is kept in that case.
fn decode_text(field: &[u8]) -> (LayerEntry, bool) {
    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    let (text, padding) = field.split_at(end);
    let clean = std::str::from_utf8(text).is_ok() && padding.iter().all(|b| *b == 0);
    let entry = LayerEntry::FixedString {
        text: String::from_utf8_lossy(text).into_owned(),
        raw: (!clean).then(|| field.to_vec()),
    };
    (entry, !clean)
}

/// Bytes the record occupies in layer data.
pub(crate) fn encoded_len(record: &LayerRecord) -> usize {
    let optional = usize::from(record.header.interval.is_some())
        + record.header.area_num.as_ref().map_or(0, Vec::len);
    let entries: usize = record.entries.iter().map(LayerEntry::encoded_len).sum();
    4 * (2 + optional) + HEADER_TAIL_LEN + entries
}

/// Assign pool slots to every reference in the record, in entry order.
pub(crate) fn place_record(
    record: &LayerRecord,
    pools: &mut PoolBuilder<'_>,
    layer: usize,
) -> ResResult<()> {
    for (idx, entry) in record.entries.iter().enumerate() {
        if let Some((pool, ref_id)) = entry.image() {
            pools
                .place(pool, ref_id)
                .map_err(|e| e.context(format!("layer {layer} entry {idx}")))?;
        }
    }
    Ok(())
}

/// How a later decode must read an entry back, located by absolute offset in
/// the finished file. Only entries whose reading depends on the bytes around
/// them are recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ReadbackCheck {
    pub(crate) layer: usize,
    pub(crate) entry: usize,
    /// Offset of the `(offset, length)` pair, or of the integer.
    pub(crate) at: usize,
    pub(crate) expect: Readback,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Readback {
    /// A rule-declared pair. Always read as a reference; it only has to be
    /// registered so later fallback pairs see it as known.
    DeclaredPair,
    /// A reference at a fallback position.
    Reference,
    /// An integer at a fallback position.
    Literal,
}

/// Serialize a record. Every entry must have the variant the rule table
/// expects at its position, otherwise the stream would desynchronize on
/// decode. Entries at fallback positions are queued in `checks` for
/// [`verify_readback`].
pub(crate) fn encode_record(
    record: &LayerRecord,
    pools: &PoolBuilder<'_>,
    layout: &SectionLayout,
    w: &mut BeWriter,
    layer: usize,
    checks: &mut Vec<ReadbackCheck>,
) -> ResResult<()> {
    let header = &record.header;
    header
        .validate()
        .map_err(|e| e.context(format!("layer {layer} header")))?;
    let num = i32::try_from(record.num()).map_err(|_| {
        ResError::structural(format!("layer {layer} has too many entries ({})", record.num()))
    })?;

    w.put_i32(header.draw_type);
    w.put_i32(header.data_type);
    if let Some(interval) = header.interval {
        w.put_i32(interval);
    }
    for value in header.area_num.iter().flatten() {
        w.put_i32(*value);
    }
    w.put_i32(header.align_type);
    w.put_i32(header.x);
    w.put_i32(header.y);
    w.put_i32(num);

    for (idx, entry) in record.entries.iter().enumerate() {
        let at_entry = |e: ResError| e.context(format!("layer {layer} entry {idx}"));
        let shape = rules::select(header.draw_type, header.data_type, idx).shape;
        let expect = readback_for(shape, entry).map_err(at_entry)?;
        if let Some(expect) = expect {
            let pair_skip = if matches!(entry, LayerEntry::Pointer { .. }) { 8 } else { 0 };
            checks.push(ReadbackCheck {
                layer,
                entry: idx,
                at: w.len() + pair_skip,
                expect,
            });
        }
        encode_entry(entry, pools, layout, w).map_err(at_entry)?;
    }
    Ok(())
}

/// Reject an entry the decoder would read with a different shape.
fn readback_for(shape: EntryShape, entry: &LayerEntry) -> ResResult<Option<Readback>> {
    let expect = match (shape, entry) {
        (EntryShape::Pointer, LayerEntry::Pointer { .. }) => Some(Readback::DeclaredPair),
        (EntryShape::Literal, LayerEntry::IntParam { .. }) => None,
        (EntryShape::FixedText, LayerEntry::FixedString { .. }) => None,
        (EntryShape::ImagePair, LayerEntry::ImageRef { .. } | LayerEntry::ZImageRef { .. }) => {
            Some(Readback::DeclaredPair)
        }
        (EntryShape::Heuristic, LayerEntry::ImageRef { .. } | LayerEntry::ZImageRef { .. }) => {
            Some(Readback::Reference)
        }
        (EntryShape::Heuristic, LayerEntry::IntParam { .. }) => Some(Readback::Literal),
        (shape, entry) => {
            return Err(ResError::structural(format!(
                "{} entry cannot be stored where the decoder expects {shape:?}",
                entry_kind(entry)
            )));
        }
    };
    Ok(expect)
}

fn entry_kind(entry: &LayerEntry) -> &'static str {
    match entry {
        LayerEntry::Pointer { .. } => "pointer",
        LayerEntry::FixedString { .. } => "text",
        LayerEntry::IntParam { .. } => "integer",
        LayerEntry::ImageRef { .. } => "image reference",
        LayerEntry::ZImageRef { .. } => "z-image reference",
    }
}

/// Replay the decoder's reference bookkeeping over the finished file and fail
/// when a fallback-position entry would read back as something else.
///
/// Runs under [`Plausibility::Signature`] with the given `min_chunk_len`, so
/// the file decodes as written with those decode options.
pub(crate) fn verify_readback(
    file: &[u8],
    layout: SectionLayout,
    checks: &[ReadbackCheck],
    min_chunk_len: u32,
) -> ResResult<()> {
    let opts = DecodeOpts {
        min_chunk_len,
        plausibility: Plausibility::Signature,
        ..DecodeOpts::default()
    };
    let mut ctx = DecodeContext::new(file, layout, &opts);
    for check in checks {
        let at_entry = |e: ResError| e.context(format!("layer {} entry {}", check.layer, check.entry));
        let mut r = BeReader::new(file.get(check.at..).unwrap_or(&[]), check.at);
        match check.expect {
            Readback::DeclaredPair => {
                let offset = r.read_u32("image offset")?;
                let length = r.read_u32("image length")?;
                let reference = refs::resolve(offset, length, &layout).map_err(at_entry)?;
                ctx.intern(reference)?;
            }
            Readback::Reference => {
                let offset = r.read_u32("image offset")?;
                let length = r.read_u32("image length")?;
                match ctx.judge(offset, length) {
                    Verdict::Reference {
                        reference,
                        confident: true,
                    } => {
                        ctx.intern(reference)?;
                    }
                    Verdict::Reference { .. } => {
                        return Err(at_entry(ResError::structural(
                            "reference would only be accepted by a lenient decoder",
                        )));
                    }
                    Verdict::Literal { reason, .. } => {
                        return Err(at_entry(ResError::structural(format!(
                            "reference would read back as an integer: {reason}"
                        ))));
                    }
                }
            }
            Readback::Literal => {
                let raw = r.read_u32("entry")?;
                let Some(length) = r.peek_u32() else {
                    continue;
                };
                if let Verdict::Reference { reference, .. } = ctx.judge(raw, length) {
                    return Err(at_entry(ResError::structural(format!(
                        "integer {} would read back as a {:?} reference",
                        raw as i32, reference.pool
                    ))));
                }
            }
        }
    }
    Ok(())
}

fn encode_entry(
    entry: &LayerEntry,
    pools: &PoolBuilder<'_>,
    layout: &SectionLayout,
    w: &mut BeWriter,
) -> ResResult<()> {
    match entry {
        LayerEntry::Pointer {
            x_off,
            y_off,
            ref_id,
            ..
        } => {
            w.put_i32(*x_off);
            w.put_i32(*y_off);
            let (offset, length) = pools.address(*ref_id, layout)?;
            w.put_u32(offset);
            w.put_u32(length);
        }
        LayerEntry::FixedString { text, raw } => w.put_bytes(&encode_text(text, raw.as_deref())?),
        LayerEntry::IntParam { value, .. } => w.put_i32(*value),
        LayerEntry::ImageRef { ref_id } | LayerEntry::ZImageRef { ref_id } => {
            let (offset, length) = pools.address(*ref_id, layout)?;
            w.put_u32(offset);
            w.put_u32(length);
        }
    }
    Ok(())
}

fn encode_text(text: &str, raw: Option<&[u8]>) -> ResResult<[u8; TEXT_FIELD_LEN]> {
    let mut field = [0u8; TEXT_FIELD_LEN];
    if let Some(raw) = raw {
        if raw.len() != TEXT_FIELD_LEN {
            return Err(ResError::structural(format!(
                "raw text field must be {TEXT_FIELD_LEN} bytes, got {}",
                raw.len()
            )));
        }
        field.copy_from_slice(raw);
        return Ok(field);
    }
    let bytes = text.as_bytes();
    if bytes.len() > TEXT_FIELD_LEN {
        return Err(ResError::structural(format!(
            "text {text:?} is {} bytes, field holds {TEXT_FIELD_LEN}",
            bytes.len()
        )));
    }
    if bytes.contains(&0) {
        return Err(ResError::structural(format!(
            "text {text:?} contains a NUL byte"
        )));
    }
    field[..bytes.len()].copy_from_slice(bytes);
    Ok(field)
}

#[cfg(test)]
#[path = "../../tests/unit/layer/codec.rs"]
mod tests;
