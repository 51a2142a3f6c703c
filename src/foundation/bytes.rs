use std::io::Cursor;

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};

use crate::foundation::error::{ResError, ResResult};

/// Big-endian cursor over a byte span that reports truncation as a structural
/// error carrying the absolute file position.
#[derive(Clone, Debug)]
pub(crate) struct BeReader<'a> {
    cur: Cursor<&'a [u8]>,
    base: usize,
}

impl<'a> BeReader<'a> {
    /// `base` is the absolute file offset of `bytes[0]`, used for messages only.
    pub(crate) fn new(bytes: &'a [u8], base: usize) -> Self {
        Self {
            cur: Cursor::new(bytes),
            base,
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.base + self.cur.position() as usize
    }

    pub(crate) fn remaining(&self) -> usize {
        self.cur
            .get_ref()
            .len()
            .saturating_sub(self.cur.position() as usize)
    }

    pub(crate) fn read_u32(&mut self, what: &str) -> ResResult<u32> {
        let pos = self.position();
        self.cur
            .read_u32::<BigEndian>()
            .map_err(|_| truncated(what, pos, 4))
    }

    pub(crate) fn read_i32(&mut self, what: &str) -> ResResult<i32> {
        let pos = self.position();
        self.cur
            .read_i32::<BigEndian>()
            .map_err(|_| truncated(what, pos, 4))
    }

    /// Look at the next big-endian u32 without consuming it.
    pub(crate) fn peek_u32(&self) -> Option<u32> {
        let mut ahead = self.cur.clone();
        ahead.read_u32::<BigEndian>().ok()
    }

    pub(crate) fn read_bytes(&mut self, n: usize, what: &str) -> ResResult<&'a [u8]> {
        let pos = self.position();
        let start = self.cur.position() as usize;
        let bytes: &'a [u8] = *self.cur.get_ref();
        let end = start
            .checked_add(n)
            .filter(|end| *end <= bytes.len())
            .ok_or_else(|| truncated(what, pos, n))?;
        self.cur.set_position(end as u64);
        Ok(&bytes[start..end])
    }

    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let start = self.cur.position() as usize;
        let bytes: &'a [u8] = *self.cur.get_ref();
        self.cur.set_position(bytes.len() as u64);
        &bytes[start.min(bytes.len())..]
    }
}

fn truncated(what: &str, pos: usize, need: usize) -> ResError {
    ResError::structural(format!(
        "truncated input reading {what} at 0x{pos:08X} ({need} bytes needed)"
    ))
}

/// Growable big-endian output buffer.
#[derive(Clone, Debug, Default)]
pub(crate) struct BeWriter {
    buf: Vec<u8>,
}

impl BeWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn put_u32(&mut self, v: u32) {
        let mut tmp = [0u8; 4];
        BigEndian::write_u32(&mut tmp, v);
        self.buf.extend_from_slice(&tmp);
    }

    pub(crate) fn put_i32(&mut self, v: i32) {
        let mut tmp = [0u8; 4];
        BigEndian::write_i32(&mut tmp, v);
        self.buf.extend_from_slice(&tmp);
    }

    pub(crate) fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/bytes.rs"]
mod tests;
