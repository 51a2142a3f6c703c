use serde::{Deserialize, Serialize};

use crate::format::header::HEADER_LEN;

/// How strictly the fallback entry rule decides that an `(offset, length)`
/// pair is an image reference rather than two literals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plausibility {
    /// The span must start with a chunk header consistent with its length, or
    /// with a recognizable raw image signature.
    #[default]
    Signature,
    /// Any in-bounds span is accepted, recorded as a low-confidence reference.
    Lenient,
}

/// Default for [`DecodeOpts::min_chunk_len`] and [`EncodeOpts::min_chunk_len`].
pub const DEFAULT_MIN_CHUNK_LEN: u32 = 16;

/// Decode configuration.
///
/// `area_num_count` cannot be recovered from the binary; the value is an
/// assumption applied to every `dataType == 112` record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOpts {
    /// Assumed element count of the `area_num` list.
    pub area_num_count: usize,
    /// Minimum length for the fallback rule to accept a pair as a reference.
    pub min_chunk_len: u32,
    /// Fallback acceptance policy.
    pub plausibility: Plausibility,
}

impl Default for DecodeOpts {
    fn default() -> Self {
        Self {
            area_num_count: 4,
            min_chunk_len: DEFAULT_MIN_CHUNK_LEN,
            plausibility: Plausibility::Signature,
        }
    }
}

/// Encode configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOpts {
    /// Offset of the thumbnail, normally right after the header.
    pub thumb_start: u32,
    /// `min_chunk_len` the output must decode under. References at
    /// fallback-rule positions that would not be accepted with it are
    /// rejected.
    pub min_chunk_len: u32,
}

impl Default for EncodeOpts {
    fn default() -> Self {
        Self {
            thumb_start: HEADER_LEN as u32,
            min_chunk_len: DEFAULT_MIN_CHUNK_LEN,
        }
    }
}

/// Batch unpack configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOpts {
    /// Worker threads; `None` uses rayon's default. `Some(0)` is rejected.
    pub threads: Option<usize>,
    /// Applied to every file.
    pub decode: DecodeOpts,
}
