use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{ResError, ResResult},
    resolve::refs::{Pool, RefId},
};

/// `dataType` values whose header carries an extra `interval` field.
pub const INTERVAL_DATA_TYPES: [i32; 3] = [52, 59, 130];

/// `dataType` whose header carries an `area_num` list.
pub const AREA_NUM_DATA_TYPE: i32 = 112;

/// Width of a fixed text entry.
pub const TEXT_FIELD_LEN: usize = 30;

/// Layer header fields. `num` is not stored: it is always the entry count of
/// the owning [`LayerRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerHeader {
    /// Selects the entry grammar together with `data_type`.
    pub draw_type: i32,
    /// Data source tag; also decides the optional header fields.
    pub data_type: i32,
    /// Present iff `data_type` is in [`INTERVAL_DATA_TYPES`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<i32>,
    /// Present iff `data_type == 112`.
    #[serde(
        default,
        rename = "area_num",
        skip_serializing_if = "Option::is_none"
    )]
    pub area_num: Option<Vec<i32>>,
    /// Alignment mode.
    pub align_type: i32,
    /// Horizontal position.
    pub x: i32,
    /// Vertical position.
    pub y: i32,
}

impl LayerHeader {
    /// Header with no optional fields.
    pub fn new(draw_type: i32, data_type: i32, align_type: i32, x: i32, y: i32) -> Self {
        Self {
            draw_type,
            data_type,
            interval: None,
            area_num: None,
            align_type,
            x,
            y,
        }
    }

    /// Whether `data_type` requires an `interval`.
    pub fn expects_interval(&self) -> bool {
        INTERVAL_DATA_TYPES.contains(&self.data_type)
    }

    /// Whether `data_type` requires an `area_num` list.
    pub fn expects_area_num(&self) -> bool {
        self.data_type == AREA_NUM_DATA_TYPE
    }

    /// Check that the optional fields match `data_type`.
    pub fn validate(&self) -> ResResult<()> {
        if self.expects_interval() != self.interval.is_some() {
            return Err(ResError::structural(format!(
                "dataType {} {} an interval field",
                self.data_type,
                if self.expects_interval() {
                    "requires"
                } else {
                    "does not allow"
                }
            )));
        }
        if self.expects_area_num() != self.area_num.is_some() {
            return Err(ResError::structural(format!(
                "dataType {} {} an area_num list",
                self.data_type,
                if self.expects_area_num() {
                    "requires"
                } else {
                    "does not allow"
                }
            )));
        }
        Ok(())
    }
}

/// How an integer entry was classified.
///
/// This is decode provenance only. It is not written to disk and is ignored
/// by `LayerEntry` equality.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamShape {
    /// An explicit rule says this position holds an integer.
    #[default]
    Declared,
    /// The fallback rule read an integer because the bytes did not look like
    /// an image reference. The true shape is unknown.
    Inferred,
}

impl ParamShape {
    fn is_declared(&self) -> bool {
        *self == Self::Declared
    }
}

/// One element of a layer's entry array.
///
/// Two entries are equal when they encode to the same bytes; the `shape` of
/// an [`LayerEntry::IntParam`] is not compared.
#[derive(Clone, Debug, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerEntry {
    /// Pivot pair followed by a reference (hands and pointers).
    Pointer {
        /// Pivot x.
        x_off: i32,
        /// Pivot y.
        y_off: i32,
        /// Pool of the referenced image.
        pool: Pool,
        /// Referenced image.
        ref_id: RefId,
    },
    /// Null-padded 30-byte text.
    FixedString {
        /// Bytes up to the first NUL.
        text: String,
        /// Exact field bytes, kept only when `text` does not reproduce them.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raw: Option<Vec<u8>>,
    },
    /// Bare 32-bit integer.
    IntParam {
        /// Stored value.
        value: i32,
        /// Whether a rule declared this position an integer.
        #[serde(default, skip_serializing_if = "ParamShape::is_declared")]
        shape: ParamShape,
    },
    /// Reference into the image pool.
    ImageRef {
        /// Referenced image.
        ref_id: RefId,
    },
    /// Reference into the z-image pool.
    ZImageRef {
        /// Referenced image.
        ref_id: RefId,
    },
}

impl PartialEq for LayerEntry {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Pointer {
                    x_off,
                    y_off,
                    pool,
                    ref_id,
                },
                Self::Pointer {
                    x_off: x2,
                    y_off: y2,
                    pool: pool2,
                    ref_id: id2,
                },
            ) => x_off == x2 && y_off == y2 && pool == pool2 && ref_id == id2,
            (Self::FixedString { text, raw }, Self::FixedString { text: t2, raw: r2 }) => {
                text == t2 && raw == r2
            }
            (Self::IntParam { value, .. }, Self::IntParam { value: v2, .. }) => value == v2,
            (Self::ImageRef { ref_id }, Self::ImageRef { ref_id: id2 })
            | (Self::ZImageRef { ref_id }, Self::ZImageRef { ref_id: id2 }) => ref_id == id2,
            _ => false,
        }
    }
}

impl LayerEntry {
    /// Declared integer entry.
    pub fn int(value: i32) -> Self {
        Self::IntParam {
            value,
            shape: ParamShape::Declared,
        }
    }

    /// Text entry without preserved raw bytes.
    pub fn text(text: impl Into<String>) -> Self {
        Self::FixedString {
            text: text.into(),
            raw: None,
        }
    }

    /// Plain reference entry for `pool`.
    pub fn reference(pool: Pool, ref_id: RefId) -> Self {
        match pool {
            Pool::Image => Self::ImageRef { ref_id },
            Pool::ZImage => Self::ZImageRef { ref_id },
        }
    }

    /// `(pool, ref_id)` for entries that carry a reference.
    pub fn image(&self) -> Option<(Pool, RefId)> {
        match *self {
            Self::Pointer { pool, ref_id, .. } => Some((pool, ref_id)),
            Self::ImageRef { ref_id } => Some((Pool::Image, ref_id)),
            Self::ZImageRef { ref_id } => Some((Pool::ZImage, ref_id)),
            Self::FixedString { .. } | Self::IntParam { .. } => None,
        }
    }

    /// Bytes this entry occupies in layer data.
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Pointer { .. } => 16,
            Self::FixedString { .. } => TEXT_FIELD_LEN,
            Self::IntParam { .. } => 4,
            Self::ImageRef { .. } | Self::ZImageRef { .. } => 8,
        }
    }
}

/// A layer header and its `num` entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRecord {
    /// Header fields, flattened into the record in JSON.
    #[serde(flatten)]
    pub header: LayerHeader,
    /// Entries in on-disk order.
    pub entries: Vec<LayerEntry>,
}

impl LayerRecord {
    /// Value of the on-disk `num` field.
    pub fn num(&self) -> usize {
        self.entries.len()
    }

    /// References in entry order.
    pub fn images(&self) -> impl Iterator<Item = (Pool, RefId)> + '_ {
        self.entries.iter().filter_map(LayerEntry::image)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layer/record.rs"]
mod tests;
