use serde::{Deserialize, Serialize};

use crate::foundation::error::{ResError, ResResult};

/// Known resolution classes as `(width, height, prefix)`.
///
/// `320x384` and `320x385` share a prefix; lookups by prefix return the first.
pub const RESOLUTION_PREFIXES: [(u32, u32, u8); 10] = [
    (454, 454, 0x0F),
    (400, 400, 0x0E),
    (466, 466, 0x0D),
    (390, 390, 0x0C),
    (410, 502, 0x0B),
    (320, 384, 0x0A),
    (320, 385, 0x0A),
    (368, 448, 0x09),
    (390, 450, 0x08),
    (360, 360, 0x07),
];

/// Range of base ids accepted for generated (custom) watchfaces.
pub const GENERATED_BASE_IDS: std::ops::RangeInclusive<u32> = 50000..=65535;

/// Unpacked view of the 32-bit clock identifier.
///
/// Layout: bit 31 `internal`, bits 24..=30 `reserved` (kept verbatim),
/// bits 16..=23 `resolution_prefix`, bits 0..=15 `base_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClockId {
    /// Firmware-internal face (bit 31) as opposed to a custom one.
    pub internal: bool,
    /// Bits 24..=30, unused in observed data.
    #[serde(default)]
    pub reserved: u8,
    /// Resolution class.
    pub resolution_prefix: u8,
    /// Face number.
    pub base_id: u16,
}

impl ClockId {
    /// Split a raw identifier into its fields.
    pub fn decode(id: u32) -> Self {
        Self {
            internal: (id >> 31) & 1 != 0,
            reserved: ((id >> 24) & 0x7F) as u8,
            resolution_prefix: ((id >> 16) & 0xFF) as u8,
            base_id: (id & 0xFFFF) as u16,
        }
    }

    /// Recompose the raw identifier.
    pub fn encode(self) -> u32 {
        (u32::from(self.internal) << 31)
            | (u32::from(self.reserved & 0x7F) << 24)
            | (u32::from(self.resolution_prefix) << 16)
            | u32::from(self.base_id)
    }

    /// Pixel resolution for the prefix, or `None` for prefixes outside the table.
    pub fn resolution(self) -> Option<(u32, u32)> {
        RESOLUTION_PREFIXES
            .iter()
            .find(|(_, _, p)| *p == self.resolution_prefix)
            .map(|(w, h, _)| (*w, *h))
    }

    /// Custom face id for a known resolution.
    pub fn for_resolution(width: u32, height: u32, base_id: u16) -> Option<Self> {
        RESOLUTION_PREFIXES
            .iter()
            .find(|(w, h, _)| *w == width && *h == height)
            .map(|(_, _, prefix)| Self {
                internal: false,
                reserved: 0,
                resolution_prefix: *prefix,
                base_id,
            })
    }

    /// Id for a newly generated face; the base id must lie in [`GENERATED_BASE_IDS`].
    pub fn generated(base_id: u32, width: u32, height: u32) -> ResResult<Self> {
        if !GENERATED_BASE_IDS.contains(&base_id) {
            return Err(ResError::structural(format!(
                "clock base id {base_id} outside {}..={}",
                GENERATED_BASE_IDS.start(),
                GENERATED_BASE_IDS.end()
            )));
        }
        Self::for_resolution(width, height, base_id as u16).ok_or_else(|| {
            ResError::structural(format!("no clock id prefix for resolution {width}x{height}"))
        })
    }
}

impl From<u32> for ClockId {
    fn from(id: u32) -> Self {
        Self::decode(id)
    }
}

impl From<ClockId> for u32 {
    fn from(id: ClockId) -> Self {
        id.encode()
    }
}

impl std::fmt::Display for ClockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(0x{:08X})", self.base_id, self.encode())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/format/clock_id.rs"]
mod tests;
