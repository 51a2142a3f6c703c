//! watchres reads and writes V3 smartwatch watchface resource containers (`.res`).
//!
//! A container holds a 32-byte header, a thumbnail, two image pools and a run of
//! layer records. [`decode`] turns the bytes into a location-independent
//! [`ResourceModel`] plus a [`DecodeReport`]; [`encode`] lays the model out again.
//!
//! - Image spans are deduplicated by their stored `(offset, length)` pair and
//!   referenced from layers by [`RefId`].
//! - Layer entries are classified by an ordered rule table
//!   ([`layer::rules::RULES`]); the last rule is a heuristic and its doubtful
//!   calls are reported as [`Diagnostic`]s rather than errors.
//! - [`export`] writes and reads the unpacked directory form, and
//!   [`container::batch`] unpacks many files in parallel.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Decode/encode entry points, the model, options and batch processing.
pub mod container;
/// Unpacked directory layout.
pub mod export;
/// Clock id, header and section layout.
pub mod format;
/// Layer records and the entry rule table.
pub mod layer;
/// Image chunks, pixel formats and raw blobs.
pub mod raster;
/// Pool classification and reference deduplication.
pub mod resolve;

pub use crate::container::codec::{decode, encode};
pub use crate::container::model::{DecodeReport, Decoded, ResourceModel};
pub use crate::container::opts::{BatchOpts, DecodeOpts, EncodeOpts, Plausibility};
pub use crate::format::clock_id::ClockId;
pub use crate::format::header::{Magic, ResourceHeader};
pub use crate::format::layout::SectionLayout;
pub use crate::foundation::diag::{Diagnostic, DiagnosticKind, Diagnostics};
pub use crate::foundation::error::{ResError, ResResult};
pub use crate::layer::record::{LayerEntry, LayerHeader, LayerRecord, ParamShape};
pub use crate::raster::blob::ImageBlob;
pub use crate::raster::chunk::{ChunkHeader, ImageChunk, ImgType};
pub use crate::raster::sniff::RawFormat;
pub use crate::resolve::refs::{ImageReference, Pool, RefId, RefTable};
pub use crate::resolve::session::PooledImage;
