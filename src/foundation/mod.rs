/// Big-endian byte cursor and writer.
pub(crate) mod bytes;
/// Non-fatal decode diagnostics.
pub mod diag;
/// Error taxonomy.
pub mod error;
