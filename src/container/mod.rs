/// Parallel batch unpacking of many containers.
pub mod batch;
/// Top-level decode and encode.
pub mod codec;
/// Resource model and decode report.
pub mod model;
/// Decode, encode and batch options.
pub mod opts;
