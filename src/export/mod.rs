/// Rebuild and encode a container from an unpacked directory.
pub mod pack;
/// Write a decoded container as an unpacked directory.
pub mod unpack;
