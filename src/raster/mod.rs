/// Referenced image spans: chunk or bare blob.
pub mod blob;
/// 16-byte chunk header and payload codec.
pub mod chunk;
/// Pixel format transforms to and from RGBA8.
pub mod pixel;
/// Magic-byte detection for bare image blobs.
pub mod sniff;
