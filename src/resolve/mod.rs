/// Pool classification, address computation and the reference table.
pub mod refs;
/// Per-file decode context and encode-side pool assembly.
pub mod session;
