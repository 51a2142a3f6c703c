/// Layer record decode and encode.
pub(crate) mod codec;
/// Layer headers, entries and records.
pub mod record;
/// Ordered entry decision list.
pub mod rules;
