/// Clock identifier bit packing and resolution table.
pub mod clock_id;
/// Fixed container header and magic tags.
pub mod header;
/// Section byte ranges derived from the header.
pub mod layout;
