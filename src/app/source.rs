/// Text files on the local file system.
pub mod fs;

/// The Sefaria texts API.
pub mod sefaria;
