//! In-memory build context archives.
//!
//! [`build_context`] turns a recipe into the request body for a build:
//! the recipe under its reserved name plus placeholder files for what the
//! recipe copies in, serialized as an uncompressed ustar stream.

mod context;
mod tar;

pub use context::{build_context, context_entries, copy_sources, synthesize_entry, RECIPE_FILE_NAME};
pub use tar::{
    archive_len, padded_len, ArchiveEntry, TarWriter, BLOCK_SIZE, NAME_FIELD_LEN, TRAILER_SIZE,
};
