//! Filesystem access confined to configured roots.
//!
//! `path_resolver` turns caller-supplied paths into files that are guaranteed
//! to live under a root. `file_library` indexes the videos of the library
//! tree for listings.

pub mod file_library;
pub mod path_resolver;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;

pub use file_library::{LibraryEntry, LibraryIndex};
pub use path_resolver::{PathResolver, ResolvedPath, ResourceLocation};
