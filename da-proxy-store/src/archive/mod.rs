pub mod fs;

pub use fs::{FsArchive, FsArchiveError, FsArchiveSettings};
