//! Archives: building new ones, reading and mutating submitted ones.

mod builder;
pub use builder::ArchiveBuilder;

mod read;
pub use read::ArchiveReader;

mod mutate;
pub use mutate::ArchiveMutator;
