//! The archive and index binary codecs (§4.8, §4.9).

mod archive;
mod index;
mod magic;

pub use archive::{decode_archive, encode_archive, ArchiveElement, Entry as ArchiveEntry, GoodbyeItem};
pub use index::{chunk_size_at, decode_index, encode_index, IndexEntry, IndexHeader};
