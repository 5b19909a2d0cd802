//! Content-defined chunking and content-addressed storage (§4.6, §4.7).

mod buzhash;
mod chunker;
mod store;
mod table;

pub use chunker::{chunk_stream, ChunkerParams};
pub use store::{get_chunk, put_chunk, ChunkId, ChunkStore, Compression, FsChunkStore, InMemoryChunkStore};
