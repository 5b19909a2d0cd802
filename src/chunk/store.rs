//! Content-addressed chunk storage: identity, optional compression, and two
//! `identity -> bytes` backends (§4.7).
//!
//! The filesystem backend mirrors the predecessor's own I/O style
//! (`anyhow::Context`-free, plain `std::fs`, `tempfile` for atomic
//! publication) adapted from its `checkpoint.rs` save path, which writes to a
//! temp file and renames into place so a reader never observes a partial
//! write.

use crate::error::ChunkError;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The ecosystem-standard chunk object extension (casync's `.cacnk`).
const CHUNK_EXTENSION: &str = "cacnk";

/// A chunk's content address: the SHA-256 hash of its uncompressed bytes (§4.7).
///
/// The ecosystem this format targets computes chunk identity with plain
/// SHA-256 (not a truncated SHA-512 variant); this could not be checked
/// against a live reference implementation in this environment (no network
/// access, and no casync/desync source present in the retrieval pack used to
/// build this crate). If cross-ecosystem identity compatibility is load-
/// bearing, confirm this against an actual casync/desync installation before
/// depending on it -- see DESIGN.md's Open Questions for the same caveat
/// given to `chunk/table.rs`'s buzhash constant table.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId([u8; 32]);

impl ChunkId {
    /// Compute the identity of `bytes` (uncompressed).
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Self(out)
    }

    /// The lowercase hex encoding of the identity (64 characters).
    #[must_use]
    pub fn to_hex(self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// The raw 32-byte digest.
    #[must_use]
    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }

    /// Wrap a raw 32-byte digest as an identity.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-character lowercase hex identity.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 {
            return None;
        }
        let mut out = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let byte = std::str::from_utf8(chunk).ok()?;
            out[i] = u8::from_str_radix(byte, 16).ok()?;
        }
        Some(Self(out))
    }

    /// `<first4hex>/<full64hex>.cacnk`, the filesystem-backed layout (§4.7, §6).
    #[must_use]
    pub fn relative_path(self) -> PathBuf {
        let hex = self.to_hex();
        PathBuf::from(&hex[..4]).join(format!("{hex}.{CHUNK_EXTENSION}"))
    }
}

impl fmt::Debug for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkId({})", self.to_hex())
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Whether chunk objects are stored raw or zstd-compressed (§6's closed
/// compression knob `{none, zstd}`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Compression {
    #[default]
    None,
    #[cfg(feature = "compression-zstd")]
    Zstd,
}

impl Compression {
    fn encode(self, bytes: &[u8]) -> Result<Vec<u8>, ChunkError> {
        match self {
            Compression::None => Ok(bytes.to_vec()),
            #[cfg(feature = "compression-zstd")]
            Compression::Zstd => zstd::stream::encode_all(bytes, 0).map_err(ChunkError::Io),
        }
    }

    fn decode(self, bytes: &[u8]) -> Result<Vec<u8>, ChunkError> {
        match self {
            Compression::None => Ok(bytes.to_vec()),
            #[cfg(feature = "compression-zstd")]
            Compression::Zstd => zstd::stream::decode_all(bytes).map_err(ChunkError::Io),
        }
    }
}

/// A content-addressed `identity -> bytes` mapping (§4.7).
///
/// Any mapping satisfying this contract is a valid store; the filesystem is
/// not special-cased beyond [`FsChunkStore`]'s own implementation.
pub trait ChunkStore: Send + Sync {
    /// Publish `bytes`, returning its identity. Idempotent: re-publishing the
    /// same bytes is a no-op past the first write (§8 property 7).
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::Io`] if the underlying storage write fails.
    fn put(&self, bytes: &[u8]) -> Result<ChunkId, ChunkError>;

    /// Retrieve the uncompressed bytes for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::NotFound`] if no object exists for `id`, or
    /// [`ChunkError::Corrupt`] if the stored bytes no longer hash to `id`.
    fn get(&self, id: ChunkId) -> Result<Vec<u8>, ChunkError>;

    /// Whether an object for `id` exists, without reading it.
    fn contains(&self, id: ChunkId) -> bool;
}

/// Convenience free function matching the language-neutral `put_chunk` shape (§6).
///
/// # Errors
///
/// See [`ChunkStore::put`].
pub fn put_chunk(store: &dyn ChunkStore, bytes: &[u8]) -> Result<ChunkId, ChunkError> {
    store.put(bytes)
}

/// Convenience free function matching the language-neutral `get_chunk` shape (§6).
///
/// # Errors
///
/// See [`ChunkStore::get`].
pub fn get_chunk(store: &dyn ChunkStore, id: ChunkId) -> Result<Vec<u8>, ChunkError> {
    store.get(id)
}

/// An in-memory store, used by tests and by callers that don't need
/// durability (e.g. a scratch pass before publishing to a real store).
#[derive(Default)]
pub struct InMemoryChunkStore {
    objects: Mutex<HashMap<ChunkId, Vec<u8>>>,
}

impl InMemoryChunkStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChunkStore for InMemoryChunkStore {
    fn put(&self, bytes: &[u8]) -> Result<ChunkId, ChunkError> {
        let id = ChunkId::of(bytes);
        self.objects.lock().unwrap().entry(id).or_insert_with(|| bytes.to_vec());
        Ok(id)
    }

    fn get(&self, id: ChunkId) -> Result<Vec<u8>, ChunkError> {
        let objects = self.objects.lock().unwrap();
        let bytes = objects.get(&id).cloned().ok_or(ChunkError::NotFound)?;
        if ChunkId::of(&bytes) != id {
            return Err(ChunkError::Corrupt);
        }
        Ok(bytes)
    }

    fn contains(&self, id: ChunkId) -> bool {
        self.objects.lock().unwrap().contains_key(&id)
    }
}

/// A filesystem-backed store rooted at a directory, laid out
/// `<root>/<first4hex>/<full64hex>.cacnk` (§4.7, §6).
pub struct FsChunkStore {
    root: PathBuf,
    compression: Compression,
}

impl FsChunkStore {
    /// Open (creating if absent) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::Io`] if `root` cannot be created.
    pub fn open(root: impl Into<PathBuf>, compression: Compression) -> Result<Self, ChunkError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(ChunkError::Io)?;
        Ok(Self { root, compression })
    }

    fn object_path(&self, id: ChunkId) -> PathBuf {
        self.root.join(id.relative_path())
    }
}

impl ChunkStore for FsChunkStore {
    fn put(&self, bytes: &[u8]) -> Result<ChunkId, ChunkError> {
        let id = ChunkId::of(bytes);
        let path = self.object_path(id);
        if path.exists() {
            return Ok(id);
        }
        let dir = path.parent().expect("object path always has a parent");
        fs::create_dir_all(dir).map_err(ChunkError::Io)?;

        let encoded = self.compression.encode(bytes)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(ChunkError::Io)?;
        use std::io::Write;
        tmp.write_all(&encoded).map_err(ChunkError::Io)?;
        tmp.flush().map_err(ChunkError::Io)?;
        tmp.persist(&path).map_err(|e| ChunkError::Io(e.error))?;
        Ok(id)
    }

    fn get(&self, id: ChunkId) -> Result<Vec<u8>, ChunkError> {
        let path = self.object_path(id);
        let raw = fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ChunkError::NotFound
            } else {
                ChunkError::Io(e)
            }
        })?;
        let bytes = self.compression.decode(&raw)?;
        if ChunkId::of(&bytes) != id {
            return Err(ChunkError::Corrupt);
        }
        Ok(bytes)
    }

    fn contains(&self, id: ChunkId) -> bool {
        self.object_path(id).exists()
    }
}
