//! The chunk-index file format: a 48-byte header, a chunk table, and a tail
//! marker (§4.9).

use super::magic;
use crate::chunk::ChunkId;
use crate::error::CodecError;

const HEADER_SIZE: u64 = 48;
/// `marker(8) + type_tag(8) + tail(40)`, the chunk table's fixed overhead
/// around its `N` 40-byte items.
const TABLE_FIXED_OVERHEAD: u64 = 8 + 8 + 40;
const ITEM_SIZE: u64 = 40;

/// The 48-byte index header (§4.9).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexHeader {
    pub feature_flags: u64,
    pub chunk_size_min: u64,
    pub chunk_size_avg: u64,
    pub chunk_size_max: u64,
}

/// One chunk-table row: this chunk's cumulative end offset and its identity (§4.9).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    pub end_offset: u64,
    pub chunk_id: ChunkId,
}

fn read_u64(bytes: &[u8], offset: usize) -> Result<u64, CodecError> {
    bytes
        .get(offset..offset + 8)
        .map(|s| u64::from_le_bytes(s.try_into().expect("8-byte slice")))
        .ok_or(CodecError::Truncated { offset: offset as u64 })
}

/// Serialize `header` and `entries` to an index file's bytes (§4.9, §6).
#[must_use]
pub fn encode_index(header: &IndexHeader, entries: &[IndexEntry]) -> Vec<u8> {
    let mut out = Vec::with_capacity((HEADER_SIZE + TABLE_FIXED_OVERHEAD + ITEM_SIZE * entries.len() as u64) as usize);

    out.extend_from_slice(&HEADER_SIZE.to_le_bytes());
    out.extend_from_slice(&magic::INDEX.to_le_bytes());
    out.extend_from_slice(&header.feature_flags.to_le_bytes());
    out.extend_from_slice(&header.chunk_size_min.to_le_bytes());
    out.extend_from_slice(&header.chunk_size_avg.to_le_bytes());
    out.extend_from_slice(&header.chunk_size_max.to_le_bytes());

    out.extend_from_slice(&magic::TABLE_MARKER.to_le_bytes());
    out.extend_from_slice(&magic::TABLE.to_le_bytes());
    for entry in entries {
        out.extend_from_slice(&entry.end_offset.to_le_bytes());
        out.extend_from_slice(&entry.chunk_id.to_bytes());
    }

    let table_size = TABLE_FIXED_OVERHEAD + ITEM_SIZE * entries.len() as u64;
    out.extend_from_slice(&0u64.to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes());
    out.extend_from_slice(&HEADER_SIZE.to_le_bytes());
    out.extend_from_slice(&table_size.to_le_bytes());
    out.extend_from_slice(&magic::TABLE_TAIL_MARKER.to_le_bytes());

    out
}

/// Parse an index file's bytes into its header and chunk-table entries (§4.9, §6).
///
/// # Errors
///
/// Returns [`CodecError::Truncated`] if the buffer ends before a complete
/// header/table/tail is read, [`CodecError::BadMagic`] if a fixed constant
/// does not match, or [`CodecError::Malformed`] if the table's declared size
/// is inconsistent with the remaining buffer.
pub fn decode_index(bytes: &[u8]) -> Result<(IndexHeader, Vec<IndexEntry>), CodecError> {
    if bytes.len() < HEADER_SIZE as usize {
        return Err(CodecError::Truncated { offset: bytes.len() as u64 });
    }
    let size_field = read_u64(bytes, 0)?;
    if size_field != HEADER_SIZE {
        return Err(CodecError::Malformed {
            offset: 0,
            reason: format!("header size field {size_field} != 48"),
        });
    }
    let type_tag = read_u64(bytes, 8)?;
    if type_tag != magic::INDEX {
        return Err(CodecError::BadMagic { offset: 8, expected: magic::INDEX, found: type_tag });
    }
    let header = IndexHeader {
        feature_flags: read_u64(bytes, 16)?,
        chunk_size_min: read_u64(bytes, 24)?,
        chunk_size_avg: read_u64(bytes, 32)?,
        chunk_size_max: read_u64(bytes, 40)?,
    };

    let mut offset = HEADER_SIZE as usize;
    if offset + 16 > bytes.len() {
        return Err(CodecError::Truncated { offset: offset as u64 });
    }
    let marker = read_u64(bytes, offset)?;
    if marker != magic::TABLE_MARKER {
        return Err(CodecError::BadMagic { offset: offset as u64, expected: magic::TABLE_MARKER, found: marker });
    }
    let table_type = read_u64(bytes, offset + 8)?;
    if table_type != magic::TABLE {
        return Err(CodecError::BadMagic {
            offset: (offset + 8) as u64,
            expected: magic::TABLE,
            found: table_type,
        });
    }
    offset += 16;

    if bytes.len() < offset + 40 {
        return Err(CodecError::Truncated { offset: offset as u64 });
    }
    let remaining_for_items = bytes.len() - offset - 40;
    if remaining_for_items % ITEM_SIZE as usize != 0 {
        return Err(CodecError::Malformed {
            offset: offset as u64,
            reason: format!("item region length {remaining_for_items} not a multiple of 40"),
        });
    }
    let item_count = remaining_for_items / ITEM_SIZE as usize;

    let mut entries = Vec::with_capacity(item_count);
    for i in 0..item_count {
        let item_start = offset + i * ITEM_SIZE as usize;
        let end_offset = read_u64(bytes, item_start)?;
        let mut id_bytes = [0u8; 32];
        id_bytes.copy_from_slice(&bytes[item_start + 8..item_start + 40]);
        entries.push(IndexEntry { end_offset, chunk_id: ChunkId::from_bytes(id_bytes) });
    }
    offset += item_count * ITEM_SIZE as usize;

    let tail_zero1 = read_u64(bytes, offset)?;
    let tail_zero2 = read_u64(bytes, offset + 8)?;
    let tail_header_size = read_u64(bytes, offset + 16)?;
    let tail_table_size = read_u64(bytes, offset + 24)?;
    let tail_marker = read_u64(bytes, offset + 32)?;
    if tail_zero1 != 0 || tail_zero2 != 0 {
        return Err(CodecError::Malformed {
            offset: offset as u64,
            reason: "tail reserved words are not zero".to_string(),
        });
    }
    if tail_header_size != HEADER_SIZE {
        return Err(CodecError::Malformed {
            offset: offset as u64,
            reason: format!("tail header-size echo {tail_header_size} != 48"),
        });
    }
    let expected_table_size = TABLE_FIXED_OVERHEAD + ITEM_SIZE * item_count as u64;
    if tail_table_size != expected_table_size {
        return Err(CodecError::Malformed {
            offset: offset as u64,
            reason: format!("tail table_size {tail_table_size} != computed {expected_table_size}"),
        });
    }
    if tail_marker != magic::TABLE_TAIL_MARKER {
        return Err(CodecError::BadMagic {
            offset: (offset + 32) as u64,
            expected: magic::TABLE_TAIL_MARKER,
            found: tail_marker,
        });
    }

    Ok((header, entries))
}

/// The n-th chunk's size, given the table's cumulative end offsets
/// (`item[-1].offset` is implicitly 0) (§4.9).
#[must_use]
pub fn chunk_size_at(entries: &[IndexEntry], n: usize) -> Option<u64> {
    let end = entries.get(n)?.end_offset;
    let start = if n == 0 { 0 } else { entries.get(n - 1)?.end_offset };
    Some(end - start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entries() -> Vec<IndexEntry> {
        vec![
            IndexEntry { end_offset: 100, chunk_id: ChunkId::of(b"a") },
            IndexEntry { end_offset: 260, chunk_id: ChunkId::of(b"b") },
            IndexEntry { end_offset: 300, chunk_id: ChunkId::of(b"c") },
        ]
    }

    #[test]
    fn roundtrips_header_and_entries() {
        let header = IndexHeader {
            feature_flags: 0,
            chunk_size_min: 16 * 1024,
            chunk_size_avg: 64 * 1024,
            chunk_size_max: 256 * 1024,
        };
        let entries = sample_entries();
        let bytes = encode_index(&header, &entries);
        let (decoded_header, decoded_entries) = decode_index(&bytes).unwrap();
        assert_eq!(decoded_header, header);
        assert_eq!(decoded_entries, entries);
        assert_eq!(encode_index(&decoded_header, &decoded_entries), bytes);
    }

    #[test]
    fn empty_table_roundtrips() {
        let header = IndexHeader { feature_flags: 0, chunk_size_min: 1, chunk_size_avg: 2, chunk_size_max: 3 };
        let bytes = encode_index(&header, &[]);
        let (decoded_header, decoded_entries) = decode_index(&bytes).unwrap();
        assert_eq!(decoded_header, header);
        assert!(decoded_entries.is_empty());
    }

    #[test]
    fn chunk_sizes_are_derived_from_cumulative_offsets() {
        let entries = sample_entries();
        assert_eq!(chunk_size_at(&entries, 0), Some(100));
        assert_eq!(chunk_size_at(&entries, 1), Some(160));
        assert_eq!(chunk_size_at(&entries, 2), Some(40));
    }

    #[test]
    fn bad_index_magic_is_reported() {
        let header = IndexHeader { feature_flags: 0, chunk_size_min: 1, chunk_size_avg: 2, chunk_size_max: 3 };
        let mut bytes = encode_index(&header, &[]);
        bytes[8] = bytes[8].wrapping_add(1);
        assert!(matches!(decode_index(&bytes), Err(CodecError::BadMagic { .. })));
    }

    #[test]
    fn truncated_header_is_reported() {
        assert!(matches!(decode_index(&[0u8; 10]), Err(CodecError::Truncated { .. })));
    }
}
