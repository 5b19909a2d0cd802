use htn_synth::chunk::{chunk_stream, get_chunk, put_chunk, ChunkId, ChunkerParams, InMemoryChunkStore};
use htn_synth::codec::{chunk_size_at, decode_index, encode_index, IndexEntry, IndexHeader};
use htn_synth::error::CodecError;

fn default_header() -> IndexHeader {
    IndexHeader { feature_flags: 0, chunk_size_min: 16 * 1024, chunk_size_avg: 64 * 1024, chunk_size_max: 256 * 1024 }
}

#[test]
fn chunking_a_stream_and_indexing_it_reproduces_the_original_sizes() {
    let input: Vec<u8> = (0..500_000u32).map(|i| (i % 181) as u8).collect();
    let params = ChunkerParams::default();
    let chunks = chunk_stream(&input, &params);
    let store = InMemoryChunkStore::new();

    let mut cumulative = 0u64;
    let mut entries = Vec::new();
    for (offset, size) in &chunks {
        let bytes = &input[*offset as usize..(*offset + *size) as usize];
        let id = put_chunk(&store, bytes).unwrap();
        cumulative += size;
        entries.push(IndexEntry { end_offset: cumulative, chunk_id: id });
    }

    let header = default_header();
    let bytes = encode_index(&header, &entries);
    let (decoded_header, decoded_entries) = decode_index(&bytes).unwrap();
    assert_eq!(decoded_header, header);
    assert_eq!(decoded_entries, entries);

    for (i, (_, original_size)) in chunks.iter().enumerate() {
        assert_eq!(chunk_size_at(&decoded_entries, i), Some(*original_size));
    }
}

#[test]
fn every_indexed_chunk_id_resolves_through_the_store() {
    let input: Vec<u8> = (0..100_000u32).map(|i| (i % 97) as u8).collect();
    let params = ChunkerParams::default();
    let chunks = chunk_stream(&input, &params);
    let store = InMemoryChunkStore::new();

    let mut cumulative = 0u64;
    let mut entries = Vec::new();
    for (offset, size) in &chunks {
        let bytes = &input[*offset as usize..(*offset + *size) as usize];
        let id = put_chunk(&store, bytes).unwrap();
        cumulative += size;
        entries.push(IndexEntry { end_offset: cumulative, chunk_id: id });
    }

    let bytes = encode_index(&default_header(), &entries);
    let (_, decoded_entries) = decode_index(&bytes).unwrap();

    let mut start = 0u64;
    for entry in &decoded_entries {
        let expected = &input[start as usize..entry.end_offset as usize];
        assert_eq!(get_chunk(&store, entry.chunk_id).unwrap(), expected);
        start = entry.end_offset;
    }
}

#[test]
fn a_table_size_inconsistent_with_the_item_count_is_rejected() {
    let header = default_header();
    let entries = vec![IndexEntry { end_offset: 100, chunk_id: ChunkId::of(b"one") }];
    let mut bytes = encode_index(&header, &entries);
    // Corrupt the tail's echoed table_size field (second-to-last u64).
    let len = bytes.len();
    let table_size_pos = len - 16;
    let corrupted = u64::from_le_bytes(bytes[table_size_pos..table_size_pos + 8].try_into().unwrap()) + 40;
    bytes[table_size_pos..table_size_pos + 8].copy_from_slice(&corrupted.to_le_bytes());
    let err = decode_index(&bytes).unwrap_err();
    assert!(matches!(err, CodecError::Malformed { .. }));
}

#[test]
fn a_truncated_item_region_is_reported() {
    let header = default_header();
    let entries = vec![IndexEntry { end_offset: 100, chunk_id: ChunkId::of(b"one") }, IndexEntry { end_offset: 200, chunk_id: ChunkId::of(b"two") }];
    let mut bytes = encode_index(&header, &entries);
    bytes.truncate(bytes.len() - 20);
    let err = decode_index(&bytes).unwrap_err();
    assert!(matches!(err, CodecError::Malformed { .. } | CodecError::Truncated { .. }));
}

#[test]
fn an_empty_chunk_list_produces_a_valid_index_with_no_entries() {
    let header = default_header();
    let bytes = encode_index(&header, &[]);
    let (decoded_header, decoded_entries) = decode_index(&bytes).unwrap();
    assert_eq!(decoded_header, header);
    assert!(decoded_entries.is_empty());
}
