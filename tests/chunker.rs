use htn_synth::chunk::{chunk_stream, get_chunk, put_chunk, ChunkId, ChunkerParams, Compression, FsChunkStore, InMemoryChunkStore};
use htn_synth::testing::fixtures::{chunker_fixture_input, chunker_fixture_params};

#[test]
fn the_canonical_fixture_chunks_contiguously_and_within_bounds() {
    let input = chunker_fixture_input();
    let params = chunker_fixture_params();
    let chunks = chunk_stream(&input, &params);

    let mut cursor = 0u64;
    for (i, (offset, size)) in chunks.iter().enumerate() {
        assert_eq!(*offset, cursor);
        assert!(*size > 0);
        if i + 1 < chunks.len() {
            assert!(*size >= params.min_size, "chunk {i} smaller than min_size: {size}");
            assert!(*size <= params.max_size, "chunk {i} larger than max_size: {size}");
        }
        cursor += size;
    }
    assert_eq!(cursor, input.len() as u64);
}

#[test]
fn chunking_the_fixture_is_deterministic_across_runs() {
    let input = chunker_fixture_input();
    let params = chunker_fixture_params();
    assert_eq!(chunk_stream(&input, &params), chunk_stream(&input, &params));
}

#[test]
fn every_chunk_reassembles_byte_for_byte_into_the_original() {
    let input = chunker_fixture_input();
    let params = chunker_fixture_params();
    let chunks = chunk_stream(&input, &params);

    let mut reassembled = Vec::with_capacity(input.len());
    for (offset, size) in &chunks {
        reassembled.extend_from_slice(&input[*offset as usize..(*offset + *size) as usize]);
    }
    assert_eq!(reassembled, input);
}

#[test]
fn an_invalid_parameter_set_is_rejected() {
    assert!(ChunkerParams::new(1024, 512, 256).is_err());
}

#[test]
fn chunking_and_storing_a_stream_round_trips_through_an_in_memory_store() {
    let input = chunker_fixture_input();
    let params = chunker_fixture_params();
    let chunks = chunk_stream(&input, &params);
    let store = InMemoryChunkStore::new();

    let mut ids = Vec::new();
    for (offset, size) in &chunks {
        let id = put_chunk(&store, &input[*offset as usize..(*offset + *size) as usize]).unwrap();
        ids.push(id);
    }

    let mut reassembled = Vec::with_capacity(input.len());
    for id in &ids {
        reassembled.extend_from_slice(&get_chunk(&store, *id).unwrap());
    }
    assert_eq!(reassembled, input);
}

#[test]
fn republishing_an_identical_chunk_through_an_fs_store_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsChunkStore::open(dir.path(), Compression::None).unwrap();
    let bytes = b"identical payload bytes";
    let a = put_chunk(&store, bytes).unwrap();
    let b = put_chunk(&store, bytes).unwrap();
    assert_eq!(a, b);
    assert_eq!(get_chunk(&store, a).unwrap(), bytes);
}

#[test]
fn chunk_id_hex_round_trips_through_the_filesystem_layout() {
    let id = ChunkId::of(b"layout check");
    let path = id.relative_path();
    assert_eq!(path.extension().unwrap(), "cacnk");
    let hex = id.to_hex();
    assert!(path.to_string_lossy().contains(&hex[..4]));
}
