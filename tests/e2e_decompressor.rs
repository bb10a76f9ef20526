//! Chunking transparency tests.
//!
//! Splitting the input at arbitrary points, and bounding each call's output,
//! must never change the decoded stream.

use std::time::Duration;

use handoff::engine::{rle, Passthrough, RunLength};
use handoff::{
    ChunkStatus, Config, DecodeEngine, Decompressor, OutputBuffer, Session, SessionConfig,
};
use proptest::collection::vec;
use proptest::prelude::*;

fn fast_config() -> SessionConfig {
    SessionConfig::default().with_resume_interval(Duration::from_millis(1))
}

/// Drive a raw session, feeding `input` in pieces sized by `splits`.
fn decode_in_pieces<E: DecodeEngine>(
    engine: E,
    input: &[u8],
    splits: &[usize],
    quota: usize,
    capacity: usize,
) -> (Vec<u8>, bool) {
    let mut session = Session::with_config(engine, fast_config()).unwrap();
    let mut decoded = Vec::new();
    let mut offset = 0;
    let mut sizes = splits.iter().cycle();

    while offset < input.len() {
        let size = (*sizes.next().unwrap()).min(input.len() - offset);
        session.feed(&input[offset..offset + size]);
        offset += size;

        loop {
            let mut out = OutputBuffer::with_capacity(capacity);
            let progress = session.decode_chunk(&mut out, quota).unwrap();
            decoded.extend_from_slice(out.filled());

            match progress.status {
                ChunkStatus::Ok => continue,
                ChunkStatus::NeedMoreInput => break,
                ChunkStatus::EndOfStream => return (decoded, true),
            }
        }
    }

    (decoded, false)
}

fn runs() -> impl Strategy<Value = Vec<u8>> {
    vec(prop::sample::select(vec![b'a', b'b', b'c', 0u8]), 0..200)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_rle_chunking_is_transparent(
        data in runs(),
        splits in vec(1usize..12, 1..16),
        quota in 1usize..10,
        capacity in 1usize..10,
    ) {
        let encoded = rle::encode(&data);
        let (decoded, ended) = decode_in_pieces(RunLength::new(), &encoded, &splits, quota, capacity);

        prop_assert!(ended);
        prop_assert_eq!(decoded, data);
    }

    #[test]
    fn prop_passthrough_chunking_is_transparent(
        data in vec(any::<u8>(), 1..120),
        splits in vec(1usize..9, 1..8),
        quota in 1usize..16,
    ) {
        // end of stream may go unreported: a round that starts on exhausted
        // input ends before asking the engine
        let engine = Passthrough::with_length(data.len() as u64);
        let (decoded, _) = decode_in_pieces(engine, &data, &splits, quota, 16);

        prop_assert_eq!(decoded, data);
    }

    #[test]
    fn prop_decompressor_chunking_is_transparent(
        data in runs(),
        splits in vec(1usize..20, 1..8),
        chunk_size in 1usize..32,
    ) {
        let mut config = Config::default();
        config.session = fast_config();
        config.decompressor.chunk_size = chunk_size;
        let mut dec = Decompressor::with_config(RunLength::new(), &config).unwrap();

        let encoded = rle::encode(&data);
        let mut decoded = Vec::new();
        let mut offset = 0;
        let mut sizes = splits.iter().cycle();
        while offset < encoded.len() && !dec.eof() {
            let size = (*sizes.next().unwrap()).min(encoded.len() - offset);
            decoded.extend_from_slice(&dec.decompress(&encoded[offset..offset + size], None).unwrap());
            offset += size;
        }

        prop_assert!(dec.eof());
        prop_assert_eq!(decoded, data);
    }
}

/// Test max_length bounded reads drain the whole stream
#[test]
fn test_bounded_reads_drain_stream() {
    let data: Vec<u8> = b"the quick brown fox".iter().flat_map(|&b| [b; 3]).collect();
    let encoded = rle::encode(&data);

    let mut dec = Decompressor::new(RunLength::new());
    let mut decoded = dec.decompress(&encoded, Some(7)).unwrap().to_vec();
    while !dec.eof() {
        let piece = dec.decompress(&[], Some(7)).unwrap();
        assert!(piece.len() <= 7);
        decoded.extend_from_slice(&piece);
    }

    assert_eq!(decoded, data);
    let stats = dec.close();
    assert_eq!(stats.bytes_out, data.len() as u64);
    assert_eq!(stats.bytes_in, encoded.len() as u64);
}

/// Test a truncated stream leaves the decompressor waiting for input
#[test]
fn test_truncated_stream_needs_input() {
    let encoded = rle::encode(b"aaaa");
    let mut dec = Decompressor::new(RunLength::new());

    let out = dec.decompress(&encoded[..encoded.len() - 1], None).unwrap();
    assert_eq!(&out[..], b"aaaa");
    assert!(dec.needs_input());
    assert!(!dec.eof());

    let out = dec.decompress(&encoded[encoded.len() - 1..], None).unwrap();
    assert!(out.is_empty());
    assert!(dec.eof());
}
