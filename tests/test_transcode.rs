
use fixtures::*;

use cesu8conv::{
    Direction, NullSink, Resolution, SurrogateHalf, TranscodeSettings, Warning, transcode,
    transcode_bytes,
};
use pretty_assertions::assert_eq;
use quickcheck::QuickCheck;
use std::io::{self, Read};

/// Hands out the data in the given read sizes, cycling through them.
struct ChunkedReader<'a> {
    data: &'a [u8],
    sizes: Vec<usize>,
    next: usize,
}

impl<'a> ChunkedReader<'a> {
    fn new(data: &'a [u8], sizes: Vec<usize>) -> Self {
        let sizes = if sizes.is_empty() { vec![1] } else { sizes };
        ChunkedReader {
            data,
            sizes,
            next: 0,
        }
    }
}

impl Read for ChunkedReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let size = 1 + self.sizes[self.next % self.sizes.len()] % 64;
        self.next += 1;
        let n = size.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

fn contract() -> TranscodeSettings {
    TranscodeSettings::new().direction(Direction::Contract)
}

fn expand() -> TranscodeSettings {
    TranscodeSettings::new().direction(Direction::Expand)
}

fn convert(input: &[u8], settings: &TranscodeSettings) -> (Vec<u8>, Vec<Warning>) {
    let result = transcode_bytes(input, settings).expect("in-memory transcoding cannot fail");
    (result.output, result.warnings)
}

/// Interesting byte patterns, glued together by the property tests.
const FRAGMENTS: &[&[u8]] = &[
    b"a",
    b"xyz",
    &[0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80], // surrogate pair
    &[0xED, 0xA0, 0xBD],                   // high half
    &[0xED, 0xB8, 0x80],                   // low half
    &[0xED, 0x95, 0x9C],                   // U+D55C
    &[0xED],
    &[0xF0, 0x9F, 0x98, 0x80], // U+1F600
    &[0xF4, 0x8F, 0xBF, 0xBF], // U+10FFFF
    &[0xF0, 0x80, 0x80, 0x80], // overlong
    &[0xF4, 0x90, 0x80, 0x80], // above U+10FFFF
    &[0xF0, 0x41],
    &[0x80],
    "é日".as_bytes(),
];

fn glue(picks: &[u8]) -> Vec<u8> {
    picks
        .iter()
        .flat_map(|&p| FRAGMENTS[p as usize % FRAGMENTS.len()].iter().copied())
        .collect()
}

fn tests() -> u64 {
    if cfg!(debug_assertions) { 300 } else { 3_000 }
}

#[test]
fn test_converts_mixed_sample_with_any_buffer_size() {
    ensure_env_logger_initialized();
    let cesu8 = read_sample(mixed_cesu8());
    let utf8 = read_sample(mixed_utf8());

    for capacity in [16, 17, 31, 100, 4096, 1 << 16] {
        let (contracted, warnings) = convert(&cesu8, &contract().buffer_capacity(capacity));
        assert!(contracted == utf8, "contracting with a {capacity} byte buffer");
        assert!(warnings.is_empty());

        let (expanded, warnings) = convert(&utf8, &expand().buffer_capacity(capacity));
        assert!(expanded == cesu8, "expanding with a {capacity} byte buffer");
        assert!(warnings.is_empty());
    }
}

#[test]
fn test_streams_from_file() {
    let file = std::fs::File::open(grinning_cesu8()).unwrap();
    let mut output = Vec::new();
    let summary = transcode(file, &mut output, &contract(), NullSink).unwrap();

    assert_eq!(output, read_sample(grinning_utf8()));
    assert_eq!(summary.bytes_read, 16);
    assert_eq!(summary.bytes_written, 14);
    assert_eq!(summary.sequences_converted, 1);
}

#[test]
fn test_pair_split_between_two_reads() {
    let input = [0x41, 0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80, 0x42];
    // Reads of 3 then 5 bytes: `41 ED A0` and `BD ED B8 80 42`.
    let reader = ChunkedReader::new(&input, vec![2, 4]);
    let mut output = Vec::new();
    transcode(reader, &mut output, &contract(), NullSink).unwrap();

    assert_eq!(output, [0x41, 0xF0, 0x9F, 0x98, 0x80, 0x42]);
}

#[test]
fn test_invalid_four_byte_continuations_survive_a_buffer_boundary() {
    // The overlong sequence is cut by the end of the first 16 byte chunk.
    let mut input = vec![b'.'; 14];
    input.extend_from_slice(&[0xF0, 0x80, 0x80, 0x80]);
    input.extend_from_slice(b"end");

    let (output, warnings) = convert(&input, &expand().buffer_capacity(16));
    assert_eq!(output, input);
    assert_eq!(
        warnings,
        vec![Warning::InvalidCodePoint {
            offset: 14,
            code_point: 0,
            resolution: Resolution::LeftUnchanged,
        }]
    );
}

#[test]
fn test_fix_substitutes_each_unpaired_half_once() {
    let input = read_sample(unpaired_high_cesu8());
    let (output, warnings) = convert(&input, &contract().fix(true));
    assert_eq!(output, b"A?B");
    assert_eq!(
        warnings,
        vec![Warning::UnpairedSurrogate {
            offset: 1,
            half: SurrogateHalf::High,
            code_unit: 0xD83D,
            resolution: Resolution::Replaced,
        }]
    );
}

#[test]
fn test_expanding_leaves_surrogates_alone() {
    // Only four-byte sequences are rewritten when expanding.
    let input = read_sample(unpaired_high_cesu8());
    let (output, warnings) = convert(&input, &expand().fix(true));
    assert_eq!(output, input);
    assert!(warnings.is_empty());
}

#[test]
fn test_inputs_without_lead_bytes_pass_through() {
    fn prop(mut bytes: Vec<u8>, capacity: u8) -> bool {
        let capacity = 16 + capacity as usize;

        bytes.retain(|&b| b != 0xED);
        let (contracted, warnings) = convert(&bytes, &contract().buffer_capacity(capacity));
        if contracted != bytes || !warnings.is_empty() {
            return false;
        }

        bytes.retain(|&b| b & 0xF8 != 0xF0);
        let (expanded, warnings) = convert(&bytes, &expand().buffer_capacity(capacity));
        expanded == bytes && warnings.is_empty()
    }

    QuickCheck::new()
        .tests(tests())
        .quickcheck(prop as fn(Vec<u8>, u8) -> bool);
}

#[test]
fn test_round_trips_well_formed_text() {
    fn prop(text: String) -> bool {
        let cesu8 = cesu8_of(&text);

        let (utf8, warnings) = convert(&cesu8, &contract());
        if utf8 != text.as_bytes() || !warnings.is_empty() {
            return false;
        }

        let (back, warnings) = convert(&utf8, &expand());
        back == cesu8 && warnings.is_empty()
    }

    QuickCheck::new()
        .tests(tests())
        .quickcheck(prop as fn(String) -> bool);
}

#[test]
fn test_supplementary_text_round_trips() {
    let text = "\u{10000}\u{1F600}a\u{10FFFF}\u{10348}\u{20BB7}";
    let cesu8 = cesu8_of(text);
    assert_eq!(cesu8.len(), 6 * 5 + 1);

    let (utf8, _) = convert(&cesu8, &contract());
    assert_eq!(utf8, text.as_bytes());
    let (back, _) = convert(&utf8, &expand());
    assert_eq!(back, cesu8);
}

#[test]
fn test_output_does_not_depend_on_chunking() {
    fn prop(picks: Vec<u8>, splits: Vec<usize>, capacity: u8, expanding: bool, fix: bool) -> bool {
        let input = glue(&picks);
        let direction = if expanding {
            Direction::Expand
        } else {
            Direction::Contract
        };
        let base = TranscodeSettings::new().direction(direction).fix(fix);

        let whole = base.clone().buffer_capacity(input.len().max(16));
        let (expected, expected_warnings) = convert(&input, &whole);

        let chunked = base.buffer_capacity(16 + capacity as usize % 48);
        let mut output = Vec::new();
        let mut warnings = Vec::new();
        let reader = ChunkedReader::new(&input, splits);
        if transcode(reader, &mut output, &chunked, &mut warnings).is_err() {
            return false;
        }

        let ascending = warnings.windows(2).all(|w| w[0].offset() < w[1].offset());
        output == expected && warnings == expected_warnings && ascending
    }

    QuickCheck::new()
        .tests(tests())
        .quickcheck(prop as fn(Vec<u8>, Vec<usize>, u8, bool, bool) -> bool);
}

#[test]
fn test_expand_undoes_contract() {
    fn prop(picks: Vec<u8>) -> bool {
        // Only well-formed pairs and BMP text, so every rewrite is reversible.
        let input: Vec<u8> = picks
            .iter()
            .flat_map(|&p| FRAGMENTS[[0, 1, 2, 5, 13][p as usize % 5]].iter().copied())
            .collect();

        let (contracted, _) = convert(&input, &contract());
        let (expanded, _) = convert(&contracted, &expand());
        expanded == input
    }

    QuickCheck::new()
        .tests(tests())
        .quickcheck(prop as fn(Vec<u8>) -> bool);
}
