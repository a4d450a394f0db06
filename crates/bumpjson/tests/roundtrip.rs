//! Property-style round trips over generated trees.
//!
//! Trees are built through the write API from a seeded generator, written
//! out, decoded again and compared structurally.

mod common;

use bumpjson::sizing::json_capacity;
use bumpjson::{Document, deserialize_json, to_json_string, to_json_string_pretty};
use common::{Rng, fill_array, fill_object, parse};

const SEEDS: u64 = 200;

fn generated(seed: u64) -> Document {
    let mut rng = Rng::new(seed);
    let mut doc = Document::new();
    let count = rng.below(6) as usize;
    if rng.below(2) == 0 {
        doc.to_array();
        fill_array(&mut rng, doc.as_array(), count, 3);
    } else {
        doc.to_object();
        fill_object(&mut rng, doc.as_object(), count, 3);
    }
    doc
}

#[test]
fn test_compact_roundtrip() {
    for seed in 1..=SEEDS {
        let original = generated(seed);
        let json = to_json_string(&original);
        let decoded = parse(&json);

        assert_eq!(original.root(), decoded.root(), "seed {seed}: {json}");
        assert_eq!(to_json_string(&decoded), json, "seed {seed}");
    }
}

#[test]
fn test_pretty_roundtrip() {
    for seed in 1..=SEEDS {
        let original = generated(seed);
        let decoded = parse(&to_json_string_pretty(&original));
        assert_eq!(original.root(), decoded.root(), "seed {seed}");
    }
}

#[test]
fn test_reuse_matches_fresh_document() {
    let mut reused = Document::new();
    for seed in 1..=SEEDS {
        let json = to_json_string(&generated(seed));

        deserialize_json(&mut reused, &json).unwrap();
        let fresh = parse(&json);

        assert_eq!(reused.root(), fresh.root(), "seed {seed}");
        assert_eq!(to_json_string(&reused), to_json_string(&fresh), "seed {seed}");
    }
}

#[test]
fn test_deep_copy_preserves_trees() {
    for seed in 1..=SEEDS {
        let original = generated(seed);
        let mut copy = Document::new();
        copy.assign(original.root()).unwrap();
        assert_eq!(copy.root(), original.root(), "seed {seed}");
        assert_eq!(to_json_string(&copy), to_json_string(&original), "seed {seed}");
    }
}

#[test]
fn test_truncated_input_never_panics() {
    for seed in 1..=50 {
        let json = to_json_string(&generated(seed));
        let mut doc = Document::new();
        for end in 0..json.len() {
            if !json.is_char_boundary(end) {
                continue;
            }
            // Any outcome is fine as long as a failure leaves nothing behind.
            if deserialize_json(&mut doc, &json[..end]).is_err() {
                assert_eq!(doc.size(), 0);
                assert!(doc.root().is_null());
            }
        }
    }
}

#[test]
fn test_measured_capacity_fits_exactly() {
    for seed in 1..=SEEDS {
        let json = to_json_string(&generated(seed));
        let needed = parse(&json).memory_usage();
        assert_eq!(json_capacity(&json), Ok(needed), "seed {seed}: {json}");

        let mut doc = Document::fixed(needed);
        deserialize_json(&mut doc, &json).unwrap();
        assert_eq!(doc.memory_usage(), needed, "seed {seed}");
        assert_eq!(to_json_string(&doc), json, "seed {seed}");
    }
}

#[test]
fn test_fixed_documents_fail_cleanly() {
    for seed in 1..=50 {
        let json = to_json_string(&generated(seed));
        let needed = parse(&json).memory_usage();

        for capacity in [0, needed / 4, needed / 2, needed.saturating_sub(1)] {
            let mut doc = Document::fixed(capacity);
            if deserialize_json(&mut doc, &json).is_err() {
                assert!(doc.memory_usage() <= capacity);
                assert!(doc.root().is_null());
            }
        }
    }
}
