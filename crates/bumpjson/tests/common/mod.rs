// Shared helpers for the bumpjson integration tests.

#![allow(dead_code)]

use bumpjson::{ArrayRef, Document, ObjectRef, deserialize_json, deserialize_msgpack};

/// Honors `BUMPJSON_LOG` so failing runs can be traced.
pub fn init_logging() {
    let _ = bumpjson_log::init_from_env();
}

/// Decodes `json` into a fresh growable document.
pub fn parse(json: &str) -> Document {
    init_logging();
    let mut doc = Document::new();
    deserialize_json(&mut doc, json).expect("test input should decode");
    doc
}

/// Decodes `bytes` into a fresh growable document.
pub fn parse_msgpack(bytes: &[u8]) -> Document {
    init_logging();
    let mut doc = Document::new();
    deserialize_msgpack(&mut doc, bytes).expect("test input should decode");
    doc
}

/// Small xorshift generator so property loops are reproducible.
pub struct Rng(u64);

impl Rng {
    pub fn new(seed: u64) -> Self {
        Rng(seed.max(1))
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    pub fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    pub fn string(&mut self) -> String {
        const ALPHABET: &[char] = &[
            'a', 'b', 'z', 'A', '0', '9', ' ', '_', '"', '\\', '/', '\n', '\t', '\u{1}', 'é',
            '€', '😀',
        ];
        let len = self.below(8) as usize;
        (0..len)
            .map(|_| ALPHABET[self.below(ALPHABET.len() as u64) as usize])
            .collect()
    }
}

/// Fills `array` with `count` random values, nesting up to `depth` levels.
pub fn fill_array(rng: &mut Rng, array: ArrayRef<'_>, count: usize, depth: u32) {
    for _ in 0..count {
        match rng.below(if depth == 0 { 5 } else { 7 }) {
            0 => array.append(()).unwrap(),
            1 => array.append(rng.below(2) == 0).unwrap(),
            2 => array.append(rng.next_u64() as i64).unwrap(),
            3 => array.append((rng.below(1_000_000) as f64) / 64.0 + 0.5).unwrap(),
            4 => array.append(&rng.string()).unwrap(),
            5 => {
                let n = rng.below(4) as usize;
                fill_array(rng, array.create_nested_array(), n, depth - 1);
            }
            _ => {
                let n = rng.below(4) as usize;
                fill_object(rng, array.create_nested_object(), n, depth - 1);
            }
        }
    }
}

/// Fills `object` with `count` random members (fewer if keys repeat).
pub fn fill_object(rng: &mut Rng, object: ObjectRef<'_>, count: usize, depth: u32) {
    for _ in 0..count {
        let key = rng.string();
        match rng.below(if depth == 0 { 5 } else { 7 }) {
            0 => object.set(&key, ()).unwrap(),
            1 => object.set(&key, rng.below(2) == 0).unwrap(),
            2 => object.set(&key, rng.next_u64() as i64).unwrap(),
            3 => object.set(&key, (rng.below(1_000_000) as f64) / 64.0 + 0.5).unwrap(),
            4 => object.set(&key, &rng.string()).unwrap(),
            5 => {
                let n = rng.below(4) as usize;
                fill_array(rng, object.create_nested_array(&key), n, depth - 1);
            }
            _ => {
                let n = rng.below(4) as usize;
                fill_object(rng, object.create_nested_object(&key), n, depth - 1);
            }
        }
    }
}
