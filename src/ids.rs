//! Human-readable prefixed identifiers (`TREK-7f3k9x2m`).
//!
//! The suffix is taken from the random section of a fresh ULID, lowercased,
//! and regenerated until it does not collide with an existing id.

use std::collections::HashSet;

use ulid::Ulid;

const ID_DELIM: char = '-';
const ULID_TIME_LEN: usize = 10;
const ULID_RANDOM_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct IdGenerator {
    suffix_len: usize,
}

impl IdGenerator {
    pub fn new(suffix_len: usize) -> Self {
        Self {
            suffix_len: suffix_len.clamp(1, ULID_RANDOM_LEN),
        }
    }

    /// Generate `<prefix>-<suffix>` not present in `existing`.
    pub fn generate<'a, I>(&self, prefix: &str, existing: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let prefix = prefix.trim();
        let taken: HashSet<String> = existing
            .into_iter()
            .map(|id| normalize_id(suffix_from_id(id)))
            .collect();

        loop {
            let base = Ulid::new().to_string().to_ascii_lowercase();
            let candidate = &base[ULID_TIME_LEN..ULID_TIME_LEN + self.suffix_len];
            if !taken.contains(candidate) {
                return format!("{prefix}{ID_DELIM}{candidate}");
            }
        }
    }
}

fn normalize_id(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

fn suffix_from_id(id: &str) -> &str {
    match id.find(ID_DELIM) {
        Some(idx) => &id[idx + 1..],
        None => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_prefix_and_suffix_len() {
        let generator = IdGenerator::new(8);
        let id = generator.generate("TREK", std::iter::empty());
        let (prefix, suffix) = id.split_once('-').expect("delimiter");
        assert_eq!(prefix, "TREK");
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit()));
    }

    #[test]
    fn generated_ids_do_not_collide() {
        let generator = IdGenerator::new(4);
        let mut existing: Vec<String> = Vec::new();
        for _ in 0..200 {
            let id = generator.generate("EPIC", existing.iter().map(String::as_str));
            assert!(!existing.contains(&id));
            existing.push(id);
        }
    }

    #[test]
    fn suffix_is_compared_case_insensitively() {
        assert_eq!(normalize_id(suffix_from_id("TREK-AbCd")), "abcd");
        assert_eq!(suffix_from_id("plain"), "plain");
    }
}
