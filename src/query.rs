//! Query model (C6).
//!
//! Restructured from the teacher's `query`/`part` combinators in
//! `parsers.rs`. The teacher folds pairs into a `HashMap`, which silently
//! drops duplicate names and loses order (both unacceptable per spec
//! §3.3, "duplicate names are permitted and addressable by index"), so
//! this module keeps an ordered `Vec<(String, Option<String>)>` instead.

use crate::encode_set;
use crate::percent::{self, PercentOptions};

/// One `name[=value]` pair from a query string. `None` means the piece
/// carried no `=` at all (distinct from an empty value).
pub type Pair = (String, Option<String>);

/// Split a raw (already percent-encoded) query string into pairs.
///
/// An empty string yields a single pair `("", None)`; a lone `&` yields
/// two such pairs (spec §4.6).
pub fn split_pairs(raw: &str) -> Vec<(String, Option<String>)> {
    raw.split('&')
        .map(|piece| match piece.find('=') {
            Some(idx) => (piece[..idx].to_string(), Some(piece[idx + 1..].to_string())),
            None => (piece.to_string(), None),
        })
        .collect()
}

/// Re-serialize encoded pairs back into a raw query string.
pub fn join_pairs(pairs: &[(String, Option<String>)]) -> String {
    pairs
        .iter()
        .map(|(name, value)| match value {
            Some(v) => format!("{}={}", name, v),
            None => name.clone(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn decode_query_component(s: &str) -> String {
    percent::decode(
        s,
        PercentOptions {
            plus_is_space: true,
            ..Default::default()
        },
    )
}

/// Decoded-name equality, per spec §4.6 ("+" and " " decode equal).
pub fn decoded_name_eq(encoded_name: &str, decoded_target: &str) -> bool {
    decode_query_component(encoded_name) == decoded_target
}

pub fn encode_component(raw: &str) -> String {
    percent::encode(raw, encode_set::QUERY_COMPONENT, PercentOptions::default())
}

pub fn encode_component_already_encoded(raw: &str) -> String {
    percent::encode(
        raw,
        encode_set::QUERY_COMPONENT,
        PercentOptions {
            already_encoded: true,
            ..Default::default()
        },
    )
}

pub fn decoded_value(encoded: &Option<String>) -> Option<String> {
    encoded.as_ref().map(|v| decode_query_component(v))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_query_yields_one_pair_with_no_value() {
        assert_eq!(split_pairs(""), vec![("".to_string(), None)]);
    }

    #[test]
    fn lone_ampersand_yields_two_empty_pairs() {
        assert_eq!(
            split_pairs("&"),
            vec![("".to_string(), None), ("".to_string(), None)]
        );
    }

    #[test]
    fn splits_on_first_equals_only() {
        assert_eq!(
            split_pairs("a=b=c"),
            vec![("a".to_string(), Some("b=c".to_string()))]
        );
    }

    #[test]
    fn piece_without_equals_has_absent_value() {
        assert_eq!(split_pairs("a&b=1"), vec![
            ("a".to_string(), None),
            ("b".to_string(), Some("1".to_string())),
        ]);
    }

    #[test]
    fn plus_and_space_decode_equal() {
        assert!(decoded_name_eq("a+b", "a b"));
        assert!(decoded_name_eq("a%20b", "a b"));
    }

    #[test]
    fn join_round_trips_split() {
        let pairs = split_pairs("a=1&b&c=");
        assert_eq!(join_pairs(&pairs), "a=1&b&c=");
    }
}
