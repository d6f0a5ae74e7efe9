//! Path normalizer (C5).
//!
//! Segment splitting is grounded on the teacher's `path`/`path_part`
//! combinators in `parsers.rs`; dot-segment removal follows RFC 3986
//! §5.2.4 adapted to operate on already-split segments (spec §4.5/§9).

use crate::encode_set;
use crate::percent::{self, PercentOptions};

/// Split an encoded path (already `\`→`/` normalized, already percent
/// encoded) into segments, then apply dot-segment removal.
///
/// `path` must start with `/` (or be empty, meaning the root). The
/// returned vector is never empty: an absolute path of `/` yields a
/// single empty segment, matching the data-model invariant in spec §3.1.
pub fn split_and_normalize(path: &str) -> Vec<String> {
    let raw: Vec<&str> = if path.is_empty() {
        vec![""]
    } else {
        path.split('/').skip(1).collect()
    };
    normalize_segments(raw.into_iter().map(String::from).collect())
}

/// Apply RFC 3986 §5.2.4 dot-segment removal to an already-split segment
/// list. A segment is recognized as `.`/`..` case-insensitively including
/// percent-encoded spellings of the dot (`%2E`/%2e`).
pub fn normalize_segments(segments: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(segments.len());
    let len = segments.len();
    for (i, seg) in segments.into_iter().enumerate() {
        let is_last = i + 1 == len;
        match classify(&seg) {
            DotKind::Dot => {
                if is_last {
                    out.push(String::new());
                }
                // else: drop it entirely.
            }
            DotKind::DotDot => {
                if let Some(idx) = out.iter().rposition(|s| !s.is_empty()) {
                    out.remove(idx);
                }
                if is_last {
                    out.push(String::new());
                }
            }
            DotKind::Plain => out.push(seg),
        }
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

enum DotKind {
    Dot,
    DotDot,
    Plain,
}

fn decode_dots(seg: &str) -> Option<String> {
    // Only decode if the segment is short enough to plausibly be a dot
    // segment; avoids decoding arbitrarily large segments just to check.
    if seg.len() > 9 {
        return None;
    }
    Some(percent::decode(seg, PercentOptions::default()))
}

fn classify(seg: &str) -> DotKind {
    if seg == "." {
        return DotKind::Dot;
    }
    if seg == ".." {
        return DotKind::DotDot;
    }
    if let Some(decoded) = decode_dots(seg) {
        if decoded == "." {
            return DotKind::Dot;
        }
        if decoded == ".." {
            return DotKind::DotDot;
        }
    }
    DotKind::Plain
}

/// Encode a raw path into its canonical already-encoded segment list,
/// applying dot-segment removal.
///
/// Each segment is encoded against the path-segment encode set
/// independently, after splitting on `/`. Encoding the whole path
/// string in one pass would wrongly turn the literal separators
/// themselves into `%2F`, since `/` is a member of the path-segment
/// encode set: it must be escaped when it appears *inside* a segment,
/// e.g. via `add_path_segment`, but not when it's acting as a
/// separator.
pub fn encode_and_normalize(raw_path: &str) -> Vec<String> {
    let backslashes_replaced = raw_path.replace('\\', "/");
    let raw_segments: Vec<&str> = if backslashes_replaced.is_empty() {
        vec![""]
    } else {
        backslashes_replaced.split('/').skip(1).collect()
    };
    let encoded_segments: Vec<String> = raw_segments
        .into_iter()
        .map(|seg| {
            percent::encode(
                seg,
                encode_set::PATH_SEGMENT,
                PercentOptions {
                    already_encoded: true,
                    ..Default::default()
                },
            )
        })
        .collect();
    normalize_segments(encoded_segments)
}

/// `add_path_segments` splitting rule (spec §4.5): `\`→`/`, drop a
/// trailing empty segment on `base` before appending, then normalize.
pub fn add_segments(base: &mut Vec<String>, input: &str) {
    if base.last().map(|s| s.is_empty()).unwrap_or(false) {
        base.pop();
    }
    let replaced = input.replace('\\', "/");
    for piece in replaced.split('/') {
        let encoded = percent::encode(
            piece,
            encode_set::PATH_SEGMENT,
            PercentOptions::default(),
        );
        base.push(encoded);
    }
    let normalized = normalize_segments(std::mem::take(base));
    *base = normalized;
}

/// `add_path_segment` (singular): never splits on `/`.
pub fn add_segment(base: &mut Vec<String>, input: &str) {
    if base.last().map(|s| s.is_empty()).unwrap_or(false) {
        base.pop();
    }
    let encoded = percent::encode(input, encode_set::PATH_SEGMENT, PercentOptions::default());
    let encoded = encoded.replace('/', "%2F");
    base.push(encoded);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn root_is_single_empty_segment() {
        assert_eq!(split_and_normalize(""), vec![""]);
    }

    #[test]
    fn removes_single_dot_segments() {
        assert_eq!(
            split_and_normalize("/a/./b"),
            vec!["a", "b"]
        );
    }

    #[test]
    fn removes_double_dot_segments() {
        assert_eq!(split_and_normalize("/a/b/../c"), vec!["a", "c"]);
    }

    #[test]
    fn terminal_dot_leaves_trailing_slash() {
        assert_eq!(split_and_normalize("/a/."), vec!["a", ""]);
    }

    #[test]
    fn terminal_dotdot_leaves_trailing_slash() {
        assert_eq!(split_and_normalize("/a/b/.."), vec!["a", ""]);
    }

    #[test]
    fn dotdot_with_nothing_to_pop_consumes_nothing() {
        assert_eq!(split_and_normalize("/../a"), vec!["a"]);
    }

    #[test]
    fn percent_encoded_dot_segments_recognized() {
        assert_eq!(split_and_normalize("/a/%2e%2e/b"), vec!["b"]);
    }

    #[test]
    fn dotdot_pops_previous_non_empty_segment_past_an_empty_one() {
        // "a" / "" (from the doubled "/") / ".." / "b": ".." must reach
        // back past the empty segment and remove "a", not the empty one.
        assert_eq!(split_and_normalize("/a//../b"), vec!["", "b"]);
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = split_and_normalize("/a/../b/./c");
        let joined = format!("/{}", once.join("/"));
        let twice = split_and_normalize(&joined);
        assert_eq!(once, twice);
    }

    #[test]
    fn add_segments_drops_trailing_slash_before_appending() {
        let mut base = vec!["a".to_string(), "".to_string()];
        add_segments(&mut base, "b/c");
        assert_eq!(base, vec!["a", "b", "c"]);
    }

    #[test]
    fn add_segment_percent_encodes_slash() {
        let mut base = vec!["".to_string()];
        add_segment(&mut base, "a/b");
        assert_eq!(base, vec!["a%2Fb"]);
    }
}
