//! Reference resolver (C7).
//!
//! Implements RFC 3986 §5.2 "merge and remove_dot_segments" adapted to the
//! `http`/`https` scheme restriction and the authority-slash tolerance
//! used throughout this crate (spec §4.7). Reuses `parser::tokenize` for
//! the syntactic split so the resolver and the top-level parser agree on
//! what counts as a scheme, an authority, and a slash run.

use crate::encode_set;
use crate::host;
use crate::parser::{self, Tokens};
use crate::path;
use crate::percent::{self, PercentOptions};
use crate::{Scheme, Url};

fn parse_scheme_lenient(raw: &str) -> Option<Scheme> {
    match raw.to_ascii_lowercase().as_str() {
        "http" => Some(Scheme::Http),
        "https" => Some(Scheme::Https),
        _ => None,
    }
}

fn encode_fragment(raw: &str) -> String {
    percent::encode(
        raw,
        encode_set::FRAGMENT,
        PercentOptions {
            already_encoded: true,
            ..Default::default()
        },
    )
}

struct SplitAuthority<'a> {
    raw_username: Option<&'a str>,
    raw_password: Option<&'a str>,
    raw_host: &'a str,
    raw_port: Option<&'a str>,
}

fn split_authority(authority: &str) -> SplitAuthority<'_> {
    let (userinfo, hostport) = match authority.rfind('@') {
        Some(idx) => (Some(&authority[..idx]), &authority[idx + 1..]),
        None => (None, authority),
    };
    let (raw_username, raw_password) = match userinfo {
        Some(u) => match u.find(':') {
            Some(idx) => (Some(&u[..idx]), Some(&u[idx + 1..])),
            None => (Some(u), None),
        },
        None => (None, None),
    };
    let (raw_host, raw_port) = if hostport.starts_with('[') {
        match hostport.find(']') {
            Some(close) => (&hostport[..=close], hostport[close + 1..].strip_prefix(':')),
            None => (hostport, None),
        }
    } else {
        match hostport.find(':') {
            Some(idx) => (&hostport[..idx], Some(&hostport[idx + 1..])),
            None => (hostport, None),
        }
    };
    SplitAuthority {
        raw_username,
        raw_password,
        raw_host,
        raw_port,
    }
}

fn encode_component(raw: &str, set: encode_set::EncodeSet) -> String {
    percent::encode(
        raw,
        set,
        PercentOptions {
            already_encoded: true,
            ascii_only: true,
            ..Default::default()
        },
    )
}

/// Merge `base` and `reference` per RFC 3986 §5.2, or `None` if the result
/// would not be a valid `http`/`https` URL.
///
/// `reference` that begins with `base`'s own scheme followed by `:` and
/// fewer than two authority slashes (e.g. `http:g` against an `http`
/// base) is treated as if the scheme prefix were absent, per spec §4.7.
pub fn resolve(base: &Url, reference: &str) -> Option<Url> {
    let stripped;
    let input = match strip_redundant_scheme(base, reference) {
        Some(s) => {
            stripped = s;
            stripped.as_str()
        }
        None => reference,
    };

    let toks = parser::tokenize(input);

    if let Some(raw_scheme) = toks.raw_scheme {
        let scheme = parse_scheme_lenient(raw_scheme)?;
        if toks.slash_count >= 2 {
            return resolve_absolute(scheme, &toks);
        }
        return None;
    }

    resolve_relative(base, &toks)
}

/// If `reference` starts with `base.scheme()` + `:` followed by fewer
/// than two slashes, returns the remainder with that scheme prefix
/// dropped.
fn strip_redundant_scheme(base: &Url, reference: &str) -> Option<String> {
    let prefix = match base.scheme() {
        Scheme::Http => "http:",
        Scheme::Https => "https:",
    };
    let rest = reference
        .trim_start_matches(|c: char| c.is_whitespace())
        .strip_prefix(prefix)?;
    let slash_count = rest.chars().take_while(|&c| c == '/' || c == '\\').count();
    if slash_count >= 2 {
        return None;
    }
    Some(rest.to_string())
}

fn resolve_absolute(scheme: Scheme, toks: &Tokens<'_>) -> Option<Url> {
    let authority_str = toks.authority?;
    let split = split_authority(authority_str);
    let port = parse_port(split.raw_port, scheme)?;
    let canonical_host = host::canonicalize(split.raw_host).ok()?;

    let encoded_username = split
        .raw_username
        .map(|u| encode_component(u, encode_set::USERNAME))
        .unwrap_or_default();
    let encoded_password = split
        .raw_password
        .map(|p| encode_component(p, encode_set::PASSWORD))
        .unwrap_or_default();

    let encoded_path_segments = path::encode_and_normalize(toks.raw_path);
    let encoded_query = toks.query.map(|q| q.to_string());
    let encoded_fragment = toks.fragment.map(encode_fragment);

    Some(Url {
        scheme,
        encoded_username,
        encoded_password,
        host: canonical_host,
        port,
        encoded_path_segments,
        encoded_query,
        encoded_fragment,
    })
}

fn parse_port(raw: Option<&str>, scheme: Scheme) -> Option<u16> {
    match raw {
        None | Some("") => Some(scheme.default_port()),
        Some(digits) => {
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let n: u32 = digits.parse().ok()?;
            if n >= 1 && n <= 65535 {
                Some(n as u16)
            } else {
                None
            }
        }
    }
}

/// `reference` carries no scheme: inherit scheme (and possibly
/// authority/path/query) from `base` per RFC 3986 §5.3.
fn resolve_relative(base: &Url, toks: &Tokens<'_>) -> Option<Url> {
    let scheme = base.scheme;

    if let Some(authority_str) = toks.authority {
        let split = split_authority(authority_str);
        let port = parse_port(split.raw_port, scheme)?;
        let canonical_host = host::canonicalize(split.raw_host).ok()?;
        let encoded_username = split
            .raw_username
            .map(|u| encode_component(u, encode_set::USERNAME))
            .unwrap_or_default();
        let encoded_password = split
            .raw_password
            .map(|p| encode_component(p, encode_set::PASSWORD))
            .unwrap_or_default();
        let encoded_path_segments = path::encode_and_normalize(toks.raw_path);
        let encoded_query = toks.query.map(|q| q.to_string());
        let encoded_fragment = toks.fragment.map(encode_fragment);
        return Some(Url {
            scheme,
            encoded_username,
            encoded_password,
            host: canonical_host,
            port,
            encoded_path_segments,
            encoded_query,
            encoded_fragment,
        });
    }

    let encoded_path_segments = if toks.raw_path.is_empty() {
        base.encoded_path_segments.clone()
    } else if toks.raw_path.starts_with('/') || toks.raw_path.starts_with('\\') {
        path::encode_and_normalize(toks.raw_path)
    } else {
        merge_paths(base, toks.raw_path)
    };

    let inherits_query = toks.raw_path.is_empty() && toks.query.is_none();
    let encoded_query = if inherits_query {
        base.encoded_query.clone()
    } else {
        toks.query.map(|q| q.to_string())
    };

    let encoded_fragment = toks.fragment.map(encode_fragment);

    Some(Url {
        scheme,
        encoded_username: base.encoded_username.clone(),
        encoded_password: base.encoded_password.clone(),
        host: base.host.clone(),
        port: base.port,
        encoded_path_segments,
        encoded_query,
        encoded_fragment,
    })
}

/// RFC 3986 §5.3 merge: drop the base path's final segment, append the
/// reference's segments, then remove dot segments.
fn merge_paths(base: &Url, raw_ref_path: &str) -> Vec<String> {
    let mut merged = base.encoded_path_segments.clone();
    merged.pop();

    let replaced = raw_ref_path.replace('\\', "/");
    let ref_segments: Vec<String> = replaced
        .split('/')
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
    merged.extend(ref_segments);
    path::normalize_segments(merged)
}

#[cfg(test)]
mod test {
    use super::*;

    fn base() -> Url {
        Url::get("http://a/b/c/d;p?q").unwrap()
    }

    #[test]
    fn dot_dot_climbs_above_root() {
        let resolved = resolve(&base(), "../../../g").unwrap();
        assert_eq!(resolved.to_string(), "http://a/g");
    }

    #[test]
    fn absolute_path_replaces_base_path() {
        let resolved = resolve(&base(), "/g").unwrap();
        assert_eq!(resolved.to_string(), "http://a/g");
    }

    #[test]
    fn empty_reference_yields_base_without_fragment() {
        let b = base();
        let resolved = resolve(&b, "").unwrap();
        assert_eq!(resolved.encoded_path_segments, b.encoded_path_segments);
        assert_eq!(resolved.encoded_query, b.encoded_query);
        assert_eq!(resolved.encoded_fragment, None);
    }

    #[test]
    fn fragment_only_reference_keeps_path_and_query() {
        let resolved = resolve(&base(), "#x").unwrap();
        assert_eq!(resolved.fragment(), Some("x".to_string()));
        assert_eq!(resolved.encoded_path_segments, base().encoded_path_segments);
    }

    #[test]
    fn authority_in_reference_replaces_base_authority() {
        let resolved = resolve(&base(), "//h/p").unwrap();
        assert_eq!(resolved.host(), "h");
        assert_eq!(resolved.to_string(), "http://h/p");
    }

    #[test]
    fn redundant_same_scheme_prefix_is_stripped() {
        let resolved = resolve(&base(), "http:g").unwrap();
        assert_eq!(resolved.to_string(), "http://a/b/c/g");
    }

    #[test]
    fn non_http_scheme_reference_fails() {
        assert!(resolve(&base(), "ftp://host/").is_none());
    }

    #[test]
    fn query_only_reference_drops_base_query() {
        let resolved = resolve(&base(), "?y").unwrap();
        assert_eq!(resolved.encoded_query(), Some("y"));
        assert_eq!(resolved.encoded_path_segments, base().encoded_path_segments);
    }
}
