//! Host canonicalizer (C2).
//!
//! IDNA mapping is delegated to the `idna` crate; IPv6 RFC 5952 encoding
//! and IPv4 dotted-quad handling are hand-rolled per spec §4.2, in the
//! style of the teacher's `parse_host`/`Host` split in `parsers.rs`, with
//! the forbidden-code-point structure grounded on
//! `examples/other_examples/2ddbb6f9_simonwuelker-Stormlicht__web-url-src-host.rs.rs`.

use crate::error::HostError;
use crate::percent::{self, PercentOptions};

/// Characters that make a decoded domain label invalid even after IDNA
/// ToASCII succeeds (spec §4.2 step 3).
fn is_forbidden_domain_char(c: char) -> bool {
    (c as u32) <= 0x1F
        || (c as u32) >= 0x7F
        || matches!(
            c,
            ' ' | '#' | '%' | '/' | ':' | '?' | '@' | '[' | '\\' | ']'
        )
}

/// Canonicalize a raw authority host slice (bracket-delimited for IPv6,
/// bare otherwise) into its canonical string form.
pub fn canonicalize(raw: &str) -> Result<String, HostError> {
    if raw.is_empty() {
        return Err(HostError::EmptyHost);
    }

    let decoded = percent::decode(raw, PercentOptions::default());

    if decoded.contains(':') {
        let inner = strip_brackets(&decoded);
        let addr = parse_ipv6(inner)?;
        return Ok(format_ipv6_or_mapped_ipv4(addr));
    }

    if looks_like_ip_shape(&decoded) {
        if let Ok(addr) = parse_ipv4_strict(&decoded) {
            return Ok(format_ipv4(addr));
        }
    }

    to_ascii_domain(&decoded)
}

fn strip_brackets(s: &str) -> &str {
    if s.starts_with('[') && s.ends_with(']') && s.len() >= 2 {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Matches the IP-address shape from spec §4.2 step 4:
/// `([0-9a-fA-F]*:[0-9a-fA-F:.]*) | ([0-9.]+)`.
fn looks_like_ip_shape(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    s.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// IDNA ToASCII with nontransitional processing, then a forbidden
/// code-point check on the lowercased result.
///
/// Open question (spec §9 / DESIGN.md): no input preprocessing is layered
/// ahead of the `idna` crate call; its UTS #46 table is treated as
/// authoritative.
fn to_ascii_domain(decoded: &str) -> Result<String, HostError> {
    let ascii = idna::Config::default()
        .transitional_processing(false)
        .to_ascii(decoded)
        .map_err(|_| HostError::InvalidIdna)?;
    let ascii = ascii.to_lowercase();
    if ascii.is_empty() || ascii.chars().any(is_forbidden_domain_char) {
        return Err(HostError::InvalidIdna);
    }
    Ok(ascii)
}

/// A parsed IPv6 address as 16 bytes (network order).
type Ipv6Bytes = [u8; 16];

fn parse_ipv6(input: &str) -> Result<Ipv6Bytes, HostError> {
    if input.contains('%') {
        // Zone identifiers are explicitly out of scope (spec §1 Non-goals).
        return Err(HostError::InvalidIpv6);
    }

    let (head, tail, has_compression) = match input.match_indices("::").count() {
        0 => (input, "", false),
        1 => {
            let idx = input.find("::").unwrap();
            (&input[..idx], &input[idx + 2..], true)
        }
        _ => return Err(HostError::InvalidIpv6),
    };

    let mut head_pieces: Vec<&str> = if head.is_empty() {
        Vec::new()
    } else {
        head.split(':').collect()
    };
    let mut tail_pieces: Vec<&str> = if tail.is_empty() {
        Vec::new()
    } else {
        tail.split(':').collect()
    };

    // An embedded IPv4 suffix, if present, must be the final piece.
    let mut trailing_ipv4: Option<[u8; 4]> = None;
    if let Some(last) = tail_pieces.last().or_else(|| head_pieces.last()) {
        if last.contains('.') {
            let v4 = parse_ipv4_strict(last).map_err(|_| HostError::InvalidIpv6)?;
            trailing_ipv4 = Some(v4);
            if tail_pieces.last() == Some(last) {
                tail_pieces.pop();
            } else {
                head_pieces.pop();
            }
        }
    }

    let v4_groups = if trailing_ipv4.is_some() { 2 } else { 0 };
    let total_groups = head_pieces.len() + tail_pieces.len() + v4_groups;

    if has_compression {
        if total_groups > 8 {
            return Err(HostError::InvalidIpv6);
        }
        if head_pieces.iter().any(|p| p.is_empty())
            || tail_pieces.iter().any(|p| p.is_empty())
        {
            return Err(HostError::InvalidIpv6);
        }
    } else {
        if total_groups != 8 {
            return Err(HostError::InvalidIpv6);
        }
        if !tail_pieces.is_empty() {
            return Err(HostError::InvalidIpv6);
        }
        if head_pieces.iter().any(|p| p.is_empty()) {
            return Err(HostError::InvalidIpv6);
        }
    }

    let mut groups: Vec<u16> = Vec::with_capacity(8);
    for piece in &head_pieces {
        groups.push(parse_hex_group(piece)?);
    }
    if has_compression {
        let fill = 8 - (head_pieces.len() + tail_pieces.len() + v4_groups);
        for _ in 0..fill {
            groups.push(0);
        }
    }
    for piece in &tail_pieces {
        groups.push(parse_hex_group(piece)?);
    }
    if let Some(v4) = trailing_ipv4 {
        groups.push(u16::from_be_bytes([v4[0], v4[1]]));
        groups.push(u16::from_be_bytes([v4[2], v4[3]]));
    }

    if groups.len() != 8 {
        return Err(HostError::InvalidIpv6);
    }

    let mut bytes = [0u8; 16];
    for (i, g) in groups.iter().enumerate() {
        bytes[i * 2] = (g >> 8) as u8;
        bytes[i * 2 + 1] = (g & 0xFF) as u8;
    }
    Ok(bytes)
}

fn parse_hex_group(s: &str) -> Result<u16, HostError> {
    if s.is_empty() || s.len() > 4 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(HostError::InvalidIpv6);
    }
    u16::from_str_radix(s, 16).map_err(|_| HostError::InvalidIpv6)
}

fn parse_ipv4_strict(s: &str) -> Result<[u8; 4], HostError> {
    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() != 4 {
        return Err(HostError::InvalidIpv4);
    }
    let mut out = [0u8; 4];
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() || part.len() > 3 || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(HostError::InvalidIpv4);
        }
        if part.len() > 1 && part.starts_with('0') {
            return Err(HostError::InvalidIpv4);
        }
        let v: u32 = part.parse().map_err(|_| HostError::InvalidIpv4)?;
        if v > 255 {
            return Err(HostError::InvalidIpv4);
        }
        out[i] = v as u8;
    }
    Ok(out)
}

fn format_ipv4(addr: [u8; 4]) -> String {
    format!("{}.{}.{}.{}", addr[0], addr[1], addr[2], addr[3])
}

fn is_ipv4_mapped(bytes: &Ipv6Bytes) -> bool {
    bytes[0..10].iter().all(|&b| b == 0) && bytes[10] == 0xFF && bytes[11] == 0xFF
}

/// RFC 5952 canonical textual form, or the embedded IPv4 form when the
/// address is IPv4-mapped (spec §4.2 step 2 final bullet).
fn format_ipv6_or_mapped_ipv4(bytes: Ipv6Bytes) -> String {
    if is_ipv4_mapped(&bytes) {
        return format_ipv4([bytes[12], bytes[13], bytes[14], bytes[15]]);
    }

    let mut groups = [0u16; 8];
    for i in 0..8 {
        groups[i] = u16::from_be_bytes([bytes[i * 2], bytes[i * 2 + 1]]);
    }

    let (run_start, run_len) = longest_zero_run(&groups);

    let mut out = String::new();
    if run_len >= 2 {
        for (i, g) in groups.iter().enumerate().take(run_start) {
            if i > 0 {
                out.push(':');
            }
            out.push_str(&format!("{:x}", g));
        }
        out.push_str("::");
        for (i, g) in groups.iter().enumerate().skip(run_start + run_len) {
            if i > run_start + run_len {
                out.push(':');
            }
            out.push_str(&format!("{:x}", g));
        }
    } else {
        for (i, g) in groups.iter().enumerate() {
            if i > 0 {
                out.push(':');
            }
            out.push_str(&format!("{:x}", g));
        }
    }
    out
}

/// Longest run of two-or-more consecutive zero groups; ties go to the
/// first run (spec §4.2).
fn longest_zero_run(groups: &[u16; 8]) -> (usize, usize) {
    let mut best_start = 0;
    let mut best_len = 0;
    let mut cur_start = 0;
    let mut cur_len = 0;
    for (i, &g) in groups.iter().enumerate() {
        if g == 0 {
            if cur_len == 0 {
                cur_start = i;
            }
            cur_len += 1;
        } else {
            if cur_len > best_len {
                best_start = cur_start;
                best_len = cur_len;
            }
            cur_len = 0;
        }
    }
    if cur_len > best_len {
        best_start = cur_start;
        best_len = cur_len;
    }
    (best_start, best_len)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn canonicalizes_domain_lowercase() {
        assert_eq!(canonicalize("HOST").unwrap(), "host");
    }

    #[test]
    fn canonicalizes_ipv4() {
        assert_eq!(canonicalize("192.168.1.1").unwrap(), "192.168.1.1");
    }

    #[test]
    fn rejects_ipv4_leading_zero() {
        assert!(canonicalize("192.168.01.1").is_err());
    }

    #[test]
    fn collapses_longest_zero_run() {
        assert_eq!(
            canonicalize("[2001:db8:0:0:1:0:0:1]").unwrap(),
            "2001:db8::1:0:0:1"
        );
    }

    #[test]
    fn formats_ipv4_mapped_as_ipv4() {
        assert_eq!(canonicalize("[::ffff:c0a8:1fe]").unwrap(), "192.168.1.254");
    }

    #[test]
    fn ipv6_loopback_canonical() {
        assert_eq!(canonicalize("[::1]").unwrap(), "::1");
    }

    #[test]
    fn rejects_multiple_double_colon() {
        assert!(canonicalize("[1::2::3]").is_err());
    }

    #[test]
    fn rejects_too_many_groups() {
        assert!(canonicalize("[1:2:3:4:5:6:7:8:9]").is_err());
    }

    #[test]
    fn rejects_wrong_group_count_without_compression() {
        assert!(canonicalize("[1:2:3:4:5:6:7]").is_err());
    }

    #[test]
    fn rejects_group_too_long() {
        assert!(canonicalize("[12345::]").is_err());
    }

    #[test]
    fn idempotent_on_canonical_host() {
        let once = canonicalize("2001:db8::1").unwrap();
        let twice = canonicalize(&once).unwrap();
        assert_eq!(once, twice);
    }
}
