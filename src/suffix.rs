//! Public suffix accessor (C9), an external collaborator.
//!
//! Modeled as an injectable accessor interface owned by the URL type
//! rather than hidden process state (spec §9 design note), so tests can
//! substitute a fixture table. The default implementation wraps the
//! `psl` crate's static suffix list.

use std::sync::OnceLock;

/// Given an ASCII-encoded host, returns the longest registrable suffix
/// ("top private domain"), or `None` if the host has no such suffix (an
/// IP-literal host, a single-label host, or an unlisted suffix).
pub trait TopPrivateDomainSource: Send + Sync {
    fn top_private_domain(&self, host: &str) -> Option<String>;
}

/// Default source, backed by the `psl` crate's compiled-in public suffix
/// list.
#[derive(Debug, Default)]
pub struct PslTopPrivateDomainSource;

impl TopPrivateDomainSource for PslTopPrivateDomainSource {
    fn top_private_domain(&self, host: &str) -> Option<String> {
        psl::domain(host.as_bytes())
            .map(|d| String::from_utf8_lossy(d.as_bytes()).into_owned())
    }
}

static DEFAULT_SOURCE: OnceLock<PslTopPrivateDomainSource> = OnceLock::new();

/// The process-wide default source, lazily initialized exactly once
/// (`OnceLock::get_or_init` is idempotent and thread-safe).
pub fn default_source() -> &'static PslTopPrivateDomainSource {
    DEFAULT_SOURCE.get_or_init(PslTopPrivateDomainSource::default)
}

#[cfg(test)]
mod test {
    use super::*;

    struct FixtureSource;
    impl TopPrivateDomainSource for FixtureSource {
        fn top_private_domain(&self, host: &str) -> Option<String> {
            if host.ends_with("example.co.uk") {
                Some("example.co.uk".to_string())
            } else {
                None
            }
        }
    }

    #[test]
    fn fixture_source_is_substitutable() {
        let src = FixtureSource;
        assert_eq!(
            src.top_private_domain("www.example.co.uk"),
            Some("example.co.uk".to_string())
        );
        assert_eq!(src.top_private_domain("localhost"), None);
    }

    #[test]
    fn default_source_is_idempotent() {
        let a = default_source() as *const _;
        let b = default_source() as *const _;
        assert_eq!(a, b);
    }

    #[test]
    fn default_source_handles_common_domains() {
        assert_eq!(
            default_source().top_private_domain("www.example.com"),
            Some("example.com".to_string())
        );
    }
}
