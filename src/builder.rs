//! Builder (C8).
//!
//! Generalizes the teacher's dual `Authority<T>`/`URI<T>` shape in
//! `src/lib.rs` (which already separated borrowed-vs-owned storage) into
//! a dedicated mutable builder that stages edits before producing an
//! immutable [`crate::Url`].

use crate::encode_set;
use crate::error::BuilderError;
use crate::parser;
use crate::path;
use crate::percent::{self, PercentOptions};
use crate::query;
use crate::{Scheme, Url};

/// Mutable staging area for a [`Url`]. Each field is independently
/// optional; `scheme` and `host` are required at [`UrlBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct UrlBuilder {
    scheme: Option<Scheme>,
    encoded_username: String,
    encoded_password: String,
    host: Option<String>,
    port: Option<u16>,
    encoded_path_segments: Vec<String>,
    encoded_query: Option<String>,
    encoded_fragment: Option<String>,
}

impl UrlBuilder {
    pub fn new() -> Self {
        UrlBuilder {
            encoded_path_segments: vec![String::new()],
            ..Default::default()
        }
    }

    pub fn scheme(&mut self, scheme: Scheme) -> &mut Self {
        self.scheme = Some(scheme);
        self
    }

    pub fn username(&mut self, raw: &str) -> &mut Self {
        self.encoded_username = parser::encode_username(raw);
        self
    }

    pub fn encoded_username(&mut self, raw: &str) -> &mut Self {
        self.encoded_username = percent::encode(
            raw,
            encode_set::USERNAME,
            PercentOptions {
                already_encoded: true,
                ascii_only: true,
                ..Default::default()
            },
        );
        self
    }

    pub fn password(&mut self, raw: &str) -> &mut Self {
        self.encoded_password = parser::encode_password(raw);
        self
    }

    pub fn encoded_password(&mut self, raw: &str) -> &mut Self {
        self.encoded_password = percent::encode(
            raw,
            encode_set::PASSWORD,
            PercentOptions {
                already_encoded: true,
                ascii_only: true,
                ..Default::default()
            },
        );
        self
    }

    /// Sets the host from a raw (possibly Unicode, possibly
    /// bracket-delimited IPv6) string, canonicalizing it via the host
    /// canonicalizer (C2). Silently leaves `host` unset on failure; use
    /// `Url::get`/`Url::parse` if you need a diagnostic message.
    pub fn host(&mut self, raw: &str) -> &mut Self {
        if let Ok(canonical) = crate::host::canonicalize(raw) {
            self.host = Some(canonical);
        }
        self
    }

    pub fn port(&mut self, port: u16) -> &mut Self {
        self.port = Some(port);
        self
    }

    pub fn add_path_segment(&mut self, raw: &str) -> &mut Self {
        path::add_segment(&mut self.encoded_path_segments, raw);
        self
    }

    pub fn add_path_segments(&mut self, raw: &str) -> &mut Self {
        path::add_segments(&mut self.encoded_path_segments, raw);
        self
    }

    pub fn add_encoded_path_segment(&mut self, encoded: &str) -> &mut Self {
        if self
            .encoded_path_segments
            .last()
            .map(|s| s.is_empty())
            .unwrap_or(false)
        {
            self.encoded_path_segments.pop();
        }
        self.encoded_path_segments.push(encoded.to_string());
        self
    }

    /// Replaces segment `index`. Rejects `.`/`..` (after decoding) per
    /// spec §4.5, since accepting them would silently desynchronize the
    /// path from what `encoded_path()` displays.
    pub fn set_path_segment(&mut self, index: usize, raw: &str) -> Result<&mut Self, BuilderError> {
        let len = self.encoded_path_segments.len();
        if index >= len {
            return Err(BuilderError::IndexOutOfBounds { index, len });
        }
        let decoded = percent::decode(raw, PercentOptions::default());
        if decoded == "." || decoded == ".." {
            return Err(BuilderError::DotSegment(raw.to_string()));
        }
        let encoded = percent::encode(raw, encode_set::PATH_SEGMENT, PercentOptions::default());
        self.encoded_path_segments[index] = encoded;
        Ok(self)
    }

    pub fn query(&mut self, raw: Option<&str>) -> &mut Self {
        self.encoded_query = raw.map(|q| q.to_string());
        self
    }

    pub fn encoded_query(&mut self, raw: Option<&str>) -> &mut Self {
        self.encoded_query = raw.map(|q| q.to_string());
        self
    }

    fn pairs(&self) -> Vec<(String, Option<String>)> {
        match &self.encoded_query {
            Some(raw) => query::split_pairs(raw),
            None => Vec::new(),
        }
    }

    fn set_pairs(&mut self, pairs: Vec<(String, Option<String>)>) {
        self.encoded_query = Some(query::join_pairs(&pairs));
    }

    pub fn add_query_parameter(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        let mut pairs = self.pairs();
        pairs.push((
            query::encode_component(name),
            value.map(query::encode_component),
        ));
        self.set_pairs(pairs);
        self
    }

    pub fn add_encoded_query_parameter(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        let mut pairs = self.pairs();
        pairs.push((
            query::encode_component_already_encoded(name),
            value.map(query::encode_component_already_encoded),
        ));
        self.set_pairs(pairs);
        self
    }

    pub fn set_query_parameter(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        let mut pairs: Vec<_> = self
            .pairs()
            .into_iter()
            .filter(|(n, _)| !query::decoded_name_eq(n, name))
            .collect();
        pairs.push((
            query::encode_component(name),
            value.map(query::encode_component),
        ));
        self.set_pairs(pairs);
        self
    }

    pub fn remove_all_query_parameters(&mut self, name: &str) -> &mut Self {
        let pairs: Vec<_> = self
            .pairs()
            .into_iter()
            .filter(|(n, _)| !query::decoded_name_eq(n, name))
            .collect();
        self.set_pairs(pairs);
        self
    }

    pub fn fragment(&mut self, raw: Option<&str>) -> &mut Self {
        self.encoded_fragment = raw.map(|f| parser::encode_fragment(f));
        self
    }

    pub fn encoded_fragment(&mut self, raw: Option<&str>) -> &mut Self {
        self.encoded_fragment = raw.map(|f| {
            percent::encode(
                f,
                encode_set::FRAGMENT,
                PercentOptions {
                    already_encoded: true,
                    ..Default::default()
                },
            )
        });
        self
    }

    pub fn build(&self) -> Result<Url, BuilderError> {
        let scheme = self.scheme.ok_or(BuilderError::MissingScheme)?;
        let host = self.host.clone().ok_or(BuilderError::MissingHost)?;
        let port = self.port.unwrap_or_else(|| scheme.default_port());
        let encoded_path_segments = if self.encoded_path_segments.is_empty() {
            vec![String::new()]
        } else {
            self.encoded_path_segments.clone()
        };
        Ok(Url {
            scheme,
            encoded_username: self.encoded_username.clone(),
            encoded_password: self.encoded_password.clone(),
            host,
            port,
            encoded_path_segments,
            encoded_query: self.encoded_query.clone(),
            encoded_fragment: self.encoded_fragment.clone(),
        })
    }

    pub(crate) fn from_url(url: &Url) -> Self {
        UrlBuilder {
            scheme: Some(url.scheme),
            encoded_username: url.encoded_username.clone(),
            encoded_password: url.encoded_password.clone(),
            host: Some(url.host.clone()),
            port: Some(url.port),
            encoded_path_segments: url.encoded_path_segments.clone(),
            encoded_query: url.encoded_query.clone(),
            encoded_fragment: url.encoded_fragment.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn build_requires_scheme_and_host() {
        assert_eq!(
            UrlBuilder::new().build().unwrap_err(),
            BuilderError::MissingScheme
        );
        assert_eq!(
            UrlBuilder::new().scheme(Scheme::Http).build().unwrap_err(),
            BuilderError::MissingHost
        );
    }

    #[test]
    fn port_defaults_to_scheme_default() {
        let url = UrlBuilder::new()
            .scheme(Scheme::Http)
            .host("host")
            .build()
            .unwrap();
        assert_eq!(url.port(), 80);
    }

    #[test]
    fn port_follows_scheme_change_when_unset() {
        let mut b = UrlBuilder::new();
        b.scheme(Scheme::Http).host("host");
        assert_eq!(b.build().unwrap().port(), 80);
        b.scheme(Scheme::Https);
        assert_eq!(b.build().unwrap().port(), 443);
    }

    #[test]
    fn set_path_segment_rejects_dot_segments() {
        let mut b = UrlBuilder::new();
        b.scheme(Scheme::Http).host("host");
        assert!(matches!(
            b.set_path_segment(0, "."),
            Err(BuilderError::DotSegment(_))
        ));
        assert!(matches!(
            b.set_path_segment(0, ".."),
            Err(BuilderError::DotSegment(_))
        ));
    }

    #[test]
    fn set_path_segment_rejects_out_of_bounds() {
        let mut b = UrlBuilder::new();
        b.scheme(Scheme::Http).host("host");
        assert!(matches!(
            b.set_path_segment(5, "ok"),
            Err(BuilderError::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn add_query_parameter_appends_in_order() {
        let mut b = UrlBuilder::new();
        b.scheme(Scheme::Http).host("host");
        b.add_query_parameter("a", Some("1"));
        b.add_query_parameter("b", None);
        let url = b.build().unwrap();
        assert_eq!(url.encoded_query(), Some("a=1&b"));
    }
}
