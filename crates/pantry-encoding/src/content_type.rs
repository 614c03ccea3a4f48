//! The closed set of supported content types.

use std::fmt;

/// A supported interchange format.
///
/// The set is closed: adding a format means touching both the encode and the
/// decode dispatch in [`Codec`](crate::Codec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentType {
    /// `application/json`.
    #[default]
    Json,
    /// `application/xml`.
    Xml,
    /// `application/yaml`.
    Yaml,
    /// `application/toml`.
    Toml,
    /// `application/emoji`.
    Emoji,
}

impl ContentType {
    /// Every supported content type.
    pub const ALL: [Self; 5] = [Self::Json, Self::Xml, Self::Yaml, Self::Toml, Self::Emoji];

    /// Returns the canonical MIME string.
    #[must_use]
    pub fn as_mime(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
            Self::Yaml => "application/yaml",
            Self::Toml => "application/toml",
            Self::Emoji => "application/emoji",
        }
    }

    /// Returns the short format name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Emoji => "emoji",
        }
    }

    /// Resolve a header value, falling back to JSON for anything blank or
    /// unrecognised.
    #[must_use]
    pub fn from_mime(value: &str) -> Self {
        Self::try_from_mime(value).unwrap_or_default()
    }

    /// Resolve a header value, returning `None` when it names no supported
    /// format. Media type parameters such as `charset` are ignored.
    #[must_use]
    pub fn try_from_mime(value: &str) -> Option<Self> {
        let parsed: mime::Mime = value.trim().parse().ok()?;
        Self::from_essence(parsed.essence_str())
            .or_else(|| match parsed.suffix().map(|s| s.as_str()) {
                Some("json") => Some(Self::Json),
                Some("xml") => Some(Self::Xml),
                Some("yaml") => Some(Self::Yaml),
                _ => None,
            })
    }

    /// Pick the most preferred supported format from an `Accept` header.
    ///
    /// Media ranges are ordered by their `q` weight (default `1`); ties keep
    /// header order. Wildcards express no preference and yield `None`.
    #[must_use]
    pub fn from_accept(header: &str) -> Option<Self> {
        let mut ranges: Vec<(f32, mime::Mime)> = header
            .split(',')
            .filter_map(|part| part.trim().parse::<mime::Mime>().ok())
            .map(|m| {
                let q = m
                    .get_param("q")
                    .and_then(|q| q.as_str().parse::<f32>().ok())
                    .unwrap_or(1.0);
                (q, m)
            })
            .filter(|(q, _)| *q > 0.0)
            .collect();

        ranges.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        ranges
            .iter()
            .find_map(|(_, m)| Self::from_essence(m.essence_str()))
    }

    fn from_essence(essence: &str) -> Option<Self> {
        match essence.to_ascii_lowercase().as_str() {
            "application/json" | "text/json" => Some(Self::Json),
            "application/xml" | "text/xml" => Some(Self::Xml),
            "application/yaml" | "application/x-yaml" | "text/yaml" | "text/x-yaml" => {
                Some(Self::Yaml)
            }
            "application/toml" | "text/toml" => Some(Self::Toml),
            "application/emoji" => Some(Self::Emoji),
            _ => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
