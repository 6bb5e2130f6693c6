//! Regex-driven image reference parser

use regex::Regex;
use tracing::trace;

use crate::config::REFERENCE_PATTERN;
use crate::reference::error::ParseError;
use crate::reference::types::{ImageReference, TrimOptions};

/// Capture groups every reference pattern must define
const CAPTURE_GROUPS: [&str; 5] = ["registry", "org", "repo", "tag", "shasum"];

/// Splits image references into their named parts
#[derive(Debug, Clone)]
pub struct ReferenceParser {
    pattern: Regex,
}

impl ReferenceParser {
    /// Creates a parser for the default `registry/org/repo[:tag][@sha256:shasum]` grammar
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(REFERENCE_PATTERN).expect("default reference pattern is valid"),
        }
    }

    /// Creates a parser from a custom pattern.
    ///
    /// The pattern must name all five groups: `registry`, `org`, `repo`, `tag`
    /// and `shasum`.
    pub fn with_pattern(pattern: &str) -> Result<Self, ParseError> {
        let pattern =
            Regex::new(pattern).map_err(|e| ParseError::InvalidPattern(e.to_string()))?;

        let names: Vec<&str> = pattern.capture_names().flatten().collect();
        if let Some(missing) = CAPTURE_GROUPS.into_iter().find(|group| !names.contains(group)) {
            return Err(ParseError::InvalidPattern(format!(
                "missing capture group `{}`",
                missing
            )));
        }

        Ok(Self { pattern })
    }

    /// Parses one reference. Surrounding whitespace is ignored.
    pub fn parse(&self, reference: &str) -> Result<ImageReference, ParseError> {
        let reference = reference.trim();
        let captures = self
            .pattern
            .captures(reference)
            .ok_or_else(|| ParseError::NoMatch(reference.to_string()))?;

        let group = |name: &str| {
            captures
                .name(name)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        };

        let parsed = ImageReference {
            registry: group("registry"),
            org: group("org"),
            repo: group("repo"),
            tag: group("tag"),
            shasum: group("shasum"),
        };
        trace!("regexp matches: {:?}", parsed);

        Ok(parsed)
    }

    /// Parses `reference` and renders it under `options`
    pub fn canonicalize(
        &self,
        reference: &str,
        options: &TrimOptions,
    ) -> Result<String, ParseError> {
        Ok(self.parse(reference)?.render(options))
    }

    /// Canonicalizes every non-blank line of `input`, e.g. an `image-digests` listing.
    ///
    /// Fails on the first line that is not a reference; line numbers start at 1.
    pub fn canonicalize_lines(
        &self,
        input: &str,
        options: &TrimOptions,
    ) -> Result<Vec<String>, ParseError> {
        input
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                self.canonicalize(line, options)
                    .map_err(|e| ParseError::InvalidLine {
                        line: idx + 1,
                        source: Box::new(e),
                    })
            })
            .collect()
    }
}

impl Default for ReferenceParser {
    fn default() -> Self {
        Self::new()
    }
}
