//! Exact / glob / regex / list matching of URL paths.
//!
//! `PathPattern` is a closed enum rather than a dynamically-typed value, so
//! the "falls through silently on an unsupported pattern type" failure mode
//! the dynamic-language reference exhibits cannot occur here: a caller can
//! only ever construct one of the four variants below, and the one
//! fallible construction (a bad regex) is rejected at construction time.

use regex::Regex;

#[derive(Debug, thiserror::Error)]
#[error("invalid path pattern {pattern:?}: {source}")]
pub struct InvalidPathPattern {
    pattern: String,
    #[source]
    source: regex::Error,
}

#[derive(Debug, Clone)]
pub enum PathPattern {
    Exact(String),
    Glob(String),
    Regex { source: String, compiled: Regex },
    Any(Vec<PathPattern>),
}

impl PathPattern {
    /// Classifies `pattern` the same way the reference implementation does:
    /// a `regex:` prefix compiles a regex, `*`/`?` anywhere makes it a glob,
    /// anything else is matched exactly.
    pub fn parse(pattern: &str) -> Result<Self, InvalidPathPattern> {
        if let Some(regex_source) = pattern.strip_prefix("regex:") {
            let compiled = Regex::new(regex_source).map_err(|source| InvalidPathPattern {
                pattern: pattern.to_string(),
                source,
            })?;
            Ok(PathPattern::Regex {
                source: regex_source.to_string(),
                compiled,
            })
        } else if pattern.contains('*') || pattern.contains('?') {
            Ok(PathPattern::Glob(pattern.to_string()))
        } else {
            Ok(PathPattern::Exact(pattern.to_string()))
        }
    }

    /// Builds a disjunction over several patterns.
    pub fn any(patterns: impl IntoIterator<Item = PathPattern>) -> Self {
        PathPattern::Any(patterns.into_iter().collect())
    }

    /// Parses a list of raw pattern strings into a disjunction.
    pub fn parse_any<S: AsRef<str>>(
        patterns: impl IntoIterator<Item = S>,
    ) -> Result<Self, InvalidPathPattern> {
        let parsed = patterns
            .into_iter()
            .map(|p| PathPattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PathPattern::Any(parsed))
    }

    /// Matches `request_path` against this pattern.
    ///
    /// Case-sensitive, no URL decoding, no normalization: the caller's
    /// framework is assumed to have already produced a normalized path.
    /// Regex patterns are anchored at the start (`find`, not a full-string
    /// match) — the caller supplies any further anchoring itself.
    pub fn matches(&self, request_path: &str) -> bool {
        match self {
            PathPattern::Exact(pattern) => pattern == request_path,
            PathPattern::Glob(pattern) => glob_match(pattern, request_path),
            PathPattern::Regex { compiled, .. } => compiled
                .find(request_path)
                .is_some_and(|m| m.start() == 0),
            PathPattern::Any(patterns) => patterns.iter().any(|p| p.matches(request_path)),
        }
    }
}

impl Default for PathPattern {
    /// The middleware's default path, `"*"`: matches every request.
    fn default() -> Self {
        PathPattern::Glob("*".to_string())
    }
}

/// Filesystem-style glob matching: `*` and `?` both cross `/`, unlike shell
/// globbing. This is the same contract `fnmatch.fnmatch` gives the
/// reference implementation.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    glob_match_chars(&pattern, &text)
}

fn glob_match_chars(pattern: &[char], text: &[char]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some('*') => {
            glob_match_chars(&pattern[1..], text)
                || (!text.is_empty() && glob_match_chars(pattern, &text[1..]))
        }
        Some('?') => !text.is_empty() && glob_match_chars(&pattern[1..], &text[1..]),
        Some(c) => text.first() == Some(c) && glob_match_chars(&pattern[1..], &text[1..]),
    }
}
