//! Matching of a single name or relative path against ignore patterns.
//!
//! The pattern language has three kinds, checked in this order:
//!
//! - `*.ext` style extension wildcards, matched as a name suffix.
//! - Globs containing `*` or `?`, matched as a fully anchored expression.
//! - Literals, matched as an exact name.
//!
//! A glob or literal containing a `/` is path-aware: it is matched against the
//! path relative to the walk root instead of the bare name. Path-aware literals
//! match when the relative path contains them. All comparisons are
//! case-insensitive and `\` is treated as `/`.

use regex::{Regex, RegexBuilder};

/// Replaces every `\` with `/`.
pub fn normalize_separators(text: &str) -> String {
    text.replace('\\', "/")
}

/// A candidate path prepared for matching: lowercased name and lowercased,
/// separator-normalized relative path.
#[derive(Debug, Clone)]
pub struct Candidate {
    name: String,
    relative_path: String,
}

impl Candidate {
    pub fn new(name: &str, relative_path: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            relative_path: normalize_separators(relative_path).to_lowercase(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }
}

/// One compiled ignore pattern.
#[derive(Debug, Clone)]
pub enum IgnorePattern {
    /// `*.` prefix; holds the lowercased suffix including the dot.
    Extension(String),
    /// Any other pattern with `*` or `?`.
    Glob { regex: Regex, path_aware: bool },
    /// No wildcard characters.
    Literal { text: String, path_aware: bool },
    /// Blank patterns and patterns that failed to compile.
    Never,
}

impl IgnorePattern {
    pub fn parse(pattern: &str) -> Self {
        if pattern.trim().is_empty() {
            return IgnorePattern::Never;
        }

        let normalized = normalize_separators(pattern).to_lowercase();
        let path_aware = normalized.contains('/');

        if normalized.starts_with("*.") {
            return IgnorePattern::Extension(normalized[1..].to_string());
        }

        if normalized.contains('*') || normalized.contains('?') {
            let expression = glob_to_regex(&normalized);
            return match RegexBuilder::new(&expression)
                .case_insensitive(true)
                .dot_matches_new_line(true)
                .build()
            {
                Ok(regex) => IgnorePattern::Glob { regex, path_aware },
                Err(e) => {
                    tracing::warn!("Ignoring unusable pattern {:?}: {}", pattern, e);
                    IgnorePattern::Never
                }
            };
        }

        IgnorePattern::Literal {
            text: normalized,
            path_aware,
        }
    }

    pub fn is_match(&self, candidate: &Candidate) -> bool {
        match self {
            IgnorePattern::Extension(suffix) => candidate.name.ends_with(suffix.as_str()),
            IgnorePattern::Glob { regex, path_aware } => {
                if *path_aware {
                    regex.is_match(&candidate.relative_path)
                } else {
                    regex.is_match(&candidate.name)
                }
            }
            IgnorePattern::Literal { text, path_aware } => {
                if *path_aware {
                    candidate.relative_path.contains(text.as_str())
                } else {
                    candidate.name == *text
                }
            }
            IgnorePattern::Never => false,
        }
    }
}

/// Translates a wildcard pattern into an anchored regular expression.
fn glob_to_regex(pattern: &str) -> String {
    let mut expression = String::with_capacity(pattern.len() + 8);
    expression.push('^');
    let mut buf = [0u8; 4];
    for c in pattern.chars() {
        match c {
            '*' => expression.push_str(".*"),
            '?' => expression.push('.'),
            _ => expression.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }
    expression.push('$');
    expression
}

/// Decides whether `candidate_name` (or its relative path) matches `pattern`.
///
/// Compiles the pattern on every call; walks use [`PatternSet`] instead.
pub fn matches(candidate_name: &str, candidate_relative_path: &str, pattern: &str) -> bool {
    IgnorePattern::parse(pattern).is_match(&Candidate::new(candidate_name, candidate_relative_path))
}

/// An ordered list of compiled patterns, evaluated as a logical OR.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<(String, IgnorePattern)>,
}

impl PatternSet {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| (p.as_ref().to_string(), IgnorePattern::parse(p.as_ref())))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns the source text of the first pattern that matches.
    pub fn first_match(&self, candidate: &Candidate) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, compiled)| compiled.is_match(candidate))
            .map(|(source, _)| source.as_str())
    }

    pub fn is_match(&self, candidate: &Candidate) -> bool {
        self.first_match(candidate).is_some()
    }
}
