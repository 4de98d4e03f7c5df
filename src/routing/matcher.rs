//! Dispatch-rule pattern matching.
//!
//! # Responsibilities
//! - Compile express-style patterns (`/`, `/:slug`, `/:year/:month?`, `/files/*`)
//! - Match the remainder of a path beyond a document's own address
//! - Combine a type's rules with OR semantics
//!
//! # Design Decisions
//! - Patterns compiled once at startup
//! - Literal segments match case-insensitively, params are kept verbatim
//! - One trailing slash on the path is tolerated
//! - No regex to guarantee O(n) matching

use thiserror::Error;

/// Errors produced while compiling a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern {0:?} must start with '/'")]
    MissingLeadingSlash(String),

    #[error("pattern {0:?} has a parameter without a name")]
    EmptyParam(String),

    #[error("pattern {0:?} has an invalid parameter name {1:?}")]
    InvalidParam(String, String),

    #[error("pattern {0:?} may only use '*' as its last segment")]
    SplatNotLast(String),
}

/// Trait for matching a path remainder against a condition.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the remainder matches this condition.
    fn matches(&self, remainder: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param { name: String, optional: bool },
    Splat,
}

/// A compiled dispatch pattern.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
}

/// Parameters captured by a successful match, in pattern order.
pub type Params = Vec<(String, String)>;

impl RoutePattern {
    /// Compile a pattern.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let body = pattern
            .strip_prefix('/')
            .ok_or_else(|| PatternError::MissingLeadingSlash(pattern.to_string()))?;

        let raw: Vec<&str> = body.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(raw.len());

        for (i, part) in raw.iter().enumerate() {
            if *part == "*" {
                if i + 1 != raw.len() {
                    return Err(PatternError::SplatNotLast(pattern.to_string()));
                }
                segments.push(Segment::Splat);
            } else if let Some(param) = part.strip_prefix(':') {
                let (name, optional) = match param.strip_suffix('?') {
                    Some(name) => (name, true),
                    None => (param, false),
                };
                if name.is_empty() {
                    return Err(PatternError::EmptyParam(pattern.to_string()));
                }
                if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(PatternError::InvalidParam(
                        pattern.to_string(),
                        name.to_string(),
                    ));
                }
                segments.push(Segment::Param {
                    name: name.to_string(),
                    optional,
                });
            } else {
                segments.push(Segment::Literal(part.to_lowercase()));
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// The pattern as written in configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match a remainder and return the captured parameters.
    ///
    /// The remainder is what follows a document's address: either empty or
    /// starting with '/'.
    pub fn captures(&self, remainder: &str) -> Option<Params> {
        let parts = split_remainder(remainder)?;
        let mut params = Vec::new();
        if match_segments(&self.segments, &parts, &mut params) {
            Some(params)
        } else {
            None
        }
    }
}

impl Matcher for RoutePattern {
    fn matches(&self, remainder: &str) -> bool {
        self.captures(remainder).is_some()
    }
}

/// Matches if any of its patterns match (OR).
#[derive(Debug, Clone, Default)]
pub struct AnyMatcher {
    patterns: Vec<RoutePattern>,
}

impl AnyMatcher {
    pub fn new(patterns: Vec<RoutePattern>) -> Self {
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[RoutePattern] {
        &self.patterns
    }

    /// Parameters from the first pattern, in declaration order, that matches.
    pub fn captures(&self, remainder: &str) -> Option<Params> {
        self.patterns.iter().find_map(|p| p.captures(remainder))
    }
}

impl Matcher for AnyMatcher {
    fn matches(&self, remainder: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(remainder))
    }
}

fn split_remainder(remainder: &str) -> Option<Vec<&str>> {
    if remainder.is_empty() {
        return Some(Vec::new());
    }
    let body = remainder.strip_prefix('/')?;
    let body = body.strip_suffix('/').unwrap_or(body);
    if body.is_empty() {
        return Some(Vec::new());
    }
    let parts: Vec<&str> = body.split('/').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(parts)
}

fn match_segments(pattern: &[Segment], parts: &[&str], params: &mut Params) -> bool {
    let Some((head, tail)) = pattern.split_first() else {
        return parts.is_empty();
    };

    match head {
        Segment::Literal(lit) => match parts.split_first() {
            Some((part, rest)) if part.eq_ignore_ascii_case(lit) => {
                match_segments(tail, rest, params)
            }
            _ => false,
        },
        Segment::Param { name, optional } => {
            if let Some((part, rest)) = parts.split_first() {
                params.push((name.clone(), (*part).to_string()));
                if match_segments(tail, rest, params) {
                    return true;
                }
                params.pop();
            }
            *optional && match_segments(tail, parts, params)
        }
        Segment::Splat => {
            params.push(("*".to_string(), parts.join("/")));
            true
        }
    }
}
