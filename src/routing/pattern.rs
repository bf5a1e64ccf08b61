//! Path template module
//!
//! Compiles templates such as `/users/<int>/items/<int>` and extracts
//! typed parameters from request paths.

use std::fmt;

/// A single compiled template segment
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// Signed 64-bit integer parameter
    Int,
}

/// Template compilation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    MissingLeadingSlash(String),
    UnknownParamType(String),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLeadingSlash(t) => write!(f, "path template must start with '/': {t}"),
            Self::UnknownParamType(p) => write!(f, "unknown path parameter type: {p}"),
        }
    }
}

impl std::error::Error for PatternError {}

/// Compiled path template
///
/// Matching is per segment and exact, so `/items/` and `/items` are
/// different paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    template: String,
    segments: Vec<Segment>,
}

/// Integer parameters extracted from a path, in template order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<i64>);

impl PathParams {
    /// Parameter at `index` (0-based, template order)
    pub fn int(&self, index: usize) -> Option<i64> {
        self.0.get(index).copied()
    }
}

impl PathPattern {
    pub fn parse(template: &str) -> Result<Self, PatternError> {
        let rest = template
            .strip_prefix('/')
            .ok_or_else(|| PatternError::MissingLeadingSlash(template.to_string()))?;

        let segments = rest
            .split('/')
            .map(|seg| match seg {
                "<int>" => Ok(Segment::Int),
                s if s.starts_with('<') && s.ends_with('>') => {
                    Err(PatternError::UnknownParamType(s.to_string()))
                }
                s => Ok(Segment::Literal(s.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Match a request path, returning the extracted parameters
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let rest = path.strip_prefix('/')?;
        let mut parts = rest.split('/');
        let mut params = Vec::new();

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Int => params.push(parse_int(part)?),
            }
        }

        if parts.next().is_some() {
            return None;
        }
        Some(PathParams(params))
    }
}

/// Parse an integer segment; rejects empty, '+'-prefixed and overflowing values
fn parse_int(segment: &str) -> Option<i64> {
    if segment.starts_with('+') {
        return None;
    }
    segment.parse().ok()
}
