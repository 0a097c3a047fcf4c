use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty { field: &'static str },
    InvalidSecret { field: &'static str },
    InvalidPathSegment { field: &'static str, input: String },
    InvalidUrl { input: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::InvalidSecret { field } => write!(f, "{field} is not valid base64"),
            Self::InvalidPathSegment { field, input } => {
                write!(f, "{field} cannot be used as a URL path segment: {input}")
            }
            Self::InvalidUrl { input } => write!(f, "invalid base url: {input}"),
        }
    }
}

impl std::error::Error for ValidationError {}
