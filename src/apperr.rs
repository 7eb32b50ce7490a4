// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// A rule carries a pattern the regex engine rejects.
    /// `rule` is a path such as `HLSL/2/4/illegal`.
    InvalidPattern { rule: String, pattern: String, source: regex::Error },
    UnknownLanguage(String),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidPattern { source, .. } => Some(source),
            Error::UnknownLanguage(_) => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPattern { rule, pattern, source } => {
                write!(f, "invalid pattern {pattern:?} in rule {rule}: {source}")
            }
            Error::UnknownLanguage(name) => write!(f, "unknown language: {name}"),
        }
    }
}
