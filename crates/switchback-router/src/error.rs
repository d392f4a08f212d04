//! Registration errors.

use std::fmt;

/// A failure while registering a route.
///
/// All routing failures surface at registration time; lookup itself never
/// fails. A rejected registration leaves routing behavior unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The method string was empty.
    EmptyMethod,
    /// The pattern was empty.
    EmptyPattern,
    /// The pattern did not begin with `/`.
    PatternMustStartWithSlash {
        pattern: String,
    },
    /// A wildcard segment had no name (`:` or `*` followed by `/` or the
    /// end of the pattern).
    EmptyWildcardName {
        pattern: String,
    },
    /// A segment contained more than one wildcard marker, e.g. `/:a:b`.
    InvalidWildcardName {
        pattern: String,
        name: String,
    },
    /// A wildcard used the reserved matched-route key as its name.
    ReservedParamName {
        pattern: String,
    },
    /// A catch-all segment was not the final, whole segment of the pattern.
    CatchAllNotLast {
        pattern: String,
    },
    /// The pattern's wildcard collides with an existing registration at the
    /// same position.
    WildcardConflict {
        pattern: String,
        existing: String,
    },
    /// The exact (method, pattern) pair was already registered.
    DuplicateRoute {
        pattern: String,
    },
    /// The pattern diverges from an existing route in the middle of a
    /// multi-byte character, which the byte-indexed tree cannot represent.
    SplitMidCharacter {
        pattern: String,
        existing: String,
    },
    /// `serve_files` requires the pattern to end with `/*filepath`.
    MissingFilepathWildcard {
        pattern: String,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMethod => write!(f, "method must not be empty"),
            Self::EmptyPattern => write!(f, "pattern must not be empty"),
            Self::PatternMustStartWithSlash { pattern } => {
                write!(f, "pattern must begin with '/': '{pattern}'")
            }
            Self::EmptyWildcardName { pattern } => {
                write!(f, "wildcards must have a non-empty name in '{pattern}'")
            }
            Self::InvalidWildcardName { pattern, name } => {
                write!(
                    f,
                    "only one wildcard per path segment is allowed, has '{name}' in '{pattern}'"
                )
            }
            Self::ReservedParamName { pattern } => {
                write!(
                    f,
                    "'{}' is reserved for matched-route recording in '{pattern}'",
                    crate::params::MATCHED_ROUTE_PATH_PARAM
                )
            }
            Self::CatchAllNotLast { pattern } => {
                write!(
                    f,
                    "catch-alls are only allowed as the final path segment in '{pattern}'"
                )
            }
            Self::WildcardConflict { pattern, existing } => {
                write!(f, "'{pattern}' conflicts with existing route '{existing}'")
            }
            Self::DuplicateRoute { pattern } => {
                write!(f, "a handler is already registered for '{pattern}'")
            }
            Self::SplitMidCharacter { pattern, existing } => {
                write!(
                    f,
                    "'{pattern}' diverges from '{existing}' inside a multi-byte character"
                )
            }
            Self::MissingFilepathWildcard { pattern } => {
                write!(f, "file-serving pattern must end with '/*filepath': '{pattern}'")
            }
        }
    }
}

impl std::error::Error for RouteError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_the_pattern() {
        let err = RouteError::DuplicateRoute {
            pattern: "/user/:name".to_owned(),
        };
        assert!(format!("{err}").contains("/user/:name"));

        let err = RouteError::WildcardConflict {
            pattern: "/user/:id".to_owned(),
            existing: "/user/:name".to_owned(),
        };
        let text = format!("{err}");
        assert!(text.contains("/user/:id"));
        assert!(text.contains("/user/:name"));
    }
}
