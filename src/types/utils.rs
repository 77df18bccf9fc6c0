//! Shared utility functions for parsing stored values and tolerant iteration.

use crate::types::{LinkType, RenderMode};
use std::fmt::Display;

// =============================================================================
// Type Parsing
// =============================================================================

/// Trait for parsing strings into enum types with a default fallback.
/// Used for deserializing database values where invalid strings should fall back gracefully.
/// Logs a warning when an invalid value is encountered.
pub trait ParseWithDefault: Sized {
    /// The name of this type for logging purposes.
    fn type_name() -> &'static str;

    /// The default value to use when parsing fails.
    fn default_value() -> Self;

    /// Try to parse the string, returning None if invalid.
    fn try_parse(s: &str) -> Option<Self>;

    /// Parse a string into this type, returning a default value if parsing fails.
    /// Logs a warning for invalid values to help detect data corruption.
    fn parse_or_default(s: &str) -> Self {
        match Self::try_parse(s) {
            Some(v) => v,
            None => {
                tracing::warn!("Invalid {} value '{}', using default", Self::type_name(), s);
                Self::default_value()
            }
        }
    }
}

impl ParseWithDefault for LinkType {
    fn type_name() -> &'static str {
        "LinkType"
    }

    fn default_value() -> Self {
        LinkType::LinkedUnexistingPage
    }

    fn try_parse(s: &str) -> Option<Self> {
        match s {
            "L" => Some(LinkType::LinkedPage),
            "W" => Some(LinkType::LinkedUnexistingPage),
            "I" => Some(LinkType::IncludedPage),
            "C" => Some(LinkType::Category),
            _ => None,
        }
    }
}

impl ParseWithDefault for RenderMode {
    fn type_name() -> &'static str {
        "RenderMode"
    }

    fn default_value() -> Self {
        RenderMode::Display
    }

    fn try_parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "display" => Some(RenderMode::Display),
            "export" => Some(RenderMode::Export),
            "publish" => Some(RenderMode::Publish),
            _ => None,
        }
    }
}

/// Filter an iterator of Results, logging errors at debug level before discarding.
///
/// Use this instead of `.filter_map(|r| r.ok())` when you want visibility into
/// what errors are being discarded.
///
/// # Example
/// ```ignore
/// let names: Vec<String> = rows
///     .filter_map(|r| log_filter_error(r, "reading page name"))
///     .collect();
/// ```
pub fn log_filter_error<T, E: Display>(result: Result<T, E>, context: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!("{}: {}", context, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_type_codes_roundtrip_through_parse() {
        for link_type in LinkType::ALL {
            assert_eq!(LinkType::parse_or_default(link_type.code()), link_type);
        }
    }

    #[test]
    fn test_parse_or_default_falls_back() {
        assert_eq!(LinkType::parse_or_default("?"), LinkType::LinkedUnexistingPage);
        assert_eq!(RenderMode::parse_or_default("EXPORT"), RenderMode::Export);
        assert_eq!(RenderMode::parse_or_default("print"), RenderMode::Display);
    }

    #[test]
    fn test_log_filter_error() {
        let ok: Result<u8, String> = Ok(1);
        let err: Result<u8, String> = Err("bad row".to_string());
        assert_eq!(log_filter_error(ok, "test"), Some(1));
        assert_eq!(log_filter_error(err, "test"), None);
    }
}
