//! Backend identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which storage engine to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BackendKind {
    /// Versioned key-indexed store on `redb`.
    #[default]
    #[serde(rename = "embedded-store")]
    EmbeddedStore,
    /// Private `SQLite` database with image import and export.
    #[serde(rename = "relational")]
    Relational,
}

impl BackendKind {
    /// The external name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmbeddedStore => "embedded-store",
            Self::Relational => "relational",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "embedded-store" => Ok(Self::EmbeddedStore),
            "relational" => Ok(Self::Relational),
            other => Err(ConfigError::InvalidValue {
                var: "backend".into(),
                reason: format!("unknown backend '{other}', expected 'embedded-store' or 'relational'"),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("embedded-store", BackendKind::EmbeddedStore ; "embedded")]
    #[test_case("relational", BackendKind::Relational ; "relational")]
    #[test_case(" relational\n", BackendKind::Relational ; "trimmed")]
    fn test_parse(input: &str, expected: BackendKind) {
        assert_eq!(input.parse::<BackendKind>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "indexeddb".parse::<BackendKind>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_display_matches_serde() {
        for kind in [BackendKind::EmbeddedStore, BackendKind::Relational] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
            assert_eq!(kind.to_string().parse::<BackendKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_default_is_embedded() {
        assert_eq!(BackendKind::default(), BackendKind::EmbeddedStore);
    }
}
