//! Domain types for the ingestion pipeline.
//!
//! String-backed enums shared between the storage layer and the services.
//! Both are stored as TEXT columns, so parsing is lenient and never fails.

pub mod events;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a canonical media entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MediaKind {
    Movie,
    SeriesEpisode,
    #[default]
    Unknown,
}

impl MediaKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::SeriesEpisode => "series_episode",
            Self::Unknown => "unknown",
        }
    }

    /// Unrecognized values map to `Unknown` rather than failing; the column
    /// is free text as far as sqlite is concerned.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "movie" => Self::Movie,
            "series_episode" => Self::SeriesEpisode,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MediaKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MediaKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

/// Lifecycle of an import job row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportStatus {
    Processing,
    Completed,
    Partial,
    Failed,
}

impl ImportStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "completed" => Self::Completed,
            "partial" => Self::Partial,
            "failed" => Self::Failed,
            _ => Self::Processing,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing)
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ImportStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ImportStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_round_trip() {
        for kind in [MediaKind::Movie, MediaKind::SeriesEpisode, MediaKind::Unknown] {
            assert_eq!(MediaKind::parse(kind.as_str()), kind);
        }
    }

    #[test]
    fn media_kind_lenient_parse() {
        assert_eq!(MediaKind::parse("tv_series"), MediaKind::Unknown);
        assert_eq!(MediaKind::parse(""), MediaKind::Unknown);
    }

    #[test]
    fn media_kind_serialization() {
        let json = serde_json::to_string(&MediaKind::SeriesEpisode).unwrap();
        assert_eq!(json, "\"series_episode\"");
        let parsed: MediaKind = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, MediaKind::SeriesEpisode);
    }

    #[test]
    fn import_status_terminal() {
        assert!(!ImportStatus::Processing.is_terminal());
        assert!(ImportStatus::Partial.is_terminal());
        assert_eq!(ImportStatus::parse("partial"), ImportStatus::Partial);
    }
}
