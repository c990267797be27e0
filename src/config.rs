//! Engine configuration, loaded from an optional TOML file.
//!
//! ```toml
//! [trend]
//! window_size_reviews = 20
//!
//! [sources]
//! normalization = "case_insensitive"
//!
//! [directory]
//! order = "rating"
//! recent_reviews = 5
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::directory::RankingOrder;
use crate::metrics::TrendConfig;
use crate::sources::SourceNormalization;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Replaced wholesale when present, so a file can pick either policy.
    #[serde(default = "default_trend")]
    pub trend: TrendConfig,

    #[serde(default)]
    pub sources: SourceConfig,

    #[serde(default)]
    pub directory: DirectoryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trend: default_trend(),
            sources: SourceConfig::default(),
            directory: DirectoryConfig::default(),
        }
    }
}

fn default_trend() -> TrendConfig {
    TrendConfig {
        window_size_reviews: None,
        window_duration_days: Some(30),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub normalization: SourceNormalization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub order: RankingOrder,

    /// Reviews listed on a business page.
    #[serde(default = "default_recent_reviews")]
    pub recent_reviews: usize,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            order: RankingOrder::default(),
            recent_reviews: default_recent_reviews(),
        }
    }
}

fn default_recent_reviews() -> usize {
    5
}

impl EngineConfig {
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse engine configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&contents)
    }

    /// Loads `path` when given, otherwise falls back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Command-line window flags replace the file's trend section as a whole,
    /// so a flag never ends up combined with the other policy from the file.
    pub fn override_trend(&mut self, window_reviews: Option<usize>, window_days: Option<i64>) {
        if window_reviews.is_some() || window_days.is_some() {
            self.trend = TrendConfig {
                window_size_reviews: window_reviews,
                window_duration_days: window_days,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::metrics::TrendWindow;

    #[test]
    fn empty_file_uses_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.directory.recent_reviews, 5);
        assert_eq!(config.sources.normalization, SourceNormalization::Raw);
        assert_eq!(config.directory.order, RankingOrder::Name);
        assert_eq!(config.trend.window().unwrap(), TrendWindow::Days(30));
    }

    #[test]
    fn parses_all_sections() {
        let config = EngineConfig::from_toml(
            r#"
            [trend]
            window_size_reviews = 10

            [sources]
            normalization = "case_insensitive"

            [directory]
            order = "review_count"
            recent_reviews = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.trend.window().unwrap(), TrendWindow::Reviews(10));
        assert_eq!(
            config.sources.normalization,
            SourceNormalization::CaseInsensitive
        );
        assert_eq!(config.directory.order, RankingOrder::ReviewCount);
        assert_eq!(config.directory.recent_reviews, 3);
    }

    #[test]
    fn both_windows_in_file_conflict() {
        let config = EngineConfig::from_toml(
            r#"
            [trend]
            window_size_reviews = 10
            window_duration_days = 30
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.trend.window(),
            Err(EngineError::ConfigConflict(_))
        ));
    }

    #[test]
    fn unknown_trend_keys_are_rejected() {
        assert!(EngineConfig::from_toml("[trend]\nwindow = 3\n").is_err());
    }

    #[test]
    fn cli_window_replaces_file_window() {
        let mut config = EngineConfig::from_toml("[trend]\nwindow_size_reviews = 10\n").unwrap();
        config.override_trend(None, Some(14));
        assert_eq!(config.trend.window().unwrap(), TrendWindow::Days(14));

        config.override_trend(None, None);
        assert_eq!(config.trend.window().unwrap(), TrendWindow::Days(14));
    }
}
