//! Editor settings management
//!
//! Settings are a single JSON file. A missing file means defaults; a file
//! that no longer parses is logged and replaced by defaults in memory.

use crate::Result;
use doc_model::TextDirection;
use docx_import::style_map::{StyleMap, StyleRule};
use docx_import::{ImportOptions, DEFAULT_ENVELOPE_CLASS, DEFAULT_TYPOGRAPHY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";

/// Main settings container
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorSettings {
    /// How DOCX packages are converted
    pub import: ImportSettings,
    /// Editing engine settings
    pub editing: EditingSettings,
}

/// DOCX import settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportSettings {
    /// Envelope direction (`rtl` or `ltr`); `None` leaves it unset
    pub direction: Option<TextDirection>,
    /// CSS font-family list for the envelope
    pub typography: Option<String>,
    pub envelope_class: Option<String>,
    /// Drop paragraphs with no visible text
    pub ignore_empty_paragraphs: bool,
    /// Rules checked before the built-in table, in order
    pub extra_rules: Vec<StyleRule>,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            direction: Some(TextDirection::Rtl),
            typography: Some(DEFAULT_TYPOGRAPHY.to_string()),
            envelope_class: Some(DEFAULT_ENVELOPE_CLASS.to_string()),
            ignore_empty_paragraphs: true,
            extra_rules: Vec::new(),
        }
    }
}

impl ImportSettings {
    /// Build the style map: extra rules first, then the built-in table
    pub fn style_map(&self) -> StyleMap {
        self.extra_rules
            .iter()
            .rev()
            .cloned()
            .fold(StyleMap::default(), StyleMap::prepend_rule)
    }

    pub fn to_options(&self) -> ImportOptions {
        let mut options = ImportOptions::default()
            .with_style_map(self.style_map())
            .with_direction(self.direction)
            .with_typography(self.typography.clone());
        options.envelope_class = self.envelope_class.clone();
        options.ignore_empty_paragraphs = self.ignore_empty_paragraphs;
        options
    }
}

/// Editing engine settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EditingSettings {
    /// Undo steps kept per document; 0 keeps every step
    pub history_limit: usize,
}

impl Default for EditingSettings {
    fn default() -> Self {
        Self { history_limit: 100 }
    }
}

/// Loads, saves and updates editor settings
pub struct SettingsManager {
    /// Path to the settings file
    settings_path: PathBuf,
    /// Current settings (cached)
    current: EditorSettings,
}

impl SettingsManager {
    /// Create a settings manager storing `settings.json` in `data_dir`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self::with_path(data_dir.as_ref().join(SETTINGS_FILE))
    }

    pub fn with_path(settings_path: PathBuf) -> Self {
        Self {
            settings_path,
            current: EditorSettings::default(),
        }
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    pub fn get(&self) -> &EditorSettings {
        &self.current
    }

    /// Load settings from disk, or fall back to defaults
    pub async fn load(&mut self) -> Result<&EditorSettings> {
        self.current = if tokio::fs::try_exists(&self.settings_path).await? {
            let content = tokio::fs::read_to_string(&self.settings_path).await?;
            self.parse_or_default(&content)
        } else {
            EditorSettings::default()
        };
        Ok(&self.current)
    }

    /// Load settings synchronously (for startup paths without a runtime)
    pub fn load_sync(&mut self) -> Result<&EditorSettings> {
        self.current = if self.settings_path.exists() {
            let content = std::fs::read_to_string(&self.settings_path)?;
            self.parse_or_default(&content)
        } else {
            EditorSettings::default()
        };
        Ok(&self.current)
    }

    /// Save current settings to disk
    pub async fn save(&self) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(&self.current)?;
        tokio::fs::write(&self.settings_path, content).await?;
        Ok(())
    }

    /// Replace the settings and persist them
    pub async fn update(&mut self, settings: EditorSettings) -> Result<&EditorSettings> {
        self.current = settings;
        self.save().await?;
        Ok(&self.current)
    }

    /// Restore defaults and persist them
    pub async fn reset(&mut self) -> Result<&EditorSettings> {
        self.update(EditorSettings::default()).await
    }

    fn parse_or_default(&self, content: &str) -> EditorSettings {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!(
                "Failed to parse settings file {}, using defaults: {}",
                self.settings_path.display(),
                e
            );
            EditorSettings::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::Mark;
    use docx_import::style_map::{BlockTarget, SemanticTarget, StyleContext};
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_import_defaults() {
        let options = EditorSettings::default().import.to_options();
        let defaults = ImportOptions::default();
        assert_eq!(options.layout(), defaults.layout());
        assert!(options.ignore_empty_paragraphs);
        assert_eq!(*options.style_map, *defaults.style_map);
    }

    #[test]
    fn test_extra_rules_win_in_order() {
        let settings = ImportSettings {
            extra_rules: vec![
                StyleRule::paragraph("Heading 1", BlockTarget::Heading(3)),
                StyleRule::paragraph("Heading 1", BlockTarget::Heading(4)),
                StyleRule::run("Strong", Mark::Underline),
            ],
            ..ImportSettings::default()
        };
        let map = settings.style_map();

        assert_eq!(
            map.resolve(&StyleContext::paragraph("heading 1")),
            SemanticTarget::Block {
                target: BlockTarget::Heading(3),
                class: None
            }
        );
        assert_eq!(
            map.resolve(&StyleContext::run("Strong")),
            SemanticTarget::Mark(Mark::Underline)
        );
        assert_eq!(map.rules().len(), StyleMap::default().rules().len() + 3);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: EditorSettings =
            serde_json::from_str(r#"{"editing": {"history_limit": 5}}"#).unwrap();
        assert_eq!(settings.editing.history_limit, 5);
        assert_eq!(settings.import, ImportSettings::default());
    }

    #[test]
    fn test_load_sync_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(dir.path());
        assert_eq!(manager.load_sync().unwrap(), &EditorSettings::default());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(dir.path().join("nested"));

        let mut settings = EditorSettings::default();
        settings.import.direction = Some(TextDirection::Ltr);
        settings.import.extra_rules = vec![StyleRule::paragraph_with_class(
            "Clause",
            BlockTarget::Paragraph,
            "clause",
        )];
        settings.editing.history_limit = 20;
        manager.update(settings.clone()).await.unwrap();

        let mut reloaded = SettingsManager::new(dir.path().join("nested"));
        assert_eq!(reloaded.load().await.unwrap(), &settings);
    }

    #[tokio::test]
    async fn test_corrupt_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(dir.path());
        std::fs::write(manager.settings_path(), "{ not json").unwrap();

        assert_eq!(manager.load().await.unwrap(), &EditorSettings::default());
    }
}
