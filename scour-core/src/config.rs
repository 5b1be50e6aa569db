//! Configuration management for `scour-core`.
//!
//! This module defines the persisted form of the markup-cleaner allowlist
//! and handles its serialization/deserialization. Handler functions are code,
//! not data: only the allowlist survives a save/load cycle, and the rule
//! table is rebuilt from the built-in defaults on reconstruction.
//!
//! License: MIT OR Apache-2.0

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::errors::ScourError;

/// Baseline allowlist applied when no caller-supplied configuration exists.
///
/// Tag and attribute names are stored lowercase. The baseline is stable:
/// basic text markup, lists, tables, and images, with only the attributes
/// each tag commonly needs.
const DEFAULT_ALLOWED: &[(&str, &[&str])] = &[
    ("a", &["href", "title", "target", "rel"]),
    ("b", &[]),
    ("blockquote", &["cite"]),
    ("br", &[]),
    ("caption", &[]),
    ("code", &[]),
    ("div", &["class"]),
    ("em", &[]),
    ("h1", &[]),
    ("h2", &[]),
    ("h3", &[]),
    ("h4", &[]),
    ("h5", &[]),
    ("h6", &[]),
    ("hr", &[]),
    ("i", &[]),
    ("img", &["src", "alt", "title", "width", "height"]),
    ("li", &[]),
    ("ol", &[]),
    ("p", &[]),
    ("pre", &[]),
    ("span", &["class"]),
    ("strong", &[]),
    ("table", &["summary"]),
    ("tbody", &[]),
    ("td", &["colspan", "rowspan"]),
    ("th", &["colspan", "rowspan", "scope"]),
    ("thead", &[]),
    ("tr", &[]),
    ("u", &[]),
    ("ul", &[]),
];

/// The persisted configuration of a markup cleaner.
///
/// Maps allowed tag names to the set of attribute names preserved on that
/// tag. `BTreeMap`/`BTreeSet` keep the serialized form deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanerConfig {
    pub tags: BTreeMap<String, BTreeSet<String>>,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        let tags = DEFAULT_ALLOWED
            .iter()
            .map(|(tag, attributes)| {
                let attributes = attributes.iter().map(|a| (*a).to_string()).collect();
                ((*tag).to_string(), attributes)
            })
            .collect();
        Self { tags }
    }
}

impl CleanerConfig {
    /// A configuration that allows no markup at all.
    pub fn empty() -> Self {
        Self {
            tags: BTreeMap::new(),
        }
    }

    /// Loads a cleaner configuration from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading cleaner configuration from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: CleanerConfig = serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate()?;
        info!(
            "Loaded {} allowed tags from file {}.",
            config.tags.len(),
            path.display()
        );

        Ok(config.normalized())
    }

    /// Writes the configuration to a YAML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let text = serde_yaml::to_string(self).context("Failed to serialize cleaner configuration")?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        debug!("Saved cleaner configuration to {}.", path.display());
        Ok(())
    }

    /// Validates tag and attribute name integrity.
    ///
    /// Names must be non-empty, start with an ASCII letter, and contain only
    /// ASCII alphanumerics, `-`, `_` or `:`.
    pub fn validate(&self) -> Result<(), ScourError> {
        let mut errors = Vec::new();

        for (tag, attributes) in &self.tags {
            if !is_valid_name(tag) {
                errors.push(format!("Invalid tag name: '{}'.", tag));
            }
            for attribute in attributes {
                if !is_valid_name(attribute) {
                    errors.push(format!(
                        "Tag '{}' has an invalid attribute name: '{}'.",
                        tag, attribute
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ScourError::InvalidConfiguration(errors.join("\n")))
        }
    }

    /// Case-normalizes all tag and attribute names to lowercase.
    pub(crate) fn normalized(self) -> Self {
        let tags = self
            .tags
            .into_iter()
            .map(|(tag, attributes)| {
                let attributes = attributes
                    .into_iter()
                    .map(|a| a.to_ascii_lowercase())
                    .collect();
                (tag.to_ascii_lowercase(), attributes)
            })
            .collect();
        Self { tags }
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
        }
        _ => false,
    }
}
