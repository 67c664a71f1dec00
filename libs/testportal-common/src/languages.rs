// Language option set
// Loads the recognized languages from languages.json

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

/// A language name accepted by the execution service, e.g. `python`.
///
/// Only obtainable through a [`LanguageRegistry`], so a held value is always
/// one of the configured options.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageOption {
    pub name: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LanguagesFile {
    languages: Vec<LanguageOption>,
}

/// Registry of configured languages, in selector order.
/// The first entry is the default selection.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    options: Vec<LanguageOption>,
}

impl LanguageRegistry {
    /// Python, Java and C++
    pub fn builtin() -> Self {
        let option = |name: &str, label: &str| LanguageOption {
            name: name.to_string(),
            label: label.to_string(),
        };
        Self {
            options: vec![
                option("python", "Python"),
                option("java", "Java"),
                option("cpp", "C++"),
            ],
        }
    }

    pub fn from_options(options: Vec<LanguageOption>) -> Result<Self> {
        if options.is_empty() {
            bail!("No languages configured");
        }

        let mut seen = HashSet::new();
        for option in &options {
            if option.name.trim().is_empty() {
                bail!("Language name cannot be empty");
            }
            if !seen.insert(option.name.as_str()) {
                bail!("Language '{}' is configured more than once", option.name);
            }
        }

        Ok(Self { options })
    }

    /// Load language configuration from a languages.json file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let file: LanguagesFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Self::from_options(file.languages)
            .with_context(|| format!("Invalid language set in {}", path.display()))
    }

    /// Load from `path` if it exists, otherwise fall back to the built-in set
    pub fn load_or_builtin<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::builtin())
        }
    }

    /// Resolve a user-supplied name against the configured set
    pub fn resolve(&self, name: &str) -> Option<Language> {
        self.options
            .iter()
            .find(|option| option.name == name)
            .map(|option| Language(option.name.clone()))
    }

    pub fn default_language(&self) -> Language {
        // from_options guarantees at least one entry
        Language(self.options[0].name.clone())
    }

    pub fn options(&self) -> &[LanguageOption] {
        &self.options
    }

    pub fn label(&self, language: &Language) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.name == language.0)
            .map(|option| option.label.as_str())
    }
}
