// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use hlsl_highlight::highlighter::TokenCategory;
use serde::Deserialize;
use tracing::{debug, warn};

/// The contents of `settings.json`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Where the settings were loaded from, if anywhere.
    #[serde(skip)]
    pub path: Option<PathBuf>,
    /// File extension (`fx`, `.fx` or `*.fx`) to language name.
    pub file_associations: BTreeMap<String, String>,
    /// Category scope to ANSI SGR parameters, e.g. `"comment": "2;32"`.
    pub colors: BTreeMap<String, String>,
}

impl Settings {
    /// Loads `path`, or `settings.json` from the config directory if `path` is `None`.
    ///
    /// A missing file in the config directory yields the defaults.
    /// A missing file that was asked for explicitly is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match settings_json_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        let text = match std::fs::read_to_string(&path) {
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", path.display()));
            }
            Ok(text) => text,
        };

        let mut settings =
            Self::parse(&text).with_context(|| format!("invalid settings in {}", path.display()))?;
        settings.path = Some(path);
        Ok(settings)
    }

    pub fn parse(text: &str) -> serde_json::Result<Self> {
        let settings: Self = serde_json::from_str(text)?;
        for scope in settings.colors.keys() {
            if TokenCategory::from_scope(scope).is_none() {
                warn!(scope = %scope, "ignoring color for unknown category");
            }
        }
        Ok(settings)
    }

    pub fn language_for_extension(&self, ext: &str) -> Option<&str> {
        self.file_associations.iter().find_map(|(key, language)| {
            let key = key.strip_prefix('*').unwrap_or(key);
            let key = key.strip_prefix('.').unwrap_or(key);
            key.eq_ignore_ascii_case(ext).then_some(language.as_str())
        })
    }

    /// The SGR parameters for `category`. Empty means uncolored.
    pub fn color_of(&self, category: TokenCategory) -> &str {
        match self.colors.get(category.as_str()) {
            Some(color) => color.as_str(),
            None => default_color(category),
        }
    }
}

pub fn default_color(category: TokenCategory) -> &'static str {
    match category {
        TokenCategory::Keyword => "95",       // Bright Magenta
        TokenCategory::Type => "94",          // Bright Blue
        TokenCategory::BuiltIn => "93",       // Bright Yellow
        TokenCategory::Literal => "94",       // Bright Blue
        TokenCategory::Number => "92",        // Bright Green
        TokenCategory::String => "91",        // Bright Red
        TokenCategory::Comment => "32",       // Green
        TokenCategory::Meta => "90",          // Bright Black
        TokenCategory::Symbol => "96",        // Bright Cyan
        TokenCategory::TitleFunction => "93", // Bright Yellow
    }
}

fn settings_json_path() -> Option<PathBuf> {
    let mut config_dir = config_dir()?;
    config_dir.push("settings.json");
    Some(config_dir)
}

fn config_dir() -> Option<PathBuf> {
    fn var_path(key: &str) -> Option<PathBuf> {
        std::env::var_os(key).map(PathBuf::from)
    }

    fn push(mut path: PathBuf, suffix: &str) -> PathBuf {
        path.push(suffix);
        path
    }

    #[cfg(target_os = "windows")]
    {
        var_path("APPDATA").map(|p| push(p, "hlsl-highlight"))
    }
    #[cfg(target_os = "macos")]
    {
        var_path("HOME").map(|p| push(p, "Library/Application Support/hlsl-highlight"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        var_path("XDG_CONFIG_HOME")
            .or_else(|| var_path("HOME").map(|p| push(p, ".config")))
            .map(|p| push(p, "hlsl-highlight"))
    }
}
