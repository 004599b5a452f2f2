//! Merge configuration and the optional TOML settings file.
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_SEPARATOR: &str = "---";
pub const DEFAULT_HEADER: &str = "<!-- Source: {path} -->";
pub const DEFAULT_EXTENSIONS: &[&str] = &["md"];
pub const DEFAULT_EXCLUDES: &[&str] = &[".git", "__pycache__", ".DS_Store"];

/// Where the input files come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Explicit list, merged in the given order.
    Files(Vec<PathBuf>),
    /// Recursive scan, merged in path order.
    Directory(PathBuf),
}

/// How the inputs are filtered and laid out in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Separator line template, `{name}` and `{path}` name the next file.
    pub separator: String,
    /// Write a header line before every file.
    pub headers: bool,
    /// Header line template, same placeholders as `separator`.
    pub header_format: String,
    /// Extensions recognized by directory scans, compared case-insensitively.
    pub extensions: Vec<String>,
    /// File or directory names pruned from directory scans.
    pub exclude: Vec<String>,
    pub skip_empty: bool,
    pub normalize_line_endings: bool,
    pub max_file_size: Option<u64>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            headers: false,
            header_format: DEFAULT_HEADER.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            exclude: DEFAULT_EXCLUDES.iter().map(|e| e.to_string()).collect(),
            skip_empty: true,
            normalize_line_endings: false,
            max_file_size: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub input: InputSource,
    pub output: PathBuf,
    pub separators: bool,
    pub force: bool,
    pub options: MergeOptions,
    /// Draw a progress bar while merging.
    pub progress: bool,
}

impl MergeConfig {
    pub fn new(input: InputSource, output: impl Into<PathBuf>) -> Self {
        Self {
            input,
            output: output.into(),
            separators: true,
            force: false,
            options: MergeOptions::default(),
            progress: false,
        }
    }
}

/// Contents of a settings file. Every key is optional, missing keys keep
/// the defaults and command line flags win over anything set here.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub separator: Option<String>,
    pub separators: Option<bool>,
    pub headers: Option<bool>,
    pub header_format: Option<String>,
    pub extensions: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub skip_empty: Option<bool>,
    pub normalize_line_endings: Option<bool>,
    pub max_file_size: Option<u64>,
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {path:?}"))?;
        Self::parse(&text).with_context(|| format!("invalid config file {path:?}"))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Overlay the values present in this file onto `options`.
    pub fn apply(&self, options: &mut MergeOptions) {
        if let Some(separator) = &self.separator {
            options.separator = separator.clone();
        }
        if let Some(headers) = self.headers {
            options.headers = headers;
        }
        if let Some(format) = &self.header_format {
            options.header_format = format.clone();
        }
        if let Some(extensions) = &self.extensions {
            options.extensions = normalize_extensions(extensions);
        }
        if let Some(exclude) = &self.exclude {
            options.exclude = exclude.clone();
        }
        if let Some(skip_empty) = self.skip_empty {
            options.skip_empty = skip_empty;
        }
        if let Some(normalize) = self.normalize_line_endings {
            options.normalize_line_endings = normalize;
        }
        if self.max_file_size.is_some() {
            options.max_file_size = self.max_file_size;
        }
    }
}

/// Lowercase and strip a leading dot, so `.MD` and `md` mean the same.
pub fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = MergeOptions::default();
        assert_eq!(options.separator, "---");
        assert!(!options.headers);
        assert_eq!(options.header_format, DEFAULT_HEADER);
        assert_eq!(options.extensions, vec!["md".to_string()]);
        assert!(options.skip_empty);
        assert!(!options.normalize_line_endings);
    }

    #[test]
    fn empty_settings_keep_defaults() {
        let settings = Settings::parse("").unwrap();
        let mut options = MergeOptions::default();
        settings.apply(&mut options);
        assert_eq!(options, MergeOptions::default());
    }

    #[test]
    fn settings_override_defaults() {
        let settings = Settings::parse(
            r#"
            separator = "=== {name} ==="
            headers = true
            extensions = [".MD", "txt"]
            exclude = ["target"]
            skip_empty = false
            max_file_size = 1024
            "#,
        )
        .unwrap();
        let mut options = MergeOptions::default();
        settings.apply(&mut options);
        assert_eq!(options.separator, "=== {name} ===");
        assert!(options.headers);
        assert_eq!(options.header_format, DEFAULT_HEADER);
        assert_eq!(options.extensions, vec!["md".to_string(), "txt".to_string()]);
        assert_eq!(options.exclude, vec!["target".to_string()]);
        assert!(!options.skip_empty);
        assert_eq!(options.max_file_size, Some(1024));
    }

    #[test]
    fn header_format_is_kept_while_headers_are_off() {
        let settings = Settings::parse(r##"header_format = "# {name}""##).unwrap();
        let mut options = MergeOptions::default();
        settings.apply(&mut options);
        assert!(!options.headers);
        assert_eq!(options.header_format, "# {name}");
    }

    #[test]
    fn separators_key_is_parsed() {
        let settings = Settings::parse("separators = false").unwrap();
        assert_eq!(settings.separators, Some(false));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::parse("add_toc = true").is_err());
    }
}
