pub mod settings;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

pub use settings::ProfileStore;

/// Name of the built-in profile that is always present.
pub const DEFAULT_PROFILE_NAME: &str = "Default";

/// Errors raised by the profile store.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Profile {0} is built in and cannot be deleted")]
    BuiltIn(String),

    #[error("Invalid profile name: {0:?}")]
    InvalidName(String),

    #[error("Could not determine config directory")]
    NoConfigDirectory,

    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    #[error("Invalid profile JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A named, reusable bundle of filter settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterProfile {
    pub name: String,
    pub description: String,
    pub ignore_patterns: Vec<String>,
    pub code_extensions: Vec<String>,
    pub ignore_empty_folders: bool,
    pub show_file_size: bool,
    pub show_system_files: bool,
    pub show_only_code_files: bool,
    /// Built-in profiles cannot be deleted.
    pub is_built_in: bool,
}

impl Default for FilterProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            ignore_patterns: Vec::new(),
            code_extensions: Vec::new(),
            ignore_empty_folders: true,
            show_file_size: false,
            show_system_files: false,
            show_only_code_files: false,
            is_built_in: false,
        }
    }
}

impl FilterProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The built-in profile tuned for typical .NET, JVM, web and native projects.
    pub fn built_in_default() -> Self {
        let ignore_patterns = [
            ".git", ".svn", ".hg", ".bzr", "_darcs",
            "bin", "obj", "Debug", "Release", "x64", "x86", "AnyCPU",
            "node_modules", "bower_components", "jspm_packages",
            ".nuget", "packages", ".vscode", ".idea", ".vs",
            "*.tmp", "*.temp", "*.log", "*.cache", "*.bak", "*.swp",
            "Thumbs.db", "desktop.ini", ".DS_Store", ".AppleDouble",
            ".LSOverride", "Icon\r", "$RECYCLE.BIN", "System Volume Information",
            "build", "dist", "out", "target", "coverage", ".gradle",
            ".gradletasknamecache", "gradlew", "gradlew.bat",
            ".mvn", "mvnw", "mvnw.cmd",
            "*.iml", "*.sublime-project", "*.sublime-workspace",
            ".cxx", "captures", "local.properties", "*.apk", "*.aab",
            "*.dll", "*.exe", "*.so", "*.dylib", "*.pdb", "*.xml",
            "*.config", "*.settings", "*.user", "*.suo", "*.userosscache",
        ];
        let code_extensions = [
            ".cs", ".vb", ".fs", ".cpp", ".c", ".h", ".hpp", ".java", ".py",
            ".js", ".ts", ".jsx", ".tsx", ".html", ".css", ".scss", ".sass",
            ".less", ".php", ".rb", ".go", ".rs", ".swift", ".kt", ".scala",
            ".clj", ".cljs", ".edn", ".r", ".m", ".sh", ".sql", ".xml", ".json",
            ".yaml", ".yml", ".toml", ".ini", ".cfg", ".conf", ".properties",
            ".md", ".txt", ".dockerfile", ".gitignore", ".gitattributes",
        ];

        Self {
            name: DEFAULT_PROFILE_NAME.to_string(),
            description: "Default filter for .NET and general development projects".to_string(),
            ignore_patterns: ignore_patterns.iter().map(|p| p.to_string()).collect(),
            code_extensions: code_extensions.iter().map(|e| e.to_string()).collect(),
            is_built_in: true,
            ..Default::default()
        }
    }

    /// Takes a snapshot of the filtering fields for one pass.
    pub fn resolve(&self) -> ResolvedConfig {
        ResolvedConfig {
            ignore_patterns: self.ignore_patterns.clone(),
            code_extensions: self
                .code_extensions
                .iter()
                .filter_map(|e| normalize_extension(e))
                .collect(),
            ignore_empty_folders: self.ignore_empty_folders,
            show_file_size: self.show_file_size,
            show_system_files: self.show_system_files,
            show_only_code_files: self.show_only_code_files,
        }
    }
}

/// Read-only filter settings owned by a single build or render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    pub ignore_patterns: Vec<String>,
    /// Lowercase, each with a leading dot.
    pub code_extensions: BTreeSet<String>,
    pub ignore_empty_folders: bool,
    pub show_file_size: bool,
    pub show_system_files: bool,
    pub show_only_code_files: bool,
}

impl ResolvedConfig {
    pub fn with_code_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.code_extensions = extensions
            .into_iter()
            .filter_map(|e| normalize_extension(e.as_ref()))
            .collect();
        self
    }
}

/// Lowercases an extension and makes sure it starts with a dot.
pub fn normalize_extension(extension: &str) -> Option<String> {
    let trimmed = extension.trim();
    if trimmed.is_empty() || trimmed == "." {
        return None;
    }
    let lower = trimmed.to_lowercase();
    if lower.starts_with('.') {
        Some(lower)
    } else {
        Some(format!(".{lower}"))
    }
}
