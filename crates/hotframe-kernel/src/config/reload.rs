use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default file extension of a reloadable unit.
pub const DEFAULT_UNIT_EXTENSION: &str = "frame";

/// Reload class-path and policy settings
///
/// ```yaml
/// class_path: ["${APP_HOME}/target/frames"]
/// reloadable_prefixes: ["com.example.app"]
/// exception_prefixes: ["com.example.app.kernel"]
/// unit_extension: frame
/// watch:
///   debounce_ms: 300
///   recursive: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadConfig {
    /// Ordered reload roots; the first root holding a unit wins.
    #[serde(default)]
    pub class_path: Vec<PathBuf>,
    /// Dotted package prefixes eligible for hot reload.
    #[serde(default)]
    pub reloadable_prefixes: Vec<String>,
    /// Prefixes forced back to the stable tier.
    #[serde(default)]
    pub exception_prefixes: Vec<String>,
    #[serde(default = "default_unit_extension")]
    pub unit_extension: String,
    #[serde(default)]
    pub watch: WatchConfig,
}

fn default_unit_extension() -> String {
    DEFAULT_UNIT_EXTENSION.to_string()
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            class_path: Vec::new(),
            reloadable_prefixes: Vec::new(),
            exception_prefixes: Vec::new(),
            unit_extension: default_unit_extension(),
            watch: WatchConfig::default(),
        }
    }
}

impl ReloadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reload root
    pub fn with_class_path_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.class_path.push(root.as_ref().to_path_buf());
        self
    }

    pub fn with_reloadable_prefix(mut self, prefix: &str) -> Self {
        self.reloadable_prefixes.push(prefix.to_string());
        self
    }

    pub fn with_exception_prefix(mut self, prefix: &str) -> Self {
        self.exception_prefixes.push(prefix.to_string());
        self
    }

    pub fn with_unit_extension(mut self, ext: &str) -> Self {
        self.unit_extension = ext.to_string();
        self
    }

    pub fn with_watch(mut self, watch: WatchConfig) -> Self {
        self.watch = watch;
        self
    }

    /// Watch settings with the unit extension applied.
    ///
    /// While `watch.extensions` is left at its default it follows
    /// `unit_extension`; an explicit list is kept as given.
    pub fn effective_watch(&self) -> WatchConfig {
        let mut watch = self.watch.clone();
        if watch.extensions == default_watch_extensions() {
            watch.extensions = vec![self.unit_extension.clone()];
        }
        watch
    }
}

/// Class-path watch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Window in which repeated events for one path collapse into one.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Extensions that trigger a rotation; empty means every file.
    #[serde(default = "default_watch_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_true")]
    pub recursive: bool,
    /// Simple `*suffix`, `prefix*` or exact file-name patterns.
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_watch_extensions() -> Vec<String> {
    vec![DEFAULT_UNIT_EXTENSION.to_string()]
}

fn default_true() -> bool {
    true
}

fn default_ignore_patterns() -> Vec<String> {
    vec!["*.tmp".to_string(), "*.swp".to_string(), "*~".to_string()]
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            extensions: default_watch_extensions(),
            recursive: true,
            ignore_patterns: default_ignore_patterns(),
        }
    }
}

impl WatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn with_debounce(mut self, duration: Duration) -> Self {
        self.debounce_ms = duration.as_millis() as u64;
        self
    }

    pub fn with_extension(mut self, ext: &str) -> Self {
        self.extensions.push(ext.to_string());
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_ignore(mut self, pattern: &str) -> Self {
        self.ignore_patterns.push(pattern.to_string());
        self
    }

    /// Check if a changed path should trigger a rotation
    pub fn should_watch(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !self.extensions.is_empty() && !self.extensions.iter().any(|e| e == ext) {
            return false;
        }

        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        !self.ignore_patterns.iter().any(|pattern| {
            if let Some(suffix) = pattern.strip_prefix('*') {
                file_name.ends_with(suffix)
            } else if let Some(prefix) = pattern.strip_suffix('*') {
                file_name.starts_with(prefix)
            } else {
                file_name == pattern
            }
        })
    }
}
