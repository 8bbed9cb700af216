//! XDG Base Directory support.

use std::path::{Path, PathBuf};

/// Directory name under each XDG base.
pub const APP_DIR: &str = "streamchat";

/// XDG directory paths for streamchat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XdgDirs {
    /// Config directory (~/.config/streamchat or XDG_CONFIG_HOME/streamchat)
    pub config: PathBuf,
    /// Data directory (~/.local/share/streamchat or XDG_DATA_HOME/streamchat)
    pub data: PathBuf,
    /// State directory (~/.local/state/streamchat or XDG_STATE_HOME/streamchat)
    pub state: PathBuf,
}

impl XdgDirs {
    /// Get XDG directories, respecting environment variables.
    pub fn new() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::resolve(&home, |key| std::env::var(key).ok())
    }

    /// Resolve against `home`, reading variables through `var`.
    ///
    /// Empty variables count as unset.
    pub fn resolve(home: &Path, var: impl Fn(&str) -> Option<String>) -> Self {
        let base = |key: &str, fallback: &str| {
            var(key)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| home.join(fallback))
                .join(APP_DIR)
        };

        Self {
            config: base("XDG_CONFIG_HOME", ".config"),
            data: base("XDG_DATA_HOME", ".local/share"),
            state: base("XDG_STATE_HOME", ".local/state"),
        }
    }

    /// Ensure all directories exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [&self.config, &self.data, &self.state] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Default config file.
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }

    /// Default export directory.
    pub fn export_dir(&self) -> PathBuf {
        self.data.join("exports")
    }

    /// Log file written while the UI owns the terminal.
    pub fn log_file(&self) -> PathBuf {
        self.state.join("streamchat.log")
    }
}

impl Default for XdgDirs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for XDG directory support.
    //!
    //! Coverage:
    //! - Default directory paths
    //! - Environment variable overrides
    //! - Directory creation

    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    // =========================================================================
    // Test Helpers
    // =========================================================================

    fn resolve_with(home: &Path, vars: &[(&str, &str)]) -> XdgDirs {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        XdgDirs::resolve(home, |key| vars.get(key).cloned())
    }

    // =========================================================================
    // Default Path Tests
    // =========================================================================

    #[test]
    fn test_xdg_dirs_end_with_app_dir() {
        let dirs = XdgDirs::new();
        assert!(dirs.config.ends_with(APP_DIR));
        assert!(dirs.data.ends_with(APP_DIR));
        assert!(dirs.state.ends_with(APP_DIR));
    }

    #[test]
    fn test_defaults_under_home() {
        let home = Path::new("/home/user");
        let dirs = resolve_with(home, &[]);

        assert_eq!(dirs.config, home.join(".config/streamchat"));
        assert_eq!(dirs.data, home.join(".local/share/streamchat"));
        assert_eq!(dirs.state, home.join(".local/state/streamchat"));
    }

    #[test]
    fn test_derived_paths() {
        let dirs = resolve_with(Path::new("/h"), &[]);
        assert_eq!(dirs.config_file(), PathBuf::from("/h/.config/streamchat/config.toml"));
        assert_eq!(dirs.export_dir(), PathBuf::from("/h/.local/share/streamchat/exports"));
        assert_eq!(dirs.log_file(), PathBuf::from("/h/.local/state/streamchat/streamchat.log"));
    }

    // =========================================================================
    // Environment Variable Override Tests
    // =========================================================================

    #[test]
    fn test_all_xdg_vars_override() {
        let dirs = resolve_with(
            Path::new("/home/user"),
            &[
                ("XDG_CONFIG_HOME", "/cfg"),
                ("XDG_DATA_HOME", "/data"),
                ("XDG_STATE_HOME", "/state"),
            ],
        );

        assert_eq!(dirs.config, PathBuf::from("/cfg/streamchat"));
        assert_eq!(dirs.data, PathBuf::from("/data/streamchat"));
        assert_eq!(dirs.state, PathBuf::from("/state/streamchat"));
    }

    #[test]
    fn test_empty_var_is_unset() {
        let home = Path::new("/home/user");
        let dirs = resolve_with(home, &[("XDG_DATA_HOME", "")]);
        assert_eq!(dirs.data, home.join(".local/share/streamchat"));
    }

    // =========================================================================
    // Directory Creation Tests
    // =========================================================================

    #[test]
    fn test_ensure_dirs_creates_all() {
        let temp = TempDir::new().unwrap();
        let dirs = resolve_with(temp.path(), &[]);

        dirs.ensure_dirs().unwrap();

        assert!(dirs.config.is_dir());
        assert!(dirs.data.is_dir());
        assert!(dirs.state.is_dir());
        // Idempotent
        dirs.ensure_dirs().unwrap();
    }
}
