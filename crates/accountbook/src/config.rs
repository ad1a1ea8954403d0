//! Runtime configuration.

use std::path::PathBuf;

/// Directory name used under the platform data directory.
const APP_DIR: &str = "accountbook";

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory the file backend writes to.
    pub data_dir: PathBuf,
}

impl Config {
    /// Uses `data_dir` when given, otherwise the platform data directory.
    pub fn resolve(data_dir: Option<PathBuf>) -> Self {
        let data_dir = data_dir.unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
        });
        Self { data_dir }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_dir_wins() {
        let config = Config::resolve(Some(PathBuf::from("/srv/accounts")));
        assert_eq!(config.data_dir, PathBuf::from("/srv/accounts"));
    }

    #[test]
    fn test_default_ends_in_app_dir() {
        let config = Config::resolve(None);
        assert!(config.data_dir.ends_with(APP_DIR));
    }
}
