use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "wordfall";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join(APP_NAME))
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_local_dir().to_path_buf())
        }
    }

    /// SQLite word corpus
    pub fn words_db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("words.db"))
    }

    /// SQLite high-score board
    pub fn scores_db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("scores.db"))
    }

    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("wordfall_config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_databases_share_a_directory() {
        let words = AppDirs::words_db_path();
        let scores = AppDirs::scores_db_path();
        if let (Some(words), Some(scores)) = (words, scores) {
            assert_eq!(words.parent(), scores.parent());
            assert!(words.ends_with("words.db"));
            assert!(scores.ends_with("scores.db"));
        }
    }
}
