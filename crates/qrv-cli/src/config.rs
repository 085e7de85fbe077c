use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where QRV keeps its persisted state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub data_dir: PathBuf,
}

impl Config {
    /// Resolve the data directory: an explicit override wins, otherwise the
    /// platform data directory, otherwise a dot directory in the working
    /// directory.
    pub fn resolve(override_dir: Option<PathBuf>) -> Self {
        match override_dir {
            Some(data_dir) => Self { data_dir },
            None => Self::default(),
        }
    }

    /// Root of the image blob container.
    pub fn blob_root(&self) -> PathBuf {
        self.data_dir.join("images")
    }

    /// Root of the metadata key-value store.
    pub fn ledger_root(&self) -> PathBuf {
        self.data_dir.join("meta")
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|dir| dir.join("qrv"))
            .unwrap_or_else(|| PathBuf::from(".qrv"));
        Self { data_dir }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_data_dir_is_named_for_the_tool() {
        let config = Config::default();
        assert!(config.data_dir.ends_with("qrv") || config.data_dir.ends_with(".qrv"));
    }

    #[test]
    fn override_wins() {
        let config = Config::resolve(Some(PathBuf::from("/tmp/custom")));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/custom"));
        assert_eq!(config.blob_root(), PathBuf::from("/tmp/custom/images"));
        assert_eq!(config.ledger_root(), PathBuf::from("/tmp/custom/meta"));
    }

    #[test]
    fn no_override_uses_the_default() {
        let config = Config::resolve(None);
        assert_eq!(config.data_dir, Config::default().data_dir);
    }
}
