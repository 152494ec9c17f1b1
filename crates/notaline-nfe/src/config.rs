//! Pipeline configuration.

use std::path::PathBuf;

/// Runtime configuration for one collection run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory holding the daily ledger and error files.
    pub log_dir: PathBuf,
    /// Directory XML artifacts are written to.
    pub xml_dir: PathBuf,
    /// Worker pool size for downloads.
    pub workers: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            xml_dir: PathBuf::from("xmls"),
            workers: 15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = RunConfig::default();
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert_eq!(config.xml_dir, PathBuf::from("xmls"));
        assert_eq!(config.workers, 15);
    }
}
