use std::{fs, path::Path};

use serde::Deserialize;

use crate::{
    transaction::Snapshot,
    util::{Result, Status},
};

#[derive(Clone, Debug, Default)]
pub struct WriteOptions {
    /// Accepted for API compatibility; the in-memory engine has nothing to
    /// sync.
    pub sync: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ReadOptions {
    /// Read at this snapshot instead of the latest committed state.
    pub snapshot: Option<Snapshot>,
    /// Overrides [`DBOptions::verify_checksums`] for this read.
    pub verify_checksums: Option<bool>,
}

impl ReadOptions {
    pub fn at(snapshot: &Snapshot) -> Self {
        ReadOptions {
            snapshot: Some(snapshot.clone()),
            verify_checksums: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DBOptions {
    /// Check every value's CRC32 on read
    pub verify_checksums: bool,
    /// Upper bound on simultaneously pinned views (snapshots, cursors and
    /// read transactions). None = unlimited
    pub max_live_views: Option<usize>,
}

impl Default for DBOptions {
    fn default() -> Self {
        DBOptions {
            verify_checksums: true,
            max_live_views: None,
        }
    }
}

impl DBOptions {
    /// Parses options from JSON. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: DBOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Status::io_error(format!(
                "Failed to read options file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_live_views == Some(0) {
            return Err(Status::invalid_argument(
                "max_live_views must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_defaults() {
        let options = DBOptions::default();
        assert!(options.verify_checksums);
        assert_eq!(options.max_live_views, None);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let options = DBOptions::from_json_str(r#"{ "max_live_views": 8 }"#).unwrap();
        assert_eq!(options.max_live_views, Some(8));
        assert!(options.verify_checksums);
    }

    #[test]
    fn test_from_json_rejects_unknown_and_invalid() {
        let err = DBOptions::from_json_str(r#"{ "max_views": 8 }"#).unwrap_err();
        assert_eq!(err.code(), &crate::util::Code::InvalidArgument);

        assert!(DBOptions::from_json_str(r#"{ "max_live_views": 0 }"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "verify_checksums": false }}"#).unwrap();

        let options = DBOptions::from_file(file.path()).unwrap();
        assert!(!options.verify_checksums);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DBOptions::from_file(dir.path().join("absent.json")).unwrap_err();
        assert!(err.is_io_error());
    }
}
