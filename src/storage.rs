use std::fmt::Debug;
use std::fs::OpenOptions;
use std::path::Path;
use std::path::PathBuf;

use crate::utils::error_chain_fmt;

/// One line of the csv file; the first field is always the email
pub type Record = Vec<String>;

#[derive(thiserror::Error)]
pub enum StorageError {
    #[error("could not open {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error in {path:?}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("could not flush {path:?}")]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Debug for StorageError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Append-only flat file, one csv record per line, no header.
///
/// No state is kept between calls: every operation opens the file, does its
/// work and drops the handle before returning (on error too). There is no
/// file locking; see `SubscriptionRegistry` for in-process serialisation.
#[derive(Clone, Debug)]
pub struct CsvStorage {
    path: PathBuf,
}

impl CsvStorage {
    pub fn new(path: PathBuf) -> Self { Self { path } }

    pub fn path(&self) -> &Path { &self.path }

    fn open_error(
        &self,
        source: std::io::Error,
    ) -> StorageError {
        StorageError::Open {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_error(
        &self,
        source: csv::Error,
    ) -> StorageError {
        StorageError::Csv {
            path: self.path.clone(),
            source,
        }
    }

    /// Create the file (with no records) if it does not exist yet. Existing
    /// records are left untouched.
    pub fn ensure_exists(&self) -> Result<(), StorageError> {
        OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| self.open_error(e))?;
        Ok(())
    }

    #[tracing::instrument(name = "Appending record", skip(self, record), fields(path = ?self.path))]
    pub fn append(
        &self,
        record: &[&str],
    ) -> Result<(), StorageError> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| self.open_error(e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file);
        writer
            .write_record(record)
            .map_err(|e| self.csv_error(e))?;
        writer.flush().map_err(|source| StorageError::Flush {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }

    /// All records in file order. A missing file is an error, not an empty
    /// list.
    #[tracing::instrument(name = "Reading all records", skip(self), fields(path = ?self.path))]
    pub fn all_records(&self) -> Result<Vec<Record>, StorageError> {
        let file = OpenOptions::new()
            .read(true)
            .open(&self.path)
            .map_err(|e| self.open_error(e))?;

        csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file)
            .records()
            .map(|r| {
                r.map(|r| r.iter().map(str::to_string).collect())
                    .map_err(|e| self.csv_error(e))
            })
            .collect()
    }
}
