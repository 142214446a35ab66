// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

//! Persistent statistics tables.
//!
//! Four trees live in one embedded database:
//!
//! - `files`: canonical path to [`FileRecord`]
//! - `units`: file id and unit index to [`UnitRecord`]
//! - `checkerconfigs`: checker fingerprint to config id
//! - `uniterrors`: file id, config id and unit index to the unit's check
//!   failures. The entry at [`CHECKED_MARKER`] tells that checks were run for
//!   that file and config.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sled::{Batch, Db, Tree};
use thiserror::Error as TeError;

use super::UnitState;
use super::checks::CheckFailure;

const FILES_TREE: &str = "files";
const UNITS_TREE: &str = "units";
const CHECKER_CONFIGS_TREE: &str = "checkerconfigs";
const UNIT_ERRORS_TREE: &str = "uniterrors";

/// Unit index of the "checks were run" entry in `uniterrors`.
pub const CHECKED_MARKER: u32 = u32::MAX;

#[derive(TeError, Debug)]
pub enum StatsDbError {
    #[error("Stats database error: {0}")]
    Sled(#[from] sled::Error),
    #[error("Fail to encode or decode stats record: {0}")]
    Codec(#[from] bincode::Error),
    #[error("Unit index {0} does not fit the stats database")]
    IndexOverflow(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_id: u64,
    /// Effective modification time in nanoseconds since the epoch.
    pub mtime: u64,
    /// Build of the engine that wrote the records.
    pub engine_build: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub unit_id: String,
    pub state: UnitState,
    pub source_words: u64,
    pub target_words: u64,
    pub blank: bool,
    pub review: bool,
    pub has_suggestion: bool,
    /// Changes whenever this record is rewritten.
    pub revision: u64,
}

pub fn engine_build() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION"))
}

fn unit_key(file_id: u64, index: u32) -> [u8; 12] {
    let mut key = [0u8; 12];
    key[..8].copy_from_slice(&file_id.to_be_bytes());
    key[8..].copy_from_slice(&index.to_be_bytes());
    key
}

fn config_prefix(file_id: u64, config_id: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&file_id.to_be_bytes());
    key[8..].copy_from_slice(&config_id.to_be_bytes());
    key
}

fn error_key(file_id: u64, config_id: u64, index: u32) -> [u8; 20] {
    let mut key = [0u8; 20];
    key[..16].copy_from_slice(&config_prefix(file_id, config_id));
    key[16..].copy_from_slice(&index.to_be_bytes());
    key
}

fn index_of_key(key: &[u8]) -> Option<u32> {
    let tail: [u8; 4] = key.get(key.len().checked_sub(4)?..)?.try_into().ok()?;
    Some(u32::from_be_bytes(tail))
}

pub fn to_db_index(index: usize) -> Result<u32, StatsDbError> {
    u32::try_from(index)
        .ok()
        .filter(|i| *i != CHECKED_MARKER)
        .ok_or(StatsDbError::IndexOverflow(index))
}

/// Handle on the statistics tables. Clones share the same database.
#[derive(Clone)]
pub struct StatsDb {
    db: Db,
    files: Tree,
    units: Tree,
    checker_configs: Tree,
    unit_errors: Tree,
}

impl StatsDb {
    pub fn open(path: &Path) -> Result<Self, StatsDbError> {
        Self::from_db(sled::open(path)?)
    }

    /// A database removed once the last handle is dropped.
    pub fn temporary() -> Result<Self, StatsDbError> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> Result<Self, StatsDbError> {
        Ok(StatsDb {
            files: db.open_tree(FILES_TREE)?,
            units: db.open_tree(UNITS_TREE)?,
            checker_configs: db.open_tree(CHECKER_CONFIGS_TREE)?,
            unit_errors: db.open_tree(UNIT_ERRORS_TREE)?,
            db,
        })
    }

    pub fn flush(&self) -> Result<(), StatsDbError> {
        self.db.flush()?;
        Ok(())
    }

    pub fn next_revision(&self) -> Result<u64, StatsDbError> {
        Ok(self.db.generate_id()?)
    }
}

// ===== Files =====

impl StatsDb {
    pub fn file_record(&self, path: &str) -> Result<Option<FileRecord>, StatsDbError> {
        match self.files.get(path.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Drop everything stored for `path` and register it under a new file id.
    pub fn replace_file(&self, path: &str, mtime: u64) -> Result<FileRecord, StatsDbError> {
        self.remove_file(path)?;
        let record = FileRecord {
            file_id: self.db.generate_id()?,
            mtime,
            engine_build: engine_build().to_string(),
        };
        self.files.insert(path.as_bytes(), bincode::serialize(&record)?)?;
        Ok(record)
    }

    /// Record a new mtime without touching the unit records.
    pub fn touch_file(&self, path: &str, mtime: u64) -> Result<(), StatsDbError> {
        if let Some(mut record) = self.file_record(path)? {
            record.mtime = mtime;
            self.files.insert(path.as_bytes(), bincode::serialize(&record)?)?;
        }
        Ok(())
    }

    pub fn remove_file(&self, path: &str) -> Result<(), StatsDbError> {
        if let Some(record) = self.file_record(path)? {
            remove_prefix(&self.units, &record.file_id.to_be_bytes())?;
            remove_prefix(&self.unit_errors, &record.file_id.to_be_bytes())?;
            self.files.remove(path.as_bytes())?;
        }
        Ok(())
    }
}

fn remove_prefix(tree: &Tree, prefix: &[u8]) -> Result<(), StatsDbError> {
    let mut batch = Batch::default();
    for entry in tree.scan_prefix(prefix).keys() {
        batch.remove(entry?);
    }
    tree.apply_batch(batch)?;
    Ok(())
}

// ===== Units =====

impl StatsDb {
    pub fn put_units(&self, file_id: u64, records: &[(u32, UnitRecord)]) -> Result<(), StatsDbError> {
        let mut batch = Batch::default();
        for (index, record) in records {
            batch.insert(&unit_key(file_id, *index)[..], bincode::serialize(record)?);
        }
        self.units.apply_batch(batch)?;
        Ok(())
    }

    pub fn put_unit(&self, file_id: u64, index: u32, record: &UnitRecord) -> Result<(), StatsDbError> {
        self.units.insert(unit_key(file_id, index), bincode::serialize(record)?)?;
        Ok(())
    }

    pub fn remove_unit(&self, file_id: u64, index: u32) -> Result<(), StatsDbError> {
        self.units.remove(unit_key(file_id, index))?;
        Ok(())
    }

    pub fn unit(&self, file_id: u64, index: u32) -> Result<Option<UnitRecord>, StatsDbError> {
        match self.units.get(unit_key(file_id, index))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Unit records of a file, ordered by index.
    pub fn units(&self, file_id: u64) -> Result<Vec<(u32, UnitRecord)>, StatsDbError> {
        let mut units = Vec::new();
        for entry in self.units.scan_prefix(file_id.to_be_bytes()) {
            let (key, value) = entry?;
            if let Some(index) = index_of_key(&key) {
                units.push((index, bincode::deserialize(&value)?));
            }
        }
        Ok(units)
    }
}

// ===== Checks =====

impl StatsDb {
    /// Config id for a checker fingerprint, registered on first use.
    pub fn config_id(&self, fingerprint: &str) -> Result<u64, StatsDbError> {
        if let Some(bytes) = self.checker_configs.get(fingerprint.as_bytes())? {
            return Ok(bincode::deserialize(&bytes)?);
        }
        let config_id = self.db.generate_id()?;
        let encoded = bincode::serialize(&config_id)?;
        // Another handle may have registered it in the meantime.
        match self
            .checker_configs
            .compare_and_swap(fingerprint.as_bytes(), None as Option<&[u8]>, Some(encoded))?
        {
            Ok(()) => Ok(config_id),
            Err(current) => match current.current {
                Some(bytes) => Ok(bincode::deserialize(&bytes)?),
                None => Ok(config_id),
            },
        }
    }

    /// Store all check failures of a file at once and mark it checked.
    pub fn put_checks(&self, file_id: u64, config_id: u64, failures: &[(u32, Vec<CheckFailure>)]) -> Result<(), StatsDbError> {
        remove_prefix(&self.unit_errors, &config_prefix(file_id, config_id))?;
        let mut batch = Batch::default();
        for (index, unit_failures) in failures.iter().filter(|(_, f)| !f.is_empty()) {
            batch.insert(&error_key(file_id, config_id, *index)[..], bincode::serialize(unit_failures)?);
        }
        let no_failures: Vec<CheckFailure> = Vec::new();
        batch.insert(&error_key(file_id, config_id, CHECKED_MARKER)[..], bincode::serialize(&no_failures)?);
        self.unit_errors.apply_batch(batch)?;
        Ok(())
    }

    /// Replace one unit's failures for `config_id`.
    ///
    /// Results of other configs lose their checked marker, so they get
    /// recomputed on their next use.
    pub fn put_unit_checks(&self, file_id: u64, config_id: u64, index: u32, failures: &[CheckFailure]) -> Result<(), StatsDbError> {
        let mut batch = Batch::default();
        for key in self.unit_errors.scan_prefix(file_id.to_be_bytes()).keys() {
            let key = key?;
            let other_config = key.get(8..16) != Some(&config_id.to_be_bytes()[..]);
            match index_of_key(&key) {
                Some(i) if i == index => batch.remove(key),
                Some(CHECKED_MARKER) if other_config => batch.remove(key),
                _ => {}
            }
        }
        if !failures.is_empty() {
            batch.insert(&error_key(file_id, config_id, index)[..], bincode::serialize(failures)?);
        }
        self.unit_errors.apply_batch(batch)?;
        Ok(())
    }

    /// Stored failures by unit index, `None` when the file was not checked
    /// with this config yet.
    pub fn checks(&self, file_id: u64, config_id: u64) -> Result<Option<Vec<(u32, Vec<CheckFailure>)>>, StatsDbError> {
        if !self.unit_errors.contains_key(error_key(file_id, config_id, CHECKED_MARKER))? {
            return Ok(None);
        }
        let mut checks = Vec::new();
        for entry in self.unit_errors.scan_prefix(config_prefix(file_id, config_id)) {
            let (key, value) = entry?;
            match index_of_key(&key) {
                Some(CHECKED_MARKER) | None => continue,
                Some(index) => checks.push((index, bincode::deserialize(&value)?)),
            }
        }
        Ok(Some(checks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::checks::Severity;

    fn record(unit_id: &str, revision: u64) -> UnitRecord {
        UnitRecord {
            unit_id: unit_id.to_string(),
            state: UnitState::Translated,
            source_words: 1,
            target_words: 1,
            blank: false,
            review: false,
            has_suggestion: false,
            revision,
        }
    }

    fn failure(name: &str) -> CheckFailure {
        CheckFailure {
            name: name.to_string(),
            severity: Severity::Critical,
            message: String::new(),
        }
    }

    #[test]
    fn tst_files_and_units() {
        let db = StatsDb::temporary().unwrap();
        assert_eq!(db.file_record("/a.po").unwrap(), None);

        let first = db.replace_file("/a.po", 10).unwrap();
        db.put_units(first.file_id, &[(1, record("x", 1)), (300, record("y", 2))]).unwrap();
        assert_eq!(db.units(first.file_id).unwrap().len(), 2);
        assert_eq!(db.unit(first.file_id, 300).unwrap().unwrap().unit_id, "y");

        db.touch_file("/a.po", 20).unwrap();
        let touched = db.file_record("/a.po").unwrap().unwrap();
        assert_eq!(touched.mtime, 20);
        assert_eq!(touched.file_id, first.file_id);
        assert_eq!(touched.engine_build, engine_build());

        let second = db.replace_file("/a.po", 30).unwrap();
        assert_ne!(second.file_id, first.file_id);
        assert!(db.units(first.file_id).unwrap().is_empty());

        db.put_unit(second.file_id, 0, &record("z", 3)).unwrap();
        db.remove_unit(second.file_id, 0).unwrap();
        assert!(db.units(second.file_id).unwrap().is_empty());

        db.remove_file("/a.po").unwrap();
        assert_eq!(db.file_record("/a.po").unwrap(), None);
    }

    #[test]
    fn tst_checks_per_config() {
        let db = StatsDb::temporary().unwrap();
        let file = db.replace_file("/b.po", 1).unwrap().file_id;
        let standard = db.config_id("standard:a,b").unwrap();
        let other = db.config_id("standard:a").unwrap();
        assert_ne!(standard, other);
        assert_eq!(db.config_id("standard:a,b").unwrap(), standard);

        assert_eq!(db.checks(file, standard).unwrap(), None);
        db.put_checks(file, standard, &[(2, vec![failure("a")]), (3, vec![])]).unwrap();
        db.put_checks(file, other, &[(2, vec![failure("a")])]).unwrap();
        assert_eq!(db.checks(file, standard).unwrap(), Some(vec![(2, vec![failure("a")])]));

        db.put_unit_checks(file, standard, 2, &[failure("b")]).unwrap();
        db.put_unit_checks(file, standard, 3, &[failure("a")]).unwrap();
        assert_eq!(
            db.checks(file, standard).unwrap(),
            Some(vec![(2, vec![failure("b")]), (3, vec![failure("a")])])
        );
        assert_eq!(db.checks(file, other).unwrap(), None);
    }

    #[test]
    fn tst_index_bounds() {
        assert_eq!(to_db_index(5).unwrap(), 5);
        assert!(to_db_index(u32::MAX as usize).is_err());
    }
}
