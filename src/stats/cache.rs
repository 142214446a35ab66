// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

//! Translation statistics cache.
//!
//! Results are kept in the [`StatsDb`] keyed by canonical path, and trusted
//! as long as the file's effective modification time (the newer of the file
//! and its pending file) and the engine build did not change. A small LRU
//! front cache in each handle avoids decoding records twice.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use lru::LruCache;
use thiserror::Error as TeError;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::checks::{CheckFailure, TeeChecker};
use super::classify::{BucketMap, buckets_for, classify_unit};
use super::db::{FileRecord, StatsDb, StatsDbError, UnitRecord, engine_build, to_db_index};
use super::wordcount::words_in_unit;
use super::{Totals, UnitState, UnitStats};
use crate::config::{Config, FrontCacheConfig};
use crate::i18n_file::common::{I18nFileKind, StoreLoadError, TranslationStore, TranslationUnit};
use crate::i18n_file::gettext::PoLoadError;
use crate::translation_file::{
    TranslationFile, TranslationFileError, UnitUpdate, UpdateContext, load_pending, pending_path, suggestion_flags,
};

#[derive(TeError, Debug)]
pub enum StatsCacheError {
    #[error(transparent)]
    Db(#[from] StatsDbError),
    #[error("Fail to read modification time of {0:?}: {1}")]
    Metadata(PathBuf, #[source] std::io::Error),
    #[error(transparent)]
    Load(#[from] StoreLoadError),
    #[error("Fail to load suggestions of {0:?}: {1}")]
    LoadPending(PathBuf, #[source] PoLoadError),
}

/// Resolve symlinks. A file that is gone keeps the key it had while its
/// directory still resolves.
fn canonical_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
    if let (Some(parent), Some(name)) = (parent, path.file_name()) {
        if let Ok(parent) = fs::canonicalize(parent) {
            return parent.join(name);
        }
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub(crate) fn mtime_ns(path: &Path) -> std::io::Result<u64> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0))
}

/// The newer modification time of `path` and its pending file.
pub fn effective_mtime(path: &Path) -> std::io::Result<u64> {
    let main = mtime_ns(path)?;
    let pending = mtime_ns(&pending_path(path)).unwrap_or(0);
    Ok(main.max(pending))
}

#[derive(Debug, Clone)]
struct FrontEntry {
    mtime: u64,
    totals: Option<Totals>,
    /// Checker fingerprint and the buckets computed with it.
    buckets: Option<(String, BucketMap)>,
    units: Option<Vec<UnitStats>>,
}

impl FrontEntry {
    fn new(mtime: u64) -> Self {
        FrontEntry { mtime, totals: None, buckets: None, units: None }
    }
}

pub struct StatsCache {
    db: StatsDb,
    front: LruCache<PathBuf, FrontEntry>,
    capacity: usize,
    cull_frequency: usize,
    recomputes: u64,
}

impl StatsCache {
    pub fn new(db: StatsDb, front_cache: &FrontCacheConfig) -> Self {
        StatsCache {
            db,
            front: LruCache::unbounded(),
            capacity: front_cache.capacity,
            cull_frequency: front_cache.cull_frequency.max(1),
            recomputes: 0,
        }
    }

    pub fn open(db_path: &Path, front_cache: &FrontCacheConfig) -> Result<Self, StatsCacheError> {
        Ok(Self::new(StatsDb::open(db_path)?, front_cache))
    }

    pub fn from_config(config: &Config) -> Result<Self, StatsCacheError> {
        Self::open(&config.stats_db_path, &config.front_cache)
    }

    /// A cache over a throwaway database.
    pub fn temporary(front_cache: &FrontCacheConfig) -> Result<Self, StatsCacheError> {
        Ok(Self::new(StatsDb::temporary()?, front_cache))
    }

    /// Another handle on the same database with its own front cache, for use
    /// from another thread.
    pub fn worker(&self) -> Self {
        StatsCache {
            db: self.db.clone(),
            front: LruCache::unbounded(),
            capacity: self.capacity,
            cull_frequency: self.cull_frequency,
            recomputes: 0,
        }
    }

    pub fn db(&self) -> &StatsDb {
        &self.db
    }

    /// How many times this handle parsed a file to rebuild its records.
    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }

    pub fn flush(&self) -> Result<(), StatsCacheError> {
        Ok(self.db.flush()?)
    }

    /// Drop everything known about `path`.
    pub fn forget(&mut self, path: &Path) {
        let path = canonical_path(path);
        self.front.pop(&path);
        if let Err(err) = self.db.remove_file(&path_key(&path)) {
            warn!("Fail to drop cached statistics of {path:?}: {err}");
        }
    }
}

// ===== Front cache =====

impl StatsCache {
    fn front_entry(&mut self, path: &Path, mtime: u64) -> &mut FrontEntry {
        if self.front.peek(path).is_some_and(|entry| entry.mtime != mtime) {
            self.front.pop(path);
        }
        if !self.front.contains(path) {
            self.cull();
        }
        self.front.get_or_insert_mut(path.to_path_buf(), || FrontEntry::new(mtime))
    }

    fn fresh_front(&mut self, path: &Path, mtime: u64) -> Option<&FrontEntry> {
        self.front.get(path).filter(|entry| entry.mtime == mtime)
    }

    fn cull(&mut self) {
        if self.front.len() < self.capacity {
            return;
        }
        let count = (self.capacity / self.cull_frequency).max(1);
        for _ in 0..count {
            self.front.pop_lru();
        }
        debug!("Culled {count} front cache entries");
    }
}

// ===== Stored records =====

impl StatsCache {
    fn unit_record(&self, unit: &dyn TranslationUnit, has_suggestion: bool) -> Result<UnitRecord, StatsDbError> {
        let (source_words, target_words) = words_in_unit(unit);
        Ok(UnitRecord {
            unit_id: unit.unit_id(),
            state: UnitState::of(unit),
            source_words,
            target_words,
            blank: !unit.has_target(),
            review: unit.is_review(),
            has_suggestion,
            revision: self.db.next_revision()?,
        })
    }

    /// Parse the file and replace all its records.
    fn store_file(&mut self, key: &str, path: &Path, mtime: u64) -> Result<FileRecord, StatsCacheError> {
        self.recomputes += 1;
        info!("Computing statistics of {path:?}");
        let store = TranslationStore::load_file(path)?;
        let pending = load_pending(path).map_err(|e| StatsCacheError::LoadPending(path.to_path_buf(), e))?;
        let flags = suggestion_flags(&store, pending.as_ref());
        let record = self.db.replace_file(key, mtime)?;
        let mut records = Vec::new();
        for (index, unit) in store.units().into_iter().enumerate() {
            if unit.is_translatable() {
                records.push((to_db_index(index)?, self.unit_record(unit, flags[index])?));
            }
        }
        self.db.put_units(record.file_id, &records)?;
        Ok(record)
    }

    /// The file's record, rebuilt first when stale.
    fn fresh_record(&mut self, path: &Path, mtime: u64) -> Result<FileRecord, StatsCacheError> {
        let key = path_key(path);
        match self.db.file_record(&key)? {
            Some(record) if record.mtime == mtime && record.engine_build == engine_build() => {
                debug!("Stored statistics of {path:?} are fresh");
                Ok(record)
            }
            _ => self.store_file(&key, path, mtime),
        }
    }

    fn resolve(path: &Path) -> Result<(PathBuf, u64), StatsCacheError> {
        let path = canonical_path(path);
        let mtime = effective_mtime(&path).map_err(|e| StatsCacheError::Metadata(path.clone(), e))?;
        Ok((path, mtime))
    }

    fn run_checks(
        &mut self,
        path: &Path,
        record: &FileRecord,
        config_id: u64,
        checker: &TeeChecker,
    ) -> Result<Vec<(u32, Vec<CheckFailure>)>, StatsCacheError> {
        info!("Running checks on {path:?}");
        let store = TranslationStore::load_file(path)?;
        let mut checks = Vec::new();
        for (index, unit) in store.units().into_iter().enumerate() {
            if !unit.is_translatable() {
                continue;
            }
            let failures = checker.run_filters(unit);
            if !failures.is_empty() {
                checks.push((to_db_index(index)?, failures));
            }
        }
        self.db.put_checks(record.file_id, config_id, &checks)?;
        Ok(checks)
    }

    /// Bring the stored records of a file up to date. Called before a file is
    /// edited, so that a later [`StatsCache::recache_unit`] does not hide
    /// changes made since the last computation.
    pub fn refresh(&mut self, path: &Path) -> Result<(), StatsCacheError> {
        let (path, mtime) = Self::resolve(path)?;
        self.fresh_record(&path, mtime)?;
        Ok(())
    }

    /// Stored unit records of a file, by index.
    pub fn stored_units(&mut self, path: &Path) -> Result<Vec<(u32, UnitRecord)>, StatsCacheError> {
        let (path, mtime) = Self::resolve(path)?;
        let record = self.fresh_record(&path, mtime)?;
        Ok(self.db.units(record.file_id)?)
    }
}

// ===== Queries =====

impl StatsCache {
    pub fn try_file_totals(&mut self, path: &Path) -> Result<Totals, StatsCacheError> {
        let (path, mtime) = Self::resolve(path)?;
        if let Some(totals) = self.fresh_front(&path, mtime).and_then(|entry| entry.totals.clone()) {
            return Ok(totals);
        }
        let record = self.fresh_record(&path, mtime)?;
        let mut totals = Totals::new();
        for (_, unit) in self.db.units(record.file_id)? {
            totals.add_unit(unit.state, unit.source_words, unit.target_words);
        }
        self.front_entry(&path, mtime).totals = Some(totals.clone());
        Ok(totals)
    }

    /// Totals of one file. A file that can not be read or parsed counts as
    /// empty and its stored records are dropped.
    pub fn file_totals(&mut self, path: &Path) -> Totals {
        self.try_file_totals(path).unwrap_or_else(|err| {
            warn!("Counting {path:?} as empty: {err}");
            self.forget(path);
            Totals::new()
        })
    }

    pub fn try_unit_stats(&mut self, path: &Path) -> Result<Vec<UnitStats>, StatsCacheError> {
        let (path, mtime) = Self::resolve(path)?;
        if let Some(units) = self.fresh_front(&path, mtime).and_then(|entry| entry.units.clone()) {
            return Ok(units);
        }
        let record = self.fresh_record(&path, mtime)?;
        let units: Vec<UnitStats> = self.db.units(record.file_id)?
            .into_iter()
            .map(|(index, unit)| UnitStats {
                index: index as usize,
                unit_id: unit.unit_id,
                state: unit.state,
                source_words: unit.source_words,
                target_words: unit.target_words,
            })
            .collect();
        self.front_entry(&path, mtime).units = Some(units.clone());
        Ok(units)
    }

    pub fn unit_stats(&mut self, path: &Path) -> Vec<UnitStats> {
        self.try_unit_stats(path).unwrap_or_else(|err| {
            warn!("No unit statistics for {path:?}: {err}");
            self.forget(path);
            Vec::new()
        })
    }

    /// Bucket map of a file. Check results are stored per checker
    /// configuration and only computed on first request.
    pub fn try_file_stats(&mut self, path: &Path, checker: &TeeChecker) -> Result<BucketMap, StatsCacheError> {
        let (path, mtime) = Self::resolve(path)?;
        let fingerprint = checker.fingerprint();
        let cached = self.fresh_front(&path, mtime).and_then(|entry| {
            entry.buckets.as_ref()
                .filter(|(stored, _)| *stored == fingerprint)
                .map(|(_, map)| map.clone())
        });
        if let Some(map) = cached {
            return Ok(map);
        }

        let record = self.fresh_record(&path, mtime)?;
        let config_id = self.db.config_id(&fingerprint)?;
        let checks = match self.db.checks(record.file_id, config_id)? {
            Some(checks) => checks,
            None => self.run_checks(&path, &record, config_id, checker)?,
        };
        let failures: HashMap<u32, Vec<CheckFailure>> = checks.into_iter().collect();
        let units = self.db.units(record.file_id)?;
        let map = BucketMap::build(units.iter().map(|(index, unit)| {
            let unit_failures = failures.get(index).map(Vec::as_slice).unwrap_or_default();
            let buckets = buckets_for(
                unit.state == UnitState::Fuzzy,
                unit.blank,
                unit.review,
                unit.has_suggestion,
                unit_failures,
            );
            (*index as usize, buckets)
        }));
        self.front_entry(&path, mtime).buckets = Some((fingerprint, map.clone()));
        Ok(map)
    }

    pub fn file_stats(&mut self, path: &Path, checker: &TeeChecker) -> BucketMap {
        self.try_file_stats(path, checker).unwrap_or_else(|err| {
            warn!("No bucket statistics for {path:?}: {err}");
            self.forget(path);
            BucketMap::new()
        })
    }

    /// Totals of every translation file under `dir`, sorted by path.
    pub fn directory_file_totals(&mut self, dir: &Path) -> Vec<(PathBuf, Totals)> {
        let mut result = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable entry under {dir:?}: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_file() || I18nFileKind::from_ext_hint(entry.path()).is_err() {
                continue;
            }
            let totals = self.file_totals(entry.path());
            result.push((entry.into_path(), totals));
        }
        result
    }

    pub fn directory_totals(&mut self, dir: &Path) -> Totals {
        let mut totals = Totals::new();
        for (_, file_totals) in self.directory_file_totals(dir) {
            totals += &file_totals;
        }
        totals
    }

    /// Totals of a file, or the sum over a directory.
    pub fn stats(&mut self, path: &Path) -> Totals {
        if path.is_dir() {
            self.directory_totals(path)
        } else {
            self.file_totals(path)
        }
    }
}

// ===== Unit edits =====

impl StatsCache {
    /// Refresh the records of one edited unit after its file was saved.
    ///
    /// Other units keep their records. A file without records is recomputed
    /// as a whole. Returns the unit's new buckets.
    pub fn recache_unit(
        &mut self,
        path: &Path,
        index: usize,
        unit: &dyn TranslationUnit,
        has_suggestion: bool,
        checker: &TeeChecker,
    ) -> Result<BTreeSet<String>, StatsCacheError> {
        let (path, mtime) = Self::resolve(path)?;
        let key = path_key(&path);
        self.front.pop(&path);
        let classification = if unit.is_translatable() {
            classify_unit(unit, checker, has_suggestion)
        } else {
            Default::default()
        };

        let record = match self.db.file_record(&key)? {
            Some(record) if record.engine_build == engine_build() => record,
            _ => {
                self.store_file(&key, &path, mtime)?;
                return Ok(classification.buckets);
            }
        };
        let db_index = to_db_index(index)?;
        self.db.touch_file(&key, mtime)?;
        if unit.is_translatable() {
            let unit_record = self.unit_record(unit, has_suggestion)?;
            self.db.put_unit(record.file_id, db_index, &unit_record)?;
        } else {
            self.db.remove_unit(record.file_id, db_index)?;
        }
        let config_id = self.db.config_id(&checker.fingerprint())?;
        self.db.put_unit_checks(record.file_id, config_id, db_index, &classification.failures)?;
        debug!("Recached unit {index} of {path:?}");
        Ok(classification.buckets)
    }

    /// Edit one unit of the file at `path`, see [`TranslationFile::update_unit`].
    pub fn update_unit(
        &mut self,
        path: &Path,
        index: usize,
        update: &UnitUpdate,
        context: &UpdateContext,
        checker: &TeeChecker,
    ) -> Result<BTreeSet<String>, TranslationFileError> {
        let mut file = TranslationFile::open(path)?;
        file.update_unit(index, update, context, self, checker)
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::time::{Duration, SystemTime};

    use super::*;
    use crate::i18n_file::gettext::tests::TEST_THREE_UNITS_PO_CONTENT;
    use crate::i18n_file::xliff::tests::TEST_DE_XLIFF_CONTENT;
    use crate::stats::classify::{BUCKET_FUZZY, BUCKET_REVIEW, BUCKET_TOTAL};

    fn setup(content: &str) -> (tempfile::TempDir, PathBuf, StatsCache) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nl.po");
        fs::write(&path, content).unwrap();
        let cache = StatsCache::temporary(&FrontCacheConfig::default()).unwrap();
        (dir, path, cache)
    }

    fn set_mtime(path: &Path, secs: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs)).unwrap();
    }

    #[test]
    fn tst_three_unit_totals() {
        let (_dir, path, mut cache) = setup(TEST_THREE_UNITS_PO_CONTENT);
        let totals = cache.file_totals(&path);
        assert_eq!(totals.translated.units, 1);
        assert_eq!(totals.fuzzy.units, 1);
        assert_eq!(totals.untranslated.units, 1);
        assert_eq!(totals.translated.source_words, 1);
        assert_eq!(totals.translated.target_words, 1);
        assert_eq!(totals.fuzzy.target_words, 0);
        assert_eq!(totals.total_units(), 3);

        let units = cache.unit_stats(&path);
        let indices: Vec<usize> = units.iter().map(|unit| unit.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(units[1].state, UnitState::Fuzzy);
    }

    #[test]
    fn tst_recompute_only_when_stale() {
        let (_dir, path, mut cache) = setup(TEST_THREE_UNITS_PO_CONTENT);
        set_mtime(&path, 1_000_000);
        let first = cache.file_totals(&path);
        assert_eq!(cache.recompute_count(), 1);
        assert_eq!(cache.file_totals(&path), first);
        assert_eq!(cache.recompute_count(), 1);

        // A fresh handle reads the stored records without parsing.
        let mut worker = cache.worker();
        assert_eq!(worker.file_totals(&path), first);
        assert_eq!(worker.recompute_count(), 0);

        set_mtime(&path, 2_000_000);
        assert_eq!(cache.file_totals(&path), first);
        assert_eq!(cache.recompute_count(), 2);
        cache.file_totals(&path);
        assert_eq!(cache.recompute_count(), 2);

        // A newer pending file makes the stored records stale too.
        fs::write(pending_path(&path), "").unwrap();
        cache.file_totals(&path);
        assert_eq!(cache.recompute_count(), 3);
    }

    #[test]
    fn tst_unit_edit_keeps_other_records() {
        let (_dir, path, mut cache) = setup(TEST_THREE_UNITS_PO_CONTENT);
        let checker = TeeChecker::standard();
        cache.file_totals(&path);
        let before = cache.stored_units(&path).unwrap();

        let update = UnitUpdate {
            target: Some(vec!["stoel".to_string()]),
            ..Default::default()
        };
        let buckets = cache.update_unit(&path, 3, &update, &UpdateContext::default(), &checker).unwrap();
        assert!(buckets.contains("translated"));

        let after = cache.stored_units(&path).unwrap();
        assert_eq!(cache.recompute_count(), 1);
        assert_eq!(before[0], after[0]);
        assert_eq!(before[1], after[1]);
        assert_ne!(before[2].1.revision, after[2].1.revision);
        assert_eq!(after[2].1.state, UnitState::Translated);
        assert_eq!(cache.file_totals(&path).translated.units, 2);
        assert_eq!(cache.recompute_count(), 1);
    }

    #[test]
    fn tst_edit_updates_stored_checks() {
        let (_dir, path, mut cache) = setup(TEST_THREE_UNITS_PO_CONTENT);
        let checker = TeeChecker::standard();
        assert_eq!(cache.file_stats(&path, &checker).get(BUCKET_FUZZY), &[2]);

        let update = UnitUpdate {
            target: Some(vec!["stoel %s".to_string()]),
            fuzzy: Some(true),
            ..Default::default()
        };
        cache.update_unit(&path, 3, &update, &UpdateContext::default(), &checker).unwrap();
        let map = cache.file_stats(&path, &checker);
        assert_eq!(map.get(BUCKET_FUZZY), &[2, 3]);
        assert_eq!(map.get("check-variables"), &[3]);
        assert_eq!(map.get(BUCKET_TOTAL), &[1, 2, 3]);
        assert_eq!(cache.recompute_count(), 1);
    }

    #[test]
    fn tst_deleted_file_counts_zero() {
        let (_dir, path, mut cache) = setup(TEST_THREE_UNITS_PO_CONTENT);
        cache.file_totals(&path);
        let key = path_key(&canonical_path(&path));
        assert!(cache.db().file_record(&key).unwrap().is_some());

        fs::remove_file(&path).unwrap();
        assert_eq!(cache.file_totals(&path), Totals::new());
        assert!(cache.db().file_record(&key).unwrap().is_none());
        assert!(cache.unit_stats(&path).is_empty());
    }

    #[test]
    fn tst_directory_totals() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("de");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("nl.po"), TEST_THREE_UNITS_PO_CONTENT).unwrap();
        fs::write(dir.path().join("nl.po.pending"), TEST_THREE_UNITS_PO_CONTENT).unwrap();
        fs::write(dir.path().join("broken.po"), "msgid \"a\"\nmsgstr \"unterminated\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "msgid \"a\"\n").unwrap();
        fs::write(nested.join("de.xlf"), TEST_DE_XLIFF_CONTENT).unwrap();

        let mut cache = StatsCache::temporary(&FrontCacheConfig::default()).unwrap();
        let files = cache.directory_file_totals(dir.path());
        let names: Vec<String> = files.iter()
            .map(|(path, _)| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["broken.po", "de.xlf", "nl.po"]);
        assert_eq!(files[0].1, Totals::new());

        let totals = cache.stats(dir.path());
        assert_eq!(totals.total_units(), 6);
        assert_eq!(totals.translated.units, 2);
        assert_eq!(totals.fuzzy.units, 2);
        assert_eq!(totals.untranslated.units, 2);
    }

    #[test]
    fn tst_xliff_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("de.xlf");
        fs::write(&path, TEST_DE_XLIFF_CONTENT).unwrap();
        let mut cache = StatsCache::temporary(&FrontCacheConfig::default()).unwrap();
        let map = cache.file_stats(&path, &TeeChecker::standard());
        assert_eq!(map.get(BUCKET_TOTAL), &[0, 1, 2]);
        assert_eq!(map.get(BUCKET_FUZZY), &[1]);
        assert_eq!(map.get(BUCKET_REVIEW), &[1]);
        assert_eq!(map.get("has-suggestion"), &[2]);
    }

    #[test]
    fn tst_front_cache_culling() {
        let dir = tempfile::tempdir().unwrap();
        let front_cache = FrontCacheConfig { capacity: 4, cull_frequency: 2 };
        let mut cache = StatsCache::temporary(&front_cache).unwrap();
        for i in 0..5 {
            let path = dir.path().join(format!("{i}.po"));
            fs::write(&path, TEST_THREE_UNITS_PO_CONTENT).unwrap();
            cache.file_totals(&path);
        }
        assert_eq!(cache.front.len(), 3);
        assert!(!cache.front.contains(&canonical_path(&dir.path().join("0.po"))));
        assert!(cache.front.contains(&canonical_path(&dir.path().join("4.po"))));
    }
}
