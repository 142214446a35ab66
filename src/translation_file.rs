// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

//! A translation file together with its suggestions.
//!
//! XLIFF files keep suggestions as `<alt-trans>` elements. Other files keep
//! them in a `<file>.pending` PO file next to them, where each suggestion is a
//! copy of the suggested unit.

use std::collections::{BTreeSet, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error as TeError;
use tracing::{debug, warn};

use crate::config::Translator;
use crate::i18n_file::common::{StoreLoadError, StoreSaveError, Suggestion, TranslationStore, TranslationUnit, UnitError};
use crate::i18n_file::gettext::header::{HeaderDefaults, render_plural_forms, revision_timestamp};
use crate::i18n_file::gettext::unit::PoUnit;
use crate::i18n_file::gettext::{PoLoadError, PoSaveError, PoStore};
use crate::i18n_file::xliff::TransUnit;
use crate::stats::cache::{StatsCache, StatsCacheError, mtime_ns};
use crate::stats::checks::TeeChecker;
use crate::stats::classify::{BucketMap, classify_unit};

pub const X_GENERATOR: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

const PENDING_SUFFIX: &str = ".pending";
const SUGGESTER_PREFIX: &str = "suggested by ";

pub fn pending_path(path: &Path) -> PathBuf {
    let mut pending: OsString = path.as_os_str().to_owned();
    pending.push(PENDING_SUFFIX);
    PathBuf::from(pending)
}

/// The pending file of `path`, `None` when there is none.
pub fn load_pending(path: &Path) -> Result<Option<PoStore>, PoLoadError> {
    let pending = pending_path(path);
    if !pending.is_file() {
        return Ok(None);
    }
    PoStore::load_from_file(&pending).map(Some)
}

/// Suggestions are matched to units by source text and locations.
fn pending_key(unit: &dyn TranslationUnit) -> (Vec<String>, Vec<String>) {
    (unit.source_strings(), unit.locations())
}

fn suggester_of(unit: &PoUnit) -> Option<String> {
    unit.msgid_comment
        .as_deref()
        .and_then(|comment| comment.strip_prefix(SUGGESTER_PREFIX))
        .map(str::to_string)
}

/// Whether each unit of `store` has at least one suggestion.
pub fn suggestion_flags(store: &TranslationStore, pending: Option<&PoStore>) -> Vec<bool> {
    if store.suggestions_in_format() {
        return store.units().into_iter().map(|unit| !unit.alt_translations().is_empty()).collect();
    }
    let pending_keys: HashSet<(Vec<String>, Vec<String>)> = pending
        .map(|pending| {
            pending.units.iter()
                .filter(|unit| !unit.is_header())
                .map(|unit| pending_key(unit))
                .collect()
        })
        .unwrap_or_default();
    store.units().into_iter().map(|unit| pending_keys.contains(&pending_key(unit))).collect()
}

/// Targets compare equal when they only differ by trailing empty plural forms.
fn same_target(a: &[String], b: &[String]) -> bool {
    fn populated(forms: &[String]) -> &[String] {
        let end = forms.iter().rposition(|form| !form.is_empty()).map_or(0, |last| last + 1);
        &forms[..end]
    }
    populated(a) == populated(b)
}

/// Position of the suggestion holding `target`: `suggestion_index` when it
/// still does, otherwise the first suggestion with that target.
fn locate_suggestion(suggestions: &[Suggestion], suggestion_index: usize, target: &[String]) -> Option<usize> {
    match suggestions.get(suggestion_index) {
        Some(suggestion) if same_target(&suggestion.target, target) => Some(suggestion_index),
        _ => suggestions.iter().position(|suggestion| same_target(&suggestion.target, target)),
    }
}

/// Modification times of a file and of its pending file.
fn disk_mtimes(path: &Path) -> (Option<u64>, Option<u64>) {
    (mtime_ns(path).ok(), mtime_ns(&pending_path(path)).ok())
}

fn single_form(target: Vec<String>) -> Result<String, UnitError> {
    match target.len() {
        0 => Ok(String::new()),
        1 => Ok(target.into_iter().next().unwrap_or_default()),
        found => Err(UnitError::TooManyForms { found }),
    }
}

// ===== Unit updates =====

#[derive(Debug, Clone, Default)]
pub struct UnitUpdate {
    pub target: Option<Vec<String>>,
    pub fuzzy: Option<bool>,
    /// An empty string removes the translator comments.
    pub translator_comments: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LanguageInfo {
    pub code: String,
    pub nplurals: Option<u32>,
    pub plural_equation: Option<String>,
}

/// Who edits, and in which language, for the PO header.
#[derive(Debug, Clone, Default)]
pub struct UpdateContext {
    pub translator: Option<Translator>,
    pub language: Option<LanguageInfo>,
}

impl UpdateContext {
    fn header_updates(&self, keep_plural_forms: bool) -> Vec<(&'static str, String)> {
        let mut updates = vec![
            ("PO-Revision-Date", revision_timestamp()),
            ("X-Generator", X_GENERATOR.to_string()),
        ];
        if let Some(translator) = &self.translator {
            updates.push(("Last-Translator", translator.header_value()));
        }
        if let Some(language) = &self.language {
            updates.push(("Language", language.code.clone()));
            if let (Some(nplurals), Some(equation), false) = (language.nplurals, &language.plural_equation, keep_plural_forms) {
                updates.push(("Plural-Forms", render_plural_forms(nplurals, equation)));
            }
        }
        updates
    }
}

// ===== Translation file =====

#[derive(TeError, Debug)]
pub enum TranslationFileError {
    #[error(transparent)]
    Load(#[from] StoreLoadError),
    #[error(transparent)]
    Save(#[from] StoreSaveError),
    #[error("Fail to load suggestions from {0:?}: {1}")]
    LoadPending(PathBuf, #[source] PoLoadError),
    #[error("Fail to save suggestions into {0:?}: {1}")]
    SavePending(PathBuf, #[source] PoSaveError),
    #[error("No unit with index {0}")]
    UnknownUnit(usize),
    #[error("Unit {0} is not translatable")]
    NotTranslatable(usize),
    #[error("Fail to edit unit: {0}")]
    Unit(#[from] UnitError),
    #[error("Fail to update statistics: {0}")]
    Cache(#[from] StatsCacheError),
}

pub struct TranslationFile {
    path: PathBuf,
    store: TranslationStore,
    pending: Option<PoStore>,
    pending_loaded: bool,
    buckets: Option<BucketMap>,
    /// Modification times of the file and its pending file as last seen.
    seen_mtimes: (Option<u64>, Option<u64>),
}

impl TranslationFile {
    pub fn open(path: &Path) -> Result<Self, TranslationFileError> {
        let seen_mtimes = disk_mtimes(path);
        Ok(TranslationFile {
            path: path.to_path_buf(),
            store: TranslationStore::load_file(path)?,
            pending: None,
            pending_loaded: false,
            buckets: None,
            seen_mtimes,
        })
    }

    /// Reload whatever changed on disk since it was last read or written.
    fn sync_with_disk(&mut self) -> Result<(), TranslationFileError> {
        let (main, pending) = disk_mtimes(&self.path);
        if main != self.seen_mtimes.0 {
            debug!("{:?} changed on disk, reloading", self.path);
            self.store = TranslationStore::load_file(&self.path)?;
        }
        if (main, pending) != self.seen_mtimes {
            self.buckets = None;
            self.pending = None;
            self.pending_loaded = false;
        }
        self.seen_mtimes = (main, pending);
        Ok(())
    }

    fn mark_written(&mut self) {
        self.seen_mtimes = disk_mtimes(&self.path);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &TranslationStore {
        &self.store
    }

    fn unit(&self, index: usize) -> Result<&dyn TranslationUnit, TranslationFileError> {
        self.store.unit(index).ok_or(TranslationFileError::UnknownUnit(index))
    }

    fn translatable_unit(&self, index: usize) -> Result<&dyn TranslationUnit, TranslationFileError> {
        let unit = self.unit(index)?;
        if !unit.is_translatable() {
            return Err(TranslationFileError::NotTranslatable(index));
        }
        Ok(unit)
    }

    fn po_unit(&self, index: usize) -> Result<&PoUnit, TranslationFileError> {
        match &self.store {
            TranslationStore::Gettext(po) => po.units.get(index),
            TranslationStore::Xliff(_) => None,
        }
        .ok_or(TranslationFileError::UnknownUnit(index))
    }

    fn xliff_unit_mut(&mut self, index: usize) -> Result<&mut TransUnit, TranslationFileError> {
        match &mut self.store {
            TranslationStore::Xliff(xliff) => xliff.units_mut().nth(index),
            TranslationStore::Gettext(_) => None,
        }
        .ok_or(TranslationFileError::UnknownUnit(index))
    }

    /// Classify every unit, once. Later edits update the map in place.
    pub fn classify(&mut self, checker: &TeeChecker) -> Result<&BucketMap, TranslationFileError> {
        if self.buckets.is_none() {
            self.ensure_pending_loaded()?;
            let flags = suggestion_flags(&self.store, self.pending.as_ref());
            let map = BucketMap::build(
                self.store.units().into_iter().enumerate()
                    .filter(|(_, unit)| unit.is_translatable())
                    .map(|(index, unit)| (index, classify_unit(unit, checker, flags[index]).buckets)),
            );
            self.buckets = Some(map);
        }
        Ok(self.buckets.get_or_insert_with(BucketMap::new))
    }

    fn reclassify(&mut self, index: usize, cache: &mut StatsCache, checker: &TeeChecker) -> Result<BTreeSet<String>, TranslationFileError> {
        let has_suggestion = !self.suggestions(index)?.is_empty();
        let unit = self.unit(index)?;
        let buckets = cache.recache_unit(&self.path, index, unit, has_suggestion, checker)?;
        if let Some(map) = self.buckets.as_mut() {
            map.reclassify(index, &buckets);
        }
        Ok(buckets)
    }
}

// ===== Suggestions =====

impl TranslationFile {
    fn ensure_pending_loaded(&mut self) -> Result<(), TranslationFileError> {
        if !self.pending_loaded && !self.store.suggestions_in_format() {
            self.pending = load_pending(&self.path)
                .map_err(|e| TranslationFileError::LoadPending(pending_path(&self.path), e))?;
            self.pending_loaded = true;
        }
        Ok(())
    }

    fn pending_mut(&mut self) -> Result<&mut PoStore, TranslationFileError> {
        self.ensure_pending_loaded()?;
        Ok(self.pending.get_or_insert_with(|| {
            PoStore::with_header(HeaderDefaults {
                charset: "UTF-8".to_string(),
                encoding: "8bit".to_string(),
                x_generator: Some(X_GENERATOR.to_string()),
                ..Default::default()
            })
        }))
    }

    fn save_pending(&self) -> Result<(), TranslationFileError> {
        if let Some(pending) = &self.pending {
            let target = pending_path(&self.path);
            pending
                .save_into_file(&target)
                .map_err(|e| TranslationFileError::SavePending(target, e))?;
        }
        Ok(())
    }

    /// Indices in the pending store of the suggestions for unit `index`.
    fn pending_matches(&mut self, index: usize) -> Result<Vec<usize>, TranslationFileError> {
        let key = pending_key(self.unit(index)?);
        self.ensure_pending_loaded()?;
        Ok(match &self.pending {
            Some(pending) => pending.units.iter().enumerate()
                .filter(|(_, unit)| !unit.is_header() && pending_key(*unit) == key)
                .map(|(position, _)| position)
                .collect(),
            None => Vec::new(),
        })
    }

    pub fn suggestions(&mut self, index: usize) -> Result<Vec<Suggestion>, TranslationFileError> {
        if self.store.suggestions_in_format() {
            return Ok(self.unit(index)?.alt_translations());
        }
        let matches = self.pending_matches(index)?;
        let pending = self.pending.as_ref();
        Ok(matches.iter()
            .filter_map(|position| pending.and_then(|pending| pending.units.get(*position)))
            .map(|unit| Suggestion {
                target: unit.target_strings(),
                submitter: suggester_of(unit),
            })
            .collect())
    }

    pub fn suggester(&mut self, index: usize, suggestion_index: usize) -> Result<Option<String>, TranslationFileError> {
        Ok(self.suggestions(index)?
            .into_iter()
            .nth(suggestion_index)
            .and_then(|suggestion| suggestion.submitter))
    }

    /// A suggestion is only kept when it differs from the current target and
    /// from every existing suggestion of the unit.
    fn suggestion_is_unique(&mut self, index: usize, target: &[String]) -> Result<bool, TranslationFileError> {
        if same_target(&self.unit(index)?.target_strings(), target) {
            return Ok(false);
        }
        Ok(!self.suggestions(index)?
            .iter()
            .any(|suggestion| same_target(&suggestion.target, target)))
    }

    /// Add a suggestion to unit `index`. Returns `false` when an identical
    /// suggestion or translation already exists and nothing was added.
    pub fn add_suggestion(
        &mut self,
        index: usize,
        target: Vec<String>,
        submitter: Option<&str>,
        cache: &mut StatsCache,
        checker: &TeeChecker,
    ) -> Result<bool, TranslationFileError> {
        self.sync_with_disk()?;
        self.translatable_unit(index)?;
        if !self.suggestion_is_unique(index, &target)? {
            debug!("Unit {index} of {:?} already has this suggestion", self.path);
            return Ok(false);
        }
        cache.refresh(&self.path)?;
        if self.store.suggestions_in_format() {
            let value = single_form(target)?;
            self.xliff_unit_mut(index)?.add_alt_trans(&value, submitter);
            self.store.save_file(&self.path)?;
        } else {
            let mut suggestion = self.po_unit(index)?.clone();
            suggestion.msgid_comment = submitter.map(|name| format!("{SUGGESTER_PREFIX}{name}"));
            suggestion.set_target(target)?;
            suggestion.set_fuzzy(false);
            self.pending_mut()?.units.push(suggestion);
            self.save_pending()?;
        }
        self.mark_written();
        self.reclassify(index, cache, checker)?;
        Ok(true)
    }

    /// Delete the suggestion of unit `index` whose target is `target`.
    ///
    /// `suggestion_index` is where the caller last saw it. When that position
    /// now holds another suggestion, the first suggestion with `target` is
    /// deleted instead. A suggestion that is already gone only logs a warning.
    pub fn delete_suggestion(
        &mut self,
        index: usize,
        suggestion_index: usize,
        target: &[String],
        cache: &mut StatsCache,
        checker: &TeeChecker,
    ) -> Result<(), TranslationFileError> {
        self.sync_with_disk()?;
        let suggestions = self.suggestions(index)?;
        let Some(position) = locate_suggestion(&suggestions, suggestion_index, target) else {
            warn!("Suggestion {suggestion_index} of unit {index} in {:?} is already gone", self.path);
            return Ok(());
        };
        cache.refresh(&self.path)?;
        if self.store.suggestions_in_format() {
            self.xliff_unit_mut(index)?.remove_alt_trans(position);
            self.store.save_file(&self.path)?;
        } else {
            let matches = self.pending_matches(index)?;
            if let (Some(&pending_position), Some(pending)) = (matches.get(position), self.pending.as_mut()) {
                pending.units.remove(pending_position);
            }
            self.save_pending()?;
        }
        self.mark_written();
        self.reclassify(index, cache, checker)?;
        Ok(())
    }
}

// ===== Editing =====

impl TranslationFile {
    /// Apply an edit to one unit, save the file and refresh only that unit's
    /// statistics.
    ///
    /// PO headers are stamped with the revision date and editor. When the
    /// header has to be created, unit indices shift and the whole file is
    /// recomputed.
    pub fn update_unit(
        &mut self,
        index: usize,
        update: &UnitUpdate,
        context: &UpdateContext,
        cache: &mut StatsCache,
        checker: &TeeChecker,
    ) -> Result<BTreeSet<String>, TranslationFileError> {
        self.sync_with_disk()?;
        self.translatable_unit(index)?;
        cache.refresh(&self.path)?;
        let unit = self.store.unit_mut(index).ok_or(TranslationFileError::UnknownUnit(index))?;
        if let Some(target) = &update.target {
            unit.set_target(target.clone())?;
        }
        if let Some(fuzzy) = update.fuzzy {
            unit.set_fuzzy(fuzzy);
        }
        if let Some(comments) = &update.translator_comments {
            unit.set_translator_comments(Some(comments.as_str()).filter(|c| !c.is_empty()));
        }

        let mut header_added = false;
        if let TranslationStore::Gettext(po) = &mut self.store {
            let had_header = po.header().is_some();
            let keep_plural_forms = matches!(po.header_plural(), (Some(_), Some(_)));
            po.update_header(true, &context.header_updates(keep_plural_forms));
            header_added = !had_header && po.header().is_some();
        }
        self.store.save_file(&self.path)?;
        self.mark_written();

        if header_added {
            cache.forget(&self.path);
            self.buckets = None;
            return self.reclassify(index + 1, cache, checker);
        }
        self.reclassify(index, cache, checker)
    }
}
