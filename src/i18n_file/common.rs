// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error as TeError;

use super::gettext::{PoLoadError, PoSaveError, PoStore};
use super::xliff::{Xliff, XliffLoadError, XliffSaveError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I18nFileKind {
    /// GNU Gettext translation file format (.po)
    Gettext,
    /// XLIFF 1.2 translation file format (.xlf)
    Xliff,
}

#[derive(TeError, Debug)]
#[error("Unknow translation file extension {ext:?}")]
pub struct UnknownI18nFileExtError {
    ext: String,
}

impl I18nFileKind {
    /// Try detecting translation file kind from given file path.
    ///
    /// If file extension is `po` or `pot`, return GNU Gettext.
    /// If file extension is `xlf` or `xliff`, return XLIFF.
    /// Otherwise return error.
    pub fn from_ext_hint(path_hint: &Path) -> Result<Self, UnknownI18nFileExtError> {
        // Get file extension and convert ot lowercase.
        let ext = path_hint.extension().map(|e| e.to_ascii_lowercase());
        let ext = match ext {
            Some(ref e) => e.to_str(),
            None => None,
        };
        // Match extension.
        match ext {
            Some("po") | Some("pot") => Ok(Self::Gettext),
            Some("xlf") | Some("xliff") => Ok(Self::Xliff),
            Some(s) => Err(UnknownI18nFileExtError { ext: s.to_string() }),
            None => Err(UnknownI18nFileExtError { ext: String::new() }),
        }
    }
}

// ===== Units =====

/// One suggested translation for a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub target: Vec<String>,
    pub submitter: Option<String>,
}

#[derive(TeError, Debug)]
pub enum UnitError {
    #[error("Unit has no plural forms but {found} target forms were given")]
    TooManyForms { found: usize },
}

/// Behavior shared by the units of every supported file kind.
pub trait TranslationUnit {
    fn unit_id(&self) -> String;
    /// Source text, followed by the plural source when there is one.
    fn source_strings(&self) -> Vec<String>;
    /// Target text, one entry per plural form. Never empty.
    fn target_strings(&self) -> Vec<String>;
    fn has_plural(&self) -> bool;
    fn is_fuzzy(&self) -> bool;
    fn is_obsolete(&self) -> bool;
    fn is_header(&self) -> bool;
    fn is_blank(&self) -> bool;
    fn is_review(&self) -> bool;
    fn locations(&self) -> Vec<String>;
    fn translator_comments(&self) -> String;
    /// Suggestions kept inside the file itself.
    fn alt_translations(&self) -> Vec<Suggestion> {
        Vec::new()
    }

    fn set_target(&mut self, target: Vec<String>) -> Result<(), UnitError>;
    fn set_fuzzy(&mut self, fuzzy: bool);
    fn set_translator_comments(&mut self, comments: Option<&str>);

    fn has_target(&self) -> bool {
        self.target_strings().iter().any(|form| !form.is_empty())
    }

    fn is_translatable(&self) -> bool {
        !self.is_header() && !self.is_blank() && !self.is_obsolete()
    }

    fn is_translated(&self) -> bool {
        self.has_target() && !self.is_fuzzy() && !self.is_obsolete()
    }
}

// ===== Store =====

pub enum TranslationStore {
    Gettext(PoStore),
    Xliff(Xliff),
}

#[derive(TeError, Debug)]
pub enum StoreLoadError {
    #[error("Fail to guess file kind of {0:?}: {1}")]
    GuessFileKind(PathBuf, #[source] UnknownI18nFileExtError),
    #[error("Fail to load PO file {0:?}: {1}")]
    LoadPo(PathBuf, #[source] PoLoadError),
    #[error("Fail to load XLIFF file {0:?}: {1}")]
    LoadXliff(PathBuf, #[source] XliffLoadError),
}

#[derive(TeError, Debug)]
pub enum StoreSaveError {
    #[error("Fail to save PO file {0:?}: {1}")]
    SavePo(PathBuf, #[source] PoSaveError),
    #[error("Fail to save XLIFF file {0:?}: {1}")]
    SaveXliff(PathBuf, #[source] XliffSaveError),
}

impl TranslationStore {
    pub fn load_file(path: &Path) -> Result<Self, StoreLoadError> {
        let kind = I18nFileKind::from_ext_hint(path)
            .map_err(|e| StoreLoadError::GuessFileKind(path.to_path_buf(), e))?;
        match kind {
            I18nFileKind::Gettext => PoStore::load_from_file(path)
                .map(TranslationStore::Gettext)
                .map_err(|e| StoreLoadError::LoadPo(path.to_path_buf(), e)),
            I18nFileKind::Xliff => Xliff::load_from_file(path)
                .map(TranslationStore::Xliff)
                .map_err(|e| StoreLoadError::LoadXliff(path.to_path_buf(), e)),
        }
    }

    pub fn save_file(&self, path: &Path) -> Result<(), StoreSaveError> {
        match self {
            TranslationStore::Gettext(po) => po
                .save_into_file(path)
                .map_err(|e| StoreSaveError::SavePo(path.to_path_buf(), e)),
            TranslationStore::Xliff(xliff) => xliff
                .save_into_file(path)
                .map_err(|e| StoreSaveError::SaveXliff(path.to_path_buf(), e)),
        }
    }

    pub fn kind(&self) -> I18nFileKind {
        match self {
            TranslationStore::Gettext(_) => I18nFileKind::Gettext,
            TranslationStore::Xliff(_) => I18nFileKind::Xliff,
        }
    }

    /// Whether suggestions live inside the file instead of a side file.
    pub fn suggestions_in_format(&self) -> bool {
        matches!(self, TranslationStore::Xliff(_))
    }

    pub fn units(&self) -> Vec<&dyn TranslationUnit> {
        match self {
            TranslationStore::Gettext(po) => po.units.iter().map(|u| u as &dyn TranslationUnit).collect(),
            TranslationStore::Xliff(xliff) => xliff.units().map(|u| u as &dyn TranslationUnit).collect(),
        }
    }

    pub fn unit(&self, index: usize) -> Option<&dyn TranslationUnit> {
        match self {
            TranslationStore::Gettext(po) => po.units.get(index).map(|u| u as &dyn TranslationUnit),
            TranslationStore::Xliff(xliff) => xliff.units().nth(index).map(|u| u as &dyn TranslationUnit),
        }
    }

    pub fn unit_mut(&mut self, index: usize) -> Option<&mut dyn TranslationUnit> {
        match self {
            TranslationStore::Gettext(po) => po.units.get_mut(index).map(|u| u as &mut dyn TranslationUnit),
            TranslationStore::Xliff(xliff) => xliff.units_mut().nth(index).map(|u| u as &mut dyn TranslationUnit),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TranslationStore::Gettext(po) => po.units.len(),
            TranslationStore::Xliff(xliff) => xliff.units().count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tst_file_kind_from_ext() {
        assert_eq!(I18nFileKind::from_ext_hint(Path::new("po/de.po")).unwrap(), I18nFileKind::Gettext);
        assert_eq!(I18nFileKind::from_ext_hint(Path::new("app.POT")).unwrap(), I18nFileKind::Gettext);
        assert_eq!(I18nFileKind::from_ext_hint(Path::new("de.xliff")).unwrap(), I18nFileKind::Xliff);
        assert!(I18nFileKind::from_ext_hint(Path::new("de.po.pending")).is_err());
        assert!(I18nFileKind::from_ext_hint(Path::new("README")).is_err());
    }

    #[test]
    fn tst_load_store_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let po_path = dir.path().join("nl.po");
        std::fs::write(&po_path, crate::i18n_file::gettext::tests::TEST_THREE_UNITS_PO_CONTENT).unwrap();
        let xlf_path = dir.path().join("de.xlf");
        std::fs::write(&xlf_path, crate::i18n_file::xliff::tests::TEST_DE_XLIFF_CONTENT).unwrap();

        let po = TranslationStore::load_file(&po_path).unwrap();
        assert_eq!(po.kind(), I18nFileKind::Gettext);
        assert!(!po.suggestions_in_format());
        assert_eq!(po.len(), 4);
        assert!(po.unit(0).unwrap().is_header());

        let mut xliff = TranslationStore::load_file(&xlf_path).unwrap();
        assert!(xliff.suggestions_in_format());
        assert_eq!(xliff.units().len(), 3);
        xliff.unit_mut(2).unwrap().set_target(vec!["Tisch".to_string()]).unwrap();
        xliff.save_file(&xlf_path).unwrap();
        let reloaded = TranslationStore::load_file(&xlf_path).unwrap();
        assert_eq!(reloaded.unit(2).unwrap().target_strings(), vec!["Tisch"]);

        let broken = dir.path().join("broken.po");
        std::fs::write(&broken, "msgid \"open\n").unwrap();
        assert!(matches!(TranslationStore::load_file(&broken), Err(StoreLoadError::LoadPo(..))));
    }
}
