// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

use thiserror::Error as TeError;
use std::path::{Path, PathBuf};

use crate::i18n_file::common::{I18nFileKind, UnknownI18nFileExtError};
use crate::i18n_file::gettext::{DuplicateStyle, PoLoadError, PoSaveError, PoStore};

#[derive(TeError, Debug)]
pub enum CmdError {
    #[error("Can not guess translation file kind from path {0:?} because: {1}")]
    GuessI18nFileType(PathBuf, #[source] UnknownI18nFileExtError),
    #[error("Only Gettext PO files can be deduplicated, {0:?} is not one")]
    NotGettext(PathBuf),
    #[error("Fail to load file {0:?} because: {1}")]
    LoadPoFile(PathBuf, #[source] PoLoadError),
    #[error("Fail to save file {0:?} because: {1}")]
    SavePoFile(PathBuf, #[source] PoSaveError),
}

pub(crate) fn ensure_gettext(file: &Path) -> Result<(), CmdError> {
    match I18nFileKind::from_ext_hint(file) {
        Ok(I18nFileKind::Gettext) => Ok(()),
        Ok(_) => Err(CmdError::NotGettext(file.to_path_buf())),
        Err(e) => Err(CmdError::GuessI18nFileType(file.to_path_buf(), e)),
    }
}

pub fn subcmd_dedup(file: &Path, style: DuplicateStyle, output: Option<&Path>) -> Result<(), CmdError> {
    ensure_gettext(file)?;
    let mut po = PoStore::load_from_file(file).map_err(|e| CmdError::LoadPoFile(file.to_path_buf(), e))?;
    let before = po.units.len();
    po.remove_duplicates(style);
    let target = output.unwrap_or(file);
    po.save_into_file(target).map_err(|e| CmdError::SavePoFile(target.to_path_buf(), e))?;
    println!("Resolved duplicates with style {style}: {before} units before, {} after. Wrote {target:?}", po.units.len());
    Ok(())
}
