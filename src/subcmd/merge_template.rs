// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

use thiserror::Error as TeError;
use std::path::{Path, PathBuf};

use crate::i18n_file::gettext::{PoLoadError, PoSaveError, PoStore};
use crate::subcmd::dedup::ensure_gettext;

#[derive(TeError, Debug)]
pub enum CmdError {
    #[error(transparent)]
    NotGettext(#[from] crate::subcmd::dedup::CmdError),
    #[error("Fail to load file {0:?} because: {1}")]
    LoadPoFile(PathBuf, #[source] PoLoadError),
    #[error("Fail to load template {0:?} because: {1}")]
    LoadTemplate(PathBuf, #[source] PoLoadError),
    #[error("Fail to save file {0:?} because: {1}")]
    SavePoFile(PathBuf, #[source] PoSaveError),
}

pub fn subcmd_merge_template(file: &Path, template: &Path, output: Option<&Path>) -> Result<(), CmdError> {
    ensure_gettext(file)?;
    ensure_gettext(template)?;
    let mut po = PoStore::load_from_file(file).map_err(|e| CmdError::LoadPoFile(file.to_path_buf(), e))?;
    let pot = PoStore::load_from_file(template).map_err(|e| CmdError::LoadTemplate(template.to_path_buf(), e))?;
    po.update_from_template(&pot);
    let target = output.unwrap_or(file);
    po.save_into_file(target).map_err(|e| CmdError::SavePoFile(target.to_path_buf(), e))?;
    println!("Merged {template:?} into {target:?}");
    Ok(())
}
