// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

use thiserror::Error as TeError;
use std::path::Path;

use crate::i18n_file::common::{StoreLoadError, StoreSaveError, TranslationStore};

#[derive(TeError, Debug)]
pub enum CmdError {
    #[error(transparent)]
    Load(#[from] StoreLoadError),
    #[error(transparent)]
    Save(#[from] StoreSaveError),
}

/// Load and save again, which rewraps PO strings and rewrites XLIFF with the
/// default indentation.
pub fn subcmd_normalize(file: &Path, output: Option<&Path>) -> Result<(), CmdError> {
    let store = TranslationStore::load_file(file)?;
    let target = output.unwrap_or(file);
    store.save_file(target)?;
    println!("Wrote {} units to {target:?}", store.len());
    Ok(())
}
