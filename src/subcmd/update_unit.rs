// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

use thiserror::Error as TeError;
use std::path::Path;

use crate::config::Config;
use crate::i18n_file::gettext::header::parse_plural_forms;
use crate::stats::cache::{StatsCache, StatsCacheError};
use crate::stats::checks::TeeChecker;
use crate::translation_file::{LanguageInfo, TranslationFileError, UnitUpdate, UpdateContext};

#[derive(TeError, Debug)]
pub enum CmdError {
    #[error("Fail to open statistics cache because: {0}")]
    Cache(#[from] StatsCacheError),
    #[error("Fail to update unit {0} of {1:?} because: {2}")]
    Update(usize, std::path::PathBuf, #[source] TranslationFileError),
    #[error("Nothing to update, pass a target, a fuzzy flag or a comment")]
    NothingToUpdate,
}

pub fn subcmd_update_unit(
    config: &Config,
    file: &Path,
    index: usize,
    update: &UnitUpdate,
    language: Option<String>,
    plural_forms: Option<&str>,
) -> Result<(), CmdError> {
    if update.target.is_none() && update.fuzzy.is_none() && update.translator_comments.is_none() {
        return Err(CmdError::NothingToUpdate);
    }
    let language = language.map(|code| {
        let (nplurals, plural_equation) = plural_forms.map(parse_plural_forms).unwrap_or_default();
        LanguageInfo { code, nplurals, plural_equation }
    });
    let context = UpdateContext {
        translator: config.translator.clone(),
        language,
    };

    let mut cache = StatsCache::from_config(config)?;
    let checker = TeeChecker::from_config(&config.checks);
    let buckets = cache
        .update_unit(file, index, update, &context, &checker)
        .map_err(|e| CmdError::Update(index, file.to_path_buf(), e))?;
    cache.flush()?;

    let buckets: Vec<&str> = buckets.iter().map(String::as_str).collect();
    println!("Updated unit {index} of {file:?}, now in: {}", buckets.join(", "));
    Ok(())
}
