// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

use thiserror::Error as TeError;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::stats::cache::{StatsCache, StatsCacheError};
use crate::stats::checks::TeeChecker;
use crate::translation_file::{TranslationFile, TranslationFileError};

#[derive(TeError, Debug)]
pub enum CmdError {
    #[error("Fail to open statistics cache because: {0}")]
    Cache(#[from] StatsCacheError),
    #[error("Fail to access suggestions of {0:?} because: {1}")]
    Suggestions(PathBuf, #[source] TranslationFileError),
}

fn open_file(file: &Path) -> Result<TranslationFile, CmdError> {
    TranslationFile::open(file).map_err(|e| CmdError::Suggestions(file.to_path_buf(), e))
}

pub fn subcmd_suggest_list(file: &Path, index: usize) -> Result<(), CmdError> {
    let mut translation_file = open_file(file)?;
    let suggestions = translation_file
        .suggestions(index)
        .map_err(|e| CmdError::Suggestions(file.to_path_buf(), e))?;
    if suggestions.is_empty() {
        println!("Unit {index} of {file:?} has no suggestions.");
        return Ok(());
    }
    println!("| No. | Suggester            | Target");
    println!("| --- | -------------------- | ------");
    for (idx, suggestion) in suggestions.iter().enumerate() {
        println!("| {0:3} | {1:<20} | {2}",
            idx, suggestion.submitter.as_deref().unwrap_or("-"), suggestion.target.join(" | "));
    }
    Ok(())
}

pub fn subcmd_suggest_add(config: &Config, file: &Path, index: usize, target: Vec<String>, by: Option<String>) -> Result<(), CmdError> {
    let submitter = by.or_else(|| config.translator.as_ref().map(|translator| translator.name.clone()));
    let mut cache = StatsCache::from_config(config)?;
    let checker = TeeChecker::from_config(&config.checks);
    let mut translation_file = open_file(file)?;
    let added = translation_file
        .add_suggestion(index, target, submitter.as_deref(), &mut cache, &checker)
        .map_err(|e| CmdError::Suggestions(file.to_path_buf(), e))?;
    cache.flush()?;
    if added {
        println!("Added suggestion to unit {index} of {file:?}");
    } else {
        println!("Unit {index} of {file:?} already has this translation or suggestion");
    }
    Ok(())
}

pub fn subcmd_suggest_delete(config: &Config, file: &Path, index: usize, suggestion: usize, target: &[String]) -> Result<(), CmdError> {
    let mut cache = StatsCache::from_config(config)?;
    let checker = TeeChecker::from_config(&config.checks);
    let mut translation_file = open_file(file)?;
    translation_file
        .delete_suggestion(index, suggestion, target, &mut cache, &checker)
        .map_err(|e| CmdError::Suggestions(file.to_path_buf(), e))?;
    cache.flush()?;
    Ok(())
}
