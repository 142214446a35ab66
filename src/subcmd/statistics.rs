// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

use serde::Serialize;
use thiserror::Error as TeError;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::stats::Totals;
use crate::stats::cache::{StatsCache, StatsCacheError};

#[derive(TeError, Debug)]
pub enum CmdError {
    #[error("Provided path {0:?} does not exist")]
    PathNotFound(PathBuf),
    #[error("Fail to open statistics cache because: {0}")]
    Cache(#[from] StatsCacheError),
    #[error("Fail to serialize stats: {0}")]
    SerdeYaml(#[from] serde_yml::Error),
    #[error("Fail to serialize stats: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

#[derive(clap::ValueEnum, Clone, Default, Copy, Debug)]
pub enum StatsFormat {
    #[default]
    PlainTable,
    Yaml,
    Json,
}

#[derive(clap::ValueEnum, Clone, Default, Copy, Debug)]
pub enum StatsSortBy {
    Path,
    #[default]
    Completeness,
}

#[derive(Serialize)]
struct FileStats {
    path: PathBuf,
    completeness: f64,
    word_completeness: f64,
    totals: Totals,
}

impl FileStats {
    fn new(path: PathBuf, totals: Totals) -> Self {
        FileStats {
            path,
            completeness: totals.completeness_percentage(),
            word_completeness: totals.word_completeness_percentage(),
            totals,
        }
    }
}

#[derive(Serialize)]
struct PathStats {
    path: PathBuf,
    files: Vec<FileStats>,
    total: FileStats,
}

impl PathStats {
    fn collect(cache: &mut StatsCache, path: &Path) -> Self {
        let files: Vec<FileStats> = if path.is_dir() {
            cache.directory_file_totals(path)
                .into_iter()
                .map(|(file, totals)| {
                    let relative = file.strip_prefix(path).map(Path::to_path_buf).unwrap_or(file);
                    FileStats::new(relative, totals)
                })
                .collect()
        } else {
            vec![FileStats::new(path.to_path_buf(), cache.file_totals(path))]
        };
        let mut total = Totals::new();
        for file in &files {
            total += &file.totals;
        }
        PathStats {
            path: path.to_path_buf(),
            files,
            total: FileStats::new(PathBuf::from("Total"), total),
        }
    }

    fn sort(&mut self, sort_by: StatsSortBy) {
        match sort_by {
            StatsSortBy::Path => self.files.sort_by(|a, b| a.path.cmp(&b.path)),
            StatsSortBy::Completeness => self.files.sort_by(|a, b| {
                b.completeness.total_cmp(&a.completeness).then_with(|| a.path.cmp(&b.path))
            }),
        }
    }

    pub fn print_stats_plain_table(&self) {
        let width = self.files.iter()
            .map(|file| file.path.to_string_lossy().chars().count())
            .max()
            .unwrap_or(0)
            .max(5);
        println!("| No. | {0:<width$} | Completeness | Translated | Fuzzy | Untranslated | Source Words |", "File");
        println!("| --- | {0:-<width$} | ------------ | ---------- | ----- | ------------ | ------------ |", "");
        let print_row = |no: String, file: &FileStats| {
            let totals = &file.totals;
            println!("| {0:>3} | {1:<width$} | {2:>11.2}% | {3:10} | {4:5} | {5:12} | {6:12} |",
                no, file.path.to_string_lossy(), file.completeness,
                totals.translated.units, totals.fuzzy.units, totals.untranslated.units, totals.total_source_words());
        };
        for (idx, file) in self.files.iter().enumerate() {
            print_row((idx + 1).to_string(), file);
        }
        if self.files.len() != 1 {
            print_row("-".to_string(), &self.total);
        }
    }

    pub fn print_stats_yaml(&self) -> Result<(), serde_yml::Error> {
        let yaml_str = serde_yml::to_string::<Self>(self)?;
        println!("{}", yaml_str);
        Ok(())
    }

    pub fn print_stats_json(&self) -> Result<(), serde_json::Error> {
        println!("{}", serde_json::to_string_pretty::<Self>(self)?);
        Ok(())
    }
}

pub fn subcmd_statistics(config: &Config, path: &Path, format: StatsFormat, sort_by: StatsSortBy) -> Result<(), CmdError> {
    if !path.exists() {
        return Err(CmdError::PathNotFound(path.to_path_buf()));
    }
    let mut cache = StatsCache::from_config(config)?;
    let mut stats = PathStats::collect(&mut cache, path);
    stats.sort(sort_by);
    cache.flush()?;

    match format {
        StatsFormat::PlainTable => stats.print_stats_plain_table(),
        StatsFormat::Yaml => stats.print_stats_yaml()?,
        StatsFormat::Json => stats.print_stats_json()?,
    }
    Ok(())
}
