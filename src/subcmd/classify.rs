// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

use thiserror::Error as TeError;
use std::path::Path;

use crate::config::Config;
use crate::stats::cache::{StatsCache, StatsCacheError};
use crate::stats::checks::TeeChecker;
use crate::stats::classify::BucketMap;
use crate::subcmd::statistics::StatsFormat;

#[derive(TeError, Debug)]
pub enum CmdError {
    #[error("Fail to classify units because: {0}")]
    Cache(#[from] StatsCacheError),
    #[error("Fail to serialize buckets: {0}")]
    SerdeYaml(#[from] serde_yml::Error),
    #[error("Fail to serialize buckets: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

fn print_buckets_plain_table(map: &BucketMap) {
    println!("| Bucket               | Units | Indices");
    println!("| -------------------- | ----- | -------");
    for (name, count) in map.counts() {
        let indices: Vec<String> = map.get(name).iter().map(usize::to_string).collect();
        println!("| {0:<20} | {1:5} | {2}", name, count, indices.join(", "));
    }
}

pub fn subcmd_classify(config: &Config, file: &Path, format: StatsFormat) -> Result<(), CmdError> {
    let mut cache = StatsCache::from_config(config)?;
    let checker = TeeChecker::from_config(&config.checks);
    let map = cache.try_file_stats(file, &checker)?;
    cache.flush()?;

    match format {
        StatsFormat::PlainTable => print_buckets_plain_table(&map),
        StatsFormat::Yaml => println!("{}", serde_yml::to_string(&map)?),
        StatsFormat::Json => println!("{}", serde_json::to_string_pretty(&map)?),
    }
    Ok(())
}
