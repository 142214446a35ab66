// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::checks::{CheckFailure, TeeChecker};
use crate::i18n_file::common::TranslationUnit;

pub const BUCKET_TOTAL: &str = "total";
pub const BUCKET_TRANSLATED: &str = "translated";
pub const BUCKET_FUZZY: &str = "fuzzy";
pub const BUCKET_UNTRANSLATED: &str = "untranslated";
pub const BUCKET_BLANK: &str = "blank";
pub const BUCKET_REVIEW: &str = "review";
pub const BUCKET_HAS_SUGGESTION: &str = "has-suggestion";

pub fn check_bucket(check_name: &str) -> String {
    format!("check-{check_name}")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub buckets: BTreeSet<String>,
    pub failures: Vec<CheckFailure>,
}

/// Bucket names of a translatable unit from its stored facts.
pub fn buckets_for(fuzzy: bool, blank: bool, review: bool, has_suggestion: bool, failures: &[CheckFailure]) -> BTreeSet<String> {
    let mut buckets = BTreeSet::from([BUCKET_TOTAL.to_string()]);
    let state = if fuzzy {
        BUCKET_FUZZY
    } else if blank {
        BUCKET_UNTRANSLATED
    } else {
        BUCKET_TRANSLATED
    };
    buckets.insert(state.to_string());
    if blank {
        buckets.insert(BUCKET_BLANK.to_string());
    }
    if review {
        buckets.insert(BUCKET_REVIEW.to_string());
    }
    if has_suggestion {
        buckets.insert(BUCKET_HAS_SUGGESTION.to_string());
    }
    buckets.extend(failures.iter().map(|failure| check_bucket(&failure.name)));
    buckets
}

pub fn classify_unit(unit: &dyn TranslationUnit, checker: &TeeChecker, has_suggestion: bool) -> Classification {
    let failures = checker.run_filters(unit);
    let buckets = buckets_for(unit.is_fuzzy(), !unit.has_target(), unit.is_review(), has_suggestion, &failures);
    Classification { buckets, failures }
}

/// Bucket name to the sorted indices of its units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BucketMap {
    buckets: BTreeMap<String, Vec<usize>>,
}

impl BucketMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(classified: impl IntoIterator<Item = (usize, BTreeSet<String>)>) -> Self {
        let mut map = Self::new();
        for (index, buckets) in classified {
            for name in buckets {
                map.insert(&name, index);
            }
        }
        map
    }

    fn insert(&mut self, name: &str, index: usize) {
        let list = self.buckets.entry(name.to_string()).or_default();
        if let Err(position) = list.binary_search(&index) {
            list.insert(position, index);
        }
    }

    /// Move one unit to a new set of buckets, leaving other units alone.
    pub fn reclassify(&mut self, index: usize, buckets: &BTreeSet<String>) {
        for list in self.buckets.values_mut() {
            if let Ok(position) = list.binary_search(&index) {
                list.remove(position);
            }
        }
        for name in buckets {
            self.insert(name, index);
        }
        self.buckets.retain(|_, list| !list.is_empty());
    }

    pub fn get(&self, name: &str) -> &[usize] {
        self.buckets.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn counts(&self) -> BTreeMap<&str, usize> {
        self.buckets.iter().map(|(name, list)| (name.as_str(), list.len())).collect()
    }
}
