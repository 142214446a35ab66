// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

pub mod cache;
pub mod checks;
pub mod classify;
pub mod db;
pub mod wordcount;

use serde::{Deserialize, Serialize};

use crate::i18n_file::common::TranslationUnit;

/// Translation state of a unit, in the order of its stored code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitState {
    Untranslated = 0,
    Translated = 1,
    Fuzzy = 2,
}

impl UnitState {
    /// A fuzzy flag wins even when the target is empty.
    pub fn of(unit: &dyn TranslationUnit) -> Self {
        if unit.is_fuzzy() {
            UnitState::Fuzzy
        } else if unit.is_translated() {
            UnitState::Translated
        } else {
            UnitState::Untranslated
        }
    }
}

/// Unit and word counts of the units in one state.
#[derive(Debug, Default, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StateTotals {
    pub units: u64,
    pub source_words: u64,
    pub target_words: u64,
}

impl std::ops::AddAssign<&Self> for StateTotals {
    fn add_assign(&mut self, rhs: &Self) {
        self.units += rhs.units;
        self.source_words += rhs.source_words;
        self.target_words += rhs.target_words;
    }
}

/// Per-state totals of a file or a directory.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct Totals {
    pub translated: StateTotals,
    pub fuzzy: StateTotals,
    pub untranslated: StateTotals,
}

impl Totals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_unit(&mut self, state: UnitState, source_words: u64, target_words: u64) {
        let bucket = self.get_mut(state);
        bucket.units += 1;
        bucket.source_words += source_words;
        bucket.target_words += target_words;
    }

    pub fn get(&self, state: UnitState) -> &StateTotals {
        match state {
            UnitState::Untranslated => &self.untranslated,
            UnitState::Translated => &self.translated,
            UnitState::Fuzzy => &self.fuzzy,
        }
    }

    fn get_mut(&mut self, state: UnitState) -> &mut StateTotals {
        match state {
            UnitState::Untranslated => &mut self.untranslated,
            UnitState::Translated => &mut self.translated,
            UnitState::Fuzzy => &mut self.fuzzy,
        }
    }

    pub fn total_units(&self) -> u64 {
        self.translated.units + self.fuzzy.units + self.untranslated.units
    }

    pub fn total_source_words(&self) -> u64 {
        self.translated.source_words + self.fuzzy.source_words + self.untranslated.source_words
    }

    /// The "Completeness" value shown in statistics table.
    pub fn completeness_percentage(&self) -> f64 {
        let total = self.total_units();
        if total == 0 {
            0.0
        } else {
            (self.translated.units as f64 / total as f64) * 100.0
        }
    }

    pub fn word_completeness_percentage(&self) -> f64 {
        let total = self.total_source_words();
        if total == 0 {
            0.0
        } else {
            (self.translated.source_words as f64 / total as f64) * 100.0
        }
    }
}

impl std::ops::AddAssign<&Self> for Totals {
    fn add_assign(&mut self, rhs: &Self) {
        self.translated += &rhs.translated;
        self.fuzzy += &rhs.fuzzy;
        self.untranslated += &rhs.untranslated;
    }
}

/// Stored breakdown of one unit.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UnitStats {
    pub index: usize,
    pub unit_id: String,
    pub state: UnitState,
    pub source_words: u64,
    pub target_words: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n_file::gettext::unit::PoUnit;

    #[test]
    fn tst_unit_state() {
        let mut unit = PoUnit::new("chair");
        assert_eq!(UnitState::of(&unit), UnitState::Untranslated);
        unit.msgstr = vec!["stoel".to_string()];
        assert_eq!(UnitState::of(&unit), UnitState::Translated);
        unit.set_fuzzy(true);
        assert_eq!(UnitState::of(&unit), UnitState::Fuzzy);
        unit.msgstr = vec![String::new()];
        assert_eq!(UnitState::of(&unit), UnitState::Fuzzy);
    }

    #[test]
    fn tst_totals() {
        let mut totals = Totals::new();
        totals.add_unit(UnitState::Translated, 3, 4);
        totals.add_unit(UnitState::Untranslated, 1, 0);
        let mut sum = Totals::new();
        sum += &totals;
        sum += &totals;
        assert_eq!(sum.translated, StateTotals { units: 2, source_words: 6, target_words: 8 });
        assert_eq!(sum.total_units(), 4);
        assert_eq!(sum.completeness_percentage(), 50.0);
        assert_eq!(sum.word_completeness_percentage(), 75.0);
        assert_eq!(Totals::new().completeness_percentage(), 0.0);
    }
}
