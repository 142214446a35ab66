// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error as TeError;
use tracing::warn;

use super::wordcount::{placeholder_re, xml_tag_re};
use crate::config::CheckerConfig;
use crate::i18n_file::common::TranslationUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Cosmetic,
}

pub enum CheckOutcome {
    Pass,
    Fail { severity: Severity, message: String },
}

#[derive(TeError, Debug)]
#[error("Check {check:?} could not run: {reason}")]
pub struct CheckExecutionError {
    pub check: String,
    pub reason: String,
}

/// A failed check, as stored and reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFailure {
    pub name: String,
    pub severity: Severity,
    pub message: String,
}

pub trait QualityCheck {
    fn name(&self) -> &str;
    fn severity(&self) -> Severity;
    fn run(&self, source: &str, target: &str) -> Result<CheckOutcome, CheckExecutionError>;
}

// ===== Builtin checks =====

/// `Ok(Some(message))` on failure, `Err(reason)` when the check can not run.
type CheckFn = fn(&str, &str) -> Result<Option<String>, String>;

pub struct FnCheck {
    name: &'static str,
    severity: Severity,
    func: CheckFn,
}

impl FnCheck {
    pub const fn new(name: &'static str, severity: Severity, func: CheckFn) -> Self {
        FnCheck { name, severity, func }
    }
}

impl QualityCheck for FnCheck {
    fn name(&self) -> &str {
        self.name
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn run(&self, source: &str, target: &str) -> Result<CheckOutcome, CheckExecutionError> {
        match (self.func)(source, target) {
            Ok(None) => Ok(CheckOutcome::Pass),
            Ok(Some(message)) => Ok(CheckOutcome::Fail {
                severity: self.severity,
                message,
            }),
            Err(reason) => Err(CheckExecutionError {
                check: self.name.to_string(),
                reason,
            }),
        }
    }
}

fn sorted_matches(re: &regex::Regex, text: &str) -> Vec<String> {
    let mut found: Vec<String> = re.find_iter(text).map(|m| m.as_str().to_string()).collect();
    found.sort();
    found
}

fn check_variables(source: &str, target: &str) -> Result<Option<String>, String> {
    let expected = sorted_matches(placeholder_re(), source);
    let found = sorted_matches(placeholder_re(), target);
    Ok((expected != found).then(|| format!("placeholders differ: expected {expected:?}, found {found:?}")))
}

fn check_xmltags(source: &str, target: &str) -> Result<Option<String>, String> {
    let expected = sorted_matches(xml_tag_re(), source);
    let found = sorted_matches(xml_tag_re(), target);
    Ok((expected != found).then(|| format!("tags differ: expected {expected:?}, found {found:?}")))
}

fn check_newlines(source: &str, target: &str) -> Result<Option<String>, String> {
    let expected = source.matches('\n').count();
    let found = target.matches('\n').count();
    Ok((expected != found).then(|| format!("expected {expected} line breaks, found {found}")))
}

const END_PUNCTUATION: &[char] = &['.', '!', '?', ':', ';', '…', '。', '！', '？', '：', '；'];

fn check_endpunc(source: &str, target: &str) -> Result<Option<String>, String> {
    let last_punc = |text: &str| text.trim_end().chars().last().filter(|c| END_PUNCTUATION.contains(c));
    let (expected, found) = (last_punc(source), last_punc(target));
    let same_kind = match (expected, found) {
        (Some(a), Some(b)) => a == b || fullwidth_of(a) == Some(b),
        (None, None) => true,
        _ => false,
    };
    Ok((!same_kind).then(|| format!("ending punctuation differs: expected {expected:?}, found {found:?}")))
}

fn fullwidth_of(c: char) -> Option<char> {
    match c {
        '.' => Some('。'),
        '!' => Some('！'),
        '?' => Some('？'),
        ':' => Some('：'),
        ';' => Some('；'),
        _ => None,
    }
}

fn check_startwhitespace(source: &str, target: &str) -> Result<Option<String>, String> {
    let lead = |text: &str| text.chars().take_while(|c| c.is_whitespace()).collect::<String>();
    let (expected, found) = (lead(source), lead(target));
    Ok((expected != found).then(|| format!("leading whitespace differs: expected {expected:?}, found {found:?}")))
}

fn check_endwhitespace(source: &str, target: &str) -> Result<Option<String>, String> {
    let trail = |text: &str| text.len() - text.trim_end().len();
    let (expected, found) = (&source[source.len() - trail(source)..], &target[target.len() - trail(target)..]);
    Ok((expected != found).then(|| format!("trailing whitespace differs: expected {expected:?}, found {found:?}")))
}

fn check_doublespacing(source: &str, target: &str) -> Result<Option<String>, String> {
    let expected = source.matches("  ").count();
    let found = target.matches("  ").count();
    Ok((found > expected).then(|| "translation contains double spaces".to_string()))
}

fn check_unchanged(source: &str, target: &str) -> Result<Option<String>, String> {
    let has_words = source.chars().filter(|c| c.is_alphabetic()).count() > 1;
    Ok((has_words && source == target).then(|| "translation is identical to the source".to_string()))
}

pub const STANDARD_CHECKS: [FnCheck; 8] = [
    FnCheck::new("variables", Severity::Critical, check_variables),
    FnCheck::new("xmltags", Severity::Critical, check_xmltags),
    FnCheck::new("newlines", Severity::Critical, check_newlines),
    FnCheck::new("endpunc", Severity::Cosmetic, check_endpunc),
    FnCheck::new("startwhitespace", Severity::Cosmetic, check_startwhitespace),
    FnCheck::new("endwhitespace", Severity::Cosmetic, check_endwhitespace),
    FnCheck::new("doublespacing", Severity::Cosmetic, check_doublespacing),
    FnCheck::new("unchanged", Severity::Cosmetic, check_unchanged),
];

// ===== Registry =====

/// A named set of checks.
pub struct CheckRegistry {
    name: String,
    checks: Vec<Box<dyn QualityCheck>>,
}

impl CheckRegistry {
    pub fn new(name: &str) -> Self {
        CheckRegistry {
            name: name.to_string(),
            checks: Vec::new(),
        }
    }

    pub fn standard() -> Self {
        let mut registry = Self::new("standard");
        for check in STANDARD_CHECKS {
            registry.register(Box::new(check));
        }
        registry
    }

    pub fn register(&mut self, check: Box<dyn QualityCheck>) {
        self.checks.push(check);
    }

    pub fn with(mut self, check: Box<dyn QualityCheck>) -> Self {
        self.register(check);
        self
    }

    /// Keep only checks picked by the configuration.
    pub fn filtered(mut self, config: &CheckerConfig) -> Self {
        self.checks.retain(|check| config.is_enabled(check.name()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check_names(&self) -> Vec<&str> {
        self.checks.iter().map(|check| check.name()).collect()
    }
}

// ===== Tee checker =====

/// Runs several registries as one checker.
pub struct TeeChecker {
    registries: Vec<CheckRegistry>,
}

impl TeeChecker {
    pub fn new(registries: Vec<CheckRegistry>) -> Self {
        TeeChecker { registries }
    }

    pub fn standard() -> Self {
        Self::new(vec![CheckRegistry::standard()])
    }

    pub fn from_config(config: &CheckerConfig) -> Self {
        Self::new(vec![CheckRegistry::standard().filtered(config)])
    }

    /// Identifies this set of checks, results are cached per fingerprint.
    pub fn fingerprint(&self) -> String {
        self.registries
            .iter()
            .map(|registry| format!("{}:{}", registry.name(), registry.check_names().join(",")))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Run every check once on the unit's singular source and first target.
    ///
    /// Units without a target pass. Checks that fail to run count as passed.
    pub fn run_filters(&self, unit: &dyn TranslationUnit) -> Vec<CheckFailure> {
        let mut failures = Vec::new();
        if !unit.has_target() {
            return failures;
        }
        let source = unit.source_strings().into_iter().next().unwrap_or_default();
        let target = unit.target_strings().into_iter().next().unwrap_or_default();
        let mut seen: HashSet<&str> = HashSet::new();
        for check in self.registries.iter().flat_map(|registry| registry.checks.iter()) {
            if !seen.insert(check.name()) {
                continue;
            }
            match check.run(&source, &target) {
                Ok(CheckOutcome::Pass) => {}
                Ok(CheckOutcome::Fail { severity, message }) => failures.push(CheckFailure {
                    name: check.name().to_string(),
                    severity,
                    message,
                }),
                Err(err) => warn!("Ignoring check failure on unit {:?}: {}", unit.unit_id(), err),
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n_file::gettext::unit::PoUnit;

    fn translated(source: &str, target: &str) -> PoUnit {
        let mut unit = PoUnit::new(source);
        unit.msgstr = vec![target.to_string()];
        unit
    }

    fn failed_names(checker: &TeeChecker, unit: &PoUnit) -> Vec<String> {
        checker.run_filters(unit).into_iter().map(|f| f.name).collect()
    }

    #[test]
    fn tst_standard_checks() {
        let checker = TeeChecker::standard();
        assert!(failed_names(&checker, &translated("Open %s", "Öffne %s")).is_empty());
        assert_eq!(failed_names(&checker, &translated("Open %s", "Öffne")), vec!["variables"]);
        assert_eq!(failed_names(&checker, &translated("<b>Hi</b>", "Hallo")), vec!["xmltags"]);
        assert_eq!(failed_names(&checker, &translated("a\nb", "a b")), vec!["newlines"]);
        assert_eq!(failed_names(&checker, &translated("Done.", "Fertig")), vec!["endpunc"]);
        assert!(failed_names(&checker, &translated("Done.", "完成。")).is_empty());
        assert_eq!(failed_names(&checker, &translated(" lead", "vorne")), vec!["startwhitespace"]);
        assert_eq!(failed_names(&checker, &translated("trail ", "hinten")), vec!["endwhitespace"]);
        assert_eq!(failed_names(&checker, &translated("one two", "eins  zwei")), vec!["doublespacing"]);
        assert_eq!(failed_names(&checker, &translated("Window", "Window")), vec!["unchanged"]);
    }

    #[test]
    fn tst_untranslated_units_are_not_checked() {
        let checker = TeeChecker::standard();
        assert!(checker.run_filters(&PoUnit::new("Open %s")).is_empty());
    }

    struct BrokenCheck;

    impl QualityCheck for BrokenCheck {
        fn name(&self) -> &str {
            "broken"
        }

        fn severity(&self) -> Severity {
            Severity::Critical
        }

        fn run(&self, _source: &str, _target: &str) -> Result<CheckOutcome, CheckExecutionError> {
            Err(CheckExecutionError {
                check: "broken".to_string(),
                reason: "always broken".to_string(),
            })
        }
    }

    #[test]
    fn tst_tee_checker_fails_open_and_dedups() {
        let extra = CheckRegistry::new("extra")
            .with(Box::new(BrokenCheck))
            .with(Box::new(FnCheck::new("variables", Severity::Cosmetic, |_, _| Ok(Some("dup".to_string())))));
        let checker = TeeChecker::new(vec![CheckRegistry::standard(), extra]);
        let failures = checker.run_filters(&translated("Open %s", "Öffne"));
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].severity, Severity::Critical);
        assert!(checker.fingerprint().starts_with("standard:variables,xmltags"));
        assert!(checker.fingerprint().ends_with("extra:broken,variables"));
    }

    #[test]
    fn tst_registry_filtered_by_config() {
        let config = CheckerConfig {
            enabled: Some(vec!["variables".to_string(), "unchanged".to_string()]),
            disabled: vec!["unchanged".to_string()],
        };
        let checker = TeeChecker::from_config(&config);
        assert_eq!(checker.fingerprint(), "standard:variables");
    }
}
