// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

use std::sync::OnceLock;

use regex::Regex;

use crate::i18n_file::common::TranslationUnit;

fn kde_plural_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^_n: ").unwrap())
}

fn br_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<br\s*?/?>").unwrap())
}

pub(crate) fn xml_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

/// printf style, python named and brace placeholders.
pub(crate) fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"%(\d+\$)?[-+#0]*\d*(\.\d+)?[sdifuxXeEgGcp]|%\(\w+\)[sdif]|\{[^{}\s]*\}").unwrap()
    })
}

fn dot_between_letters_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\D\.\D").unwrap())
}

/// Count the words of a text the way a translator would.
///
/// Markup and placeholders carry no words and a dot between two non-digits
/// splits them, so `file.txt` is two words while `3.14` is one.
pub fn wordcount(text: &str) -> usize {
    let text = kde_plural_re().replace(text, "");
    let text = br_tag_re().replace_all(&text, "\n");
    let text = xml_tag_re().replace_all(&text, "");
    let text = placeholder_re().replace_all(&text, " ");
    let text = dot_between_letters_re().replace_all(&text, " ");
    text.split_whitespace()
        .map(|token| token.trim_matches(|c: char| !(c.is_alphanumeric() || c == '_')))
        .filter(|token| !token.is_empty())
        .count()
}

/// Source and target word counts of a unit.
///
/// Target words only count once the unit is translated.
pub fn words_in_unit(unit: &dyn TranslationUnit) -> (u64, u64) {
    let source_words = unit.source_strings().iter().map(|s| wordcount(s) as u64).sum();
    let target_words = if unit.is_translated() {
        unit.target_strings()
            .iter()
            .filter(|form| !form.is_empty())
            .map(|form| wordcount(form) as u64)
            .sum()
    } else {
        0
    };
    (source_words, target_words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n_file::gettext::unit::PoUnit;

    #[test]
    fn tst_wordcount_plain() {
        assert_eq!(wordcount(""), 0);
        assert_eq!(wordcount("   "), 0);
        assert_eq!(wordcount("Hello, world!"), 2);
        assert_eq!(wordcount("Ünïcödé wörds ünd mehr"), 4);
        assert_eq!(wordcount("-- ... --"), 0);
    }

    #[test]
    fn tst_wordcount_ignores_placeholders() {
        assert_eq!(wordcount("The {0} file"), 2);
        assert_eq!(wordcount("Copied %d of %s files"), 3);
        assert_eq!(wordcount("Hello %(name)s"), 1);
        assert_eq!(wordcount("%1$s deleted"), 1);
    }

    #[test]
    fn tst_wordcount_markup_and_dots() {
        assert_eq!(wordcount("<b>Bold</b> text"), 2);
        assert_eq!(wordcount("line<br/>break"), 2);
        assert_eq!(wordcount("_n: one file"), 2);
        assert_eq!(wordcount("open file.txt"), 3);
        assert_eq!(wordcount("pi is 3.14"), 3);
    }

    #[test]
    fn tst_words_in_unit() {
        let mut unit = PoUnit::new("%d open file");
        unit.msgid_plural = Some("%d open files".to_string());
        unit.msgstr = vec!["%d geopend bestand".to_string(), String::new()];
        assert_eq!(words_in_unit(&unit), (4, 2));

        unit.set_fuzzy(true);
        assert_eq!(words_in_unit(&unit), (4, 0));
    }
}
