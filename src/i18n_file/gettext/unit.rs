// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

use super::quote::render_part;
use crate::i18n_file::common::{TranslationUnit, UnitError};

/// A single PO entry.
///
/// Comment lines are kept verbatim without their marker, so `#: a.c:1` is
/// stored as `" a.c:1"` in `source_comments`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoUnit {
    /// `#` comments, also everything `#?` that has no other meaning.
    pub translator_comments: Vec<String>,
    /// `#.` comments.
    pub automatic_comments: Vec<String>,
    /// `#:` location comments.
    pub source_comments: Vec<String>,
    /// `#,` flag comments.
    pub type_comments: Vec<String>,
    pub msgctxt: Option<String>,
    /// KDE style `_: ...\n` comment folded into the msgid.
    pub msgid_comment: Option<String>,
    pub msgid: String,
    pub msgid_plural: Option<String>,
    /// One entry for singular units, one per plural form otherwise.
    pub msgstr: Vec<String>,
    pub obsolete: bool,
}

impl PoUnit {
    pub fn new(source: &str) -> Self {
        Self {
            msgid: source.to_string(),
            msgstr: vec![String::new()],
            ..Default::default()
        }
    }

    pub fn context(&self) -> String {
        let mut context = self.msgctxt.clone().unwrap_or_default();
        if let Some(comment) = &self.msgid_comment {
            context.push_str(comment);
        }
        context
    }

    /// The msgid as written in the file, KDE comment included.
    pub fn full_msgid(&self) -> String {
        match &self.msgid_comment {
            Some(comment) => format!("_: {comment}\n{}", self.msgid),
            None => self.msgid.clone(),
        }
    }

    /// Units that only carry comments, like a trailing comment block.
    pub fn is_comment_only(&self) -> bool {
        !self.obsolete
            && self.msgctxt.is_none()
            && self.msgid_comment.is_none()
            && self.msgid.is_empty()
            && self.msgid_plural.is_none()
            && self.msgstr.iter().all(|s| s.is_empty())
    }

    fn has_comments(&self) -> bool {
        !(self.translator_comments.is_empty()
            && self.automatic_comments.is_empty()
            && self.source_comments.is_empty()
            && self.type_comments.is_empty())
    }

    /// Nothing would be written for this unit.
    pub fn is_empty(&self) -> bool {
        self.is_comment_only() && !self.has_comments()
    }
}

// ===== Flags & Comments =====

impl PoUnit {
    pub fn flags(&self) -> Vec<String> {
        self.type_comments
            .iter()
            .flat_map(|line| line.split(','))
            .map(|flag| flag.trim().to_string())
            .filter(|flag| !flag.is_empty())
            .collect()
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags().iter().any(|f| f == flag)
    }

    pub fn set_flag(&mut self, flag: &str, present: bool) {
        if present {
            if !self.has_flag(flag) {
                self.type_comments.push(format!(" {flag}"));
            }
            return;
        }
        if !self.has_flag(flag) {
            return;
        }
        self.type_comments = self
            .type_comments
            .iter()
            .filter_map(|line| {
                let remaining: Vec<&str> = line
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty() && *f != flag)
                    .collect();
                (!remaining.is_empty()).then(|| format!(" {}", remaining.join(", ")))
            })
            .collect();
    }

    pub fn add_location(&mut self, location: &str) {
        self.source_comments.push(format!(" {location}"));
    }

    /// Turn the location list into a KDE msgid comment, used to tell
    /// duplicates apart.
    pub fn annotate_with_locations(&mut self) {
        let locations = self.locations();
        if !locations.is_empty() {
            self.msgid_comment = Some(locations.join(" "));
        }
    }

    /// Same as [`Self::annotate_with_locations`] but through `msgctxt`.
    pub fn contextualize_with_locations(&mut self) {
        let locations = self.locations();
        if !locations.is_empty() {
            self.msgctxt = Some(locations.join(" "));
        }
    }

    pub fn make_obsolete(&mut self) {
        self.obsolete = true;
        self.source_comments.clear();
        self.automatic_comments.clear();
    }

    pub fn resurrect(&mut self) {
        self.obsolete = false;
    }
}

fn comment_line(line: &str) -> String {
    if line.is_empty() {
        String::new()
    } else {
        format!(" {line}")
    }
}

// ===== Merge =====

impl PoUnit {
    /// Merge `other` into this unit.
    ///
    /// Comments are combined unless `comments` is false, and location tokens
    /// are merged one by one. With `authoritative`, this unit's automatic and
    /// location comments are kept as they are. The other target is taken when
    /// this unit is not translated yet or when `overwrite` is set, and the
    /// unit is marked fuzzy when the two disagree.
    pub fn merge(&mut self, other: &PoUnit, overwrite: bool, comments: bool, authoritative: bool) {
        fn merge_lines(into: &mut Vec<String>, from: &[String]) {
            for line in from {
                if !into.contains(line) {
                    into.push(line.clone());
                }
            }
        }

        if comments {
            merge_lines(&mut self.translator_comments, &other.translator_comments);
            merge_lines(&mut self.type_comments, &other.type_comments);
            if !authoritative {
                merge_lines(&mut self.automatic_comments, &other.automatic_comments);
                let known = self.locations();
                for location in other.locations() {
                    if !known.contains(&location) {
                        self.add_location(&location);
                    }
                }
            }
        }

        let same_source = self.msgid == other.msgid && self.msgid_plural == other.msgid_plural;
        if !self.is_translated() || overwrite {
            self.msgstr = other.msgstr.clone();
            if !same_source || self.context() != other.context() {
                self.set_flag("fuzzy", true);
            } else {
                self.set_flag("fuzzy", other.is_fuzzy());
            }
        } else if !other.is_translated() {
            if !same_source {
                self.set_flag("fuzzy", true);
            }
        } else if self.msgstr != other.msgstr {
            self.set_flag("fuzzy", true);
        }
    }
}

// ===== Render =====

impl PoUnit {
    /// Render this unit, every line ending with `\n`.
    pub fn render(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        lines.extend(self.translator_comments.iter().map(|c| format!("#{c}")));
        lines.extend(self.automatic_comments.iter().map(|c| format!("#.{c}")));
        lines.extend(self.source_comments.iter().map(|c| format!("#:{c}")));
        lines.extend(self.type_comments.iter().map(|c| format!("#,{c}")));

        if !self.is_comment_only() {
            let mut body: Vec<String> = Vec::new();
            if let Some(msgctxt) = &self.msgctxt {
                body.extend(render_part("msgctxt", msgctxt));
            }
            body.extend(render_part("msgid", &self.full_msgid()));
            match &self.msgid_plural {
                Some(plural) => {
                    body.extend(render_part("msgid_plural", plural));
                    if self.msgstr.is_empty() {
                        body.extend(render_part("msgstr[0]", ""));
                    }
                    for (index, form) in self.msgstr.iter().enumerate() {
                        body.extend(render_part(&format!("msgstr[{index}]"), form));
                    }
                }
                None => {
                    let target = self.msgstr.first().map(String::as_str).unwrap_or_default();
                    body.extend(render_part("msgstr", target));
                }
            }
            if self.obsolete {
                lines.extend(body.into_iter().map(|line| format!("#~ {line}")));
            } else {
                lines.extend(body);
            }
        }

        lines.into_iter().map(|line| line + "\n").collect()
    }
}

// ===== Unit trait =====

impl TranslationUnit for PoUnit {
    fn unit_id(&self) -> String {
        if self.msgid_comment.is_some() {
            return format!("_: {}\n{}", self.context(), self.msgid);
        }
        match &self.msgctxt {
            Some(msgctxt) if !msgctxt.is_empty() => format!("{msgctxt}\u{4}{}", self.msgid),
            _ => self.msgid.clone(),
        }
    }

    fn source_strings(&self) -> Vec<String> {
        let mut sources = vec![self.msgid.clone()];
        if let Some(plural) = &self.msgid_plural {
            sources.push(plural.clone());
        }
        sources
    }

    fn target_strings(&self) -> Vec<String> {
        if self.msgstr.is_empty() {
            return vec![String::new()];
        }
        if self.msgid_plural.is_some() {
            self.msgstr.clone()
        } else {
            self.msgstr[..1].to_vec()
        }
    }

    fn has_plural(&self) -> bool {
        self.msgid_plural.is_some()
    }

    fn is_fuzzy(&self) -> bool {
        self.has_flag("fuzzy")
    }

    fn is_obsolete(&self) -> bool {
        self.obsolete
    }

    fn is_header(&self) -> bool {
        self.msgid.is_empty()
            && self.msgid_comment.is_none()
            && self.msgctxt.is_none()
            && self.source_comments.is_empty()
            && self.msgstr.iter().any(|s| !s.is_empty())
    }

    fn is_blank(&self) -> bool {
        !self.is_header()
            && self.msgid.is_empty()
            && self.msgid_comment.is_none()
            && self.msgstr.iter().all(|s| s.is_empty())
    }

    fn is_review(&self) -> bool {
        self.has_flag("review")
            || self.translator_comments.iter().any(|line| {
                let line = line.trim_start();
                line.starts_with("(review)") || line.starts_with("(pofilter)")
            })
    }

    fn locations(&self) -> Vec<String> {
        self.source_comments
            .iter()
            .flat_map(|line| line.split_whitespace())
            .map(str::to_string)
            .collect()
    }

    fn translator_comments(&self) -> String {
        self.translator_comments
            .iter()
            .map(|line| line.strip_prefix(' ').unwrap_or(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn set_target(&mut self, target: Vec<String>) -> Result<(), UnitError> {
        if self.msgid_plural.is_some() {
            self.msgstr = if target.is_empty() { vec![String::new()] } else { target };
            return Ok(());
        }
        self.msgstr = match target.len() {
            0 => vec![String::new()],
            1 => target,
            found => return Err(UnitError::TooManyForms { found }),
        };
        Ok(())
    }

    fn set_fuzzy(&mut self, fuzzy: bool) {
        self.set_flag("fuzzy", fuzzy);
    }

    fn set_translator_comments(&mut self, comments: Option<&str>) {
        self.translator_comments = comments
            .map(|text| text.lines().map(comment_line).collect())
            .unwrap_or_default();
    }
}
