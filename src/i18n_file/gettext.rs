// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

pub mod header;
pub mod quote;
pub mod unit;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error as TeError;

use self::header::{Charset, HeaderDefaults, HeaderFields};
use self::quote::extract_literal;
use self::unit::PoUnit;
use super::common::TranslationUnit;

// ===== PO Basic =====

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoStore {
    pub units: Vec<PoUnit>,
    pub charset: Charset,
}

impl PoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding nothing but a freshly made header.
    pub fn with_header(defaults: HeaderDefaults) -> Self {
        let mut store = Self::new();
        store.make_header(defaults);
        store
    }

    pub fn header(&self) -> Option<&PoUnit> {
        self.units.first().filter(|unit| unit.is_header())
    }

    pub fn header_mut(&mut self) -> Option<&mut PoUnit> {
        self.units.first_mut().filter(|unit| unit.is_header())
    }

    /// Units that carry translatable content, with their store index.
    pub fn translatable_units(&self) -> impl Iterator<Item = (usize, &PoUnit)> {
        self.units.iter().enumerate().filter(|(_, unit)| unit.is_translatable())
    }
}

// ===== PO Header =====

impl PoStore {
    pub fn parse_header(&self) -> HeaderFields {
        self.header()
            .and_then(|unit| unit.msgstr.first())
            .map(|text| header::parse_header_string(text))
            .unwrap_or_default()
    }

    /// Update header fields, creating the header first when there is none
    /// and `add` is set. The header's fuzzy flag is dropped.
    pub fn update_header(&mut self, add: bool, updates: &[(&str, String)]) {
        let fields = header::update_header_fields(&self.parse_header(), add, updates);
        let rendered = header::render_header_string(&fields);
        match self.header_mut() {
            Some(unit) => {
                unit.msgstr = vec![rendered];
                unit.set_fuzzy(false);
            }
            None if add && !fields.is_empty() => {
                let mut unit = PoUnit::new("");
                unit.msgstr = vec![rendered];
                self.units.insert(0, unit);
            }
            None => {}
        }
    }

    /// Replace the header with one built from `defaults`.
    pub fn make_header(&mut self, defaults: HeaderDefaults) {
        if self.header().is_some() {
            self.units.remove(0);
        }
        let fields = defaults.into_fields();
        let updates: Vec<(&str, String)> = fields.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
        self.update_header(true, &updates);
    }

    pub fn header_plural(&self) -> (Option<u32>, Option<String>) {
        let fields = self.parse_header();
        match header::header_field(&fields, "Plural-Forms") {
            Some(value) => header::parse_plural_forms(value),
            None => (None, None),
        }
    }

    pub fn update_header_plural(&mut self, nplurals: u32, plural: &str) {
        let value = header::render_plural_forms(nplurals, plural);
        self.update_header(true, &[("Plural-Forms", value)]);
    }
}

// ===== PO Parse =====

#[derive(TeError, Debug)]
pub enum PoParseError {
    #[error("Syntax error at line {line}: {detail}")]
    Syntax { line: usize, detail: String },
    #[error("Content is not valid {charset} near line {line}")]
    Decode { charset: &'static str, line: usize },
    #[error("Unsupported charset {0:?}")]
    UnsupportedCharset(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentKind {
    Translator,
    Automatic,
    Source,
    Type,
}

/// Which part of a unit incoming string literals belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Between units.
    Idle,
    InComment(CommentKind),
    InMsgctxt,
    InMsgid,
    InMsgidPlural,
    /// `None` for a plain `msgstr`, the form index for `msgstr[N]`.
    InMsgstr(Option<usize>),
}

#[derive(Debug, Default)]
struct UnitBuilder {
    unit: PoUnit,
    msgctxt: Option<String>,
    msgid: Option<String>,
    msgid_plural: Option<String>,
    msgstr: Option<String>,
    msgstr_forms: BTreeMap<usize, String>,
}

impl UnitBuilder {
    fn is_obsolete(&self) -> bool {
        self.unit.obsolete
    }

    fn append(&mut self, state: ParseState, text: &str) {
        let slot = match state {
            ParseState::InMsgctxt => self.msgctxt.get_or_insert_with(String::new),
            ParseState::InMsgid => self.msgid.get_or_insert_with(String::new),
            ParseState::InMsgidPlural => self.msgid_plural.get_or_insert_with(String::new),
            ParseState::InMsgstr(None) => self.msgstr.get_or_insert_with(String::new),
            ParseState::InMsgstr(Some(index)) => self.msgstr_forms.entry(index).or_default(),
            ParseState::Idle | ParseState::InComment(_) => return,
        };
        slot.push_str(text);
    }

    fn push_comment(&mut self, kind: CommentKind, content: &str) {
        let content = content.to_string();
        match kind {
            CommentKind::Translator => self.unit.translator_comments.push(content),
            CommentKind::Automatic => self.unit.automatic_comments.push(content),
            CommentKind::Source => self.unit.source_comments.push(content),
            CommentKind::Type => self.unit.type_comments.push(content),
        }
    }

    fn finish(self) -> Option<PoUnit> {
        let mut unit = self.unit;
        let msgid = self.msgid.unwrap_or_default();
        match msgid.strip_prefix("_:").and_then(|rest| rest.split_once('\n')) {
            Some((comment, source)) => {
                let comment = comment.strip_prefix(' ').unwrap_or(comment);
                unit.msgid_comment = Some(comment.to_string());
                unit.msgid = source.to_string();
            }
            None => unit.msgid = msgid,
        }
        unit.msgctxt = self.msgctxt;
        unit.msgid_plural = self.msgid_plural;
        unit.msgstr = if unit.msgid_plural.is_some() {
            match self.msgstr_forms.keys().next_back() {
                Some(&last) => (0..=last)
                    .map(|index| self.msgstr_forms.get(&index).cloned().unwrap_or_default())
                    .collect(),
                None => vec![self.msgstr.unwrap_or_default()],
            }
        } else {
            let single = self.msgstr.or_else(|| self.msgstr_forms.get(&0).cloned());
            vec![single.unwrap_or_default()]
        };
        (!unit.is_empty()).then_some(unit)
    }
}

fn syntax_error(line: usize, detail: impl Into<String>) -> PoParseError {
    PoParseError::Syntax { line, detail: detail.into() }
}

fn flush(builder: &mut UnitBuilder, units: &mut Vec<PoUnit>) {
    if let Some(unit) = std::mem::take(builder).finish() {
        units.push(unit);
    }
}

fn parse_units(text: &str) -> Result<Vec<PoUnit>, PoParseError> {
    let mut units = Vec::new();
    let mut builder = UnitBuilder::default();
    let mut state = ParseState::Idle;

    for (number, raw_line) in text.split('\n').enumerate() {
        let line_number = number + 1;
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        if line.trim().is_empty() {
            flush(&mut builder, &mut units);
            state = ParseState::Idle;
            continue;
        }

        let (line, obsolete) = match line.strip_prefix("#~") {
            // "#~|" keeps previous-msgid data of obsolete units, a plain comment.
            Some(rest) if !rest.starts_with('|') => (rest.strip_prefix(' ').unwrap_or(rest), true),
            _ => (line, false),
        };

        if line.starts_with('#') {
            if matches!(state, ParseState::InMsgstr(_)) {
                flush(&mut builder, &mut units);
            }
            let (kind, content) = match line[1..].chars().next() {
                Some('.') => (CommentKind::Automatic, &line[2..]),
                Some(':') => (CommentKind::Source, &line[2..]),
                Some(',') => (CommentKind::Type, &line[2..]),
                _ => (CommentKind::Translator, &line[1..]),
            };
            builder.push_comment(kind, content);
            state = ParseState::InComment(kind);
            continue;
        }
        if obsolete && !builder.is_obsolete() && matches!(state, ParseState::InMsgstr(_)) {
            flush(&mut builder, &mut units);
            state = ParseState::Idle;
        }

        let trimmed = line.trim_start();
        if trimmed.starts_with('"') {
            let value = extract_literal(trimmed).ok_or_else(|| syntax_error(line_number, "unterminated string"))?;
            match state {
                ParseState::Idle | ParseState::InComment(_) => {
                    return Err(syntax_error(line_number, "string without a keyword"));
                }
                _ => builder.append(state, &value),
            }
            continue;
        }

        let (keyword, rest) = trimmed.split_once(char::is_whitespace).unwrap_or((trimmed, ""));
        let next = match keyword {
            "msgctxt" => ParseState::InMsgctxt,
            "msgid" => ParseState::InMsgid,
            "msgid_plural" => ParseState::InMsgidPlural,
            "msgstr" => ParseState::InMsgstr(None),
            _ => match keyword.strip_prefix("msgstr[").and_then(|k| k.strip_suffix(']')) {
                Some(index) => {
                    let index = index
                        .parse::<usize>()
                        .map_err(|_| syntax_error(line_number, format!("bad plural index {index:?}")))?;
                    ParseState::InMsgstr(Some(index))
                }
                None => return Err(syntax_error(line_number, format!("unknown keyword {keyword:?}"))),
            },
        };
        let value = extract_literal(rest).ok_or_else(|| syntax_error(line_number, "unterminated string"))?;

        let starts_new_unit = match next {
            ParseState::InMsgctxt => matches!(state, ParseState::InMsgstr(_) | ParseState::InMsgid | ParseState::InMsgidPlural),
            ParseState::InMsgid => matches!(state, ParseState::InMsgstr(_) | ParseState::InMsgidPlural),
            _ => false,
        };
        if starts_new_unit {
            flush(&mut builder, &mut units);
        }
        if obsolete {
            builder.unit.obsolete = true;
        }
        builder.append(next, &value);
        state = next;
    }
    flush(&mut builder, &mut units);
    Ok(units)
}

/// The first blank-line delimited block that holds more than comments.
fn first_entry_block(text: &str) -> Option<String> {
    let mut block: Vec<&str> = Vec::new();
    for line in text.lines().chain(std::iter::once("")) {
        if !line.trim().is_empty() {
            block.push(line);
            continue;
        }
        if block.iter().any(|line| !line.trim_start().starts_with('#')) {
            return Some(block.join("\n"));
        }
        block.clear();
    }
    None
}

/// Charset declared by the first entry, when it is a header. Leading
/// comment-only blocks are skipped.
fn detect_charset(preview: &str) -> Result<Charset, PoParseError> {
    let Some(block) = first_entry_block(preview) else {
        return Ok(Charset::default());
    };
    let units = parse_units(&block)?;
    let header = match units.first().filter(|unit| unit.is_header()) {
        Some(header) => header,
        None => return Ok(Charset::default()),
    };
    let fields = header::parse_header_string(header.msgstr.first().map(String::as_str).unwrap_or_default());
    match header::header_field(&fields, "Content-Type").and_then(header::declared_charset) {
        Some(label) => Charset::from_label(label),
        None => Ok(Charset::default()),
    }
}

impl PoStore {
    pub fn parse_bytes(bytes: &[u8]) -> Result<PoStore, PoParseError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let charset = detect_charset(&String::from_utf8_lossy(bytes))?;
        let text = charset.decode(bytes)?;
        Ok(PoStore {
            units: parse_units(&text)?,
            charset,
        })
    }

    pub fn parse_str(content: &str) -> Result<PoStore, PoParseError> {
        Self::parse_bytes(content.as_bytes())
    }
}

// ===== PO Serialize =====

impl PoStore {
    /// Units separated by a blank line, ending with a single newline.
    pub fn serialize(&self) -> String {
        self.units
            .iter()
            .map(PoUnit::render)
            .filter(|rendered| !rendered.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PoSaveError> {
        self.charset.encode(&self.serialize())
    }
}

impl fmt::Display for PoStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

// ===== PO Load & Save =====

#[derive(TeError, Debug)]
pub enum PoLoadError {
    #[error("Fail to read PO file: {0}")]
    ReadPo(#[from] std::io::Error),
    #[error("Fail to parse PO file: {0}")]
    ParsePo(#[from] PoParseError),
}

#[derive(TeError, Debug)]
pub enum PoSaveError {
    #[error("Fail to save PO file: {0}")]
    WritePo(#[from] std::io::Error),
    #[error("Character {character:?} can not be encoded as {charset}")]
    Unencodable { charset: &'static str, character: char },
}

impl PoStore {
    pub fn load_from_file(po_file: &Path) -> Result<PoStore, PoLoadError> {
        let bytes = std::fs::read(po_file)?;
        Ok(Self::parse_bytes(&bytes)?)
    }

    pub fn save_into_file(&self, po_file: &Path) -> Result<(), PoSaveError> {
        let bytes = self.to_bytes()?;
        std::fs::write(po_file, bytes)?;
        Ok(())
    }
}

// ===== Duplicates =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateStyle {
    /// Merge duplicates into the first occurrence.
    #[default]
    Merge,
    /// Leave duplicates untouched.
    Keep,
    /// Tell duplicates apart with a KDE msgid comment made of their locations.
    #[value(name = "msgid_comment")]
    MsgidComment,
    /// Like `msgid_comment`, applied to every unit.
    #[value(name = "msgid_comment_all")]
    MsgidCommentAll,
    /// Tell duplicates apart with a msgctxt made of their locations.
    Msgctxt,
}

#[derive(TeError, Debug)]
#[error("Unknown duplicate style {0:?}")]
pub struct UnknownDuplicateStyleError(String);

impl FromStr for DuplicateStyle {
    type Err = UnknownDuplicateStyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "merge" => Ok(Self::Merge),
            "keep" => Ok(Self::Keep),
            "msgid_comment" => Ok(Self::MsgidComment),
            "msgid_comment_all" => Ok(Self::MsgidCommentAll),
            "msgctxt" => Ok(Self::Msgctxt),
            _ => Err(UnknownDuplicateStyleError(s.to_string())),
        }
    }
}

impl fmt::Display for DuplicateStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Merge => "merge",
            Self::Keep => "keep",
            Self::MsgidComment => "msgid_comment",
            Self::MsgidCommentAll => "msgid_comment_all",
            Self::Msgctxt => "msgctxt",
        };
        f.write_str(name)
    }
}

fn duplicate_key(unit: &PoUnit, style: DuplicateStyle) -> String {
    let msgctxt = unit.msgctxt.as_deref().unwrap_or_default();
    match style {
        DuplicateStyle::MsgidComment | DuplicateStyle::MsgidCommentAll => {
            format!("{msgctxt}\u{4}{}", unit.full_msgid())
        }
        _ => format!("{msgctxt}\u{4}{}", unit.msgid),
    }
}

impl PoStore {
    pub fn remove_duplicates(&mut self, style: DuplicateStyle) {
        let mut unique: Vec<PoUnit> = Vec::with_capacity(self.units.len());
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut marked: HashSet<usize> = HashSet::new();

        for mut unit in std::mem::take(&mut self.units) {
            if unit.is_header() {
                unique.push(unit);
                continue;
            }
            if style == DuplicateStyle::MsgidCommentAll {
                unit.annotate_with_locations();
                unique.push(unit);
                continue;
            }
            let key = duplicate_key(&unit, style);
            let original = match seen.get(&key) {
                Some(&original) => original,
                None => {
                    if unit.msgid.is_empty() && style != DuplicateStyle::Keep {
                        unit.annotate_with_locations();
                    }
                    seen.insert(key, unique.len());
                    unique.push(unit);
                    continue;
                }
            };
            match style {
                DuplicateStyle::Merge if unit.msgid.is_empty() => {
                    unit.annotate_with_locations();
                    unique.push(unit);
                }
                DuplicateStyle::Merge => unique[original].merge(&unit, false, true, false),
                DuplicateStyle::MsgidComment => {
                    if marked.insert(original) {
                        unique[original].annotate_with_locations();
                    }
                    unit.annotate_with_locations();
                    unique.push(unit);
                }
                DuplicateStyle::Msgctxt => {
                    if marked.insert(original) {
                        unique[original].contextualize_with_locations();
                    }
                    unit.contextualize_with_locations();
                    unique.push(unit);
                }
                DuplicateStyle::Keep | DuplicateStyle::MsgidCommentAll => unique.push(unit),
            }
        }
        self.units = unique;
    }
}

// ===== Template update =====

impl PoStore {
    /// Bring this translation in line with a new template.
    ///
    /// Translations are reused by unit id. Comments and locations come from
    /// the template. Translated units that vanished from the template are kept
    /// at the end as obsolete units.
    pub fn update_from_template(&mut self, template: &PoStore) {
        let nplurals = self.header_plural().0.unwrap_or(2) as usize;
        let mut existing: Vec<Option<PoUnit>> = std::mem::take(&mut self.units).into_iter().map(Some).collect();
        let mut merged: Vec<PoUnit> = Vec::with_capacity(template.units.len() + 1);
        if existing.first().is_some_and(|u| u.as_ref().is_some_and(|u| u.is_header())) {
            merged.extend(existing[0].take());
        }

        let mut by_id: HashMap<String, usize> = HashMap::new();
        for (index, unit) in existing.iter().enumerate() {
            if let Some(unit) = unit {
                by_id.entry(unit.unit_id()).or_insert(index);
            }
        }

        for template_unit in template.units.iter().filter(|u| !u.is_header() && !u.obsolete) {
            let reused = by_id
                .get(&template_unit.unit_id())
                .and_then(|&index| existing[index].take());
            match reused {
                Some(mut unit) => {
                    unit.resurrect();
                    unit.automatic_comments = template_unit.automatic_comments.clone();
                    unit.source_comments = template_unit.source_comments.clone();
                    if unit.msgid_plural != template_unit.msgid_plural {
                        unit.msgid_plural = template_unit.msgid_plural.clone();
                        unit.set_fuzzy(true);
                    }
                    merged.push(unit);
                }
                None => {
                    let mut fresh = template_unit.clone();
                    fresh.msgstr = match fresh.msgid_plural {
                        Some(_) => vec![String::new(); nplurals.max(1)],
                        None => vec![String::new()],
                    };
                    merged.push(fresh);
                }
            }
        }

        for mut vanished in existing.into_iter().flatten() {
            if vanished.obsolete || vanished.has_target() {
                vanished.make_obsolete();
                merged.push(vanished);
            }
        }
        self.units = merged;
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    pub const TEST_ZH_CN_PO_CONTENT: &str = r#"msgid ""
msgstr ""
"MIME-Version: 1.0\n"
"Content-Type: text/plain; charset=UTF-8\n"
"Content-Transfer-Encoding: 8bit\n"
"Plural-Forms: nplurals=1; plural=0;\n"
"Language: zh_CN\n"
"X-Source-Language: C\n"

#: ../../widget/mainwindow.ui:17
msgctxt "SampleContext"
msgid "A friend in need is a friend indeed"
msgstr "海内存知己"

# translator says hi
#. extracted note
#: ../../widget/mainwindow.ui:43 ../../widget/mainwindow.cpp:65
#, c-format
msgctxt "SampleContext"
msgid "Software engineer using mouse to manipulate the cursor on the screen %s"
msgstr "软件开发工程师在使用鼠标操作屏幕上的光标 %s"

#, fuzzy
#~ msgctxt "SampleContext"
#~ msgid "TV band"
#~ msgstr "电视频段"

msgctxt "SampleContext"
msgid "England"
msgstr ""
"#;

    pub const TEST_THREE_UNITS_PO_CONTENT: &str = r#"msgid ""
msgstr ""
"Content-Type: text/plain; charset=UTF-8\n"

#: test.c
msgid "test"
msgstr "rest"

#, fuzzy
msgid "tabel"
msgstr "tafel"

msgid "chair"
msgstr ""
"#;

    #[test]
    fn tst_parse_po_content() {
        let po = PoStore::parse_str(TEST_ZH_CN_PO_CONTENT).unwrap();
        assert_eq!(po.units.len(), 5);
        assert_eq!(header::header_field(&po.parse_header(), "Language"), Some("zh_CN"));
        assert_eq!(po.charset, Charset::Utf8);

        let second = &po.units[2];
        assert_eq!(second.translator_comments, vec![" translator says hi"]);
        assert_eq!(second.automatic_comments, vec![" extracted note"]);
        assert_eq!(second.locations(), vec!["../../widget/mainwindow.ui:43", "../../widget/mainwindow.cpp:65"]);
        assert_eq!(second.flags(), vec!["c-format"]);
        assert_eq!(second.msgctxt.as_deref(), Some("SampleContext"));

        let obsolete = &po.units[3];
        assert!(obsolete.obsolete);
        assert!(obsolete.is_fuzzy());
        assert_eq!(obsolete.msgstr, vec!["电视频段"]);
        assert!(!obsolete.is_translatable());

        assert_eq!(po.translatable_units().count(), 3);
    }

    #[test]
    fn tst_roundtrip_is_lossless() {
        let po = PoStore::parse_str(TEST_ZH_CN_PO_CONTENT).unwrap();
        let serialized = po.serialize();
        let reparsed = PoStore::parse_str(&serialized).unwrap();
        assert_eq!(po, reparsed);
        assert_eq!(reparsed.serialize(), serialized);
    }

    #[test]
    fn tst_roundtrip_wrapped_and_plural() {
        let content = r#"msgid ""
"This is a long message which has to be wrapped because it does not fit on one line"
msgstr ""
"Dies ist eine lange Nachricht, die umbrochen werden muss, weil sie nicht in eine "
"Zeile passt\n"
"Und noch eine"

msgid "_: KDE context\n"
"%d file"
msgid_plural "%d files"
msgstr[0] "%d Datei"
msgstr[1] ""
"#;
        let po = PoStore::parse_str(content).unwrap();
        assert_eq!(po.units.len(), 2);
        assert!(po.units[0].msgstr[0].ends_with("Zeile passt\nUnd noch eine"));
        let plural = &po.units[1];
        assert_eq!(plural.msgid_comment.as_deref(), Some("KDE context"));
        assert_eq!(plural.msgid, "%d file");
        assert_eq!(plural.unit_id(), "_: KDE context\n%d file");
        assert_eq!(plural.msgstr, vec!["%d Datei", ""]);

        let once = po.serialize();
        let twice = PoStore::parse_str(&once).unwrap();
        assert_eq!(po, twice);
        assert_eq!(twice.serialize(), once);
    }

    #[test]
    fn tst_units_without_blank_lines() {
        let content = "msgid \"a\"\nmsgstr \"b\"\nmsgid \"c\"\nmsgstr \"d\"\n# note\nmsgid \"e\"\nmsgstr \"\"\n";
        let po = PoStore::parse_str(content).unwrap();
        let ids: Vec<&str> = po.units.iter().map(|u| u.msgid.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "e"]);
        assert_eq!(po.units[2].translator_comments, vec![" note"]);
    }

    #[test]
    fn tst_syntax_errors() {
        let cases = [
            ("msgid \"open\nmsgstr \"\"\n", 1),
            ("\"orphan\"\n", 1),
            ("msgid \"a\"\nmsgfoo \"b\"\n", 2),
            ("msgid \"a\"\nmsgid_plural \"as\"\nmsgstr[x] \"\"\n", 3),
        ];
        for (content, expected_line) in cases {
            match PoStore::parse_str(content) {
                Err(PoParseError::Syntax { line, .. }) => assert_eq!(line, expected_line, "{content:?}"),
                other => panic!("expected syntax error for {content:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn tst_latin1_charset() {
        let mut bytes = b"msgid \"\"\nmsgstr \"Content-Type: text/plain; charset=ISO-8859-1\\n\"\n\n".to_vec();
        bytes.extend_from_slice(b"msgid \"coffee\"\nmsgstr \"caf\xe9\"\n");
        let po = PoStore::parse_bytes(&bytes).unwrap();
        assert_eq!(po.charset, Charset::Latin1);
        assert_eq!(po.units[1].msgstr, vec!["café"]);
        assert_eq!(po.to_bytes().unwrap(), bytes);

        let unsupported = b"msgid \"\"\nmsgstr \"Content-Type: text/plain; charset=KOI8-R\\n\"\n";
        assert!(matches!(
            PoStore::parse_bytes(unsupported),
            Err(PoParseError::UnsupportedCharset(_))
        ));
        assert!(matches!(
            PoStore::parse_bytes(b"msgid \"a\"\nmsgstr \"\xff\"\n"),
            Err(PoParseError::Decode { line: 2, .. })
        ));
    }

    #[test]
    fn tst_charset_after_comment_block() {
        let mut bytes = b"# Dutch translation of coffee.\n# Copyright holders.\n\n".to_vec();
        bytes.extend_from_slice(b"msgid \"\"\nmsgstr \"Content-Type: text/plain; charset=ISO-8859-1\\n\"\n\n");
        bytes.extend_from_slice(b"msgid \"coffee\"\nmsgstr \"caf\xe9\"\n");
        let po = PoStore::parse_bytes(&bytes).unwrap();
        assert_eq!(po.charset, Charset::Latin1);
        assert!(po.units.iter().any(|unit| unit.msgstr == vec!["café"]));

        assert_eq!(detect_charset("# only comments\n\n#. more\n").unwrap(), Charset::default());
    }

    #[test]
    fn tst_header_operations() {
        let mut po = PoStore::parse_str(TEST_THREE_UNITS_PO_CONTENT).unwrap();
        assert_eq!(po.header_plural(), (None, None));
        po.update_header_plural(2, "(n != 1)");
        po.update_header(true, &[("Language", "nl".to_string())]);
        assert_eq!(po.header_plural(), (Some(2), Some("(n != 1)".to_string())));
        assert_eq!(header::header_field(&po.parse_header(), "Language"), Some("nl"));
        let keys: Vec<String> = po.parse_header().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Language", "Content-Type", "Plural-Forms"]);

        let mut fresh = PoStore::new();
        fresh.units.push(PoUnit::new("hello"));
        fresh.update_header(true, &[("X-Generator", "postats".to_string())]);
        assert!(fresh.units[0].is_header());
        assert_eq!(fresh.units[1].msgid, "hello");

        let made = PoStore::with_header(HeaderDefaults::default());
        assert_eq!(
            header::header_field(&made.parse_header(), "Content-Type"),
            Some("text/plain; charset=UTF-8")
        );
    }

    #[test]
    fn tst_remove_duplicates() {
        let content = r#"#: a.c:1
msgid "Save"
msgstr ""

#: b.c:2
msgid "Save"
msgstr "Speichern"

msgctxt "menu"
msgid "Save"
msgstr ""
"#;
        let mut merged = PoStore::parse_str(content).unwrap();
        merged.remove_duplicates(DuplicateStyle::Merge);
        assert_eq!(merged.units.len(), 2);
        assert_eq!(merged.units[0].msgstr, vec!["Speichern"]);
        assert_eq!(merged.units[0].locations(), vec!["a.c:1", "b.c:2"]);

        let mut kept = PoStore::parse_str(content).unwrap();
        kept.remove_duplicates(DuplicateStyle::Keep);
        assert_eq!(kept.units.len(), 3);

        let mut commented = PoStore::parse_str(content).unwrap();
        commented.remove_duplicates(DuplicateStyle::MsgidComment);
        assert_eq!(commented.units[0].msgid_comment.as_deref(), Some("a.c:1"));
        assert_eq!(commented.units[1].msgid_comment.as_deref(), Some("b.c:2"));
        assert_eq!(commented.units[2].msgid_comment, None);

        let mut contexts = PoStore::parse_str(content).unwrap();
        contexts.remove_duplicates(DuplicateStyle::Msgctxt);
        assert_eq!(contexts.units[0].msgctxt.as_deref(), Some("a.c:1"));
        assert_eq!(contexts.units[1].msgctxt.as_deref(), Some("b.c:2"));
        assert_eq!(contexts.units[2].msgctxt.as_deref(), Some("menu"));

        assert_eq!("msgid_comment_all".parse::<DuplicateStyle>().unwrap(), DuplicateStyle::MsgidCommentAll);
        assert!("bogus".parse::<DuplicateStyle>().is_err());
        assert_eq!(DuplicateStyle::default().to_string(), "merge");
    }

    #[test]
    fn tst_update_from_template() {
        let template = PoStore::parse_str(
            r#"msgid ""
msgstr ""
"Content-Type: text/plain; charset=CHARSET\n"

#: new.c:1
msgid "test"
msgstr ""

#: new.c:2
msgid "brand new"
msgstr ""
"#,
        )
        .unwrap();
        let mut po = PoStore::parse_str(TEST_THREE_UNITS_PO_CONTENT).unwrap();
        po.update_from_template(&template);

        let ids: Vec<&str> = po.units.iter().map(|u| u.msgid.as_str()).collect();
        assert_eq!(ids, vec!["", "test", "brand new", "tabel"]);
        assert_eq!(po.units[1].msgstr, vec!["rest"]);
        assert_eq!(po.units[1].locations(), vec!["new.c:1"]);
        assert!(!po.units[2].has_target());
        assert!(po.units[3].obsolete);
        assert_eq!(
            header::header_field(&po.parse_header(), "Content-Type"),
            Some("text/plain; charset=UTF-8")
        );
    }
}
