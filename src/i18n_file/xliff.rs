// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

// XLIFF 1.2 spec: https://docs.oasis-open.org/xliff/v1.2/os/xliff-core.html

use std::fs::File;
use std::path::Path;
use thiserror::Error as TeError;
use serde::{Deserialize, Serialize};
use quick_xml::DeError;
use quick_xml::se::SeError;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, Event};
use super::common::{Suggestion, TranslationUnit, UnitError};

// ===== XLIFF Basic =====

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename = "xliff")]
pub struct Xliff {
    #[serde(rename = "@version")]
    pub version: String,
    #[serde(rename = "@xmlns", skip_serializing_if = "Option::is_none", default)]
    pub xmlns: Option<String>,
    #[serde(rename = "file", default)]
    pub files: Vec<XliffFile>,
}

impl Xliff {
    pub fn units(&self) -> impl Iterator<Item = &TransUnit> {
        self.files.iter().flat_map(|file| file.body.units.iter())
    }

    pub fn units_mut(&mut self) -> impl Iterator<Item = &mut TransUnit> {
        self.files.iter_mut().flat_map(|file| file.body.units.iter_mut())
    }
}

// === Sub Structs ===

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct XliffFile {
    #[serde(rename = "@original")]
    pub original: String,
    #[serde(rename = "@source-language")]
    pub source_language: String,
    #[serde(rename = "@target-language", skip_serializing_if = "Option::is_none", default)]
    pub target_language: Option<String>,
    #[serde(rename = "@datatype", default = "default_datatype")]
    pub datatype: String,
    #[serde(rename = "body", default)]
    pub body: Body,
}

fn default_datatype() -> String {
    "plaintext".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Body {
    #[serde(rename = "trans-unit", default)]
    pub units: Vec<TransUnit>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TransUnit {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@approved", skip_serializing_if = "Option::is_none", default)]
    pub approved: Option<String>,
    #[serde(rename = "source", default)]
    pub source: String,
    #[serde(rename = "target", skip_serializing_if = "Option::is_none", default)]
    pub target: Option<Target>,
    #[serde(rename = "note", skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<Note>,
    #[serde(rename = "alt-trans", skip_serializing_if = "Vec::is_empty", default)]
    pub alt_trans: Vec<AltTrans>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Target {
    #[serde(rename = "@state", skip_serializing_if = "Option::is_none", default)]
    pub state: Option<String>,
    #[serde(rename = "$text", default)]
    pub value: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Note {
    #[serde(rename = "@from", skip_serializing_if = "Option::is_none", default)]
    pub from: Option<String>,
    #[serde(rename = "$text", default)]
    pub value: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AltTrans {
    #[serde(rename = "@origin", skip_serializing_if = "Option::is_none", default)]
    pub origin: Option<String>,
    #[serde(rename = "target")]
    pub target: Target,
}

const TRANSLATOR_NOTE_FROM: &str = "translator";

impl TransUnit {
    pub fn new(id: &str, source: &str) -> Self {
        TransUnit {
            id: id.to_string(),
            approved: None,
            source: source.to_string(),
            target: None,
            notes: Vec::new(),
            alt_trans: Vec::new(),
        }
    }

    pub fn target_text(&self) -> &str {
        self.target.as_ref().map(|t| t.value.as_str()).unwrap_or_default()
    }

    pub fn add_alt_trans(&mut self, target: &str, origin: Option<&str>) {
        self.alt_trans.push(AltTrans {
            origin: origin.map(str::to_string),
            target: Target {
                state: None,
                value: target.to_string(),
            },
        });
    }

    /// Remove one alternative translation, `None` if the index is gone.
    pub fn remove_alt_trans(&mut self, index: usize) -> Option<AltTrans> {
        (index < self.alt_trans.len()).then(|| self.alt_trans.remove(index))
    }
}

impl TranslationUnit for TransUnit {
    fn unit_id(&self) -> String {
        self.id.clone()
    }

    fn source_strings(&self) -> Vec<String> {
        vec![self.source.clone()]
    }

    fn target_strings(&self) -> Vec<String> {
        vec![self.target_text().to_string()]
    }

    fn has_plural(&self) -> bool {
        false
    }

    /// A unit with a target that is explicitly not approved.
    fn is_fuzzy(&self) -> bool {
        self.approved.as_deref() == Some("no") && !self.target_text().is_empty()
    }

    fn is_obsolete(&self) -> bool {
        false
    }

    fn is_header(&self) -> bool {
        false
    }

    fn is_blank(&self) -> bool {
        self.source.is_empty() && self.target_text().is_empty()
    }

    fn is_review(&self) -> bool {
        self.notes.iter().any(|note| {
            let text = note.value.trim_start();
            text.starts_with("(review)") || text.starts_with("(pofilter)")
        })
    }

    fn locations(&self) -> Vec<String> {
        Vec::new()
    }

    fn translator_comments(&self) -> String {
        self.notes
            .iter()
            .filter(|note| note.from.as_deref() == Some(TRANSLATOR_NOTE_FROM))
            .map(|note| note.value.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn alt_translations(&self) -> Vec<Suggestion> {
        self.alt_trans
            .iter()
            .map(|alt| Suggestion {
                target: vec![alt.target.value.clone()],
                submitter: alt.origin.clone(),
            })
            .collect()
    }

    fn set_target(&mut self, target: Vec<String>) -> Result<(), UnitError> {
        let value = match target.len() {
            0 => String::new(),
            1 => target.into_iter().next().unwrap_or_default(),
            found => return Err(UnitError::TooManyForms { found }),
        };
        match &mut self.target {
            Some(existing) => existing.value = value,
            None => {
                self.target = Some(Target {
                    state: None,
                    value,
                })
            }
        }
        Ok(())
    }

    fn set_fuzzy(&mut self, fuzzy: bool) {
        self.approved = Some(if fuzzy { "no" } else { "yes" }.to_string());
    }

    fn set_translator_comments(&mut self, comments: Option<&str>) {
        self.notes.retain(|note| note.from.as_deref() != Some(TRANSLATOR_NOTE_FROM));
        if let Some(text) = comments {
            self.notes.push(Note {
                from: Some(TRANSLATOR_NOTE_FROM.to_string()),
                value: text.to_string(),
            });
        }
    }
}

// ===== XLIFF Load & Save =====

pub trait WriterExt {
    fn write_xliff_file(
        &mut self,
        content: &Xliff,
    ) -> Result<(), SeError>;
}

impl<W: std::io::Write> WriterExt for Writer<W> {
    fn write_xliff_file(
        &mut self,
        content: &Xliff,
    ) -> Result<(), SeError> {
        self.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.write_serializable("xliff", content)
    }
}

#[derive(TeError, Debug)]
pub enum XliffLoadError {
    #[error("Can not open file")]
    ReadFile(#[from] std::io::Error),
    #[error("Fail to deserialize file because: {0}")]
    Serde(#[from] DeError),
}

#[derive(TeError, Debug)]
pub enum XliffSaveError {
    #[error("Can not create file")]
    CreateFile(#[from] std::io::Error),
    #[error("Fail to serialize file because: {0}")]
    Serde(#[from] SeError),
}

impl Xliff {
    pub fn load_from_file(xliff_file: &Path) -> Result<Xliff, XliffLoadError> {
        let file = File::open(xliff_file)?;
        let file_reader = std::io::BufReader::new(file);
        Ok(quick_xml::de::from_reader::<_, Xliff>(file_reader)?)
    }

    pub fn load_from_str(content: &str) -> Result<Xliff, XliffLoadError> {
        Ok(quick_xml::de::from_str(content)?)
    }

    pub fn save_into_file(&self, xliff_file: &Path) -> Result<(), XliffSaveError> {
        let target_file = File::create(xliff_file)?;
        let mut writer = Writer::new_with_indent(&target_file, b' ', 4);
        writer.write_xliff_file(self)?;
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    pub const TEST_DE_XLIFF_CONTENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2">
    <file original="main.c" source-language="en" target-language="de" datatype="plaintext">
        <body>
            <trans-unit id="greeting" approved="yes">
                <source>Hello</source>
                <target>Hallo</target>
            </trans-unit>
            <trans-unit id="farewell" approved="no">
                <source>Goodbye</source>
                <target state="needs-review-translation">Tschuess</target>
                <note from="translator">(review) spelling</note>
            </trans-unit>
            <trans-unit id="table">
                <source>Table</source>
                <alt-trans origin="anna">
                    <target>Tisch</target>
                </alt-trans>
                <alt-trans origin="ben">
                    <target>Tafel</target>
                </alt-trans>
            </trans-unit>
        </body>
    </file>
</xliff>"#;

    #[test]
    fn tst_parse_xliff_content() {
        let xliff = Xliff::load_from_str(TEST_DE_XLIFF_CONTENT).unwrap();
        assert_eq!(xliff.version, "1.2");
        assert_eq!(xliff.files[0].target_language.as_deref(), Some("de"));
        let units: Vec<&TransUnit> = xliff.units().collect();
        assert_eq!(units.len(), 3);

        assert!(units[0].is_translated());
        assert!(units[1].is_fuzzy());
        assert!(units[1].is_review());
        assert_eq!(units[1].translator_comments(), "(review) spelling");
        assert!(!units[2].has_target());
        assert!(!units[2].is_fuzzy());
        assert_eq!(
            units[2].alt_translations(),
            vec![
                Suggestion { target: vec!["Tisch".to_string()], submitter: Some("anna".to_string()) },
                Suggestion { target: vec!["Tafel".to_string()], submitter: Some("ben".to_string()) },
            ]
        );
    }

    #[test]
    fn tst_edit_and_save_xliff() {
        let mut xliff = Xliff::load_from_str(TEST_DE_XLIFF_CONTENT).unwrap();
        {
            let table = xliff.units_mut().nth(2).unwrap();
            table.set_target(vec!["Tisch".to_string()]).unwrap();
            table.set_fuzzy(false);
            assert!(table.remove_alt_trans(0).is_some());
            assert!(table.remove_alt_trans(5).is_none());
            assert!(table.set_target(vec!["a".into(), "b".into()]).is_err());
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("de.xlf");
        xliff.save_into_file(&path).unwrap();
        let reloaded = Xliff::load_from_file(&path).unwrap();
        let table = reloaded.units().nth(2).unwrap();
        assert!(table.is_translated());
        assert_eq!(table.alt_trans.len(), 1);
        assert_eq!(table.alt_trans[0].origin.as_deref(), Some("ben"));
        assert_eq!(reloaded.units().count(), 3);
    }
}
