// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use clap::{Parser, Subcommand};
use thiserror::Error as TeError;

use crate::config::{Config, ConfigError};
use crate::i18n_file::gettext::DuplicateStyle;
use crate::logging;

#[derive(Debug, Parser)]
#[command(
    version,
    about = "A commandline tool to inspect Gettext PO and XLIFF translation files and keep their translation statistics cached."
)]
pub struct Cli {
    /// Config file. Defaults to config.yaml in the user config directory.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Directory of the statistics database, overrides the config file.
    #[arg(long, global = true)]
    pub stats_db: Option<PathBuf>,
    /// Print debug logs to stderr.
    #[arg(short, long, global = true, action = clap::ArgAction::SetTrue, default_value_t = false)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(name = "stats")]
    #[command(
        about = "Prints translation statistics of a file or a directory",
        long_about = "Prints translation statistics of a translation file, or of every PO and XLIFF file under a directory.\n\n\
            Results are cached per file and only recomputed once the file or its pending suggestions change.",
    )]
    Stats {
        path: PathBuf,
        #[clap(short, long, default_value_t, value_enum)]
        format: crate::subcmd::statistics::StatsFormat,
        #[clap(short, long, default_value_t, value_enum)]
        sort_by: crate::subcmd::statistics::StatsSortBy,
    },

    #[command(name = "classify")]
    #[command(about = "Prints the units of a translation file grouped by state and failing check")]
    Classify {
        file: PathBuf,
        #[clap(short, long, default_value_t, value_enum)]
        format: crate::subcmd::statistics::StatsFormat,
    },

    #[command(name = "update-unit")]
    #[command(
        about = "Edits one unit of a translation file",
        long_about = "Edits the target, fuzzy flag or translator comments of one unit, saves the file and refreshes the cached statistics of that unit.\n\n\
            Units are addressed by their index in the file, the PO header being unit 0.",
    )]
    UpdateUnit {
        file: PathBuf,
        index: usize,
        /// New target, repeat once per plural form.
        #[arg(short, long)]
        target: Vec<String>,
        #[arg(long)]
        fuzzy: Option<bool>,
        /// New translator comments, an empty string removes them.
        #[arg(long)]
        comment: Option<String>,
        /// Language code written to the PO header.
        #[arg(short, long)]
        language: Option<String>,
        /// Plural-Forms value written to the PO header when it has none.
        /// e.g. "nplurals=2; plural=(n != 1);"
        #[arg(long, requires = "language")]
        plural_forms: Option<String>,
    },

    #[command(name = "suggest")]
    #[command(about = "Lists, adds or deletes suggestions for a unit")]
    Suggest {
        #[command(subcommand)]
        action: SuggestAction,
    },

    #[command(name = "dedup")]
    #[command(about = "Resolves duplicate messages in a Gettext PO file")]
    Dedup {
        file: PathBuf,
        /// Defaults to the duplicate style of the config file.
        #[arg(short, long, value_enum)]
        style: Option<DuplicateStyle>,
        /// Write the result here instead of overwriting the file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    #[command(name = "merge-template")]
    #[command(
        about = "Updates a Gettext PO file from its POT template",
        long_about = "Updates a Gettext PO file from its POT template.\n\n\
            Existing translations are kept, new messages are added untranslated and translated messages that vanished from the template become obsolete.",
    )]
    MergeTemplate {
        file: PathBuf,
        template: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    #[command(name = "normalize")]
    #[command(about = "Rewrites a translation file in its canonical layout")]
    Normalize {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum SuggestAction {
    /// Lists the suggestions of a unit
    List {
        file: PathBuf,
        index: usize,
    },
    /// Adds a suggestion to a unit
    Add {
        file: PathBuf,
        index: usize,
        /// Suggested target, repeat once per plural form.
        #[arg(short, long, required = true)]
        target: Vec<String>,
        /// Name of the suggester, defaults to the translator of the config file.
        #[arg(short, long)]
        by: Option<String>,
    },
    /// Deletes one suggestion of a unit
    Delete {
        file: PathBuf,
        index: usize,
        /// Position of the suggestion as shown by `suggest list`.
        suggestion: usize,
        /// Target of the suggestion, repeat once per plural form.
        #[arg(short, long, required = true)]
        target: Vec<String>,
    },
}

#[derive(TeError, Debug)]
#[error("{0}")]
pub enum CliError {
    Config(#[from] ConfigError),
    Statistics(#[from] crate::subcmd::statistics::CmdError),
    Classify(#[from] crate::subcmd::classify::CmdError),
    UpdateUnit(#[from] crate::subcmd::update_unit::CmdError),
    Suggest(#[from] crate::subcmd::suggest::CmdError),
    Dedup(#[from] crate::subcmd::dedup::CmdError),
    MergeTemplate(#[from] crate::subcmd::merge_template::CmdError),
    Normalize(#[from] crate::subcmd::normalize::CmdError),
}

pub fn execute() -> Result<(), CliError> {
    let args = Cli::parse();
    logging::init(args.verbose);

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(stats_db) = args.stats_db {
        config.stats_db_path = stats_db;
    }

    use crate::subcmd;
    match args.command {
        Commands::Stats { path, format, sort_by } => {
            subcmd::subcmd_statistics(&config, &path, format, sort_by)?;
        },
        Commands::Classify { file, format } => {
            subcmd::subcmd_classify(&config, &file, format)?;
        },
        Commands::UpdateUnit { file, index, target, fuzzy, comment, language, plural_forms } => {
            let update = crate::translation_file::UnitUpdate {
                target: (!target.is_empty()).then_some(target),
                fuzzy,
                translator_comments: comment,
            };
            subcmd::subcmd_update_unit(&config, &file, index, &update, language, plural_forms.as_deref())?;
        },
        Commands::Suggest { action } => match action {
            SuggestAction::List { file, index } => {
                subcmd::subcmd_suggest_list(&file, index)?;
            },
            SuggestAction::Add { file, index, target, by } => {
                subcmd::subcmd_suggest_add(&config, &file, index, target, by)?;
            },
            SuggestAction::Delete { file, index, suggestion, target } => {
                subcmd::subcmd_suggest_delete(&config, &file, index, suggestion, &target)?;
            },
        },
        Commands::Dedup { file, style, output } => {
            subcmd::subcmd_dedup(&file, style.unwrap_or(config.duplicate_style), output.as_deref())?;
        },
        Commands::MergeTemplate { file, template, output } => {
            subcmd::subcmd_merge_template(&file, &template, output.as_deref())?;
        },
        Commands::Normalize { file, output } => {
            subcmd::subcmd_normalize(&file, output.as_deref())?;
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tst_parse_update_unit_args() {
        let cli = Cli::try_parse_from([
            "postats", "-v", "update-unit", "de.po", "3",
            "--target", "Datei", "--target", "Dateien", "--fuzzy", "false",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::UpdateUnit { index, target, fuzzy, comment, .. } => {
                assert_eq!(index, 3);
                assert_eq!(target, vec!["Datei", "Dateien"]);
                assert_eq!(fuzzy, Some(false));
                assert_eq!(comment, None);
            },
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn tst_parse_dedup_style() {
        let cli = Cli::try_parse_from(["postats", "dedup", "de.po", "--style", "msgid_comment"]).unwrap();
        assert!(matches!(cli.command, Commands::Dedup { style: Some(DuplicateStyle::MsgidComment), .. }));
        assert!(Cli::try_parse_from(["postats", "suggest", "add", "de.po", "1"]).is_err());
        assert!(Cli::try_parse_from(["postats", "suggest", "delete", "de.po", "1", "0"]).is_err());
        let cli = Cli::try_parse_from(["postats", "suggest", "delete", "de.po", "1", "0", "-t", "stoel"]).unwrap();
        match cli.command {
            Commands::Suggest { action: SuggestAction::Delete { suggestion, target, .. } } => {
                assert_eq!(suggestion, 0);
                assert_eq!(target, vec!["stoel"]);
            },
            other => panic!("unexpected command {other:?}"),
        }
    }
}
