//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::domain::ChoiceFormat;

/// Survey definition trees, response export normalization and frequency tabulation
#[derive(Parser, Debug)]
#[command(name = "surveykit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory with one sub-directory per survey
    #[arg(short = 'D', long, global = true, env = "SURVEYKIT_DATA_DIR", value_hint = ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    /// Compact JSON output
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List surveys in the data directory
    List,

    /// Show the question tree of a survey
    Tree {
        /// Survey id
        survey: String,
        /// Only top-level questions passing the configured access rules
        #[arg(long)]
        filtered: bool,
    },

    /// Show one question (by qid, title, or a path of titles) as JSON
    Show {
        /// Survey id
        survey: String,
        /// Question path: top-level key followed by sub-question titles
        #[arg(required = true, num_args = 1..)]
        path: Vec<String>,
    },

    /// Print normalized response records as JSON
    Responses {
        /// Survey id
        survey: String,
        #[command(flatten)]
        export: ExportArgs,
    },

    /// Count values per column
    Tabulate {
        /// Survey id
        survey: String,
        #[command(flatten)]
        access: AccessArgs,
        /// Count blank values too
        #[arg(long)]
        keep_blanks: bool,
        /// Order columns naturally
        #[arg(long)]
        sort: bool,
        /// Print question labels for the tabulated columns instead of counts
        #[arg(long)]
        labels: bool,
        #[command(flatten)]
        export: ExportArgs,
    },

    /// Multiple choice selections of one response
    Choices {
        /// Survey id
        survey: String,
        /// Multiple choice question (qid or title)
        question: String,
        /// Response id
        #[arg(short, long)]
        response: String,
        /// Result shape
        #[arg(short, long, value_enum, default_value_t = FormatArg::Node)]
        format: FormatArg,
        /// Return an empty result instead of failing on ineligible questions
        #[arg(long)]
        lenient: bool,
        #[command(flatten)]
        export: ExportArgs,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Overrides of the `[access]` config table.
#[derive(Args, Debug, Default)]
pub struct AccessArgs {
    /// Allowed column (repeatable)
    #[arg(long = "allow", value_name = "NAME", conflicts_with = "allow_pattern")]
    pub allow: Vec<String>,
    /// Allowed column pattern (repeatable)
    #[arg(long = "allow-pattern", value_name = "REGEX")]
    pub allow_pattern: Vec<String>,
    /// Blocked column (repeatable)
    #[arg(long = "block", value_name = "NAME", conflicts_with = "block_pattern")]
    pub block: Vec<String>,
    /// Blocked column pattern (repeatable)
    #[arg(long = "block-pattern", value_name = "REGEX")]
    pub block_pattern: Vec<String>,
}

#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Field delimiter (default: detect from the "id" header)
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Map,
    Code,
    Text,
    CodeAndText,
    Node,
}

impl From<FormatArg> for ChoiceFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Map => ChoiceFormat::Map,
            FormatArg::Code => ChoiceFormat::Code,
            FormatArg::Text => ChoiceFormat::Text,
            FormatArg::CodeAndText => ChoiceFormat::CodeAndText,
            FormatArg::Node => ChoiceFormat::Node,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print a config template
    Template,

    /// Show config paths
    Path,
}
