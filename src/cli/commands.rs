//! Command dispatch

use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::label_columns;
use crate::application::ApplicationError;
use crate::cli::args::{AccessArgs, Cli, Commands, ConfigCommands, ExportArgs, FormatArg};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::cli::tree::ToTermTree;
use crate::config::{self, Settings};
use crate::domain::{AccessFilter, ChoiceOptions, RuleSet, TabulateOptions};
use crate::infrastructure::di::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage("no command given, see --help".to_string()));
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load(cli.data_dir.as_deref())?;
    let pretty = settings.pretty && !cli.compact;
    debug!("data_dir: {}", settings.data_dir.display());
    let container = ServiceContainer::new(settings);

    match command {
        Commands::List => _list(&container),
        Commands::Tree { survey, filtered } => _tree(&container, survey, *filtered),
        Commands::Show { survey, path } => _show(&container, survey, path, pretty),
        Commands::Responses { survey, export } => _responses(&container, survey, export, pretty),
        Commands::Tabulate {
            survey,
            access,
            keep_blanks,
            sort,
            labels,
            export,
        } => {
            let mut options = container.settings.tabulate;
            if *keep_blanks {
                options.ignore_blanks = false;
            }
            if *sort {
                options.sort = true;
            }
            _tabulate(&container, survey, access, options, *labels, export, pretty)
        }
        Commands::Choices {
            survey,
            question,
            response,
            format,
            lenient,
            export,
        } => _choices(
            &container, survey, question, response, *format, *lenient, export, pretty,
        ),
        Commands::Config { command } => _config(&container, command),
        Commands::Completion { .. } => Ok(()),
    }
}

fn delimiter(container: &ServiceContainer, export: &ExportArgs) -> CliResult<Option<u8>> {
    match export.delimiter {
        Some(c) if c.is_ascii() => Ok(Some(c as u8)),
        Some(c) => Err(CliError::InvalidArgs(format!(
            "delimiter '{}' is not a single-byte character",
            c
        ))),
        None => Ok(container.settings.export.delimiter_byte()?),
    }
}

/// Command line rules replace the configured ones per direction.
fn access_filter(container: &ServiceContainer, args: &AccessArgs) -> AccessFilter {
    let configured = container.settings.access_filter();
    let allow = if !args.allow.is_empty() {
        Some(RuleSet::literal(args.allow.iter().cloned()))
    } else if !args.allow_pattern.is_empty() {
        Some(RuleSet::pattern(args.allow_pattern.iter().cloned()))
    } else {
        configured.allow().cloned()
    };
    let block = if !args.block.is_empty() {
        Some(RuleSet::literal(args.block.iter().cloned()))
    } else if !args.block_pattern.is_empty() {
        Some(RuleSet::pattern(args.block_pattern.iter().cloned()))
    } else {
        configured.block().cloned()
    };
    AccessFilter::new(allow, block)
}

#[instrument(skip(container))]
fn _list(container: &ServiceContainer) -> CliResult<()> {
    let surveys = container.source.surveys()?;
    if surveys.is_empty() {
        output::warning(&format!(
            "no surveys in {}",
            container.source.root().display()
        ));
    }
    for survey in surveys {
        output::info(&survey);
    }
    Ok(())
}

#[instrument(skip(container))]
fn _tree(container: &ServiceContainer, survey: &str, filtered: bool) -> CliResult<()> {
    let filter = filtered.then(|| container.settings.access_filter());
    let set = container.survey.questions(survey, filter.as_ref())?;
    output::header(&format!("Survey {}", survey));
    output::info(&set.to_term_tree());
    Ok(())
}

#[instrument(skip(container))]
fn _show(container: &ServiceContainer, survey: &str, path: &[String], pretty: bool) -> CliResult<()> {
    let set = container.survey.questions(survey, None)?;
    let keys: Vec<&str> = path.iter().map(String::as_str).collect();
    let question = set
        .path(&keys)
        .or_else(|| match keys.as_slice() {
            [qid] => set.find(qid),
            _ => None,
        })
        .ok_or_else(|| ApplicationError::QuestionNotFound(path.join(" ")))?;
    output::json(&question, pretty)?;
    Ok(())
}

#[instrument(skip(container, export))]
fn _responses(
    container: &ServiceContainer,
    survey: &str,
    export: &ExportArgs,
    pretty: bool,
) -> CliResult<()> {
    let records = container.survey.responses(survey, delimiter(container, export)?)?;
    output::json(&records, pretty)?;
    Ok(())
}

#[instrument(skip(container, access, export))]
fn _tabulate(
    container: &ServiceContainer,
    survey: &str,
    access: &AccessArgs,
    options: TabulateOptions,
    labels: bool,
    export: &ExportArgs,
    pretty: bool,
) -> CliResult<()> {
    let filter = access_filter(container, access);
    let delimiter = delimiter(container, export)?;
    let tabulation = container
        .survey
        .tabulate(survey, &filter, options, delimiter)?;

    if labels {
        let set = container.survey.questions(survey, None)?;
        output::json(&label_columns(&set, &tabulation), pretty)?;
    } else {
        output::json(&tabulation, pretty)?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
#[instrument(skip(container, export))]
fn _choices(
    container: &ServiceContainer,
    survey: &str,
    question: &str,
    response: &str,
    format: FormatArg,
    lenient: bool,
    export: &ExportArgs,
    pretty: bool,
) -> CliResult<()> {
    let mut options = ChoiceOptions::new(format.into());
    if lenient {
        options = options.lenient();
    }
    let set = container.survey.questions(survey, None)?;
    let choices = container.survey.choices(
        &set,
        survey,
        question,
        response,
        options,
        delimiter(container, export)?,
    )?;
    output::json(&choices, pretty)?;
    Ok(())
}

#[instrument(skip(container))]
fn _config(container: &ServiceContainer, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
        }
        ConfigCommands::Path => {
            match config::global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning("no global config directory on this platform"),
            }
            output::action(
                "local",
                &config::local_config_path(&container.settings.data_dir).display(),
            );
        }
    }
    Ok(())
}
