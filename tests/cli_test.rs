//! Tests for argument parsing and command dispatch

use clap::Parser;

use surveykit::cli::args::{Cli, Commands, ConfigCommands, FormatArg};
use surveykit::cli::commands::execute_command;
use surveykit::exitcode;

const RESOURCES: &str = "tests/resources/surveys";

#[test]
fn given_repeated_debug_flags_when_parsing_then_counted() {
    let cli = Cli::try_parse_from(["surveykit", "-ddd", "list"]).unwrap();
    assert_eq!(cli.debug, 3);
    assert!(matches!(cli.command, Some(Commands::List)));
}

#[test]
fn given_tabulate_args_when_parsing_then_access_rules_collected() {
    let cli = Cli::try_parse_from([
        "surveykit",
        "tabulate",
        "123456",
        "--allow",
        "Q1",
        "--allow",
        "Q2",
        "--block-pattern",
        "^_",
        "--sort",
    ])
    .unwrap();

    match cli.command {
        Some(Commands::Tabulate {
            survey,
            access,
            sort,
            keep_blanks,
            ..
        }) => {
            assert_eq!(survey, "123456");
            assert_eq!(access.allow, vec!["Q1", "Q2"]);
            assert_eq!(access.block_pattern, vec!["^_"]);
            assert!(sort);
            assert!(!keep_blanks);
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn given_literal_and_pattern_allow_when_parsing_then_conflict() {
    let result = Cli::try_parse_from([
        "surveykit",
        "tabulate",
        "1",
        "--allow",
        "Q1",
        "--allow-pattern",
        "^Q",
    ]);
    assert!(result.is_err());
}

#[test]
fn given_choices_args_when_parsing_then_format_parsed() {
    let cli = Cli::try_parse_from([
        "surveykit",
        "choices",
        "200",
        "M1",
        "--response",
        "7",
        "--format",
        "code-and-text",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Choices {
            format: FormatArg::CodeAndText,
            ..
        })
    ));
}

#[test]
fn given_config_path_when_parsing_then_subcommand() {
    let cli = Cli::try_parse_from(["surveykit", "config", "path"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Config {
            command: ConfigCommands::Path
        })
    ));
}

#[test]
fn given_resource_dir_when_executing_tabulate_then_ok() {
    let cli = Cli::try_parse_from([
        "surveykit",
        "--data-dir",
        RESOURCES,
        "--compact",
        "tabulate",
        "123456",
        "--block",
        "id",
    ])
    .unwrap();

    assert!(execute_command(&cli).is_ok());
}

#[test]
fn given_unknown_survey_when_executing_then_noinput_exit_code() {
    let cli = Cli::try_parse_from(["surveykit", "--data-dir", RESOURCES, "tree", "999"]).unwrap();

    let err = execute_command(&cli).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::NOINPUT);
}

#[test]
fn given_single_choice_question_when_executing_choices_then_usage_exit_code() {
    let cli = Cli::try_parse_from([
        "surveykit",
        "--data-dir",
        RESOURCES,
        "choices",
        "200",
        "L1",
        "--response",
        "7",
    ])
    .unwrap();

    let err = execute_command(&cli).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::USAGE);
}

#[test]
fn given_no_command_when_executing_then_usage_error() {
    let cli = Cli::try_parse_from(["surveykit"]).unwrap();
    let err = execute_command(&cli).unwrap_err();
    assert_eq!(err.exit_code(), exitcode::USAGE);
}
