//! Schedule converter CLI.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::{ColorChoice, Parser};
use sched_cli::commands::{
    ConvertJob, ConverterSettings, build_converter, run_analyze, run_cache_clear, run_cache_list,
    run_cache_stats, run_convert, run_validate,
};
use sched_cli::logging::{LogConfig, LogFormat, init_logging};
use tracing::level_filters::LevelFilter;

mod cli;
mod summary;

use crate::cli::{CacheCommand, Cli, Command, LogFormatArg, LogLevelArg};
use crate::summary::{
    print_conversion, print_records, print_statistics, print_structure, print_validation,
};

fn main() -> ExitCode {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        return ExitCode::FAILURE;
    }
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

/// Runs the selected command; `Ok(false)` means it completed but failed its check.
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let study_id = match &cli.command {
        Command::Convert(args) => args.study_id.clone(),
        _ => None,
    };
    let settings = ConverterSettings {
        cache_dir: cli.cache_dir.as_deref(),
        write_policy: cli.write_policy.into(),
        study_id,
        use_oracle: matches!(cli.command, Command::Convert(_)),
    };
    let converter = build_converter(&settings)?;

    match &cli.command {
        Command::Convert(args) => {
            let job = ConvertJob {
                input: &args.input,
                file_type: args.file_type.into(),
                target: args.target.into(),
                organization: args.organization.as_deref(),
                threshold: args.threshold,
                output: args.output.as_deref(),
            };
            let result = run_convert(&converter, &job)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_conversion(&result);
            }
            Ok(result.success)
        }
        Command::Analyze(args) => {
            let report = run_analyze(&converter, &args.input, args.file_type.into())?;
            print_structure(&report);
            Ok(true)
        }
        Command::Validate(args) => {
            let report = run_validate(&converter, &args.input, args.target.into())?;
            print_validation(&report);
            Ok(report.valid)
        }
        Command::Cache(CacheCommand::List { organization }) => {
            let records = run_cache_list(&converter, organization)?;
            print_records(organization, &records);
            Ok(true)
        }
        Command::Cache(CacheCommand::Clear { organization }) => {
            let removed = run_cache_clear(&converter, organization)?;
            println!("Removed {removed} cached mapping(s)");
            Ok(true)
        }
        Command::Cache(CacheCommand::Stats { organization }) => {
            let statistics = run_cache_stats(&converter, organization.as_deref())?;
            print_statistics(&statistics);
            Ok(true)
        }
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.log_data = cli.log_data;
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
