// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use chapterdash_app::{AppState, ChapterRecord, ChapterStatus, StatusFilter, filter_chapters};
use chapterdash_client::Client;
use chapterdash_tui::ViewOptions;
use config::Config;
use log::info;
use runtime::HttpRuntime;
use std::env;
use std::path::PathBuf;
use time::UtcOffset;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `chapterdash --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    // The local offset can only be read while the process is single-threaded.
    let utc_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let log_path = config.log_path()?;
    logging::init(&log_path, config.log_level())?;

    let base_url = options.base_url.clone().unwrap_or_else(|| config.base_url());
    info!(
        "config {} service {}",
        options.config_path.display(),
        base_url
    );

    let client = Client::new(&base_url, config.timeout()?).with_context(|| {
        format!(
            "invalid [service] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;

    if options.check_only {
        let records = client.list_chapters()?;
        println!("{}", check_summary(client.base_url(), &records));
        return Ok(());
    }

    let mut state = AppState::with_status_filter(config.default_filter()?);
    let view_options = ViewOptions {
        service_label: client.base_url().to_owned(),
        utc_offset,
        show_detail: config.show_detail(),
    };
    let mut runtime = HttpRuntime::new(client);
    chapterdash_tui::run_app(&mut state, &mut runtime, view_options)
}

fn check_summary(base_url: &str, records: &[ChapterRecord]) -> String {
    let count = |status: ChapterStatus| {
        records
            .iter()
            .filter(|record| record.status == status)
            .count()
    };
    let ok = count(ChapterStatus::Ok);
    let wrong = count(ChapterStatus::Wrong);
    let missing = count(ChapterStatus::Missing);
    let other = records.len() - ok - wrong - missing;
    let fixable = filter_chapters(records, "", StatusFilter::All).fixable_count;

    format!(
        "{base_url}: {} chapters ({ok} ok, {wrong} wrong, {missing} missing, {other} other); {fixable} fixable",
        records.len()
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    base_url: Option<String>,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        base_url: None,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--url" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("--url requires a base URL such as http://localhost:5000")
                })?;
                options.base_url = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("chapterdash: terminal dashboard for chapter date checks");
    println!("  --config <path>          Use a specific config path");
    println!("  --url <base>             Chapter service URL (overrides [service].base_url)");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Load config, fetch chapters once, print totals");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, check_summary, parse_cli_args};
    use anyhow::Result;
    use chapterdash_testkit::sample_library;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/chapterdash-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                base_url: None,
                print_config_path: false,
                print_example: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_and_url() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--config",
                "/custom/config.toml",
                "--url",
                "http://nas.local:5000",
            ],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        assert_eq!(options.base_url.as_deref(), Some("http://nas.local:5000"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));

        let error = parse_cli_args(vec!["--url"], default_options_path())
            .expect_err("missing url value should fail");
        assert!(error.to_string().contains("--url requires a base URL"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }

    #[test]
    fn check_summary_counts_statuses() {
        let summary = check_summary("http://localhost:5000", &sample_library());
        assert_eq!(
            summary,
            "http://localhost:5000: 5 chapters (2 ok, 1 wrong, 1 missing, 1 other); 2 fixable"
        );
    }

    #[test]
    fn check_summary_handles_empty_collection() {
        assert_eq!(
            check_summary("http://x", &[]),
            "http://x: 0 chapters (0 ok, 0 wrong, 0 missing, 0 other); 0 fixable"
        );
    }
}
