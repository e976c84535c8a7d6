use crate::config::{resolve_api_keys, ResolvedConfig};
use crate::constants::{API_KEY_ENV, PREVIEW_CHARS};
use crate::datasets::{self, WindowArchive};
use crate::endpoints::{alias_template, fill_template, ENDPOINT_ALIASES};
use crate::errors::{AppError, AppResult};
use crate::extractor::ExtractedArchive;
use crate::models::ExtremeParameter;
use crate::utils::{format_duration, preview, safe_entry_path};
use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tracing::info;

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

fn station_arg() -> Arg {
    Arg::new("station")
        .short('s')
        .long("station")
        .help("Station identifier (IDEMA); repeat or separate with commas")
        .required(true)
        .value_delimiter(',')
        .action(ArgAction::Append)
}

/// Builds the command-line definition.
pub fn build_command() -> Command {
    Command::new("aemet")
        .version(APP_VERSION)
        .author(APP_AUTHOR)
        .about(APP_ABOUT)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("api_key")
                .short('k')
                .long("api-key")
                .help("AEMET OpenData API key; repeat or separate with commas to rotate keys")
                .env(API_KEY_ENV)
                .hide_env_values(true)
                .value_delimiter(',')
                .global(true)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Path to a TOML configuration file")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Output file for JSON data, or directory for warning archives")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("monthly")
                .about("Monthly and yearly climate values per station")
                .arg(station_arg())
                .arg(
                    Arg::new("start_year")
                        .long("start-year")
                        .help("First year (inclusive)")
                        .required(true)
                        .value_parser(clap::value_parser!(i32))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("end_year")
                        .long("end-year")
                        .help("Last year (inclusive)")
                        .required(true)
                        .value_parser(clap::value_parser!(i32))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("daily")
                .about("Daily climate values per station")
                .after_help("Example:\n  aemet daily -s 3195 --start 2022-01-01 --end 2022-12-31")
                .arg(station_arg())
                .arg(
                    Arg::new("start")
                        .long("start")
                        .help("Start date (AAAA-MM-DD or AAAA-MM-DDTHH:MM:SSUTC)")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("end")
                        .long("end")
                        .help("End date (AAAA-MM-DD or AAAA-MM-DDTHH:MM:SSUTC)")
                        .required(true)
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("extremes")
                .about("Climatological extreme values per station")
                .arg(station_arg())
                .arg(
                    Arg::new("parameter")
                        .short('p')
                        .long("parameter")
                        .help("P (precipitation), T (temperature) or V (wind); defaults to all")
                        .value_delimiter(',')
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(
            Command::new("normals")
                .about("Climate normals per station")
                .arg(station_arg()),
        )
        .subcommand(
            Command::new("warnings")
                .about("Latest CAP warnings issued for an area")
                .arg(
                    Arg::new("area")
                        .short('a')
                        .long("area")
                        .help("Area code: 'esp' for Spain or 61-79 for a region")
                        .required(true)
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("warnings-archive")
                .about("CAP warnings archive between two dates")
                .arg(
                    Arg::new("start")
                        .long("start")
                        .help("Start date (AAAA-MM-DD or AAAA-MM-DDTHH:MM:SSUTC)")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("end")
                        .long("end")
                        .help("End date (AAAA-MM-DD or AAAA-MM-DDTHH:MM:SSUTC)")
                        .required(true)
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("raw")
                .about("Any OpenData endpoint, given as a path or as an alias")
                .after_help("Example:\n  aemet raw --alias diarios --param fechaini=2024-01-01T00:00:00UTC fechafin=2024-01-02T23:59:59UTC")
                .arg(
                    Arg::new("endpoint")
                        .long("endpoint")
                        .help("Endpoint path relative to the API root, or an absolute URL")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("alias")
                        .long("alias")
                        .help("Predefined endpoint alias (see `aemet aliases`)")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("param")
                        .long("param")
                        .help("Alias parameters as key=value")
                        .num_args(1..)
                        .action(ArgAction::Append),
                )
                .group(
                    ArgGroup::new("target")
                        .args(["endpoint", "alias"])
                        .required(true),
                ),
        )
        .subcommand(Command::new("aliases").about("List the endpoint aliases accepted by `raw`"))
}

/// Parses `key=value` items; items without `=` are ignored.
pub fn parse_params(params: &[String]) -> BTreeMap<String, String> {
    params
        .iter()
        .filter_map(|p| p.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Renders the alias catalog shown by `aemet aliases`.
pub fn aliases_text() -> String {
    let mut lines = vec!["Available endpoint aliases:".to_string()];
    for (alias, endpoint) in ENDPOINT_ALIASES {
        lines.push(format!("  {alias}: {endpoint}"));
    }
    lines.push(String::new());
    lines.push(
        "Use --alias <name> and fill its parameters with --param key=value".to_string(),
    );
    lines.join("\n")
}

/// Parses command-line arguments and executes the selected command.
///
/// # Errors
///
/// Returns validation errors for bad arguments, missing API keys or an invalid
/// configuration file, and any fetch, download or I/O error of the run.
pub async fn cli() -> AppResult<()> {
    let matches = build_command().get_matches();
    run(&matches).await
}

/// Executes an already parsed command line.
pub async fn run(matches: &ArgMatches) -> AppResult<()> {
    let Some((name, sub)) = matches.subcommand() else {
        return Err(AppError::InvalidInput("A command is required".to_string()));
    };

    if name == "aliases" {
        println!("{}", aliases_text());
        return Ok(());
    }

    let mut config = match sub.get_one::<PathBuf>("config") {
        Some(path) => ResolvedConfig::from_toml_file(path)?,
        None => ResolvedConfig::default(),
    };
    let cli_keys: Vec<String> = sub
        .get_many::<String>("api_key")
        .map(|keys| keys.cloned().collect())
        .unwrap_or_default();
    config.api_keys = resolve_api_keys(&cli_keys, &config)?;
    let output = sub.get_one::<PathBuf>("output").cloned();

    let client = reqwest::Client::new();
    let started = Instant::now();

    match name {
        "monthly" => {
            let start_year = *sub.get_one::<i32>("start_year").expect("start_year is required");
            let end_year = *sub.get_one::<i32>("end_year").expect("end_year is required");
            let records = datasets::monthly_climatology(
                &client,
                &config,
                &stations(sub),
                start_year,
                end_year,
            )
            .await?;
            write_records(&records, output.as_deref()).await?;
        }
        "daily" => {
            let start = sub.get_one::<String>("start").expect("start is required");
            let end = sub.get_one::<String>("end").expect("end is required");
            let records =
                datasets::daily_climatology(&client, &config, &stations(sub), start, end).await?;
            write_records(&records, output.as_deref()).await?;
        }
        "extremes" => {
            let parameters = sub
                .get_many::<String>("parameter")
                .map(|values| {
                    values
                        .map(|v| v.parse::<ExtremeParameter>())
                        .collect::<AppResult<Vec<_>>>()
                })
                .transpose()?
                .unwrap_or_default();
            let records =
                datasets::extreme_values(&client, &config, &stations(sub), &parameters).await?;
            write_records(&records, output.as_deref()).await?;
        }
        "normals" => {
            let records = datasets::normal_values(&client, &config, &stations(sub)).await?;
            write_records(&records, output.as_deref()).await?;
        }
        "warnings" => {
            let area = sub.get_one::<String>("area").expect("area is required");
            let entries = datasets::latest_warnings(&client, &config, area).await?;
            write_archive(&entries, output.as_deref()).await?;
        }
        "warnings-archive" => {
            let start = sub.get_one::<String>("start").expect("start is required");
            let end = sub.get_one::<String>("end").expect("end is required");
            let archives = datasets::warnings_archive(&client, &config, start, end).await?;
            write_window_archives(&archives, output.as_deref()).await?;
        }
        "raw" => {
            let endpoint = match sub.get_one::<String>("alias") {
                Some(alias) => {
                    let params: Vec<String> = sub
                        .get_many::<String>("param")
                        .map(|p| p.cloned().collect())
                        .unwrap_or_default();
                    fill_template(alias_template(alias)?, &parse_params(&params))?
                }
                None => sub
                    .get_one::<String>("endpoint")
                    .cloned()
                    .expect("endpoint or alias is required"),
            };
            let records = datasets::raw_endpoint(&client, &config, &endpoint).await?;
            write_records(&records, output.as_deref()).await?;
        }
        other => {
            return Err(AppError::InvalidInput(format!("Unknown command '{other}'")));
        }
    }

    info!(
        command = name,
        elapsed = %format_duration(started.elapsed()),
        "All operations completed successfully"
    );
    Ok(())
}

fn stations(sub: &ArgMatches) -> Vec<String> {
    sub.get_many::<String>("station")
        .map(|s| s.cloned().collect())
        .unwrap_or_default()
}

/// Writes records as pretty JSON to `output`, or prints a preview.
async fn write_records(records: &[Value], output: Option<&Path>) -> AppResult<()> {
    let json = serde_json::to_string_pretty(records)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).await?;
            }
            fs::write(path, json).await?;
            info!(records = records.len(), path = %path.display(), "Data saved");
        }
        None => {
            println!("{}", preview(&json, PREVIEW_CHARS));
            info!(records = records.len(), "Showing the first {PREVIEW_CHARS} characters; use --output to save everything");
        }
    }
    Ok(())
}

/// Writes every archive entry under the `output` directory, or lists entry names.
async fn write_archive(entries: &ExtractedArchive, output: Option<&Path>) -> AppResult<()> {
    let Some(dir) = output else {
        for (name, content) in entries {
            println!("{name} ({} chars)", content.chars().count());
        }
        return Ok(());
    };

    fs::create_dir_all(dir).await?;
    for (name, content) in entries {
        let Some(path) = safe_entry_path(dir, name) else {
            continue;
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, content).await?;
    }
    info!(entries = entries.len(), dir = %dir.display(), "Archive saved");
    Ok(())
}

async fn write_window_archives(archives: &[WindowArchive], output: Option<&Path>) -> AppResult<()> {
    for archive in archives {
        let window_name = format!("{}_{}", archive.window.start, archive.window.end);
        match output {
            Some(dir) => write_archive(&archive.entries, Some(&dir.join(&window_name))).await?,
            None => {
                println!("[{window_name}]");
                write_archive(&archive.entries, None).await?;
            }
        }
    }
    Ok(())
}
