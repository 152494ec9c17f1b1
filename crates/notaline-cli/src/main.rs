//! notaline - NFe XML collection pipeline for the Sankhya gateway
//!
//! Polls the gateway for new invoice keys, downloads their XML payloads,
//! and keeps daily ledgers so repeated runs only do new work.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;
mod source;

use config::Config;

#[derive(Parser)]
#[command(name = "notaline")]
#[command(about = "NFe XML collection pipeline for the Sankhya gateway")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./notaline.toml or ~/.config/notaline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one collection pass (discover, download, reconcile)
    Run(cmd::run::RunArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = notaline_core::ProgressContext::new();

    // Logging:
    //   TTY:     quiet (warn) unless --debug  — progress bars show activity
    //   non-TTY: info unless --debug          — logs are the only output
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    notaline_core::init_logging(quiet, cli.debug, multi);

    let config = match cli.config {
        Some(path) => Config::from_file(&path)?,
        None => Config::load()?,
    };

    match cli.command {
        Command::Run(args) => cmd::run::run(args, &config, &progress),
        Command::Config => {
            show_config(&config);
            Ok(())
        }
    }
}

fn show_config(config: &Config) {
    use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec![
        "Logs directory",
        &config.paths.logs_dir.display().to_string(),
    ]);
    table.add_row(vec![
        "XML directory",
        &config.paths.xml_dir.display().to_string(),
    ]);
    table.add_row(vec![
        "Queries directory",
        &config.paths.queries_dir.display().to_string(),
    ]);
    table.add_row(vec![
        "Workers",
        &format!("{} (max: {})", config.workers.default, config.workers.max),
    ]);
    table.add_row(vec!["Login URL", &config.sankhya.login_url]);
    table.add_row(vec!["Query URL", &config.sankhya.query_url]);
    table.add_row(vec![
        "Credentials",
        if config.sankhya.credentials().is_some() {
            "configured"
        } else {
            "not set"
        },
    ]);
    table.add_row(vec![
        "Auth retries",
        &format!(
            "{} every {}s",
            config.retry.auth_attempts, config.retry.auth_delay_secs
        ),
    ]);
    table.add_row(vec![
        "Query retries",
        &format!(
            "{} every {}s",
            config.retry.query_attempts, config.retry.query_delay_secs
        ),
    ]);
    table.add_row(vec![
        "Telegram",
        if config.telegram.notifier().is_some() {
            "configured"
        } else {
            "not set"
        },
    ]);

    eprintln!("\n{table}");
}
