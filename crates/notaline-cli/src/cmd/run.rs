//! `notaline run` - execute one collection pass.

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use notaline_core::ProgressContext;
use notaline_nfe::{runner, RunConfig, Summary};
use notaline_sankhya::{load_query, Client, Session};

use crate::config::Config;
use crate::source::SankhyaSource;

#[derive(Args)]
pub struct RunArgs {
    /// Named query under the queries directory
    #[arg(long, default_value = "xmls")]
    query: String,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "param", value_parser = parse_key_val)]
    params: Vec<(String, String)>,

    /// Worker pool size (default from config)
    #[arg(long)]
    workers: Option<usize>,

    /// Skip the Telegram notification
    #[arg(long)]
    no_notify: bool,
}

pub fn run(args: RunArgs, config: &Config, progress: &ProgressContext) -> Result<()> {
    let credentials = config.sankhya.credentials().context(
        "Sankhya credentials not configured \
         (set SANKHYA_TOKEN/SANKHYA_APPKEY/SANKHYA_USERNAME/SANKHYA_PASSWORD \
         or the [sankhya] section)",
    )?;

    let sql = load_query(&config.paths.queries_dir, &args.query, &args.params)?;

    let session = Session::new(credentials, config.sankhya.endpoints(), config.retry.policy());
    let client = Client::new(session);
    let source = SankhyaSource::new(&client);

    let workers = args
        .workers
        .unwrap_or(config.workers.default)
        .min(config.workers.max);
    let run_config = RunConfig {
        log_dir: config.paths.logs_dir.clone(),
        xml_dir: config.paths.xml_dir.clone(),
        workers,
    };

    log::info!("Running query '{}'", args.query);
    let summary = runner::run(&sql, &source, &run_config, progress)?;
    print_summary(&summary);

    if args.no_notify {
        return Ok(());
    }
    match config.telegram.notifier() {
        Some(notifier) => {
            notifier.send(&summary.notification_text());
        }
        None => log::debug!("telegram not configured, skipping notification"),
    }
    Ok(())
}

/// Print the run tallies as a table on stderr.
fn print_summary(summary: &Summary) {
    if summary.is_empty() {
        eprintln!("\nNo new electronic invoices to process.");
        return;
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("XML download").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    table.add_row(vec!["Attempted".to_string(), summary.attempted.to_string()]);
    table.add_row(vec![
        "New from query".to_string(),
        summary.discovered.to_string(),
    ]);
    table.add_row(vec![
        "Retried".to_string(),
        format!("{} ({} recovered)", summary.retried, summary.recovered),
    ]);
    table.add_row(vec!["Succeeded".to_string(), summary.succeeded.to_string()]);
    table.add_row(vec!["Failed".to_string(), summary.failed.to_string()]);
    table.add_row(vec![
        "Time".to_string(),
        format!("{:.1}s", summary.elapsed.as_secs_f64()),
    ]);
    eprintln!("\n{table}");
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}
