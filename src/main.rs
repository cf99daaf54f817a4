use std::path::PathBuf;

use clap::{Parser, Subcommand};
use odk_tools::config::{CentralConfig, Workspace};
use odk_tools::split::SplitReport;
use odk_tools::{Result, ToolError, sync};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ToolError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    let workspace = Workspace::new(&cli.workspace);
    match cli.command {
        Command::Fetch(args) => {
            let config = CentralConfig::from_env_file(&cli.env_file)?;
            sync::fetch_form(&workspace, config, &args.form_name, cli.insecure)
        }
        Command::Split(args) => {
            let report = sync::split_form(&workspace, &args.form.form_name)?;
            finish_split(&report, args.report.as_deref())
        }
        Command::Export(args) => {
            let config = CentralConfig::from_env_file(&cli.env_file)?;
            let report = sync::export_form(&workspace, config, &args.form.form_name, cli.insecure)?;
            finish_split(&report, args.report.as_deref())
        }
        Command::List(args) => {
            for export in sync::list_form_exports(&workspace, &args.form_name)? {
                println!("{}\t{}", export.file_name, export.range_name);
            }
            Ok(())
        }
    }
}

fn finish_split(report: &SplitReport, output: Option<&std::path::Path>) -> Result<()> {
    println!(
        "{} bundles written, {} attachments copied, {} skipped",
        report.bundles.len(),
        report.copied_count(),
        report.skipped_count()
    );
    if let Some(path) = output {
        sync::write_report(report, path)?;
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Download ODK Central submissions and split them per respondent."
)]
struct Cli {
    /// Directory holding the `download/` and `data/` folders.
    #[arg(long, global = true, default_value = ".")]
    workspace: PathBuf,

    /// Dotenv file with URL, PROJECT_ID, USERNAME and PASSWORD.
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,

    /// Accept invalid TLS certificates from the Central server.
    #[arg(long, global = true)]
    insecure: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download and extract the submissions of a form.
    Fetch(FormArgs),
    /// Split a downloaded form into one bundle per respondent.
    Split(SplitArgs),
    /// Download a form, then split it.
    Export(SplitArgs),
    /// List the CSV exports staged for a form.
    List(FormArgs),
}

#[derive(clap::Args)]
struct FormArgs {
    /// Form identifier on the Central server.
    form_name: String,
}

#[derive(clap::Args)]
struct SplitArgs {
    #[command(flatten)]
    form: FormArgs,

    /// Write a JSON report of every bundle and attachment to this path.
    #[arg(long)]
    report: Option<PathBuf>,
}
