use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fern::colors::{Color, ColoredLevelConfig};
use log::{info, LevelFilter};

mod alias;
mod alias_command;
mod args;
mod color;
mod config;
mod datetime;
mod duration;
mod entry;
mod jira;
mod journal;
mod prompt;
mod report;
mod report_command;
mod resume_command;
mod start_command;
mod stop_command;
mod upload_command;

use alias_command::{AliasArgs, AliasCommand};
use color::Palette;
use config::{default_config_path, Config};
use jira::JiraClient;
use prompt::{Abort, ConsolePrompt};
use report::{ConsoleReport, ReportPresenter};
use report_command::{ReportArgs, ReportCommand};
use resume_command::{ResumeArgs, ResumeCommand};
use start_command::{StartArgs, StartCommand};
use stop_command::{StopArgs, StopCommand};
use upload_command::{UploadArgs, UploadCommand};

/// 1日の作業時間を記録し、レポートの表示とJiraへの記録を行うCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- start --at 09:00 design doc
/// $ cargo run -- stop --at 17:30
/// $ cargo run -- report --day -1
/// ```
#[derive(Debug, Parser)]
#[clap(version, about = "Manage and report time allocation", allow_external_subcommands = true)]
struct Args {
    #[clap(
        short = 'c',
        long = "config",
        help = "Path to the config file, defaults to ~/.worklog/config.json",
        parse(from_os_str),
        global = true,
    )]
    config: Option<PathBuf>,

    #[clap(
        short = 'v',
        long = "verbose",
        help = "Show more logs (-v: info, -vv: debug)",
        parse(from_occurrences),
        global = true,
    )]
    verbose: u64,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    /// Start a new task, closing the currently open task if any
    Start(StartArgs),
    /// Like start, but reuse the description of a previous task selected from a list
    Resume(ResumeArgs),
    /// Close the currently open task
    Stop(StopArgs),
    /// Report the current state of the worklog
    Report(ReportArgs),
    /// Upload worklog time to Jira
    Upload(UploadArgs),
    /// List, add or remove aliases; `worklog <alias>` is a short cut to `start`
    Alias(AliasArgs),
    #[clap(external_subcommand)]
    External(Vec<String>),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger(args.verbose)?;

    match run(args).await {
        Err(err) if err.chain().any(|cause| cause.is::<Abort>()) => {
            info!("Aborted, worklog not saved");
            Ok(())
        }
        result => result,
    }
}

/// ログの出力先と出力レベルを設定する。
fn setup_logger(verbose: u64) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue);
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr())
        .apply()
        .context("Failed to initialize logger")?;

    Ok(())
}

/// サブコマンドを実行する。
async fn run(args: Args) -> Result<()> {
    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let mut config = Config::load(&config_path)?;
    let palette = Palette::new(config.features.colorize);
    let mut prompt = ConsolePrompt::stdio();

    let report = match args.subcommand {
        SubCommands::Start(start) => StartCommand::new(&config).run(start, &mut prompt)?,
        SubCommands::Resume(resume) => ResumeCommand::new(&config).run(resume, &mut prompt)?,
        SubCommands::Stop(stop) => StopCommand::new(&config).run(stop)?,
        SubCommands::Report(report) => ReportCommand::new(&config).run(report)?,
        SubCommands::Upload(upload) => {
            let client = JiraClient::from_config(&config.jira, &mut prompt)?;
            println!("Logging work ...");
            let uploaded = UploadCommand::new(&client)
                .run(upload, &config.state)
                .await?;
            println!("Done. Logged {} worklogs.", uploaded);
            return Ok(());
        }
        SubCommands::Alias(alias) => {
            return AliasCommand::new(&mut config, &config_path).run(alias, &mut io::stdout());
        }
        SubCommands::External(argv) => {
            let start = alias::translate(&config.aliases, &argv)?;
            StartCommand::new(&config).run(start, &mut prompt)?
        }
    };

    let mut stdout = io::stdout();
    ConsoleReport::new(&mut stdout, palette).show_report(&report)?;

    Ok(())
}
