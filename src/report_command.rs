use anyhow::{Context, Result};
use log::debug;

use crate::args::DayArgs;
use crate::config::Config;
use crate::journal::Journal;
use crate::report::Report;

/// ワークログの現在の状態を表示するためのサブコマンド。
#[derive(Debug, Default, clap::Args)]
pub struct ReportArgs {
    #[clap(flatten)]
    pub day: DayArgs,
}

pub struct ReportCommand<'a> {
    config: &'a Config,
}

impl<'a> ReportCommand<'a> {
    /// 新しい`ReportCommand`を返す。
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// `report`サブコマンドの処理を行う。
    pub fn run(&self, report: ReportArgs) -> Result<Report> {
        let journal = Journal::open(report.day.date(), &self.config.state)
            .context("Failed to open worklog")?;
        debug!("Report {} entries from {}", journal.len(), journal.path().display());
        let built = Report::build(&journal);
        journal.close()?;

        Ok(built)
    }
}
