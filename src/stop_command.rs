use anyhow::{Context, Result};
use log::info;

use crate::args::{DayArgs, TimeArgs};
use crate::config::Config;
use crate::entry::{DayEnd, Entry};
use crate::journal::Journal;
use crate::report::Report;

/// 作業中のタスクを閉じて1日を終えるためのサブコマンド。
#[derive(Debug, Default, clap::Args)]
pub struct StopArgs {
    #[clap(flatten)]
    pub day: DayArgs,

    #[clap(flatten)]
    pub time: TimeArgs,
}

pub struct StopCommand<'a> {
    config: &'a Config,
}

impl<'a> StopCommand<'a> {
    /// 新しい`StopCommand`を返す。
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// `stop`サブコマンドの処理を行う。
    ///
    /// 1日の終わりを表すエントリーを追加して保存し、そのレポートを返す。
    pub fn run(&self, stop: StopArgs) -> Result<Report> {
        let mut journal = Journal::open(stop.day.date(), &self.config.state)
            .context("Failed to open worklog")?;
        let stopped = stop.time.resolve(journal.date())?;
        info!("Stop at {}", stopped);
        journal.insert(Some(Entry::from(DayEnd::new(stopped))));
        journal.close()?;

        Ok(Report::build(&journal))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::{StopArgs, StopCommand};
    use crate::args::{DayArgs, TimeArgs};
    use crate::config::Config;
    use crate::datetime::mock_datetime;
    use crate::journal::tests::{at, date, day_end, state_in, task};
    use crate::journal::Journal;

    /// 09:00に開始したタスクを17:30に終了すると8時間30分になることを確認する。
    #[test]
    fn test_stop() {
        mock_datetime::set_mock_time(at(18, 0));
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            state: state_in(dir.path()),
            ..Config::default()
        };
        let mut journal = Journal::open(date(), &config.state).unwrap();
        journal.insert(Some(task(9, 0, "design doc")));
        journal.close().unwrap();
        let args = StopArgs {
            day: DayArgs { day: Some(date()) },
            time: TimeArgs {
                at: NaiveTime::from_hms_opt(17, 30, 0),
                ago: None,
            },
        };

        let report = StopCommand::new(&config).run(args).unwrap();

        assert_eq!(report.lines.len(), 1);
        assert!(!report.lines[0].open);
        assert_eq!(report.lines[0].duration.to_string(), "8h 30m");
        assert_eq!(report.total, chrono::Duration::minutes(8 * 60 + 30));
        assert_eq!(
            report.rollup.get("design doc"),
            Some(&chrono::Duration::minutes(8 * 60 + 30))
        );
        let journal = Journal::open(date(), &config.state).unwrap();
        assert_eq!(journal.entries().last(), Some(&day_end(17, 30)));
    }

    #[test]
    fn test_stop_uses_now() {
        mock_datetime::set_mock_time(at(17, 45));
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            state: state_in(dir.path()),
            ..Config::default()
        };
        let args = StopArgs {
            day: DayArgs { day: Some(date()) },
            time: TimeArgs::default(),
        };

        StopCommand::new(&config).run(args).unwrap();

        let journal = Journal::open(date(), &config.state).unwrap();
        assert_eq!(journal.entries(), &[day_end(17, 45)]);
    }
}
