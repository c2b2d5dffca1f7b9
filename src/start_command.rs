use anyhow::{Context, Result};
use log::info;

use crate::args::{DayArgs, TimeArgs};
use crate::config::Config;
use crate::entry::{Entry, Task};
use crate::journal::Journal;
use crate::prompt::Prompt;
use crate::report::Report;

/// 新しいタスクを開始するためのサブコマンド。作業中のタスクがあればそれを閉じる。
#[derive(Debug, Default, clap::Args)]
pub struct StartArgs {
    #[clap(flatten)]
    pub day: DayArgs,

    #[clap(flatten)]
    pub time: TimeArgs,

    #[clap(short = 't', long = "ticket", help = "The TICKET associated with the task")]
    pub ticket: Option<String>,

    #[clap(help = "The task's description")]
    pub description: Vec<String>,
}

pub struct StartCommand<'a> {
    config: &'a Config,
}

impl<'a> StartCommand<'a> {
    /// 新しい`StartCommand`を返す。
    ///
    /// # Arguments
    /// * `config` - 設定
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// `start`サブコマンドの処理を行う。
    ///
    /// 説明が指定されていない場合は入力を求める。タスクを追加したワークログを保存し、そのレポートを返す。
    ///
    /// # Arguments
    ///
    /// * `start` - `start`サブコマンドの引数
    /// * `prompt` - 説明の入力に使う`Prompt`
    pub fn run<P: Prompt>(&self, start: StartArgs, prompt: &mut P) -> Result<Report> {
        let mut journal = Journal::open(start.day.date(), &self.config.state)
            .context("Failed to open worklog")?;
        let started = start.time.resolve(journal.date())?;
        let matcher = self.config.ticket_matcher()?;

        let mut description = start.description.join(" ");
        while description.trim().is_empty() {
            description = prompt.ask("Task description: ")?;
        }

        let task = Task::new(started, start.ticket, &description, false, matcher.as_ref());
        info!("Start task at {}: {:?}", task.start, task.description);
        journal.insert(Some(Entry::from(task)));
        journal.close()?;

        Ok(Report::build(&journal))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::{StartArgs, StartCommand};
    use crate::args::{DayArgs, TimeArgs};
    use crate::config::Config;
    use crate::datetime::mock_datetime;
    use crate::entry::Task;
    use crate::journal::tests::{at, date, state_in};
    use crate::journal::Journal;
    use crate::prompt::scripted::ScriptedPrompt;
    use crate::prompt::Abort;

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            state: state_in(dir),
            ..Config::default()
        }
    }

    fn args(at: Option<(u32, u32)>, description: &[&str]) -> StartArgs {
        StartArgs {
            day: DayArgs { day: Some(date()) },
            time: TimeArgs {
                at: at.and_then(|(h, m)| NaiveTime::from_hms_opt(h, m, 0)),
                ago: None,
            },
            ticket: None,
            description: description.iter().map(|word| word.to_string()).collect(),
        }
    }

    #[test]
    fn test_start_with_description() {
        mock_datetime::set_mock_time(at(10, 0));
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let mut prompt = ScriptedPrompt::new(&[]);

        let report = StartCommand::new(&config)
            .run(args(Some((9, 0)), &["design", "doc"]), &mut prompt)
            .unwrap();

        assert_eq!(report.lines.len(), 1);
        assert!(report.lines[0].open);
        assert!(prompt.questions.is_empty());
        let journal = Journal::open(date(), &config.state).unwrap();
        assert_eq!(
            journal.entries()[0].as_task(),
            Some(&Task::new(at(9, 0), None, "design doc", false, None))
        );
    }

    #[test]
    fn test_start_prompts_until_description() {
        mock_datetime::set_mock_time(at(10, 0));
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let mut prompt = ScriptedPrompt::new(&["", "  ", "review"]);

        StartCommand::new(&config)
            .run(args(None, &[]), &mut prompt)
            .unwrap();

        assert_eq!(prompt.questions.len(), 3);
        let journal = Journal::open(date(), &config.state).unwrap();
        let task = journal.entries()[0].as_task().unwrap();
        assert_eq!(task.description, "review");
        assert_eq!(task.start, at(10, 0));
    }

    /// 入力を中断した場合はワークログを保存しないことを確認する。
    #[test]
    fn test_start_aborted() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let mut prompt = ScriptedPrompt::new(&[]);

        let err = StartCommand::new(&config)
            .run(args(Some((9, 0)), &[]), &mut prompt)
            .unwrap_err();

        assert!(err.is::<Abort>());
        assert!(!dir.path().join("2024-01-10.json").exists());
    }

    #[test]
    fn test_start_detects_ticket() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.features.scrape_ticket = true;
        config.jira.projects = vec!["PROJ".to_string()];
        let mut prompt = ScriptedPrompt::new(&[]);

        StartCommand::new(&config)
            .run(args(Some((9, 0)), &["fix", "PROJ-42", "crash"]), &mut prompt)
            .unwrap();

        let journal = Journal::open(date(), &config.state).unwrap();
        let task = journal.entries()[0].as_task().unwrap();
        assert_eq!(task.ticket.as_deref(), Some("PROJ-42"));
        assert!(!task.logged);
    }
}
