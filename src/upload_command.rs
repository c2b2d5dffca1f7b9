use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use log::{debug, info, warn};

use crate::args::DayArgs;
use crate::config::StateConfig;
use crate::duration::Duration;
use crate::jira::IssueTracker;
use crate::journal::Journal;

/// ワークログの作業時間を課題管理システムに記録するためのサブコマンド。
#[derive(Debug, Default, clap::Args)]
pub struct UploadArgs {
    #[clap(flatten)]
    pub day: DayArgs,
}

/// 記録待ちの作業時間。
#[derive(Debug)]
struct PendingWorklog {
    index: usize,
    ticket: String,
    duration: Duration,
    started: NaiveDateTime,
}

/// アップロードの結果。
///
/// 失敗した場合もそれまでに記録できた件数を持つ。
#[derive(Debug)]
pub struct UploadOutcome {
    pub uploaded: usize,
    pub error: Option<anyhow::Error>,
}

pub struct UploadCommand<'a, T: IssueTracker> {
    tracker: &'a T,
}

impl<'a, T: IssueTracker> UploadCommand<'a, T> {
    /// 新しい`UploadCommand`を返す。
    ///
    /// # Arguments
    /// * `tracker` - 作業時間を記録する課題管理システム
    pub fn new(tracker: &'a T) -> Self {
        Self { tracker }
    }

    /// `upload`サブコマンドの処理を行う。
    ///
    /// 記録に失敗した場合も、それまでに記録済みにしたエントリーは保存してからエラーを返す。
    pub async fn run(&self, upload: UploadArgs, state: &StateConfig) -> Result<usize> {
        let mut journal =
            Journal::open(upload.day.date(), state).context("Failed to open worklog")?;
        let outcome = self.upload(&mut journal).await;
        journal.close()?;

        match outcome.error {
            Some(err) => Err(err),
            None => Ok(outcome.uploaded),
        }
    }

    /// チケットがあり未記録のタスクの作業時間を記録し、記録できたタスクを記録済みにする。
    ///
    /// 作業時間が1分未満のタスクは記録しない。最初に失敗した時点で残りは記録しない。
    pub async fn upload(&self, journal: &mut Journal) -> UploadOutcome {
        let pending: Vec<PendingWorklog> = journal
            .pairwise()
            .filter_map(|pair| {
                let task = pair.entry.as_task()?;
                if task.logged {
                    return None;
                }
                let ticket = task.ticket.clone()?;
                let duration = Duration::new(pair.delta());
                if duration.is_zero() {
                    debug!("Skip {} at {}: no time spent", ticket, task.start);
                    return None;
                }
                Some(PendingWorklog {
                    index: pair.index,
                    ticket,
                    duration,
                    started: task.start,
                })
            })
            .collect();
        info!("{} worklogs to upload", pending.len());

        let mut uploaded = 0;
        for worklog in pending {
            info!("Logging {} to ticket {}", worklog.duration, worklog.ticket);
            let result = self
                .tracker
                .add_worklog(&worklog.ticket, &worklog.duration, &worklog.started)
                .await
                .with_context(|| {
                    format!(
                        "Failed to log {} to ticket {}",
                        worklog.duration, worklog.ticket
                    )
                });
            if let Err(err) = result {
                warn!("Upload stopped after {} worklogs", uploaded);
                return UploadOutcome {
                    uploaded,
                    error: Some(err),
                };
            }
            journal.mark_logged(worklog.index);
            uploaded += 1;
        }

        UploadOutcome {
            uploaded,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use mockall::Sequence;

    use super::{UploadArgs, UploadCommand};
    use crate::args::DayArgs;
    use crate::datetime::mock_datetime;
    use crate::entry::{Entry, Task};
    use crate::jira::MockIssueTracker;
    use crate::journal::tests::{at, date, day_end, state_in, task};
    use crate::journal::Journal;

    fn ticketed(h: u32, m: u32, ticket: &str, description: &str, logged: bool) -> Entry {
        Entry::from(Task::new(at(h, m), Some(ticket.to_string()), description, logged, None))
    }

    fn logged_flags(journal: &Journal) -> Vec<bool> {
        journal
            .entries()
            .iter()
            .filter_map(Entry::as_task)
            .map(|task| task.logged)
            .collect()
    }

    #[tokio::test]
    async fn test_upload_marks_logged() {
        mock_datetime::set_mock_time(at(18, 0));
        let (_dir, mut journal) = crate::journal::tests::open_empty();
        journal.insert(Some(ticketed(9, 0, "PROJ-1", "design", false)));
        journal.insert(Some(task(10, 30, "no ticket")));
        journal.insert(Some(ticketed(11, 0, "PROJ-2", "review", true)));
        journal.insert(Some(ticketed(12, 0, "PROJ-3", "deploy", false)));
        journal.insert(Some(day_end(12, 45)));
        let mut tracker = MockIssueTracker::new();
        tracker
            .expect_add_worklog()
            .withf(|ticket, duration, started| {
                ticket == "PROJ-1" && duration.to_string() == "1h 30m" && *started == at(9, 0)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        tracker
            .expect_add_worklog()
            .withf(|ticket, duration, _| ticket == "PROJ-3" && duration.to_string() == "45m")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let outcome = UploadCommand::new(&tracker).upload(&mut journal).await;

        assert_eq!(outcome.uploaded, 2);
        assert!(outcome.error.is_none());
        assert_eq!(logged_flags(&journal), vec![true, false, true, true]);
    }

    /// 作業時間が0のタスクは記録せず、記録済みにもしないことを確認する。
    #[tokio::test]
    async fn test_upload_skips_zero_duration() {
        mock_datetime::set_mock_time(at(18, 0));
        let (_dir, mut journal) = crate::journal::tests::open_empty();
        journal.insert(Some(ticketed(9, 0, "PROJ-1", "blip", false)));
        journal.insert(Some(day_end(9, 0)));
        let mut tracker = MockIssueTracker::new();
        tracker.expect_add_worklog().times(0);

        let outcome = UploadCommand::new(&tracker).upload(&mut journal).await;

        assert_eq!(outcome.uploaded, 0);
        assert_eq!(logged_flags(&journal), vec![false]);
    }

    #[tokio::test]
    async fn test_upload_open_task_uses_now() {
        mock_datetime::set_mock_time(at(10, 20));
        let (_dir, mut journal) = crate::journal::tests::open_empty();
        journal.insert(Some(ticketed(9, 0, "PROJ-1", "coding", false)));
        let mut tracker = MockIssueTracker::new();
        tracker
            .expect_add_worklog()
            .withf(|_, duration, _| duration.to_string() == "1h 20m")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let outcome = UploadCommand::new(&tracker).upload(&mut journal).await;

        assert_eq!(outcome.uploaded, 1);
    }

    /// 失敗した時点で止まり、それまでの記録済みは保存されることを確認する。
    #[tokio::test]
    async fn test_upload_failure_keeps_earlier_logged() {
        mock_datetime::set_mock_time(at(18, 0));
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let mut journal = Journal::open(date(), &state).unwrap();
        journal.insert(Some(ticketed(9, 0, "PROJ-1", "a", false)));
        journal.insert(Some(ticketed(10, 0, "PROJ-2", "b", false)));
        journal.insert(Some(ticketed(11, 0, "PROJ-3", "c", false)));
        journal.insert(Some(day_end(12, 0)));
        journal.close().unwrap();
        let mut seq = Sequence::new();
        let mut tracker = MockIssueTracker::new();
        tracker
            .expect_add_worklog()
            .withf(|ticket, _, _| ticket == "PROJ-1")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        tracker
            .expect_add_worklog()
            .withf(|ticket, _, _| ticket == "PROJ-2")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Err(anyhow!("401 Unauthorized")));
        let args = UploadArgs {
            day: DayArgs { day: Some(date()) },
        };

        let result = UploadCommand::new(&tracker).run(args, &state).await;

        assert!(result.is_err());
        let journal = Journal::open(date(), &state).unwrap();
        assert_eq!(logged_flags(&journal), vec![true, false, false]);
    }

    /// 2回目のアップロードでは何も記録しないことを確認する。
    #[tokio::test]
    async fn test_upload_twice() {
        mock_datetime::set_mock_time(at(18, 0));
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let mut journal = Journal::open(date(), &state).unwrap();
        journal.insert(Some(ticketed(9, 0, "PROJ-1", "a", false)));
        journal.insert(Some(ticketed(10, 0, "PROJ-2", "b", false)));
        journal.insert(Some(day_end(12, 0)));
        journal.close().unwrap();
        let mut tracker = MockIssueTracker::new();
        tracker
            .expect_add_worklog()
            .times(2)
            .returning(|_, _, _| Ok(()));
        let args = || UploadArgs {
            day: DayArgs { day: Some(date()) },
        };

        let first = UploadCommand::new(&tracker).run(args(), &state).await.unwrap();
        let second = UploadCommand::new(&tracker).run(args(), &state).await.unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 0);
        let journal = Journal::open(date(), &state).unwrap();
        assert_eq!(logged_flags(&journal), vec![true, true]);
    }
}
