use anyhow::{bail, Context, Result};
use log::info;

use crate::args::{DayArgs, TimeArgs};
use crate::config::Config;
use crate::entry::{Entry, Task};
use crate::journal::Journal;
use crate::prompt::Prompt;
use crate::report::Report;

/// 以前のタスクの説明を一覧から選んで再開するためのサブコマンド。
#[derive(Debug, Default, clap::Args)]
pub struct ResumeArgs {
    #[clap(flatten)]
    pub day: DayArgs,

    #[clap(flatten)]
    pub time: TimeArgs,
}

pub struct ResumeCommand<'a> {
    config: &'a Config,
}

impl<'a> ResumeCommand<'a> {
    /// 新しい`ResumeCommand`を返す。
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// `resume`サブコマンドの処理を行う。
    ///
    /// 選ばれた説明のタスクを追加する。チケットは同じ説明の最後のタスクのものを引き継ぐ。
    pub fn run<P: Prompt>(&self, resume: ResumeArgs, prompt: &mut P) -> Result<Report> {
        let mut journal = Journal::open(resume.day.date(), &self.config.state)
            .context("Failed to open worklog")?;
        let started = resume.time.resolve(journal.date())?;
        let matcher = self.config.ticket_matcher()?;

        let candidates = candidates(&journal);
        if candidates.is_empty() {
            bail!("No task to resume in the worklog for {}", journal.date());
        }
        for (idx, description) in candidates.iter().enumerate() {
            prompt.say(&format!("[{}] {}", idx, description))?;
        }
        let description = loop {
            let answer = prompt.ask("Which description: ")?;
            match answer.trim().parse::<usize>().ok().and_then(|idx| candidates.get(idx)) {
                Some(description) => break description.clone(),
                None => prompt.say(&format!(
                    "Must be an integer between 0 and {}",
                    candidates.len() - 1
                ))?,
            }
        };

        let ticket = journal
            .entries()
            .iter()
            .rev()
            .filter_map(Entry::as_task)
            .find(|task| task.description == description)
            .and_then(|task| task.ticket.clone());
        let task = Task::new(started, ticket, &description, false, matcher.as_ref());
        info!("Resume task at {}: {:?}", task.start, task.description);
        journal.insert(Some(Entry::from(task)));
        journal.close()?;

        Ok(Report::build(&journal))
    }
}

/// 再開の候補となる説明を返す。
///
/// 新しいものから順に重複を除いて並べる。直前のタスクは再開することがないので最後に回す。
fn candidates(journal: &Journal) -> Vec<String> {
    let mut descriptions: Vec<String> = Vec::new();
    for task in journal.entries().iter().rev().filter_map(Entry::as_task) {
        if !descriptions.contains(&task.description) {
            descriptions.push(task.description.clone());
        }
    }
    if !descriptions.is_empty() {
        descriptions.rotate_left(1);
    }
    descriptions
}
