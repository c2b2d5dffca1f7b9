use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use log::warn;

use crate::color::Palette;
use crate::duration::Duration;
use crate::entry::Entry;
use crate::journal::Journal;

const START_END_TIME_FORMAT: &str = "%H:%M";

/// レポートの1行分の作業区間。
#[derive(Clone, Debug, PartialEq)]
pub struct ReportLine {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// 終わりが現在時刻(まだ作業中)かどうか。
    pub open: bool,
    pub duration: Duration,
    pub logged: bool,
    pub ticket: Option<String>,
    pub description: String,
}

/// ワークログから作成した1日分のレポート。
#[derive(Clone, Debug)]
pub struct Report {
    pub date: NaiveDate,
    pub lines: Vec<ReportLine>,
    pub total: chrono::Duration,
    /// 説明ごとの合計時間。説明の昇順に並ぶ。
    pub rollup: BTreeMap<String, chrono::Duration>,
    has_entries: bool,
}

impl Report {
    /// ワークログからレポートを作成する。
    ///
    /// 作業時間が0以下の区間は行にも合計にも含めない。昼休みと休憩は行には出すが合計には含めない。
    pub fn build(journal: &Journal) -> Self {
        let mut report = Self {
            date: journal.date(),
            lines: Vec::new(),
            total: chrono::Duration::zero(),
            rollup: BTreeMap::new(),
            has_entries: !journal.is_empty(),
        };

        for pair in journal.pairwise() {
            let Entry::Task(task) = pair.entry else {
                continue;
            };
            let delta = pair.delta();
            if delta <= chrono::Duration::zero() {
                if delta < chrono::Duration::zero() {
                    warn!(
                        "Entry at {} starts after its successor at {}, skipped",
                        task.start,
                        pair.next.start()
                    );
                }
                continue;
            }

            if task.includes_in_rollup() {
                report.total = report.total + delta;
                let accumulated = report
                    .rollup
                    .entry(task.description.clone())
                    .or_insert_with(chrono::Duration::zero);
                *accumulated = *accumulated + delta;
            }

            report.lines.push(ReportLine {
                start: task.start,
                end: pair.next.start(),
                open: pair.next.is_now(),
                duration: Duration::new(delta),
                logged: task.logged,
                ticket: task.ticket.clone(),
                description: task.description.clone(),
            });
        }

        report
    }

    /// ワークログにエントリーが1件もなかったかどうか。
    pub fn is_empty(&self) -> bool {
        !self.has_entries
    }
}

/// レポートを表示するためのtrait。
pub trait ReportPresenter {
    /// レポートを表示する。
    ///
    /// # Arguments
    ///
    /// * `report` - 表示するレポート
    fn show_report(&mut self, report: &Report) -> Result<()>;
}

/// レポートを端末向けに色付けして表示する。
pub struct ConsoleReport<'a, W: Write> {
    writer: &'a mut W,
    palette: Palette,
}

impl<'a, W: Write> ConsoleReport<'a, W> {
    /// 新しい`ConsoleReport`を返す。
    pub fn new(writer: &'a mut W, palette: Palette) -> Self {
        Self { writer, palette }
    }

    fn format_line(&self, line: &ReportLine) -> String {
        let palette = &self.palette;
        let end = line.end.format(START_END_TIME_FORMAT).to_string();
        let end = if line.open {
            palette.yellow(&end)
        } else {
            palette.green(&end)
        };
        let logged = if line.logged {
            palette.green("*")
        } else {
            palette.red("*")
        };
        format!(
            "\t{} {} {} {}{}{} {} {}  {}",
            palette.green(&line.start.format(START_END_TIME_FORMAT).to_string()),
            palette.faint("-"),
            end,
            palette.faint("("),
            line.duration.colorized(palette, false),
            palette.faint(")"),
            logged,
            line.ticket.as_deref().unwrap_or_default(),
            line.description
        )
    }
}

impl<'a, W: Write> ReportPresenter for ConsoleReport<'a, W> {
    fn show_report(&mut self, report: &Report) -> Result<()> {
        let palette = self.palette;
        writeln!(
            self.writer,
            "{} {}",
            palette.bold("Worklog Report for"),
            palette.bold_purple(&report.date.format("%F").to_string())
        )
        .context("Failed to write report header")?;

        if report.is_empty() {
            writeln!(self.writer, "\tno entries").context("Failed to write report")?;
            return Ok(());
        }

        for line in &report.lines {
            let formatted = self.format_line(line);
            writeln!(self.writer, "{}", formatted)
                .with_context(|| format!("Failed to write report line: {:?}", line))?;
        }

        writeln!(
            self.writer,
            "\n\t{}  {}",
            Duration::new(report.total).colorized(&palette, true),
            palette.bold_underline("TOTAL")
        )
        .context("Failed to write report total")?;
        for (description, duration) in &report.rollup {
            writeln!(
                self.writer,
                "\t{}  {}",
                Duration::new(*duration).colorized(&palette, false),
                palette.bold(description)
            )
            .with_context(|| format!("Failed to write rollup for: {}", description))?;
        }

        Ok(())
    }
}
