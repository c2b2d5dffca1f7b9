use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::datetime::{self, parse_day, parse_span, parse_time};

/// 対象のワークログの日付を指定する引数。
#[derive(Debug, Default, clap::Args)]
pub struct DayArgs {
    #[clap(
        short = 'd',
        long = "day",
        help = "Manage the worklog for DATE (YYYY-MM-DD or a day offset such as -1), defaults to today",
        parse(try_from_str = parse_day),
        allow_hyphen_values = true,
    )]
    pub day: Option<NaiveDate>,
}

impl DayArgs {
    /// 対象の日付を返す。指定されていない場合は今日になる。
    pub fn date(&self) -> NaiveDate {
        self.day.unwrap_or_else(datetime::today)
    }
}

/// エントリーの時刻を指定する引数。
#[derive(Debug, Default, clap::Args)]
pub struct TimeArgs {
    #[clap(
        long = "at",
        help = "Use TIME (HH:MM) on the worklog's day instead of now",
        conflicts_with = "ago",
        parse(try_from_str = parse_time),
    )]
    pub at: Option<NaiveTime>,

    #[clap(
        long = "ago",
        help = "Use DURATION ago (e.g. 15m, 1.5h, 1d 4h 30m; a day is 8 hours) instead of now",
        parse(try_from_str = parse_span),
    )]
    pub ago: Option<chrono::Duration>,
}

impl TimeArgs {
    /// エントリーの開始時間を決定する。
    pub fn resolve(&self, date: NaiveDate) -> Result<NaiveDateTime> {
        datetime::resolve_start(date, self.at, self.ago)
    }
}
