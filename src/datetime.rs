use anyhow::{bail, Context, Result};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;

/// 1日を8時間として扱う。
const SECONDS_IN_WORKDAY: f64 = 8.0 * 60.0 * 60.0;

#[cfg(not(test))]
/// 分単位に切り捨てた現在のローカル時間を取得する。
pub fn now() -> NaiveDateTime {
    truncate_to_minute(Local::now().naive_local())
}

/// テスト時に利用するモック時間を取得する。
#[cfg(test)]
pub mod mock_datetime {
    use std::cell::RefCell;

    use super::{truncate_to_minute, Local, NaiveDateTime};

    thread_local! {
        static MOCK_TIME: RefCell<Option<NaiveDateTime>> = RefCell::new(None);
    }

    /// モック時間を取得する。
    pub fn now() -> NaiveDateTime {
        MOCK_TIME.with(|cell| {
            cell.borrow()
                .as_ref()
                .cloned()
                .unwrap_or_else(|| truncate_to_minute(Local::now().naive_local()))
        })
    }

    /// モック時間を設定する。
    pub fn set_mock_time(time: NaiveDateTime) {
        MOCK_TIME.with(|cell| *cell.borrow_mut() = Some(time));
    }

    // 設定したモック時間をクリアする。
    pub fn clear_mock_time() {
        MOCK_TIME.with(|cell| *cell.borrow_mut() = None);
    }
}

#[cfg(test)]
pub use mock_datetime::now;

/// 今日の日付を取得する。
pub fn today() -> NaiveDate {
    now().date()
}

/// 秒以下を切り捨てる。
pub fn truncate_to_minute(datetime: NaiveDateTime) -> NaiveDateTime {
    datetime
        .with_second(0)
        .and_then(|datetime| datetime.with_nanosecond(0))
        .unwrap_or(datetime)
}

/// `--day`の値をパースする。
///
/// `YYYY-MM-DD`形式の日付、または今日からの日数(`-1`は昨日)を受け付ける。
pub fn parse_day(s: &str) -> Result<NaiveDate> {
    let date_re = Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").context("Invalid date pattern")?;
    if date_re.is_match(s) {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Failed to parse date: {}", s));
    }

    let offset: i64 = s
        .trim()
        .parse()
        .with_context(|| format!("Expected YYYY-MM-DD or a day offset, got: {}", s))?;
    today()
        .checked_add_signed(Duration::days(offset))
        .with_context(|| format!("Day offset out of range: {}", offset))
}

/// `--at`の値(`HH:MM`)をパースする。
pub fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .with_context(|| format!("Failed to parse time (expected HH:MM): {}", s))
}

/// `--ago`の値をパースする。
///
/// 数値と単位(`d`, `h`, `m`)の組を1つ以上並べたもの。空白は省略可能で、小数も指定できる。
///
/// # Examples
///
/// ```
/// parse_span("15m")?;
/// parse_span("1d 4.5h")?;
/// parse_span("1d4h30m")?;
/// ```
pub fn parse_span(s: &str) -> Result<Duration> {
    let span_re = Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*([dhm])").context("Invalid span pattern")?;
    if !span_re.replace_all(s, "").trim().is_empty() {
        bail!("Failed to parse duration: {}", s);
    }

    let mut seconds = 0.0;
    let mut matched = false;
    for caps in span_re.captures_iter(s) {
        let value: f64 = caps[1]
            .parse()
            .with_context(|| format!("Failed to parse number: {}", &caps[1]))?;
        let factor = match &caps[2] {
            "d" => SECONDS_IN_WORKDAY,
            "h" => 3600.0,
            _ => 60.0,
        };
        seconds += value * factor;
        matched = true;
    }
    if !matched {
        bail!("Failed to parse duration: {}", s);
    }

    let seconds = seconds.round();
    if !seconds.is_finite() || seconds >= i64::MAX as f64 {
        bail!("Duration out of range: {}", s);
    }
    Duration::try_seconds(seconds as i64).with_context(|| format!("Duration out of range: {}", s))
}

/// エントリーの開始時間を決定する。
///
/// `at`が指定されていれば対象日のその時刻、`ago`が指定されていれば現在からその分だけ前、
/// どちらもなければ現在時刻を返す。`ago`を引いた結果が日時の範囲外になる場合はエラーを返す。
pub fn resolve_start(
    date: NaiveDate,
    at: Option<NaiveTime>,
    ago: Option<Duration>,
) -> Result<NaiveDateTime> {
    match (at, ago) {
        (Some(at), _) => Ok(truncate_to_minute(date.and_time(at))),
        (None, Some(ago)) => now()
            .checked_sub_signed(ago)
            .map(truncate_to_minute)
            .with_context(|| format!("Start time out of range: {} ago", ago)),
        (None, None) => Ok(now()),
    }
}
