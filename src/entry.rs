use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

/// ロールアップの集計から除外する説明。
const EXCLUDED_FROM_ROLLUP: [&str; 2] = ["lunch", "break"];

/// ワークログの1エントリー。
///
/// 保存時は`__klass__`で種類を区別する。`DayEnd`は既存ファイルとの互換のため`GoHome`として保存する。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "__klass__")]
pub enum Entry {
    Task(Task),
    #[serde(rename = "GoHome")]
    DayEnd(DayEnd),
}

impl Entry {
    pub fn start(&self) -> NaiveDateTime {
        match self {
            Entry::Task(task) => task.start,
            Entry::DayEnd(day_end) => day_end.start,
        }
    }

    pub fn as_task(&self) -> Option<&Task> {
        match self {
            Entry::Task(task) => Some(task),
            Entry::DayEnd(_) => None,
        }
    }

    /// 保存する内容があるかどうか。説明が空のタスクは保存しない。
    pub fn has_content(&self) -> bool {
        match self {
            Entry::Task(task) => !task.description.is_empty(),
            Entry::DayEnd(_) => true,
        }
    }
}

impl From<Task> for Entry {
    fn from(task: Task) -> Self {
        Entry::Task(task)
    }
}

impl From<DayEnd> for Entry {
    fn from(day_end: DayEnd) -> Self {
        Entry::DayEnd(day_end)
    }
}

/// 作業の開始を表すエントリー。次のエントリーの開始までが作業時間になる。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(with = "stamp")]
    pub start: NaiveDateTime,
    #[serde(default)]
    pub ticket: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_false")]
    pub logged: bool,
}

impl Task {
    /// 新しい`Task`を返す。
    ///
    /// 説明の前後の空白は取り除く。チケットが指定されておらず`matcher`がある場合は、
    /// 説明からチケット番号を探して設定する。
    ///
    /// # Arguments
    ///
    /// * `start` - 開始時間
    /// * `ticket` - 課題管理システムのチケット番号
    /// * `description` - 作業内容
    /// * `logged` - 課題管理システムに記録済みかどうか
    /// * `matcher` - 説明からチケット番号を探すためのパターン
    pub fn new(
        start: NaiveDateTime,
        ticket: Option<String>,
        description: &str,
        logged: bool,
        matcher: Option<&TicketMatcher>,
    ) -> Self {
        let description = description.trim().to_string();
        let ticket = ticket
            .map(|ticket| ticket.trim().to_string())
            .filter(|ticket| !ticket.is_empty())
            .or_else(|| matcher.and_then(|matcher| matcher.find(&description)));

        Self {
            start,
            ticket,
            description,
            logged,
        }
    }

    /// ロールアップと合計に含めるかどうか。昼休みと休憩は含めない。
    pub fn includes_in_rollup(&self) -> bool {
        let description = self.description.to_lowercase();
        !EXCLUDED_FROM_ROLLUP.contains(&description.as_str())
    }
}

/// 1日の作業の終わりを表すエントリー。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEnd {
    #[serde(with = "stamp")]
    pub start: NaiveDateTime,
}

impl DayEnd {
    pub fn new(start: NaiveDateTime) -> Self {
        Self { start }
    }
}

/// 説明に含まれる`<PROJECT>-<番号>`形式のチケット番号を探す。
#[derive(Clone, Debug)]
pub struct TicketMatcher {
    pattern: Regex,
}

impl TicketMatcher {
    /// 新しい`TicketMatcher`を返す。
    ///
    /// # Arguments
    ///
    /// * `projects` - チケット番号の接頭辞として扱うプロジェクトキー
    pub fn new(projects: &[String]) -> Result<Self> {
        let prefixes = projects
            .iter()
            .map(|project| regex::escape(project))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!("(?:{})-[0-9]+", prefixes))
            .with_context(|| format!("Failed to build ticket pattern for: {:?}", projects))?;

        Ok(Self { pattern })
    }

    /// 最初に見つかったチケット番号を返す。
    pub fn find(&self, text: &str) -> Option<String> {
        self.pattern.find(text).map(|m| m.as_str().to_string())
    }
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// 日時をタイムゾーンに依存しない年月日時分秒の要素で保存する。
mod stamp {
    use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    enum StampKind {
        #[serde(rename = "datetime")]
        DateTime,
    }

    #[derive(Serialize, Deserialize)]
    struct Stamp {
        #[serde(rename = "__klass__")]
        kind: StampKind,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        #[serde(default)]
        second: u32,
        #[serde(default)]
        microsecond: u32,
    }

    pub fn serialize<S>(datetime: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Stamp {
            kind: StampKind::DateTime,
            year: datetime.year(),
            month: datetime.month(),
            day: datetime.day(),
            hour: datetime.hour(),
            minute: datetime.minute(),
            second: datetime.second(),
            microsecond: datetime.nanosecond() / 1_000,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let stamp = Stamp::deserialize(deserializer)?;
        NaiveDate::from_ymd_opt(stamp.year, stamp.month, stamp.day)
            .and_then(|date| {
                date.and_hms_micro_opt(stamp.hour, stamp.minute, stamp.second, stamp.microsecond)
            })
            .ok_or_else(|| {
                de::Error::custom(format!(
                    "invalid datetime: {}-{}-{} {}:{}:{}.{}",
                    stamp.year,
                    stamp.month,
                    stamp.day,
                    stamp.hour,
                    stamp.minute,
                    stamp.second,
                    stamp.microsecond
                ))
            })
    }
}
