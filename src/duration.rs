use std::fmt;

use crate::color::Palette;

const SECONDS_IN_MINUTE: i64 = 60;
const SECONDS_IN_HOUR: i64 = SECONDS_IN_MINUTE * 60;

/// 時間と分だけで表した期間。
///
/// 秒以下は切り捨てる。`Display`はJiraの`timeSpent`と同じ`1h 30m`形式になる。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Duration {
    hours: i64,
    minutes: i64,
}

impl Duration {
    /// `chrono::Duration`から`Duration`を作成する。
    pub fn new(delta: chrono::Duration) -> Self {
        let seconds = delta.num_seconds();
        let hours = seconds / SECONDS_IN_HOUR;
        let minutes = (seconds % SECONDS_IN_HOUR) / SECONDS_IN_MINUTE;
        Self { hours, minutes }
    }

    pub fn hours(&self) -> i64 {
        self.hours
    }

    pub fn minutes(&self) -> i64 {
        self.minutes
    }

    /// 時間と分がどちらも0の場合に`true`を返す。
    pub fn is_zero(&self) -> bool {
        self.hours <= 0 && self.minutes <= 0
    }

    /// レポートの列に合わせて7文字幅で色付けした文字列を返す。
    ///
    /// 0の要素は空白で埋める。100時間以上の場合は時間の桁が増える分だけ列幅を超える。
    pub fn colorized(&self, palette: &Palette, underline: bool) -> String {
        let hours = if self.hours > 0 {
            format!(
                "{}{}",
                palette.hours(&format!("{:2}", self.hours), true, underline),
                palette.hours("h", false, underline)
            )
        } else {
            "   ".to_string()
        };
        let minutes = if self.minutes > 0 {
            format!(
                "{}{}",
                palette.minutes(&format!("{:2}", self.minutes), true, underline),
                palette.minutes("m", false, underline)
            )
        } else {
            "   ".to_string()
        };
        format!("{} {}", hours, minutes)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.hours() > 0 {
            parts.push(format!("{}h", self.hours()));
        }
        if self.minutes() > 0 {
            parts.push(format!("{}m", self.minutes()));
        }
        write!(f, "{}", parts.join(" "))
    }
}
