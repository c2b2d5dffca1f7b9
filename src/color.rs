use colored::{ColoredString, Colorize};

/// レポート表示時の色付けを行う。
///
/// `enabled`が`false`の場合は文字列をそのまま返す。
#[derive(Clone, Copy, Debug)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    /// 新しい`Palette`を返す。
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// 色付けを行わない`Palette`を返す。
    #[cfg(test)]
    pub fn plain() -> Self {
        Self::new(false)
    }

    fn paint(&self, s: &str, style: impl FnOnce(&str) -> ColoredString) -> String {
        if self.enabled {
            style(s).to_string()
        } else {
            s.to_string()
        }
    }

    pub fn bold(&self, s: &str) -> String {
        self.paint(s, |s| s.bold())
    }

    pub fn bold_underline(&self, s: &str) -> String {
        self.paint(s, |s| s.bold().underline())
    }

    pub fn bold_purple(&self, s: &str) -> String {
        self.paint(s, |s| s.purple().bold())
    }

    pub fn green(&self, s: &str) -> String {
        self.paint(s, |s| s.green())
    }

    pub fn yellow(&self, s: &str) -> String {
        self.paint(s, |s| s.yellow())
    }

    pub fn red(&self, s: &str) -> String {
        self.paint(s, |s| s.red())
    }

    /// 区切り文字用の暗い灰色。
    pub fn faint(&self, s: &str) -> String {
        self.paint(s, |s| s.bright_black())
    }

    /// 時間の表示に使う。
    pub fn hours(&self, s: &str, bold: bool, underline: bool) -> String {
        self.paint(s, |s| emphasize(s.cyan(), bold, underline))
    }

    /// 分の表示に使う。
    pub fn minutes(&self, s: &str, bold: bool, underline: bool) -> String {
        self.paint(s, |s| emphasize(s.blue(), bold, underline))
    }
}

fn emphasize(s: ColoredString, bold: bool, underline: bool) -> ColoredString {
    let s = if bold { s.bold() } else { s };
    if underline {
        s.underline()
    } else {
        s
    }
}
