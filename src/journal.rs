use std::fmt::Write;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::{debug, info};
use thiserror::Error;

use crate::config::{expand_path, StateConfig};
use crate::datetime;
use crate::entry::Entry;

/// ワークログファイルの読み込みで発生するエラー。
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("failed to read worklog {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed worklog {path}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 1日分のワークログ。
///
/// エントリーは常に開始時間の昇順に並んでいる。同じ開始時間のエントリーは追加した順になる。
///
/// # Examples
///
/// ```
/// let mut journal = Journal::open(date, &config.state)?;
/// journal.insert(Some(Entry::from(DayEnd::new(datetime::now()))));
/// journal.close()?;
/// ```
#[derive(Debug)]
pub struct Journal {
    date: NaiveDate,
    path: PathBuf,
    entries: Vec<Entry>,
}

impl Journal {
    /// 指定された日付のワークログを読み込む。
    ///
    /// 保存先のファイルが存在しない場合は空のワークログを返す。
    ///
    /// # Arguments
    ///
    /// * `date` - ワークログの日付
    /// * `state` - 保存先の設定
    pub fn open(date: NaiveDate, state: &StateConfig) -> Result<Self> {
        let path = storage_path(date, state)?;
        let entries = load_entries(&path)?;
        info!("Opened worklog {} with {} entries", path.display(), entries.len());

        Ok(Self {
            date,
            path,
            entries,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// エントリーを追加し、開始時間で並べ直す。`None`の場合は何もしない。
    pub fn insert(&mut self, entry: Option<Entry>) {
        let Some(entry) = entry else {
            return;
        };
        debug!("Insert entry: {:?}", entry);
        self.entries.push(entry);
        self.entries.sort_by_key(Entry::start);
    }

    /// 各エントリーと次のエントリーの組を返す。
    ///
    /// 最後のエントリーの次は現在時刻(`Successor::Now`)になる。呼び出すたびに現在時刻を取り直す。
    pub fn pairwise(&self) -> Pairwise<'_> {
        Pairwise {
            entries: &self.entries,
            index: 0,
            now: datetime::now(),
        }
    }

    /// 指定した位置のタスクを記録済みにする。
    pub fn mark_logged(&mut self, index: usize) {
        if let Some(Entry::Task(task)) = self.entries.get_mut(index) {
            task.logged = true;
        }
    }

    /// ワークログを保存する。
    ///
    /// コマンドが正常に終わった時だけ呼び出す。内容のないエントリーは保存せず、
    /// 保存するエントリーが1件もなければファイルを作らない。
    pub fn close(&self) -> Result<()> {
        let entries: Vec<&Entry> = self.entries.iter().filter(|entry| entry.has_content()).collect();
        if entries.is_empty() {
            debug!("Nothing to save to {}", self.path.display());
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string(&entries).context("Failed to serialize worklog")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write worklog to {}", self.path.display()))?;
        info!("Saved {} entries to {}", entries.len(), self.path.display());

        Ok(())
    }
}

/// 保存先のファイルパスを決める。
fn storage_path(date: NaiveDate, state: &StateConfig) -> Result<PathBuf> {
    let mut when = String::new();
    write!(when, "{}", date.format(&state.when_format))
        .with_context(|| format!("Invalid date format: {}", state.when_format))?;
    let filename = state.store_filename_format.replace("{}", &when);
    expand_path(&filename)
}

fn load_entries(path: &Path) -> Result<Vec<Entry>, JournalError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("No worklog at {}", path.display());
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(JournalError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut entries: Vec<Entry> =
        serde_json::from_str(&content).map_err(|source| JournalError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
    entries.sort_by_key(Entry::start);

    Ok(entries)
}

/// 次のエントリー。
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Successor<'a> {
    Entry(&'a Entry),
    /// まだ閉じていない区間の終わりとしての現在時刻。保存されることはない。
    Now(NaiveDateTime),
}

impl Successor<'_> {
    pub fn start(&self) -> NaiveDateTime {
        match self {
            Successor::Entry(entry) => entry.start(),
            Successor::Now(now) => *now,
        }
    }

    pub fn is_now(&self) -> bool {
        matches!(self, Successor::Now(_))
    }
}

/// `Journal::pairwise`が返すエントリーの組。
#[derive(Clone, Copy, Debug)]
pub struct Pair<'a> {
    pub index: usize,
    pub entry: &'a Entry,
    pub next: Successor<'a>,
}

impl Pair<'_> {
    /// エントリーの開始から次のエントリーの開始までの時間。
    pub fn delta(&self) -> Duration {
        self.next.start() - self.entry.start()
    }
}

/// `Journal::pairwise`のイテレーター。
pub struct Pairwise<'a> {
    entries: &'a [Entry],
    index: usize,
    now: NaiveDateTime,
}

impl<'a> Iterator for Pairwise<'a> {
    type Item = Pair<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.get(self.index)?;
        let next = match self.entries.get(self.index + 1) {
            Some(next) => Successor::Entry(next),
            None => Successor::Now(self.now),
        };
        let pair = Pair {
            index: self.index,
            entry,
            next,
        };
        self.index += 1;

        Some(pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.entries.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Pairwise<'_> {}
