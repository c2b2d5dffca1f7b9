use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entry::TicketMatcher;

/// 設定ファイルの既定の場所。
const CONFIG_PATH: &str = "~/.worklog/config.json";

/// 設定ファイルの内容。
///
/// 省略された項目は読み込み時に既定値で埋める。知らない項目は`extra`に残し、保存時にそのまま書き戻す。
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub features: Features,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub jira: JiraConfig,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 機能の有効・無効。
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Features {
    #[serde(default = "default_true")]
    pub colorize: bool,
    #[serde(default, rename = "scrape-ticket")]
    pub scrape_ticket: bool,
}

/// ワークログの保存先。
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct StateConfig {
    /// 保存先ファイル名のテンプレート。`{}`が日付に置き換わる。
    #[serde(default = "default_store_filename_format")]
    pub store_filename_format: String,
    /// ファイル名に埋め込む日付の書式。
    #[serde(default = "default_when_format")]
    pub when_format: String,
}

/// Jiraへの接続情報。
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct JiraConfig {
    pub server: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// 説明からチケット番号を探す時のプロジェクトキー。
    #[serde(default)]
    pub projects: Vec<String>,
    /// 認証方式など、このツールが使わない項目。
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_true() -> bool {
    true
}

fn default_store_filename_format() -> String {
    "~/.worklog/{}.json".to_string()
}

fn default_when_format() -> String {
    "%Y-%m-%d".to_string()
}

impl Default for Features {
    fn default() -> Self {
        Self {
            colorize: default_true(),
            scrape_ticket: false,
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            store_filename_format: default_store_filename_format(),
            when_format: default_when_format(),
        }
    }
}

impl Config {
    /// 設定ファイルを読み込む。
    ///
    /// ファイルが存在しない場合は既定値を返す。
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("Config file not found, using defaults: {}", path.display());
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read config from {}", path.display()))
            }
        };
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        debug!("Config loaded: {:?}", config);

        Ok(config)
    }

    /// 設定ファイルを書き出す。
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        info!("Config saved: {}", path.display());

        Ok(())
    }

    /// チケット番号の自動検出が有効な場合に`TicketMatcher`を返す。
    pub fn ticket_matcher(&self) -> Result<Option<TicketMatcher>> {
        if !self.features.scrape_ticket || self.jira.projects.is_empty() {
            return Ok(None);
        }
        TicketMatcher::new(&self.jira.projects).map(Some)
    }
}

/// 既定の設定ファイルのパスを返す。
pub fn default_config_path() -> Result<PathBuf> {
    expand_path(CONFIG_PATH)
}

/// `~`と環境変数(`$VAR`, `${VAR}`)を展開する。
///
/// 未定義の環境変数はそのまま残す。
pub fn expand_path(path: &str) -> Result<PathBuf> {
    let var_re = Regex::new(r"\$(?:\{(\w+)\}|(\w+))").context("Invalid variable pattern")?;
    let expanded = var_re.replace_all(path, |caps: &Captures| {
        let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        std::env::var(name).unwrap_or_else(|_| caps[0].to_string())
    });

    if expanded == "~" || expanded.starts_with("~/") {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let rest = expanded.trim_start_matches('~').trim_start_matches('/');
        return Ok(home.join(rest));
    }

    Ok(PathBuf::from(expanded.into_owned()))
}
