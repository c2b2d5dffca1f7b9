use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::config::Config;

/// エイリアスを追加・削除・一覧表示するためのサブコマンド。
///
/// エイリアスは`start <値> <エイリアス名>`の短縮として使える。
#[derive(Debug, Default, clap::Args)]
pub struct AliasArgs {
    #[clap(long = "add", value_name = "ALIAS", conflicts_with = "remove", help = "Add ALIAS for the given VALUE")]
    pub add: Option<String>,

    #[clap(long = "del", value_name = "ALIAS", help = "Remove ALIAS")]
    pub remove: Option<String>,

    #[clap(value_name = "VALUE", help = "The value the alias expands to")]
    pub value: Vec<String>,
}

pub struct AliasCommand<'a> {
    config: &'a mut Config,
    config_path: &'a Path,
}

impl<'a> AliasCommand<'a> {
    /// 新しい`AliasCommand`を返す。
    ///
    /// # Arguments
    /// * `config` - 設定
    /// * `config_path` - 変更した設定の保存先
    pub fn new(config: &'a mut Config, config_path: &'a Path) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// `alias`サブコマンドの処理を行う。
    ///
    /// 追加・削除した場合は設定ファイルを保存する。どちらも指定されていない場合は一覧を表示する。
    pub fn run<W: Write>(&mut self, alias: AliasArgs, writer: &mut W) -> Result<()> {
        if let Some(name) = alias.add {
            let value = alias.value.join(" ");
            if value.trim().is_empty() {
                bail!("A value is required to add alias: {}", name);
            }
            writeln!(writer, "Adding \"{}\" as an alias for \"{}\".", name, value)
                .context("Failed to write message")?;
            self.config.aliases.insert(name, value);
            return self.config.save(self.config_path);
        }

        if let Some(name) = alias.remove {
            if self.config.aliases.remove(&name).is_none() {
                bail!("No such alias: {}", name);
            }
            writeln!(writer, "Removing \"{}\" as an alias.", name).context("Failed to write message")?;
            return self.config.save(self.config_path);
        }

        for (name, value) in &self.config.aliases {
            writeln!(writer, "{}: {}", name, value)
                .with_context(|| format!("Failed to write alias: {}", name))?;
        }
        Ok(())
    }
}
