use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use crate::start_command::StartArgs;

/// エイリアスを`start`として実行する時の引数。
#[derive(Debug, Parser)]
struct AliasInvocation {
    #[clap(flatten)]
    start: StartArgs,
}

/// エイリアスが展開される説明を返す。
///
/// エイリアスの値の後ろにエイリアス名を付ける。値にチケット番号を書いておけば説明から検出できる。
pub fn expand(aliases: &BTreeMap<String, String>, name: &str) -> Option<String> {
    aliases.get(name).map(|value| format!("{} {}", value, name))
}

/// エイリアスとして渡されたコマンドラインを`start`の引数に変換する。
///
/// # Arguments
///
/// * `aliases` - 設定されているエイリアス
/// * `argv` - エイリアス名から始まる引数
pub fn translate(aliases: &BTreeMap<String, String>, argv: &[String]) -> Result<StartArgs> {
    let Some(name) = argv.first() else {
        bail!("No command given");
    };
    let Some(expanded) = expand(aliases, name) else {
        bail!("unrecognized command: '{}'", name);
    };

    let mut invocation = AliasInvocation::try_parse_from(argv)
        .with_context(|| format!("Invalid arguments for alias: {}", name))?;
    invocation.start.description.insert(0, expanded);
    info!("Alias {} expanded to: {:?}", name, invocation.start.description);

    Ok(invocation.start)
}
