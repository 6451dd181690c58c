use anyhow::{Context, Result};
use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenamePair {
    pub source: PathBuf,
    pub destination: PathBuf,
}

// 1回の実行ごとに1ファイル。書き込み後は変更せず、取り消し後も消さない。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenameLog {
    pub created_at: String,
    pub pairs: Vec<RenamePair>,
}

impl RenameLog {
    pub fn new(pairs: Vec<RenamePair>) -> Self {
        Self {
            created_at: Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
            pairs,
        }
    }
}

pub fn save_log(dir: &Path, log: &RenameLog) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("rename_log_{stamp}.json"));

    let body =
        serde_json::to_string_pretty(log).context("リネームログのシリアライズに失敗しました")?;
    fs::write(&path, body)
        .with_context(|| format!("リネームログを書き込めませんでした: {}", path.display()))?;

    Ok(path)
}

pub fn load_log(path: &Path) -> Result<RenameLog> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("リネームログを読めませんでした: {}", path.display()))?;
    serde_json::from_str::<RenameLog>(&raw)
        .with_context(|| format!("リネームログが壊れています: {}", path.display()))
}
