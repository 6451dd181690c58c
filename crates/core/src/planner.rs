use crate::template::{self, TemplateError};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "bmp", "tif", "tiff", "heic", "heif", "gif", "avif", "jfif",
];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub scanned_files: usize,
    pub image_files: usize,
    pub skipped_non_image: usize,
    pub skipped_hidden: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanEntry {
    pub source: PathBuf,
    pub target: PathBuf,
    pub rendered_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenamePlan {
    pub root: PathBuf,
    pub pattern: String,
    pub shared_start: u64,
    pub entries: Vec<PlanEntry>,
    pub stats: ScanStats,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("テンプレートに x も数字もありません（すべて [] の中にあります）")]
    TemplateHasNoCounter,
}

pub fn collect_image_files(
    root: &Path,
    recursive: bool,
    include_hidden: bool,
    stats: &mut ScanStats,
) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();

    if recursive {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("フォルダ走査に失敗しました: {}", root.display()))?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            record_file(path.to_path_buf(), include_hidden, stats, &mut out);
        }
    } else {
        for entry in fs::read_dir(root)
            .with_context(|| format!("フォルダを読めませんでした: {}", root.display()))?
        {
            let entry =
                entry.with_context(|| format!("エントリ読み取り失敗: {}", root.display()))?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            record_file(path, include_hidden, stats, &mut out);
        }
    }

    // ファイル名の大文字小文字を無視した辞書順。
    out.sort_by(|a, b| {
        file_name_lower(a)
            .cmp(&file_name_lower(b))
            .then_with(|| a.cmp(b))
    });

    Ok(out)
}

pub fn build_plan(
    root: &Path,
    candidates: &[PathBuf],
    pattern: &str,
    shared_start: u64,
    stats: ScanStats,
) -> Result<RenamePlan, PlanError> {
    let segments = template::tokenize(pattern)?;
    let use_shared = template::has_shared_segment(&segments);
    let mut per_run = template::per_run_starts(&segments);
    if !use_shared && per_run.is_empty() {
        return Err(PlanError::TemplateHasNoCounter);
    }

    let mut shared = shared_start;
    let mut entries = Vec::with_capacity(candidates.len());

    for source in candidates {
        let base = template::render(&segments, shared, &per_run);
        let extension = source
            .extension()
            .map(|v| format!(".{}", v.to_string_lossy()))
            .unwrap_or_default();
        let target = source.with_file_name(format!("{base}{extension}"));

        entries.push(PlanEntry {
            source: source.clone(),
            target,
            rendered_base: base,
        });

        if use_shared {
            shared += 1;
        }
        for value in &mut per_run {
            *value += 1;
        }
    }

    Ok(RenamePlan {
        root: root.to_path_buf(),
        pattern: pattern.to_string(),
        shared_start,
        entries,
        stats,
    })
}

fn record_file(
    path: PathBuf,
    include_hidden: bool,
    stats: &mut ScanStats,
    out: &mut Vec<PathBuf>,
) {
    stats.scanned_files += 1;

    if is_hidden(&path) && !include_hidden {
        stats.skipped_hidden += 1;
        return;
    }

    if is_image(&path) {
        stats.image_files += 1;
        out.push(path);
    } else {
        stats.skipped_non_image += 1;
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

fn file_name_lower(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
