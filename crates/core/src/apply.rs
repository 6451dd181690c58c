use crate::log::{RenameLog, RenamePair};
use crate::planner::RenamePlan;
use chrono::Local;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    pub backup_originals: bool,
}

#[derive(Debug, Error)]
pub enum RenameError {
    #[error("バックアップに失敗しました: {}", .path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("一時リネームに失敗しました: {}（変更済みの {} 件は元に戻しました）", .path.display(), .restored)]
    Stage {
        path: PathBuf,
        restored: usize,
        #[source]
        source: io::Error,
    },
    #[error(
        "一時リネームの失敗（{}）後、復旧にも失敗しました: {}（{} 件が一時名のまま残っています）",
        .stage_error,
        .path.display(),
        .stranded.len()
    )]
    StageRollback {
        stage_error: String,
        path: PathBuf,
        stranded: Vec<PathBuf>,
        #[source]
        source: io::Error,
    },
    #[error(
        "最終リネームに失敗しました: {}（確定済み {} 件、一時名のまま {} 件。ログを元に手動で復旧してください）",
        .path.display(),
        .applied.len(),
        .stranded.len()
    )]
    FinalizePartial {
        path: PathBuf,
        applied: Vec<RenamePair>,
        stranded: Vec<PathBuf>,
        #[source]
        source: io::Error,
    },
}

pub fn execute_plan(plan: &RenamePlan, preview: bool) -> Result<RenameLog, RenameError> {
    execute_plan_with_options(plan, preview, &ApplyOptions::default())
}

pub fn execute_plan_with_options(
    plan: &RenamePlan,
    preview: bool,
    options: &ApplyOptions,
) -> Result<RenameLog, RenameError> {
    let log = RenameLog::new(
        plan.entries
            .iter()
            .map(|entry| RenamePair {
                source: entry.source.clone(),
                destination: entry.target.clone(),
            })
            .collect(),
    );

    if preview {
        return Ok(log);
    }

    if options.backup_originals {
        backup_original_files(plan)?;
    }

    two_phase_rename(&log.pairs)?;
    Ok(log)
}

#[derive(Debug, Clone)]
struct StagedRename {
    pair: RenamePair,
    temp: PathBuf,
}

// 全ファイルを一時名に退避し終えてから最終名に付け替える。
// 同一バッチ内で新旧の名前が重なっても（入れ替え・循環を含む）衝突しない。
pub(crate) fn two_phase_rename(pairs: &[RenamePair]) -> Result<(), RenameError> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S%3f").to_string();

    let mut staged = Vec::<StagedRename>::with_capacity(pairs.len());
    for (index, pair) in pairs.iter().enumerate() {
        let temp = temp_path_for(&pair.source, &stamp, index);
        if let Err(err) = fs::rename(&pair.source, &temp) {
            return Err(stage_failure(&staged, pair.source.clone(), err));
        }
        staged.push(StagedRename {
            pair: pair.clone(),
            temp,
        });
    }

    let mut applied = Vec::<RenamePair>::with_capacity(staged.len());
    for entry in &staged {
        if let Err(err) = fs::rename(&entry.temp, &entry.pair.destination) {
            // ここでの巻き戻しは新たな衝突を生みかねない。状態をそのまま報告する。
            let stranded = staged
                .iter()
                .skip(applied.len())
                .map(|e| e.temp.clone())
                .collect();
            return Err(RenameError::FinalizePartial {
                path: entry.pair.destination.clone(),
                applied,
                stranded,
                source: err,
            });
        }
        applied.push(entry.pair.clone());
    }

    Ok(())
}

fn stage_failure(staged: &[StagedRename], path: PathBuf, err: io::Error) -> RenameError {
    let mut restored = 0usize;
    for entry in staged.iter().rev() {
        if let Err(rollback_err) = fs::rename(&entry.temp, &entry.pair.source) {
            let stranded = staged
                .iter()
                .filter(|e| e.temp.exists())
                .map(|e| e.temp.clone())
                .collect();
            return RenameError::StageRollback {
                stage_error: err.to_string(),
                path: entry.temp.clone(),
                stranded,
                source: rollback_err,
            };
        }
        restored += 1;
    }

    RenameError::Stage {
        path,
        restored,
        source: err,
    }
}

fn temp_path_for(source: &Path, stamp: &str, index: usize) -> PathBuf {
    let name = source
        .file_name()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    source.with_file_name(format!("{name}.__tmp_rename__{stamp}_{index}__"))
}

fn backup_original_files(plan: &RenamePlan) -> Result<(), RenameError> {
    let backup_root = plan.root.join("backup");
    fs::create_dir_all(&backup_root).map_err(|source| RenameError::Backup {
        path: backup_root.clone(),
        source,
    })?;

    let mut reserved = HashSet::<PathBuf>::new();
    let jobs: Vec<(PathBuf, PathBuf)> = plan
        .entries
        .iter()
        .map(|entry| {
            let backup = backup_path_for(&backup_root, &plan.root, &entry.source, &mut reserved);
            (entry.source.clone(), backup)
        })
        .collect();

    jobs.par_iter()
        .try_for_each(|(source, backup)| -> Result<(), RenameError> {
            if let Some(parent) = backup.parent() {
                fs::create_dir_all(parent).map_err(|err| RenameError::Backup {
                    path: parent.to_path_buf(),
                    source: err,
                })?;
            }
            fs::copy(source, backup)
                .map(|_| ())
                .map_err(|err| RenameError::Backup {
                    path: source.clone(),
                    source: err,
                })
        })
}

fn backup_path_for(
    backup_root: &Path,
    root: &Path,
    source: &Path,
    reserved: &mut HashSet<PathBuf>,
) -> PathBuf {
    let candidate = match source.strip_prefix(root) {
        Ok(relative) if !relative.as_os_str().is_empty() => backup_root.join(relative),
        _ => backup_root.join(source.file_name().unwrap_or_default()),
    };

    if !candidate.exists() && !reserved.contains(&candidate) {
        reserved.insert(candidate.clone());
        return candidate;
    }

    let stem = candidate
        .file_stem()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    let extension = candidate
        .extension()
        .map(|v| format!(".{}", v.to_string_lossy()))
        .unwrap_or_default();
    let parent = candidate.parent().unwrap_or(backup_root).to_path_buf();

    let mut n = 1usize;
    loop {
        let next = parent.join(format!("{stem}_{n:03}{extension}"));
        if !next.exists() && !reserved.contains(&next) {
            reserved.insert(next.clone());
            return next;
        }
        n += 1;
    }
}
