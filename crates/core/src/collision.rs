use crate::planner::RenamePlan;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollisionError {
    #[error("リネーム先の名前が重複しています: {0}")]
    DuplicateTarget(String),
    #[error("リネーム先が既に存在し、今回の対象にも含まれていません: {0}")]
    TargetAlreadyExists(String),
    #[error("パスを解決できませんでした: {}", .path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// 変更前に必ず呼ぶ。重複チェックが先、既存ファイルとの衝突チェックが後。
pub fn validate_plan(plan: &RenamePlan) -> Result<(), CollisionError> {
    let mut seen_targets = HashSet::new();
    for entry in &plan.entries {
        if !seen_targets.insert(entry.target.as_path()) {
            return Err(CollisionError::DuplicateTarget(display_name(&entry.target)));
        }
    }

    let mut sources = HashSet::new();
    for entry in &plan.entries {
        sources.insert(canonicalize(&entry.source)?);
    }

    for entry in &plan.entries {
        if !entry.target.exists() {
            continue;
        }
        // 既にある名前でも、それが今回動かす元ファイル自身なら衝突ではない。
        let occupant = canonicalize(&entry.target)?;
        if !sources.contains(&occupant) {
            return Err(CollisionError::TargetAlreadyExists(display_name(
                &entry.target,
            )));
        }
    }

    Ok(())
}

fn canonicalize(path: &Path) -> Result<PathBuf, CollisionError> {
    fs::canonicalize(path).map_err(|source| CollisionError::Resolve {
        path: path.to_path_buf(),
        source,
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{build_plan, ScanStats};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn plan_for(root: &Path, candidates: &[PathBuf], pattern: &str) -> RenamePlan {
        build_plan(root, candidates, pattern, 1, ScanStats::default()).expect("plan must build")
    }

    #[test]
    fn rejects_duplicate_targets_even_with_two_entries() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        let a = root.join("a.jpg");
        let b = root.join("b.jpg");
        fs::write(&a, b"a").expect("write a");
        fs::write(&b, b"b").expect("write b");

        let plan = plan_for(root, &[a, b], "[same]x");
        let mut broken = plan.clone();
        broken.entries[1].target = broken.entries[0].target.clone();

        let err = validate_plan(&broken).expect_err("duplicate must be rejected");
        assert!(matches!(err, CollisionError::DuplicateTarget(_)));
    }

    #[test]
    fn rejects_existing_foreign_occupant() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        let source = root.join("a.jpg");
        fs::write(&source, b"a").expect("write source");
        fs::write(root.join("pic_1.jpg"), b"other").expect("write occupant");

        let plan = plan_for(root, &[source], "[pic_]x");
        let err = validate_plan(&plan).expect_err("occupied target must be rejected");
        assert!(matches!(err, CollisionError::TargetAlreadyExists(_)));
    }

    #[test]
    fn allows_target_equal_to_own_source() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        let source = root.join("pic_1.jpg");
        fs::write(&source, b"a").expect("write source");

        let plan = plan_for(root, &[source], "[pic_]x");
        validate_plan(&plan).expect("self-rename must be accepted");
    }

    #[test]
    fn allows_target_occupied_by_another_plan_source() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        let a = root.join("pic_2.jpg");
        let b = root.join("pic_1.jpg");
        fs::write(&a, b"a").expect("write a");
        fs::write(&b, b"b").expect("write b");

        // pic_1 -> pic_2, pic_2 -> pic_3 と同一バッチ内で名前が重なる場合。
        let plan = build_plan(root, &[b, a], "[pic_]x", 2, ScanStats::default())
            .expect("plan must build");
        validate_plan(&plan).expect("overlapping batch must be accepted");
    }
}
