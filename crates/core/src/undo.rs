use crate::apply::{two_phase_rename, RenameError};
use crate::log::{RenameLog, RenamePair};
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UndoError {
    #[error("取り消し元が見つかりません: {}", .0.display())]
    SourceMissing(PathBuf),
    #[error("取り消し先が既に存在します: {}", .0.display())]
    TargetExists(PathBuf),
    #[error("取り消しのリネームに失敗しました")]
    Rename(#[from] RenameError),
}

#[derive(Debug, Clone)]
pub struct UndoReport {
    pub reversals: Vec<RenamePair>,
    pub restored: usize,
}

// 適用順の逆順で「新名 -> 旧名」を作り、全ペアを検査してから実行する。
// 入れ替えを含むバッチも戻せるよう、実行は適用時と同じ二段階リネーム。
pub fn undo_from_log(log: &RenameLog, preview: bool) -> Result<UndoReport, UndoError> {
    let reversals: Vec<RenamePair> = log
        .pairs
        .iter()
        .rev()
        .map(|pair| RenamePair {
            source: pair.destination.clone(),
            destination: pair.source.clone(),
        })
        .collect();

    let vacated: HashSet<&PathBuf> = reversals.iter().map(|pair| &pair.source).collect();

    for pair in &reversals {
        if !pair.source.exists() {
            return Err(UndoError::SourceMissing(pair.source.clone()));
        }
        if pair.destination.exists()
            && pair.destination != pair.source
            && !vacated.contains(&pair.destination)
        {
            return Err(UndoError::TargetExists(pair.destination.clone()));
        }
    }

    if preview {
        return Ok(UndoReport {
            reversals,
            restored: 0,
        });
    }

    two_phase_rename(&reversals)?;
    let restored = reversals.len();
    Ok(UndoReport {
        reversals,
        restored,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::execute_plan;
    use crate::planner::{build_plan, ScanStats};
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn dir_names(root: &Path) -> BTreeSet<String> {
        fs::read_dir(root)
            .expect("read dir")
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn round_trip_restores_original_file_set() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        let a = root.join("IMG_A.jpg");
        let b = root.join("IMG_B.jpg");
        fs::write(&a, b"A").expect("write a");
        fs::write(&b, b"B").expect("write b");
        let before = dir_names(root);

        let plan = build_plan(root, &[a.clone(), b.clone()], "[p]xx", 1, ScanStats::default())
            .expect("plan must build");
        let log = execute_plan(&plan, false).expect("apply must succeed");
        assert_ne!(dir_names(root), before);

        let report = undo_from_log(&log, false).expect("undo must succeed");
        assert_eq!(report.restored, 2);
        assert_eq!(dir_names(root), before);
        assert_eq!(fs::read(&a).expect("read a"), b"A");
        assert_eq!(fs::read(&b).expect("read b"), b"B");
    }

    #[test]
    fn undo_restores_a_b_swap() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        let a = root.join("a.jpg");
        let b = root.join("b.jpg");
        fs::write(&a, b"A").expect("write a");
        fs::write(&b, b"B").expect("write b");

        let log = RenameLog::new(vec![
            RenamePair {
                source: a.clone(),
                destination: b.clone(),
            },
            RenamePair {
                source: b.clone(),
                destination: a.clone(),
            },
        ]);
        crate::apply::two_phase_rename(&log.pairs).expect("swap must succeed");
        assert_eq!(fs::read(&b).expect("read b"), b"A");

        undo_from_log(&log, false).expect("undo of swap must succeed");
        assert_eq!(fs::read(&a).expect("read a"), b"A");
        assert_eq!(fs::read(&b).expect("read b"), b"B");
    }

    #[test]
    fn preview_checks_but_does_not_rename() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        let renamed = root.join("p1.jpg");
        fs::write(&renamed, b"A").expect("write renamed");

        let log = RenameLog::new(vec![RenamePair {
            source: root.join("a.jpg"),
            destination: renamed.clone(),
        }]);

        let report = undo_from_log(&log, true).expect("preview must succeed");
        assert_eq!(report.restored, 0);
        assert_eq!(report.reversals[0].destination, root.join("a.jpg"));
        assert!(renamed.exists(), "preview must not rename");
        assert!(!root.join("a.jpg").exists());
    }

    #[test]
    fn missing_renamed_file_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();

        let log = RenameLog::new(vec![RenamePair {
            source: root.join("a.jpg"),
            destination: root.join("p1.jpg"),
        }]);

        let err = undo_from_log(&log, false).expect_err("missing file must fail");
        assert!(matches!(err, UndoError::SourceMissing(_)));
    }

    #[test]
    fn occupied_original_name_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        fs::write(root.join("p1.jpg"), b"A").expect("write renamed");
        fs::write(root.join("a.jpg"), b"intruder").expect("write occupant");

        let log = RenameLog::new(vec![RenamePair {
            source: root.join("a.jpg"),
            destination: root.join("p1.jpg"),
        }]);

        let err = undo_from_log(&log, false).expect_err("occupied original must fail");
        assert!(matches!(err, UndoError::TargetExists(_)));
        assert_eq!(
            fs::read(root.join("a.jpg")).expect("read occupant"),
            b"intruder"
        );
    }

    #[test]
    fn self_rename_pairs_are_noops() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        let same = root.join("p1.jpg");
        fs::write(&same, b"A").expect("write file");

        let log = RenameLog::new(vec![RenamePair {
            source: same.clone(),
            destination: same.clone(),
        }]);

        let report = undo_from_log(&log, false).expect("self pair must be accepted");
        assert_eq!(report.restored, 1);
        assert!(same.exists());
    }
}
