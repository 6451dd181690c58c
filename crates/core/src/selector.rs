use std::path::{Path, PathBuf};

const MESSY_STEM_LEN: usize = 24;
const MESSY_NO_SEP_LEN: usize = 18;
const MESSY_UNCOMMON_LIMIT: usize = 3;
const WEIRD_SYMBOLS: &str = "!*=+@#$%^&()[]{};,'`~<>|\\";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionRule {
    Prefixes(Vec<String>),
    Messy,
}

pub fn select_candidates(
    paths: &[PathBuf],
    rule: &SelectionRule,
    include_cjk: bool,
) -> Vec<PathBuf> {
    paths
        .iter()
        .filter(|path| matches_rule(path, rule, include_cjk))
        .cloned()
        .collect()
}

fn matches_rule(path: &Path, rule: &SelectionRule, include_cjk: bool) -> bool {
    let stem = match path.file_stem() {
        Some(stem) => stem.to_string_lossy(),
        None => return false,
    };

    if !include_cjk && contains_cjk(&stem) {
        return false;
    }

    match rule {
        SelectionRule::Prefixes(prefixes) => match_any_prefix(&stem, prefixes),
        SelectionRule::Messy => is_messy_name(&stem),
    }
}

pub fn contains_cjk(value: &str) -> bool {
    value.chars().any(|ch| {
        let code = ch as u32;
        (0x4E00..=0x9FFF).contains(&code)
            || (0x3400..=0x4DBF).contains(&code)
            || (0xF900..=0xFAFF).contains(&code)
    })
}

pub fn parse_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn match_any_prefix(stem: &str, prefixes: &[String]) -> bool {
    if prefixes.is_empty() {
        return true;
    }
    prefixes.iter().any(|prefix| stem.starts_with(prefix))
}

pub fn is_messy_name(stem: &str) -> bool {
    if stem.is_empty() {
        return false;
    }

    if stem.chars().count() >= MESSY_STEM_LEN {
        return true;
    }

    if stem.chars().any(|ch| WEIRD_SYMBOLS.contains(ch)) {
        return true;
    }

    let uncommon = stem
        .chars()
        .filter(|&ch| !ch.is_alphanumeric() && !is_common_separator(ch))
        .count();
    if uncommon >= MESSY_UNCOMMON_LIMIT {
        return true;
    }

    // 区切りなしで英数字が長く混在する名前はハッシュ由来とみなす。
    let has_separator = stem.chars().any(is_common_separator);
    if !has_separator && stem.chars().count() >= MESSY_NO_SEP_LEN {
        let has_digit = stem.chars().any(|ch| ch.is_ascii_digit());
        let has_alpha = stem.chars().any(char::is_alphabetic);
        if has_digit && has_alpha {
            return true;
        }
    }

    false
}

fn is_common_separator(ch: char) -> bool {
    matches!(ch, '_' | '-' | '.' | ' ')
}
