use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

const SUGGESTION_LIMIT: usize = 10;
const EXAMPLE_LIMIT: usize = 5;

pub fn suggest_prefixes(stems: &[String], k: usize, limit: usize) -> Vec<(String, usize)> {
    let mut counts = HashMap::<String, usize>::new();
    for stem in stems {
        if stem.chars().count() >= k {
            let prefix: String = stem.chars().take(k).collect();
            *counts.entry(prefix).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

pub fn choose_prefix(messy: &[PathBuf], k: usize) -> Result<Option<String>> {
    let stems: Vec<String> = messy.iter().map(|path| stem_of(path)).collect();
    let suggestions = suggest_prefixes(&stems, k, SUGGESTION_LIMIT);
    let Some((best, best_count)) = suggestions.first().cloned() else {
        return Ok(None);
    };

    println!();
    println!(
        "「乱れた名前」とみられる画像を {} 件検出しました。",
        messy.len()
    );
    println!("最も多い先頭 {k} 文字の接頭辞は '{best}'（{best_count} 件）です。");
    print_examples(messy, &best);

    loop {
        let answer = read_line(&format!(
            "\n接頭辞 '{best}' のファイルだけをリネームしますか？ [y/n] "
        ))?;
        match answer.to_lowercase().as_str() {
            "y" => return Ok(Some(best)),
            "n" => {
                println!("\nリネームせず、候補から選び直せます:");
                println!("1) 番号を入力  2) 接頭辞を直接入力  3) q で中止\n");
                for (index, (prefix, count)) in suggestions.iter().enumerate() {
                    println!("  {}. {prefix}  ({count})", index + 1);
                }

                let choice = read_line("\n番号 / 接頭辞 / q: ")?;
                if choice.eq_ignore_ascii_case("q") {
                    return Ok(None);
                }
                if choice.is_empty() {
                    println!("空入力は無効です。");
                    continue;
                }

                let picked = match choice.parse::<usize>() {
                    Ok(index) if (1..=suggestions.len()).contains(&index) => {
                        suggestions[index - 1].0.clone()
                    }
                    Ok(_) => {
                        println!("番号が範囲外です。");
                        continue;
                    }
                    Err(_) => choice,
                };

                if !messy.iter().any(|path| stem_of(path).starts_with(&picked)) {
                    println!("接頭辞 '{picked}' に一致するファイルがありません。");
                    continue;
                }
                print_examples(messy, &picked);

                let confirm = read_line(&format!("接頭辞 '{picked}' を使いますか？ [y/n] "))?;
                if confirm.eq_ignore_ascii_case("y") {
                    return Ok(Some(picked));
                }
            }
            _ => println!("y か n を入力してください。"),
        }
    }
}

pub fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn print_examples(messy: &[PathBuf], prefix: &str) {
    println!("例:");
    for path in messy
        .iter()
        .filter(|path| stem_of(path).starts_with(prefix))
        .take(EXAMPLE_LIMIT)
    {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        println!("  - {name}");
    }
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout()
        .flush()
        .context("標準出力のフラッシュに失敗しました")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("標準入力を読めませんでした")?;
    Ok(line.trim().to_string())
}
