use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    SharedCounter { width: usize },
    PerRunCounter { width: usize, start: u64 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("テンプレートの '[' に対応する ']' がありません")]
    UnbalancedBracket,
}

pub fn tokenize(pattern: &str) -> Result<Vec<Segment>, TemplateError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut segments = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        // [ ... ] は数字や x を含んでいても強制リテラル。括弧自体は出力しない。
        if ch == '[' {
            let close = chars[i + 1..]
                .iter()
                .position(|&c| c == ']')
                .ok_or(TemplateError::UnbalancedBracket)?;
            segments.push(Segment::Literal(chars[i + 1..i + 1 + close].iter().collect()));
            i += close + 2;
            continue;
        }

        if is_shared_marker(ch) {
            let mut j = i;
            while j < chars.len() && is_shared_marker(chars[j]) {
                j += 1;
            }
            segments.push(Segment::SharedCounter { width: j - i });
            i = j;
            continue;
        }

        if ch.is_ascii_digit() {
            let mut j = i;
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            // 先頭ゼロは幅にだけ効く。桁あふれは飽和。
            let start = chars[i..j].iter().fold(0u64, |acc, &c| {
                acc.saturating_mul(10)
                    .saturating_add(u64::from(c as u8 - b'0'))
            });
            segments.push(Segment::PerRunCounter { width: j - i, start });
            i = j;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len()
            && !chars[j].is_ascii_digit()
            && !is_shared_marker(chars[j])
            && chars[j] != '['
        {
            j += 1;
        }
        segments.push(Segment::Literal(chars[i..j].iter().collect()));
        i = j;
    }

    Ok(segments)
}

// per_run はテンプレート中の PerRunCounter と同数・同順で渡す前提。
pub fn render(segments: &[Segment], shared: u64, per_run: &[u64]) -> String {
    let mut out = String::new();
    let mut cursor = 0usize;

    for segment in segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::SharedCounter { width } => out.push_str(&format_counter(shared, *width)),
            Segment::PerRunCounter { width, .. } => {
                out.push_str(&format_counter(per_run[cursor], *width));
                cursor += 1;
            }
        }
    }

    out
}

pub fn has_shared_segment(segments: &[Segment]) -> bool {
    segments
        .iter()
        .any(|segment| matches!(segment, Segment::SharedCounter { .. }))
}

pub fn per_run_starts(segments: &[Segment]) -> Vec<u64> {
    segments
        .iter()
        .filter_map(|segment| match segment {
            Segment::PerRunCounter { start, .. } => Some(*start),
            _ => None,
        })
        .collect()
}

fn format_counter(value: u64, width: usize) -> String {
    if width > 1 {
        format!("{value:0width$}")
    } else {
        value.to_string()
    }
}

fn is_shared_marker(ch: char) -> bool {
    matches!(ch, 'x' | 'X')
}
