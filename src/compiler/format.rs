//! Best-effort re-indentation of generated source.
//!
//! Emitters produce flat lines; this pass indents them by brace depth. It
//! understands string literals and `//` comments well enough not to count
//! braces inside them. Anything it cannot balance is reported as `None`
//! and the caller keeps the raw source.

const INDENT: &str = "    ";

/// Re-indent `source` by brace depth. Returns `None` when braces do not
/// balance.
pub fn reindent(source: &str) -> Option<String> {
    let mut out = String::with_capacity(source.len() + source.len() / 4);
    let mut depth: usize = 0;

    for raw in source.lines() {
        let line = raw.trim();
        if line.is_empty() {
            out.push('\n');
            continue;
        }

        let (opens, closes_before_open, closes) = scan(line);
        // A leading run of closers dedents the line itself.
        let line_depth = depth.checked_sub(closes_before_open)?;
        for _ in 0..line_depth {
            out.push_str(INDENT);
        }
        out.push_str(line);
        out.push('\n');

        depth = (depth + opens).checked_sub(closes)?;
    }

    if depth != 0 {
        return None;
    }
    Some(out)
}

/// Counts `{` and `}` outside strings and comments. Also reports how many
/// closers appear before the first opener.
fn scan(line: &str) -> (usize, usize, usize) {
    let mut opens = 0;
    let mut closes = 0;
    let mut leading_closes = 0;
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '"' | '`' | '\'' => in_string = Some(c),
            '/' if chars.peek() == Some(&'/') => break,
            '{' => opens += 1,
            '}' => {
                closes += 1;
                if opens == 0 {
                    leading_closes += 1;
                }
            }
            _ => {}
        }
    }
    (opens, leading_closes, closes)
}
