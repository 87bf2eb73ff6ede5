//! Porcelain status parsing.
//!
//! Each line of `git status --porcelain` becomes one [`ChangeRecord`]. The
//! first character of the status code selects the action; the remainder of
//! the line is the path (or `old -> new` for renames). Paths git wraps in
//! C-style quotes (names with spaces, control characters or backslashes) are
//! unquoted.

use std::fmt;

/// Separator git uses between the old and new path of a rename.
pub const RENAME_ARROW: &str = " -> ";

/// Action encoded by the first character of a porcelain status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Added,
    Deleted,
    Modified,
    Renamed,
    Ignored,
    Unknown(char),
}

impl Action {
    pub fn from_code(code: char) -> Self {
        match code {
            'A' => Action::Added,
            'D' => Action::Deleted,
            'M' => Action::Modified,
            'R' => Action::Renamed,
            '?' | '!' => Action::Ignored,
            other => Action::Unknown(other),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Added => write!(f, "Added"),
            Action::Deleted => write!(f, "Deleted"),
            Action::Modified => write!(f, "Modified"),
            Action::Renamed => write!(f, "Renamed"),
            Action::Ignored => write!(f, "Ignored"),
            Action::Unknown(c) => write!(f, "Unknown({})", c),
        }
    }
}

/// A single change reported by the status command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeRecord {
    Added(String),
    Deleted(String),
    Modified(String),
    Renamed { from: String, to: String },
    /// A status code this tool does not handle (copies, unmerged paths, ...).
    Unknown { code: char, line: String },
}

impl ChangeRecord {
    pub fn action(&self) -> Action {
        match self {
            ChangeRecord::Added(_) => Action::Added,
            ChangeRecord::Deleted(_) => Action::Deleted,
            ChangeRecord::Modified(_) => Action::Modified,
            ChangeRecord::Renamed { .. } => Action::Renamed,
            ChangeRecord::Unknown { code, .. } => Action::Unknown(*code),
        }
    }

    /// The path text exactly as it appeared in the status line.
    ///
    /// For renames this is the combined `old -> new` text; it is the key used
    /// for whitelist checks and throttling.
    pub fn raw_path(&self) -> String {
        match self {
            ChangeRecord::Added(p) | ChangeRecord::Deleted(p) | ChangeRecord::Modified(p) => {
                p.clone()
            }
            ChangeRecord::Renamed { from, to } => format!("{}{}{}", from, RENAME_ARROW, to),
            ChangeRecord::Unknown { line, .. } => line
                .split_once(' ')
                .map(|(_, rest)| rest.to_string())
                .unwrap_or_default(),
        }
    }

    /// Paths to hand to the commit command.
    pub fn commit_paths(&self) -> Vec<String> {
        match self {
            ChangeRecord::Added(p) | ChangeRecord::Deleted(p) | ChangeRecord::Modified(p) => {
                vec![p.clone()]
            }
            ChangeRecord::Renamed { from, to } => vec![from.clone(), to.clone()],
            ChangeRecord::Unknown { .. } => Vec::new(),
        }
    }
}

/// Parse porcelain status text into change records, in input order.
///
/// Blank lines and ignored/untracked entries (`?`, `!`) are dropped.
pub fn parse_status(raw: &str) -> Vec<ChangeRecord> {
    raw.lines().filter_map(parse_line).collect()
}

/// Parse one porcelain line. Returns `None` for blank and ignored lines.
pub fn parse_line(line: &str) -> Option<ChangeRecord> {
    let line = collapse_whitespace(line.trim());
    if line.is_empty() {
        return None;
    }

    let (code, rest) = line.split_once(' ').unwrap_or((line.as_str(), ""));
    let first = code.chars().next()?;

    let record = match Action::from_code(first) {
        Action::Added => ChangeRecord::Added(unquote_path(rest)),
        Action::Deleted => ChangeRecord::Deleted(unquote_path(rest)),
        Action::Modified => ChangeRecord::Modified(unquote_path(rest)),
        Action::Renamed => match split_rename(rest) {
            Some((from, to)) => ChangeRecord::Renamed {
                from: unquote_path(from),
                to: unquote_path(to),
            },
            // A rename without both paths breaks the porcelain contract
            None => ChangeRecord::Unknown {
                code: first,
                line: line.clone(),
            },
        },
        Action::Ignored => return None,
        Action::Unknown(code) => ChangeRecord::Unknown {
            code,
            line: line.clone(),
        },
    };

    Some(record)
}

/// Split `old -> new`, skipping over an arrow inside a quoted old path.
fn split_rename(rest: &str) -> Option<(&str, &str)> {
    if !rest.starts_with('"') {
        return rest.split_once(RENAME_ARROW);
    }

    let mut escaped = false;
    for (i, ch) in rest.char_indices().skip(1) {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => {
                let (from, tail) = rest.split_at(i + 1);
                return tail.strip_prefix(RENAME_ARROW).map(|to| (from, to));
            }
            _ => {}
        }
    }
    None
}

/// Decode a path git printed as a C-style quoted string.
///
/// Text that is not wrapped in double quotes is returned unchanged. Octal
/// escapes are raw bytes, so multi-byte UTF-8 names decode back to the
/// original characters.
pub fn unquote_path(s: &str) -> String {
    let inner = match s.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        Some(inner) => inner,
        None => return s.to_string(),
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => bytes.push(b'\n'),
            Some('t') => bytes.push(b'\t'),
            Some('r') => bytes.push(b'\r'),
            Some('a') => bytes.push(0x07),
            Some('b') => bytes.push(0x08),
            Some('f') => bytes.push(0x0c),
            Some('v') => bytes.push(0x0b),
            Some(d @ '0'..='7') => {
                let mut value = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|n| n.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                bytes.push(value as u8);
            }
            Some(other) => {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => bytes.push(b'\\'),
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

/// Replace every run of two or more spaces/tabs with a single space.
fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut run = String::new();

    for ch in s.chars() {
        if ch == ' ' || ch == '\t' {
            run.push(ch);
            continue;
        }
        flush_run(&mut out, &mut run);
        out.push(ch);
    }
    flush_run(&mut out, &mut run);

    out
}

fn flush_run(out: &mut String, run: &mut String) {
    if run.chars().count() >= 2 {
        out.push(' ');
    } else {
        out.push_str(run);
    }
    run.clear();
}
