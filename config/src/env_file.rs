//! Minimal `.env` reader. Produces a map; the caller decides precedence.

use std::collections::HashMap;
use std::path::Path;

/// Strips one layer of surrounding quotes. Double quotes honor `\"`;
/// single quotes are literal. Unquoted values pass through trimmed.
fn unquote(raw: &str) -> String {
    let raw = raw.trim();
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return raw[1..raw.len() - 1].replace("\\\"", "\"");
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return raw[1..raw.len() - 1].to_string();
    }
    raw.to_string()
}

/// `KEY=VALUE` per line; blank lines and `#` comment lines skipped; lines
/// without `=` or with an empty key ignored. No multiline values.
fn parse(content: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        out.insert(key.to_string(), unquote(value));
    }
    out
}

/// Reads `.env` from `dir` (or the current directory). A missing file is an
/// empty map, not an error.
pub fn read(dir: Option<&Path>) -> std::io::Result<HashMap<String, String>> {
    let dir = match dir.map(Path::to_path_buf).or_else(|| std::env::current_dir().ok()) {
        Some(d) => d,
        None => return Ok(HashMap::new()),
    };
    let path = dir.join(".env");
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    Ok(parse(&std::fs::read_to_string(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_pairs() {
        let m = parse("OPENAI_API_KEY=sk-test\nLABTREE_MODEL=gpt-4o-mini\n");
        assert_eq!(m.get("OPENAI_API_KEY").map(String::as_str), Some("sk-test"));
        assert_eq!(m.get("LABTREE_MODEL").map(String::as_str), Some("gpt-4o-mini"));
    }

    #[test]
    fn comments_blanks_and_junk_lines() {
        let m = parse("# comment\n\nKEY=val\nno_equals_here\n=anonymous\n");
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("KEY").map(String::as_str), Some("val"));
    }

    #[test]
    fn quoting() {
        let m = parse("A=\"spaced out\"\nB='kept \\\" as-is'\nC=\"say \\\"hi\\\"\"\nD=\"\"\n");
        assert_eq!(m.get("A").map(String::as_str), Some("spaced out"));
        assert_eq!(m.get("B").map(String::as_str), Some("kept \\\" as-is"));
        assert_eq!(m.get("C").map(String::as_str), Some("say \"hi\""));
        assert_eq!(m.get("D").map(String::as_str), Some(""));
    }

    #[test]
    fn empty_value_without_quotes() {
        let m = parse("KEY=\n");
        assert_eq!(m.get("KEY").map(String::as_str), Some(""));
    }

    #[test]
    fn read_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read(Some(dir.path())).unwrap().is_empty());
    }

    #[test]
    fn read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "A=1\nB=2\n").unwrap();
        let m = read(Some(dir.path())).unwrap();
        assert_eq!(m.len(), 2);
    }
}
