//! Parse a project `.env` into a key-value map (applied to the process
//! environment in `lib`, never overwriting existing variables).

use std::collections::HashMap;
use std::path::Path;

fn env_file_path(override_dir: Option<&Path>) -> Option<std::path::PathBuf> {
    let dir = override_dir
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())?;
    let path = dir.join(".env");
    path.is_file().then_some(path)
}

/// Minimal `.env` parser: `KEY=VALUE` lines, `#` comment lines skipped,
/// key and value trimmed. Double-quoted values support `\"` escapes;
/// single-quoted values are stripped without escapes. No multiline values.
fn parse_env_file(content: &str) -> HashMap<String, String> {
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
        let value = value.trim();
        let value = if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
            value[1..value.len() - 1].replace("\\\"", "\"")
        } else if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
            value[1..value.len() - 1].to_string()
        } else {
            value.to_string()
        };
        out.insert(key.to_string(), value);
    }
    out
}

/// Loads `.env` from `override_dir` or the current directory. A missing file
/// yields an empty map.
pub fn load_env_map(override_dir: Option<&Path>) -> std::io::Result<HashMap<String, String>> {
    let Some(path) = env_file_path(override_dir) else {
        return Ok(HashMap::new());
    };
    Ok(parse_env_file(&std::fs::read_to_string(&path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_pairs() {
        let m = parse_env_file("FOO=bar\nBAZ=quux\n");
        assert_eq!(m.get("FOO").map(String::as_str), Some("bar"));
        assert_eq!(m.get("BAZ").map(String::as_str), Some("quux"));
    }

    #[test]
    fn skips_comments_blanks_and_malformed() {
        let m = parse_env_file("\n# comment\nKEY=val\nNOT_A_PAIR\n=value_only\n  \n");
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("KEY").map(String::as_str), Some("val"));
    }

    #[test]
    fn strips_quotes() {
        let m = parse_env_file("A=\"hello world\"\nB='single'\nC=\"say \\\"hi\\\"\"\n");
        assert_eq!(m.get("A").map(String::as_str), Some("hello world"));
        assert_eq!(m.get("B").map(String::as_str), Some("single"));
        assert_eq!(m.get("C").map(String::as_str), Some("say \"hi\""));
    }

    #[test]
    fn empty_values_kept() {
        let m = parse_env_file("KEY=\nQUOTED=\"\"\n");
        assert_eq!(m.get("KEY").map(String::as_str), Some(""));
        assert_eq!(m.get("QUOTED").map(String::as_str), Some(""));
    }

    #[test]
    fn missing_file_is_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_map(Some(dir.path())).unwrap().is_empty());
    }

    #[test]
    fn reads_file_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "A=1\nB=2\n").unwrap();
        let m = load_env_map(Some(dir.path())).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.get("A").map(String::as_str), Some("1"));
    }
}
