use std::fs;
use std::path::Path;
use log::{ debug, warn };
use thiserror::Error;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("{var} not set and not found in {path}. Provide --chat-api-key, the {var} environment variable, or a key file entry")]
    Missing { var: &'static str, path: String },
}

/// Picks the explicit key when it is non-blank, otherwise falls back to the
/// first `OPENAI_API_KEY=` entry of the key file.
pub fn resolve_api_key(
    explicit: Option<&str>,
    env_file: &Path
) -> Result<String, CredentialError> {
    if let Some(key) = explicit.map(str::trim).filter(|k| !k.is_empty()) {
        debug!("Using API key from command line / environment");
        return Ok(key.to_string());
    }

    read_key_file(env_file, API_KEY_VAR).ok_or_else(|| CredentialError::Missing {
        var: API_KEY_VAR,
        path: env_file.display().to_string(),
    })
}

/// The key file is a literal `KEY=value` list: no quoting, no `$` expansion.
/// Only the first `=` splits, so values may contain `=`, `$` and spaces.
fn read_key_file(path: &Path, wanted: &str) -> Option<String> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Failed to read key file {}: {}", path.display(), e);
            return None;
        }
    };

    let value = contents
        .lines()
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| *key == wanted)
        .map(|(_, value)| value.trim())?;

    if value.is_empty() {
        return None;
    }
    debug!("Using API key from {}", path.display());
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn key_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn explicit_key_wins_over_file() {
        let file = key_file("OPENAI_API_KEY=from-file\n");
        let key = resolve_api_key(Some("from-flag"), file.path()).unwrap();
        assert_eq!(key, "from-flag");
    }

    #[test]
    fn blank_explicit_key_falls_back_to_file() {
        let file = key_file("OTHER=1\r\nOPENAI_API_KEY=sk-test=with=equals\r\n");
        let key = resolve_api_key(Some("   "), file.path()).unwrap();
        assert_eq!(key, "sk-test=with=equals");
    }

    #[test]
    fn file_values_are_taken_literally() {
        let file = key_file("OPENAI_API_KEY=sk-ab$cd\n");
        assert_eq!(resolve_api_key(None, file.path()).unwrap(), "sk-ab$cd");

        let file = key_file("OPENAI_API_KEY=sk-proj-abc def \n");
        assert_eq!(resolve_api_key(None, file.path()).unwrap(), "sk-proj-abc def");
    }

    #[test]
    fn first_matching_line_wins() {
        let file = key_file("# comment\nOPENAI_API_KEY=first\nOPENAI_API_KEY=second\n");
        assert_eq!(resolve_api_key(None, file.path()).unwrap(), "first");
    }

    #[test]
    fn empty_file_value_is_missing() {
        let file = key_file("OPENAI_API_KEY=   \n");
        assert!(resolve_api_key(None, file.path()).is_err());
    }

    #[test]
    fn missing_everywhere_is_an_error() {
        let file = key_file("SOMETHING_ELSE=1\n");
        let err = resolve_api_key(None, file.path()).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn unreadable_file_is_treated_as_no_key() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(".env.txt");
        assert!(resolve_api_key(None, &missing).is_err());
    }
}
