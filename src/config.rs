// Runtime configuration. Everything has a fixed default so the tool runs
// with no setup beyond a token file; environment variables only exist to
// point it at another server or another credential file.

use std::path::{Path, PathBuf};

/// Production endpoint used when `POINTS_API_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://api.fireverseai.com";

/// Credential file looked up in the working directory.
pub const TOKEN_FILE_NAME: &str = "token.txt";

const HOME_TOKEN_DIR: &str = ".points_sender";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub token_path: PathBuf,
    /// When set, a recipient lookup that fails in transit aborts with its
    /// own diagnostic instead of reading as "not found".
    pub strict_recipient_check: bool,
}

impl Config {
    /// Build the configuration from `POINTS_API_URL`, `POINTS_TOKEN_FILE`
    /// and `POINTS_STRICT_RECIPIENT`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source, so tests do
    /// not have to mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("POINTS_API_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let token_path = lookup("POINTS_TOKEN_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| default_token_path(Path::new("."), dirs::home_dir()));
        let strict_recipient_check = lookup("POINTS_STRICT_RECIPIENT")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Config {
            base_url: base_url.trim_end_matches('/').to_string(),
            token_path,
            strict_recipient_check,
        }
    }
}

/// `./token.txt` wins if present, then `~/.points_sender/token.txt`. When
/// neither exists we still return the working-directory path so the load
/// error names the file users are told to create.
fn default_token_path(cwd: &Path, home: Option<PathBuf>) -> PathBuf {
    let local = cwd.join(TOKEN_FILE_NAME);
    if local.is_file() {
        return local;
    }
    if let Some(home) = home {
        let in_home = home.join(HOME_TOKEN_DIR).join(TOKEN_FILE_NAME);
        if in_home.is_file() {
            return in_home;
        }
    }
    local
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
