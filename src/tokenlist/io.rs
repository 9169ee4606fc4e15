use std::{fs, io::ErrorKind, path::Path};

use serde::Serialize;

use crate::{tokenlist::TokenList, Result, TokenListError};

/// Reads a token list from disk; a missing file is `Ok(None)`.
pub fn load_tokenlist(path: &Path) -> Result<Option<TokenList>> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Token list file not found");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Pretty-printed JSON, two-space indent.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut body = serde_json::to_string_pretty(value)?;
    body.push('\n');
    fs::write(path, body)?;
    tracing::info!(path = %path.display(), "Saved data");
    Ok(())
}

/// Fetches the previously published list. `Ok(None)` when nothing has been
/// published yet (404).
pub async fn fetch_published_tokenlist(client: &reqwest::Client, url: &str) -> Result<Option<TokenList>> {
    let response = client.get(url).send().await?;
    let status = response.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        tracing::warn!(url = %url, "No published token list");
        return Ok(None);
    }
    if !status.is_success() {
        return Err(TokenListError::Http {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(Some(response.json().await?))
}
