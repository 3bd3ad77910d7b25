use std::{fs, io::ErrorKind, path::Path};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use color_eyre::eyre::{eyre, Result, WrapErr};
use serde::Deserialize;
use tracing::{debug, info};

/// Environment variable the token is read from and persisted under.
pub const TOKEN_VAR: &str = "TOKEN";

/// Claims 7TV puts in its auth tokens.
#[derive(Deserialize, Debug, Clone)]
pub struct TokenClaims {
    /// Id of the 7TV user the token belongs to
    #[serde(rename = "u")]
    pub user_id: String,
    /// Expiry as unix seconds
    pub exp: i64,
}

impl TokenClaims {
    /// Decode the payload segment of a JWT without verifying the signature.
    pub fn decode(token: &str) -> Result<Self> {
        let payload = token
            .split('.')
            .nth(1)
            .ok_or_else(|| eyre!("7tv token is not a valid JWT"))?;

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .wrap_err("7tv token payload is not valid base64")?;

        serde_json::from_slice(&bytes).wrap_err("7tv token payload is not valid JSON")
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp < now.timestamp()
    }

    /// Fails when the token has already expired.
    pub fn ensure_valid(&self) -> Result<()> {
        if self.is_expired_at(Utc::now()) {
            return Err(eyre!("7tv token is expired"));
        }
        Ok(())
    }
}

/// Write `TOKEN=<token>` into the env file, keeping every other line.
pub fn persist_token(path: &Path, token: &str) -> Result<()> {
    let existing = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).wrap_err_with(|| format!("Failed to read {}", path.display())),
    };

    let prefix = format!("{TOKEN_VAR}=");
    let mut lines: Vec<String> = existing
        .lines()
        .filter(|line| !line.trim_start().starts_with(&prefix))
        .map(str::to_owned)
        .collect();
    lines.push(format!("{prefix}{token}"));

    fs::write(path, lines.join("\n") + "\n")
        .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    info!("Saved token to {}", path.display());
    debug!("{} kept {} other lines", path.display(), lines.len() - 1);

    Ok(())
}

#[cfg(test)]
pub(crate) fn fake_token(user_id: &str, exp: i64) -> String {
    let payload = serde_json::json!({ "u": user_id, "exp": exp, "v": 0, "iss": "seventv-api" });
    format!(
        "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}
