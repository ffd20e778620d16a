//! OAuth token persistence.
//!
//! token.json under ~/.mailpilot/google/, written atomically with
//! owner-only permissions.

use super::{GoogleApiError, GoogleToken};

/// Load the current Google OAuth token.
pub fn load_token() -> Result<GoogleToken, GoogleApiError> {
    let path = super::token_path();
    if !path.exists() {
        return Err(GoogleApiError::TokenNotFound(path));
    }
    let content = std::fs::read_to_string(&path)?;
    let token: GoogleToken = serde_json::from_str(&content)?;
    Ok(token)
}

/// Persist a Google OAuth token.
pub fn save_token(token: &GoogleToken) -> Result<(), GoogleApiError> {
    let path = super::token_path();

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700))?;
            }
        }
    }

    let content = serde_json::to_string_pretty(token)?;
    crate::util::atomic_write_str(&path, &content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

/// Probe for an authenticated account email without propagating errors.
pub fn peek_account_email() -> Option<String> {
    match load_token() {
        Ok(token) => Some(
            token
                .account
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| "connected".to_string()),
        ),
        Err(_) => None,
    }
}
