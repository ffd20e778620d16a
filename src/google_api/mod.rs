//! Native Google API client.
//!
//! Direct HTTP via reqwest; no vendor SDK. Token format is compatible
//! with the token.json written by Python's google-auth library, so an
//! existing credential keeps working.
//!
//! Modules:
//! - auth: OAuth2 browser consent flow (one-time setup)
//! - gmail: Gmail API v1 (list unread, fetch body, send reply)
//! - token_store: token.json persistence

pub mod auth;
pub mod gmail;
pub mod token_store;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Google OAuth2 scopes used by MailPilot.
pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/gmail.modify"];

// ============================================================================
// Token types — must be compatible with Python's google-auth token format
// ============================================================================

/// OAuth2 token payload persisted in token.json.
///
/// Field names match what Python's `google.oauth2.credentials.Credentials.to_json()`
/// produces. Both `token` and `access_token` are accepted on read for compat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleToken {
    /// The access token (Python writes this as "token")
    #[serde(alias = "access_token")]
    pub token: String,
    /// The refresh token (long-lived, used to get new access tokens)
    pub refresh_token: Option<String>,
    /// Token endpoint URL
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// OAuth2 client ID
    pub client_id: String,
    /// OAuth2 client secret
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Authorized scopes
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Token expiry time (ISO 8601)
    #[serde(default)]
    pub expiry: Option<String>,
    /// Authenticated user email (Python stores this in "account")
    #[serde(default, alias = "email")]
    pub account: Option<String>,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// OAuth2 client credentials from credentials.json (Desktop App type).
#[derive(Debug, Clone, Deserialize)]
pub struct ClientCredentials {
    pub installed: InstalledAppCredentials,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstalledAppCredentials {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub auth_uri: String,
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

// ============================================================================
// Error type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GoogleApiError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Token expired or revoked")]
    AuthExpired,
    #[error("Credentials not found at {0}")]
    CredentialsNotFound(PathBuf),
    #[error("Token not found at {0}")]
    TokenNotFound(PathBuf),
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("OAuth flow cancelled")]
    FlowCancelled,
    #[error("Invalid credentials format: {0}")]
    InvalidCredentials(String),
}

// ============================================================================
// Token I/O
// ============================================================================

/// Path to the persisted OAuth token (~/.mailpilot/google/token.json).
pub fn token_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".mailpilot")
        .join("google")
        .join("token.json")
}

/// Path to the OAuth client credentials (~/.mailpilot/google/credentials.json).
pub fn credentials_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".mailpilot")
        .join("google")
        .join("credentials.json")
}

/// Load token from storage.
pub fn load_token() -> Result<GoogleToken, GoogleApiError> {
    token_store::load_token()
}

/// Save token to storage.
pub fn save_token(token: &GoogleToken) -> Result<(), GoogleApiError> {
    token_store::save_token(token)
}

/// Load client credentials from credentials.json.
///
/// The file is downloaded once from Google Cloud Console (OAuth client ID,
/// Desktop application type); its schema is owned by Google.
pub fn load_credentials() -> Result<ClientCredentials, GoogleApiError> {
    let path = credentials_path();
    if !path.exists() {
        return Err(GoogleApiError::CredentialsNotFound(path));
    }
    let content = std::fs::read_to_string(&path)?;
    let creds: ClientCredentials = serde_json::from_str(&content)
        .map_err(|e| GoogleApiError::InvalidCredentials(format!("{}: {}", path.display(), e)))?;
    Ok(creds)
}

// ============================================================================
// Token refresh
// ============================================================================

/// Check if a token is expired based on its expiry field.
pub fn is_token_expired(token: &GoogleToken) -> bool {
    match &token.expiry {
        None => true, // No expiry = assume expired, try refresh
        Some(expiry_str) => {
            // Python stores expiry as "2026-02-08T12:00:00.000000Z" or similar
            match chrono::DateTime::parse_from_rfc3339(&expiry_str.replace('Z', "+00:00"))
                .or_else(|_| chrono::DateTime::parse_from_rfc3339(expiry_str))
            {
                Ok(expiry) => {
                    // Consider expired if within 60 seconds of expiry
                    let now = chrono::Utc::now();
                    expiry <= now + chrono::Duration::seconds(60)
                }
                Err(_) => true, // Can't parse = assume expired
            }
        }
    }
}

/// Refresh an access token using the refresh token.
///
/// Single attempt against the token endpoint; the refreshed token is
/// persisted before returning.
pub async fn refresh_access_token(token: &GoogleToken) -> Result<GoogleToken, GoogleApiError> {
    let refresh_token = token
        .refresh_token
        .as_ref()
        .ok_or(GoogleApiError::AuthExpired)?;

    let mut form = vec![
        ("client_id", token.client_id.as_str()),
        ("refresh_token", refresh_token.as_str()),
        ("grant_type", "refresh_token"),
    ];
    if let Some(secret) = token.client_secret.as_deref() {
        form.push(("client_secret", secret));
    }

    let client = reqwest::Client::new();
    let resp = client.post(&token.token_uri).form(&form).send().await?;
    let status = resp.status();
    let body_text = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        return Err(map_refresh_error(status.as_u16(), &body_text));
    }

    let body: serde_json::Value = serde_json::from_str(&body_text)?;
    let access_token = body["access_token"]
        .as_str()
        .ok_or_else(|| GoogleApiError::RefreshFailed("No access_token in response".into()))?;

    let expires_in = body["expires_in"].as_u64().unwrap_or(3600);
    let expiry = chrono::Utc::now() + chrono::Duration::seconds(expires_in as i64);

    let mut new_token = token.clone();
    new_token.token = access_token.to_string();
    new_token.expiry = Some(expiry.to_rfc3339());

    save_token(&new_token)?;

    Ok(new_token)
}

fn map_refresh_error(status: u16, body: &str) -> GoogleApiError {
    let lowered = body.to_lowercase();
    if (status == 400 || status == 401)
        && (lowered.contains("invalid_grant") || lowered.contains("token has been expired"))
    {
        return GoogleApiError::AuthExpired;
    }
    GoogleApiError::RefreshFailed(format!("HTTP {}: {}", status, body))
}

/// Get a valid access token, refreshing if expired.
///
/// This is the main entry point for all API calls.
pub async fn get_valid_access_token() -> Result<String, GoogleApiError> {
    let token = load_token()?;

    if is_token_expired(&token) {
        let refreshed = refresh_access_token(&token).await?;
        Ok(refreshed.token)
    } else {
        Ok(token.token)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_token_roundtrip() {
        let token = GoogleToken {
            token: "ya29.test-access-token".to_string(),
            refresh_token: Some("1//test-refresh-token".to_string()),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            client_id: "12345.apps.googleusercontent.com".to_string(),
            client_secret: Some("test-secret".to_string()),
            scopes: vec!["https://www.googleapis.com/auth/gmail.modify".to_string()],
            expiry: Some("2026-02-08T12:00:00Z".to_string()),
            account: Some("user@example.com".to_string()),
        };

        let json = serde_json::to_string_pretty(&token).unwrap();
        let parsed: GoogleToken = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.token, "ya29.test-access-token");
        assert_eq!(
            parsed.refresh_token.as_deref(),
            Some("1//test-refresh-token")
        );
        assert_eq!(parsed.client_id, "12345.apps.googleusercontent.com");
        assert_eq!(parsed.account.as_deref(), Some("user@example.com"));
    }

    #[test]
    fn test_google_token_python_compat() {
        // Simulates the JSON format Python's google-auth writes
        let python_json = r#"{
            "token": "ya29.python-token",
            "refresh_token": "1//python-refresh",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_id": "client.apps.googleusercontent.com",
            "client_secret": "secret",
            "scopes": ["https://www.googleapis.com/auth/gmail.modify"],
            "expiry": "2026-02-08T12:00:00.000000Z",
            "account": "user@company.com",
            "universe_domain": "googleapis.com"
        }"#;

        let token: GoogleToken = serde_json::from_str(python_json).unwrap();
        assert_eq!(token.token, "ya29.python-token");
        assert_eq!(token.account.as_deref(), Some("user@company.com"));
        assert_eq!(token.client_secret.as_deref(), Some("secret"));
        assert_eq!(token.scopes.len(), 1);
    }

    #[test]
    fn test_google_token_access_token_alias() {
        // Some implementations use "access_token" instead of "token"
        let json = r#"{
            "access_token": "ya29.alias-token",
            "refresh_token": "1//refresh",
            "client_id": "client",
            "client_secret": "secret"
        }"#;

        let token: GoogleToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.token, "ya29.alias-token");
    }

    #[test]
    fn test_is_token_expired_no_expiry() {
        let token = GoogleToken {
            token: "test".to_string(),
            refresh_token: None,
            token_uri: default_token_uri(),
            client_id: "c".to_string(),
            client_secret: Some("s".to_string()),
            scopes: vec![],
            expiry: None,
            account: None,
        };
        assert!(is_token_expired(&token));
    }

    #[test]
    fn test_is_token_expired_future() {
        let future = chrono::Utc::now() + chrono::Duration::hours(1);
        let token = GoogleToken {
            token: "test".to_string(),
            refresh_token: None,
            token_uri: default_token_uri(),
            client_id: "c".to_string(),
            client_secret: None,
            scopes: vec![],
            expiry: Some(future.to_rfc3339()),
            account: None,
        };
        assert!(!is_token_expired(&token));
    }

    #[test]
    fn test_is_token_expired_past() {
        let past = chrono::Utc::now() - chrono::Duration::hours(1);
        let token = GoogleToken {
            token: "test".to_string(),
            refresh_token: None,
            token_uri: default_token_uri(),
            client_id: "c".to_string(),
            client_secret: None,
            scopes: vec![],
            expiry: Some(past.to_rfc3339()),
            account: None,
        };
        assert!(is_token_expired(&token));
    }

    #[test]
    fn test_refresh_error_invalid_grant_is_auth() {
        let err = map_refresh_error(400, r#"{"error": "invalid_grant"}"#);
        assert!(matches!(err, GoogleApiError::AuthExpired));
    }

    #[test]
    fn test_refresh_error_server_failure_is_not_auth() {
        let err = map_refresh_error(500, "internal error");
        assert!(matches!(err, GoogleApiError::RefreshFailed(_)));
    }

    #[test]
    fn test_credentials_json_parsing() {
        let json = r#"{
            "installed": {
                "client_id": "12345.apps.googleusercontent.com",
                "client_secret": "secret",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "redirect_uris": ["http://localhost"]
            }
        }"#;

        let creds: ClientCredentials = serde_json::from_str(json).unwrap();
        assert_eq!(
            creds.installed.client_id,
            "12345.apps.googleusercontent.com"
        );
        assert_eq!(creds.installed.client_secret.as_deref(), Some("secret"));
        assert_eq!(creds.installed.redirect_uris, vec!["http://localhost"]);
    }

    #[test]
    fn test_credentials_json_parsing_without_secret() {
        let json = r#"{
            "installed": {
                "client_id": "12345.apps.googleusercontent.com",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "redirect_uris": ["http://localhost"]
            }
        }"#;

        let creds: ClientCredentials = serde_json::from_str(json).unwrap();
        assert!(creds.installed.client_secret.is_none());
    }
}
