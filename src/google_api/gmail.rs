//! Gmail API v1 — list unread messages, decode bodies, send replies.
//!
//! Lists the inbox for unread messages, fetches each full payload, and
//! extracts the body from the first MIME part carrying inline data.
//! Replies are minimal RFC-2822 messages threaded to the original
//! conversation. Every call is a single attempt; failures surface to
//! the caller as-is.

use base64::Engine;
use serde::Deserialize;

use super::GoogleApiError;

// ============================================================================
// API response types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageStub>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageStub {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageDetail {
    #[serde(default)]
    id: String,
    #[serde(default)]
    thread_id: String,
    #[serde(default)]
    payload: Option<MessagePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<Header>,
    #[serde(default)]
    body: Option<PayloadBody>,
    #[serde(default)]
    parts: Vec<MessagePayload>,
}

#[derive(Debug, Deserialize)]
struct Header {
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayloadBody {
    #[serde(default)]
    data: Option<String>,
}

// ============================================================================
// Public types
// ============================================================================

/// An unread email as presented to the review session.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EmailMessage {
    pub id: String,
    pub thread_id: String,
    pub sender: String,
    pub subject: String,
    pub date: String,
    pub body: String,
}

// ============================================================================
// Gmail API
// ============================================================================

/// Fetch unread inbox messages with full bodies.
///
/// Lists messages matching `labelIds=INBOX, q="is:unread"`, then fetches
/// the full payload for each. Individual message fetch failures are
/// skipped with a warning rather than failing the whole load.
pub async fn list_unread(
    access_token: &str,
    max_results: u32,
) -> Result<Vec<EmailMessage>, GoogleApiError> {
    let client = reqwest::Client::new();

    let resp = client
        .get("https://gmail.googleapis.com/gmail/v1/users/me/messages")
        .bearer_auth(access_token)
        .query(&[
            ("labelIds", "INBOX"),
            ("q", "is:unread"),
            ("maxResults", &max_results.to_string()),
        ])
        .send()
        .await?;

    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(GoogleApiError::AuthExpired);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(GoogleApiError::ApiError {
            status: status.as_u16(),
            message: body,
        });
    }

    let list: MessageListResponse = resp.json().await?;

    if list.messages.is_empty() {
        return Ok(Vec::new());
    }

    let mut emails = Vec::with_capacity(list.messages.len());

    for stub in &list.messages {
        match fetch_message(&client, access_token, &stub.id).await {
            Ok(email) => emails.push(email),
            Err(GoogleApiError::AuthExpired) => return Err(GoogleApiError::AuthExpired),
            Err(e) => {
                log::warn!("Skipping message {}: {}", stub.id, e);
                continue;
            }
        }
    }

    Ok(emails)
}

/// Fetch a single message's full payload and decode it.
async fn fetch_message(
    client: &reqwest::Client,
    access_token: &str,
    message_id: &str,
) -> Result<EmailMessage, GoogleApiError> {
    let url = format!(
        "https://gmail.googleapis.com/gmail/v1/users/me/messages/{}",
        message_id
    );

    let resp = client
        .get(&url)
        .bearer_auth(access_token)
        .query(&[("format", "full")])
        .send()
        .await?;

    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(GoogleApiError::AuthExpired);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(GoogleApiError::ApiError {
            status: status.as_u16(),
            message: body,
        });
    }

    let detail: MessageDetail = resp.json().await?;
    Ok(email_from_detail(detail))
}

fn email_from_detail(detail: MessageDetail) -> EmailMessage {
    let headers = detail
        .payload
        .as_ref()
        .map(|p| &p.headers[..])
        .unwrap_or(&[]);

    let get_header = |name: &str, fallback: &str| -> String {
        headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.clone())
            .unwrap_or_else(|| fallback.to_string())
    };

    let sender = get_header("From", "Unknown");
    let subject = get_header("Subject", "No Subject");
    let date = get_header("Date", "Unknown Date");

    let body = detail
        .payload
        .as_ref()
        .and_then(first_inline_body)
        .unwrap_or_default();

    EmailMessage {
        id: detail.id,
        thread_id: detail.thread_id,
        sender,
        subject,
        date,
        body,
    }
}

/// Walk the MIME tree depth-first and decode the first part carrying
/// inline body data. No MIME-type preference: the first part with data
/// wins, matching how a simple flat-parts walk behaves for typical
/// multipart messages.
fn first_inline_body(payload: &MessagePayload) -> Option<String> {
    if let Some(ref body) = payload.body {
        if let Some(ref data) = body.data {
            if let Some(text) = decode_url_safe_base64(data) {
                return Some(text);
            }
        }
    }
    for part in &payload.parts {
        if let Some(text) = first_inline_body(part) {
            return Some(text);
        }
    }
    None
}

/// Decode URL-safe base64 (no padding) as used by Gmail API.
fn decode_url_safe_base64(data: &str) -> Option<String> {
    let trimmed = data.trim_end_matches('=');
    match base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(trimmed) {
        Ok(bytes) => String::from_utf8(bytes).ok(),
        Err(_) => None,
    }
}

// ============================================================================
// Send reply
// ============================================================================

/// Send a reply threaded to an existing conversation.
///
/// Builds a minimal RFC-2822 message (`To`, `Subject`, `In-Reply-To`),
/// base64url-encodes it, and submits it with the thread association.
/// Single attempt; a failed send is surfaced to the caller as-is.
pub async fn send_reply(
    access_token: &str,
    to: &str,
    subject: &str,
    body: &str,
    thread_id: &str,
) -> Result<(), GoogleApiError> {
    let raw = encode_reply(to, subject, body, thread_id);

    let client = reqwest::Client::new();
    let resp = client
        .post("https://gmail.googleapis.com/gmail/v1/users/me/messages/send")
        .bearer_auth(access_token)
        .json(&serde_json::json!({
            "raw": raw,
            "threadId": thread_id,
        }))
        .send()
        .await?;

    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(GoogleApiError::AuthExpired);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(GoogleApiError::ApiError {
            status: status.as_u16(),
            message: body,
        });
    }

    Ok(())
}

/// Build the base64url-encoded RFC-2822 reply payload.
fn encode_reply(to: &str, subject: &str, body: &str, thread_id: &str) -> String {
    let message = format!(
        "To: {}\r\nSubject: {}\r\nIn-Reply-To: {}\r\n\r\n{}",
        to, subject, thread_id, body
    );
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(message.as_bytes())
}

// ============================================================================
// Tests
// ============================================================================
