use crate::config::{TelegramConfig, TELEGRAM_TIMEOUT};
use crate::logging::{log_delivered, log_send_failed, log_skip};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::warn;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;

/// Telegram's per-message limit, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Newline search window; the gap to the hard limit is headroom.
pub const SPLIT_WINDOW_CHARS: usize = 4000;

// ==================================================
// CHUNKING
// ==================================================

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Splits `text` into pieces of at most [`MAX_MESSAGE_CHARS`] characters.
///
/// Each cut goes right after the last newline inside the first
/// [`SPLIT_WINDOW_CHARS`] characters, or at the hard limit when there is none.
/// Concatenating the pieces gives back `text`. The final remainder is always
/// returned, so short input yields exactly one piece.
pub fn split_message(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.chars().count() > MAX_MESSAGE_CHARS {
        let window = &rest[..byte_offset(rest, SPLIT_WINDOW_CHARS)];

        let cut = match window.rfind('\n') {
            Some(i) if i > 0 => i + 1,
            _ => byte_offset(rest, MAX_MESSAGE_CHARS),
        };

        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }

    chunks.push(rest);
    chunks
}

// ==================================================
// TRANSPORT
// ==================================================

#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send_message(&self, text: &str) -> Result<()>;
}

/// Sends `text` in order-preserving chunks. A missing transport or empty text
/// is a no-op; a failed chunk is logged and the rest are still sent.
/// Returns how many chunks the transport accepted.
pub async fn deliver<T: MessageTransport + ?Sized>(text: &str, transport: Option<&T>) -> usize {
    let transport = match transport {
        Some(t) => t,
        None => {
            log_skip("notification", "Telegram not configured");
            return 0;
        }
    };

    if text.is_empty() {
        log_delivered(0);
        return 0;
    }

    let chunks = split_message(text);
    let total = chunks.len();
    let mut delivered = 0;

    for (i, chunk) in chunks.into_iter().enumerate() {
        match transport.send_message(chunk).await {
            Ok(()) => delivered += 1,
            Err(e) => log_send_failed(i + 1, total, &e),
        }
    }

    log_delivered(delivered);
    delivered
}

// ==================================================
// TELEGRAM
// ==================================================

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    disable_web_page_preview: bool,
}

#[derive(Clone)]
pub struct TelegramNotifier {
    http: Client,
    endpoint: String,
    chat_id: String,
    parse_mode: Option<String>,
}

impl TelegramNotifier {
    /// `Ok(None)` when notifications are switched off or the bot token or
    /// chat id is missing.
    pub fn from_config(config: &TelegramConfig) -> Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }

        let (token, chat_id) = match (&config.bot_token, &config.chat_id) {
            (Some(token), Some(chat_id)) => (token, chat_id),
            _ => return Ok(None),
        };

        let http = Client::builder().timeout(TELEGRAM_TIMEOUT).build()?;

        Ok(Some(Self {
            http,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.api_url.trim_end_matches('/'),
                token
            ),
            chat_id: chat_id.clone(),
            parse_mode: config.parse_mode.clone(),
        }))
    }

    fn payload<'a>(&'a self, text: &'a str) -> SendMessage<'a> {
        SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: self.parse_mode.as_deref(),
            disable_web_page_preview: true,
        }
    }

    async fn post(&self, payload: &SendMessage<'_>) -> Result<(StatusCode, Value)> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            // the endpoint embeds the bot token
            .map_err(|e| anyhow!("Telegram request failed: {}", e.without_url()))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        Ok((status, body))
    }
}

fn describe(body: &Value) -> &str {
    body.get("description")
        .and_then(Value::as_str)
        .unwrap_or("no description")
}

fn check_reply(status: StatusCode, body: &Value) -> Result<()> {
    if !status.is_success() || body.get("ok") == Some(&Value::Bool(false)) {
        anyhow::bail!("Telegram rejected message ({}): {}", status, describe(body));
    }
    Ok(())
}

#[async_trait]
impl MessageTransport for TelegramNotifier {
    /// A 400 under a parse mode is taken as unparsable markup and the chunk is
    /// resent once as plain text.
    async fn send_message(&self, text: &str) -> Result<()> {
        let payload = self.payload(text);
        let (status, body) = self.post(&payload).await?;

        if status == StatusCode::BAD_REQUEST && payload.parse_mode.is_some() {
            warn!(
                "⚠️ Telegram refused markup ({}), resending as plain text",
                describe(&body)
            );
            let plain = SendMessage {
                parse_mode: None,
                ..payload
            };
            let (status, body) = self.post(&plain).await?;
            return check_reply(status, &body);
        }

        check_reply(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StubServer;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<String>>,
        fail_on: Option<usize>,
    }

    #[async_trait]
    impl MessageTransport for RecordingTransport {
        async fn send_message(&self, text: &str) -> Result<()> {
            let mut sent = self.sent.lock().unwrap();
            let index = sent.len();
            sent.push(text.to_string());
            if self.fail_on == Some(index) {
                anyhow::bail!("boom");
            }
            Ok(())
        }
    }

    fn lines_text(total_chars: usize, line_len: usize) -> String {
        let line = format!("{}\n", "x".repeat(line_len - 1));
        line.repeat(total_chars / line_len + 1)
            .chars()
            .take(total_chars)
            .collect()
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        assert_eq!(split_message("hello"), vec!["hello"]);
        assert_eq!(split_message(""), vec![""]);

        let exact = "a".repeat(MAX_MESSAGE_CHARS);
        assert_eq!(split_message(&exact), vec![exact.as_str()]);
    }

    #[test]
    fn nine_thousand_chars_split_into_three_at_newlines() {
        let text = lines_text(9000, 80);
        let chunks = split_message(&text);

        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].ends_with('\n'));
        assert!(chunks[1].ends_with('\n'));
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_MESSAGE_CHARS));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn text_without_newlines_is_hard_cut() {
        let text = "y".repeat(10_000);
        let chunks = split_message(&text);

        let sizes: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
        assert_eq!(sizes, vec![4096, 4096, 1808]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn newline_past_the_window_is_not_used() {
        let text = format!("{}\n{}", "a".repeat(4050), "b".repeat(100));
        let chunks = split_message(&text);

        assert_eq!(chunks[0].chars().count(), MAX_MESSAGE_CHARS);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn multibyte_characters_are_never_split() {
        let text = "•".repeat(5000);
        let chunks = split_message(&text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), MAX_MESSAGE_CHARS);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn chunks_stay_bounded_and_lossless_across_lengths() {
        for len in (0..=50_000).step_by(1_237) {
            for line_len in [1, 37, 80, 5_000] {
                let text = lines_text(len, line_len);
                let chunks = split_message(&text);

                assert!(chunks.iter().all(|c| c.chars().count() <= MAX_MESSAGE_CHARS));
                assert_eq!(chunks.concat(), text);
            }
        }
    }

    #[tokio::test]
    async fn deliver_sends_chunks_in_order() {
        let transport = RecordingTransport::default();
        let text = lines_text(9000, 80);

        let delivered = deliver(&text, Some(&transport)).await;

        let sent = transport.sent.lock().unwrap();
        assert_eq!(delivered, 3);
        assert_eq!(sent.len(), 3);
        assert_eq!(sent.concat(), text);
    }

    #[tokio::test]
    async fn deliver_without_transport_is_a_no_op() {
        let delivered = deliver::<RecordingTransport>("report", None).await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn deliver_skips_empty_text() {
        let transport = RecordingTransport::default();
        assert_eq!(deliver("", Some(&transport)).await, 0);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_chunk_does_not_stop_the_rest() {
        let transport = RecordingTransport {
            fail_on: Some(0),
            ..RecordingTransport::default()
        };
        let text = lines_text(9000, 80);

        let delivered = deliver(&text, Some(&transport)).await;

        assert_eq!(delivered, 2);
        assert_eq!(transport.sent.lock().unwrap().len(), 3);
    }

    #[test]
    fn notifier_requires_token_and_chat() {
        let mut config = TelegramConfig {
            api_url: "https://api.telegram.org/".to_string(),
            bot_token: Some("123:abc".to_string()),
            chat_id: None,
            parse_mode: Some("Markdown".to_string()),
            enabled: true,
        };
        assert!(TelegramNotifier::from_config(&config).unwrap().is_none());

        config.chat_id = Some("-10042".to_string());
        let notifier = TelegramNotifier::from_config(&config).unwrap().unwrap();
        assert_eq!(
            notifier.endpoint,
            "https://api.telegram.org/bot123:abc/sendMessage"
        );

        config.enabled = false;
        assert!(TelegramNotifier::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn payload_carries_parse_mode_only_when_set() {
        let mut config = TelegramConfig {
            api_url: "https://api.telegram.org".to_string(),
            bot_token: Some("t".to_string()),
            chat_id: Some("42".to_string()),
            parse_mode: Some("Markdown".to_string()),
            enabled: true,
        };

        let notifier = TelegramNotifier::from_config(&config).unwrap().unwrap();
        let json = serde_json::to_value(notifier.payload("hi")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "chat_id": "42",
                "text": "hi",
                "parse_mode": "Markdown",
                "disable_web_page_preview": true
            })
        );

        config.parse_mode = None;
        let plain = TelegramNotifier::from_config(&config).unwrap().unwrap();
        let json = serde_json::to_value(plain.payload("hi")).unwrap();
        assert!(json.get("parse_mode").is_none());
    }

    fn notifier_at(url: &str, parse_mode: Option<&str>) -> TelegramNotifier {
        TelegramNotifier::from_config(&TelegramConfig {
            api_url: url.to_string(),
            bot_token: Some("123:abc".to_string()),
            chat_id: Some("42".to_string()),
            parse_mode: parse_mode.map(str::to_string),
            enabled: true,
        })
        .unwrap()
        .unwrap()
    }

    fn body_of(request: &str) -> Value {
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn posts_json_to_send_message() {
        let server = StubServer::start(vec![(200, r#"{"ok":true}"#)]).await;
        let notifier = notifier_at(&server.url, Some("Markdown"));

        notifier.send_message("*hi*").await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("POST /bot123:abc/sendMessage HTTP/1.1"));
        assert_eq!(body_of(&requests[0])["parse_mode"], "Markdown");
        assert_eq!(body_of(&requests[0])["text"], "*hi*");
    }

    #[tokio::test]
    async fn unparsable_markup_is_resent_as_plain_text() {
        let server = StubServer::start(vec![
            (
                400,
                r#"{"ok":false,"error_code":400,"description":"Bad Request: can't parse entities"}"#,
            ),
            (200, r#"{"ok":true}"#),
        ])
        .await;
        let notifier = notifier_at(&server.url, Some("Markdown"));

        notifier.send_message("• *A_B*: 1").await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        let retry = body_of(&requests[1]);
        assert!(retry.get("parse_mode").is_none());
        assert_eq!(retry["text"], "• *A_B*: 1");
    }

    #[tokio::test]
    async fn other_rejections_are_not_retried() {
        let server = StubServer::start(vec![(
            500,
            r#"{"ok":false,"description":"Internal Server Error"}"#,
        )])
        .await;
        let notifier = notifier_at(&server.url, Some("Markdown"));

        let err = notifier.send_message("hi").await.unwrap_err();

        assert!(err.to_string().contains("Internal Server Error"));
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn ok_false_is_a_failure() {
        let server = StubServer::start(vec![(
            200,
            r#"{"ok":false,"description":"chat not found"}"#,
        )])
        .await;
        let notifier = notifier_at(&server.url, None);

        assert!(notifier.send_message("hi").await.is_err());
    }
}
