//! Telegram delivery for run reports.
//!
//! The pipeline produces the report text; this module only delivers it.
//! Delivery is best-effort: failures are logged and swallowed so a flaky
//! bot API can never fail a run that already did its work.

use crate::http::{http_client, REQUEST_TIMEOUT, SHARED_RUNTIME};

/// Telegram bot sink for free-text run summaries.
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Send `text` as a Markdown message. Returns whether delivery succeeded.
    pub fn send(&self, text: &str) -> bool {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let params = [
            ("chat_id", self.chat_id.as_str()),
            ("text", text),
            ("parse_mode", "Markdown"),
        ];

        let result = SHARED_RUNTIME.handle().block_on(async {
            http_client()
                .post(&url)
                .form(&params)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await
                .and_then(|r| r.error_for_status())
        });

        match result {
            Ok(_) => {
                log::debug!("notification delivered");
                true
            }
            Err(e) => {
                // The request URL embeds the bot token; log the status only.
                let status = e
                    .status()
                    .map_or_else(|| "network error".to_string(), |s| format!("HTTP {s}"));
                log::warn!("notification delivery failed: {status}");
                false
            }
        }
    }
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}
