use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use common::{Error, MarketSummary, NarrativeGenerator, Result};

const BASE_URL: &str = "https://api.openai.com";

const SYSTEM_PROMPT: &str = "You are a crypto market analyst using Wyckoff and smart-money \
concepts. Answer only with the requested labelled fields, one per line.";

/// Chat-completions client that turns a `MarketSummary` into trade commentary.
pub struct OpenAiNarrator {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiNarrator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

/// The user prompt: live figures plus the exact labels the parser expects.
pub fn build_prompt(summary: &MarketSummary) -> String {
    let patterns = if summary.patterns.is_empty() {
        "none detected".to_string()
    } else {
        summary.patterns.join("; ")
    };
    format!(
        "Analysis of {symbol} using Wyckoff and quality filters.\n\
         - Current live price: {price}\n\
         - RSI({period}): {rsi:.2}\n\
         - Last volume {last:.2} vs average {avg:.2}\n\
         - Detected structure: {patterns}\n\
         Identify support/resistance, FVG, BOS/Spring, order blocks and manipulation.\n\
         Reply only with:\n\
         Direction: Long or Short\n\
         Entry: <price close to the current price>\n\
         SL: <price>\n\
         TP: <price>\n\
         Score: <quality 1-10>",
        symbol = summary.symbol,
        price = summary.live_price,
        period = summary.rsi_period,
        rsi = summary.rsi,
        last = summary.last_volume,
        avg = summary.avg_volume,
    )
}

#[async_trait]
impl NarrativeGenerator for OpenAiNarrator {
    async fn generate(&self, summary: &MarketSummary) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            temperature: 0.2,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT.to_string() },
                ChatMessage { role: "user", content: build_prompt(summary) },
            ],
        };

        debug!(symbol = %summary.symbol, model = %self.model, "Requesting narrative");
        let resp = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Narrative(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Narrative(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Narrative(format!("HTTP {status}: {body}")));
        }

        extract_content(&body)
    }
}

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

fn extract_content(body: &str) -> Result<String> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| Error::Narrative(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| Error::Narrative("response contained no content".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> MarketSummary {
        MarketSummary {
            symbol: "BTCUSDT".into(),
            live_price: 95_000.0,
            rsi_period: 14,
            rsi: 28.4567,
            last_volume: 1500.0,
            avg_volume: 900.0,
            patterns: vec!["Spring: swept 94000".into(), "BOS swing high at 96000".into()],
        }
    }

    #[test]
    fn prompt_carries_figures_and_labels() {
        let prompt = build_prompt(&summary());
        assert!(prompt.contains("BTCUSDT"));
        assert!(prompt.contains("RSI(14): 28.46"));
        assert!(prompt.contains("Spring: swept 94000; BOS swing high at 96000"));
        for label in ["Direction:", "Entry:", "SL:", "TP:", "Score:"] {
            assert!(prompt.contains(label), "missing {label}");
        }
    }

    #[test]
    fn extracts_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Direction: Long"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "Direction: Long");
    }

    #[test]
    fn empty_or_malformed_response_is_an_error() {
        assert!(matches!(
            extract_content(r#"{"choices":[]}"#),
            Err(Error::Narrative(_))
        ));
        assert!(matches!(
            extract_content(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(Error::Narrative(_))
        ));
        assert!(extract_content("not json").is_err());
    }
}
