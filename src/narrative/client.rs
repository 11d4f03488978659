// src/narrative/client.rs
use crate::config::SectionsConfig;
use crate::extractors::section::SectionKey;
use crate::narrative::models::{ChatMessage, ChatRequest, ChatResponse};
use crate::narrative::NarrativeContext;
use crate::utils::error::NarrativeError;
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const USER_AGENT: &str = concat!("aar_report/", env!("CARGO_PKG_VERSION"));

/// Connection settings for the language model.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    /// Read by the caller (usually from `OPENAI_API_KEY`), never from the environment here.
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Builds the instructions that make the model answer in the four-section
/// layout the extractor understands.
pub fn system_prompt(ctx: &NarrativeContext, sections: &SectionsConfig) -> String {
    // English name first, then the label the extractor expects back
    let heading = |key: SectionKey| {
        let label = sections.get(key).label.trim();
        if label == key.as_str() {
            label.to_string()
        } else {
            format!("{} ('{}')", key.as_str(), label)
        }
    };

    format!(
        "You are an assistant specializing in creating text in a military style, tailored specifically for the IDF. \
Your task is to improve the text, making it more professional and impactful, and to organize it into four sections according to the following military structure:\n\n\
1. {intro}:\n\
   - Provide the following details in **2 lines**:\n\
     - Name of the force: {force}\n\
     - Date: {date}\n\
     - Manager: {manager}\n\
     - Location: {location}\n\n\
2. {ex1}:\n\
   - Limit to **7 lines**.\n\
   - Three paragraphs:\n\
     - Paragraph one: Describe the events in chronological order, not in a list.\n\
     - Paragraph two: What the force did well.\n\
     - Paragraph three: Where the force needs to improve.\n\n\
3. {ex2}:\n\
   - Limit to **7 lines**.\n\
   - Three paragraphs, same structure as the first exercise.\n\n\
4. {summary}:\n\
   - Limit to **5 lines**.\n\
   - A conclusion of the exercises, highlighting the critical disadvantages of the force (if any) and where the force did well.\n\
   - The summary should maintain a positive tone.\n\n\
Guidelines:\n\
- Replace any instances of 'Scenario' ('תרחיש') with 'Exercise' ('תרגיל').\n\
- Describe events in chronological order, avoiding division into sub-events.\n\
- Write exclusively in Hebrew, adhering to military jargon and style appropriate for the IDF.\n\
- Each section must start with its title on a new line, without any additional formatting or symbols.\n\
- Maintain a formal and authoritative tone suitable for IDF documentation.\n\
- **Strictly adhere to the specified line limits for each section.**",
        intro = heading(SectionKey::Introduction),
        ex1 = heading(SectionKey::ExerciseOne),
        ex2 = heading(SectionKey::ExerciseTwo),
        summary = heading(SectionKey::Summary),
        force = ctx.force_name,
        date = ctx.date,
        manager = ctx.manager_name,
        location = ctx.location,
    )
}

/// Rewrites raw narrative text through a chat-completions endpoint.
pub struct NarrativeImprover {
    client: reqwest::Client,
    config: LlmConfig,
    sections: SectionsConfig,
}

impl NarrativeImprover {
    pub fn new(config: LlmConfig, sections: SectionsConfig) -> Result<Self, NarrativeError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            config,
            sections,
        })
    }

    /// Returns the improved text, or an empty string if anything goes wrong.
    /// Failures are logged, never propagated.
    pub async fn improve(&self, raw_text: &str, ctx: &NarrativeContext) -> String {
        match self.request_improvement(raw_text, ctx).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Error occurred while communicating with LLM: {}", e);
                String::new()
            }
        }
    }

    async fn request_improvement(&self, raw_text: &str, ctx: &NarrativeContext) -> Result<String, NarrativeError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(NarrativeError::MissingApiKey)?;

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(system_prompt(ctx, &self.sections)),
                ChatMessage::user(format!(
                    "Please improve this text and divide it into four parts as instructed: {}",
                    raw_text
                )),
            ],
        };

        tracing::info!("Requesting narrative improvement from {} ({})", self.config.endpoint, self.config.model);
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?; // Propagates reqwest::Error as NarrativeError::Network

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} from {}", status, self.config.endpoint);
            return Err(NarrativeError::Http(status));
        }

        let body: ChatResponse = response.json().await?;
        let text = body.first_text().ok_or(NarrativeError::EmptyResponse)?;
        tracing::debug!("Raw LLM response:\n{}", text);

        Ok(text)
    }
}
