//! Hosted-LLM classifier
//!
//! One chat completion per upload, constrained by the prompt to answer in
//! the response grammar. Every failure path (transport, status, empty or
//! unparseable text, an `ERROR:` answer) is logged and answered by the
//! rule classifier instead.

use crate::classifier::{ClassificationRequest, Classifier, ClassifierKind};
use crate::config::LlmConfig;
use crate::error::ClassifierError;
use crate::response::{parse_response, ClassifierResponse};
use crate::rules::RuleClassifier;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str = "You file student documents. \
Reply with exactly one decision and nothing else, using one of these forms:\n\
STORE: <STUDENT_ID> → <TYPE>\n\
CREATE_FOLDER: <STUDENT_ID>\\nTHEN_STORE: <TYPE>\n\
ERROR: NO_STUDENT_ID\n\
TYPE is one of: assignment, idCard, certificate, feeReceipt. \
Use STORE only when the student already has a folder.";

/// Single-shot text completion
#[async_trait]
pub trait TextCompletion: Send + Sync + std::fmt::Debug {
    /// Complete `prompt` under the `system` instructions
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ClassifierError>;
}

/// OpenAI-compatible chat completions client
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletion {
    /// Create client from configuration
    pub fn new(config: &LlmConfig) -> Result<Self, ClassifierError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ClassifierError::MissingApiKey)?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl TextCompletion for ChatCompletion {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ClassifierError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.0,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(ClassifierError::EmptyCompletion)
    }
}

/// Classifier backed by a [`TextCompletion`], with rule fallback
#[derive(Debug)]
pub struct LlmClassifier<C> {
    completion: C,
    rules: RuleClassifier,
}

impl<C: TextCompletion> LlmClassifier<C> {
    /// Create classifier over a completion client
    #[must_use]
    pub fn new(completion: C) -> Self {
        Self {
            completion,
            rules: RuleClassifier::new(),
        }
    }

    /// Ask the model and parse its answer
    async fn ask(&self, request: &ClassificationRequest) -> Result<ClassifierResponse, ClassifierError> {
        let text = self
            .completion
            .complete(SYSTEM_PROMPT, &build_prompt(request))
            .await?;
        match parse_response(&text) {
            Some(ClassifierResponse::Error(token)) => Err(ClassifierError::Unparseable(format!(
                "model declined with {token}"
            ))),
            Some(response) => Ok(response),
            None => Err(ClassifierError::Unparseable(text)),
        }
    }

    /// Align a model answer with facts the request already settles
    ///
    /// Supplied metadata beats the model's ID, and folder existence always
    /// comes from the request.
    fn reconcile(response: &ClassifierResponse, request: &ClassificationRequest) -> Option<ClassifierResponse> {
        let document_type = response.document_type()?;
        let student_id = request
            .explicit_student_id()
            .or_else(|| response.student_id().cloned())?;
        let exists = request.folder_exists(&student_id);
        Some(ClassifierResponse::decide(student_id, document_type, exists))
    }
}

#[async_trait]
impl<C: TextCompletion> Classifier for LlmClassifier<C> {
    async fn classify(&self, request: &ClassificationRequest) -> ClassifierResponse {
        match self.ask(request).await {
            Ok(response) => match Self::reconcile(&response, request) {
                Some(decision) => {
                    tracing::debug!(file = %request.file_name, decision = %decision, "LLM classification");
                    decision
                }
                None => self.rules.decide(request),
            },
            Err(e) => {
                tracing::warn!(file = %request.file_name, error = %e, "LLM classification failed, using rules");
                self.rules.decide(request)
            }
        }
    }

    fn kind(&self) -> ClassifierKind {
        ClassifierKind::Llm
    }
}

/// User prompt for one upload
#[must_use]
pub fn build_prompt(request: &ClassificationRequest) -> String {
    let folders = if request.existing_folders.is_empty() {
        "(none)".to_string()
    } else {
        request
            .existing_folders
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let supplied = request.student_id.as_deref().unwrap_or("(not provided)");

    format!(
        "Filename: {}\nStudent ID provided: {}\nStudents with existing folders: {}\nDecision:",
        request.file_name, supplied, folders
    )
}
