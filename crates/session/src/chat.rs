//! AI chat data boundary
//!
//! Only the request/response shapes live here. Providers are implemented
//! outside this workspace against [`AssistantProvider`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who wrote a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Supported assistant back ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Claude,
    #[serde(rename = "openai")]
    OpenAi,
    Glm,
}

impl ProviderId {
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::Claude => "Claude",
            ProviderId::OpenAi => "OpenAI",
            ProviderId::Glm => "GLM",
        }
    }
}

/// A source the assistant relied on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    /// Set on assistant turns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            provider: None,
            citations: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(provider: ProviderId, content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            provider: Some(provider),
            citations: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_citation(mut self, citation: Citation) -> Self {
        self.citations.push(citation);
        self
    }
}

/// Conversation sent to a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub provider: ProviderId,
    pub history: Vec<ChatTurn>,
    /// Plain text of the open document, when the user shares it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_context: Option<String>,
}

impl ChatRequest {
    pub fn new(provider: ProviderId, history: Vec<ChatTurn>) -> Self {
        Self {
            provider,
            history,
            document_context: None,
        }
    }

    pub fn with_document_context(mut self, text: impl Into<String>) -> Self {
        self.document_context = Some(text.into());
        self
    }

    /// The most recent user message
    pub fn last_user_message(&self) -> Option<&ChatTurn> {
        self.history.iter().rev().find(|turn| turn.role == Role::User)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("Provider {} is not configured", .0.display_name())]
    NotConfigured(ProviderId),

    #[error("Conversation has no user message")]
    EmptyConversation,

    #[error("Provider error: {0}")]
    Provider(String),
}

/// An assistant back end
pub trait AssistantProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn respond(&self, request: &ChatRequest) -> Result<ChatTurn, ChatError>;
}
