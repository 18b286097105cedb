use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question number must be >= 1")]
    InvalidNumber,

    #[error("prompt cannot be empty")]
    EmptyPrompt,

    #[error("duplicate option key: {0}")]
    DuplicateOption(String),

    #[error("unknown CEFR level: {0}")]
    UnknownLevel(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Listening,
    Reading,
    Speaking,
    Writing,
}

impl QuestionType {
    /// Writing questions are answered with free text rather than an option key.
    #[must_use]
    pub fn is_free_text(self) -> bool {
        matches!(self, QuestionType::Writing | QuestionType::Speaking)
    }
}

/// Common European Framework reference level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl FromStr for CefrLevel {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(Self::A1),
            "A2" => Ok(Self::A2),
            "B1" => Ok(Self::B1),
            "B2" => Ok(Self::B2),
            "C1" => Ok(Self::C1),
            "C2" => Ok(Self::C2),
            _ => Err(QuestionError::UnknownLevel(s.to_owned())),
        }
    }
}

/// One selectable option of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub key: String,
    pub label: String,
}

impl QuestionOption {
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// A question as delivered to a session. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    number: u32,
    kind: QuestionType,
    level: Option<CefrLevel>,
    prompt: String,
    options: Vec<QuestionOption>,
    passage: Option<String>,
    audio_url: Option<String>,
}

impl Question {
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidNumber` for number 0 and
    /// `QuestionError::EmptyPrompt` for a blank prompt.
    pub fn new(
        id: QuestionId,
        number: u32,
        kind: QuestionType,
        prompt: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if number == 0 {
            return Err(QuestionError::InvalidNumber);
        }
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        Ok(Self {
            id,
            number,
            kind,
            level: None,
            prompt,
            options: Vec::new(),
            passage: None,
            audio_url: None,
        })
    }

    /// # Errors
    ///
    /// Returns `QuestionError::DuplicateOption` if two options share a key.
    pub fn with_options(mut self, options: Vec<QuestionOption>) -> Result<Self, QuestionError> {
        for (i, option) in options.iter().enumerate() {
            if options[..i].iter().any(|prev| prev.key == option.key) {
                return Err(QuestionError::DuplicateOption(option.key.clone()));
            }
        }
        self.options = options;
        Ok(self)
    }

    #[must_use]
    pub fn with_level(mut self, level: CefrLevel) -> Self {
        self.level = Some(level);
        self
    }

    #[must_use]
    pub fn with_passage(mut self, passage: impl Into<String>) -> Self {
        self.passage = Some(passage.into());
        self
    }

    #[must_use]
    pub fn with_audio_url(mut self, url: impl Into<String>) -> Self {
        self.audio_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn number(&self) -> u32 {
        self.number
    }

    #[must_use]
    pub fn kind(&self) -> QuestionType {
        self.kind
    }

    #[must_use]
    pub fn level(&self) -> Option<CefrLevel> {
        self.level
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[QuestionOption] {
        &self.options
    }

    #[must_use]
    pub fn passage(&self) -> Option<&str> {
        self.passage.as_deref()
    }

    #[must_use]
    pub fn audio_url(&self) -> Option<&str> {
        self.audio_url.as_deref()
    }

    #[must_use]
    pub fn has_option(&self, key: &str) -> bool {
        self.options.iter().any(|option| option.key == key)
    }
}
