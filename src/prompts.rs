//! Writing-prompt generator.
//!
//! Turns a short sentence into a writing prompt for a given kind of text,
//! tone and level of detail, optionally steering it with tags. Every
//! template lives here so wording changes happen in exactly one place and
//! tests can pin the exact output.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Detail level used when none is given.
pub const DEFAULT_DETAIL: u8 = 5;

/// Kind of text the prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptType {
    #[default]
    Creative,
    Technical,
    Marketing,
    Academic,
}

impl PromptType {
    pub const ALL: [PromptType; 4] = [
        PromptType::Creative,
        PromptType::Technical,
        PromptType::Marketing,
        PromptType::Academic,
    ];

    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            PromptType::Creative => "Creative Writing",
            PromptType::Technical => "Technical Documentation",
            PromptType::Marketing => "Marketing Copy",
            PromptType::Academic => "Academic Writing",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptType::Creative => "creative",
            PromptType::Technical => "technical",
            PromptType::Marketing => "marketing",
            PromptType::Academic => "academic",
        }
    }
}

impl fmt::Display for PromptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PromptType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PromptType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown prompt type '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Neutral,
    Enthusiastic,
    Formal,
    Casual,
}

impl Tone {
    pub const ALL: [Tone; 4] = [Tone::Neutral, Tone::Enthusiastic, Tone::Formal, Tone::Casual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Neutral => "neutral",
            Tone::Enthusiastic => "enthusiastic",
            Tone::Formal => "formal",
            Tone::Casual => "casual",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tone::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown tone '{s}'"))
    }
}

/// Word used for a detail level: 1–3 brief, 8–10 highly detailed.
pub fn detail_descriptor(level: u8) -> &'static str {
    match level {
        0..=3 => "brief",
        8.. => "highly detailed",
        _ => "moderately detailed",
    }
}

/// Inputs of one prompt.
///
/// # Example
/// ```rust
/// use pagecheck::prompts::{PromptRequest, PromptType};
///
/// let prompt = PromptRequest::new("a lighthouse keeper's last night")
///     .prompt_type(PromptType::Creative)
///     .detail(9)
///     .tag("storm")
///     .generate()
///     .unwrap();
/// assert!(prompt.starts_with("Write a highly detailed neutral creative piece"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub sentence: String,
    pub prompt_type: PromptType,
    pub tone: Tone,
    /// 1–10.
    pub detail: u8,
    /// Unique, in insertion order.
    pub tags: Vec<String>,
}

impl Default for PromptRequest {
    fn default() -> Self {
        Self {
            sentence: String::new(),
            prompt_type: PromptType::default(),
            tone: Tone::default(),
            detail: DEFAULT_DETAIL,
            tags: Vec::new(),
        }
    }
}

impl PromptRequest {
    pub fn new(sentence: impl Into<String>) -> Self {
        Self {
            sentence: sentence.into(),
            ..Self::default()
        }
    }

    pub fn prompt_type(mut self, prompt_type: PromptType) -> Self {
        self.prompt_type = prompt_type;
        self
    }

    pub fn tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    /// Clamped to 1–10.
    pub fn detail(mut self, level: u8) -> Self {
        self.detail = level.clamp(1, 10);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.add_tag(tag);
        self
    }

    /// Add a tag. Blank and repeated tags are ignored; returns whether it
    /// was added.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into().trim().to_string();
        if tag.is_empty() || self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    /// Build the prompt text. `None` when the sentence is blank.
    pub fn generate(&self) -> Option<String> {
        let sentence = self.sentence.trim();
        if sentence.is_empty() {
            return None;
        }

        let d = detail_descriptor(self.detail);
        let tone = self.tone.as_str();
        let mut prompt = match self.prompt_type {
            PromptType::Creative => {
                format!("Write a {d} {tone} creative piece based on this concept: \"{sentence}\"")
            }
            PromptType::Technical => {
                format!("Create a {d} {tone} technical explanation about: \"{sentence}\"")
            }
            PromptType::Marketing => {
                format!("Generate {d} {tone} marketing content for: \"{sentence}\"")
            }
            PromptType::Academic => {
                format!("Compose a {d} {tone} academic analysis regarding: \"{sentence}\"")
            }
        };

        if !self.tags.is_empty() {
            prompt.push_str(&format!(
                " Include elements related to: {}.",
                self.tags.join(", ")
            ));
        }
        Some(prompt)
    }
}
