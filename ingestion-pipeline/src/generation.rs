use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use common::{error::AppError, storage::types::quiz::QuizQuestion};
use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::llm_instructions::{
    quiz_system_message, summary_system_message, TITLE_DESCRIPTION_SYSTEM_MESSAGE,
};

/// Token threshold above which a transcript is summarized map-reduce style,
/// and the character budget for each sentence-packed chunk.
pub const MAP_REDUCE_TOKEN_THRESHOLD: usize = 125_000;
pub const MAX_CHUNK_CHARS: usize = 125_000;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TitleDescription {
    pub title: String,
    pub description: String,
}

#[derive(Clone)]
pub struct ContentGenerator {
    openai_client: Arc<Client<OpenAIConfig>>,
    chat_model: String,
}

impl ContentGenerator {
    pub fn new(openai_client: Arc<Client<OpenAIConfig>>, chat_model: String) -> Self {
        Self {
            openai_client,
            chat_model,
        }
    }

    /// One-shot structured summary at the requested detail level (clamped to
    /// 1..=5).
    pub async fn generate_summary(
        &self,
        text: &str,
        summary_detail: i64,
    ) -> Result<String, AppError> {
        let detail = summary_detail.clamp(1, 5);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.chat_model)
            .messages([
                ChatCompletionRequestSystemMessage::from(summary_system_message(detail)).into(),
                ChatCompletionRequestUserMessage::from(text.to_string()).into(),
            ])
            .max_completion_tokens(10_000u32)
            .temperature(0.6)
            .build()?;

        let response = self.openai_client.chat().create(request).await?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| AppError::SummaryGeneration("Model returned no summary content".into()))
    }

    /// Summarize a transcript of any length. Short inputs go straight to one
    /// model call; long ones are split by sentence, summarized per chunk, and
    /// the intermediate summaries re-summarized into the final result. A
    /// failed intermediate chunk degrades to empty and is filtered out.
    pub async fn generate_final_summary(
        &self,
        text: &str,
        summary_detail: i64,
    ) -> Result<String, AppError> {
        let token_estimate = estimate_tokens(text);
        if token_estimate < MAP_REDUCE_TOKEN_THRESHOLD {
            return self.generate_summary(text, summary_detail).await;
        }

        let chunks = split_by_sentences(text, MAX_CHUNK_CHARS);
        debug!(
            token_estimate,
            chunk_count = chunks.len(),
            "Long transcript, running map-reduce summarization"
        );

        let intermediate = join_all(chunks.iter().map(|chunk| async {
            match self.generate_summary(chunk, summary_detail).await {
                Ok(summary) => summary,
                Err(err) => {
                    warn!(error = %err, "Intermediate summary failed, dropping chunk");
                    String::new()
                }
            }
        }))
        .await;

        let combined = intermediate
            .into_iter()
            .filter(|summary| !summary.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        self.generate_summary(&combined, summary_detail).await
    }

    /// Quiz questions for the given text. Difficulty is clamped to 1..=5; the
    /// question-count tier only steers the prompt. Any invalid question
    /// rejects the whole quiz.
    pub async fn generate_quiz(
        &self,
        text: &str,
        difficulty: i64,
        question_count: i64,
    ) -> Result<Vec<QuizQuestion>, AppError> {
        if text.is_empty() {
            return Err(AppError::QuizValidation("No input text for quiz".into()));
        }

        let valid_difficulty = difficulty.clamp(1, 5);
        let range = question_range(question_count);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.chat_model)
            .messages([
                ChatCompletionRequestSystemMessage::from(quiz_system_message(
                    valid_difficulty,
                    range,
                ))
                .into(),
                ChatCompletionRequestUserMessage::from(text.to_string()).into(),
            ])
            .max_completion_tokens(5_000u32)
            .temperature(0.5)
            .build()?;

        let response = self.openai_client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::QuizValidation("Model returned no quiz content".into()))?;

        parse_quiz_response(&content, valid_difficulty)
    }

    /// Course title and description derived from the video titles and
    /// channel names.
    pub async fn generate_title_description(
        &self,
        video_info: &[(String, String)],
    ) -> Result<TitleDescription, AppError> {
        let listing = serde_json::to_string_pretty(
            &video_info
                .iter()
                .map(|(title, channel)| {
                    serde_json::json!({ "title": title, "channel": channel })
                })
                .collect::<Vec<_>>(),
        )?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.chat_model)
            .messages([
                ChatCompletionRequestSystemMessage::from(TITLE_DESCRIPTION_SYSTEM_MESSAGE).into(),
                ChatCompletionRequestUserMessage::from(format!(
                    "Here's the video info (titles + channels):\n{listing}"
                ))
                .into(),
            ])
            .max_completion_tokens(300u32)
            .temperature(0.7)
            .build()?;

        let response = self.openai_client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                AppError::SummaryGeneration("Model returned no title/description".into())
            })?;

        parse_title_description(&content)
    }
}

/// Question-count tiers map to prompt-level ranges, not hard limits.
pub fn question_range(question_count: i64) -> &'static str {
    match question_count {
        1 => "0-4",
        2 => "4-7",
        _ => "7-10",
    }
}

/// Rough token estimate, one token per four characters.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Greedy sentence packing: split on sentence-final punctuation followed by
/// whitespace, then pack sentences into chunks of at most `max_chars`. A
/// single sentence longer than the budget becomes its own oversized chunk.
pub fn split_by_sentences(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in sentences(text) {
        if !current.is_empty() && current.len() + sentence.len() + 1 > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(sentence);
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn sentences(text: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut start = 0;
    let mut last_was_terminal = false;

    for (idx, ch) in text.char_indices() {
        if last_was_terminal && ch.is_whitespace() {
            let sentence = text[start..idx].trim();
            if !sentence.is_empty() {
                result.push(sentence);
            }
            start = idx;
        }
        last_was_terminal = matches!(ch, '.' | '?' | '!');
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        result.push(tail);
    }

    result
}

/// Parse and validate the model's quiz output. Tolerates a markdown code
/// fence around the JSON array; rejects the entire quiz on any bad question.
pub fn parse_quiz_response(
    content: &str,
    expected_difficulty: i64,
) -> Result<Vec<QuizQuestion>, AppError> {
    let stripped = strip_code_fences(content);

    let questions: Vec<QuizQuestion> = serde_json::from_str(stripped)
        .map_err(|err| AppError::QuizValidation(format!("Quiz output is not valid JSON: {err}")))?;

    if questions.is_empty() {
        return Err(AppError::QuizValidation("Quiz contains no questions".into()));
    }

    for question in &questions {
        question.validate()?;
        if question.difficulty != expected_difficulty {
            return Err(AppError::QuizValidation(format!(
                "Question '{}' has difficulty {}, requested {}",
                question.id, question.difficulty, expected_difficulty
            )));
        }
    }

    Ok(questions)
}

pub fn parse_title_description(content: &str) -> Result<TitleDescription, AppError> {
    serde_json::from_str(strip_code_fences(content)).map_err(|err| {
        AppError::SummaryGeneration(format!("Title/description output is not valid JSON: {err}"))
    })
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json" etc.) up to the first newline
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.strip_suffix("```").unwrap_or(body).trim()
}
