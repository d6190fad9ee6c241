// src/interview.rs
//! Chat-style mock interview backed by the analysis webhook.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::types::response::AnalysisResult;

/// Opening message shown before the candidate has answered anything.
pub const OPENING_PROMPT: &str = "Bienvenue dans l'entretien simulé. Je vais vous poser des \
questions comme un recruteur. Décrivez brièvement votre objectif de carrière.";

/// Questions used when the analysis does not supply a follow-up.
pub const STARTER_QUESTIONS: [&str; 5] = [
    "Parlez-moi de votre expérience la plus récente.",
    "Quelles sont les compétences clés que vous apportez pour ce poste ?",
    "Décrivez un défi technique que vous avez surmonté et comment.",
    "Comment priorisez-vous vos tâches dans un contexte de forte pression ?",
    "Pourquoi souhaitez-vous rejoindre notre entreprise ?",
];

const CLOSING_PROMPT: &str = "Merci pour vos réponses. Souhaitez-vous passer à une simulation \
de questions techniques ?";

#[derive(Debug, Serialize)]
struct AnalysisPayload<'a> {
    question: &'a str,
    response: &'a str,
    timestamp: String,
    #[serde(rename = "sessionId")]
    session_id: String,
}

/// One analyzed exchange: the feedback for the answer just given plus the
/// question to ask next.
#[derive(Debug)]
pub struct InterviewTurn {
    pub analysis: AnalysisResult,
    pub next_question: String,
}

/// One mock-interview conversation. The session id is minted explicitly at
/// construction and sent with every exchange so the webhook can correlate a
/// conversation; `reset` starts a new one.
pub struct InterviewSession {
    client: reqwest::Client,
    webhook_url: String,
    session_id: Uuid,
    question_index: usize,
    current_question: String,
}

impl InterviewSession {
    pub fn new(webhook_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            webhook_url,
            session_id: Uuid::new_v4(),
            question_index: 0,
            current_question: OPENING_PROMPT.to_string(),
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn current_question(&self) -> &str {
        &self.current_question
    }

    /// Start over with a fresh session id and the opening prompt.
    pub fn reset(&mut self) {
        self.session_id = Uuid::new_v4();
        self.question_index = 0;
        self.current_question = OPENING_PROMPT.to_string();
    }

    /// Send the candidate's answer for analysis and move the conversation
    /// forward. A non-success response is an error; there is no mock
    /// fallback and no retry.
    pub async fn analyze_response(&mut self, answer: &str) -> Result<InterviewTurn> {
        if self.webhook_url.trim().is_empty() {
            anyhow::bail!("No interview webhook configured");
        }

        let payload = AnalysisPayload {
            question: &self.current_question,
            response: answer,
            timestamp: chrono::Utc::now().to_rfc3339(),
            session_id: self.session_id.to_string(),
        };

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .context("Failed to call analysis webhook")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Webhook failed: {}", status.as_u16());
        }

        let analysis: AnalysisResult = response
            .json()
            .await
            .context("Failed to parse analysis response")?;

        info!(
            "Interview exchange analyzed: grade {}/20 (session {})",
            analysis.grade, self.session_id
        );

        let next_question = analysis
            .next_question
            .clone()
            .filter(|q| !q.trim().is_empty())
            .unwrap_or_else(|| fallback_question(self.question_index).to_string());

        self.question_index = (self.question_index + 1).min(STARTER_QUESTIONS.len());
        self.current_question = next_question.clone();

        Ok(InterviewTurn {
            analysis,
            next_question,
        })
    }
}

/// Starter question for `index`, then the closing line once exhausted.
fn fallback_question(index: usize) -> &'static str {
    STARTER_QUESTIONS.get(index).copied().unwrap_or(CLOSING_PROMPT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_walks_starters_then_closes() {
        assert_eq!(fallback_question(0), STARTER_QUESTIONS[0]);
        assert_eq!(fallback_question(4), STARTER_QUESTIONS[4]);
        assert_eq!(fallback_question(5), CLOSING_PROMPT);
        assert_eq!(fallback_question(100), CLOSING_PROMPT);
    }

    #[test]
    fn reset_mints_a_new_session_id() {
        let mut session = InterviewSession::new("https://hook.example/analyze".to_string()).unwrap();
        let first = session.session_id();
        session.reset();
        assert_ne!(first, session.session_id());
        assert_eq!(session.current_question(), OPENING_PROMPT);
    }

    #[tokio::test]
    async fn missing_webhook_is_an_error_not_a_mock() {
        let mut session = InterviewSession::new(String::new()).unwrap();
        let result = session.analyze_response("Je vise un poste de développeur.").await;
        assert!(result.is_err());
        // The conversation does not move forward on failure.
        assert_eq!(session.current_question(), OPENING_PROMPT);
    }
}
