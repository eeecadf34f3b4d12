use chrono::Utc;
use log::{debug, error, info};
use rand::Rng;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::GenerationError;
use crate::llm::{CompletionClient, CompletionRequest};
use crate::models::{GeneratedTweet, ReactionPayload, SimulationStatus, TweetDraft};
use crate::prompt;
use crate::store::SimulationStore;

/// Sampling parameters sent with every completion call.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            max_tokens: 2000,
        }
    }
}

/// Produces a batch of simulated reactions for one simulation and records
/// the outcome on its status.
#[derive(Clone)]
pub struct ReactionGenerator {
    store: Arc<dyn SimulationStore>,
    llm: Arc<dyn CompletionClient>,
    options: CompletionOptions,
}

impl ReactionGenerator {
    pub fn new(
        store: Arc<dyn SimulationStore>,
        llm: Arc<dyn CompletionClient>,
        options: CompletionOptions,
    ) -> Self {
        Self {
            store,
            llm,
            options,
        }
    }

    /// Calls the model once, stores what it returned and marks the simulation
    /// `completed`. On any error the simulation is marked `failed` (best
    /// effort) and the original error is returned.
    ///
    /// `count` is passed to the model as-is; the caller is expected to have
    /// bounded it. The number of stored rows is whatever the model produced.
    pub async fn generate(
        &self,
        simulation_id: Uuid,
        idea_text: &str,
        audience: &str,
        count: u32,
    ) -> Result<Vec<TweetDraft>, GenerationError> {
        info!("[{}] Starting generation for {} tweets", simulation_id, count);
        debug!(
            "[{}] Idea: \"{}\"",
            simulation_id,
            idea_text.chars().take(50).collect::<String>()
        );

        match self.run(simulation_id, idea_text, audience, count).await {
            Ok(drafts) => {
                info!("[{}] Generation complete", simulation_id);
                Ok(drafts)
            }
            Err(e) => {
                error!("[{}] Generation failed: {}", simulation_id, e);
                if let Err(status_err) = self
                    .store
                    .update_status(simulation_id, SimulationStatus::Failed, Utc::now())
                    .await
                {
                    error!(
                        "[{}] Could not mark simulation failed: {}",
                        simulation_id, status_err
                    );
                }
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        simulation_id: Uuid,
        idea_text: &str,
        audience: &str,
        count: u32,
    ) -> Result<Vec<TweetDraft>, GenerationError> {
        let request = CompletionRequest {
            messages: prompt::reaction_messages(idea_text, audience, count),
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
            json_object: true,
        };

        debug!("[{}] Calling completion API", simulation_id);
        let content = self
            .llm
            .complete(request)
            .await?
            .filter(|body| !body.is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        let drafts = parse_reactions(&content)?;
        info!("[{}] Generated {} tweets", simulation_id, drafts.len());

        let rows = build_rows(simulation_id, &drafts);
        self.store.insert_tweets(&rows).await?;

        self.store
            .update_status(simulation_id, SimulationStatus::Completed, Utc::now())
            .await?;

        Ok(drafts)
    }
}

/// Decodes the model's JSON output. Anything other than an object (arrays,
/// strings, numbers) carries no `tweets` and is an empty batch, as is a
/// missing or null `tweets` key. Invalid JSON and a bare `null` are errors.
pub fn parse_reactions(content: &str) -> Result<Vec<TweetDraft>, GenerationError> {
    let value: Value = serde_json::from_str(content)?;
    if value.is_null() {
        return Err(GenerationError::NullOutput);
    }
    if !value.is_object() {
        return Ok(Vec::new());
    }
    let payload: ReactionPayload = serde_json::from_value(value)?;
    Ok(payload.tweets.unwrap_or_default())
}

pub fn build_rows(simulation_id: Uuid, drafts: &[TweetDraft]) -> Vec<GeneratedTweet> {
    let mut rng = rand::rng();
    let now = Utc::now();
    drafts
        .iter()
        .enumerate()
        .map(|(index, draft)| GeneratedTweet {
            id: Uuid::new_v4(),
            simulation_id,
            author: draft.author.clone(),
            content: draft.text.clone(),
            sentiment: draft.sentiment.clone(),
            is_reply: false,
            parent_tweet_id: None,
            order_index: index as i32,
            created_at: now,
            engagement_score: rng.random_range(0..100),
        })
        .collect()
}
