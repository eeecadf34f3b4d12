#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fake::faker::internet::en::Username;
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use std::collections::VecDeque;
use std::sync::Mutex;
use uuid::Uuid;

use reaction_sim::error::{LlmError, StoreError};
use reaction_sim::llm::{CompletionClient, CompletionRequest};
use reaction_sim::models::{GeneratedTweet, NewSimulation, Simulation, SimulationStatus, User};
use reaction_sim::store::SimulationStore;

/// In-process `SimulationStore` with switches for failing individual writes.
#[derive(Default)]
pub struct MemoryStore {
    pub users: Mutex<Vec<User>>,
    pub simulations: Mutex<Vec<Simulation>>,
    pub tweets: Mutex<Vec<GeneratedTweet>>,
    pub insert_batches: Mutex<usize>,
    pub fail_insert: Mutex<bool>,
    pub fail_status_updates: Mutex<bool>,
    pub fail_user_lookup: Mutex<bool>,
}

impl MemoryStore {
    pub fn status_of(&self, id: Uuid) -> Option<SimulationStatus> {
        self.simulations
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.status)
    }

    pub fn tweets_for(&self, id: Uuid) -> Vec<GeneratedTweet> {
        self.tweets
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.simulation_id == id)
            .cloned()
            .collect()
    }

    /// Adds a simulation directly, bypassing `create_simulation`.
    pub fn seed_simulation(
        &self,
        status: SimulationStatus,
        updated_at: DateTime<Utc>,
    ) -> Simulation {
        let simulation = Simulation {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            idea_text: "A subscription box for left-handed tools".into(),
            audience: "makers and hobbyists".into(),
            tweet_count: 10,
            status,
            created_at: updated_at,
            updated_at,
        };
        self.simulations.lock().unwrap().push(simulation.clone());
        simulation
    }
}

#[async_trait]
impl SimulationStore for MemoryStore {
    async fn find_user_by_identity(
        &self,
        external_identity: &str,
    ) -> Result<Option<User>, StoreError> {
        if *self.fail_user_lookup.lock().unwrap() {
            return Err(StoreError::Backend("users table unavailable".into()));
        }
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.external_identity == external_identity)
            .cloned())
    }

    async fn create_user(&self, external_identity: &str, email: &str) -> Result<User, StoreError> {
        let user = User {
            id: Uuid::new_v4(),
            external_identity: external_identity.to_string(),
            email: email.to_string(),
            simulation_count: 0,
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn set_simulation_count(&self, user_id: Uuid, count: i32) -> Result<(), StoreError> {
        if let Some(user) = self.users.lock().unwrap().iter_mut().find(|u| u.id == user_id) {
            user.simulation_count = count;
        }
        Ok(())
    }

    async fn create_simulation(&self, new: NewSimulation) -> Result<Simulation, StoreError> {
        let now = Utc::now();
        let simulation = Simulation {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            idea_text: new.idea_text,
            audience: new.audience,
            tweet_count: new.tweet_count,
            status: SimulationStatus::Generating,
            created_at: now,
            updated_at: now,
        };
        self.simulations.lock().unwrap().push(simulation.clone());
        Ok(simulation)
    }

    async fn get_simulation(&self, id: Uuid) -> Result<Option<Simulation>, StoreError> {
        Ok(self
            .simulations
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn insert_tweets(&self, tweets: &[GeneratedTweet]) -> Result<(), StoreError> {
        if *self.fail_insert.lock().unwrap() {
            return Err(StoreError::Backend("batch rejected".into()));
        }
        if tweets.is_empty() {
            return Ok(());
        }
        *self.insert_batches.lock().unwrap() += 1;
        self.tweets.lock().unwrap().extend_from_slice(tweets);
        Ok(())
    }

    async fn list_tweets(&self, simulation_id: Uuid) -> Result<Vec<GeneratedTweet>, StoreError> {
        let mut tweets = self.tweets_for(simulation_id);
        tweets.sort_by_key(|t| t.order_index);
        Ok(tweets)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: SimulationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if *self.fail_status_updates.lock().unwrap() {
            return Err(StoreError::Backend("simulations table unavailable".into()));
        }
        if let Some(sim) = self.simulations.lock().unwrap().iter_mut().find(|s| s.id == id) {
            sim.status = status;
            sim.updated_at = updated_at;
        }
        Ok(())
    }

    async fn list_by_status(
        &self,
        status: SimulationStatus,
    ) -> Result<Vec<Simulation>, StoreError> {
        Ok(self
            .simulations
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.status == status)
            .cloned()
            .collect())
    }

    async fn fail_if_generating(
        &self,
        id: Uuid,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut simulations = self.simulations.lock().unwrap();
        match simulations.iter_mut().find(|s| s.id == id) {
            Some(sim) if sim.status == SimulationStatus::Generating => {
                sim.status = SimulationStatus::Failed;
                sim.updated_at = updated_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

pub enum Reply {
    Content(Option<String>),
    MissingKey,
    Api(u16),
}

/// `CompletionClient` that replays queued replies and records each request.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Reply>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn replying(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_content(content: impl Into<String>) -> Self {
        Self::replying(vec![Reply::Content(Some(content.into()))])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<Option<String>, LlmError> {
        self.requests.lock().unwrap().push(request);
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Content(content)) => Ok(content),
            Some(Reply::MissingKey) => Err(LlmError::MissingApiKey),
            Some(Reply::Api(status)) => Err(LlmError::Api {
                status,
                body: "upstream error".into(),
            }),
            None => Ok(None),
        }
    }
}

/// A model reply holding `n` reactions with realistic handles and text,
/// cycling through the three sentiments.
pub fn reactions_json(n: usize) -> String {
    let sentiments = ["praise", "neutral", "worry"];
    let tweets: Vec<serde_json::Value> = (0..n)
        .map(|i| {
            let handle: String = Username().fake();
            let text: String = Sentence(3..10).fake();
            serde_json::json!({
                "author": format!("@{handle}"),
                "text": text,
                "sentiment": sentiments[i % sentiments.len()],
            })
        })
        .collect();
    serde_json::json!({ "tweets": tweets }).to_string()
}
