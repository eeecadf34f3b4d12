use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{GeneratedTweet, NewSimulation, Simulation, SimulationStatus, User};

/// Persistence operations for users, simulations and their generated tweets.
#[async_trait]
pub trait SimulationStore: Send + Sync {
    async fn find_user_by_identity(&self, external_identity: &str)
        -> Result<Option<User>, StoreError>;

    async fn create_user(&self, external_identity: &str, email: &str) -> Result<User, StoreError>;

    async fn set_simulation_count(&self, user_id: Uuid, count: i32) -> Result<(), StoreError>;

    /// Inserts a simulation in the `generating` state.
    async fn create_simulation(&self, new: NewSimulation) -> Result<Simulation, StoreError>;

    async fn get_simulation(&self, id: Uuid) -> Result<Option<Simulation>, StoreError>;

    /// Writes the whole batch in a single statement. An empty batch is a no-op.
    async fn insert_tweets(&self, tweets: &[GeneratedTweet]) -> Result<(), StoreError>;

    /// Tweets for a simulation, by `order_index`.
    async fn list_tweets(&self, simulation_id: Uuid) -> Result<Vec<GeneratedTweet>, StoreError>;

    async fn update_status(
        &self,
        id: Uuid,
        status: SimulationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn list_by_status(&self, status: SimulationStatus)
        -> Result<Vec<Simulation>, StoreError>;

    /// Moves a simulation to `failed` only if it is still `generating`.
    /// Returns whether the write applied.
    async fn fail_if_generating(
        &self,
        id: Uuid,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}
