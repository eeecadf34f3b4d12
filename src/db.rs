use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scylla::batch::{Batch, BatchType};
use scylla::frame::response::result::{CqlValue, Row};
use scylla::frame::value::CqlTimestamp;
use scylla::{QueryResult, Session, SessionBuilder};
use std::error::Error;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{GeneratedTweet, NewSimulation, Simulation, SimulationStatus, User};
use crate::store::SimulationStore;

pub async fn create_session(nodes: &[String], keyspace: &str) -> Result<Session, Box<dyn Error>> {
    let mut builder = SessionBuilder::new();
    for node in nodes {
        builder = builder.known_node(node);
    }
    let session = builder.use_keyspace(keyspace, false).build().await?;

    Ok(session)
}

const SIMULATION_COLUMNS: &str =
    "id, user_id, idea_text, audience, tweet_count, status, created_at, updated_at";

const TWEET_COLUMNS: &str = "id, simulation_id, author, content, sentiment, is_reply, \
     parent_tweet_id, order_index, created_at, engagement_score";

fn cql_timestamp(at: DateTime<Utc>) -> CqlTimestamp {
    CqlTimestamp(at.timestamp_millis())
}

fn column<'a>(row: &'a Row, idx: usize, name: &str) -> Result<Option<&'a CqlValue>, StoreError> {
    row.columns
        .get(idx)
        .map(Option::as_ref)
        .ok_or_else(|| StoreError::Decode(format!("missing column {name}")))
}

fn mismatch(name: &str, value: Option<&CqlValue>) -> StoreError {
    StoreError::Decode(format!("unexpected value for {name}: {value:?}"))
}

fn uuid_at(row: &Row, idx: usize, name: &str) -> Result<Uuid, StoreError> {
    match column(row, idx, name)? {
        Some(CqlValue::Uuid(uuid)) => Ok(*uuid),
        other => Err(mismatch(name, other)),
    }
}

fn opt_uuid_at(row: &Row, idx: usize, name: &str) -> Result<Option<Uuid>, StoreError> {
    match column(row, idx, name)? {
        None => Ok(None),
        Some(CqlValue::Uuid(uuid)) => Ok(Some(*uuid)),
        other => Err(mismatch(name, other)),
    }
}

fn opt_text_at(row: &Row, idx: usize, name: &str) -> Result<Option<String>, StoreError> {
    match column(row, idx, name)? {
        None => Ok(None),
        Some(CqlValue::Text(text)) | Some(CqlValue::Ascii(text)) => Ok(Some(text.clone())),
        other => Err(mismatch(name, other)),
    }
}

fn text_at(row: &Row, idx: usize, name: &str) -> Result<String, StoreError> {
    Ok(opt_text_at(row, idx, name)?.unwrap_or_default())
}

fn int_at(row: &Row, idx: usize, name: &str) -> Result<i32, StoreError> {
    match column(row, idx, name)? {
        None => Ok(0),
        Some(CqlValue::Int(value)) => Ok(*value),
        other => Err(mismatch(name, other)),
    }
}

fn bool_at(row: &Row, idx: usize, name: &str) -> Result<bool, StoreError> {
    match column(row, idx, name)? {
        None => Ok(false),
        Some(CqlValue::Boolean(value)) => Ok(*value),
        other => Err(mismatch(name, other)),
    }
}

fn timestamp_at(row: &Row, idx: usize, name: &str) -> Result<DateTime<Utc>, StoreError> {
    match column(row, idx, name)? {
        Some(CqlValue::Timestamp(ts)) => DateTime::<Utc>::from_timestamp_millis(ts.0)
            .ok_or_else(|| StoreError::Decode(format!("{name} out of range: {}", ts.0))),
        other => Err(mismatch(name, other)),
    }
}

fn user_from_row(row: &Row) -> Result<User, StoreError> {
    Ok(User {
        id: uuid_at(row, 0, "id")?,
        external_identity: text_at(row, 1, "external_identity")?,
        email: text_at(row, 2, "email")?,
        simulation_count: int_at(row, 3, "simulation_count")?,
    })
}

fn simulation_from_row(row: &Row) -> Result<Simulation, StoreError> {
    let status = text_at(row, 5, "status")?
        .parse::<SimulationStatus>()
        .map_err(StoreError::Decode)?;
    Ok(Simulation {
        id: uuid_at(row, 0, "id")?,
        user_id: uuid_at(row, 1, "user_id")?,
        idea_text: text_at(row, 2, "idea_text")?,
        audience: text_at(row, 3, "audience")?,
        tweet_count: int_at(row, 4, "tweet_count")?,
        status,
        created_at: timestamp_at(row, 6, "created_at")?,
        updated_at: timestamp_at(row, 7, "updated_at")?,
    })
}

fn tweet_from_row(row: &Row) -> Result<GeneratedTweet, StoreError> {
    Ok(GeneratedTweet {
        id: uuid_at(row, 0, "id")?,
        simulation_id: uuid_at(row, 1, "simulation_id")?,
        author: text_at(row, 2, "author")?,
        content: text_at(row, 3, "content")?,
        sentiment: opt_text_at(row, 4, "sentiment")?.map(Into::into),
        is_reply: bool_at(row, 5, "is_reply")?,
        parent_tweet_id: opt_uuid_at(row, 6, "parent_tweet_id")?,
        order_index: int_at(row, 7, "order_index")?,
        created_at: timestamp_at(row, 8, "created_at")?,
        engagement_score: int_at(row, 9, "engagement_score")?,
    })
}

fn decode_rows<T>(
    result: QueryResult,
    decode: fn(&Row) -> Result<T, StoreError>,
) -> Result<Vec<T>, StoreError> {
    result.rows.unwrap_or_default().iter().map(decode).collect()
}

/// `[applied]` column of a lightweight-transaction result.
fn lwt_applied(result: QueryResult) -> Result<bool, StoreError> {
    let rows = result.rows.unwrap_or_default();
    let row = rows
        .first()
        .ok_or_else(|| StoreError::Backend("conditional update returned no rows".into()))?;
    bool_at(row, 0, "[applied]")
}

/// `SimulationStore` backed by a ScyllaDB/Cassandra session.
pub struct ScyllaStore {
    session: Arc<Session>,
}

impl ScyllaStore {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl SimulationStore for ScyllaStore {
    async fn find_user_by_identity(
        &self,
        external_identity: &str,
    ) -> Result<Option<User>, StoreError> {
        let result = self
            .session
            .query(
                "SELECT id, external_identity, email, simulation_count FROM users \
                 WHERE external_identity = ?",
                (external_identity,),
            )
            .await?;
        Ok(decode_rows(result, user_from_row)?.into_iter().next())
    }

    async fn create_user(&self, external_identity: &str, email: &str) -> Result<User, StoreError> {
        let user = User {
            id: Uuid::new_v4(),
            external_identity: external_identity.to_string(),
            email: email.to_string(),
            simulation_count: 0,
        };
        self.session
            .query(
                "INSERT INTO users (id, external_identity, email, simulation_count) \
                 VALUES (?, ?, ?, ?)",
                (user.id, &user.external_identity, &user.email, user.simulation_count),
            )
            .await?;
        Ok(user)
    }

    async fn set_simulation_count(&self, user_id: Uuid, count: i32) -> Result<(), StoreError> {
        self.session
            .query(
                "UPDATE users SET simulation_count = ? WHERE id = ?",
                (count, user_id),
            )
            .await?;
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
        self.session
            .query(
                format!(
                    "INSERT INTO simulations ({SIMULATION_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
                ),
                (
                    simulation.id,
                    simulation.user_id,
                    &simulation.idea_text,
                    &simulation.audience,
                    simulation.tweet_count,
                    simulation.status.as_str(),
                    cql_timestamp(now),
                    cql_timestamp(now),
                ),
            )
            .await?;
        Ok(simulation)
    }

    async fn get_simulation(&self, id: Uuid) -> Result<Option<Simulation>, StoreError> {
        let result = self
            .session
            .query(
                format!("SELECT {SIMULATION_COLUMNS} FROM simulations WHERE id = ?"),
                (id,),
            )
            .await?;
        Ok(decode_rows(result, simulation_from_row)?.into_iter().next())
    }

    async fn insert_tweets(&self, tweets: &[GeneratedTweet]) -> Result<(), StoreError> {
        if tweets.is_empty() {
            return Ok(());
        }

        // All rows share the simulation_id partition, so an unlogged batch
        // is still applied atomically.
        let mut batch = Batch::new(BatchType::Unlogged);
        let mut values = Vec::with_capacity(tweets.len());
        for tweet in tweets {
            batch.append_statement(
                format!(
                    "INSERT INTO generated_tweets ({TWEET_COLUMNS}) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
                )
                .as_str(),
            );
            values.push((
                tweet.id,
                tweet.simulation_id,
                tweet.author.as_str(),
                tweet.content.as_str(),
                tweet.sentiment.as_ref().map(|s| s.as_str()),
                tweet.is_reply,
                tweet.parent_tweet_id,
                tweet.order_index,
                cql_timestamp(tweet.created_at),
                tweet.engagement_score,
            ));
        }

        self.session.batch(&batch, values).await?;
        Ok(())
    }

    async fn list_tweets(&self, simulation_id: Uuid) -> Result<Vec<GeneratedTweet>, StoreError> {
        let result = self
            .session
            .query(
                format!("SELECT {TWEET_COLUMNS} FROM generated_tweets WHERE simulation_id = ?"),
                (simulation_id,),
            )
            .await?;
        // Clustering order is (order_index, id), so rows arrive sorted.
        decode_rows(result, tweet_from_row)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: SimulationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.session
            .query(
                "UPDATE simulations SET status = ?, updated_at = ? WHERE id = ?",
                (status.as_str(), cql_timestamp(updated_at), id),
            )
            .await?;
        Ok(())
    }

    async fn list_by_status(
        &self,
        status: SimulationStatus,
    ) -> Result<Vec<Simulation>, StoreError> {
        let result = self
            .session
            .query(
                format!("SELECT {SIMULATION_COLUMNS} FROM simulations WHERE status = ?"),
                (status.as_str(),),
            )
            .await?;
        decode_rows(result, simulation_from_row)
    }

    async fn fail_if_generating(
        &self,
        id: Uuid,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = self
            .session
            .query(
                "UPDATE simulations SET status = ?, updated_at = ? WHERE id = ? IF status = ?",
                (
                    SimulationStatus::Failed.as_str(),
                    cql_timestamp(updated_at),
                    id,
                    SimulationStatus::Generating.as_str(),
                ),
            )
            .await?;
        lwt_applied(result)
    }
}
