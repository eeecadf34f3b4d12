use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub external_identity: String,
    pub email: String,
    pub simulation_count: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationStatus {
    Generating,
    Completed,
    Failed,
}

impl SimulationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimulationStatus::Generating => "generating",
            SimulationStatus::Completed => "completed",
            SimulationStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimulationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generating" => Ok(SimulationStatus::Generating),
            "completed" => Ok(SimulationStatus::Completed),
            "failed" => Ok(SimulationStatus::Failed),
            other => Err(format!("unknown simulation status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub idea_text: String,
    pub audience: String,
    pub tweet_count: i32,
    pub status: SimulationStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSimulation {
    pub user_id: Uuid,
    pub idea_text: String,
    pub audience: String,
    pub tweet_count: i32,
}

/// Coarse tone of a generated reaction.
///
/// The model is trusted to pick one of the three known labels; anything else
/// is kept verbatim in `Other` rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sentiment {
    Praise,
    Neutral,
    Worry,
    Other(String),
}

impl Sentiment {
    pub fn as_str(&self) -> &str {
        match self {
            Sentiment::Praise => "praise",
            Sentiment::Neutral => "neutral",
            Sentiment::Worry => "worry",
            Sentiment::Other(raw) => raw,
        }
    }
}

impl From<String> for Sentiment {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "praise" => Sentiment::Praise,
            "neutral" => Sentiment::Neutral,
            "worry" => Sentiment::Worry,
            _ => Sentiment::Other(raw),
        }
    }
}

impl From<Sentiment> for String {
    fn from(sentiment: Sentiment) -> Self {
        match sentiment {
            Sentiment::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// Absent and `null` both become an empty string.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One reaction as the model returned it, before it becomes a row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetDraft {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
}

/// Top-level object the model is told to emit.
#[derive(Debug, Deserialize)]
pub struct ReactionPayload {
    #[serde(default)]
    pub tweets: Option<Vec<TweetDraft>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedTweet {
    pub id: Uuid,
    pub simulation_id: Uuid,
    pub author: String,
    pub content: String,
    pub sentiment: Option<Sentiment>,
    pub is_reply: bool,
    pub parent_tweet_id: Option<Uuid>,
    pub order_index: i32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub engagement_score: i32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSimulationRequest {
    pub idea_text: Option<String>,
    pub audience: Option<String>,
    pub tweet_count: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSimulationResponse {
    pub simulation_id: Uuid,
    pub status: SimulationStatus,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SimulationDetail {
    pub simulation: Simulation,
    pub tweets: Vec<GeneratedTweet>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_sentiments_parse_to_variants() {
        let drafts: Vec<TweetDraft> = serde_json::from_str(
            r#"[{"author":"@a","text":"x","sentiment":"praise"},
                {"author":"@b","text":"y","sentiment":"worry"}]"#,
        )
        .unwrap();
        assert_eq!(drafts[0].sentiment, Some(Sentiment::Praise));
        assert_eq!(drafts[1].sentiment, Some(Sentiment::Worry));
    }

    #[test]
    fn unknown_sentiment_is_kept_verbatim() {
        let draft: TweetDraft =
            serde_json::from_str(r#"{"author":"@a","text":"x","sentiment":"ecstatic"}"#).unwrap();
        assert_eq!(draft.sentiment, Some(Sentiment::Other("ecstatic".into())));
        assert_eq!(
            serde_json::to_value(&draft).unwrap()["sentiment"],
            serde_json::json!("ecstatic")
        );
    }

    #[test]
    fn payload_without_tweets_key_decodes() {
        let payload: ReactionPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.tweets.is_none());

        let payload: ReactionPayload = serde_json::from_str(r#"{"tweets":null}"#).unwrap();
        assert!(payload.tweets.is_none());
    }

    #[test]
    fn draft_tolerates_missing_fields() {
        let draft: TweetDraft = serde_json::from_str(r#"{"text":"just text"}"#).unwrap();
        assert_eq!(draft.author, "");
        assert_eq!(draft.text, "just text");
        assert!(draft.sentiment.is_none());
    }

    #[test]
    fn draft_tolerates_null_fields() {
        let draft: TweetDraft =
            serde_json::from_str(r#"{"author":null,"text":null,"sentiment":null}"#).unwrap();
        assert_eq!(draft.author, "");
        assert_eq!(draft.text, "");
        assert!(draft.sentiment.is_none());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            SimulationStatus::Generating,
            SimulationStatus::Completed,
            SimulationStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<SimulationStatus>(), Ok(status));
        }
        assert!("pending".parse::<SimulationStatus>().is_err());
    }

    #[test]
    fn create_request_uses_camel_case() {
        let req: CreateSimulationRequest = serde_json::from_str(
            r#"{"ideaText":"idea","audience":"devs","tweetCount":25}"#,
        )
        .unwrap();
        assert_eq!(req.idea_text.as_deref(), Some("idea"));
        assert_eq!(req.tweet_count, Some(25));
    }
}
