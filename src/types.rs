//! Records returned by the API.
//!
//! These mirror the platform's JSON. Unknown fields are ignored and nearly
//! everything is optional because the API omits fields freely between
//! endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::cutoff::Dated;

/// `null` and a missing key both become an empty list.
fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A forecasting question.
///
/// `answers` come back in the platform's display order. Each
/// [`Answer::probability`] is the crowd aggregate *now*, even when the
/// question was fetched with a cutoff date; use
/// [`crate::backtest::crowd_probabilities`] for the value as of the cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u64,
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub site_id: Option<u64>,
    #[serde(default)]
    pub membership_id: Option<u64>,
    #[serde(default)]
    pub active: Option<bool>,
    /// active, rejected, voided, resolved, pending, pending_resolution
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub resolved: Option<bool>,
    #[serde(default)]
    pub binary: Option<bool>,
    #[serde(default)]
    pub exclusive: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub voided_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scoring_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scoring_end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub use_ordinal_scoring: Option<bool>,
    #[serde(default)]
    pub brier_score: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub resolution_notes: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub external_source: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub predictions_count: Option<u64>,
    #[serde(default)]
    pub comments_count: Option<u64>,
    #[serde(default)]
    pub answers_count: Option<u64>,
    #[serde(default)]
    pub prediction_sets_count: Option<u64>,
    #[serde(default)]
    pub predictors_count: Option<u64>,
    /// Tag payloads vary between endpoints (names or objects).
    #[serde(default, deserialize_with = "nullable_vec")]
    pub tags: Vec<serde_json::Value>,
    /// Present when listed with `include_tag_ids`.
    #[serde(default, deserialize_with = "nullable_vec")]
    pub tag_ids: Vec<u64>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub answers: Vec<Answer>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub clarifications: Vec<Clarification>,
}

impl Question {
    pub fn answer(&self, answer_id: u64) -> Option<&Answer> {
        self.answers.iter().find(|a| a.id == answer_id)
    }

    pub fn is_binary(&self) -> bool {
        self.binary.unwrap_or(self.answers.len() == 2)
    }
}

impl Dated for Question {
    fn visible_since(&self) -> Option<&DateTime<Utc>> {
        self.published_at.as_ref().or(self.created_at.as_ref())
    }
}

/// One answer option of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub question_id: Option<u64>,
    #[serde(default)]
    pub membership_id: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub binary: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub correctness_known_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    /// Current crowd probability, never historical.
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub probability_formatted: Option<String>,
    #[serde(default)]
    pub display_probability: Option<String>,
    #[serde(default)]
    pub normalized_probability: Option<f64>,
    #[serde(default)]
    pub predictions_count: Option<u64>,
    #[serde(default)]
    pub positions_count: Option<u64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clarification {
    pub id: u64,
    #[serde(default)]
    pub question_id: Option<u64>,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One forecaster's submission for a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSet {
    pub id: u64,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub membership_id: Option<u64>,
    #[serde(default)]
    pub membership_username: Option<String>,
    #[serde(default)]
    pub membership_avatar_url: Option<String>,
    #[serde(default)]
    pub question_id: Option<u64>,
    #[serde(default)]
    pub question_name: Option<String>,
    #[serde(default)]
    pub rationale: Option<String>,
    #[serde(default)]
    pub comment_id: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub predictions: Vec<Prediction>,
}

impl Dated for PredictionSet {
    fn visible_since(&self) -> Option<&DateTime<Utc>> {
        self.created_at.as_ref()
    }
}

/// Probability given to one answer inside a [`PredictionSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: u64,
    pub answer_id: u64,
    pub forecasted_probability: f64,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub answer_name: Option<String>,
    #[serde(default)]
    pub membership_id: Option<u64>,
    #[serde(default)]
    pub starting_probability: Option<f64>,
    #[serde(default)]
    pub final_probability: Option<f64>,
    #[serde(default)]
    pub filled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub made_after_correctness_known: Option<bool>,
    #[serde(default)]
    pub confidence_level: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub commentable_id: Option<u64>,
    #[serde(default)]
    pub commentable_type: Option<String>,
    #[serde(default)]
    pub comment_type: Option<String>,
    #[serde(default)]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub membership_id: Option<u64>,
    #[serde(default)]
    pub membership_username: Option<String>,
    #[serde(default)]
    pub membership_avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn body(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    pub fn author(&self) -> Option<&str> {
        self.membership_username.as_deref()
    }
}

impl Dated for Comment {
    fn visible_since(&self) -> Option<&DateTime<Utc>> {
        self.created_at.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionList {
    pub questions: Vec<Question>,
    pub page: u32,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSetList {
    pub prediction_sets: Vec<PredictionSet>,
    pub page: u32,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentList {
    pub comments: Vec<Comment>,
    pub page: u32,
    pub has_more: bool,
}
