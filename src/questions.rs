//! `/api/v1/questions`

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use crate::client::Client;
use crate::cutoff::{self, DATE_FORMAT};
use crate::error::{Error, Result};
use crate::request::{require_id, require_page, Query};
use crate::response::{decode, decode_list};
use crate::types::{Question, QuestionList};

pub const QUESTIONS_PATH: &str = "/api/v1/questions";

/// `status` filter. Leaving it unset lists active questions only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStatus {
    Closed,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionSort {
    PublishedAt,
    EndsAt,
    ResolvedAt,
    PredictionSetsCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionFilter {
    Starred,
    Featured,
}

impl QuestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionStatus::Closed => "closed",
            QuestionStatus::All => "all",
        }
    }
}

impl QuestionSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionSort::PublishedAt => "published_at",
            QuestionSort::EndsAt => "ends_at",
            QuestionSort::ResolvedAt => "resolved_at",
            QuestionSort::PredictionSetsCount => "prediction_sets_count",
        }
    }
}

impl QuestionFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionFilter::Starred => "starred",
            QuestionFilter::Featured => "featured",
        }
    }
}

impl FromStr for QuestionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "closed" => Ok(QuestionStatus::Closed),
            "all" => Ok(QuestionStatus::All),
            _ => Err(Error::validation(format!(
                "unknown question status '{}' (closed, all)",
                s
            ))),
        }
    }
}

impl FromStr for QuestionSort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "published_at" => Ok(QuestionSort::PublishedAt),
            "ends_at" => Ok(QuestionSort::EndsAt),
            "resolved_at" => Ok(QuestionSort::ResolvedAt),
            "prediction_sets_count" => Ok(QuestionSort::PredictionSetsCount),
            _ => Err(Error::validation(format!(
                "unknown sort '{}' (published_at, ends_at, resolved_at, prediction_sets_count)",
                s
            ))),
        }
    }
}

impl FromStr for QuestionFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "starred" => Ok(QuestionFilter::Starred),
            "featured" => Ok(QuestionFilter::Featured),
            _ => Err(Error::validation(format!(
                "unknown question filter '{}' (starred, featured)",
                s
            ))),
        }
    }
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for QuestionSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for QuestionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for [`Questions::list`]. Every field left at its default is
/// omitted from the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuestions {
    pub status: Option<QuestionStatus>,
    pub tags: Vec<String>,
    pub challenges: Vec<u64>,
    pub sort: Option<QuestionSort>,
    pub filter: Option<QuestionFilter>,
    pub ids: Vec<u64>,
    pub page: Option<u32>,
    /// ISO 8601; replaces the bound derived from `cutoff_date`.
    pub created_before: Option<String>,
    pub created_after: Option<String>,
    pub updated_before: Option<String>,
    pub updated_after: Option<String>,
    pub include_tag_ids: Option<bool>,
    /// Defaults to today.
    pub cutoff_date: Option<NaiveDate>,
}

impl ListQuestions {
    pub fn query(&self, cutoff: NaiveDate) -> Result<Query> {
        let mut q = Query::new();
        q.push_opt("status", self.status);
        q.push_list("tags", &self.tags);
        q.push_list("challenges", &self.challenges);
        q.push_opt("sort", self.sort);
        q.push_opt("filter", self.filter);
        q.push_list("ids", &self.ids);
        q.push_opt("page", require_page(self.page)?);
        q.push_created_before(self.created_before.as_deref(), cutoff);
        q.push_opt("created_after", self.created_after.as_deref());
        q.push_opt("updated_before", self.updated_before.as_deref());
        q.push_opt("updated_after", self.updated_after.as_deref());
        q.push_opt("include_tag_ids", self.include_tag_ids);
        Ok(q)
    }
}

pub struct Questions<'a> {
    client: &'a Client,
}

impl<'a> Questions<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Lists questions as of the cutoff date.
    ///
    /// Questions published (or, lacking that, created) after the end of the
    /// cutoff day are dropped even if the server returned them.
    pub async fn list(&self, params: &ListQuestions) -> Result<QuestionList> {
        let cutoff = self.client.cutoff(params.cutoff_date);
        let query = params.query(cutoff)?;

        let value = self.client.get_json(QUESTIONS_PATH, &query).await?;
        let (questions, has_more) = decode_list::<Question>(value, "questions")?;

        Ok(QuestionList {
            questions: cutoff::retain_visible(questions, cutoff),
            page: params.page.unwrap_or(1),
            has_more,
        })
    }

    /// Fetches one question as of the cutoff.
    ///
    /// `Ok(None)` when the question was published (or, lacking that, created)
    /// after the end of the cutoff day. A visible question is the live record,
    /// so answer probabilities are current values.
    pub async fn get(
        &self,
        question_id: u64,
        cutoff_date: Option<NaiveDate>,
    ) -> Result<Option<Question>> {
        let question_id = require_id("question_id", question_id)?;
        let cutoff = self.client.cutoff(cutoff_date);
        log::debug!(
            "fetching question {} as of {}",
            question_id,
            cutoff.format(DATE_FORMAT)
        );

        let mut query = Query::new();
        query.push_created_before(None, cutoff);

        let path = format!("{}/{}", QUESTIONS_PATH, question_id);
        let value = self.client.get_json(&path, &query).await?;
        let question: Question = decode(value)?;
        if !cutoff::is_visible(&question, cutoff) {
            log::debug!(
                "question {} not yet published on {}",
                question_id,
                cutoff.format(DATE_FORMAT)
            );
            return Ok(None);
        }
        Ok(Some(question))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        cutoff::parse_date(s).unwrap()
    }

    #[test]
    fn default_params_only_send_cutoff() {
        let q = ListQuestions::default().query(day("2025-06-01")).unwrap();
        assert_eq!(q.keys(), vec!["created_before"]);
        assert_eq!(q.get("created_before"), Some("2025-06-01T23:59:59"));
    }

    #[test]
    fn every_param_maps_to_its_key() {
        let params = ListQuestions {
            status: Some(QuestionStatus::Closed),
            tags: vec!["geopolitics".into(), "ai".into()],
            challenges: vec![3],
            sort: Some(QuestionSort::EndsAt),
            filter: Some(QuestionFilter::Featured),
            ids: vec![1001, 1002],
            page: Some(2),
            created_before: None,
            created_after: Some("2024-01-01".into()),
            updated_before: Some("2025-05-01".into()),
            updated_after: Some("2025-04-01".into()),
            include_tag_ids: Some(true),
            cutoff_date: None,
        };
        let q = params.query(day("2025-06-01")).unwrap();

        assert_eq!(q.get("status"), Some("closed"));
        assert_eq!(q.get("tags"), Some("geopolitics,ai"));
        assert_eq!(q.get("challenges"), Some("3"));
        assert_eq!(q.get("sort"), Some("ends_at"));
        assert_eq!(q.get("filter"), Some("featured"));
        assert_eq!(q.get("ids"), Some("1001,1002"));
        assert_eq!(q.get("page"), Some("2"));
        assert_eq!(q.get("created_after"), Some("2024-01-01"));
        assert_eq!(q.get("updated_before"), Some("2025-05-01"));
        assert_eq!(q.get("updated_after"), Some("2025-04-01"));
        assert_eq!(q.get("include_tag_ids"), Some("true"));
        assert_eq!(q.get("created_before"), Some("2025-06-01T23:59:59"));
    }

    #[test]
    fn explicit_created_before_is_kept() {
        let params = ListQuestions {
            created_before: Some("2025-01-01T00:00:00".into()),
            ..Default::default()
        };
        let q = params.query(day("2025-06-01")).unwrap();
        assert_eq!(q.get("created_before"), Some("2025-01-01T00:00:00"));
    }

    #[test]
    fn page_zero_is_rejected() {
        let params = ListQuestions {
            page: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            params.query(day("2025-06-01")),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn enum_strings_round_trip() {
        for s in ["closed", "all"] {
            assert_eq!(s.parse::<QuestionStatus>().unwrap().as_str(), s);
        }
        for s in ["published_at", "ends_at", "resolved_at", "prediction_sets_count"] {
            assert_eq!(s.parse::<QuestionSort>().unwrap().to_string(), s);
        }
        for s in ["starred", "featured"] {
            assert_eq!(s.parse::<QuestionFilter>().unwrap().to_string(), s);
        }
        assert!("active".parse::<QuestionStatus>().is_err());
    }
}
