//! `/api/v1/prediction_sets`, the forecasts submitted by members.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use crate::client::Client;
use crate::cutoff;
use crate::error::{Error, Result};
use crate::request::{optional_id, require_page, Query};
use crate::response::decode_list;
use crate::types::{PredictionSet, PredictionSetList};

pub const PREDICTION_SETS_PATH: &str = "/api/v1/prediction_sets";

/// Stops [`PredictionSets::list_all`] from paging forever on a server that
/// keeps reporting more results.
pub const MAX_PAGES: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSetFilter {
    CommentsWithLinks,
    CommentsFollowing,
}

impl PredictionSetFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionSetFilter::CommentsWithLinks => "comments_with_links",
            PredictionSetFilter::CommentsFollowing => "comments_following",
        }
    }
}

impl FromStr for PredictionSetFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "comments_with_links" => Ok(PredictionSetFilter::CommentsWithLinks),
            "comments_following" => Ok(PredictionSetFilter::CommentsFollowing),
            _ => Err(Error::validation(format!(
                "unknown prediction set filter '{}' (comments_with_links, comments_following)",
                s
            ))),
        }
    }
}

impl fmt::Display for PredictionSetFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPredictionSets {
    pub question_id: Option<u64>,
    pub membership_id: Option<u64>,
    pub filter: Option<PredictionSetFilter>,
    pub page: Option<u32>,
    pub created_before: Option<String>,
    pub created_after: Option<String>,
    pub updated_before: Option<String>,
    pub updated_after: Option<String>,
    pub cutoff_date: Option<NaiveDate>,
}

impl ListPredictionSets {
    pub fn for_question(question_id: u64) -> Self {
        Self {
            question_id: Some(question_id),
            ..Default::default()
        }
    }

    pub fn query(&self, cutoff: NaiveDate) -> Result<Query> {
        let mut q = Query::new();
        q.push_opt("question_id", optional_id("question_id", self.question_id)?);
        q.push_opt("membership_id", optional_id("membership_id", self.membership_id)?);
        q.push_opt("filter", self.filter);
        q.push_opt("page", require_page(self.page)?);
        q.push_created_before(self.created_before.as_deref(), cutoff);
        q.push_opt("created_after", self.created_after.as_deref());
        q.push_opt("updated_before", self.updated_before.as_deref());
        q.push_opt("updated_after", self.updated_after.as_deref());
        Ok(q)
    }
}

pub struct PredictionSets<'a> {
    client: &'a Client,
}

impl<'a> PredictionSets<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// One page of forecasts created on or before the cutoff day.
    pub async fn list(&self, params: &ListPredictionSets) -> Result<PredictionSetList> {
        let cutoff = self.client.cutoff(params.cutoff_date);
        let query = params.query(cutoff)?;

        let value = self.client.get_json(PREDICTION_SETS_PATH, &query).await?;
        let (sets, has_more) = decode_list::<PredictionSet>(value, "prediction_sets")?;

        Ok(PredictionSetList {
            prediction_sets: cutoff::retain_visible(sets, cutoff),
            page: params.page.unwrap_or(1),
            has_more,
        })
    }

    /// Walks pages starting at `params.page` (or 1) until the server reports
    /// no more, and returns everything in one list.
    pub async fn list_all(&self, params: &ListPredictionSets) -> Result<PredictionSetList> {
        let first = params.page.unwrap_or(1);
        let mut params = params.clone();
        let mut all = Vec::new();

        for page in first..first.saturating_add(MAX_PAGES) {
            params.page = Some(page);
            let batch = self.list(&params).await?;
            all.extend(batch.prediction_sets);
            if !batch.has_more {
                return Ok(PredictionSetList {
                    prediction_sets: all,
                    page: first,
                    has_more: false,
                });
            }
        }

        log::warn!("stopped paging prediction sets after {} pages", MAX_PAGES);
        Ok(PredictionSetList {
            prediction_sets: all,
            page: first,
            has_more: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        cutoff::parse_date(s).unwrap()
    }

    #[test]
    fn for_question_sends_question_and_cutoff() {
        let q = ListPredictionSets::for_question(1001)
            .query(day("2025-02-01"))
            .unwrap();
        assert_eq!(q.keys(), vec!["question_id", "created_before"]);
        assert_eq!(q.get("question_id"), Some("1001"));
        assert_eq!(q.get("created_before"), Some("2025-02-01T23:59:59"));
    }

    #[test]
    fn all_params_present() {
        let params = ListPredictionSets {
            question_id: Some(1),
            membership_id: Some(100),
            filter: Some(PredictionSetFilter::CommentsWithLinks),
            page: Some(3),
            created_before: Some("2025-01-31T00:00:00".into()),
            created_after: Some("2025-01-01".into()),
            updated_before: Some("2025-02-01".into()),
            updated_after: Some("2025-01-15".into()),
            cutoff_date: None,
        };
        let q = params.query(day("2025-06-01")).unwrap();
        assert_eq!(
            q.keys(),
            vec![
                "question_id",
                "membership_id",
                "filter",
                "page",
                "created_before",
                "created_after",
                "updated_before",
                "updated_after"
            ]
        );
        assert_eq!(q.get("filter"), Some("comments_with_links"));
        assert_eq!(q.get("created_before"), Some("2025-01-31T00:00:00"));
    }

    #[test]
    fn zero_ids_rejected() {
        let params = ListPredictionSets {
            membership_id: Some(0),
            ..Default::default()
        };
        assert!(params.query(day("2025-06-01")).is_err());
    }

    #[test]
    fn filter_parsing() {
        assert_eq!(
            "comments_following".parse::<PredictionSetFilter>().unwrap(),
            PredictionSetFilter::CommentsFollowing
        );
        assert!("starred".parse::<PredictionSetFilter>().is_err());
    }
}
