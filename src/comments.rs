//! `/api/v1/comments`

use chrono::NaiveDate;

use crate::client::Client;
use crate::cutoff;
use crate::error::Result;
use crate::request::{optional_id, require_page, Query};
use crate::response::decode_list;
use crate::types::{Comment, CommentList};

pub const COMMENTS_PATH: &str = "/api/v1/comments";

/// `commentable_type` of comments posted on a question.
pub const QUESTION_COMMENTABLE: &str = "Forecast::Question";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListComments {
    pub commentable_id: Option<u64>,
    pub commentable_type: Option<String>,
    pub page: Option<u32>,
    pub created_before: Option<String>,
    pub created_after: Option<String>,
    pub cutoff_date: Option<NaiveDate>,
}

impl ListComments {
    pub fn for_question(question_id: u64) -> Self {
        Self {
            commentable_id: Some(question_id),
            commentable_type: Some(QUESTION_COMMENTABLE.to_string()),
            ..Default::default()
        }
    }

    pub fn query(&self, cutoff: NaiveDate) -> Result<Query> {
        let mut q = Query::new();
        q.push_opt("commentable_id", optional_id("commentable_id", self.commentable_id)?);
        q.push_opt("commentable_type", self.commentable_type.as_deref());
        q.push_opt("page", require_page(self.page)?);
        q.push_created_before(self.created_before.as_deref(), cutoff);
        q.push_opt("created_after", self.created_after.as_deref());
        Ok(q)
    }
}

pub struct Comments<'a> {
    client: &'a Client,
}

impl<'a> Comments<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn list(&self, params: &ListComments) -> Result<CommentList> {
        let cutoff = self.client.cutoff(params.cutoff_date);
        let query = params.query(cutoff)?;

        let value = self.client.get_json(COMMENTS_PATH, &query).await?;
        let (comments, has_more) = decode_list::<Comment>(value, "comments")?;

        Ok(CommentList {
            comments: cutoff::retain_visible(comments, cutoff),
            page: params.page.unwrap_or(1),
            has_more,
        })
    }
}
