//! Synchronous wrapper around [`crate::Client`].
//!
//! Each call blocks the current thread on a private single-threaded runtime.
//! Do not use it from inside an async context; call the async client there.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tokio::runtime::{Builder, Runtime};

use crate::comments::ListComments;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::prediction_sets::ListPredictionSets;
use crate::questions::ListQuestions;
use crate::types::{CommentList, PredictionSetList, Question, QuestionList};

pub struct Client {
    inner: crate::Client,
    runtime: Runtime,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::config(format!("failed to start runtime: {}", e)))?;
        let inner = {
            let _guard = runtime.enter();
            crate::Client::new(config)?
        };
        Ok(Self { inner, runtime })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn base_url(&self) -> &str {
        self.inner.base_url()
    }

    pub fn questions(&self) -> Questions<'_> {
        Questions { client: self }
    }

    pub fn prediction_sets(&self) -> PredictionSets<'_> {
        PredictionSets { client: self }
    }

    pub fn comments(&self) -> Comments<'_> {
        Comments { client: self }
    }

    pub fn crowd_as_of(
        &self,
        question_id: u64,
        cutoff_date: Option<NaiveDate>,
    ) -> Result<BTreeMap<u64, f64>> {
        self.runtime
            .block_on(self.inner.crowd_as_of(question_id, cutoff_date))
    }
}

pub struct Questions<'a> {
    client: &'a Client,
}

impl Questions<'_> {
    pub fn list(&self, params: &ListQuestions) -> Result<QuestionList> {
        let c = self.client;
        c.runtime.block_on(c.inner.questions().list(params))
    }

    pub fn get(
        &self,
        question_id: u64,
        cutoff_date: Option<NaiveDate>,
    ) -> Result<Option<Question>> {
        let c = self.client;
        c.runtime
            .block_on(c.inner.questions().get(question_id, cutoff_date))
    }
}

pub struct PredictionSets<'a> {
    client: &'a Client,
}

impl PredictionSets<'_> {
    pub fn list(&self, params: &ListPredictionSets) -> Result<PredictionSetList> {
        let c = self.client;
        c.runtime.block_on(c.inner.prediction_sets().list(params))
    }

    pub fn list_all(&self, params: &ListPredictionSets) -> Result<PredictionSetList> {
        let c = self.client;
        c.runtime
            .block_on(c.inner.prediction_sets().list_all(params))
    }
}

pub struct Comments<'a> {
    client: &'a Client,
}

impl Comments<'_> {
    pub fn list(&self, params: &ListComments) -> Result<CommentList> {
        let c = self.client;
        c.runtime.block_on(c.inner.comments().list(params))
    }
}
