//! Client for the RAND Forecasting Initiative API.
//!
//! Reads questions, prediction sets and comments, and can answer every
//! listing as of a past cutoff date for backtesting.

pub mod auth;
pub mod backtest;
pub mod blocking;
pub mod cli;
pub mod client;
pub mod comments;
pub mod config;
pub mod cutoff;
pub mod error;
pub mod output;
pub mod prediction_sets;
pub mod questions;
pub mod request;
pub mod response;
pub mod types;

// Re-export commonly used types
pub use auth::{Auth, Credentials};
pub use backtest::crowd_probabilities;
pub use client::Client;
pub use comments::ListComments;
pub use config::ClientConfig;
pub use error::{ApiErrorKind, Error, Result};
pub use prediction_sets::{ListPredictionSets, PredictionSetFilter};
pub use questions::{ListQuestions, QuestionFilter, QuestionSort, QuestionStatus};
pub use types::{
    Answer, Clarification, Comment, CommentList, Prediction, PredictionSet, PredictionSetList,
    Question, QuestionList,
};
