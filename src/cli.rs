use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::time::Duration;

use crate::auth::Auth;
use crate::comments::ListComments;
use crate::config::{self, ClientConfig};
use crate::cutoff;
use crate::output::{format_probability, page_summary, print_json};
use crate::prediction_sets::{ListPredictionSets, PredictionSetFilter};
use crate::questions::{ListQuestions, QuestionFilter, QuestionSort, QuestionStatus};
use crate::types::Question;
use crate::Client;

/// Query the RAND Forecasting Initiative API, optionally as of a past date
///
/// Examples:
///   # Active questions as of today
///   rfi questions list
///
///   # Closed questions tagged "ai", as visible on 2025-06-01
///   rfi questions list --status closed --tag ai --cutoff-date 2025-06-01
///
///   # One question
///   rfi questions get 1234
///
///   # Forecasts on a question
///   rfi forecasts list --question 1234
///
///   # Crowd probabilities rebuilt for a past date
///   rfi crowd 1234 --cutoff-date 2025-02-01
#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Cli {
    #[clap(flatten)]
    pub global: GlobalArgs,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Account email
    #[arg(long, env = config::ENV_EMAIL, global = true)]
    pub email: Option<String>,

    /// Account password
    #[arg(long, env = config::ENV_PASSWORD, hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Bearer token to use before exchanging credentials
    #[arg(long, env = config::ENV_TOKEN, hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Authentication: email:password or bearer:TOKEN
    #[arg(short = 'a', long = "auth", value_parser = parse_auth, global = true)]
    pub auth: Option<Auth>,

    /// API root
    #[arg(long, env = config::ENV_BASE_URL, default_value = config::DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Request timeout in seconds
    #[arg(long = "timeout", default_value = "60", global = true)]
    pub timeout: u64,

    /// Print compact JSON without highlighting
    #[arg(long, global = true)]
    pub raw: bool,

    /// Print timing after the command finishes
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Forecasting questions
    #[command(subcommand)]
    Questions(QuestionsCommand),

    /// Prediction sets (forecasts)
    #[command(subcommand)]
    Forecasts(ForecastsCommand),

    /// Comments
    #[command(subcommand)]
    Comments(CommentsCommand),

    /// Crowd probabilities rebuilt from forecasts made before the cutoff
    Crowd(CrowdArgs),
}

#[derive(Subcommand, Debug)]
pub enum QuestionsCommand {
    /// List questions
    List(QuestionListArgs),

    /// Show one question
    Get {
        #[arg(value_name = "QUESTION_ID")]
        id: u64,

        #[arg(long, value_parser = parse_date)]
        cutoff_date: Option<NaiveDate>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ForecastsCommand {
    /// List prediction sets
    List(ForecastListArgs),
}

#[derive(Subcommand, Debug)]
pub enum CommentsCommand {
    /// List comments
    List(CommentListArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct QuestionListArgs {
    /// closed or all (default: active only)
    #[arg(long, value_parser = parse_status)]
    pub status: Option<QuestionStatus>,

    /// Tag to filter by, repeatable
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Challenge id, repeatable
    #[arg(long = "challenge")]
    pub challenges: Vec<u64>,

    /// published_at, ends_at, resolved_at or prediction_sets_count
    #[arg(long, value_parser = parse_sort)]
    pub sort: Option<QuestionSort>,

    /// starred or featured
    #[arg(long, value_parser = parse_question_filter)]
    pub filter: Option<QuestionFilter>,

    /// Question id, repeatable
    #[arg(long = "id")]
    pub ids: Vec<u64>,

    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long)]
    pub created_before: Option<String>,

    #[arg(long)]
    pub created_after: Option<String>,

    #[arg(long)]
    pub updated_before: Option<String>,

    #[arg(long)]
    pub updated_after: Option<String>,

    #[arg(long)]
    pub include_tag_ids: bool,

    /// Answer as of this day (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub cutoff_date: Option<NaiveDate>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ForecastListArgs {
    #[arg(long = "question")]
    pub question_id: Option<u64>,

    #[arg(long = "member")]
    pub membership_id: Option<u64>,

    /// comments_with_links or comments_following
    #[arg(long, value_parser = parse_forecast_filter)]
    pub filter: Option<PredictionSetFilter>,

    #[arg(long)]
    pub page: Option<u32>,

    /// Follow pages until the last one
    #[arg(long, conflicts_with = "page")]
    pub all: bool,

    #[arg(long)]
    pub created_before: Option<String>,

    #[arg(long)]
    pub created_after: Option<String>,

    #[arg(long)]
    pub updated_before: Option<String>,

    #[arg(long)]
    pub updated_after: Option<String>,

    #[arg(long, value_parser = parse_date)]
    pub cutoff_date: Option<NaiveDate>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CommentListArgs {
    /// Shorthand for --commentable-id N --commentable-type Forecast::Question
    #[arg(long = "question", conflicts_with_all = ["commentable_id", "commentable_type"])]
    pub question_id: Option<u64>,

    #[arg(long)]
    pub commentable_id: Option<u64>,

    #[arg(long)]
    pub commentable_type: Option<String>,

    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long)]
    pub created_before: Option<String>,

    #[arg(long)]
    pub created_after: Option<String>,

    #[arg(long, value_parser = parse_date)]
    pub cutoff_date: Option<NaiveDate>,
}

#[derive(Args, Debug, Clone)]
pub struct CrowdArgs {
    #[arg(value_name = "QUESTION_ID")]
    pub question_id: u64,

    #[arg(long, value_parser = parse_date)]
    pub cutoff_date: Option<NaiveDate>,
}

impl From<&QuestionListArgs> for ListQuestions {
    fn from(args: &QuestionListArgs) -> Self {
        ListQuestions {
            status: args.status,
            tags: args.tags.clone(),
            challenges: args.challenges.clone(),
            sort: args.sort,
            filter: args.filter,
            ids: args.ids.clone(),
            page: args.page,
            created_before: args.created_before.clone(),
            created_after: args.created_after.clone(),
            updated_before: args.updated_before.clone(),
            updated_after: args.updated_after.clone(),
            // a bare flag can only say "yes"; absent means not sent
            include_tag_ids: args.include_tag_ids.then_some(true),
            cutoff_date: args.cutoff_date,
        }
    }
}

impl From<&ForecastListArgs> for ListPredictionSets {
    fn from(args: &ForecastListArgs) -> Self {
        ListPredictionSets {
            question_id: args.question_id,
            membership_id: args.membership_id,
            filter: args.filter,
            page: args.page,
            created_before: args.created_before.clone(),
            created_after: args.created_after.clone(),
            updated_before: args.updated_before.clone(),
            updated_after: args.updated_after.clone(),
            cutoff_date: args.cutoff_date,
        }
    }
}

impl From<&CommentListArgs> for ListComments {
    fn from(args: &CommentListArgs) -> Self {
        let base = match args.question_id {
            Some(id) => ListComments::for_question(id),
            None => ListComments {
                commentable_id: args.commentable_id,
                commentable_type: args.commentable_type.clone(),
                ..Default::default()
            },
        };
        ListComments {
            page: args.page,
            created_before: args.created_before.clone(),
            created_after: args.created_after.clone(),
            cutoff_date: args.cutoff_date,
            ..base
        }
    }
}

impl GlobalArgs {
    /// Flags over environment; `--auth` over `--email/--password/--token`.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let cutoff_override = config::get_env(config::ENV_CUTOFF_DATE)
            .map(|s| cutoff::parse_date(&s))
            .transpose()?;

        let mut cfg = ClientConfig::new()
            .base_url(self.base_url.clone())
            .timeout(Duration::from_secs(self.timeout))
            .cutoff_override(cutoff_override);

        if let (Some(email), Some(password)) = (&self.email, &self.password) {
            cfg = cfg.credentials(email.clone(), password.clone());
        }
        if let Some(token) = &self.token {
            cfg = cfg.access_token(token.clone());
        }
        if let Some(auth) = &self.auth {
            cfg = cfg.auth(auth.clone());
        }
        Ok(cfg)
    }
}

pub async fn execute(cli: &Cli, client: &Client) -> Result<()> {
    let raw = cli.global.raw;

    match &cli.command {
        Command::Questions(QuestionsCommand::List(args)) => {
            let list = client.questions().list(&args.into()).await?;
            print_json(&list.questions, raw)?;
            eprintln!(
                "{}",
                page_summary(list.questions.len(), "questions", list.page, list.has_more)
            );
        }
        Command::Questions(QuestionsCommand::Get { id, cutoff_date }) => {
            let question = visible_question(client, *id, *cutoff_date).await?;
            print_json(&question, raw)?;
            if !raw {
                for answer in &question.answers {
                    if let Some(p) = answer.probability {
                        eprintln!(
                            "  {} {} {}",
                            answer.name.cyan(),
                            format_probability(p).green(),
                            "(current)".dimmed()
                        );
                    }
                }
            }
        }
        Command::Forecasts(ForecastsCommand::List(args)) => {
            let params: ListPredictionSets = args.into();
            let list = if args.all {
                client.prediction_sets().list_all(&params).await?
            } else {
                client.prediction_sets().list(&params).await?
            };
            print_json(&list.prediction_sets, raw)?;
            eprintln!(
                "{}",
                page_summary(
                    list.prediction_sets.len(),
                    "prediction sets",
                    list.page,
                    list.has_more
                )
            );
        }
        Command::Comments(CommentsCommand::List(args)) => {
            let list = client.comments().list(&args.into()).await?;
            print_json(&list.comments, raw)?;
            eprintln!(
                "{}",
                page_summary(list.comments.len(), "comments", list.page, list.has_more)
            );
        }
        Command::Crowd(args) => {
            let question = visible_question(client, args.question_id, args.cutoff_date).await?;
            let crowd = client
                .crowd_as_of(args.question_id, args.cutoff_date)
                .await?;
            if raw {
                print_json(&crowd, true)?;
                return Ok(());
            }

            let cutoff = client.cutoff(args.cutoff_date);
            println!(
                "{} {}",
                question.name.bold(),
                format!("as of {}", cutoff.format(cutoff::DATE_FORMAT)).dimmed()
            );
            for answer in &question.answers {
                let then = crowd
                    .get(&answer.id)
                    .map(|p| format_probability(*p))
                    .unwrap_or_else(|| "-".to_string());
                let now = answer
                    .probability
                    .map(format_probability)
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  {:<30} {:>8}  {}",
                    answer.name.cyan(),
                    then.green().bold(),
                    format!("now {}", now).dimmed()
                );
            }
        }
    }
    Ok(())
}

async fn visible_question(
    client: &Client,
    id: u64,
    cutoff_date: Option<NaiveDate>,
) -> Result<Question> {
    client.questions().get(id, cutoff_date).await?.ok_or_else(|| {
        anyhow!(
            "question {} was not published as of {}",
            id,
            client.cutoff(cutoff_date).format(cutoff::DATE_FORMAT)
        )
    })
}

// ============================================================================
// Parse Function
// ============================================================================

fn parse_auth(s: &str) -> Result<Auth> {
    s.parse().map_err(|e| anyhow!("{}", e))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    cutoff::parse_date(s).context("expected YYYY-MM-DD")
}

fn parse_status(s: &str) -> Result<QuestionStatus> {
    Ok(s.parse()?)
}

fn parse_sort(s: &str) -> Result<QuestionSort> {
    Ok(s.parse()?)
}

fn parse_question_filter(s: &str) -> Result<QuestionFilter> {
    Ok(s.parse()?)
}

fn parse_forecast_filter(s: &str) -> Result<PredictionSetFilter> {
    Ok(s.parse()?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_questions_list_flags() {
        let cli = Cli::try_parse_from([
            "rfi",
            "questions",
            "list",
            "--status",
            "closed",
            "--tag",
            "ai",
            "--tag",
            "elections",
            "--page",
            "2",
            "--cutoff-date",
            "2025-06-01",
        ])
        .unwrap();

        match cli.command {
            Command::Questions(QuestionsCommand::List(args)) => {
                let params: ListQuestions = (&args).into();
                assert_eq!(params.status, Some(QuestionStatus::Closed));
                assert_eq!(params.tags, vec!["ai", "elections"]);
                assert_eq!(params.page, Some(2));
                assert_eq!(params.include_tag_ids, None);
                assert_eq!(params.cutoff_date, NaiveDate::from_ymd_opt(2025, 6, 1));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parse_rejects_bad_values() {
        assert!(Cli::try_parse_from(["rfi", "questions", "list", "--status", "open"]).is_err());
        assert!(
            Cli::try_parse_from(["rfi", "questions", "get", "1", "--cutoff-date", "06/01/2025"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["rfi", "questions", "get", "abc"]).is_err());
    }

    #[test]
    fn comments_question_shorthand() {
        let cli = Cli::try_parse_from(["rfi", "comments", "list", "--question", "1001", "--page", "3"])
            .unwrap();
        match cli.command {
            Command::Comments(CommentsCommand::List(args)) => {
                let params: ListComments = (&args).into();
                assert_eq!(params.commentable_id, Some(1001));
                assert_eq!(params.commentable_type.as_deref(), Some("Forecast::Question"));
                assert_eq!(params.page, Some(3));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn forecasts_all_conflicts_with_page() {
        assert!(
            Cli::try_parse_from(["rfi", "forecasts", "list", "--all", "--page", "2"]).is_err()
        );
    }

    #[test]
    fn auth_flag_feeds_config() {
        let cli = Cli::try_parse_from([
            "rfi",
            "--auth",
            "bearer:tok",
            "--base-url",
            "https://custom.example.com",
            "crowd",
            "7",
        ])
        .unwrap();
        let cfg = cli.global.client_config().unwrap();
        assert_eq!(cfg.access_token.as_deref(), Some("tok"));
        assert_eq!(cfg.base_url, "https://custom.example.com");
    }
}
