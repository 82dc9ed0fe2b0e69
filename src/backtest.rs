//! Rebuilding crowd forecasts as they stood on a past date.
//!
//! [`crate::types::Answer::probability`] is always today's aggregate. To
//! know what the crowd believed at a cutoff, fetch the question's prediction
//! sets and average each forecaster's latest submission made on or before
//! that day.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};

use crate::client::Client;
use crate::cutoff;
use crate::error::Result;
use crate::prediction_sets::ListPredictionSets;
use crate::request::require_id;
use crate::types::PredictionSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Forecaster {
    Member(u64),
    // sets without a membership id each count as their own forecaster
    Anonymous(u64),
}

fn forecaster(set: &PredictionSet) -> Forecaster {
    match set.membership_id {
        Some(id) => Forecaster::Member(id),
        None => Forecaster::Anonymous(set.id),
    }
}

/// Latest dated prediction set per forecaster as of the cutoff.
///
/// Sets without `created_at` cannot be placed before or after the cutoff and
/// are skipped. Ties on the timestamp go to the higher set id.
pub fn latest_per_forecaster(sets: &[PredictionSet], cutoff: NaiveDate) -> Vec<&PredictionSet> {
    let limit = cutoff::end_of_day(cutoff);
    let mut latest: HashMap<Forecaster, (&DateTime<Utc>, &PredictionSet)> = HashMap::new();

    for set in sets {
        let Some(created) = set.created_at.as_ref() else {
            continue;
        };
        if created.naive_utc() > limit {
            continue;
        }
        latest
            .entry(forecaster(set))
            .and_modify(|(at, current)| {
                if (created, set.id) > (*at, current.id) {
                    *at = created;
                    *current = set;
                }
            })
            .or_insert((created, set));
    }

    let mut out: Vec<&PredictionSet> = latest.into_values().map(|(_, s)| s).collect();
    out.sort_by_key(|s| s.id);
    out
}

/// Mean forecasted probability per answer id across forecasters' latest
/// sets at the cutoff. Answers nobody forecast are absent.
pub fn crowd_probabilities(sets: &[PredictionSet], cutoff: NaiveDate) -> BTreeMap<u64, f64> {
    let mut sums: BTreeMap<u64, (f64, u32)> = BTreeMap::new();
    for set in latest_per_forecaster(sets, cutoff) {
        for prediction in &set.predictions {
            let entry = sums.entry(prediction.answer_id).or_insert((0.0, 0));
            entry.0 += prediction.forecasted_probability;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(answer, (sum, n))| (answer, sum / f64::from(n)))
        .collect()
}

impl Client {
    /// Fetches every prediction set of `question_id` visible at the cutoff
    /// and reduces them with [`crowd_probabilities`].
    pub async fn crowd_as_of(
        &self,
        question_id: u64,
        cutoff_date: Option<NaiveDate>,
    ) -> Result<BTreeMap<u64, f64>> {
        let question_id = require_id("question_id", question_id)?;
        let cutoff = self.cutoff(cutoff_date);
        let params = ListPredictionSets {
            question_id: Some(question_id),
            cutoff_date: Some(cutoff),
            ..Default::default()
        };
        let sets = self.prediction_sets().list_all(&params).await?;
        log::debug!(
            "question {}: {} prediction sets before {}",
            question_id,
            sets.prediction_sets.len(),
            cutoff.format(cutoff::DATE_FORMAT)
        );
        Ok(crowd_probabilities(&sets.prediction_sets, cutoff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(id: u64, member: Option<u64>, created: Option<&str>, probs: &[(u64, f64)]) -> PredictionSet {
        let predictions: Vec<_> = probs
            .iter()
            .enumerate()
            .map(|(i, (answer, p))| {
                json!({"id": id * 10 + i as u64, "answer_id": answer, "forecasted_probability": p})
            })
            .collect();
        serde_json::from_value(json!({
            "id": id,
            "membership_id": member,
            "created_at": created,
            "predictions": predictions
        }))
        .unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        cutoff::parse_date(s).unwrap()
    }

    #[test]
    fn latest_set_per_member_wins() {
        let sets = vec![
            set(1, Some(100), Some("2025-01-10T00:00:00Z"), &[(1, 0.2), (2, 0.8)]),
            set(2, Some(100), Some("2025-01-20T00:00:00Z"), &[(1, 0.6), (2, 0.4)]),
            set(3, Some(200), Some("2025-01-15T00:00:00Z"), &[(1, 0.4), (2, 0.6)]),
        ];
        let crowd = crowd_probabilities(&sets, day("2025-02-01"));
        assert!((crowd[&1] - 0.5).abs() < 1e-9);
        assert!((crowd[&2] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn sets_after_cutoff_are_ignored() {
        let sets = vec![
            set(1, Some(100), Some("2025-01-10T00:00:00Z"), &[(1, 0.2)]),
            set(2, Some(100), Some("2025-03-01T00:00:00Z"), &[(1, 0.9)]),
        ];
        let crowd = crowd_probabilities(&sets, day("2025-02-01"));
        assert!((crowd[&1] - 0.2).abs() < 1e-9);

        let latest = latest_per_forecaster(&sets, day("2025-02-01"));
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].id, 1);
    }

    #[test]
    fn cutoff_day_is_inclusive() {
        let sets = vec![set(1, Some(1), Some("2025-02-01T23:59:59Z"), &[(7, 0.3)])];
        assert_eq!(crowd_probabilities(&sets, day("2025-02-01")).len(), 1);
        assert!(crowd_probabilities(&sets, day("2025-01-31")).is_empty());
    }

    #[test]
    fn undated_sets_are_skipped() {
        let sets = vec![set(1, Some(1), None, &[(7, 0.3)])];
        assert!(crowd_probabilities(&sets, day("2030-01-01")).is_empty());
    }

    #[test]
    fn anonymous_sets_count_separately() {
        let sets = vec![
            set(1, None, Some("2025-01-01T00:00:00Z"), &[(1, 0.1)]),
            set(2, None, Some("2025-01-02T00:00:00Z"), &[(1, 0.3)]),
        ];
        let crowd = crowd_probabilities(&sets, day("2025-02-01"));
        assert!((crowd[&1] - 0.2).abs() < 1e-9);
    }

    #[test]
    fn timestamp_tie_goes_to_higher_id() {
        let sets = vec![
            set(5, Some(1), Some("2025-01-01T00:00:00Z"), &[(1, 0.9)]),
            set(4, Some(1), Some("2025-01-01T00:00:00Z"), &[(1, 0.1)]),
        ];
        let latest = latest_per_forecaster(&sets, day("2025-02-01"));
        assert_eq!(latest[0].id, 5);
    }
}
