use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{checked_rating, guarded_ratio, EngineError, EngineResult};
use crate::models::{AggregateMetrics, ReviewRecord};

/// Trend windowing as it appears in configuration. Exactly one policy
/// must be chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrendConfig {
    pub window_size_reviews: Option<usize>,
    pub window_duration_days: Option<i64>,
}

impl TrendConfig {
    pub fn window(&self) -> EngineResult<TrendWindow> {
        match (self.window_size_reviews, self.window_duration_days) {
            (Some(_), Some(_)) => Err(EngineError::ConfigConflict(
                "window_size_reviews and window_duration_days are mutually exclusive".to_string(),
            )),
            (None, None) => Err(EngineError::ConfigConflict(
                "one of window_size_reviews or window_duration_days is required".to_string(),
            )),
            (Some(0), None) => Err(EngineError::ConfigConflict(
                "window_size_reviews must be at least 1".to_string(),
            )),
            (None, Some(days)) if days < 1 => Err(EngineError::ConfigConflict(
                "window_duration_days must be at least 1".to_string(),
            )),
            (Some(size), None) => Ok(TrendWindow::Reviews(size)),
            (None, Some(days)) => Ok(TrendWindow::Days(days)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendWindow {
    /// Newest `k` reviews against the `k` before them.
    Reviews(usize),
    /// `(as_of - n, as_of]` against `(as_of - 2n, as_of - n]`.
    Days(i64),
}

/// Average of a review set. Never reorders or touches the input; ratings
/// are summed in sorted order so permuted input gives the same bits.
pub fn average_rating(reviews: &[&ReviewRecord]) -> EngineResult<f64> {
    let mut ratings = Vec::with_capacity(reviews.len());
    for review in reviews {
        ratings.push(checked_rating(review)?);
    }
    ratings.sort_by(f64::total_cmp);
    let total: f64 = ratings.iter().sum();
    Ok(guarded_ratio(total, reviews.len() as f64))
}

pub fn summarize(reviews: &[ReviewRecord]) -> EngineResult<AggregateMetrics> {
    let refs: Vec<&ReviewRecord> = reviews.iter().collect();
    Ok(AggregateMetrics {
        total_reviews: reviews.len(),
        average_rating: average_rating(&refs)?,
        trend: 0.0,
    })
}

/// Summary metrics plus the period-over-period trend. `as_of` anchors
/// duration windows and is ignored for review-count windows.
pub fn summarize_with_trend(
    reviews: &[ReviewRecord],
    config: &TrendConfig,
    as_of: NaiveDate,
) -> EngineResult<AggregateMetrics> {
    let window = config.window()?;
    let mut metrics = summarize(reviews)?;
    metrics.trend = trend(reviews, window, as_of)?;
    Ok(metrics)
}

pub fn trend(reviews: &[ReviewRecord], window: TrendWindow, as_of: NaiveDate) -> EngineResult<f64> {
    let (recent, prior) = split_windows(reviews, window, as_of)?;
    if recent.is_empty() || prior.is_empty() {
        debug!(
            recent = recent.len(),
            prior = prior.len(),
            "not enough reviews for a trend"
        );
        return Ok(0.0);
    }

    let recent_average = average_rating(&recent)?;
    let prior_average = average_rating(&prior)?;
    let change = guarded_ratio(recent_average - prior_average, prior_average);
    debug!(recent_average, prior_average, change, ?window, "computed rating trend");
    Ok(change)
}

fn split_windows<'a>(
    reviews: &'a [ReviewRecord],
    window: TrendWindow,
    as_of: NaiveDate,
) -> EngineResult<(Vec<&'a ReviewRecord>, Vec<&'a ReviewRecord>)> {
    let mut dated = Vec::with_capacity(reviews.len());
    for review in reviews {
        let date = review
            .review_date
            .ok_or_else(|| EngineError::invalid(review, "missing review date"))?;
        dated.push((date, review));
    }

    match window {
        TrendWindow::Reviews(size) => {
            // Stable sort keeps input order among equal timestamps.
            dated.sort_by(|a, b| b.0.sort_key().cmp(&a.0.sort_key()));
            let mut newest = dated.into_iter().map(|(_, review)| review);
            let recent: Vec<&ReviewRecord> = newest.by_ref().take(size).collect();
            let prior: Vec<&ReviewRecord> = newest.take(size).collect();
            // A partial prior window is not comparable.
            if prior.len() < size {
                return Ok((recent, Vec::new()));
            }
            Ok((recent, prior))
        }
        TrendWindow::Days(days) => {
            let span = Duration::try_days(days).ok_or_else(|| out_of_range(days))?;
            let recent_start = as_of
                .checked_sub_signed(span)
                .ok_or_else(|| out_of_range(days))?;
            let prior_start = recent_start
                .checked_sub_signed(span)
                .ok_or_else(|| out_of_range(days))?;
            let mut recent = Vec::new();
            let mut prior = Vec::new();
            for (date, review) in dated {
                let day = date.calendar_date();
                if day > recent_start && day <= as_of {
                    recent.push(review);
                } else if day > prior_start && day <= recent_start {
                    prior.push(review);
                }
            }
            Ok((recent, prior))
        }
    }
}

fn out_of_range(days: i64) -> EngineError {
    EngineError::ConfigConflict(format!(
        "window_duration_days = {days} reaches outside the supported date range"
    ))
}
