use std::collections::HashMap;

use tracing::debug;

use crate::error::{checked_rating, guarded_ratio, EngineError, EngineResult};
use crate::models::{MonthBucket, PeriodKey, ReviewRecord};

/// Groups reviews into calendar-month buckets, oldest month first.
///
/// Fails on the first record without a review date or with a non-finite
/// rating; no partial result is returned.
pub fn bucket_by_month(reviews: &[ReviewRecord]) -> EngineResult<Vec<MonthBucket>> {
    let mut ratings: HashMap<PeriodKey, Vec<f64>> = HashMap::new();

    for review in reviews {
        let date = review
            .review_date
            .ok_or_else(|| EngineError::invalid(review, "missing review date"))?;
        let rating = checked_rating(review)?;
        ratings.entry(date.period()).or_default().push(rating);
    }

    let mut buckets: Vec<MonthBucket> = ratings
        .into_iter()
        .map(|(period, mut values)| {
            // Summing in sorted order makes the total independent of input order.
            values.sort_by(f64::total_cmp);
            let count = values.len();
            let total_rating: f64 = values.iter().sum();
            MonthBucket {
                period,
                count,
                total_rating,
                average_rating: guarded_ratio(total_rating, count as f64),
            }
        })
        .collect();

    buckets.sort_by_key(|bucket| bucket.period);
    debug!(reviews = reviews.len(), buckets = buckets.len(), "bucketed reviews by month");
    Ok(buckets)
}
