use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineResult;
use crate::metrics;
use crate::models::{BusinessDetail, BusinessProfile, BusinessRankingEntry, ReviewRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RankingOrder {
    /// Display name ascending; the public directory default.
    #[default]
    Name,
    /// Highest average rating first.
    Rating,
    /// Most reviewed first.
    ReviewCount,
}

pub fn rank_entry(profile: &BusinessProfile) -> EngineResult<BusinessRankingEntry<'_>> {
    let summary = metrics::summarize(&profile.reviews)?;
    Ok(BusinessRankingEntry {
        profile,
        average_rating: summary.average_rating,
        total_reviews: summary.total_reviews,
    })
}

/// Attaches rating and count to every business and orders them. Nothing is
/// filtered out here; visibility is decided by whoever supplies the profiles.
pub fn rank_businesses(
    profiles: &[BusinessProfile],
    order: RankingOrder,
) -> EngineResult<Vec<BusinessRankingEntry<'_>>> {
    let mut entries = profiles
        .iter()
        .map(rank_entry)
        .collect::<EngineResult<Vec<_>>>()?;

    entries.sort_by(|a, b| match order {
        RankingOrder::Name => compare_names(a, b),
        RankingOrder::Rating => b
            .average_rating
            .total_cmp(&a.average_rating)
            .then(b.total_reviews.cmp(&a.total_reviews))
            .then_with(|| compare_names(a, b)),
        RankingOrder::ReviewCount => b
            .total_reviews
            .cmp(&a.total_reviews)
            .then(b.average_rating.total_cmp(&a.average_rating))
            .then_with(|| compare_names(a, b)),
    });

    debug!(businesses = entries.len(), ?order, "ranked directory");
    Ok(entries)
}

fn compare_names(a: &BusinessRankingEntry<'_>, b: &BusinessRankingEntry<'_>) -> Ordering {
    let left = a.profile.display_name();
    let right = b.profile.display_name();
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(&right))
        .then(a.profile.id.cmp(&b.profile.id))
}

/// Ranking entry plus the newest reviews, as shown on a business page.
pub fn business_detail(
    profile: &BusinessProfile,
    recent_limit: usize,
) -> EngineResult<BusinessDetail<'_>> {
    let entry = rank_entry(profile)?;
    Ok(BusinessDetail {
        entry,
        recent_reviews: recent_reviews(&profile.reviews, recent_limit),
    })
}

/// Newest first; undated reviews go last in input order.
pub fn recent_reviews(reviews: &[ReviewRecord], limit: usize) -> Vec<&ReviewRecord> {
    let mut ordered: Vec<&ReviewRecord> = reviews.iter().collect();
    ordered.sort_by(|a, b| {
        match (a.review_date, b.review_date) {
            (Some(left), Some(right)) => right.sort_key().cmp(&left.sort_key()),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    ordered.truncate(limit);
    ordered
}
