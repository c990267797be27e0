use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{ReviewRecord, SourceGroup};

/// How source labels are compared when grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SourceNormalization {
    /// Group by the label exactly as stored.
    #[default]
    Raw,
    /// Trim whitespace and lowercase before grouping.
    CaseInsensitive,
}

impl SourceNormalization {
    pub fn key(&self, source: &str) -> String {
        match self {
            SourceNormalization::Raw => source.to_string(),
            SourceNormalization::CaseInsensitive => source.trim().to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDistribution {
    /// Groups in first-seen order.
    pub groups: Vec<SourceGroup>,
    pub total: usize,
}

impl SourceDistribution {
    pub fn distinct_sources(&self) -> usize {
        self.groups.len()
    }

    pub fn count_for(&self, source: &str) -> usize {
        self.groups
            .iter()
            .find(|group| group.source == source)
            .map(|group| group.count)
            .unwrap_or(0)
    }

    /// Counts always cover every review that went in.
    pub fn is_consistent(&self) -> bool {
        self.groups.iter().map(|group| group.count).sum::<usize>() == self.total
    }
}

pub fn distribute_by_source(
    reviews: &[ReviewRecord],
    normalization: SourceNormalization,
) -> SourceDistribution {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<SourceGroup> = Vec::new();

    for review in reviews {
        let key = normalization.key(&review.source);
        match positions.get(&key) {
            Some(&index) => groups[index].count += 1,
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push(SourceGroup {
                    source: key,
                    count: 1,
                });
            }
        }
    }

    debug!(
        reviews = reviews.len(),
        sources = groups.len(),
        ?normalization,
        "distributed reviews by source"
    );

    SourceDistribution {
        groups,
        total: reviews.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::review_on;

    fn mixed_reviews() -> Vec<ReviewRecord> {
        vec![
            review_on("yelp", 4.0, 2024, 1, 1),
            review_on("google", 5.0, 2024, 1, 2),
            review_on("Google", 3.0, 2024, 1, 3),
            review_on("yelp", 2.0, 2024, 1, 4),
            review_on(" google ", 1.0, 2024, 1, 5),
        ]
    }

    #[test]
    fn raw_grouping_keeps_first_seen_order() {
        let distribution = distribute_by_source(&mixed_reviews(), SourceNormalization::Raw);
        let labels: Vec<&str> = distribution
            .groups
            .iter()
            .map(|group| group.source.as_str())
            .collect();

        assert_eq!(labels, vec!["yelp", "google", "Google", " google "]);
        assert_eq!(distribution.count_for("yelp"), 2);
        assert_eq!(distribution.distinct_sources(), 4);
        assert!(distribution.is_consistent());
    }

    #[test]
    fn case_insensitive_grouping_merges_labels() {
        let distribution =
            distribute_by_source(&mixed_reviews(), SourceNormalization::CaseInsensitive);

        assert_eq!(
            distribution.groups,
            vec![
                SourceGroup {
                    source: "yelp".to_string(),
                    count: 2
                },
                SourceGroup {
                    source: "google".to_string(),
                    count: 3
                },
            ]
        );
        assert_eq!(distribution.total, 5);
        assert!(distribution.is_consistent());
    }

    #[test]
    fn empty_input_has_no_groups() {
        let distribution = distribute_by_source(&[], SourceNormalization::Raw);
        assert!(distribution.groups.is_empty());
        assert_eq!(distribution.total, 0);
        assert!(distribution.is_consistent());
    }

    #[test]
    fn permuting_input_can_change_group_order() {
        let mut reviews = mixed_reviews();
        let forward = distribute_by_source(&reviews, SourceNormalization::CaseInsensitive);
        reviews.reverse();
        let backward = distribute_by_source(&reviews, SourceNormalization::CaseInsensitive);

        assert_ne!(forward.groups, backward.groups);
        assert_eq!(backward.groups[0].source, "google");
        assert_eq!(forward.count_for("google"), backward.count_for("google"));
        assert_eq!(forward.count_for("yelp"), backward.count_for("yelp"));
    }

    #[test]
    fn unknown_sources_are_not_special() {
        let reviews = vec![review_on("tripadvisor", 4.0, 2024, 1, 1)];
        let distribution = distribute_by_source(&reviews, SourceNormalization::Raw);
        assert_eq!(distribution.count_for("tripadvisor"), 1);
        assert_eq!(distribution.count_for("google"), 0);
    }
}
