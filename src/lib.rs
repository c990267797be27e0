//! Review aggregation engine: month buckets, source distribution, summary
//! metrics with rating trends, and directory ranking for business listings.
//!
//! Every engine function is a pure transformation of borrowed input. The
//! `db`, `config` and `report` modules are the collaborators around it.

pub mod buckets;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod metrics;
pub mod models;
pub mod report;
pub mod sources;

pub use error::{EngineError, EngineResult};

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use crate::models::{BusinessProfile, ReviewDate, ReviewRecord};

    pub fn review_on(source: &str, rating: f64, year: i32, month: u32, day: u32) -> ReviewRecord {
        let date = NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date");
        ReviewRecord {
            review_date: Some(ReviewDate::Date(date)),
            ..undated_review(source, rating)
        }
    }

    pub fn undated_review(source: &str, rating: f64) -> ReviewRecord {
        ReviewRecord {
            id: Uuid::new_v4(),
            business_id: Uuid::nil(),
            source: source.to_string(),
            reviewer_name: Some("Avery Lee".to_string()),
            rating,
            comment: None,
            review_date: None,
        }
    }

    pub fn profile(name: &str, reviews: Vec<ReviewRecord>) -> BusinessProfile {
        let id = Uuid::new_v4();
        BusinessProfile {
            id,
            business_name: Some(name.to_string()),
            slug: Some(name.to_lowercase().replace(' ', "-")),
            category: None,
            is_public: true,
            reviews: reviews
                .into_iter()
                .map(|review| ReviewRecord {
                    business_id: id,
                    ..review
                })
                .collect(),
        }
    }
}
