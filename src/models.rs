use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// When a review was written, as stated by the data source.
///
/// The calendar month of a review is always read from the value's own
/// calendar fields; offset-bearing values are not shifted to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReviewDate {
    Zoned(DateTime<FixedOffset>),
    Local(NaiveDateTime),
    Date(NaiveDate),
}

impl ReviewDate {
    pub fn calendar_date(&self) -> NaiveDate {
        match self {
            ReviewDate::Zoned(value) => value.date_naive(),
            ReviewDate::Local(value) => value.date(),
            ReviewDate::Date(value) => *value,
        }
    }

    pub fn period(&self) -> PeriodKey {
        PeriodKey::from_date(self.calendar_date())
    }

    /// Date and wall-clock time exactly as stated, offset dropped.
    pub fn stated_datetime(&self) -> NaiveDateTime {
        match self {
            ReviewDate::Zoned(value) => value.naive_local(),
            ReviewDate::Local(value) => *value,
            ReviewDate::Date(value) => value.and_hms_opt(0, 0, 0).unwrap_or_default(),
        }
    }

    /// Ordering key for "newest first" style sorting across mixed variants.
    /// Offset-bearing values compare by their UTC instant; values without an
    /// offset are taken as UTC.
    pub fn sort_key(&self) -> NaiveDateTime {
        match self {
            ReviewDate::Zoned(value) => value.naive_utc(),
            other => other.stated_datetime(),
        }
    }
}

impl std::str::FromStr for ReviewDate {
    type Err = chrono::ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if let Ok(zoned) = DateTime::parse_from_rfc3339(value) {
            return Ok(ReviewDate::Zoned(zoned));
        }
        if let Ok(local) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(ReviewDate::Local(local));
        }
        if let Ok(local) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
            return Ok(ReviewDate::Local(local));
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d").map(ReviewDate::Date)
    }
}

impl From<NaiveDate> for ReviewDate {
    fn from(value: NaiveDate) -> Self {
        ReviewDate::Date(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: Uuid,
    pub business_id: Uuid,
    pub source: String,
    pub reviewer_name: Option<String>,
    pub rating: f64,
    pub comment: Option<String>,
    pub review_date: Option<ReviewDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub id: Uuid,
    pub business_name: Option<String>,
    pub slug: Option<String>,
    pub category: Option<String>,
    pub is_public: bool,
    #[serde(default)]
    pub reviews: Vec<ReviewRecord>,
}

impl BusinessProfile {
    /// Name shown in listings: business name, then slug, then the id.
    pub fn display_name(&self) -> String {
        [self.business_name.as_deref(), self.slug.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// A calendar month. Field order makes the derived `Ord` chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: i32,
    pub month: u32,
}

impl PeriodKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl std::fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    pub period: PeriodKey,
    pub count: usize,
    pub total_rating: f64,
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceGroup {
    pub source: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateMetrics {
    pub total_reviews: usize,
    pub average_rating: f64,
    pub trend: f64,
}

impl AggregateMetrics {
    pub fn empty() -> Self {
        Self {
            total_reviews: 0,
            average_rating: 0.0,
            trend: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessRankingEntry<'a> {
    pub profile: &'a BusinessProfile,
    pub average_rating: f64,
    pub total_reviews: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessDetail<'a> {
    pub entry: BusinessRankingEntry<'a>,
    pub recent_reviews: Vec<&'a ReviewRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_keys_order_chronologically() {
        let november = PeriodKey { year: 2023, month: 11 };
        let february = PeriodKey { year: 2024, month: 2 };
        assert!(november < february);
        assert_eq!(february.to_string(), "2024-02");
    }

    #[test]
    fn zoned_dates_keep_their_own_calendar_month() {
        let date: ReviewDate = serde_json::from_str("\"2024-03-31T23:30:00-05:00\"").unwrap();
        assert!(matches!(date, ReviewDate::Zoned(_)));
        assert_eq!(date.period(), PeriodKey { year: 2024, month: 3 });
    }

    #[test]
    fn review_dates_parse_all_supported_shapes() {
        let local: ReviewDate = serde_json::from_str("\"2024-01-02T08:15:00\"").unwrap();
        let plain: ReviewDate = serde_json::from_str("\"2024-01-02\"").unwrap();
        assert!(matches!(local, ReviewDate::Local(_)));
        assert!(matches!(plain, ReviewDate::Date(_)));
        assert_eq!(local.calendar_date(), plain.calendar_date());
    }

    #[test]
    fn review_dates_parse_from_plain_text() {
        let zoned: ReviewDate = "2024-02-01T00:30:00+09:00".parse().unwrap();
        let spaced: ReviewDate = "2024-02-01 10:00:00".parse().unwrap();
        let plain: ReviewDate = " 2024-02-01 ".parse().unwrap();
        assert_eq!(zoned.period(), PeriodKey { year: 2024, month: 2 });
        assert!(matches!(spaced, ReviewDate::Local(_)));
        assert!(matches!(plain, ReviewDate::Date(_)));
        assert!("02/01/2024".parse::<ReviewDate>().is_err());
    }

    #[test]
    fn zoned_dates_order_by_instant() {
        // 16:00 UTC on Feb 29 vs 01:00 UTC on Mar 1
        let tokyo: ReviewDate = "2024-03-01T01:00:00+09:00".parse().unwrap();
        let new_york: ReviewDate = "2024-02-29T20:00:00-05:00".parse().unwrap();
        assert!(new_york.sort_key() > tokyo.sort_key());
        // calendar months still follow the stated dates
        assert_eq!(tokyo.period(), PeriodKey { year: 2024, month: 3 });
        assert_eq!(new_york.period(), PeriodKey { year: 2024, month: 2 });
        assert_eq!(tokyo.stated_datetime().to_string(), "2024-03-01 01:00:00");
    }

    #[test]
    fn display_name_falls_back_to_slug_then_id() {
        let mut profile = BusinessProfile {
            id: Uuid::new_v4(),
            business_name: Some("  ".to_string()),
            slug: Some("corner-bakery".to_string()),
            category: None,
            is_public: true,
            reviews: Vec::new(),
        };
        assert_eq!(profile.display_name(), "corner-bakery");
        profile.slug = None;
        assert_eq!(profile.display_name(), profile.id.to_string());
    }
}
