use std::collections::HashMap;

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{PgPool, Row};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{BusinessProfile, ReviewDate, ReviewRecord};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let businesses = vec![
        (
            Uuid::parse_str("6b1e2c9a-7f43-4d0e-a5c1-91f0d3e8b742")?,
            "Zephyr Cafe",
            "zephyr-cafe",
            "Coffee",
            true,
        ),
        (
            Uuid::parse_str("c4a87d10-2e5b-4f96-8d3a-5be90f1c6a27")?,
            "Aurora Bakes",
            "aurora-bakes",
            "Bakery",
            true,
        ),
        (
            Uuid::parse_str("f29d4b63-b8c1-47a2-9e05-3d7a6c18e5f0")?,
            "Mill Street Tailor",
            "mill-street-tailor",
            "Tailoring",
            false,
        ),
    ];

    for (id, name, slug, category, is_public) in businesses {
        upsert_profile(pool, id, name, slug, Some(category), Some(is_public)).await?;
    }

    let reviews = vec![
        ("seed-001", "zephyr-cafe", "google", "Priya N.", 5.0, "Best flat white in town", date(2023, 11, 15)?),
        ("seed-002", "zephyr-cafe", "yelp", "Marco D.", 4.0, "Cozy, a bit loud", date(2024, 1, 2)?),
        ("seed-003", "zephyr-cafe", "google", "Sam K.", 4.0, "Friendly staff", date(2024, 2, 20)?),
        ("seed-004", "aurora-bakes", "facebook", "Lena O.", 3.0, "Bread sold out early", date(2024, 2, 3)?),
        ("seed-005", "aurora-bakes", "google", "Tom W.", 5.0, "Sourdough is perfect", date(2024, 3, 9)?),
    ];

    for (source_key, slug, source, reviewer, rating, comment, review_date) in reviews {
        let business_id: Uuid = sqlx::query("SELECT id FROM review_pulse.profiles WHERE slug = $1")
            .bind(slug)
            .fetch_one(pool)
            .await?
            .get("id");

        insert_review(
            pool,
            business_id,
            source,
            Some(reviewer),
            rating,
            Some(comment),
            Some(review_date),
            source_key,
        )
        .await?;
    }

    info!("seeded demo businesses and reviews");
    Ok(())
}

fn date(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .context("invalid date")
}

async fn upsert_profile(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    slug: &str,
    category: Option<&str>,
    is_public: Option<bool>,
) -> anyhow::Result<Uuid> {
    // New profiles start private; an existing profile keeps its visibility
    // unless one is given.
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO review_pulse.profiles (id, business_name, slug, category, is_public)
        VALUES ($1, $2, $3, $4, COALESCE($5, FALSE))
        ON CONFLICT (slug) DO UPDATE
        SET business_name = EXCLUDED.business_name,
            category = COALESCE(EXCLUDED.category, review_pulse.profiles.category),
            is_public = COALESCE($5, review_pulse.profiles.is_public)
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(slug)
    .bind(category)
    .bind(is_public)
    .fetch_one(pool)
    .await?
    .get("id");
    Ok(id)
}

#[allow(clippy::too_many_arguments)]
async fn insert_review(
    pool: &PgPool,
    business_id: Uuid,
    source: &str,
    reviewer_name: Option<&str>,
    rating: f64,
    comment: Option<&str>,
    review_date: Option<NaiveDateTime>,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO review_pulse.reviews
        (id, business_id, source, reviewer_name, rating, comment, review_date, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(business_id)
    .bind(source)
    .bind(reviewer_name)
    .bind(rating)
    .bind(comment)
    .bind(review_date)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

const REVIEW_COLUMNS: &str =
    "id, business_id, source, reviewer_name, rating, comment, review_date";

fn review_from_row(row: &sqlx::postgres::PgRow) -> ReviewRecord {
    let review_date: Option<NaiveDateTime> = row.get("review_date");
    ReviewRecord {
        id: row.get("id"),
        business_id: row.get("business_id"),
        source: row.get("source"),
        reviewer_name: row.get("reviewer_name"),
        rating: row.get("rating"),
        comment: row.get("comment"),
        review_date: review_date.map(ReviewDate::Local),
    }
}

pub async fn find_business(pool: &PgPool, slug: &str) -> anyhow::Result<BusinessProfile> {
    let row = sqlx::query(
        "SELECT id, business_name, slug, category, is_public \
         FROM review_pulse.profiles WHERE slug = $1",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?
    .with_context(|| format!("no business with slug {slug}"))?;

    let mut profile = profile_from_row(&row);
    profile.reviews = fetch_reviews(pool, profile.id).await?;
    Ok(profile)
}

fn profile_from_row(row: &sqlx::postgres::PgRow) -> BusinessProfile {
    BusinessProfile {
        id: row.get("id"),
        business_name: row.get("business_name"),
        slug: row.get("slug"),
        category: row.get("category"),
        is_public: row.get("is_public"),
        reviews: Vec::new(),
    }
}

pub async fn fetch_reviews(pool: &PgPool, business_id: Uuid) -> anyhow::Result<Vec<ReviewRecord>> {
    let query = format!(
        "SELECT {REVIEW_COLUMNS} FROM review_pulse.reviews \
         WHERE business_id = $1 ORDER BY review_date DESC NULLS LAST"
    );
    let rows = sqlx::query(&query).bind(business_id).fetch_all(pool).await?;
    let reviews: Vec<ReviewRecord> = rows.iter().map(review_from_row).collect();
    debug!(%business_id, reviews = reviews.len(), "fetched reviews");
    Ok(reviews)
}

/// Public profiles with their reviews attached, ordered by business name.
pub async fn fetch_public_profiles(pool: &PgPool) -> anyhow::Result<Vec<BusinessProfile>> {
    let rows = sqlx::query(
        "SELECT id, business_name, slug, category, is_public \
         FROM review_pulse.profiles WHERE is_public ORDER BY business_name",
    )
    .fetch_all(pool)
    .await?;

    let mut profiles: Vec<BusinessProfile> = rows.iter().map(profile_from_row).collect();
    let ids: Vec<Uuid> = profiles.iter().map(|profile| profile.id).collect();

    let query = format!(
        "SELECT {REVIEW_COLUMNS} FROM review_pulse.reviews WHERE business_id = ANY($1)"
    );
    let review_rows = sqlx::query(&query).bind(&ids).fetch_all(pool).await?;

    let mut by_business: HashMap<Uuid, Vec<ReviewRecord>> = HashMap::new();
    for row in review_rows.iter() {
        let review = review_from_row(row);
        by_business.entry(review.business_id).or_default().push(review);
    }
    for profile in profiles.iter_mut() {
        profile.reviews = by_business.remove(&profile.id).unwrap_or_default();
    }

    debug!(businesses = profiles.len(), "fetched public profiles");
    Ok(profiles)
}

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    business_name: String,
    business_slug: String,
    category: Option<String>,
    is_public: Option<bool>,
    source: String,
    reviewer_name: Option<String>,
    rating: f64,
    comment: Option<String>,
    review_date: Option<String>,
    source_key: Option<String>,
}

/// One CSV line, validated and ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub business_name: String,
    pub business_slug: String,
    pub category: Option<String>,
    /// Left unset, a new business stays private and an existing one keeps
    /// its current visibility.
    pub is_public: Option<bool>,
    pub source: String,
    pub reviewer_name: Option<String>,
    pub rating: f64,
    pub comment: Option<String>,
    pub review_date: Option<NaiveDateTime>,
    pub source_key: Option<String>,
}

pub fn read_import_rows<R: std::io::Read>(
    mut reader: csv::Reader<R>,
) -> anyhow::Result<Vec<ImportRow>> {
    let mut rows = Vec::new();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("malformed row {}", line + 1))?;

        let review_date = match row.review_date.as_deref().filter(|value| !value.trim().is_empty()) {
            Some(value) => Some(
                value
                    .parse::<ReviewDate>()
                    .with_context(|| format!("row {}: bad review_date {value:?}", line + 1))?
                    .stated_datetime(),
            ),
            None => {
                warn!(row = line + 1, "review has no review_date");
                None
            }
        };

        rows.push(ImportRow {
            business_name: row.business_name,
            business_slug: row.business_slug,
            category: row.category,
            is_public: row.is_public,
            source: row.source,
            reviewer_name: row.reviewer_name,
            rating: row.rating,
            comment: row.comment,
            review_date,
            source_key: row.source_key,
        });
    }

    Ok(rows)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let rows = read_import_rows(reader)?;
    let mut inserted = 0usize;

    for row in rows {
        let business_id = upsert_profile(
            pool,
            Uuid::new_v4(),
            &row.business_name,
            &row.business_slug,
            row.category.as_deref(),
            row.is_public,
        )
        .await?;

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let added = insert_review(
            pool,
            business_id,
            &row.source,
            row.reviewer_name.as_deref(),
            row.rating,
            row.comment.as_deref(),
            row.review_date,
            &source_key,
        )
        .await?;

        if added {
            inserted += 1;
        }
    }

    info!(inserted, path = %csv_path.display(), "imported reviews");
    Ok(inserted)
}
