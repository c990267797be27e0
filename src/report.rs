use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{AggregateMetrics, BusinessRankingEntry, MonthBucket, ReviewRecord};
use crate::sources::SourceDistribution;

pub struct DashboardReport<'a> {
    pub business: &'a str,
    pub as_of: NaiveDate,
    pub metrics: &'a AggregateMetrics,
    pub buckets: &'a [MonthBucket],
    pub sources: &'a SourceDistribution,
    pub recent: &'a [&'a ReviewRecord],
}

pub fn format_trend(trend: f64) -> String {
    format!("{:+.1}%", trend * 100.0)
}

pub fn build_dashboard_report(report: &DashboardReport<'_>) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Review Performance Report");
    let _ = writeln!(
        output,
        "Generated for {} (as of {})",
        report.business, report.as_of
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Key Metrics");
    let _ = writeln!(output, "- Total reviews: {}", report.metrics.total_reviews);
    let _ = writeln!(
        output,
        "- Average rating: {:.1}",
        report.metrics.average_rating
    );
    let _ = writeln!(output, "- Trend: {}", format_trend(report.metrics.trend));
    let _ = writeln!(
        output,
        "- Review sources: {}",
        report.sources.distinct_sources()
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Average Rating by Month");

    if report.buckets.is_empty() {
        let _ = writeln!(output, "No reviews yet.");
    } else {
        for bucket in report.buckets {
            let _ = writeln!(
                output,
                "- {}: {} reviews (avg rating {:.1})",
                bucket.period, bucket.count, bucket.average_rating
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Review Volume by Source");

    if report.sources.groups.is_empty() {
        let _ = writeln!(output, "No reviews yet.");
    } else {
        for group in report.sources.groups.iter() {
            let _ = writeln!(output, "- {}: {}", group.source, group.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Reviews");

    if report.recent.is_empty() {
        let _ = writeln!(output, "No reviews yet.");
    } else {
        for review in report.recent {
            let date = review
                .review_date
                .map(|date| date.calendar_date().to_string())
                .unwrap_or_else(|| "undated".to_string());
            let _ = writeln!(
                output,
                "- {:.1} stars from {} via {} on {}: {}",
                review.rating,
                review.reviewer_name.as_deref().unwrap_or("Anonymous"),
                review.source,
                date,
                review.comment.as_deref().unwrap_or("(no comment)")
            );
        }
    }

    output
}

pub fn build_directory_report(entries: &[BusinessRankingEntry<'_>]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Business Directory");
    let _ = writeln!(output);

    if entries.is_empty() {
        let _ = writeln!(output, "No public businesses listed.");
        return output;
    }

    for entry in entries {
        let category = entry
            .profile
            .category
            .as_deref()
            .map(|category| format!(" [{category}]"))
            .unwrap_or_default();
        let _ = writeln!(
            output,
            "- {}{}: {:.1} stars ({} reviews)",
            entry.profile.display_name(),
            category,
            entry.average_rating,
            entry.total_reviews
        );
    }

    output
}
