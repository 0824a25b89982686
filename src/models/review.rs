//! Course review model and rating aggregation

use serde::{Deserialize, Serialize};

/// Lowest and highest star values
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Review document (`reviews` collection), one per user and course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub id: String,
    pub course_id: String,
    pub user_id: String,
    #[serde(default, alias = "userDisplayName")]
    pub user_name: Option<String>,
    #[serde(default, alias = "userDisplayPhoto")]
    pub user_photo: Option<String>,
    pub rating: u8,
    #[serde(default, alias = "review")]
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Count of reviews with a given star value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingBucket {
    pub stars: u8,
    pub count: usize,
}

/// Mean rating and histogram for a course.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    /// Mean rounded to one decimal; absent when there are no reviews
    pub average: Option<f64>,
    pub total: usize,
    /// Buckets from 5 stars down to 1
    pub histogram: Vec<RatingBucket>,
}

impl RatingSummary {
    /// Aggregate star values. Values outside 1..=5 are ignored.
    pub fn from_ratings<I: IntoIterator<Item = u8>>(ratings: I) -> Self {
        let mut counts = [0usize; MAX_RATING as usize];
        let mut sum = 0u64;
        let mut total = 0usize;

        for rating in ratings {
            if !(MIN_RATING..=MAX_RATING).contains(&rating) {
                continue;
            }
            counts[(rating - 1) as usize] += 1;
            sum += rating as u64;
            total += 1;
        }

        let average = (total > 0).then(|| round_one_decimal(sum as f64 / total as f64));
        let histogram = (MIN_RATING..=MAX_RATING)
            .rev()
            .map(|stars| RatingBucket {
                stars,
                count: counts[(stars - 1) as usize],
            })
            .collect();

        Self {
            average,
            total,
            histogram,
        }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Everything the course reviews panel shows
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseReviews {
    pub summary: RatingSummary,
    pub reviews: Vec<Review>,
    pub own_review: Option<Review>,
}
