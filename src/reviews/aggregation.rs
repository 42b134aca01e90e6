use crate::storefront_store::Review;
use serde::Serialize;

/// Count of approved reviews per star, index 0 holds 1 star.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RatingBreakdown([u64; 5]);

impl RatingBreakdown {
    /// Reviews with exactly `stars` stars, 0 for values outside 1..=5.
    pub fn count(&self, stars: u8) -> u64 {
        match stars {
            1..=5 => self.0[(stars - 1) as usize],
            _ => 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    fn add(&mut self, rating: Option<i64>) {
        if let Some(r @ 1..=5) = rating {
            self.0[(r - 1) as usize] += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StarBar {
    pub stars: u8,
    pub count: u64,
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSummary {
    /// Every approved review, including ones with a missing or out-of-range
    /// rating.
    pub approved_count: u64,
    pub breakdown: RatingBreakdown,
    pub rated_count: u64,
    pub average_rating: Option<f64>,
}

impl ReviewSummary {
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let mut breakdown = RatingBreakdown::default();
        for review in reviews {
            breakdown.add(review.rating);
        }

        let rated_count = breakdown.total();
        let average_rating = if rated_count == 0 {
            None
        } else {
            let weighted: u64 = (1..=5u8).map(|s| s as u64 * breakdown.count(s)).sum();
            Some(weighted as f64 / rated_count as f64)
        };

        Self {
            approved_count: reviews.len() as u64,
            breakdown,
            rated_count,
            average_rating,
        }
    }

    /// Bar width for `stars`, as a rounded share of all approved reviews.
    pub fn percent(&self, stars: u8) -> u8 {
        let denominator = self.approved_count.max(1) as f64;
        (self.breakdown.count(stars) as f64 / denominator * 100.0).round() as u8
    }

    /// Bars from 5 stars down to 1, the order they are rendered in.
    pub fn bars(&self) -> Vec<StarBar> {
        (1..=5u8)
            .rev()
            .map(|stars| StarBar {
                stars,
                count: self.breakdown.count(stars),
                percent: self.percent(stars),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.approved_count == 0
    }
}
