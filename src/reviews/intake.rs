//! Validation and submission of visitor reviews.

use crate::storefront_store::{NewReview, Review, StoreError, StorefrontStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

pub const MAX_USERNAME_CHARS: usize = 60;
pub const MAX_SERVICE_CHARS: usize = 60;
pub const MAX_TEXT_CHARS: usize = 500;

/// A submission as it arrives from the form. Nothing is trusted yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewDraft {
    pub username: String,
    /// Number or numeric string, whatever the form sent.
    pub rating: Option<Value>,
    pub text: String,
    pub service: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum IntakeError {
    #[error("Username is required")]
    MissingUsername,

    #[error("Review text is required")]
    MissingText,

    #[error("Service is required")]
    MissingService,

    #[error("Rating must be an integer between 1 and 5, got {0}")]
    InvalidRating(String),

    #[error("{field} exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntakeError {
    pub fn code(&self) -> &'static str {
        match self {
            IntakeError::MissingUsername => "missing_username",
            IntakeError::MissingText => "missing_text",
            IntakeError::MissingService => "missing_service",
            IntakeError::InvalidRating(_) => "invalid_rating",
            IntakeError::TooLong { .. } => "too_long",
            IntakeError::Store(err) => err.code(),
        }
    }
}

fn parse_rating(rating: Option<&Value>) -> Result<u8, IntakeError> {
    let parsed = match rating {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(r @ 1..=5) => Ok(r as u8),
        _ => Err(IntakeError::InvalidRating(match rating {
            Some(v) => v.to_string(),
            None => "nothing".to_string(),
        })),
    }
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), IntakeError> {
    if value.chars().count() > max {
        return Err(IntakeError::TooLong { field, max });
    }
    Ok(())
}

impl ReviewDraft {
    /// Trims every field and checks it. All four fields are required.
    pub fn validate(&self) -> Result<NewReview, IntakeError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(IntakeError::MissingUsername);
        }
        let service = self.service.trim();
        if service.is_empty() {
            return Err(IntakeError::MissingService);
        }
        let text = self.text.trim();
        if text.is_empty() {
            return Err(IntakeError::MissingText);
        }
        let rating = parse_rating(self.rating.as_ref())?;

        check_length("username", username, MAX_USERNAME_CHARS)?;
        check_length("service", service, MAX_SERVICE_CHARS)?;
        check_length("text", text, MAX_TEXT_CHARS)?;

        Ok(NewReview {
            username: username.to_string(),
            rating,
            text: text.to_string(),
            service: service.to_string(),
        })
    }
}

/// Validates `draft` and appends it to the store.
///
/// Not retried on failure: an append that timed out may still have landed.
pub async fn submit(
    store: &dyn StorefrontStore,
    draft: &ReviewDraft,
) -> Result<Review, IntakeError> {
    let new_review = match draft.validate() {
        Ok(review) => review,
        Err(err) => {
            info!("Rejected review submission: {}", err);
            return Err(err);
        }
    };
    match store.submit_review(new_review).await {
        Ok(review) => Ok(review),
        Err(err) => {
            warn!("Failed to store review: {}", err);
            Err(err.into())
        }
    }
}
