//! Shared constants for end-to-end tests
//!
//! When the seeded storefront data changes, update only this file.

// ============================================================================
// Seeded Reviews
// ============================================================================

/// Approved reviews, newest first, as (id, rating)
pub const APPROVED_REVIEWS: &[(&str, i64)] = &[
    ("review-1", 5),
    ("review-2", 5),
    ("review-3", 4),
    ("review-4", 3),
    ("review-5", 5),
    ("review-6", 1),
];

/// Newest approved review
pub const REVIEW_1_ID: &str = "review-1";

/// Second approved review, seeded with two likes
pub const REVIEW_2_ID: &str = "review-2";

/// Seeded like count of review-2
pub const REVIEW_2_LIKES: u64 = 2;

/// Submitted but never approved
pub const PENDING_REVIEW_ID: &str = "review-pending";

// ============================================================================
// Seeded Display Configuration
// ============================================================================

pub const SITE_TITLE: &str = "Test Streaming";

pub const SITE_WHATSAPP_URL: &str = "https://wa.me/5215500000000";

pub const PLATFORM_1_ID: &str = "platform-netflix";

pub const PLATFORM_2_ID: &str = "platform-disney";

/// Inactive, never listed
pub const HIDDEN_PLATFORM_ID: &str = "platform-hidden";

pub const SCREEN_1_ID: &str = "screen-1";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
