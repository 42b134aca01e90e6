//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per storefront endpoint. When API routes or
//! request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::Value;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Server
    // ========================================================================

    /// GET /
    pub async fn get_home(&self) -> Response {
        self.client
            .get(self.url("/"))
            .send()
            .await
            .expect("Home request failed")
    }

    // ========================================================================
    // Page and Reviews
    // ========================================================================

    /// GET /v1/page
    pub async fn get_page(&self) -> Response {
        self.client
            .get(self.url("/v1/page"))
            .send()
            .await
            .expect("Get page request failed")
    }

    /// GET /v1/reviews
    pub async fn get_reviews(&self) -> Response {
        self.client
            .get(self.url("/v1/reviews"))
            .send()
            .await
            .expect("Get reviews request failed")
    }

    /// POST /v1/reviews
    pub async fn submit_review(&self, body: Value) -> Response {
        self.client
            .post(self.url("/v1/reviews"))
            .json(&body)
            .send()
            .await
            .expect("Submit review request failed")
    }

    // ========================================================================
    // Likes
    // ========================================================================

    /// PUT /v1/reviews/{id}/likes/{anonymous_id}
    pub async fn like(&self, review_id: &str, anonymous_id: &str) -> Response {
        self.client
            .put(self.url(&format!("/v1/reviews/{}/likes/{}", review_id, anonymous_id)))
            .send()
            .await
            .expect("Like request failed")
    }

    /// DELETE /v1/reviews/{id}/likes/{anonymous_id}
    pub async fn unlike(&self, review_id: &str, anonymous_id: &str) -> Response {
        self.client
            .delete(self.url(&format!("/v1/reviews/{}/likes/{}", review_id, anonymous_id)))
            .send()
            .await
            .expect("Unlike request failed")
    }

    /// POST /v1/likes/reconcile
    pub async fn reconcile_likes(&self) -> Response {
        self.client
            .post(self.url("/v1/likes/reconcile"))
            .send()
            .await
            .expect("Reconcile request failed")
    }

    // ========================================================================
    // Display Configuration
    // ========================================================================

    /// GET /v1/config/{kind}
    pub async fn get_config(&self, kind: &str) -> Response {
        self.client
            .get(self.url(&format!("/v1/config/{}", kind)))
            .send()
            .await
            .expect("Get config request failed")
    }
}
