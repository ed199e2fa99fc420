//! Test fixtures and data factories
//!
//! This module provides factory functions for creating test data.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request};
use leetnotes_lib::types::{Approach, CacheKey, GetSolutionInput, SolutionPayload};

use super::ADMIN_TOKEN;

/// Create a solution payload with a single approach
pub fn create_payload(summary: &str) -> SolutionPayload {
    SolutionPayload {
        summary: summary.to_string(),
        approaches: vec![Approach {
            name: "Hash map".to_string(),
            explanation: "Store each complement while scanning".to_string(),
            time_complexity: "O(n)".to_string(),
            space_complexity: "O(n)".to_string(),
            code: Some("fn solve() {}".to_string()),
        }],
        insights: vec!["Trade memory for a single pass".to_string()],
        pitfalls: vec!["Reusing the same element".to_string()],
    }
}

pub fn create_key(question: &str) -> CacheKey {
    CacheKey::new(question, "rust")
}

pub fn create_input(question: &str) -> GetSolutionInput {
    GetSolutionInput {
        question_name: question.to_string(),
        language: "rust".to_string(),
    }
}

/// Builder for router requests
pub struct RequestBuilder {
    method: Method,
    uri: String,
    user_id: Option<String>,
    admin_token: Option<String>,
    body: Option<serde_json::Value>,
}

impl RequestBuilder {
    pub fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            user_id: None,
            admin_token: None,
            body: None,
        }
    }

    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    pub fn put(uri: &str) -> Self {
        Self::new(Method::PUT, uri)
    }

    pub fn delete(uri: &str) -> Self {
        Self::new(Method::DELETE, uri)
    }

    pub fn user(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn admin(self) -> Self {
        self.admin_token(ADMIN_TOKEN)
    }

    pub fn admin_token(mut self, token: &str) -> Self {
        self.admin_token = Some(token.to_string());
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn build(self) -> Request<Body> {
        let mut builder = Request::builder().method(self.method).uri(self.uri);

        if let Some(user_id) = self.user_id {
            builder = builder.header("x-user-id", user_id);
        }
        if let Some(token) = self.admin_token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        match self.body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("Failed to build request"),
            None => builder.body(Body::empty()).expect("Failed to build request"),
        }
    }
}
