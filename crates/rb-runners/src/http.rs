// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `http`: issues a request via `reqwest` (§4.8).

use async_trait::async_trait;
use indexmap::IndexMap;
use rb_core::StoreValue;
use serde::Deserialize;
use std::collections::HashMap;

use crate::{Runner, RunnerError, StepContext};

#[derive(Debug, Deserialize)]
struct HttpPayload {
    url: String,
    #[serde(default = "default_method")]
    method: String,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    body: Option<serde_json::Value>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Binds `{status, headers, body, rawBody}` and writes any `Set-Cookie`
/// headers into the step context's cookie jar.
pub struct HttpRunner {
    client: reqwest::Client,
    target: Option<String>,
}

impl HttpRunner {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            target: None,
        }
    }

    pub fn with_target(target: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            target: Some(target.into()),
        }
    }
}

impl Default for HttpRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Runner for HttpRunner {
    async fn run(&self, ctx: &mut StepContext) -> Result<(), RunnerError> {
        let payload: HttpPayload =
            serde_json::from_value(ctx.payload.clone()).map_err(|e| RunnerError::Http {
                step: ctx.step_name.clone(),
                cause: e.to_string(),
            })?;

        let span = tracing::info_span!("http", step = %ctx.step_name, method = %payload.method, url = %payload.url);
        let _guard = span.enter();

        let method: reqwest::Method =
            payload
                .method
                .parse()
                .map_err(|_| RunnerError::Http {
                    step: ctx.step_name.clone(),
                    cause: format!("unsupported method {}", payload.method),
                })?;

        let mut req = self.client.request(method, &payload.url);
        for (k, v) in &payload.headers {
            req = req.header(k, v);
        }
        if let Some(body) = &payload.body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(|e| RunnerError::Http {
            step: ctx.step_name.clone(),
            cause: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let mut headers = IndexMap::new();
        for (name, value) in response.headers().iter() {
            headers.insert(
                name.to_string(),
                StoreValue::from(value.to_str().unwrap_or_default().to_string()),
            );
            if name.as_str().eq_ignore_ascii_case("set-cookie") {
                if let Some((cookie_name, cookie_value)) =
                    value.to_str().unwrap_or_default().split_once('=')
                {
                    ctx.set_cookie(
                        cookie_name.trim().to_string(),
                        StoreValue::from(cookie_value.split(';').next().unwrap_or("").to_string()),
                    );
                }
            }
        }

        let raw_body = response.text().await.map_err(|e| RunnerError::Http {
            step: ctx.step_name.clone(),
            cause: e.to_string(),
        })?;
        let body = serde_json::from_str::<serde_json::Value>(&raw_body)
            .map(StoreValue::from_json)
            .unwrap_or_else(|_| StoreValue::from(raw_body.clone()));

        tracing::debug!(status, "http completed");

        let mut mapping = IndexMap::new();
        mapping.insert("status".to_string(), StoreValue::from(status as i64));
        mapping.insert("headers".to_string(), StoreValue::Mapping(headers));
        mapping.insert("body".to_string(), body);
        mapping.insert("rawBody".to_string(), StoreValue::from(raw_body));
        ctx.set_result(StoreValue::Mapping(mapping));

        Ok(())
    }

    fn target_is_empty(&self) -> bool {
        self.target.is_none()
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
