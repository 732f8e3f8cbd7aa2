// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use chapterdash_app::{ChapterPath, ChapterRecord};
use log::{debug, info, warn};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const CHAPTERS_PATH: &str = "/api/chapters";
const FIX_PATH: &str = "/api/fix";
const FIX_ALL_PATH: &str = "/api/fixall";

/// Blocking client for the chapter service. Cheap to clone; clones share the
/// underlying connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("service.base_url must not be empty");
        }
        validate_base_url(&base_url)?;

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn list_chapters(&self) -> Result<Vec<ChapterRecord>> {
        let url = self.endpoint(CHAPTERS_PATH);
        debug!("GET {url}");
        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|error| self.transport_error(error))?;
        let response = ensure_success(response)?;

        let chapters: Vec<ChapterRecord> = response.json().context("decode chapter list")?;
        info!("loaded {} chapters from {}", chapters.len(), self.base_url);
        Ok(chapters)
    }

    pub fn fix_chapter(&self, path: &ChapterPath) -> Result<()> {
        let url = self.endpoint(FIX_PATH);
        debug!("POST {url} chapter_path={path}");
        let response = self
            .http
            .post(&url)
            .json(&FixRequest {
                chapter_path: path.as_str(),
            })
            .send()
            .map_err(|error| self.transport_error(error))?;
        ensure_success(response).with_context(|| format!("fix {path}"))?;
        info!("fix accepted for {path}");
        Ok(())
    }

    pub fn fix_all(&self) -> Result<()> {
        let url = self.endpoint(FIX_ALL_PATH);
        debug!("POST {url}");
        let response = self
            .http
            .post(&url)
            .send()
            .map_err(|error| self.transport_error(error))?;
        ensure_success(response).context("fix all")?;
        info!("fix all accepted");
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn transport_error(&self, error: reqwest::Error) -> anyhow::Error {
        warn!("request to {} failed: {error}", self.base_url);
        if error.is_timeout() {
            return anyhow!(
                "request to {} timed out after {:?}; raise [service].timeout if the service is slow",
                self.base_url,
                self.timeout
            );
        }
        anyhow!(
            "cannot reach {} -- check that the chapter service is running and [service].base_url is correct ({error})",
            self.base_url
        )
    }
}

pub fn validate_base_url(base_url: &str) -> Result<()> {
    let parsed = Url::parse(base_url)
        .with_context(|| format!("service.base_url {base_url:?} is not a valid URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!(
            "service.base_url {base_url:?} uses scheme {:?}; use http:// or https://",
            parsed.scheme()
        );
    }
    if parsed.host_str().is_none() {
        bail!("service.base_url {base_url:?} has no host");
    }
    Ok(())
}

fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let error = clean_error_response(status, &body);
    warn!("{error}");
    Err(error)
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ServiceErrorEnvelope>(body) {
        let message = parsed
            .error
            .filter(|error| !error.is_empty())
            .or(parsed.message.filter(|message| !message.is_empty()));
        if let Some(message) = message {
            return anyhow!("server error ({}): {}", status.as_u16(), message);
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), trimmed);
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Serialize)]
struct FixRequest<'a> {
    chapter_path: &'a str,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorEnvelope {
    error: Option<String>,
    message: Option<String>,
}
