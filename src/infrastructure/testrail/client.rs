use std::path::Path;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use super::wire::{CaseDto, CaseTypeDto, IdDto, SectionDto};
use super::RemoteStore;
use crate::domain::case_type::TestCaseType;
use crate::domain::error::{AppError, RemoteError, Result};
use crate::domain::section::{NewSection, Section};
use crate::domain::test_case::{CasePayload, TestCase};
use crate::domain::test_result::ResultEntry;
use crate::domain::test_run::NewRun;

const API_PREFIX: &str = "index.php?/api/v2/";

static RETRY_AFTER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Retry after (\d+) seconds").unwrap());

/// HTTP client for the TestRail v2 API.
pub struct TestRailClient {
    client: reqwest::Client,
    base_url: String,
    user: String,
    password: String,
}

impl TestRailClient {
    pub fn new(base_url: &str, user: &str, password: &str) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| {
            AppError::ConfigError(format!("Invalid TestRail URL '{}': {}", base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::ConfigError(format!(
                "TestRail URL must use http or https: {}",
                base_url
            )));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            user: user.to_string(),
            password: password.to_string(),
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}{}", self.base_url, API_PREFIX, endpoint)
    }

    /// Pagination links look like `/api/v2/get_cases/1&offset=250`.
    fn link_url(&self, link: &str) -> String {
        format!("{}/index.php?{}", self.base_url, link)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await
            .map_err(|e| RemoteError::new(None, format!("Request failed: {}", e)))?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await.map_err(|e| {
            RemoteError::new(
                Some(status.as_u16()),
                format!("Failed to read response body: {}", e),
            )
        })?;

        if !status.is_success() {
            return Err(remote_error(status, &headers, &text).into());
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text)
            .map_err(|e| AppError::ParseError(format!("Invalid JSON from TestRail: {}", e)))
    }

    async fn get(&self, endpoint: &str) -> Result<Value> {
        debug!(endpoint, "GET");
        self.send(self.client.get(self.endpoint_url(endpoint))).await
    }

    async fn post<B>(&self, endpoint: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized + Sync,
    {
        debug!(endpoint, "POST");
        self.send(self.client.post(self.endpoint_url(endpoint)).json(body))
            .await
    }

    /// Reads a list endpoint, accepting both the legacy bare array and the
    /// paginated `{ "<key>": [...], "_links": { "next": ... } }` envelope.
    async fn get_list<T: DeserializeOwned>(&self, endpoint: &str, key: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = self.get(endpoint).await?;

        loop {
            let next = match page {
                Value::Array(values) => {
                    items.extend(decode_items::<T>(values)?);
                    None
                }
                Value::Object(mut map) => {
                    let values = match map.remove(key) {
                        Some(Value::Array(values)) => values,
                        _ => {
                            return Err(AppError::ParseError(format!(
                                "Response of '{}' has no '{}' array",
                                endpoint, key
                            )))
                        }
                    };
                    items.extend(decode_items::<T>(values)?);
                    map.get("_links")
                        .and_then(|links| links.get("next"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                }
                other => {
                    return Err(AppError::ParseError(format!(
                        "Unexpected response of '{}': {}",
                        endpoint, other
                    )))
                }
            };

            match next {
                Some(link) => {
                    debug!(link = %link, "following pagination link");
                    page = self.send(self.client.get(self.link_url(&link))).await?;
                }
                None => break,
            }
        }

        Ok(items)
    }
}

fn decode_items<T: DeserializeOwned>(values: Vec<Value>) -> Result<Vec<T>> {
    values
        .into_iter()
        .map(|value| serde_json::from_value::<T>(value).map_err(AppError::from))
        .collect()
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| AppError::ParseError(format!("Unexpected {} response: {}", what, e)))
}

fn remote_error(status: StatusCode, headers: &HeaderMap, body: &str) -> RemoteError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    let retry_after = headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .or_else(|| parse_retry_after(&detail));

    RemoteError::new(Some(status.as_u16()), detail).with_retry_after(retry_after)
}

fn parse_retry_after(message: &str) -> Option<u64> {
    RETRY_AFTER_PATTERN
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[async_trait]
impl RemoteStore for TestRailClient {
    async fn list_sections(&self, project_id: u64) -> Result<Vec<Section>> {
        let sections = self
            .get_list::<SectionDto>(&format!("get_sections/{}", project_id), "sections")
            .await?;
        Ok(sections.into_iter().map(Section::from).collect())
    }

    async fn create_section(&self, project_id: u64, section: &NewSection) -> Result<Section> {
        let response = self
            .post(&format!("add_section/{}", project_id), section)
            .await?;
        Ok(decode::<SectionDto>(response, "add_section")?.into())
    }

    async fn list_cases(&self, project_id: u64) -> Result<Vec<TestCase>> {
        let cases = self
            .get_list::<CaseDto>(&format!("get_cases/{}", project_id), "cases")
            .await?;
        Ok(cases.into_iter().map(TestCase::from).collect())
    }

    async fn create_case(&self, section_id: u64, case: &CasePayload) -> Result<TestCase> {
        let response = self.post(&format!("add_case/{}", section_id), case).await?;
        Ok(decode::<CaseDto>(response, "add_case")?.into())
    }

    async fn update_case(&self, case_id: u64, case: &CasePayload) -> Result<TestCase> {
        let response = self.post(&format!("update_case/{}", case_id), case).await?;
        Ok(decode::<CaseDto>(response, "update_case")?.into())
    }

    async fn delete_case(&self, case_id: u64) -> Result<()> {
        self.post(&format!("delete_case/{}", case_id), &json!({}))
            .await?;
        Ok(())
    }

    async fn list_case_types(&self) -> Result<Vec<TestCaseType>> {
        let types = self
            .get_list::<CaseTypeDto>("get_case_types", "case_types")
            .await?;
        Ok(types.into_iter().map(TestCaseType::from).collect())
    }

    async fn create_run(&self, project_id: u64, run: &NewRun) -> Result<u64> {
        let response = self.post(&format!("add_run/{}", project_id), run).await?;
        Ok(decode::<IdDto>(response, "add_run")?.id)
    }

    async fn submit_results(&self, run_id: u64, results: &[ResultEntry]) -> Result<Vec<u64>> {
        let response = self
            .post(
                &format!("add_results_for_cases/{}", run_id),
                &json!({ "results": results }),
            )
            .await?;
        let created = decode::<Vec<IdDto>>(response, "add_results_for_cases")?;
        Ok(created.into_iter().map(|result| result.id).collect())
    }

    async fn attach_to_result(&self, result_id: u64, file_path: &Path) -> Result<()> {
        let bytes = tokio::fs::read(file_path).await.map_err(|e| {
            AppError::IoError(format!(
                "Failed to read attachment {}: {}",
                file_path.display(),
                e
            ))
        })?;
        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());

        let form = Form::new().part("attachment", Part::bytes(bytes).file_name(file_name));
        let url = self.endpoint_url(&format!("add_attachment_to_result/{}", result_id));
        self.send(self.client.post(url).multipart(form)).await?;
        Ok(())
    }

    async fn close_run(&self, run_id: u64) -> Result<()> {
        self.post(&format!("close_run/{}", run_id), &json!({}))
            .await?;
        Ok(())
    }

    async fn resolve_user_id_by_email(&self, email: &str) -> Result<u64> {
        let encoded: String = url::form_urlencoded::byte_serialize(email.as_bytes()).collect();
        let response = self
            .get(&format!("get_user_by_email&email={}", encoded))
            .await?;
        Ok(decode::<IdDto>(response, "get_user_by_email")?.id)
    }
}
