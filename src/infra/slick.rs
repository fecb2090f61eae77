//! # Slick Client Module / Slick 客户端模块
//!
//! The reporting-service collaborator. `ReportingClient` is the seam the core
//! talks through; `SlickClient` implements it over the Slick REST API with
//! `reqwest` and JSON bodies.
//!
//! 报告服务协作者。`ReportingClient` 是核心逻辑与之通信的接口；
//! `SlickClient` 使用 `reqwest` 和 JSON 在 Slick REST API 上实现它。

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::core::models::{
    Build, Component, Project, Release, TestPlan, TestResult, Testcase, Testrun, VersionInfo,
};

pub const DEFAULT_SLICK_URL: &str = "http://localhost:8080";

/// Failures talking to the reporting service.
/// 与报告服务通信时的失败。
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("invalid request url {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("unable to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Operations the core needs from the reporting service.
///
/// Every `create_*` returns the entity as stored, carrying its server-assigned id.
/// Every `find_*` returns `Ok(None)` when the entity does not exist.
///
/// 核心逻辑需要报告服务提供的操作。
/// 每个 `create_*` 返回存储后的实体，带有服务器分配的 id。
/// 每个 `find_*` 在实体不存在时返回 `Ok(None)`。
#[async_trait]
pub trait ReportingClient: Send + Sync {
    /// Base URL used in diagnostics.
    fn base_url(&self) -> &str;

    async fn get_service_version(&self) -> Result<VersionInfo, ClientError>;

    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>, ClientError>;

    async fn create_release(&self, project_id: &str, release: &Release) -> Result<Release, ClientError>;

    async fn create_build(
        &self,
        project_id: &str,
        release_id: &str,
        build: &Build,
    ) -> Result<Build, ClientError>;

    async fn create_component(
        &self,
        project_id: &str,
        component: &Component,
    ) -> Result<Component, ClientError>;

    async fn find_testplan(&self, project_id: &str, name: &str) -> Result<Option<TestPlan>, ClientError>;

    async fn create_testplan(&self, testplan: &TestPlan) -> Result<TestPlan, ClientError>;

    async fn create_testrun(&self, testrun: &Testrun) -> Result<Testrun, ClientError>;

    async fn update_testrun(&self, testrun: &Testrun) -> Result<Testrun, ClientError>;

    async fn find_testcase(&self, project_id: &str, name: &str) -> Result<Option<Testcase>, ClientError>;

    async fn create_testcase(&self, testcase: &Testcase) -> Result<Testcase, ClientError>;

    async fn create_result(&self, result: &TestResult) -> Result<TestResult, ClientError>;
}

/// `ReportingClient` over the Slick REST API.
/// 基于 Slick REST API 的 `ReportingClient`。
#[derive(Debug, Clone)]
pub struct SlickClient {
    client: Client,
    base_url: String,
}

impl SlickClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// Appends `segment` to `prefix` as one percent-encoded path segment.
    fn segment_url(&self, prefix: &str, segment: &str) -> Result<String, ClientError> {
        let base = self.url(prefix);
        let mut url = Url::parse(&base).map_err(|e| ClientError::InvalidUrl {
            url: base.clone(),
            message: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl {
                url: base.clone(),
                message: "url cannot be a base".to_string(),
            })?
            .push(segment);
        Ok(url.into())
    }

    async fn get<T: DeserializeOwned>(&self, url: String, query: &[(&str, &str)]) -> Result<T, ClientError> {
        tracing::trace!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| ClientError::Transport { url: url.clone(), source })?;
        decode(url, response).await
    }

    /// GET that maps a 404 to `None`.
    async fn find<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, ClientError> {
        match self.get(url, query).await {
            Ok(found) => Ok(Some(found)),
            Err(ClientError::Status { status: StatusCode::NOT_FOUND, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn send<B, T>(&self, method: reqwest::Method, url: String, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        tracing::trace!(%url, %method, "sending");
        let response = self
            .client
            .request(method, &url)
            .json(body)
            .send()
            .await
            .map_err(|source| ClientError::Transport { url: url.clone(), source })?;
        decode(url, response).await
    }

    async fn post<B, T>(&self, url: String, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.send(reqwest::Method::POST, url, body).await
    }
}

async fn decode<T: DeserializeOwned>(url: String, response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status { url, status, body });
    }
    response
        .json::<T>()
        .await
        .map_err(|source| ClientError::Decode { url, source })
}

#[async_trait]
impl ReportingClient for SlickClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_service_version(&self) -> Result<VersionInfo, ClientError> {
        self.get(self.url("version"), &[]).await
    }

    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>, ClientError> {
        let url = self.segment_url("projects/byname", name)?;
        self.find(url, &[]).await
    }

    async fn create_release(&self, project_id: &str, release: &Release) -> Result<Release, ClientError> {
        let url = self.url(&format!("projects/{project_id}/releases"));
        self.post(url, release).await
    }

    async fn create_build(
        &self,
        project_id: &str,
        release_id: &str,
        build: &Build,
    ) -> Result<Build, ClientError> {
        let url = self.url(&format!("projects/{project_id}/releases/{release_id}/builds"));
        self.post(url, build).await
    }

    async fn create_component(
        &self,
        project_id: &str,
        component: &Component,
    ) -> Result<Component, ClientError> {
        let url = self.url(&format!("projects/{project_id}/components"));
        self.post(url, component).await
    }

    async fn find_testplan(&self, project_id: &str, name: &str) -> Result<Option<TestPlan>, ClientError> {
        let plans: Vec<TestPlan> = self
            .get(self.url("testplans"), &[("projectid", project_id), ("name", name)])
            .await?;
        Ok(plans.into_iter().find(|plan| plan.name == name))
    }

    async fn create_testplan(&self, testplan: &TestPlan) -> Result<TestPlan, ClientError> {
        self.post(self.url("testplans"), testplan).await
    }

    async fn create_testrun(&self, testrun: &Testrun) -> Result<Testrun, ClientError> {
        self.post(self.url("testruns"), testrun).await
    }

    async fn update_testrun(&self, testrun: &Testrun) -> Result<Testrun, ClientError> {
        let url = self.url(&format!("testruns/{}", testrun.id));
        self.send(reqwest::Method::PUT, url, testrun).await
    }

    async fn find_testcase(&self, project_id: &str, name: &str) -> Result<Option<Testcase>, ClientError> {
        let cases: Vec<Testcase> = self
            .get(self.url("testcases"), &[("projectid", project_id), ("name", name)])
            .await?;
        Ok(cases.into_iter().find(|case| case.name == name))
    }

    async fn create_testcase(&self, testcase: &Testcase) -> Result<Testcase, ClientError> {
        self.post(self.url("testcases"), testcase).await
    }

    async fn create_result(&self, result: &TestResult) -> Result<TestResult, ClientError> {
        self.post(self.url("results"), result).await
    }
}
