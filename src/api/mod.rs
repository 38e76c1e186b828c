//! HTTP client for the evaluation backend.
//!
//! One request per call: no retries, no timeout, no caching. Callers own sequencing.

mod error;

pub use error::TransportError;

use crate::model::{
    Attempt, Experiment, ExperimentCreate, ExperimentUpdate, Health, LaunchRequest, Run,
    RunSummaryEnvelope,
};
use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

const NO_BODY: Option<&()> = None;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one request and decode the body as `T`.
    ///
    /// Non-success statuses fail with the raw body text. A 204 (or an empty body)
    /// yields `Ok(None)` without a parse attempt.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Option<T>, TransportError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(method, path, &[], body).await
    }

    async fn execute<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<Option<T>, TransportError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        tracing::debug!(%method, path, "backend request");
        let network = |source| TransportError::Network {
            path: path.to_string(),
            source,
        };
        let resp = req.send().await.map_err(network)?;
        let status = resp.status();
        let text = resp.text().await.map_err(network)?;
        tracing::debug!(%method, path, status = status.as_u16(), "backend response");

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| TransportError::Decode {
                path: path.to_string(),
                source,
            })
    }

    pub async fn health(&self) -> Result<Health, TransportError> {
        let path = "/healthz";
        let body = self.request(Method::GET, path, NO_BODY).await?;
        required(path, body)
    }

    pub async fn list_experiments(&self) -> Result<Vec<Experiment>, TransportError> {
        let rows = self.request(Method::GET, "/experiments", NO_BODY).await?;
        Ok(rows.unwrap_or_default())
    }

    pub async fn get_experiment(&self, id: &str) -> Result<Experiment, TransportError> {
        let path = format!("/experiments/{id}");
        let body = self.request(Method::GET, &path, NO_BODY).await?;
        required(&path, body)
    }

    pub async fn create_experiment(
        &self,
        payload: &ExperimentCreate,
    ) -> Result<Experiment, TransportError> {
        let path = "/experiments";
        let body = self.request(Method::POST, path, Some(payload)).await?;
        required(path, body)
    }

    pub async fn update_experiment(
        &self,
        id: &str,
        payload: &ExperimentUpdate,
    ) -> Result<Experiment, TransportError> {
        let path = format!("/experiments/{id}");
        let body = self.request(Method::PATCH, &path, Some(payload)).await?;
        required(&path, body)
    }

    /// The backend answers 204 with no body on success.
    pub async fn delete_experiment(&self, id: &str) -> Result<(), TransportError> {
        let path = format!("/experiments/{id}");
        let _: Option<serde_json::Value> = self.request(Method::DELETE, &path, NO_BODY).await?;
        Ok(())
    }

    pub async fn launch_run(
        &self,
        experiment_id: &str,
        payload: &LaunchRequest,
    ) -> Result<Run, TransportError> {
        let path = format!("/experiments/{experiment_id}/runs");
        let body = self.request(Method::POST, &path, Some(payload)).await?;
        required(&path, body)
    }

    pub async fn get_run(&self, id: &str) -> Result<Run, TransportError> {
        let path = format!("/runs/{id}");
        let body = self.request(Method::GET, &path, NO_BODY).await?;
        required(&path, body)
    }

    pub async fn get_run_summary(&self, id: &str) -> Result<RunSummaryEnvelope, TransportError> {
        let path = format!("/runs/{id}/summary");
        let body = self.request(Method::GET, &path, NO_BODY).await?;
        required(&path, body)
    }

    /// Attempts for a run in creation order, optionally narrowed to one arm.
    pub async fn list_attempts(
        &self,
        run_id: &str,
        model_arm_id: Option<&str>,
    ) -> Result<Vec<Attempt>, TransportError> {
        let path = format!("/runs/{run_id}/attempts");
        let query: Vec<(&str, &str)> = model_arm_id
            .map(|arm| vec![("model_arm_id", arm)])
            .unwrap_or_default();
        let rows = self.execute(Method::GET, &path, &query, NO_BODY).await?;
        Ok(rows.unwrap_or_default())
    }
}

fn required<T>(path: &str, body: Option<T>) -> Result<T, TransportError> {
    body.ok_or_else(|| TransportError::Empty {
        path: path.to_string(),
    })
}

#[cfg(test)]
pub(crate) fn test_client(base_url: &str) -> ApiClient {
    ApiClient::new(&ClientConfig {
        base_url: base_url.to_string(),
        user_agent: "modeleval-dash/test".into(),
    })
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{experiment_json, run_json};
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_non_success_keeps_raw_body() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/experiments/missing")
            .with_status(404)
            .with_body(r#"{"detail":"Experiment not found"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client.get_experiment("missing").await.unwrap_err();
        assert_eq!(err.to_string(), r#"404 {"detail":"Experiment not found"}"#);
    }

    #[tokio::test]
    async fn test_no_content_is_empty_result() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/experiments")
            .with_status(204)
            .create_async()
            .await;
        let _run = server
            .mock("GET", "/runs/r1")
            .with_status(204)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let raw: Option<serde_json::Value> = client
            .request(Method::GET, "/experiments", NO_BODY)
            .await
            .unwrap();
        assert!(raw.is_none());
        assert!(client.list_experiments().await.unwrap().is_empty());
        assert!(matches!(
            client.get_run("r1").await,
            Err(TransportError::Empty { .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/runs/r1")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client.get_run("r1").await.unwrap_err();
        assert!(matches!(err, TransportError::Decode { .. }));
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn test_launch_posts_json_body() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/experiments/exp-1/runs")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"seed": 42, "failure_threshold": 0.5})))
            .with_status(201)
            .with_body(run_json("run-1", "exp-1", "queued").to_string())
            .create_async()
            .await;

        let client = test_client(&server.url());
        let run = client
            .launch_run(
                "exp-1",
                &LaunchRequest {
                    seed: Some(42),
                    failure_threshold: Some(0.5),
                },
            )
            .await
            .unwrap();
        m.assert_async().await;
        assert_eq!(run.id, "run-1");
        assert_eq!(run.status, crate::model::RunStatus::Queued);
    }

    #[tokio::test]
    async fn test_attempts_filter_by_arm() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/runs/r1/attempts")
            .match_query(Matcher::UrlEncoded("model_arm_id".into(), "arm-1".into()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let rows = client.list_attempts("r1", Some("arm-1")).await.unwrap();
        m.assert_async().await;
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_update_experiment_sends_only_changed_fields() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("PATCH", "/experiments/exp-1")
            .match_body(Matcher::Json(json!({"name": "Renamed"})))
            .with_status(200)
            .with_body(experiment_json("exp-1", "Renamed").to_string())
            .create_async()
            .await;

        let client = test_client(&format!("{}/", server.url()));
        let update = ExperimentUpdate {
            name: Some("Renamed".into()),
            ..Default::default()
        };
        let exp = client.update_experiment("exp-1", &update).await.unwrap();
        m.assert_async().await;
        assert_eq!(exp.name, "Renamed");
    }

    #[tokio::test]
    async fn test_delete_experiment_accepts_no_content() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("DELETE", "/experiments/exp-1")
            .with_status(204)
            .create_async()
            .await;

        let client = test_client(&server.url());
        client.delete_experiment("exp-1").await.unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_missing_experiment_keeps_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("DELETE", "/experiments/gone")
            .with_status(404)
            .with_body(r#"{"detail":"Experiment not found"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client.delete_experiment("gone").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), r#"404 {"detail":"Experiment not found"}"#);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        // Nothing listens on port 9 on test hosts.
        let client = test_client("http://127.0.0.1:9");
        let err = client.health().await.unwrap_err();
        assert!(matches!(err, TransportError::Network { .. }));
    }
}
