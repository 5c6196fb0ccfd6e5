use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, error, warn};

use imgfleet_core::{
    DispatcherChannel, FleetError, FleetResult, PullRequest, StatisticsReport, TaskAssignment,
};

/// 通过 HTTP 与协调器通信的客户端
pub struct HttpDispatcherClient {
    dispatcher_url: String,
    http_client: reqwest::Client,
}

impl HttpDispatcherClient {
    pub fn new(dispatcher_url: &str, request_timeout: Duration) -> FleetResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| FleetError::Network(format!("创建HTTP客户端失败: {e}")))?;
        Ok(Self {
            dispatcher_url: dispatcher_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn dispatcher_url(&self) -> &str {
        &self.dispatcher_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.dispatcher_url, path)
    }

    async fn post<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> FleetResult<reqwest::Response> {
        let url = self.endpoint(path);
        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to connect to dispatcher at {}: {}", url, e);
                FleetError::Network(format!("Dispatcher connection error: {e}"))
            })?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::CONFLICT => {
                let body = response.text().await.unwrap_or_default();
                warn!("Dispatcher ignored request to {}: {}", path, body);
                Err(FleetError::protocol_violation(format!(
                    "dispatcher ignored request: {body}"
                )))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                error!("Dispatcher request failed: HTTP {} - {}", status, body);
                Err(FleetError::Network(format!(
                    "Dispatcher request failed: HTTP {status} - {body}"
                )))
            }
        }
    }
}

#[async_trait]
impl DispatcherChannel for HttpDispatcherClient {
    async fn pull_task(&self, request: PullRequest) -> FleetResult<TaskAssignment> {
        let response = self.post("/api/v1/tasks/pull", &request).await?;
        let assignment = response
            .json::<TaskAssignment>()
            .await
            .map_err(|e| FleetError::Serialization(format!("无法解析任务分配: {e}")))?;
        debug!("worker {} 收到分配: {:?}", request.worker_id, assignment);
        Ok(assignment)
    }

    async fn report_statistics(&self, report: StatisticsReport) -> FleetResult<()> {
        self.post("/api/v1/statistics", &report).await?;
        debug!("worker {} 已上报统计", report.worker_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgfleet_core::WorkerId;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client =
            HttpDispatcherClient::new("http://localhost:8080/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.dispatcher_url(), "http://localhost:8080");
        assert_eq!(
            client.endpoint("/api/v1/tasks/pull"),
            "http://localhost:8080/api/v1/tasks/pull"
        );
    }

    #[tokio::test]
    async fn test_unreachable_dispatcher_is_network_error() {
        let client =
            HttpDispatcherClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client
            .pull_task(PullRequest::new(WorkerId::new("1")))
            .await
            .unwrap_err();
        assert!(matches!(err, FleetError::Network(_)));
    }
}
