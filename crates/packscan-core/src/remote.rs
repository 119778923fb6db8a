//! Remote analysis endpoint client
//!
//! One request/response exchange per scan session. The contract is a single
//! attempt with no retry and no client-side timeout; any transport or parse
//! failure surfaces immediately as [`ScanError::RemoteCall`].

use async_trait::async_trait;
use reqwest::Client;

use crate::core_types::{AnalysisRequest, AnalysisResponse};
use crate::errors::ScanError;

#[async_trait]
pub trait AnalysisClient: Send + Sync {
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResponse, ScanError>;
}

#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    endpoint_url: String,
    client: Client,
}

impl HttpAnalysisClient {
    pub fn new(endpoint_url: String) -> Self {
        Self {
            endpoint_url,
            client: Client::new(),
        }
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }
}

#[async_trait]
impl AnalysisClient for HttpAnalysisClient {
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResponse, ScanError> {
        let request_url = format!("{}/api/scan", self.endpoint_url);
        log::debug!(
            "Sending {} analysis request to {}",
            request.scan_type,
            request_url
        );

        match self.client.post(&request_url).json(&request).send().await {
            Ok(response) => {
                if response.status().is_success() {
                    match response.json::<AnalysisResponse>().await {
                        Ok(analysis) => {
                            log::debug!(
                                "Analysis response received, maintenance={}",
                                analysis.maintenance
                            );
                            Ok(analysis)
                        }
                        Err(e) => {
                            let err_msg = format!("Failed to parse analysis response JSON: {}", e);
                            log::error!("{}", err_msg);
                            Err(ScanError::RemoteCall(err_msg))
                        }
                    }
                } else {
                    let status = response.status();
                    let error_text = response.text().await.unwrap_or_else(|_| {
                        "Unknown error while reading error response body".to_string()
                    });
                    let err_msg = format!(
                        "Analysis request failed with status {}: {}",
                        status, error_text
                    );
                    log::error!("{}", err_msg);
                    Err(ScanError::RemoteCall(err_msg))
                }
            }
            Err(e) => {
                let err_msg = format!("HTTP request to analysis endpoint failed: {}", e);
                log::error!("{}", err_msg);
                Err(ScanError::RemoteCall(err_msg))
            }
        }
    }
}
