//! Detection endpoint client.
//!
//! Submits one JPEG-encoded frame per request and decodes the JSON response.
//! The request carries a hard timeout; timeouts, non-2xx statuses and
//! undecodable bodies are all classified into the `HeadcountError` taxonomy
//! so the poller can treat them uniformly as cycle failures.

use std::time::Duration;

use url::Url;

use crate::detect::result::DetectionResult;
use crate::error::HeadcountError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Seam for the detection collaborator. The production implementation is
/// HTTP; tests substitute scripted clients.
pub trait DetectClient: Send {
    /// Submit one encoded frame, blocking until response, failure or timeout.
    fn detect(&mut self, jpeg: &[u8]) -> Result<DetectionResult, HeadcountError>;
}

/// HTTP detection client.
pub struct HttpDetectClient {
    agent: ureq::Agent,
    url: String,
}

impl HttpDetectClient {
    pub fn new(url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Url::parse(url).map_err(|e| anyhow::anyhow!("invalid detection url '{}': {}", url, e))?;
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout(timeout)
            .build();
        Ok(Self {
            agent,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl DetectClient for HttpDetectClient {
    fn detect(&mut self, jpeg: &[u8]) -> Result<DetectionResult, HeadcountError> {
        let response = self
            .agent
            .post(&self.url)
            .set("Content-Type", "image/jpeg")
            .send_bytes(jpeg)
            .map_err(classify_request_error)?;

        let mut result: DetectionResult = response
            .into_json()
            .map_err(|e| HeadcountError::MalformedResponse(e.to_string()))?;

        if let Some(message) = result.error.take() {
            return Err(HeadcountError::DetectorReported(message));
        }
        result
            .validate()
            .map_err(HeadcountError::MalformedResponse)?;
        Ok(result)
    }
}

/// Map a ureq failure onto the error taxonomy.
///
/// Timeouts surface from ureq as transport errors wrapping an io error, so
/// both the io kind and the rendered message are checked.
fn classify_request_error(err: ureq::Error) -> HeadcountError {
    match err {
        ureq::Error::Status(code, _) => HeadcountError::RequestFailed(code),
        ureq::Error::Transport(transport) => {
            let timed_out = std::error::Error::source(&transport)
                .and_then(|source| source.downcast_ref::<std::io::Error>())
                .map(|io| {
                    matches!(
                        io.kind(),
                        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                    )
                })
                .unwrap_or(false)
                || transport.to_string().contains("timed out");
            if timed_out {
                HeadcountError::RequestTimeout
            } else {
                HeadcountError::Network(transport.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparsable_url() {
        assert!(HttpDetectClient::new("not a url", DEFAULT_REQUEST_TIMEOUT).is_err());
    }

    #[test]
    fn status_errors_map_to_request_failed() {
        let fake = ureq::Error::Status(500, ureq::Response::new(500, "Internal Error", "").unwrap());
        assert_eq!(
            classify_request_error(fake),
            HeadcountError::RequestFailed(500)
        );
    }
}
