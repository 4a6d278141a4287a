//! Attendance persistence client.
//!
//! REST client for the attendance backend: create one timestamped count
//! (lesson and time attributed server-side), read history with optional date
//! and lesson-number filters, and read the two aggregate views (per-lesson
//! time series, per-day maximum per lesson). Failures here are surfaced to
//! the caller and logged; they never block the detection loop.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// One stored attendance reading. Timestamps are carried as opaque
/// server-attributed strings; this client never interprets them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttendanceRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub timestamp: String,
    pub count: u32,
    #[serde(default)]
    pub lesson_number: Option<u32>,
}

/// One point of the per-lesson time series aggregate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LessonSeriesPoint {
    pub lesson_number: u32,
    pub timestamp: String,
    pub count: u32,
}

/// One row of the per-day maximum-per-lesson aggregate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DailyMax {
    pub date: String,
    pub lesson_number: u32,
    pub max_count: u32,
}

#[derive(Serialize)]
struct AttendanceCreate {
    count: u32,
}

pub struct AttendanceClient {
    agent: ureq::Agent,
    base_url: String,
}

impl AttendanceClient {
    /// `base_url` is the API prefix, e.g. `http://127.0.0.1:8000/api/v1`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Url::parse(base_url)
            .with_context(|| format!("invalid attendance base url '{}'", base_url))?;
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout(timeout)
            .build();
        Ok(Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create one attendance record for the current count.
    pub fn record(&self, count: u32) -> Result<AttendanceRecord> {
        let url = format!("{}/attendance", self.base_url);
        let response = self
            .agent
            .post(&url)
            .send_json(AttendanceCreate { count })
            .with_context(|| format!("post attendance count to {}", url))?;
        response
            .into_json()
            .context("decode attendance create response")
    }

    /// Read history, newest first, optionally filtered by date
    /// (`YYYY-MM-DD`) and lesson number.
    pub fn history(
        &self,
        date: Option<&str>,
        lesson_number: Option<u32>,
        limit: u32,
    ) -> Result<Vec<AttendanceRecord>> {
        let url = format!("{}/attendance", self.base_url);
        let mut request = self.agent.get(&url).query("limit", &limit.to_string());
        if let Some(date) = date {
            request = request.query("date", date);
        }
        if let Some(lesson) = lesson_number {
            request = request.query("lesson_number", &lesson.to_string());
        }
        let response = request
            .call()
            .with_context(|| format!("fetch attendance history from {}", url))?;
        response.into_json().context("decode attendance history")
    }

    /// Per-lesson time series, optionally for a single date.
    pub fn lesson_series(&self, date: Option<&str>) -> Result<Vec<LessonSeriesPoint>> {
        let url = format!("{}/attendance/stats/lessons", self.base_url);
        let mut request = self.agent.get(&url);
        if let Some(date) = date {
            request = request.query("date", date);
        }
        let response = request
            .call()
            .with_context(|| format!("fetch lesson series from {}", url))?;
        response.into_json().context("decode lesson series")
    }

    /// Per-day maximum count for each lesson.
    pub fn daily_max(&self) -> Result<Vec<DailyMax>> {
        let url = format!("{}/attendance/stats/daily-max", self.base_url);
        let response = self
            .agent
            .get(&url)
            .call()
            .with_context(|| format!("fetch daily maxima from {}", url))?;
        response.into_json().context("decode daily maxima")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_normalized() {
        let client =
            AttendanceClient::new("http://127.0.0.1:8000/api/v1/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8000/api/v1");
    }

    #[test]
    fn record_deserializes_original_response_shape() {
        let json = r#"{"id": 12, "timestamp": "2024-05-17T09:31:02", "count": 23}"#;
        let record: AttendanceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.count, 23);
        assert_eq!(record.lesson_number, None);
    }
}
