use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{header, Client, StatusCode};

use super::types::*;
use crate::config::Config;

pub struct ScheduleClient {
    client: Client,
    base_url: String,
    auth_header: String,
}

impl ScheduleClient {
    pub fn new(config: &Config) -> Result<Self> {
        let token = config.api_token.as_ref()
            .context("API token not configured")?;

        let auth_string = format!("{}:{}", config.partner_id.trim(), token);
        let auth_header = format!("Basic {}", STANDARD.encode(auth_string));

        let client = Client::builder()
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            auth_header,
        })
    }

    /// Get a partner's stored weekly schedule.
    /// `None` when the partner has never saved one, or when the stored body
    /// cannot be decoded.
    pub async fn fetch_weekly_schedule(&self, partner_id: &str) -> Result<Option<WeeklySchedule>> {
        let url = format!("{}{}", self.base_url, availability_endpoint(partner_id));

        let response = self.client
            .get(&url)
            .header(header::AUTHORIZATION, &self.auth_header)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::info!(partner_id, "no stored schedule");
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API request failed: {} - {}", status, body);
        }

        let body = response.text().await
            .context("Failed to read schedule response")?;
        Ok(decode_schedule(partner_id, &body))
    }

    /// Replace a partner's stored schedule with `schedule`.
    pub async fn save_weekly_schedule(&self, partner_id: &str, schedule: &WeeklySchedule) -> Result<()> {
        let url = format!("{}{}", self.base_url, availability_endpoint(partner_id));

        let response = self.client
            .put(&url)
            .header(header::AUTHORIZATION, &self.auth_header)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .json(schedule)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API request failed: {} - {}", status, body);
        }

        tracing::info!(partner_id, records = schedule.slot_record_count(), "schedule saved");
        Ok(())
    }
}

fn availability_endpoint(partner_id: &str) -> String {
    format!("/partners/{}/availability", urlencoding::encode(partner_id.trim()))
}

/// Empty bodies and `null` mean "no schedule"; undecodable bodies are
/// logged and treated the same way.
fn decode_schedule(partner_id: &str, body: &str) -> Option<WeeklySchedule> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<Option<WeeklySchedule>>(body) {
        Ok(schedule) => schedule,
        Err(e) => {
            tracing::warn!(partner_id, error = %e, "stored schedule is malformed");
            None
        }
    }
}

/// Whether an error looks like lost connectivity rather than a server answer
pub fn is_network_error(err: &anyhow::Error) -> bool {
    if let Some(e) = err.downcast_ref::<reqwest::Error>() {
        if e.is_connect() || e.is_timeout() {
            return true;
        }
    }

    let err_str = format!("{:#}", err).to_lowercase();
    ["connection", "network", "dns", "resolve", "timeout", "unreachable",
     "error sending request", "no route", "failed to lookup"]
        .iter()
        .any(|needle| err_str.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_encodes_partner_id() {
        assert_eq!(availability_endpoint("p-17"), "/partners/p-17/availability");
        assert_eq!(availability_endpoint(" a/b c "), "/partners/a%2Fb%20c/availability");
    }

    #[test]
    fn decodes_missing_and_malformed_bodies_as_none() {
        assert_eq!(decode_schedule("p", ""), None);
        assert_eq!(decode_schedule("p", "null"), None);
        assert_eq!(decode_schedule("p", "{\"partnerId\": 3}"), None);
        assert_eq!(decode_schedule("p", "<html>"), None);
    }

    #[test]
    fn decodes_a_schedule_body() {
        let body = r#"{"partnerId":"p","schedule":[],"slotDurationMinutes":30,
                       "bufferTimeMinutes":0,"maxAdvanceBookingDays":30}"#;
        let schedule = decode_schedule("p", body).unwrap();
        assert_eq!(schedule.slot_duration_minutes, 30);
    }

    #[test]
    fn classifies_network_errors_by_message() {
        assert!(is_network_error(&anyhow::anyhow!("error sending request for url")));
        assert!(!is_network_error(&anyhow::anyhow!("API request failed: 500 - boom")));
    }

    #[test]
    fn client_requires_a_token() {
        let config = Config {
            api_base_url: "api.example.com".to_string(),
            partner_id: "p".to_string(),
            ..Config::default()
        };
        assert!(ScheduleClient::new(&config).is_err());
    }
}
