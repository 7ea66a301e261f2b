//! Shared HTTP plumbing for provider clients

use crate::search::provider::ProviderError;
use governor::{Quota, RateLimiter};
use reqwest::{Client, Response, StatusCode};
use std::num::NonZeroU32;
use std::time::Duration;

/// User-Agent sent to every provider (Wikimedia requires a descriptive one)
pub const USER_AGENT: &str = concat!(
    "evs-sourcing/",
    env!("CARGO_PKG_VERSION"),
    " (episode visual sourcing)"
);

/// Direct (unkeyed) rate limiter used by each provider client
pub type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Build an HTTP client with the given total timeout
pub fn build_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(5).min(timeout))
        .build()
        .map_err(|e| ProviderError::Network(e.to_string()))
}

/// Rate limiter allowing `per_second` requests per second (minimum 1)
pub fn rate_limiter(per_second: u32) -> DirectRateLimiter {
    let rate = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
    RateLimiter::direct(Quota::per_second(rate))
}

/// Map transport errors onto provider errors
pub fn map_send_error(err: reqwest::Error, timeout: Duration) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(timeout)
    } else {
        ProviderError::Network(err.to_string())
    }
}

/// Turn non-success statuses into provider errors
pub async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited);
    }
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api(status.as_u16(), error_text));
    }
    Ok(response)
}

/// Parse a JSON body into `T`
pub async fn parse_json<T: serde::de::DeserializeOwned>(
    response: Response,
) -> Result<T, ProviderError> {
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::Network(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| ProviderError::Parse(e.to_string()))
}

/// Strip HTML tags and collapse whitespace (Wikimedia metadata is HTML)
pub fn strip_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&nbsp;", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(build_client(Duration::from_secs(10)).is_ok());
    }

    #[test]
    fn test_rate_limiter_allows_first_request() {
        let limiter = rate_limiter(1);
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<a href=\"x\">Jane&nbsp;Doe</a>  &amp; <b>co</b>"),
            "Jane Doe & co"
        );
        assert_eq!(strip_html("plain"), "plain");
    }
}
