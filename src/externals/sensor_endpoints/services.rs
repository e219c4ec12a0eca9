use std::{future::Future, time::Duration};

use anyhow::{Context, Result};
use reqwest::{StatusCode, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, trace};

use crate::{
    config::EndpointPaths,
    models::reading::{Quantity, Reading, ReadingError},
};

/// This service separates fetching readings from the sensor's web server
/// from the refresh cycle, which makes the cycle easy to unit test.
pub trait ReadingService {
    /// Fetch and decode the current value of one quantity.
    fn fetch(&self, quantity: Quantity) -> impl Future<Output = Result<Reading, FetchError>> + Send;
}

#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection, timeout or body transfer failure.
    #[error("Request to {url} failed. Error: {source}")]
    Request {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with status {status}")]
    Status { url: Url, status: StatusCode },

    #[error("Body from {url} is not JSON. Error: {source}")]
    Decode {
        url: Url,
        #[source]
        source: serde_json::Error,
    },

    #[error("Body from {url} is not a number: {body}")]
    NotANumber { url: Url, body: String },

    #[error("Invalid {quantity} reading. Error: {source}")]
    Invalid {
        quantity: Quantity,
        #[source]
        source: ReadingError,
    },

    #[error("Endpoint path '{path}' can't be joined to {base}")]
    Endpoint { base: Url, path: String },
}

/// Reads the sensor's `data/*` endpoints over HTTP.
pub struct ReadingServiceActual {
    client: reqwest::Client,
    base_url: Url,
    endpoints: EndpointPaths,
}

impl ReadingServiceActual {
    pub fn new(base_url: Url, endpoints: EndpointPaths, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            endpoints,
        })
    }

    pub fn endpoint_url(&self, quantity: Quantity) -> Result<Url, FetchError> {
        let path = self.endpoints.path(quantity);
        self.base_url
            .join(path)
            .map_err(|_| FetchError::Endpoint {
                base: self.base_url.clone(),
                path: path.to_string(),
            })
    }
}

impl ReadingService for ReadingServiceActual {
    #[instrument(skip(self))]
    async fn fetch(&self, quantity: Quantity) -> Result<Reading, FetchError> {
        let url = self.endpoint_url(quantity)?;
        trace!("Requesting {}.", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status });
        }

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;
        debug!("Received body from {}: {}", url, body.trim());

        let raw = decode_number(&url, &body)?;
        Reading::from_raw(quantity, raw).map_err(|source| FetchError::Invalid { quantity, source })
    }
}

/// Decode a body holding a bare JSON number.
/// A JSON string is accepted too and read up to its first non-numeric character.
fn decode_number(url: &Url, body: &str) -> Result<f64, FetchError> {
    let value: Value = serde_json::from_str(body).map_err(|source| FetchError::Decode {
        url: url.clone(),
        source,
    })?;

    let number = match &value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_float_prefix(text),
        _ => None,
    };

    number.ok_or_else(|| FetchError::NotANumber {
        url: url.clone(),
        body: body.trim().to_string(),
    })
}

/// Parse the longest numeric prefix of `text`, skipping leading whitespace.
/// "21.5 degC" -> 21.5, "abc" -> None.
fn parse_float_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let integer_digits = digits_from(end);
    end += integer_digits;

    let mut fraction_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction_digits = digits_from(end + 1);
        if fraction_digits > 0 {
            end += 1 + fraction_digits;
        }
    }

    if integer_digits + fraction_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent_end = end + 1;
        if matches!(bytes.get(exponent_end), Some(b'+' | b'-')) {
            exponent_end += 1;
        }
        let exponent_digits = digits_from(exponent_end);
        if exponent_digits > 0 {
            end = exponent_end + exponent_digits;
        }
    }

    text[..end].parse().ok()
}
