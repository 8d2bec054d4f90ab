//! Client for the mobile-money gateway (Lumicash, EcoCash, M-Pesa).
//!
//! The core's obligation is limited to initiating collections and
//! disbursements, recording the channel reference, and resolving the
//! transaction status when the gateway calls back.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mobile-money client errors.
#[derive(Debug, Error)]
pub enum PaymentsError {
    /// The collaborator is not configured.
    #[error("payments gateway is not configured")]
    NotConfigured,
    /// The phone number is not a valid Burundian mobile number.
    #[error("invalid phone number: {0}")]
    InvalidPhone(String),
    /// Transport-level failure.
    #[error("payment request failed: {0}")]
    Request(String),
    /// The gateway answered with a non-success status.
    #[error("payments gateway returned status {0}")]
    Status(u16),
}

/// Direction of a mobile-money operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentDirection {
    /// Pulling money from a member's wallet into the group.
    Collection,
    /// Pushing money from the group to a member's wallet.
    Disbursement,
}

/// Request to initiate a mobile-money operation.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    /// Our ledger transaction reference.
    pub reference: String,
    /// Collection or disbursement.
    pub direction: PaymentDirection,
    /// Payment channel (`lumicash`, `ecocash`, `mpesa`).
    pub channel: String,
    /// Member phone number (international format).
    pub phone: String,
    /// Amount in FBU.
    pub amount: Decimal,
}

/// Gateway acknowledgement for an initiated operation.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentAck {
    /// Channel-side reference for the operation.
    pub channel_reference: String,
}

/// Asynchronous status callback posted by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCallback {
    /// Our ledger transaction reference.
    pub reference: String,
    /// Channel-side reference.
    pub channel_reference: String,
    /// Final status: `completed` or `failed`.
    pub status: String,
    /// Optional failure detail.
    pub detail: Option<String>,
}

/// Normalizes a Burundian phone number to international format.
#[must_use]
pub fn normalize_phone(phone: &str) -> String {
    let digits: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    if let Some(rest) = digits.strip_prefix('0') {
        format!("+257{rest}")
    } else if digits.starts_with('+') {
        digits
    } else {
        format!("+257{digits}")
    }
}

/// Validates a Burundian mobile number (+257 6x/7x, 8 digits).
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    let normalized = normalize_phone(phone);
    let Some(rest) = normalized.strip_prefix("+257") else {
        return false;
    };
    rest.len() == 8
        && rest.chars().all(|c| c.is_ascii_digit())
        && matches!(rest.as_bytes()[0], b'6' | b'7')
}

/// Client for the mobile-money gateway.
#[derive(Clone)]
pub struct PaymentsClient {
    base_url: Option<String>,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl PaymentsClient {
    /// Creates a new payments client. `base_url` of `None` disables it.
    #[must_use]
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            base_url,
            api_key,
            http: reqwest::Client::new(),
        }
    }

    /// Returns true if the collaborator is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Initiates a collection or disbursement at the gateway.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway is not configured, the phone
    /// number is invalid, or the request fails.
    pub async fn initiate(&self, request: &PaymentRequest) -> Result<PaymentAck, PaymentsError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or(PaymentsError::NotConfigured)?;

        if !is_valid_phone(&request.phone) {
            return Err(PaymentsError::InvalidPhone(request.phone.clone()));
        }

        let url = format!("{}/api/v1/payments", base.trim_end_matches('/'));
        let mut builder = self.http.post(url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| PaymentsError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PaymentsError::Status(response.status().as_u16()));
        }

        response
            .json::<PaymentAck>()
            .await
            .map_err(|e| PaymentsError::Request(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("079123456"), "+25779123456");
        assert_eq!(normalize_phone("+25779123456"), "+25779123456");
        assert_eq!(normalize_phone("79 12 34 56"), "+25779123456");
    }

    #[test]
    fn test_is_valid_phone() {
        assert!(is_valid_phone("+25779123456"));
        assert!(is_valid_phone("061234567"));
        assert!(!is_valid_phone("+25712345678"));
        assert!(!is_valid_phone("+2577912345"));
        assert!(!is_valid_phone("not-a-phone"));
    }

    #[test]
    fn test_unconfigured_client() {
        let client = PaymentsClient::new(None, None);
        assert!(!client.is_configured());
    }
}
