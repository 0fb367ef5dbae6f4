use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};

type HmacSha512 = Hmac<Sha512>;

/// Header Paystack signs webhook deliveries with.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

#[derive(Debug, Clone)]
pub struct PaystackClient {
    client: Client,
    secret_key: String,
    api_base: String,
}

impl PaystackClient {
    pub fn new(secret_key: &str, api_base: &str) -> Self {
        Self {
            client: Client::new(),
            secret_key: secret_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Verify a webhook delivery: HMAC-SHA512 of the exact raw body bytes,
    /// keyed with the account secret, hex-encoded, against the
    /// `x-paystack-signature` header.
    ///
    /// Must be fed the untouched byte stream. Parsing the JSON and
    /// re-serializing is not byte-stable and would break verification.
    pub fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> bool {
        let mut mac = match HmacSha512::new_from_slice(self.secret_key.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(payload);
        let expected = hex::encode(mac.finalize().into_bytes());

        // Use constant-time comparison to prevent timing attacks.
        // An attacker could otherwise measure response times to progressively
        // discover the correct signature byte-by-byte.
        let expected_bytes = expected.as_bytes();
        let provided_bytes = signature.as_bytes();

        // Length check is not constant-time, but that's fine - signature length
        // is not secret (it's always 128 hex chars for SHA-512)
        if expected_bytes.len() != provided_bytes.len() {
            return false;
        }

        expected_bytes.ct_eq(provided_bytes).into()
    }

    /// Open a checkout on Paystack and get the URL to send the payer to.
    pub async fn initialize_transaction(
        &self,
        email: &str,
        amount_kobo: i64,
        reference: &str,
        callback_url: &str,
    ) -> Result<InitializedPayment> {
        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.api_base))
            .bearer_auth(&self.secret_key)
            .json(&serde_json::json!({
                "email": email,
                "amount": amount_kobo,
                "reference": reference,
                "callback_url": callback_url,
            }))
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("initialize request failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!("initialize rejected: {}", error_text)));
        }

        let body: PaystackResponse<InitializedPayment> = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("invalid initialize response: {}", e)))?;

        if !body.status {
            return Err(AppError::Gateway(format!("initialize failed: {}", body.message)));
        }
        body.data
            .ok_or_else(|| AppError::Gateway("initialize response missing data".into()))
    }

    /// Ask Paystack for the authoritative state of a charge. Used by the
    /// callback flow as a fallback when the webhook has not landed yet.
    pub async fn verify_transaction(&self, reference: &str) -> Result<ChargeVerification> {
        let response = self
            .client
            .get(format!("{}/transaction/verify/{}", self.api_base, reference))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("verify request failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!("verify rejected: {}", error_text)));
        }

        let body: PaystackResponse<ChargeVerification> = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("invalid verify response: {}", e)))?;

        if !body.status {
            return Err(AppError::Gateway(format!("verify failed: {}", body.message)));
        }
        body.data
            .ok_or_else(|| AppError::Gateway("verify response missing data".into()))
    }
}

/// Paystack's uniform response envelope.
#[derive(Debug, Deserialize)]
struct PaystackResponse<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct InitializedPayment {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// The slice of `GET /transaction/verify/{reference}` data the callback
/// flow acts on. Serialized back out when stored as the audit snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChargeVerification {
    pub reference: String,
    /// "success", "failed", "abandoned", or an in-flight state like "ongoing".
    pub status: String,
    pub amount: i64,
    #[serde(default)]
    pub gateway_response: Option<String>,
    #[serde(default)]
    pub paid_at: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
}

/// Webhook envelope. `data` stays opaque here; the dispatcher pulls out the
/// reference and stores the rest as the audit snapshot.
#[derive(Debug, Deserialize)]
pub struct PaystackWebhookEvent {
    pub event: String,
    pub data: serde_json::Value,
}
