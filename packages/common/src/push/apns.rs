use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use super::error::PushError;
use super::message::{DeliveryStatus, PushMessage, push_type_for};
use super::traits::PushSender;

const LIVE_SERVER: &str = "https://api.push.apple.com";
const SANDBOX_SERVER: &str = "https://api.sandbox.push.apple.com";

/// APNs accepts provider tokens for an hour and rejects refreshes more
/// frequent than every 20 minutes.
const PROVIDER_TOKEN_LIFETIME: Duration = Duration::from_secs(50 * 60);

/// Token-based APNs credentials (`.p8` key).
#[derive(Clone)]
pub struct ApnsCredentials {
    pub team_id: String,
    pub key_id: String,
    /// PEM-encoded PKCS#8 EC private key.
    pub private_key_pem: String,
    /// App bundle id, sent as `apns-topic`.
    pub bundle_id: String,
}

impl ApnsCredentials {
    pub async fn from_key_file(
        team_id: String,
        key_id: String,
        key_path: &Path,
        bundle_id: String,
    ) -> Result<Self, PushError> {
        let private_key_pem = tokio::fs::read_to_string(key_path).await?;
        Ok(Self {
            team_id,
            key_id,
            private_key_pem,
            bundle_id,
        })
    }
}

#[derive(Serialize)]
struct ProviderClaims<'a> {
    iss: &'a str,
    iat: i64,
}

#[derive(Deserialize)]
struct ApnsErrorBody {
    reason: String,
}

struct ProviderToken {
    value: String,
    issued_at: Instant,
}

/// HTTP/2 client for the Apple Push Notification service.
pub struct ApnsClient {
    http: reqwest::Client,
    server: &'static str,
    team_id: String,
    key_id: String,
    topic: String,
    key: EncodingKey,
    concurrency: usize,
    token: Mutex<Option<ProviderToken>>,
}

impl ApnsClient {
    pub fn new(
        credentials: ApnsCredentials,
        sandbox: bool,
        concurrency: usize,
    ) -> Result<Self, PushError> {
        let key = EncodingKey::from_ec_pem(credentials.private_key_pem.as_bytes())
            .map_err(PushError::InvalidKey)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            server: if sandbox { SANDBOX_SERVER } else { LIVE_SERVER },
            team_id: credentials.team_id,
            key_id: credentials.key_id,
            topic: credentials.bundle_id,
            key,
            concurrency,
            token: Mutex::new(None),
        })
    }

    /// Return the cached provider token, signing a new one when it is stale.
    fn provider_token(&self) -> Result<String, PushError> {
        let mut slot = self.token.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(token) = slot.as_ref()
            && token.issued_at.elapsed() < PROVIDER_TOKEN_LIFETIME
        {
            return Ok(token.value.clone());
        }

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.key_id.clone());
        let claims = ProviderClaims {
            iss: &self.team_id,
            iat: chrono::Utc::now().timestamp(),
        };
        let value = encode(&header, &claims, &self.key).map_err(PushError::Signing)?;
        tracing::debug!(key_id = %self.key_id, "Signed new APNs provider token");

        *slot = Some(ProviderToken {
            value: value.clone(),
            issued_at: Instant::now(),
        });
        Ok(value)
    }
}

#[async_trait]
impl PushSender for ApnsClient {
    async fn send(&self, token: &str, message: &PushMessage) -> DeliveryStatus {
        let bearer = match self.provider_token() {
            Ok(bearer) => bearer,
            Err(e) => return DeliveryStatus::Failed(e.to_string()),
        };

        let payload = message.to_payload();
        let push_type = push_type_for(&self.topic, &payload);
        let url = format!("{}/3/device/{}", self.server, token);

        let response = self
            .http
            .post(&url)
            .bearer_auth(bearer)
            .header("apns-topic", &self.topic)
            .header("apns-push-type", push_type.as_str())
            .header("apns-priority", push_type.priority())
            .json(&payload)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "APNs request failed");
                return DeliveryStatus::Failed(e.to_string());
            }
        };

        let status = response.status();
        if status.is_success() {
            return DeliveryStatus::Success;
        }

        let reason = match response.json::<ApnsErrorBody>().await {
            Ok(body) => body.reason,
            Err(_) => format!("HTTP {}", status.as_u16()),
        };
        tracing::info!(status = status.as_u16(), %reason, "APNs rejected notification");
        DeliveryStatus::Rejected(reason)
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }
}
