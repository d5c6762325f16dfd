use std::fmt;

use serde_json::{Map, Value, json};

/// Reasons after which a device token will never be accepted again.
const INVALID_TOKEN_REASONS: &[&str] = &["Unregistered", "BadDeviceToken"];

/// An alert notification, shared by every recipient of one send.
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub sound: Option<String>,
    pub badge: Option<u32>,
    /// In-app route the client opens when the notification is tapped.
    pub destination: Option<String>,
}

impl PushMessage {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            sound: Some("default".into()),
            badge: Some(1),
            destination: None,
        }
    }

    /// The JSON document sent as the APNs request body.
    pub fn to_payload(&self) -> Value {
        let mut aps = Map::new();
        aps.insert(
            "alert".into(),
            json!({ "title": self.title, "body": self.body }),
        );
        if let Some(sound) = &self.sound {
            aps.insert("sound".into(), json!(sound));
        }
        if let Some(badge) = self.badge {
            aps.insert("badge".into(), json!(badge));
        }

        let mut root = Map::new();
        root.insert("aps".into(), Value::Object(aps));
        if let Some(destination) = &self.destination {
            root.insert("destination".into(), json!(destination));
        }
        Value::Object(root)
    }
}

/// Value of the `apns-push-type` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushType {
    Alert,
    Background,
    Voip,
    Complication,
    FileProvider,
}

impl PushType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Background => "background",
            Self::Voip => "voip",
            Self::Complication => "complication",
            Self::FileProvider => "fileprovider",
        }
    }

    /// APNs rejects priority 10 for background pushes.
    pub fn priority(&self) -> &'static str {
        match self {
            Self::Background => "5",
            _ => "10",
        }
    }
}

/// Derive the push type from the topic suffix and the `aps` dictionary.
pub fn push_type_for(topic: &str, payload: &Value) -> PushType {
    if topic.ends_with(".voip") {
        return PushType::Voip;
    }
    if topic.ends_with(".complication") {
        return PushType::Complication;
    }
    if topic.ends_with(".pushkit.fileprovider") {
        return PushType::FileProvider;
    }
    let aps = payload.get("aps").and_then(Value::as_object);
    if let Some(aps) = aps
        && aps.contains_key("content-available")
        && !["alert", "badge", "sound"].iter().any(|k| aps.contains_key(*k))
    {
        return PushType::Background;
    }
    PushType::Alert
}

/// Outcome of delivering to one device token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Success,
    /// APNs answered with an error reason, e.g. `BadDeviceToken`.
    Rejected(String),
    /// The request never produced an APNs answer.
    Failed(String),
}

impl DeliveryStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Whether the token should be dropped from the device registry.
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, Self::Rejected(reason) if INVALID_TOKEN_REASONS.contains(&reason.as_str()))
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("Success"),
            Self::Rejected(reason) => f.write_str(reason),
            Self::Failed(detail) => write!(f, "ConnectionFailed: {detail}"),
        }
    }
}
