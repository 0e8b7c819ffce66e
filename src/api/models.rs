use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Sender label the server uses for messages written by the viewer.
pub const SELF_SENDER: &str = "You";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Contact {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub profile_pic: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    pub id: i64,
    pub sender: String,
    pub content: String,
    #[serde(default)]
    pub attachment: Option<String>,
    pub timestamp: String,
}

impl Message {
    pub fn is_mine(&self) -> bool {
        self.sender == SELF_SENDER
    }

    /// Server timestamps are naive UTC.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct SendReceipt {
    pub message_id: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub async fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".into());
        Ok(Self { file_name, bytes })
    }

    pub fn mime(&self) -> String {
        mime_guess::from_path(&self.file_name)
            .first_or_octet_stream()
            .to_string()
    }
}

/// What the composer submits: text plus an optional file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub content: String,
    pub attachment: Option<Attachment>,
}

impl Draft {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: content.into(), attachment: None }
    }
}

/// Fields of the profile form, used both for the viewer's own profile and
/// for an admin editing someone else's. Empty phone and status are sent as
/// empty strings, which the server stores as cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub username: String,
    pub phone_number: String,
    pub status: String,
    pub picture: Option<Attachment>,
}

impl ProfileUpdate {
    pub fn picture_name(&self) -> Option<&str> {
        self.picture.as_ref().map(|p| p.file_name.as_str())
    }
}

/// Formats an instant as a two-digit `HH:MM` clock in the given zone.
pub fn clock_time<Tz: TimeZone>(at: &DateTime<Utc>, zone: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.with_timezone(zone).format("%H:%M").to_string()
}

pub fn local_clock_time(at: &DateTime<Utc>) -> String {
    clock_time(at, &Local)
}
