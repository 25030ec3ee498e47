//! Social-posting service abstraction
//!
//! A [`SocialPoster`] pushes one post to an external posting service and reports
//! which platforms the account behind a credential has connected. The only
//! production implementation is [`ayrshare::AyrshareClient`].

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Post, SocialAccount, SocialPlatform};

pub mod ayrshare;
pub mod mock;

/// Username shown for accounts connected through profile sync
pub const SYNCED_USERNAME: &str = "Connected";

/// Request body for the posting API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublishPayload {
    pub post: String,
    pub platforms: Vec<String>,
    pub media_urls: Vec<String>,
    pub schedule_date: String,
    pub auto_schedule: bool,
}

impl PublishPayload {
    pub fn from_post(post: &Post) -> Self {
        Self {
            post: post.content.clone(),
            platforms: post
                .platforms
                .iter()
                .map(|p| p.api_code().to_string())
                .collect(),
            media_urls: post.image.iter().cloned().collect(),
            schedule_date: wire_schedule_date(post.scheduled_date),
            auto_schedule: false,
        }
    }
}

/// RFC 3339 UTC timestamp for a local calendar datetime
///
/// Times that do not exist locally (DST gaps) are read as UTC.
pub fn wire_schedule_date(scheduled: NaiveDateTime) -> String {
    let utc = Local
        .from_local_datetime(&scheduled)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| scheduled.and_utc());
    utc.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// What the posting service said about an accepted post
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PublishReceipt {
    pub status: Option<String>,
    pub remote_id: Option<String>,
}

/// External posting service
#[async_trait]
pub trait SocialPoster: Send + Sync {
    /// Submit `post` for publishing
    ///
    /// # Errors
    ///
    /// - `RemoteError::Transport` when the request cannot be sent
    /// - `RemoteError::Rejected` when the service answers with an error status,
    ///   even over HTTP 200
    /// - `RemoteError::MalformedResponse` when the answer is not JSON
    async fn publish(&self, credential: &str, post: &Post) -> Result<PublishReceipt>;

    /// Platform codes (in the service's vocabulary) connected to the account
    async fn connected_platforms(&self, credential: &str) -> Result<Vec<String>>;

    /// Short name for log output
    fn name(&self) -> &str;
}

/// Build the full account list from the codes reported by profile sync
pub fn reconcile_accounts(connected_codes: &[String]) -> Vec<SocialAccount> {
    SocialPlatform::ALL
        .iter()
        .map(|platform| {
            let connected = connected_codes
                .iter()
                .any(|code| code.eq_ignore_ascii_case(platform.api_code()));
            SocialAccount {
                platform: *platform,
                connected,
                username: connected.then(|| SYNCED_USERNAME.to_string()),
            }
        })
        .collect()
}
