//! Core types for Calcast

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CalcastError;

/// Social networks a post can target
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum SocialPlatform {
    Facebook,
    Instagram,
    Linkedin,
    Pinterest,
    GoogleBusiness,
}

impl SocialPlatform {
    /// Every supported platform, in display order
    pub const ALL: [SocialPlatform; 5] = [
        SocialPlatform::Facebook,
        SocialPlatform::Instagram,
        SocialPlatform::Linkedin,
        SocialPlatform::Pinterest,
        SocialPlatform::GoogleBusiness,
    ];

    /// Platforms assigned to freshly generated posts
    pub const GENERATED_DEFAULT: [SocialPlatform; 3] = [
        SocialPlatform::Facebook,
        SocialPlatform::Instagram,
        SocialPlatform::Linkedin,
    ];

    /// Internal tag, as stored and accepted on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Linkedin => "linkedin",
            Self::Pinterest => "pinterest",
            Self::GoogleBusiness => "google-business",
        }
    }

    /// Code used by the social-posting API
    ///
    /// Ayrshare calls Google Business Profile `gmb`; every other platform keeps
    /// its internal tag.
    pub fn api_code(&self) -> &'static str {
        match self {
            Self::GoogleBusiness => "gmb",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for SocialPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SocialPlatform {
    type Err = CalcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "facebook" => Ok(Self::Facebook),
            "instagram" => Ok(Self::Instagram),
            "linkedin" => Ok(Self::Linkedin),
            "pinterest" => Ok(Self::Pinterest),
            "google-business" | "googlebusiness" | "gmb" => Ok(Self::GoogleBusiness),
            other => Err(CalcastError::InvalidInput(format!(
                "Unknown platform '{}'. Valid options: facebook, instagram, linkedin, pinterest, google-business",
                other
            ))),
        }
    }
}

/// Parse a comma-separated platform list such as "facebook,linkedin"
pub fn parse_platform_list(input: &str) -> crate::Result<Vec<SocialPlatform>> {
    let mut platforms = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let platform: SocialPlatform = part.parse()?;
        if !platforms.contains(&platform) {
            platforms.push(platform);
        }
    }
    Ok(platforms)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Scheduled,
    Published,
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Scheduled => write!(f, "scheduled"),
            Self::Published => write!(f, "published"),
        }
    }
}

impl FromStr for PostStatus {
    type Err = CalcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "scheduled" => Ok(Self::Scheduled),
            "published" => Ok(Self::Published),
            other => Err(CalcastError::InvalidInput(format!(
                "Invalid status '{}'. Must be draft, scheduled or published",
                other
            ))),
        }
    }
}

/// Engagement counters, written by external sync only
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PostStats {
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
}

/// A scheduled unit of content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub platforms: Vec<SocialPlatform>,
    /// Wall-clock date and time on the user's calendar
    pub scheduled_date: NaiveDateTime,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<PostStats>,
}

impl Post {
    /// Create a draft with a fresh id and zeroed stats
    pub fn new(content: String, scheduled_date: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content,
            image: None,
            platforms: Vec::new(),
            scheduled_date,
            status: PostStatus::Draft,
            stats: Some(PostStats::default()),
        }
    }

    pub fn with_platforms(mut self, platforms: Vec<SocialPlatform>) -> Self {
        self.platforms = platforms;
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_stats(mut self, stats: PostStats) -> Self {
        self.stats = Some(stats);
        self
    }
}

/// A named reference to externally hosted media
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub url: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    pub fn new(url: String, name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url,
            name,
            created_at: Utc::now(),
        }
    }
}

/// Connection state of one platform on the posting service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SocialAccount {
    pub platform: SocialPlatform,
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl SocialAccount {
    pub fn disconnected(platform: SocialPlatform) -> Self {
        Self {
            platform,
            connected: false,
            username: None,
        }
    }

    /// One disconnected account per supported platform
    pub fn defaults() -> Vec<SocialAccount> {
        SocialPlatform::ALL
            .iter()
            .copied()
            .map(SocialAccount::disconnected)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BusinessProfile {
    pub name: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_platform_api_codes() {
        assert_eq!(SocialPlatform::GoogleBusiness.api_code(), "gmb");
        assert_eq!(SocialPlatform::Facebook.api_code(), "facebook");
        assert_eq!(SocialPlatform::Instagram.api_code(), "instagram");
        assert_eq!(SocialPlatform::Linkedin.api_code(), "linkedin");
        assert_eq!(SocialPlatform::Pinterest.api_code(), "pinterest");
    }

    #[test]
    fn test_platform_from_str() {
        assert_eq!("facebook".parse::<SocialPlatform>().unwrap(), SocialPlatform::Facebook);
        assert_eq!("LinkedIn".parse::<SocialPlatform>().unwrap(), SocialPlatform::Linkedin);
        assert_eq!(
            "google-business".parse::<SocialPlatform>().unwrap(),
            SocialPlatform::GoogleBusiness
        );
        assert_eq!("gmb".parse::<SocialPlatform>().unwrap(), SocialPlatform::GoogleBusiness);
        assert!("myspace".parse::<SocialPlatform>().is_err());
    }

    #[test]
    fn test_platform_serializes_as_kebab_case() {
        let json = serde_json::to_string(&SocialPlatform::GoogleBusiness).unwrap();
        assert_eq!(json, "\"google-business\"");
    }

    #[test]
    fn test_parse_platform_list_dedups() {
        let platforms = parse_platform_list("facebook, instagram,facebook,,").unwrap();
        assert_eq!(
            platforms,
            vec![SocialPlatform::Facebook, SocialPlatform::Instagram]
        );
        assert!(parse_platform_list("").unwrap().is_empty());
        assert!(parse_platform_list("facebook,nope").is_err());
    }

    #[test]
    fn test_status_round_trip_through_str() {
        for status in [PostStatus::Draft, PostStatus::Scheduled, PostStatus::Published] {
            assert_eq!(status.to_string().parse::<PostStatus>().unwrap(), status);
        }
        assert!("archived".parse::<PostStatus>().is_err());
    }

    #[test]
    fn test_new_post_is_draft_with_zeroed_stats() {
        let post = Post::new("Hello".to_string(), at(2024, 6, 1, 9));
        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.stats, Some(PostStats::default()));
        assert!(post.platforms.is_empty());
        assert!(post.image.is_none());
        assert!(!post.id.is_empty());
    }

    #[test]
    fn test_post_json_layout() {
        let post = Post {
            id: "gen-1".to_string(),
            content: "Hi".to_string(),
            image: None,
            platforms: vec![SocialPlatform::GoogleBusiness],
            scheduled_date: at(2024, 6, 1, 9),
            status: PostStatus::Scheduled,
            stats: None,
        };
        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["scheduledDate"], "2024-06-01T09:00:00");
        assert_eq!(value["status"], "scheduled");
        assert_eq!(value["platforms"][0], "google-business");
        assert!(value.get("image").is_none());
        assert!(value.get("stats").is_none());
    }

    #[test]
    fn test_default_accounts_cover_every_platform() {
        let accounts = SocialAccount::defaults();
        assert_eq!(accounts.len(), 5);
        assert!(accounts.iter().all(|a| !a.connected && a.username.is_none()));
        let platforms: Vec<_> = accounts.iter().map(|a| a.platform).collect();
        assert_eq!(platforms, SocialPlatform::ALL.to_vec());
    }
}
