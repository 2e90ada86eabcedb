//! Opaque upstream scraping client: the seam between the gateway core and
//! the page-fetching engine.
//!
//! The core never touches upstream HTML itself. It hands a cookie set and a
//! resource identifier to a [`ScrapeClient`] and receives either a typed
//! scraped object or one of the fixed [`ScrapeError`] variants. The scraped
//! objects are deliberately loose — raw unix timestamps with `0` as the
//! "unknown" sentinel, both HTML and BBCode renderings of long-text fields —
//! and the response shaper in [`crate::api::schema`] owns their outward
//! shape.

pub mod client;
pub mod error;
mod extract;
pub mod robots;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

pub use client::{HttpScrapeClient, ScrapeConfig};
pub use error::ScrapeError;
pub use robots::RobotsPolicy;

use crate::auth::Cookie;

/// Simplified user information as it appears in listings and bylines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedUserPartial {
    pub name: String,
    /// Status symbol (`~`, `!`, ...); empty when the page showed none.
    pub status: String,
    pub title: String,
    pub avatar_url: String,
    /// Unix seconds; `0` means the join date was not visible.
    pub join_date: i64,
}

/// Counters from a user's page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapedUserStats {
    pub views: u64,
    pub submissions: u64,
    pub favorites: u64,
    pub comments_earned: u64,
    pub comments_made: u64,
    pub journals: u64,
}

/// Full user page contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedUser {
    pub name: String,
    pub status: String,
    pub title: String,
    /// Unix seconds; `0` means unknown.
    pub join_date: i64,
    /// Profile text, HTML rendering.
    pub profile: String,
    /// Profile text, BBCode rendering.
    pub profile_bbcode: String,
    pub stats: ScrapedUserStats,
    /// Free-form info rows (Accepting Commissions, Favorite Music, ...).
    pub info: BTreeMap<String, String>,
    /// Contact rows (Twitter, Telegram, ...).
    pub contacts: BTreeMap<String, String>,
    pub avatar_url: String,
    /// Absent when the user has no banner.
    pub banner_url: Option<String>,
    pub watched: bool,
    pub watched_toggle_link: Option<String>,
    pub blocked: bool,
    pub blocked_toggle_link: Option<String>,
}

/// A comment with its reply subtree, in page order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedComment {
    pub id: u64,
    pub author: ScrapedUserPartial,
    /// Unix seconds.
    pub date: i64,
    /// Comment text, HTML rendering.
    pub text: String,
    /// Comment text, BBCode rendering.
    pub text_bbcode: String,
    pub replies: Vec<ScrapedComment>,
    pub reply_to: Option<u64>,
    pub edited: bool,
    pub hidden: bool,
}

/// View counters from a submission page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapedSubmissionStats {
    pub views: u64,
    pub comments: u64,
    pub favorites: u64,
}

/// A user-defined folder a submission is filed under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapedFolderRef {
    pub name: String,
    pub url: String,
    /// Folder group, empty when ungrouped.
    pub group: String,
}

/// Full submission page contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedSubmission {
    pub id: u64,
    pub title: String,
    pub author: ScrapedUserPartial,
    /// Unix seconds.
    pub date: i64,
    pub tags: Vec<String>,
    pub category: String,
    pub species: String,
    pub gender: String,
    pub rating: String,
    /// Submission type (image, text, music).
    pub kind: String,
    pub stats: ScrapedSubmissionStats,
    /// Description, HTML rendering.
    pub description: String,
    /// Description, BBCode rendering.
    pub description_bbcode: String,
    pub footer: String,
    pub footer_bbcode: String,
    pub mentions: Vec<String>,
    /// Site folder the submission lives in (gallery or scraps).
    pub folder: String,
    pub user_folders: Vec<ScrapedFolderRef>,
    pub file_url: String,
    pub thumbnail_url: String,
    pub comments: Vec<ScrapedComment>,
    pub prev: Option<u64>,
    pub next: Option<u64>,
    pub favorite: bool,
    pub favorite_toggle_link: Option<String>,
}

/// Simplified submission information from folder listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedSubmissionPartial {
    pub id: u64,
    pub title: String,
    pub author: ScrapedUserPartial,
    pub rating: String,
    pub kind: String,
    pub thumbnail_url: String,
}

/// Comment counter from a journal page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapedJournalStats {
    pub comments: u64,
}

/// Full journal page contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedJournal {
    pub id: u64,
    pub title: String,
    pub author: ScrapedUserPartial,
    pub stats: ScrapedJournalStats,
    /// Unix seconds.
    pub date: i64,
    pub header: String,
    pub header_bbcode: String,
    pub footer: String,
    pub footer_bbcode: String,
    pub content: String,
    pub content_bbcode: String,
    pub mentions: Vec<String>,
    pub comments: Vec<ScrapedComment>,
}

/// Journal as it appears in the journals listing (no comments).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedJournalPartial {
    pub id: u64,
    pub title: String,
    pub author: ScrapedUserPartial,
    pub stats: ScrapedJournalStats,
    /// Unix seconds.
    pub date: i64,
    pub content: String,
    pub content_bbcode: String,
    pub mentions: Vec<String>,
}

/// The upstream's raw next-page marker, before normalization.
///
/// Numeric folders (gallery, scraps, journals, watchlist) report the next
/// page number with `0` meaning "no further page"; the favorites folder
/// reports an opaque token with the empty string meaning the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawNext {
    /// Next page number; `0` = last page.
    Page(u64),
    /// Opaque next-page token; empty = last page.
    Token(String),
}

impl RawNext {
    /// Whether this marker signals the last page.
    #[must_use]
    pub fn is_end(&self) -> bool {
        match self {
            Self::Page(n) => *n == 0,
            Self::Token(t) => t.is_empty(),
        }
    }
}

impl Default for RawNext {
    fn default() -> Self {
        Self::Page(0)
    }
}

/// One page of a paginated folder listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedFolder<T> {
    pub results: Vec<T>,
    pub next: RawNext,
}

/// The opaque upstream client the gateway core is written against.
///
/// Implementations perform all upstream I/O: page fetching, robots policy
/// enforcement, notice-page detection and field extraction. They never retry
/// — a transient upstream failure surfaces as its error variant so the
/// upstream's load stays predictable.
#[async_trait]
pub trait ScrapeClient: Send + Sync {
    /// Probes whether the cookie set represents a logged-in session by
    /// fetching a page that only renders for one and checking for the
    /// logged-in marker.
    async fn check_login(&self, cookies: &[Cookie]) -> Result<bool, ScrapeError>;

    /// Fetches a submission page.
    async fn submission(
        &self,
        cookies: &[Cookie],
        id: u64,
    ) -> Result<ScrapedSubmission, ScrapeError>;

    /// Fetches a journal page.
    async fn journal(&self, cookies: &[Cookie], id: u64) -> Result<ScrapedJournal, ScrapeError>;

    /// Fetches a user page. `name` is already underscore-normalized.
    async fn user(&self, cookies: &[Cookie], name: &str) -> Result<ScrapedUser, ScrapeError>;

    /// Fetches one page of a user's gallery folder.
    async fn gallery(
        &self,
        cookies: &[Cookie],
        name: &str,
        page: u64,
    ) -> Result<ScrapedFolder<ScrapedSubmissionPartial>, ScrapeError>;

    /// Fetches one page of a user's scraps folder.
    async fn scraps(
        &self,
        cookies: &[Cookie],
        name: &str,
        page: u64,
    ) -> Result<ScrapedFolder<ScrapedSubmissionPartial>, ScrapeError>;

    /// Fetches one page of a user's favorites folder. `page` is the opaque
    /// token from the previous page's `next` marker (empty for the first).
    async fn favorites(
        &self,
        cookies: &[Cookie],
        name: &str,
        page: &str,
    ) -> Result<ScrapedFolder<ScrapedSubmissionPartial>, ScrapeError>;

    /// Fetches one page of a user's journals folder.
    async fn journals(
        &self,
        cookies: &[Cookie],
        name: &str,
        page: u64,
    ) -> Result<ScrapedFolder<ScrapedJournalPartial>, ScrapeError>;

    /// Fetches one page of a user's watchlist.
    async fn watchlist(
        &self,
        cookies: &[Cookie],
        name: &str,
        page: u64,
    ) -> Result<ScrapedFolder<ScrapedUserPartial>, ScrapeError>;

    /// The minimum call spacing the upstream asked for (robots crawl delay).
    fn crawl_delay(&self) -> Duration;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_next_page_zero_is_end() {
        assert!(RawNext::Page(0).is_end());
        assert!(!RawNext::Page(2).is_end());
    }

    #[test]
    fn test_raw_next_empty_token_is_end() {
        assert!(RawNext::Token(String::new()).is_end());
        assert!(!RawNext::Token("1700000000/next".to_string()).is_end());
    }

    #[test]
    fn test_raw_next_default_is_end() {
        assert!(RawNext::default().is_end());
    }
}
