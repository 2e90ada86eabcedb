//! Versioned public schema and the shaping layer that produces it.
//!
//! Scraped objects never leave the process as-is. Each one is projected into
//! a stable serialized shape: unix seconds become ISO-8601 UTC datetimes
//! (with the zero "unknown" sentinel becoming `null`), long-text fields are
//! rendered in exactly one of the two formats the caller asked for, and the
//! upstream's two next-page conventions collapse into a single optional
//! cursor that is absent on the last page.
//!
//! Shaping is infallible: malformed upstream data is the scraping client's
//! problem and surfaces as a parse error at that boundary, never here.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::scraper::{
    RawNext, ScrapedComment, ScrapedFolder, ScrapedFolderRef, ScrapedJournal,
    ScrapedJournalPartial, ScrapedSubmission, ScrapedSubmissionPartial, ScrapedUser,
    ScrapedUserPartial,
};

/// Which rendering of long-text fields the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Html,
    Bbcode,
}

impl TextFormat {
    /// Maps the `bbcode` query flag onto a format.
    #[must_use]
    pub fn from_bbcode_flag(bbcode: bool) -> Self {
        if bbcode { Self::Bbcode } else { Self::Html }
    }

    fn pick(self, html: String, bbcode: String) -> String {
        match self {
            Self::Html => html,
            Self::Bbcode => bbcode,
        }
    }
}

/// Normalized next-page cursor: a page number or an opaque token.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PageCursor {
    Page(u64),
    Token(String),
}

/// One page of a folder listing.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Folder<T> {
    pub results: Vec<T>,
    /// Cursor for the following page; `null` on the last page.
    pub next: Option<PageCursor>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserPartial {
    pub name: String,
    pub status: String,
    pub title: String,
    pub avatar_url: String,
    /// `null` when the join date was not visible on the scraped page.
    pub join_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct UserStats {
    pub views: u64,
    pub submissions: u64,
    pub favorites: u64,
    pub comments_earned: u64,
    pub comments_made: u64,
    pub journals: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct User {
    pub name: String,
    pub status: String,
    pub title: String,
    pub join_date: Option<DateTime<Utc>>,
    pub profile: String,
    pub stats: UserStats,
    pub info: BTreeMap<String, String>,
    pub contacts: BTreeMap<String, String>,
    pub avatar_url: String,
    pub banner_url: Option<String>,
    pub watched: bool,
    pub watched_toggle_link: Option<String>,
    pub blocked: bool,
    pub blocked_toggle_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Comment {
    pub id: u64,
    pub author: UserPartial,
    pub date: DateTime<Utc>,
    pub text: String,
    pub replies: Vec<Comment>,
    pub reply_to: Option<u64>,
    pub edited: bool,
    pub hidden: bool,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SubmissionStats {
    pub views: u64,
    pub comments: u64,
    pub favorites: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FolderRef {
    pub name: String,
    pub url: String,
    pub group: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Submission {
    pub id: u64,
    pub title: String,
    pub author: UserPartial,
    pub date: DateTime<Utc>,
    pub tags: Vec<String>,
    pub category: String,
    pub species: String,
    pub gender: String,
    pub rating: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub stats: SubmissionStats,
    pub description: String,
    pub footer: String,
    pub mentions: Vec<String>,
    pub folder: String,
    pub user_folders: Vec<FolderRef>,
    pub file_url: String,
    pub thumbnail_url: String,
    pub comments: Vec<Comment>,
    pub prev: Option<u64>,
    pub next: Option<u64>,
    pub favorite: bool,
    pub favorite_toggle_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubmissionPartial {
    pub id: u64,
    pub title: String,
    pub author: UserPartial,
    pub rating: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct JournalStats {
    pub comments: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Journal {
    pub id: u64,
    pub title: String,
    pub author: UserPartial,
    pub stats: JournalStats,
    pub date: DateTime<Utc>,
    pub header: String,
    pub footer: String,
    pub content: String,
    pub mentions: Vec<String>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JournalPartial {
    pub id: u64,
    pub title: String,
    pub author: UserPartial,
    pub stats: JournalStats,
    pub date: DateTime<Utc>,
    pub content: String,
    pub mentions: Vec<String>,
}

/// A unix-seconds value the page always carries; epoch when it somehow
/// overflows the calendar.
fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

/// The join-date sentinel: `0` means the date was not visible.
fn join_date(secs: i64) -> Option<DateTime<Utc>> {
    if secs == 0 {
        None
    } else {
        DateTime::from_timestamp(secs, 0)
    }
}

/// Normalizes the upstream's next-page marker: absent on the last page,
/// otherwise a page number or an opaque token.
#[must_use]
pub fn shape_next(raw: RawNext) -> Option<PageCursor> {
    if raw.is_end() {
        return None;
    }
    match raw {
        RawNext::Page(n) => Some(PageCursor::Page(n)),
        RawNext::Token(t) => Some(PageCursor::Token(t)),
    }
}

#[must_use]
pub fn shape_user_partial(scraped: ScrapedUserPartial) -> UserPartial {
    UserPartial {
        name: scraped.name,
        status: scraped.status,
        title: scraped.title,
        avatar_url: scraped.avatar_url,
        join_date: join_date(scraped.join_date),
    }
}

#[must_use]
pub fn shape_user(scraped: ScrapedUser, format: TextFormat) -> User {
    User {
        name: scraped.name,
        status: scraped.status,
        title: scraped.title,
        join_date: join_date(scraped.join_date),
        profile: format.pick(scraped.profile, scraped.profile_bbcode),
        stats: UserStats {
            views: scraped.stats.views,
            submissions: scraped.stats.submissions,
            favorites: scraped.stats.favorites,
            comments_earned: scraped.stats.comments_earned,
            comments_made: scraped.stats.comments_made,
            journals: scraped.stats.journals,
        },
        info: scraped.info,
        contacts: scraped.contacts,
        avatar_url: scraped.avatar_url,
        banner_url: scraped.banner_url,
        watched: scraped.watched,
        watched_toggle_link: scraped.watched_toggle_link,
        blocked: scraped.blocked,
        blocked_toggle_link: scraped.blocked_toggle_link,
    }
}

#[must_use]
pub fn shape_comment(scraped: ScrapedComment, format: TextFormat) -> Comment {
    Comment {
        id: scraped.id,
        author: shape_user_partial(scraped.author),
        date: timestamp(scraped.date),
        text: format.pick(scraped.text, scraped.text_bbcode),
        replies: scraped
            .replies
            .into_iter()
            .map(|reply| shape_comment(reply, format))
            .collect(),
        reply_to: scraped.reply_to,
        edited: scraped.edited,
        hidden: scraped.hidden,
    }
}

#[must_use]
pub fn shape_submission(scraped: ScrapedSubmission, format: TextFormat) -> Submission {
    Submission {
        id: scraped.id,
        title: scraped.title,
        author: shape_user_partial(scraped.author),
        date: timestamp(scraped.date),
        tags: scraped.tags,
        category: scraped.category,
        species: scraped.species,
        gender: scraped.gender,
        rating: scraped.rating,
        kind: scraped.kind,
        stats: SubmissionStats {
            views: scraped.stats.views,
            comments: scraped.stats.comments,
            favorites: scraped.stats.favorites,
        },
        description: format.pick(scraped.description, scraped.description_bbcode),
        footer: format.pick(scraped.footer, scraped.footer_bbcode),
        mentions: scraped.mentions,
        folder: scraped.folder,
        user_folders: scraped
            .user_folders
            .into_iter()
            .map(|f| FolderRef {
                name: f.name,
                url: f.url,
                group: f.group,
            })
            .collect(),
        file_url: scraped.file_url,
        thumbnail_url: scraped.thumbnail_url,
        comments: scraped
            .comments
            .into_iter()
            .map(|c| shape_comment(c, format))
            .collect(),
        prev: scraped.prev,
        next: scraped.next,
        favorite: scraped.favorite,
        favorite_toggle_link: scraped.favorite_toggle_link,
    }
}

#[must_use]
pub fn shape_submission_partial(scraped: ScrapedSubmissionPartial) -> SubmissionPartial {
    SubmissionPartial {
        id: scraped.id,
        title: scraped.title,
        author: shape_user_partial(scraped.author),
        rating: scraped.rating,
        kind: scraped.kind,
        thumbnail_url: scraped.thumbnail_url,
    }
}

#[must_use]
pub fn shape_journal(scraped: ScrapedJournal, format: TextFormat) -> Journal {
    Journal {
        id: scraped.id,
        title: scraped.title,
        author: shape_user_partial(scraped.author),
        stats: JournalStats {
            comments: scraped.stats.comments,
        },
        date: timestamp(scraped.date),
        header: format.pick(scraped.header, scraped.header_bbcode),
        footer: format.pick(scraped.footer, scraped.footer_bbcode),
        content: format.pick(scraped.content, scraped.content_bbcode),
        mentions: scraped.mentions,
        comments: scraped
            .comments
            .into_iter()
            .map(|c| shape_comment(c, format))
            .collect(),
    }
}

#[must_use]
pub fn shape_journal_partial(scraped: ScrapedJournalPartial, format: TextFormat) -> JournalPartial {
    JournalPartial {
        id: scraped.id,
        title: scraped.title,
        author: shape_user_partial(scraped.author),
        stats: JournalStats {
            comments: scraped.stats.comments,
        },
        date: timestamp(scraped.date),
        content: format.pick(scraped.content, scraped.content_bbcode),
        mentions: scraped.mentions,
    }
}

/// Shapes one listing page, applying `shape_item` to every result.
pub fn shape_folder<T, U>(
    scraped: ScrapedFolder<T>,
    shape_item: impl Fn(T) -> U,
) -> Folder<U> {
    Folder {
        results: scraped.results.into_iter().map(shape_item).collect(),
        next: shape_next(scraped.next),
    }
}
