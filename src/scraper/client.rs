//! Reqwest-backed implementation of the upstream scraping client.
//!
//! All upstream I/O lives here: cookie header assembly, the robots gate,
//! status mapping onto the fixed failure taxonomy, notice-page and login
//! marker detection, and the marker-based field extraction that turns page
//! text into the typed scraped objects.
//!
//! The client never retries. A transient upstream failure surfaces as its
//! error variant so the upstream's load stays predictable.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::COOKIE;
use tracing::{debug, instrument, warn};
use url::Url;

use super::extract::{
    all_between, between, html_to_bbcode, parse_count, sections, strip_tags, trailing_id,
};
use super::{
    RawNext, RobotsPolicy, ScrapeClient, ScrapeError, ScrapedComment, ScrapedFolder,
    ScrapedFolderRef, ScrapedJournal, ScrapedJournalPartial, ScrapedJournalStats,
    ScrapedSubmission, ScrapedSubmissionPartial, ScrapedSubmissionStats, ScrapedUser,
    ScrapedUserPartial, ScrapedUserStats,
};
use crate::auth::Cookie;

/// User agent sent with every upstream request.
pub const DEFAULT_USER_AGENT: &str = concat!("furgate/", env!("CARGO_PKG_VERSION"));

/// Fallback call spacing when robots.txt reports no crawl delay.
const DEFAULT_CRAWL_DELAY: Duration = Duration::from_secs(1);

/// Present on every page rendered for a logged-in session.
const LOGIN_MARKER: &str = "href=\"/logout/\"";

/// Present when the upstream answers with a notice page instead of content.
const NOTICE_MARKER: &str = "class=\"notice-message\"";

/// Constructor-injected configuration for [`HttpScrapeClient`].
///
/// The robots policy is fetched once at startup and handed in here; the
/// client never re-fetches or mutates it.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Upstream site base URL.
    pub base_url: Url,
    /// User agent for upstream requests.
    pub user_agent: String,
    /// Crawl policy parsed at startup.
    pub robots: RobotsPolicy,
}

impl ScrapeConfig {
    /// Creates a config with the default user agent.
    #[must_use]
    pub fn new(base_url: Url, robots: RobotsPolicy) -> Self {
        Self {
            base_url,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            robots,
        }
    }
}

/// The shipped [`ScrapeClient`] implementation.
#[derive(Debug)]
pub struct HttpScrapeClient {
    http: reqwest::Client,
    base: Url,
    robots: RobotsPolicy,
    crawl_delay: Duration,
}

impl HttpScrapeClient {
    /// Builds the client from injected configuration.
    ///
    /// # Errors
    ///
    /// Returns `ScrapeError::Network` if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(config: ScrapeConfig) -> Result<Self, ScrapeError> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;
        let crawl_delay = config.robots.crawl_delay().unwrap_or(DEFAULT_CRAWL_DELAY);
        Ok(Self {
            http,
            base: config.base_url,
            robots: config.robots,
            crawl_delay,
        })
    }

    /// Fetches an upstream page and classifies the outcome.
    ///
    /// Order of checks: robots gate, transport, status (404/non-success map
    /// to `Server`), notice page, empty page.
    #[instrument(skip(self, cookies), fields(path = %path))]
    async fn fetch(&self, path: &str, cookies: &[Cookie]) -> Result<String, ScrapeError> {
        if !self.robots.allows(path) {
            debug!("robots policy disallows path");
            return Err(ScrapeError::disallowed(path));
        }

        let url = self
            .base
            .join(path)
            .map_err(|_| ScrapeError::parsing(format!("invalid upstream path: {path}")))?;

        let mut request = self.http.get(url);
        if let Some(header) = cookie_header(cookies) {
            request = request.header(COOKIE, header);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::server(path, status.as_u16()));
        }

        let body = response.text().await?;
        if body.contains(NOTICE_MARKER) {
            // The marker sits inside the opening <section> tag: skip the tag
            // remainder, then slice to the section's closing tag
            let detail = between(&body, NOTICE_MARKER, "</section>")
                .map(|block| {
                    strip_tags(block.split_once('>').map_or(block, |(_, rest)| rest))
                })
                .unwrap_or_default();
            return Err(ScrapeError::notice(detail));
        }
        if body.trim().is_empty() {
            return Err(ScrapeError::parsing(format!("unexpected empty page: {path}")));
        }
        Ok(body)
    }
}

#[async_trait]
impl ScrapeClient for HttpScrapeClient {
    async fn check_login(&self, cookies: &[Cookie]) -> Result<bool, ScrapeError> {
        // A notice page here just means "not a login session"
        match self.fetch("/", cookies).await {
            Ok(body) => Ok(body.contains(LOGIN_MARKER)),
            Err(ScrapeError::Notice(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn submission(
        &self,
        cookies: &[Cookie],
        id: u64,
    ) -> Result<ScrapedSubmission, ScrapeError> {
        let html = self.fetch(&format!("/view/{id}/"), cookies).await?;
        parse_submission_page(id, &html)
    }

    async fn journal(&self, cookies: &[Cookie], id: u64) -> Result<ScrapedJournal, ScrapeError> {
        let html = self.fetch(&format!("/journal/{id}/"), cookies).await?;
        parse_journal_page(id, &html)
    }

    async fn user(&self, cookies: &[Cookie], name: &str) -> Result<ScrapedUser, ScrapeError> {
        let html = self.fetch(&format!("/user/{name}/"), cookies).await?;
        parse_user_page(&html)
    }

    async fn gallery(
        &self,
        cookies: &[Cookie],
        name: &str,
        page: u64,
    ) -> Result<ScrapedFolder<ScrapedSubmissionPartial>, ScrapeError> {
        let html = self.fetch(&format!("/gallery/{name}/{page}/"), cookies).await?;
        Ok(parse_submission_listing(&html))
    }

    async fn scraps(
        &self,
        cookies: &[Cookie],
        name: &str,
        page: u64,
    ) -> Result<ScrapedFolder<ScrapedSubmissionPartial>, ScrapeError> {
        let html = self.fetch(&format!("/scraps/{name}/{page}/"), cookies).await?;
        Ok(parse_submission_listing(&html))
    }

    async fn favorites(
        &self,
        cookies: &[Cookie],
        name: &str,
        page: &str,
    ) -> Result<ScrapedFolder<ScrapedSubmissionPartial>, ScrapeError> {
        let path = if page.is_empty() {
            format!("/favorites/{name}/")
        } else {
            format!("/favorites/{name}/{page}/")
        };
        let html = self.fetch(&path, cookies).await?;
        let mut folder = parse_submission_listing(&html);
        folder.next = favorites_next(&html, name);
        Ok(folder)
    }

    async fn journals(
        &self,
        cookies: &[Cookie],
        name: &str,
        page: u64,
    ) -> Result<ScrapedFolder<ScrapedJournalPartial>, ScrapeError> {
        let html = self.fetch(&format!("/journals/{name}/{page}/"), cookies).await?;
        Ok(parse_journal_listing(&html))
    }

    async fn watchlist(
        &self,
        cookies: &[Cookie],
        name: &str,
        page: u64,
    ) -> Result<ScrapedFolder<ScrapedUserPartial>, ScrapeError> {
        let html = self
            .fetch(&format!("/watchlist/to/{name}/{page}/"), cookies)
            .await?;
        Ok(parse_watchlist(&html))
    }

    fn crawl_delay(&self) -> Duration {
        self.crawl_delay
    }
}

/// Builds the `Cookie` request header value from the request's cookie pairs.
fn cookie_header(cookies: &[Cookie]) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    Some(
        cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value()))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// Extracts a labeled `<span class="...">` field, stripped of markup.
fn field_span(html: &str, class: &str) -> String {
    between(html, &format!("class=\"{class}\">"), "</span>")
        .map(strip_tags)
        .unwrap_or_default()
}

/// Extracts the `data-time` unix-seconds attribute near the block start;
/// `0` when the page showed no date.
fn parse_date(block: &str) -> i64 {
    between(block, "data-time=\"", "\"")
        .and_then(|t| t.parse().ok())
        .unwrap_or(0)
}

/// Parses an author byline block into a partial user.
///
/// Listing bylines carry no join date, which is exactly where the zero
/// sentinel comes from.
fn parse_byline(block: &str) -> ScrapedUserPartial {
    let href_name = between(block, "href=\"/user/", "\"")
        .map(|n| n.trim_end_matches('/').to_string())
        .unwrap_or_default();
    let display = between(block, "<strong>", "</strong>").map(strip_tags);
    ScrapedUserPartial {
        name: display.filter(|d| !d.is_empty()).unwrap_or(href_name),
        status: field_span(block, "user-status"),
        title: field_span(block, "user-title"),
        avatar_url: between(block, "<img", ">")
            .and_then(|tag| between(tag, "src=\"", "\""))
            .unwrap_or_default()
            .to_string(),
        join_date: parse_date(block),
    }
}

/// Collects `/user/` links as mention names, in order, deduplicated.
fn collect_mentions(html: &str) -> Vec<String> {
    let mut mentions = Vec::new();
    for link in all_between(html, "href=\"/user/", "\"") {
        let name = link.trim_end_matches('/');
        if !name.is_empty() && !mentions.iter().any(|m| m == name) {
            mentions.push(name.to_string());
        }
    }
    mentions
}

/// Parses the flat comment blocks of a page and threads replies into their
/// parents, depth-first, preserving page order.
fn parse_comments(html: &str) -> Vec<ScrapedComment> {
    let mut roots: Vec<ScrapedComment> = Vec::new();
    for segment in sections(html, "class=\"comment_container\"") {
        let Some(id) = between(segment, "data-id=\"", "\"").and_then(|v| v.parse().ok()) else {
            warn!("skipping comment block without id");
            continue;
        };
        let reply_to = between(segment, "data-parent=\"", "\"")
            .filter(|v| !v.is_empty())
            .and_then(|v| v.parse().ok());
        let text = between(segment, "class=\"comment-text\">", "</div>")
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        let comment = ScrapedComment {
            id,
            author: parse_byline(segment),
            date: parse_date(segment),
            text_bbcode: html_to_bbcode(&text),
            text,
            replies: Vec::new(),
            reply_to,
            edited: segment.contains("data-edited=\"1\""),
            hidden: segment.contains("data-hidden=\"1\""),
        };
        match reply_to {
            Some(parent) => {
                // Orphaned replies fall back to the root level
                if let Some(back) = attach_reply(&mut roots, parent, comment) {
                    roots.push(back);
                }
            }
            None => roots.push(comment),
        }
    }
    roots
}

/// Attaches `comment` under the node with id `parent`, searching depth-first.
/// Returns the comment back when no parent is found.
fn attach_reply(
    nodes: &mut Vec<ScrapedComment>,
    parent: u64,
    comment: ScrapedComment,
) -> Option<ScrapedComment> {
    let mut pending = comment;
    for node in nodes.iter_mut() {
        if node.id == parent {
            node.replies.push(pending);
            return None;
        }
        match attach_reply(&mut node.replies, parent, pending) {
            None => return None,
            Some(back) => pending = back,
        }
    }
    Some(pending)
}

fn parse_submission_page(id: u64, html: &str) -> Result<ScrapedSubmission, ScrapeError> {
    let title = between(html, "class=\"submission-title\">", "</div>")
        .map(strip_tags)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ScrapeError::parsing(format!("submission {id}: missing title")))?;
    let byline = between(html, "class=\"submission-id-sub-container\"", "</div>")
        .ok_or_else(|| ScrapeError::parsing(format!("submission {id}: missing byline")))?;
    let description = between(html, "class=\"submission-description\">", "</div>")
        .map(str::trim)
        .ok_or_else(|| ScrapeError::parsing(format!("submission {id}: missing description")))?
        .to_string();
    let file_url = between(html, "class=\"download\" href=\"", "\"")
        .ok_or_else(|| ScrapeError::parsing(format!("submission {id}: missing download link")))?
        .to_string();

    let footer = between(html, "class=\"submission-footer\">", "</div>")
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let favorite_toggle_link =
        between(html, "class=\"fav-link\" href=\"", "\"").map(str::to_string);

    let user_folders = all_between(html, "class=\"folder-link\"", "</div>")
        .into_iter()
        .filter_map(|block| {
            let url = between(block, "href=\"", "\"")?.to_string();
            let name = between(block, "\">", "</a>").map(strip_tags)?;
            let group = between(block, "data-group=\"", "\"")
                .unwrap_or_default()
                .to_string();
            Some(ScrapedFolderRef { name, url, group })
        })
        .collect();

    Ok(ScrapedSubmission {
        id,
        title,
        author: parse_byline(byline),
        date: parse_date(byline),
        tags: all_between(html, "class=\"tag\">", "</span>")
            .into_iter()
            .map(strip_tags)
            .collect(),
        category: field_span(html, "category-name"),
        species: field_span(html, "species-name"),
        gender: field_span(html, "gender-name"),
        rating: field_span(html, "rating-box"),
        kind: between(html, "data-kind=\"", "\"").unwrap_or("image").to_string(),
        stats: ScrapedSubmissionStats {
            views: parse_count(&field_span(html, "views")).unwrap_or(0),
            comments: parse_count(&field_span(html, "comments-count")).unwrap_or(0),
            favorites: parse_count(&field_span(html, "favorites")).unwrap_or(0),
        },
        description_bbcode: html_to_bbcode(&description),
        mentions: collect_mentions(&description),
        description,
        footer_bbcode: html_to_bbcode(&footer),
        footer,
        folder: between(html, "data-folder=\"", "\"").unwrap_or("gallery").to_string(),
        user_folders,
        file_url,
        thumbnail_url: between(html, "data-preview-src=\"", "\"")
            .unwrap_or_default()
            .to_string(),
        comments: parse_comments(html),
        prev: between(html, "class=\"submission-prev\" href=\"", "\"").and_then(trailing_id),
        next: between(html, "class=\"submission-next\" href=\"", "\"").and_then(trailing_id),
        favorite: favorite_toggle_link
            .as_deref()
            .is_some_and(|href| href.contains("/unfav/")),
        favorite_toggle_link,
    })
}

fn parse_journal_page(id: u64, html: &str) -> Result<ScrapedJournal, ScrapeError> {
    let title = between(html, "class=\"journal-title\">", "</div>")
        .map(strip_tags)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ScrapeError::parsing(format!("journal {id}: missing title")))?;
    let byline = between(html, "class=\"journal-byline\"", "</div>")
        .ok_or_else(|| ScrapeError::parsing(format!("journal {id}: missing byline")))?;
    let content = between(html, "class=\"journal-content\">", "</div>")
        .map(str::trim)
        .ok_or_else(|| ScrapeError::parsing(format!("journal {id}: missing content")))?
        .to_string();

    let header = between(html, "class=\"journal-header\">", "</div>")
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let footer = between(html, "class=\"journal-footer\">", "</div>")
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let comments = parse_comments(html);

    Ok(ScrapedJournal {
        id,
        title,
        author: parse_byline(byline),
        stats: ScrapedJournalStats {
            comments: parse_count(&field_span(html, "comments-count"))
                .unwrap_or(comments.len() as u64),
        },
        date: parse_date(byline),
        header_bbcode: html_to_bbcode(&header),
        header,
        footer_bbcode: html_to_bbcode(&footer),
        footer,
        content_bbcode: html_to_bbcode(&content),
        mentions: collect_mentions(&content),
        content,
        comments,
    })
}

fn parse_user_page(html: &str) -> Result<ScrapedUser, ScrapeError> {
    let identity = between(html, "class=\"user-identity\"", "</div>")
        .ok_or_else(|| ScrapeError::parsing("user page: missing identity block"))?;
    let name = between(identity, "class=\"user-display-name\">", "</span>")
        .map(strip_tags)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ScrapeError::parsing("user page: missing display name"))?;
    let profile = between(html, "class=\"userpage-profile\">", "</div>")
        .map(str::trim)
        .ok_or_else(|| ScrapeError::parsing("user page: missing profile"))?
        .to_string();

    let info = labeled_rows(html, "info-row");
    let contacts = labeled_rows(html, "contact-row");
    let watched_toggle_link =
        between(html, "class=\"watch-link\" href=\"", "\"").map(str::to_string);
    let blocked_toggle_link =
        between(html, "class=\"block-link\" href=\"", "\"").map(str::to_string);

    Ok(ScrapedUser {
        name,
        status: field_span(identity, "user-status"),
        title: field_span(html, "user-title"),
        join_date: between(html, "class=\"user-join-date\"", "</span>")
            .map(parse_date)
            .unwrap_or(0),
        profile_bbcode: html_to_bbcode(&profile),
        profile,
        stats: ScrapedUserStats {
            views: parse_count(&field_span(html, "stat-views")).unwrap_or(0),
            submissions: parse_count(&field_span(html, "stat-submissions")).unwrap_or(0),
            favorites: parse_count(&field_span(html, "stat-favorites")).unwrap_or(0),
            comments_earned: parse_count(&field_span(html, "stat-comments-earned")).unwrap_or(0),
            comments_made: parse_count(&field_span(html, "stat-comments-made")).unwrap_or(0),
            journals: parse_count(&field_span(html, "stat-journals")).unwrap_or(0),
        },
        info,
        contacts,
        avatar_url: between(html, "class=\"user-nav-avatar\" src=\"", "\"")
            .unwrap_or_default()
            .to_string(),
        banner_url: between(html, "class=\"userpage-banner\"", "</div>")
            .and_then(|block| between(block, "src=\"", "\""))
            .map(str::to_string),
        watched: watched_toggle_link
            .as_deref()
            .is_some_and(|href| href.contains("/unwatch/")),
        watched_toggle_link,
        blocked: blocked_toggle_link
            .as_deref()
            .is_some_and(|href| href.contains("/unblock/")),
        blocked_toggle_link,
    })
}

/// Parses `<strong>key</strong><span>value</span>` rows of the given class.
fn labeled_rows(html: &str, class: &str) -> std::collections::BTreeMap<String, String> {
    all_between(html, &format!("class=\"{class}\""), "</div>")
        .into_iter()
        .filter_map(|block| {
            let key = between(block, "<strong>", "</strong>").map(strip_tags)?;
            let value = between(block, "<span>", "</span>").map(strip_tags)?;
            Some((key, value))
        })
        .collect()
}

fn parse_submission_listing(html: &str) -> ScrapedFolder<ScrapedSubmissionPartial> {
    let results = sections(html, "<figure")
        .into_iter()
        .filter_map(|figure| {
            let id = between(figure, "data-id=\"", "\"")?.parse().ok()?;
            let title = between(figure, "class=\"submission-link\"", "</a>")
                .and_then(|link| link.split_once("\">").map(|(_, t)| t))
                .map(strip_tags)?;
            Some(ScrapedSubmissionPartial {
                id,
                title,
                author: parse_byline(figure),
                rating: between(figure, "data-rating=\"", "\"")
                    .unwrap_or_default()
                    .to_string(),
                kind: between(figure, "data-kind=\"", "\"").unwrap_or_default().to_string(),
                thumbnail_url: between(figure, "src=\"", "\"").unwrap_or_default().to_string(),
            })
        })
        .collect();
    ScrapedFolder {
        results,
        next: numeric_next(html),
    }
}

fn parse_journal_listing(html: &str) -> ScrapedFolder<ScrapedJournalPartial> {
    let results = sections(html, "class=\"journal-item\"")
        .into_iter()
        .filter_map(|item| {
            let id = between(item, "data-id=\"", "\"")?.parse().ok()?;
            let title = between(item, "class=\"journal-item-title\">", "</")
                .map(strip_tags)?;
            let content = between(item, "class=\"journal-body\">", "</div>")
                .map(str::trim)
                .unwrap_or_default()
                .to_string();
            Some(ScrapedJournalPartial {
                id,
                title,
                author: parse_byline(item),
                stats: ScrapedJournalStats {
                    comments: between(item, "data-comments=\"", "\"")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0),
                },
                date: parse_date(item),
                content_bbcode: html_to_bbcode(&content),
                mentions: collect_mentions(&content),
                content,
            })
        })
        .collect();
    ScrapedFolder {
        results,
        next: numeric_next(html),
    }
}

fn parse_watchlist(html: &str) -> ScrapedFolder<ScrapedUserPartial> {
    let results = sections(html, "class=\"watch-row\"")
        .into_iter()
        .map(parse_byline)
        .filter(|user| !user.name.is_empty())
        .collect();
    ScrapedFolder {
        results,
        next: numeric_next(html),
    }
}

/// Next-page marker for numeric folders: the trailing page number of the
/// next-button link; `Page(0)` when the button is absent.
fn numeric_next(html: &str) -> RawNext {
    RawNext::Page(
        between(html, "class=\"button-next\" href=\"", "\"")
            .and_then(trailing_id)
            .unwrap_or(0),
    )
}

/// Next-page marker for the favorites folder: the opaque token segment of
/// the next-button link; empty token when the button is absent.
fn favorites_next(html: &str, name: &str) -> RawNext {
    let token = between(html, "class=\"button-next\" href=\"", "\"")
        .and_then(|href| href.strip_prefix(&format!("/favorites/{name}/")))
        .map(|rest| rest.trim_matches('/').to_string())
        .unwrap_or_default();
    RawNext::Token(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SUBMISSION_PAGE: &str = r#"
    <div class="submission-title"><h2><p>Fender Sketch</p></h2></div>
    <div class="submission-id-sub-container">
      <a href="/user/fender/"><strong>Fender</strong></a>
      <img class="avatar" src="//a.test/fender.gif">
      <span class="popup_date" data-time="1700000000"></span>
    </div>
    <span class="tag">mascot</span><span class="tag">sketch</span>
    <span class="category-name">Artwork</span>
    <span class="species-name">Ferret</span>
    <span class="gender-name">Male</span>
    <span class="rating-box">general</span>
    <div class="submission-area" data-kind="image" data-folder="gallery">
    <span class="views">1,234</span>
    <span class="comments-count">2</span>
    <span class="favorites">56</span>
    <div class="submission-description">A <strong>quick</strong> sketch for <a href="/user/rednef/">rednef</a></div>
    <div class="submission-footer">thanks for looking</div>
    <a class="download" href="//d.test/art/fender/123.png">Download</a>
    <img id="submissionImg" data-preview-src="//t.test/123@300.jpg" src="x">
    <a class="submission-prev" href="/view/122/">prev</a>
    <a class="submission-next" href="/view/124/">next</a>
    <a class="fav-link" href="/fav/123/?key=abc">+Fav</a>
    <div class="comment_container" data-id="11" data-parent="">
      <a href="/user/alice/"><strong>Alice</strong></a>
      <span class="popup_date" data-time="1700000100"></span>
      <div class="comment-text">nice!</div>
    </div>
    <div class="comment_container" data-id="12" data-parent="11" data-edited="1">
      <a href="/user/fender/"><strong>Fender</strong></a>
      <span class="popup_date" data-time="1700000200"></span>
      <div class="comment-text">thanks</div>
    </div>
    "#;

    #[test]
    fn test_parse_submission_page_core_fields() {
        let sub = parse_submission_page(123, SUBMISSION_PAGE).unwrap();
        assert_eq!(sub.id, 123);
        assert_eq!(sub.title, "Fender Sketch");
        assert_eq!(sub.author.name, "Fender");
        assert_eq!(sub.date, 1_700_000_000);
        assert_eq!(sub.tags, vec!["mascot", "sketch"]);
        assert_eq!(sub.category, "Artwork");
        assert_eq!(sub.rating, "general");
        assert_eq!(sub.kind, "image");
        assert_eq!(sub.stats.views, 1234);
        assert_eq!(sub.file_url, "//d.test/art/fender/123.png");
        assert_eq!(sub.thumbnail_url, "//t.test/123@300.jpg");
        assert_eq!(sub.prev, Some(122));
        assert_eq!(sub.next, Some(124));
        assert!(!sub.favorite);
        assert_eq!(sub.favorite_toggle_link.as_deref(), Some("/fav/123/?key=abc"));
    }

    #[test]
    fn test_parse_submission_page_description_renderings_and_mentions() {
        let sub = parse_submission_page(123, SUBMISSION_PAGE).unwrap();
        assert!(sub.description.contains("<strong>quick</strong>"));
        assert_eq!(
            sub.description_bbcode,
            "A [b]quick[/b] sketch for [url=/user/rednef/]rednef[/url]"
        );
        assert_eq!(sub.mentions, vec!["rednef"]);
    }

    #[test]
    fn test_parse_submission_page_threads_comments() {
        let sub = parse_submission_page(123, SUBMISSION_PAGE).unwrap();
        assert_eq!(sub.comments.len(), 1, "reply should nest under its parent");
        assert_eq!(sub.comments[0].id, 11);
        assert_eq!(sub.comments[0].replies.len(), 1);
        let reply = &sub.comments[0].replies[0];
        assert_eq!(reply.id, 12);
        assert_eq!(reply.reply_to, Some(11));
        assert!(reply.edited);
    }

    #[test]
    fn test_parse_submission_page_missing_title_is_parse_error() {
        let err = parse_submission_page(9, "<html><body>nothing</body></html>").unwrap_err();
        assert!(matches!(err, ScrapeError::Parsing(_)), "got: {err:?}");
    }

    #[test]
    fn test_parse_byline_without_date_uses_zero_sentinel() {
        let byline = r#"<a href="/user/karla_k/"><strong>Karla_K</strong></a>"#;
        let user = parse_byline(byline);
        assert_eq!(user.name, "Karla_K");
        assert_eq!(user.join_date, 0);
    }

    #[test]
    fn test_parse_comments_orphan_reply_falls_back_to_root() {
        let html = r#"
        <div class="comment_container" data-id="5" data-parent="999">
          <a href="/user/x/"><strong>X</strong></a>
          <div class="comment-text">orphan</div>
        </div>"#;
        let comments = parse_comments(html);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, 5);
    }

    #[test]
    fn test_parse_user_page_core_fields() {
        let html = r#"
        <div class="user-identity"><span class="user-status">~</span><span class="user-display-name">Fender</span></div>
        <span class="user-title">Site Mascot</span>
        <span class="user-join-date" data-time="1142683800"></span>
        <img class="user-nav-avatar" src="//a.test/fender.gif">
        <div class="userpage-banner"><img src="//a.test/banner.jpg"></div>
        <div class="userpage-profile">Hello <b>world</b></div>
        <span class="stat-views">100</span>
        <span class="stat-submissions">12</span>
        <span class="stat-journals">3</span>
        <div class="info-row"><strong>Accepting Commissions</strong><span>No</span></div>
        <div class="contact-row"><strong>Telegram</strong><span>@fender</span></div>
        <a class="watch-link" href="/unwatch/fender/?key=k">-Watch</a>
        "#;
        let user = parse_user_page(html).unwrap();
        assert_eq!(user.name, "Fender");
        assert_eq!(user.status, "~");
        assert_eq!(user.title, "Site Mascot");
        assert_eq!(user.join_date, 1_142_683_800);
        assert_eq!(user.profile_bbcode, "Hello [b]world[/b]");
        assert_eq!(user.stats.views, 100);
        assert_eq!(user.info.get("Accepting Commissions").unwrap(), "No");
        assert_eq!(user.contacts.get("Telegram").unwrap(), "@fender");
        assert_eq!(user.banner_url.as_deref(), Some("//a.test/banner.jpg"));
        assert!(user.watched);
        assert!(!user.blocked);
        assert_eq!(user.blocked_toggle_link, None);
    }

    #[test]
    fn test_parse_user_page_missing_profile_is_parse_error() {
        let html = r#"<div class="user-identity"><span class="user-display-name">X</span></div>"#;
        let err = parse_user_page(html).unwrap_err();
        assert!(matches!(err, ScrapeError::Parsing(_)));
    }

    #[test]
    fn test_parse_journal_page_core_fields() {
        let html = r#"
        <div class="journal-title">Con Schedule</div>
        <div class="journal-byline">
          <a href="/user/fender/"><strong>Fender</strong></a>
          <span class="popup_date" data-time="1700000000"></span>
        </div>
        <div class="journal-header">hi</div>
        <div class="journal-content">See <a href="/user/rednef/">rednef</a> there</div>
        <span class="comments-count">0</span>
        "#;
        let journal = parse_journal_page(77, html).unwrap();
        assert_eq!(journal.id, 77);
        assert_eq!(journal.title, "Con Schedule");
        assert_eq!(journal.header, "hi");
        assert_eq!(journal.footer, "");
        assert_eq!(journal.mentions, vec!["rednef"]);
        assert!(journal.comments.is_empty());
    }

    #[test]
    fn test_parse_submission_listing_with_next_page() {
        let html = r#"
        <figure data-id="10" data-rating="general" data-kind="image">
          <a class="submission-link" href="/view/10/">First</a>
          <img src="//t.test/10.jpg">
          <a href="/user/alice/"><strong>Alice</strong></a>
        </figure>
        <figure data-id="11" data-rating="mature" data-kind="text">
          <a class="submission-link" href="/view/11/">Second</a>
          <img src="//t.test/11.jpg">
          <a href="/user/bob/"><strong>Bob</strong></a>
        </figure>
        <a class="button-next" href="/gallery/alice/2/">Next</a>
        "#;
        let folder = parse_submission_listing(html);
        assert_eq!(folder.results.len(), 2);
        assert_eq!(folder.results[0].id, 10);
        assert_eq!(folder.results[0].title, "First");
        assert_eq!(folder.results[1].rating, "mature");
        assert_eq!(folder.next, RawNext::Page(2));
    }

    #[test]
    fn test_parse_submission_listing_last_page() {
        let html = r#"<figure data-id="10"><a class="submission-link" href="/view/10/">Only</a></figure>"#;
        let folder = parse_submission_listing(html);
        assert_eq!(folder.results.len(), 1);
        assert_eq!(folder.next, RawNext::Page(0));
    }

    #[test]
    fn test_favorites_next_token() {
        let html = r#"<a class="button-next" href="/favorites/alice/1400000000/next/">Next</a>"#;
        assert_eq!(
            favorites_next(html, "alice"),
            RawNext::Token("1400000000/next".to_string())
        );
        assert_eq!(favorites_next("", "alice"), RawNext::Token(String::new()));
    }

    #[test]
    fn test_parse_journal_listing() {
        let html = r#"
        <section class="journal-item" data-id="7" data-comments="4">
          <span class="journal-item-title">Update</span>
          <a href="/user/carol/"><strong>Carol</strong></a>
          <span class="popup_date" data-time="1650000000"></span>
          <div class="journal-body">short note</div>
        </section>
        "#;
        let folder = parse_journal_listing(html);
        assert_eq!(folder.results.len(), 1);
        assert_eq!(folder.results[0].id, 7);
        assert_eq!(folder.results[0].stats.comments, 4);
        assert_eq!(folder.results[0].content, "short note");
        assert_eq!(folder.next, RawNext::Page(0));
    }

    #[test]
    fn test_parse_watchlist() {
        let html = r#"
        <div class="watch-row"><a href="/user/dan/"><strong>Dan</strong></a></div>
        <div class="watch-row"><a href="/user/erin/"><strong>Erin</strong></a></div>
        "#;
        let folder = parse_watchlist(html);
        assert_eq!(folder.results.len(), 2);
        assert_eq!(folder.results[1].name, "Erin");
    }

    #[test]
    fn test_cookie_header_assembly() {
        assert_eq!(cookie_header(&[]), None);
        let cookies = vec![Cookie::new("a", "1"), Cookie::new("b", "2")];
        assert_eq!(cookie_header(&cookies).unwrap(), "a=1; b=2");
    }
}
