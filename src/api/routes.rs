//! HTTP surface of the gateway.
//!
//! Resource lookups are POST: the session cookies travel in the request body
//! so they never land in access logs or proxy caches. Every content handler
//! follows the same sequence: authorize (when cookies are present), fetch,
//! pace, shape. Every failure leaves through [`ApiError`].

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use crate::api::error::ApiError;
use crate::api::schema::{
    self, Folder, Journal, JournalPartial, Submission, SubmissionPartial, TextFormat, User,
    UserPartial,
};
use crate::auth::{AuthOutcome, AuthService, Cookie, DeauthOutcome};
use crate::pacing::Pacer;
use crate::scraper::ScrapeClient;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn ScrapeClient>,
    pub auth: Arc<AuthService>,
    pub pacer: Arc<Pacer>,
}

/// Request body shared by every resource endpoint. A missing body means "no
/// cookies": content routes serve the public view, auth routes reject it.
#[derive(Debug, Default, Deserialize)]
pub struct ResourceRequest {
    #[serde(default)]
    pub cookies: Vec<Cookie>,
}

/// Rendering options carried in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct RenderQuery {
    /// Render long-text fields as BBCode instead of HTML.
    #[serde(default)]
    pub bbcode: bool,
}

impl RenderQuery {
    fn format(&self) -> TextFormat {
        TextFormat::from_bbcode_flag(self.bbcode)
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/submission/{id}", post(submission))
        .route("/journal/{id}", post(journal))
        .route("/user/{username}", post(user))
        .route("/gallery/{username}/{page}", post(gallery))
        .route("/scraps/{username}/{page}", post(scraps))
        .route("/favorites/{username}", post(favorites_first))
        .route("/favorites/{username}/{*page}", post(favorites))
        .route("/journals/{username}/{page}", post(journals))
        .route("/watchlist/{username}/{page}", post(watchlist))
        .route("/auth/add", post(auth_add))
        .route("/auth/remove", post(auth_remove))
        .with_state(state)
}

/// Usernames ignore underscores upstream; strip them before building paths.
fn normalize_username(raw: &str) -> String {
    raw.chars().filter(|c| *c != '_').collect()
}

/// Waits out the caller's pacing interval after an upstream call completed,
/// successfully or not, then surfaces the result. The delay lands inside the
/// request span, so the caller absorbs it as latency.
async fn pace_after<T, E>(
    state: &AppState,
    addr: SocketAddr,
    result: Result<T, E>,
) -> Result<T, ApiError>
where
    ApiError: From<E>,
{
    state.pacer.pace(addr.ip()).await;
    Ok(result?)
}

fn body_cookies(body: Option<Json<ResourceRequest>>) -> Vec<Cookie> {
    body.map(|Json(b)| b.cookies).unwrap_or_default()
}

/// Content resources are public: an empty cookie set is forwarded upstream
/// as-is. Only a non-empty set must pass the cached authorization gate.
async fn gate_cookies(state: &AppState, cookies: &[Cookie]) -> Result<(), ApiError> {
    if cookies.is_empty() {
        return Ok(());
    }
    state.auth.ensure_authorized(cookies).await?;
    Ok(())
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[instrument(skip_all)]
async fn submission(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<u64>,
    Query(query): Query<RenderQuery>,
    body: Option<Json<ResourceRequest>>,
) -> Result<Json<Submission>, ApiError> {
    let cookies = body_cookies(body);
    gate_cookies(&state, &cookies).await?;
    let fetched = state.client.submission(&cookies, id).await;
    let scraped = pace_after(&state, addr, fetched).await?;
    Ok(Json(schema::shape_submission(scraped, query.format())))
}

#[instrument(skip_all)]
async fn journal(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<u64>,
    Query(query): Query<RenderQuery>,
    body: Option<Json<ResourceRequest>>,
) -> Result<Json<Journal>, ApiError> {
    let cookies = body_cookies(body);
    gate_cookies(&state, &cookies).await?;
    let fetched = state.client.journal(&cookies, id).await;
    let scraped = pace_after(&state, addr, fetched).await?;
    Ok(Json(schema::shape_journal(scraped, query.format())))
}

#[instrument(skip_all)]
async fn user(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(username): Path<String>,
    Query(query): Query<RenderQuery>,
    body: Option<Json<ResourceRequest>>,
) -> Result<Json<User>, ApiError> {
    let cookies = body_cookies(body);
    gate_cookies(&state, &cookies).await?;
    let name = normalize_username(&username);
    let fetched = state.client.user(&cookies, &name).await;
    let scraped = pace_after(&state, addr, fetched).await?;
    Ok(Json(schema::shape_user(scraped, query.format())))
}

#[instrument(skip_all)]
async fn gallery(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path((username, page)): Path<(String, u64)>,
    body: Option<Json<ResourceRequest>>,
) -> Result<Json<Folder<SubmissionPartial>>, ApiError> {
    let cookies = body_cookies(body);
    gate_cookies(&state, &cookies).await?;
    let name = normalize_username(&username);
    let fetched = state.client.gallery(&cookies, &name, page).await;
    let scraped = pace_after(&state, addr, fetched).await?;
    Ok(Json(schema::shape_folder(
        scraped,
        schema::shape_submission_partial,
    )))
}

#[instrument(skip_all)]
async fn scraps(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path((username, page)): Path<(String, u64)>,
    body: Option<Json<ResourceRequest>>,
) -> Result<Json<Folder<SubmissionPartial>>, ApiError> {
    let cookies = body_cookies(body);
    gate_cookies(&state, &cookies).await?;
    let name = normalize_username(&username);
    let fetched = state.client.scraps(&cookies, &name, page).await;
    let scraped = pace_after(&state, addr, fetched).await?;
    Ok(Json(schema::shape_folder(
        scraped,
        schema::shape_submission_partial,
    )))
}

async fn favorites_first(
    state: State<AppState>,
    addr: ConnectInfo<SocketAddr>,
    Path(username): Path<String>,
    body: Option<Json<ResourceRequest>>,
) -> Result<Json<Folder<SubmissionPartial>>, ApiError> {
    favorites_page(state, addr, username, String::new(), body).await
}

async fn favorites(
    state: State<AppState>,
    addr: ConnectInfo<SocketAddr>,
    Path((username, page)): Path<(String, String)>,
    body: Option<Json<ResourceRequest>>,
) -> Result<Json<Folder<SubmissionPartial>>, ApiError> {
    favorites_page(state, addr, username, page, body).await
}

/// The favorites folder paginates by opaque token, which may itself contain
/// slashes; both routes funnel here.
#[instrument(skip_all)]
async fn favorites_page(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    username: String,
    page: String,
    body: Option<Json<ResourceRequest>>,
) -> Result<Json<Folder<SubmissionPartial>>, ApiError> {
    let cookies = body_cookies(body);
    gate_cookies(&state, &cookies).await?;
    let name = normalize_username(&username);
    let token = page.trim_matches('/');
    let fetched = state.client.favorites(&cookies, &name, token).await;
    let scraped = pace_after(&state, addr, fetched).await?;
    Ok(Json(schema::shape_folder(
        scraped,
        schema::shape_submission_partial,
    )))
}

#[instrument(skip_all)]
async fn journals(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path((username, page)): Path<(String, u64)>,
    Query(query): Query<RenderQuery>,
    body: Option<Json<ResourceRequest>>,
) -> Result<Json<Folder<JournalPartial>>, ApiError> {
    let cookies = body_cookies(body);
    gate_cookies(&state, &cookies).await?;
    let name = normalize_username(&username);
    let fetched = state.client.journals(&cookies, &name, page).await;
    let scraped = pace_after(&state, addr, fetched).await?;
    let format = query.format();
    Ok(Json(schema::shape_folder(scraped, |j| {
        schema::shape_journal_partial(j, format)
    })))
}

#[instrument(skip_all)]
async fn watchlist(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path((username, page)): Path<(String, u64)>,
    body: Option<Json<ResourceRequest>>,
) -> Result<Json<Folder<UserPartial>>, ApiError> {
    let cookies = body_cookies(body);
    gate_cookies(&state, &cookies).await?;
    let name = normalize_username(&username);
    let fetched = state.client.watchlist(&cookies, &name, page).await;
    let scraped = pace_after(&state, addr, fetched).await?;
    Ok(Json(schema::shape_folder(
        scraped,
        schema::shape_user_partial,
    )))
}

#[instrument(skip_all)]
async fn auth_add(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    body: Option<Json<ResourceRequest>>,
) -> Result<Json<AuthOutcome>, ApiError> {
    let cookies = body_cookies(body);
    // A first-sight add probes the upstream, so it is paced like content
    let added = state.auth.add(&cookies).await;
    let outcome = pace_after(&state, addr, added).await?;
    Ok(Json(outcome))
}

#[instrument(skip_all)]
async fn auth_remove(
    State(state): State<AppState>,
    body: Option<Json<ResourceRequest>>,
) -> Result<Json<DeauthOutcome>, ApiError> {
    let cookies = body_cookies(body);
    let outcome = state.auth.remove(&cookies).await?;
    Ok(Json(outcome))
}
