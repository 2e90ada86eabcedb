//! Authorization behavior across the service, the store and its capacity
//! bound, using a counting upstream double.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use furgate::auth::{AuthService, AuthorizationStore, Cookie};
use furgate::db::Database;
use furgate::scraper::{
    ScrapeClient, ScrapeError, ScrapedFolder, ScrapedJournal, ScrapedJournalPartial,
    ScrapedSubmission, ScrapedSubmissionPartial, ScrapedUser, ScrapedUserPartial,
};

struct CountingProbe {
    probes: AtomicUsize,
}

impl CountingProbe {
    fn new() -> Self {
        Self {
            probes: AtomicUsize::new(0),
        }
    }

    fn count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScrapeClient for CountingProbe {
    async fn check_login(&self, _cookies: &[Cookie]) -> Result<bool, ScrapeError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn submission(
        &self,
        _cookies: &[Cookie],
        _id: u64,
    ) -> Result<ScrapedSubmission, ScrapeError> {
        panic!("no content fetches in auth tests")
    }

    async fn journal(
        &self,
        _cookies: &[Cookie],
        _id: u64,
    ) -> Result<ScrapedJournal, ScrapeError> {
        panic!("no content fetches in auth tests")
    }

    async fn user(&self, _cookies: &[Cookie], _name: &str) -> Result<ScrapedUser, ScrapeError> {
        panic!("no content fetches in auth tests")
    }

    async fn gallery(
        &self,
        _cookies: &[Cookie],
        _name: &str,
        _page: u64,
    ) -> Result<ScrapedFolder<ScrapedSubmissionPartial>, ScrapeError> {
        panic!("no content fetches in auth tests")
    }

    async fn scraps(
        &self,
        _cookies: &[Cookie],
        _name: &str,
        _page: u64,
    ) -> Result<ScrapedFolder<ScrapedSubmissionPartial>, ScrapeError> {
        panic!("no content fetches in auth tests")
    }

    async fn favorites(
        &self,
        _cookies: &[Cookie],
        _name: &str,
        _page: &str,
    ) -> Result<ScrapedFolder<ScrapedSubmissionPartial>, ScrapeError> {
        panic!("no content fetches in auth tests")
    }

    async fn journals(
        &self,
        _cookies: &[Cookie],
        _name: &str,
        _page: u64,
    ) -> Result<ScrapedFolder<ScrapedJournalPartial>, ScrapeError> {
        panic!("no content fetches in auth tests")
    }

    async fn watchlist(
        &self,
        _cookies: &[Cookie],
        _name: &str,
        _page: u64,
    ) -> Result<ScrapedFolder<ScrapedUserPartial>, ScrapeError> {
        panic!("no content fetches in auth tests")
    }

    fn crawl_delay(&self) -> Duration {
        Duration::from_secs(1)
    }
}

async fn service_with_limit(limit: i64) -> (AuthService, Arc<CountingProbe>, AuthorizationStore) {
    let db = Database::new_in_memory().await.unwrap();
    let store = AuthorizationStore::new(db, limit);
    let probe = Arc::new(CountingProbe::new());
    let service = AuthService::new(store.clone(), probe.clone());
    (service, probe, store)
}

fn credentials(i: u32) -> Vec<Cookie> {
    vec![Cookie::new("a", format!("token-{i}")), Cookie::new("b", "shared")]
}

#[tokio::test]
async fn test_distinct_credentials_are_cached_independently() {
    let (service, probe, store) = service_with_limit(100).await;

    for i in 0..3 {
        service.ensure_authorized(&credentials(i)).await.unwrap();
    }
    assert_eq!(probe.count(), 3);
    assert_eq!(store.count().await.unwrap(), 3);

    // All three hit the cache now
    for i in 0..3 {
        service.ensure_authorized(&credentials(i)).await.unwrap();
    }
    assert_eq!(probe.count(), 3);
}

#[tokio::test]
async fn test_eviction_forces_reconfirmation_of_oldest() {
    let (service, probe, store) = service_with_limit(2).await;

    // Three confirmations through a store that holds two
    for i in 0..3 {
        service.ensure_authorized(&credentials(i)).await.unwrap();
    }
    assert_eq!(probe.count(), 3);
    assert_eq!(store.count().await.unwrap(), 2);

    // The newest two still hit the cache
    service.ensure_authorized(&credentials(1)).await.unwrap();
    service.ensure_authorized(&credentials(2)).await.unwrap();
    assert_eq!(probe.count(), 3);

    // The evicted oldest needs a fresh upstream confirmation
    service.ensure_authorized(&credentials(0)).await.unwrap();
    assert_eq!(probe.count(), 4);
}

#[tokio::test]
async fn test_store_survives_reopening_the_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("auth.db");

    {
        let db = Database::new(&path).await.unwrap();
        let store = AuthorizationStore::new(db.clone(), 100);
        let probe = Arc::new(CountingProbe::new());
        let service = AuthService::new(store, probe.clone());
        service.ensure_authorized(&credentials(0)).await.unwrap();
        assert_eq!(probe.count(), 1);
        db.close().await;
    }

    // A fresh process sees the confirmed fingerprint without re-probing
    let db = Database::new(&path).await.unwrap();
    let store = AuthorizationStore::new(db, 100);
    let probe = Arc::new(CountingProbe::new());
    let service = AuthService::new(store, probe.clone());
    service.ensure_authorized(&credentials(0)).await.unwrap();
    assert_eq!(probe.count(), 0, "durable cache must survive restarts");
}
