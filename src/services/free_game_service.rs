use std::collections::HashSet;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use crate::api::epic::{CatalogElement, FreeGamesFeed, PromotionWindow};
use crate::db::FreeGameStore;
use crate::models::NewPromotionEntry;
use crate::services::notifier::FreeGameNotifier;
use crate::utils::errors::PromotionError;

/// Whether entries that failed to persist are still reported as new
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotifyPolicy {
    /// Report them anyway; the next pass may report them again
    #[default]
    NotifyUnpersisted,
    /// Leave them out; the next pass retries them
    SkipUnpersisted,
}

/// Offers that are free right now, paired with their active window
pub fn select_current_free_games(
    elements: Vec<CatalogElement>,
    now: DateTime<Utc>,
) -> Vec<(CatalogElement, PromotionWindow)> {
    elements
        .into_iter()
        .filter(|element| element.is_free())
        .filter_map(|element| {
            let window = element.active_window(now)?;
            Some((element, window))
        })
        .collect()
}

/// Join the product base url and a page slug
pub fn product_url(base: &str, slug: &str) -> String {
    match reqwest::Url::parse(base) {
        Ok(mut url) => {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty();
                if !slug.is_empty() {
                    segments.push(slug);
                }
            }
            url.to_string()
        }
        Err(e) => {
            warn!("EGS Free Games: invalid product base url {:?}: {}", base, e);
            format!("{}/{}", base.trim_end_matches('/'), slug)
        }
    }
}

fn owned_key((store_id, title): (&str, &str)) -> (String, String) {
    (store_id.to_string(), title.to_string())
}

/// Detects newly free games and records them
pub struct FreeGameService {
    store: Arc<dyn FreeGameStore>,
    feed: Arc<dyn FreeGamesFeed>,
    product_base_url: String,
    notify_policy: NotifyPolicy,
}

impl FreeGameService {
    pub fn new(
        store: Arc<dyn FreeGameStore>,
        feed: Arc<dyn FreeGamesFeed>,
        product_base_url: String,
        notify_policy: NotifyPolicy,
    ) -> Self {
        Self {
            store,
            feed,
            product_base_url,
            notify_policy,
        }
    }

    fn to_entry(&self, element: &CatalogElement, window: PromotionWindow) -> NewPromotionEntry {
        NewPromotionEntry {
            store_id: element.store_id.clone(),
            title: element.title.clone(),
            description: element.description.clone(),
            url: product_url(&self.product_base_url, &element.product_slug()),
            thumbnail_url: element.thumbnail(),
            active_from: window.start_date,
            active_until: window.end_date,
        }
    }

    /// Fetch the catalog, store the free games not seen before, and return them
    pub async fn fetch_new_free_games(&self) -> Result<Vec<NewPromotionEntry>, PromotionError> {
        let elements = self.feed.fetch_catalog().await?;
        let now = Utc::now();
        let current = select_current_free_games(elements, now);
        debug!("EGS Free Games: {} currently free upstream", current.len());

        // Without a baseline every active game would be reported again
        let baseline = self.store.active_promotion_entries().await?;
        let mut seen: HashSet<(String, String)> = baseline.iter().map(|entry| owned_key(entry.natural_key())).collect();

        let mut new_games = Vec::new();
        for (element, window) in current {
            let entry = self.to_entry(&element, window);
            if !seen.insert(owned_key(entry.natural_key())) {
                continue;
            }

            match self.store.insert_promotion_entry(&entry).await {
                Ok(stored) => {
                    info!("EGS Free Games: new free game \"{}\" (id {})", stored.title, stored.id);
                    new_games.push(entry);
                }
                Err(e) => {
                    warn!("EGS Free Games: failed to add \"{}\" to the database: {}", entry.title, e);
                    if self.notify_policy == NotifyPolicy::NotifyUnpersisted {
                        new_games.push(entry);
                    }
                }
            }
        }

        Ok(new_games)
    }

    /// One scheduled pass: detect new games and hand them to the notifier
    pub async fn publish_new_free_games(&self, notifier: &dyn FreeGameNotifier) -> Result<usize, PromotionError> {
        let new_games = self.fetch_new_free_games().await?;

        if !new_games.is_empty() {
            if let Err(e) = notifier.notify(&new_games).await {
                warn!("EGS Free Games: failed to send notification: {}", e);
            }
        }

        Ok(new_games.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;
    use async_trait::async_trait;
    use chrono::Duration;
    use crate::api::epic::models::{Price, PromotionGroup, Promotions, TotalPrice};
    use crate::api::ApiError;
    use crate::db::memory::MemoryStore;

    const BASE: &str = "https://www.epicgames.com/store/en-US/product/";

    struct FakeCatalog {
        elements: Mutex<Vec<CatalogElement>>,
    }

    impl FakeCatalog {
        fn new(elements: Vec<CatalogElement>) -> Self {
            Self { elements: Mutex::new(elements) }
        }
    }

    #[async_trait]
    impl FreeGamesFeed for FakeCatalog {
        async fn fetch_catalog(&self) -> Result<Vec<CatalogElement>, ApiError> {
            Ok(self.elements.lock().unwrap().clone())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        batches: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl FreeGameNotifier for RecordingNotifier {
        async fn notify(&self, games: &[NewPromotionEntry]) -> Result<(), String> {
            self.batches.lock().unwrap().push(games.iter().map(|g| g.title.clone()).collect());
            Ok(())
        }
    }

    fn free_game(store_id: &str, title: &str) -> CatalogElement {
        let now = Utc::now();
        CatalogElement {
            store_id: store_id.to_string(),
            title: title.to_string(),
            description: format!("{} description", title),
            url_slug: Some(title.to_lowercase()),
            price: Some(Price { total_price: TotalPrice { discount_price: 0 } }),
            promotions: Some(Promotions {
                promotional_offers: vec![PromotionGroup {
                    promotional_offers: vec![PromotionWindow {
                        start_date: now - Duration::days(1),
                        end_date: now + Duration::days(6),
                    }],
                }],
            }),
            ..Default::default()
        }
    }

    fn service(store: Arc<MemoryStore>, catalog: Vec<CatalogElement>, policy: NotifyPolicy) -> FreeGameService {
        FreeGameService::new(store, Arc::new(FakeCatalog::new(catalog)), BASE.to_string(), policy)
    }

    #[test]
    fn test_product_url() {
        assert_eq!(product_url(BASE, "some-game"), "https://www.epicgames.com/store/en-US/product/some-game");
        assert_eq!(
            product_url("https://store.example.com/p", "game"),
            "https://store.example.com/p/game"
        );
    }

    #[test]
    fn test_select_current_free_games_filters_price_and_window() {
        let mut paid = free_game("C", "Paid");
        paid.price = Some(Price { total_price: TotalPrice { discount_price: 1999 } });
        let mut expired = free_game("D", "Expired");
        expired.promotions = Some(Promotions {
            promotional_offers: vec![PromotionGroup {
                promotional_offers: vec![PromotionWindow {
                    start_date: Utc::now() - Duration::days(10),
                    end_date: Utc::now() - Duration::days(3),
                }],
            }],
        });

        let selected = select_current_free_games(vec![free_game("A", "X"), paid, expired], Utc::now());
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].0.title, "X");
    }

    #[tokio::test]
    async fn test_only_unseen_games_are_new() {
        let store = Arc::new(MemoryStore::new());
        service(store.clone(), vec![free_game("A", "X")], NotifyPolicy::default())
            .fetch_new_free_games()
            .await
            .unwrap();

        let new_games = service(store.clone(), vec![free_game("A", "X"), free_game("B", "Y")], NotifyPolicy::default())
            .fetch_new_free_games()
            .await
            .unwrap();

        assert_eq!(new_games.len(), 1);
        assert_eq!(new_games[0].natural_key(), ("B", "Y"));
        assert_eq!(new_games[0].url, format!("{}y", BASE));
        assert_eq!(store.games().len(), 2);
    }

    #[tokio::test]
    async fn test_second_pass_is_empty() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), vec![free_game("A", "X"), free_game("B", "Y")], NotifyPolicy::default());

        assert_eq!(service.fetch_new_free_games().await.unwrap().len(), 2);
        assert!(service.fetch_new_free_games().await.unwrap().is_empty());
        assert_eq!(store.games().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_keys_in_one_pass_are_stored_once() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), vec![free_game("A", "X"), free_game("A", "X")], NotifyPolicy::default());

        assert_eq!(service.fetch_new_free_games().await.unwrap().len(), 1);
        assert_eq!(store.games().len(), 1);
    }

    #[tokio::test]
    async fn test_same_title_different_store_id_is_new() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), vec![free_game("A", "X"), free_game("B", "X")], NotifyPolicy::default());

        assert_eq!(service.fetch_new_free_games().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unpersisted_games_follow_policy() {
        let store = Arc::new(MemoryStore::new());
        store.fail_writes.store(true, Ordering::SeqCst);

        let notify = service(store.clone(), vec![free_game("A", "X")], NotifyPolicy::NotifyUnpersisted);
        assert_eq!(notify.fetch_new_free_games().await.unwrap().len(), 1);

        let skip = service(store.clone(), vec![free_game("A", "X")], NotifyPolicy::SkipUnpersisted);
        assert!(skip.fetch_new_free_games().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_baseline_failure_aborts_pass() {
        let store = Arc::new(MemoryStore::new());
        store.fail_reads.store(true, Ordering::SeqCst);
        let service = service(store.clone(), vec![free_game("A", "X")], NotifyPolicy::default());

        assert!(matches!(service.fetch_new_free_games().await, Err(PromotionError::Persistence(_))));
        assert!(store.games().is_empty());
    }

    #[tokio::test]
    async fn test_publish_notifies_only_when_new() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store, vec![free_game("A", "X")], NotifyPolicy::default());
        let notifier = RecordingNotifier::default();

        assert_eq!(service.publish_new_free_games(&notifier).await.unwrap(), 1);
        assert_eq!(service.publish_new_free_games(&notifier).await.unwrap(), 0);
        assert_eq!(*notifier.batches.lock().unwrap(), vec![vec!["X".to_string()]]);
    }
}
