//! Cross-component tests for the reconcile and orphan-check operations.

use std::io::{Read, Write};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::{tempdir, TempDir};

use catalog_sync::application::use_cases::{OrphanUseCases, SyncUseCases};
use catalog_sync::domain::feed::{FeedError, FeedItem, ParsedFeed};
use catalog_sync::domain::product::MarketingFields;
use catalog_sync::domain::services::FeedProvider;
use catalog_sync::infrastructure::backup_repository::BackupRepository;
use catalog_sync::infrastructure::config::FeedConfig;
use catalog_sync::infrastructure::database_connection::DatabaseConnection;
use catalog_sync::infrastructure::feed_client::HttpFeedClient;
use catalog_sync::infrastructure::product_repository::ProductRepository;
use catalog_sync::infrastructure::sync_run_repository::{
    SyncRunRepository, STATUS_COMPLETED, STATUS_FAILED,
};
use catalog_sync::infrastructure::taxonomy_repository::TaxonomyRepository;

/// Feed source serving a fixed, in-memory pull.
struct StubFeed {
    feed: ParsedFeed,
}

impl StubFeed {
    fn with_items(items: Vec<FeedItem>) -> Arc<Self> {
        Arc::new(Self {
            feed: ParsedFeed { items, dropped: 0 },
        })
    }
}

#[async_trait]
impl FeedProvider for StubFeed {
    async fn fetch(&self, _url: &str) -> Result<ParsedFeed, FeedError> {
        Ok(self.feed.clone())
    }
}

struct Repos {
    products: ProductRepository,
    backups: BackupRepository,
    taxonomy: TaxonomyRepository,
    sync_runs: SyncRunRepository,
}

async fn setup() -> Result<(TempDir, Repos)> {
    let temp_dir = tempdir()?;
    let url = format!("sqlite:{}", temp_dir.path().join("test.db").display());
    let db = DatabaseConnection::new(&url).await?;
    db.migrate().await?;
    let pool = db.pool().clone();
    Ok((
        temp_dir,
        Repos {
            products: ProductRepository::new(pool.clone()),
            backups: BackupRepository::new(pool.clone()),
            taxonomy: TaxonomyRepository::new(pool.clone()),
            sync_runs: SyncRunRepository::new(pool),
        },
    ))
}

fn sync_over(feed: Arc<dyn FeedProvider>, repos: &Repos) -> SyncUseCases {
    SyncUseCases::new(
        feed,
        repos.products.clone(),
        repos.taxonomy.clone(),
        repos.sync_runs.clone(),
    )
}

fn item(sku: &str, name: &str, price: f64) -> FeedItem {
    FeedItem {
        sku: sku.to_string(),
        name: name.to_string(),
        description: None,
        image_url: None,
        price: Some(price),
        available: true,
        brand: Some("Alpin".to_string()),
        category: Some("Outdoor".to_string()),
        subcategory: Some("Hiking".to_string()),
        product_url: None,
    }
}

#[tokio::test]
async fn second_sync_over_unchanged_feed_creates_nothing() -> Result<()> {
    let (_guard, repos) = setup().await?;
    let feed = StubFeed::with_items(vec![item("A-1", "Pole", 49.9), item("A-2", "Tent", 199.0)]);
    let sync = sync_over(feed, &repos);

    let first = sync.sync_from_feed("https://feed.example/export.json", None).await?;
    assert_eq!(first.created, 2);
    assert_eq!(first.updated, 0);
    assert_eq!(first.total_products, 2);

    let second = sync.sync_from_feed("https://feed.example/export.json", None).await?;
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 2);
    assert_eq!(repos.products.count_products().await?, 2);

    let status = sync.get_sync_status().await?;
    assert_eq!(status.total_products, 2);
    assert!(status.last_sync.is_some());
    Ok(())
}

#[tokio::test]
async fn sync_never_touches_marketing_fields() -> Result<()> {
    let (_guard, repos) = setup().await?;
    let sync = sync_over(
        StubFeed::with_items(vec![item("A-1", "Pole", 49.9)]),
        &repos,
    );
    sync.sync_from_feed("https://feed.example/export.json", None).await?;

    let product = repos.products.find_by_sku("A-1").await?.unwrap();
    let marketing = MarketingFields {
        claim: Some("Lightest pole we carry".to_string()),
        hashtags: Some("#trail".to_string()),
        top_slot: Some(2),
        ..MarketingFields::default()
    };
    repos.products.apply_marketing(&product.id, &marketing).await?;

    // The feed renames the product and changes its price.
    let sync = sync_over(
        StubFeed::with_items(vec![item("A-1", "Trekking Pole Pro", 59.9)]),
        &repos,
    );
    sync.sync_from_feed("https://feed.example/export.json", None).await?;

    let after = repos.products.find_by_sku("A-1").await?.unwrap();
    assert_eq!(after.feed.name, "Trekking Pole Pro");
    assert_eq!(after.feed.price, Some(59.9));
    assert_eq!(after.marketing.claim.as_deref(), Some("Lightest pole we carry"));
    assert_eq!(after.marketing.hashtags.as_deref(), Some("#trail"));
    assert_eq!(after.marketing.top_slot, Some(2));
    Ok(())
}

#[tokio::test]
async fn limit_caps_the_number_of_processed_items() -> Result<()> {
    let (_guard, repos) = setup().await?;
    let sync = sync_over(
        StubFeed::with_items(vec![
            item("A-1", "One", 1.0),
            item("A-2", "Two", 2.0),
            item("A-3", "Three", 3.0),
        ]),
        &repos,
    );

    let result = sync.sync_from_feed("https://feed.example/export.json", Some(2)).await?;
    assert_eq!(result.total_products, 2);
    assert_eq!(result.created, 2);
    assert_eq!(repos.products.count_products().await?, 2);
    assert!(repos.products.find_by_sku("A-3").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn duplicate_skus_resolve_to_the_last_occurrence() -> Result<()> {
    let (_guard, repos) = setup().await?;
    let sync = sync_over(
        StubFeed::with_items(vec![
            item("A-1", "Early name", 10.0),
            item("A-2", "Other", 5.0),
            item("A-1", "Final name", 12.5),
        ]),
        &repos,
    );

    sync.sync_from_feed("https://feed.example/export.json", None).await?;

    assert_eq!(repos.products.count_products().await?, 2);
    let product = repos.products.find_by_sku("A-1").await?.unwrap();
    assert_eq!(product.feed.name, "Final name");
    assert_eq!(product.feed.price, Some(12.5));
    Ok(())
}

#[tokio::test]
async fn sync_replaces_the_taxonomy_cache() -> Result<()> {
    let (_guard, repos) = setup().await?;
    let sync = sync_over(
        StubFeed::with_items(vec![item("A-1", "Pole", 49.9)]),
        &repos,
    );
    sync.sync_from_feed("https://feed.example/export.json", None).await?;

    let taxonomy = repos.taxonomy.load().await?;
    assert_eq!(taxonomy.main_categories(), vec!["Outdoor"]);
    assert!(taxonomy.categories["Outdoor"].contains("Hiking"));

    let mut kitchen = item("A-2", "Cup", 8.0);
    kitchen.category = Some("Kitchen".to_string());
    kitchen.subcategory = Some("Cups".to_string());
    let sync = sync_over(StubFeed::with_items(vec![kitchen]), &repos);
    sync.sync_from_feed("https://feed.example/export.json", None).await?;

    let taxonomy = repos.taxonomy.load().await?;
    assert_eq!(taxonomy.main_categories(), vec!["Kitchen"]);
    Ok(())
}

#[tokio::test]
async fn orphan_check_lists_exactly_the_vanished_skus() -> Result<()> {
    let (_guard, repos) = setup().await?;
    let sync = sync_over(
        StubFeed::with_items(vec![item("A-1", "Stays", 1.0), item("A-2", "Vanishes", 2.0)]),
        &repos,
    );
    sync.sync_from_feed("https://feed.example/export.json", None).await?;

    let vanished = repos.products.find_by_sku("A-2").await?.unwrap();
    repos
        .products
        .apply_marketing(
            &vanished.id,
            &MarketingFields {
                claim: Some("Cult favourite".to_string()),
                ..MarketingFields::default()
            },
        )
        .await?;

    // Manual rows have no sku and can never be orphans.
    repos.products.create_product("Showroom special", None).await?;

    let orphans = OrphanUseCases::new(
        StubFeed::with_items(vec![item("A-1", "Stays", 1.0)]),
        repos.products.clone(),
        repos.backups.clone(),
    );
    let check = orphans
        .check_orphaned_products("https://feed.example/export.json")
        .await?;

    assert_eq!(check.feed_skus_count, 1);
    assert_eq!(check.orphaned_products.len(), 1);
    let orphan = &check.orphaned_products[0];
    assert_eq!(orphan.sku, "A-2");
    assert_eq!(orphan.name, "Vanishes");
    assert!(orphan.has_marketing_data);

    // Read-only: nothing was deleted or changed.
    assert_eq!(repos.products.count_products().await?, 3);
    Ok(())
}

#[tokio::test]
async fn unreachable_feed_aborts_sync_without_mutation() -> Result<()> {
    let (_guard, repos) = setup().await?;

    // One-shot HTTP stub answering 503 to whatever arrives.
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(
                b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
            );
        }
    });

    let client = HttpFeedClient::new(&FeedConfig::default())?;
    let sync = sync_over(Arc::new(client), &repos);

    let result = sync
        .sync_from_feed(&format!("http://{addr}/export.json"), None)
        .await;
    assert!(result.is_err());
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("503"), "unexpected error: {message}");

    assert_eq!(repos.products.count_products().await?, 0);

    // The aborted pull is recorded as failed, and the status view keeps
    // reporting that no sync has ever completed.
    let run = repos.sync_runs.latest().await?.unwrap();
    assert_eq!(run.status, STATUS_FAILED);
    assert_eq!(run.items_total, 0);
    assert!(repos.sync_runs.latest_completed().await?.is_none());

    let status = sync.get_sync_status().await?;
    assert!(status.last_sync.is_none());
    Ok(())
}

#[tokio::test]
async fn one_bad_record_does_not_block_the_rest_of_a_sync() -> Result<()> {
    let (_guard, repos) = setup().await?;

    // The middle item carries a whitespace-only sku; its upsert is rejected
    // by the repository while the surrounding items go through.
    let sync = sync_over(
        StubFeed::with_items(vec![
            item("A-1", "First", 1.0),
            item("   ", "Broken", 2.0),
            item("A-3", "Third", 3.0),
        ]),
        &repos,
    );

    let result = sync.sync_from_feed("https://feed.example/export.json", None).await?;
    assert!(result.success);
    assert_eq!(result.created, 2);
    assert_eq!(result.updated, 0);
    assert_eq!(result.total_products, 2);

    assert_eq!(repos.products.count_products().await?, 2);
    assert!(repos.products.find_by_sku("A-1").await?.is_some());
    assert!(repos.products.find_by_sku("A-3").await?.is_some());

    // The run record counts only the records that actually landed.
    let run = repos.sync_runs.latest().await?.unwrap();
    assert_eq!(run.status, STATUS_COMPLETED);
    assert_eq!(run.items_total, 2);
    assert_eq!(run.created_count, 2);
    Ok(())
}
