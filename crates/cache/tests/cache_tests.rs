use chrono::Utc;
use gridpulse_cache::mem::MemSeriesCache;
use gridpulse_core::cache::port::{SeriesCache, SeriesKey};
use gridpulse_core::common::{Category, TimeRange};
use gridpulse_core::market::entity::{DataPoint, Series, Trend};
use std::sync::Arc;

fn series(category: Category, range: TimeRange, value: f64) -> Arc<Series> {
    let mut s = Series::empty(category, range);
    s.points.push(DataPoint {
        label: Utc::now(),
        value,
        volume: 10.0,
        change: 0.0,
        volatility: 0.1,
        trend: Trend::Stable,
        short_moving_average: None,
        long_moving_average: None,
    });
    Arc::new(s)
}

#[tokio::test]
async fn test_get_returns_same_instance() {
    let cache = MemSeriesCache::new();
    let key = SeriesKey::new(Category::CrudeOil, TimeRange::OneDay);

    assert!(cache.get(&key).await.unwrap().is_none());

    let stored = series(Category::CrudeOil, TimeRange::OneDay, 80.0);
    cache.set(key, stored.clone()).await.unwrap();

    let first = cache.get(&key).await.unwrap().unwrap();
    let second = cache.get(&key).await.unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &stored));
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_set_overwrites_whole_entry() {
    let cache = MemSeriesCache::new();
    let key = SeriesKey::new(Category::Coal, TimeRange::OneWeek);

    cache
        .set(key, series(Category::Coal, TimeRange::OneWeek, 100.0))
        .await
        .unwrap();
    cache
        .set(key, series(Category::Coal, TimeRange::OneWeek, 120.0))
        .await
        .unwrap();

    let current = cache.get(&key).await.unwrap().unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current.points[0].value, 120.0);
    assert_eq!(cache.len().await.unwrap(), 1);
}

#[tokio::test]
async fn test_keys_are_isolated_and_clear_drops_all() {
    let cache = MemSeriesCache::new();
    let day = SeriesKey::new(Category::Carbon, TimeRange::OneDay);
    let month = SeriesKey::new(Category::Carbon, TimeRange::OneMonth);
    let gas = SeriesKey::new(Category::NaturalGas, TimeRange::OneDay);

    cache
        .set(day, series(Category::Carbon, TimeRange::OneDay, 70.0))
        .await
        .unwrap();
    cache
        .set(month, series(Category::Carbon, TimeRange::OneMonth, 71.0))
        .await
        .unwrap();
    assert!(cache.get(&gas).await.unwrap().is_none());

    cache.remove(&day).await.unwrap();
    assert!(cache.get(&day).await.unwrap().is_none());
    assert!(cache.get(&month).await.unwrap().is_some());

    assert_eq!(cache.clear().await.unwrap(), 1);
    assert_eq!(cache.len().await.unwrap(), 0);
    assert_eq!(cache.clear().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_clear_counts_exactly_under_concurrent_writes() {
    let cache = Arc::new(MemSeriesCache::new());
    let writer_cache = cache.clone();
    let writer = tokio::spawn(async move {
        for category in Category::all() {
            for range in TimeRange::all() {
                let key = SeriesKey::new(*category, *range);
                writer_cache
                    .set(key, series(*category, *range, 1.0))
                    .await
                    .unwrap();
                tokio::task::yield_now().await;
            }
        }
    });

    let mut evicted = 0;
    while !writer.is_finished() {
        evicted += cache.clear().await.unwrap();
        tokio::task::yield_now().await;
    }
    writer.await.unwrap();

    // 每个键只写入一次：被清理计数的与仍留在缓存中的恰好覆盖全部写入
    let total = Category::all().len() * TimeRange::all().len();
    assert_eq!(evicted + cache.len().await.unwrap(), total);
}
