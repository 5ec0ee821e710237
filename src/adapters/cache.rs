use crate::config::toml_config::CacheMode;
use crate::core::report::to_csv;
use crate::core::{SeriesSource, Storage};
use crate::domain::model::{Period, Sample};
use crate::utils::error::{CostError, Result};

/// 以 CSV 快取已下載的半小時資料，一個資料集一個檔案
pub struct DiskCache<S: Storage> {
    storage: S,
    mode: CacheMode,
}

impl<S: Storage> DiskCache<S> {
    pub fn new(storage: S, mode: CacheMode) -> Self {
        Self { storage, mode }
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    pub fn file_name(source_name: &str, period: &Period) -> String {
        format!("{}_{}_{}.csv", source_name, period.start, period.end)
    }

    pub async fn load_or_fetch(&self, source: &dyn SeriesSource, period: &Period) -> Result<Vec<Sample>> {
        let file_name = Self::file_name(source.name(), period);

        match self.mode {
            CacheMode::Offline => {
                if !self.storage.exists(&file_name).await {
                    return Err(CostError::CacheMissError { path: file_name });
                }
                self.read(&file_name).await
            }
            CacheMode::Prefer if self.storage.exists(&file_name).await => {
                let samples = self.read(&file_name).await?;
                if !samples.is_empty() {
                    tracing::info!("📦 Using cached {} ({})", source.name(), file_name);
                    return Ok(samples);
                }
                tracing::warn!("⚠️ Cached {} is empty, fetching again", file_name);
                self.fetch_and_store(source, period, &file_name).await
            }
            CacheMode::Prefer | CacheMode::Refresh => {
                self.fetch_and_store(source, period, &file_name).await
            }
        }
    }

    async fn fetch_and_store(
        &self,
        source: &dyn SeriesSource,
        period: &Period,
        file_name: &str,
    ) -> Result<Vec<Sample>> {
        tracing::info!("🌐 Fetching {} for {} .. {}", source.name(), period.start, period.end);
        let samples = source.fetch(period).await?;

        // 空結果不寫入快取，避免之後每次執行都讀到空檔
        if samples.is_empty() {
            return Err(CostError::ParseError {
                source_name: source.name().to_string(),
                message: format!("no samples returned for {} .. {}", period.start, period.end),
            });
        }

        self.write(file_name, &samples).await?;
        tracing::info!("✅ {}: {} samples cached", source.name(), samples.len());
        Ok(samples)
    }

    async fn read(&self, file_name: &str) -> Result<Vec<Sample>> {
        let data = self.storage.read_file(file_name).await?;
        decode_samples(&data)
    }

    async fn write(&self, file_name: &str, samples: &[Sample]) -> Result<()> {
        let data = encode_samples(samples)?;
        self.storage.write_file(file_name, &data).await
    }
}

pub fn encode_samples(samples: &[Sample]) -> Result<Vec<u8>> {
    to_csv(samples)
}

pub fn decode_samples(data: &[u8]) -> Result<Vec<Sample>> {
    let mut reader = csv::Reader::from_reader(data);
    reader
        .deserialize()
        .map(|row| row.map_err(CostError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use crate::domain::model::Period;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingSource {
        calls: AtomicUsize,
    }

    struct EmptySource;

    #[async_trait]
    impl SeriesSource for EmptySource {
        fn name(&self) -> &str {
            "wind_test"
        }

        async fn fetch(&self, _period: &Period) -> Result<Vec<Sample>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl SeriesSource for CountingSource {
        fn name(&self) -> &str {
            "wind_test"
        }

        async fn fetch(&self, _period: &Period) -> Result<Vec<Sample>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                Sample::new(Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(), 100.0),
                Sample::new(Utc.with_ymd_and_hms(2022, 1, 1, 0, 30, 0).unwrap(), 150.5),
            ])
        }
    }

    fn period() -> Period {
        Period::new(
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2022, 1, 2).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_prefer_mode_fetches_once() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(LocalStorage::new(temp_dir.path()), CacheMode::Prefer);
        let source = CountingSource { calls: AtomicUsize::new(0) };

        let first = cache.load_or_fetch(&source, &period()).await.unwrap();
        let second = cache.load_or_fetch(&source, &period()).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert!(temp_dir
            .path()
            .join("wind_test_2022-01-01_2022-01-02.csv")
            .exists());
    }

    #[tokio::test]
    async fn test_refresh_mode_always_fetches() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(LocalStorage::new(temp_dir.path()), CacheMode::Refresh);
        let source = CountingSource { calls: AtomicUsize::new(0) };

        cache.load_or_fetch(&source, &period()).await.unwrap();
        cache.load_or_fetch(&source, &period()).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_offline_mode_without_cache_fails() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(LocalStorage::new(temp_dir.path()), CacheMode::Offline);
        let source = CountingSource { calls: AtomicUsize::new(0) };

        let result = cache.load_or_fetch(&source, &period()).await;

        assert!(matches!(result, Err(CostError::CacheMissError { .. })));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_csv_encoding_keeps_timestamps() {
        let samples = vec![Sample::new(
            Utc.with_ymd_and_hms(2022, 7, 1, 12, 30, 0).unwrap(),
            8123.25,
        )];
        let encoded = encode_samples(&samples).unwrap();
        let text = String::from_utf8(encoded.clone()).unwrap();

        assert!(text.starts_with("timestamp,value\n"));
        assert_eq!(decode_samples(&encoded).unwrap(), samples);
    }

    #[tokio::test]
    async fn test_empty_fetch_is_not_cached() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(LocalStorage::new(temp_dir.path()), CacheMode::Prefer);

        let result = cache.load_or_fetch(&EmptySource, &period()).await;

        assert!(matches!(result, Err(CostError::ParseError { .. })));
        assert!(!temp_dir
            .path()
            .join("wind_test_2022-01-01_2022-01-02.csv")
            .exists());

        // 上游恢復後即可正常取得資料
        let source = CountingSource { calls: AtomicUsize::new(0) };
        let samples = cache.load_or_fetch(&source, &period()).await.unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prefer_mode_refetches_empty_cache_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("wind_test_2022-01-01_2022-01-02.csv"),
            "",
        )
        .unwrap();
        let cache = DiskCache::new(LocalStorage::new(temp_dir.path()), CacheMode::Prefer);
        let source = CountingSource { calls: AtomicUsize::new(0) };

        let samples = cache.load_or_fetch(&source, &period()).await.unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        let cached = decode_samples(
            &std::fs::read(temp_dir.path().join("wind_test_2022-01-01_2022-01-02.csv")).unwrap(),
        )
        .unwrap();
        assert_eq!(cached, samples);
    }
}
