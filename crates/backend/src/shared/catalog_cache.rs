//! Read-through кэш справочников хранилища (категории, вкусы)
//!
//! Один экземпляр на конвейер импорта, общий для проверки категорий и вкусов.
//! Записи не устаревают сами: до `invalidate` / `invalidate_all` отдаётся
//! каталог, загруженный первым.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

/// Вид данных в записи кэша
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    /// Канонические названия категорий
    CategoryNames,
    /// Ответ categories-with-flavors как есть
    FlavorCatalog,
    /// Активные вкусы одной категории; ключ - нормализованное название
    CategoryFlavors,
    /// Сводка по вкусам для всех категорий
    FlavorSummary,
}

type Entry = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct CatalogCache {
    entries: RwLock<HashMap<(CatalogKind, String), Entry>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Any + Send + Sync>(&self, kind: CatalogKind, key: &str) -> Option<Arc<T>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&(kind, key.to_string()))
            .cloned()
            .and_then(|entry| entry.downcast::<T>().ok())
    }

    pub fn insert<T: Any + Send + Sync>(&self, kind: CatalogKind, key: &str, value: T) -> Arc<T> {
        let value = Arc::new(value);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert((kind, key.to_string()), value.clone());
        value
    }

    /// Значение из кэша или результат `fetch`, который запоминается.
    /// Ошибки не кэшируются.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        kind: CatalogKind,
        key: &str,
        fetch: F,
    ) -> Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(kind, key) {
            tracing::trace!("catalog cache hit: {:?}/{}", kind, key);
            return Ok(hit);
        }

        tracing::debug!("catalog cache miss: {:?}/{}", kind, key);
        let value = fetch().await?;
        Ok(self.insert(kind, key, value))
    }

    /// Удалить все записи одного вида, возвращает их количество
    pub fn invalidate(&self, kind: CatalogKind) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|(k, _), _| *k != kind);
        before - entries.len()
    }

    pub fn invalidate_all(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_read_through_fetches_once() {
        let cache = CatalogCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let names = cache
                .get_or_fetch(CatalogKind::CategoryNames, "", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(vec!["Helados".to_string()])
                })
                .await
                .unwrap();
            assert_eq!(names.as_slice(), ["Helados".to_string()]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache = CatalogCache::new();
        let first: Result<Arc<Vec<String>>, String> = cache
            .get_or_fetch(CatalogKind::CategoryNames, "", || async {
                Err("down".to_string())
            })
            .await;
        assert!(first.is_err());
        assert!(cache.is_empty());

        let second = cache
            .get_or_fetch(CatalogKind::CategoryNames, "", || async {
                Ok::<_, String>(vec!["Paletas".to_string()])
            })
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_invalidate_by_kind() {
        let cache = CatalogCache::new();
        cache.insert(CatalogKind::CategoryNames, "", vec!["Helados".to_string()]);
        cache.insert(CatalogKind::CategoryFlavors, "helados", 3u32);
        cache.insert(CatalogKind::CategoryFlavors, "paletas", 0u32);

        assert_eq!(cache.invalidate(CatalogKind::CategoryFlavors), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get::<u32>(CatalogKind::CategoryFlavors, "helados").is_none());
        assert!(cache
            .get::<Vec<String>>(CatalogKind::CategoryNames, "")
            .is_some());

        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_wrong_type_is_a_miss() {
        let cache = CatalogCache::new();
        cache.insert(CatalogKind::FlavorSummary, "", 7u32);
        assert!(cache.get::<String>(CatalogKind::FlavorSummary, "").is_none());
    }
}
