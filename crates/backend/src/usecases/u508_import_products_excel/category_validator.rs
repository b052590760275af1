use std::sync::Arc;

use super::error::ImportError;
use crate::shared::catalog_cache::{CatalogCache, CatalogKind};
use crate::shared::gateway::InventoryGateway;

/// Ключ сравнения категорий: без учёта регистра и пробелов по краям
pub fn catalog_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryIssue {
    Empty,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryCheck {
    /// Категория найдена, `correct_name` - написание из базы
    Valid { correct_name: String },
    Invalid(CategoryIssue),
}

/// Проверка категории по списку из хранилища
pub struct CategoryValidator {
    gateway: Arc<dyn InventoryGateway>,
    cache: Arc<CatalogCache>,
}

impl CategoryValidator {
    pub fn new(gateway: Arc<dyn InventoryGateway>, cache: Arc<CatalogCache>) -> Self {
        Self { gateway, cache }
    }

    /// Канонический список категорий (из кэша или из хранилища)
    pub async fn fetch_valid_categories(&self) -> Result<Arc<Vec<String>>, ImportError> {
        self.cache
            .get_or_fetch(CatalogKind::CategoryNames, "", || async {
                let names = self
                    .gateway
                    .category_names()
                    .await
                    .map_err(ImportError::CatalogFetch)?;

                let names: Vec<String> = names
                    .into_iter()
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .collect();

                if names.is_empty() {
                    tracing::error!("Category catalog returned no usable names");
                    return Err(ImportError::EmptyCatalog);
                }

                tracing::info!("Loaded {} categories", names.len());
                Ok(names)
            })
            .await
    }

    pub async fn validate_single_category(&self, input: &str) -> Result<CategoryCheck, ImportError> {
        let key = catalog_key(input);
        if key.is_empty() {
            return Ok(CategoryCheck::Invalid(CategoryIssue::Empty));
        }

        let categories = self.fetch_valid_categories().await?;
        let found = categories.iter().find(|c| catalog_key(c) == key);

        Ok(match found {
            Some(correct_name) => CategoryCheck::Valid {
                correct_name: correct_name.clone(),
            },
            None => CategoryCheck::Invalid(CategoryIssue::NotFound),
        })
    }

    pub fn clear_cache(&self) {
        self.cache.invalidate(CatalogKind::CategoryNames);
    }
}
