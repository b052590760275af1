use std::sync::Arc;

use contracts::domain::a026_category::{CategoryWithFlavors, Flavor, FlavorSummary};
use contracts::usecases::u508_import_products_excel::{CategoryFlavorIssue, IssueReason};

use super::category_validator::{catalog_key, CategoryCheck, CategoryIssue, CategoryValidator};
use super::error::ImportError;
use crate::shared::catalog_cache::{CatalogCache, CatalogKind};
use crate::shared::gateway::InventoryGateway;

/// Активные вкусы одной категории
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryFlavors {
    /// Название категории в каталоге вкусов
    pub category_name: String,
    pub flavors: Vec<Flavor>,
}

impl CategoryFlavors {
    pub fn max_flavors(&self) -> u32 {
        self.flavors.len() as u32
    }
}

/// Отказ по Flavor_Count. К каждому отказу прикладывается полный список
/// категорий со вкусами, чтобы UI мог подсказать допустимые значения.
#[derive(Debug, Clone, PartialEq)]
pub struct FlavorRejection {
    pub reason: IssueReason,
    pub message: String,
    pub max_allowed: Option<u32>,
    pub categories_with_flavors: Arc<Vec<FlavorSummary>>,
}

impl FlavorRejection {
    pub fn to_issue(&self) -> CategoryFlavorIssue {
        CategoryFlavorIssue {
            reason: self.reason,
            message: self.message.clone(),
            max_allowed: self.max_allowed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlavorCheck {
    Valid { corrected_value: u32, max_allowed: u32 },
    Invalid(FlavorRejection),
}

/// Итог комбинированной проверки категория + количество вкусов
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryFlavorCheck {
    Valid {
        category: String,
        flavor_count: u32,
        max_allowed: u32,
    },
    Invalid {
        issue: CategoryFlavorIssue,
        /// Заполнено, если категория распознана и отказ пришёл от проверки количества
        canonical_category: Option<String>,
    },
}

/// Результат разбора Flavor_Count
enum ParsedCount {
    Value(u32),
    Rejected(IssueReason, String),
}

/// Пустое значение никогда не превращается в 0: пусто и ноль - разные вещи
fn parse_flavor_count(raw: &str) -> ParsedCount {
    let normalized = raw.trim().replace(',', ".");
    let value = match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => v,
        _ => {
            return ParsedCount::Rejected(
                IssueReason::InvalidNumber,
                format!("Flavor_Count '{}' is not a whole number", raw.trim()),
            )
        }
    };

    if value < 0.0 {
        return ParsedCount::Rejected(
            IssueReason::NegativeNotAllowed,
            format!("Flavor_Count cannot be negative ({})", value),
        );
    }

    if value > u32::MAX as f64 {
        return ParsedCount::Rejected(
            IssueReason::InvalidNumber,
            format!("Flavor_Count '{}' is too large", raw.trim()),
        );
    }

    ParsedCount::Value(value as u32)
}

/// Проверка количества вкусов против каталога категорий со вкусами.
/// Содержит CategoryValidator и делит с ним кэш.
pub struct FlavorValidator {
    gateway: Arc<dyn InventoryGateway>,
    cache: Arc<CatalogCache>,
    categories: CategoryValidator,
}

impl FlavorValidator {
    pub fn new(gateway: Arc<dyn InventoryGateway>, cache: Arc<CatalogCache>) -> Self {
        let categories = CategoryValidator::new(gateway.clone(), cache.clone());
        Self {
            gateway,
            cache,
            categories,
        }
    }

    pub fn category_validator(&self) -> &CategoryValidator {
        &self.categories
    }

    async fn flavor_catalog(&self) -> Result<Arc<Vec<CategoryWithFlavors>>, ImportError> {
        self.cache
            .get_or_fetch(CatalogKind::FlavorCatalog, "", || async {
                let catalog = self
                    .gateway
                    .categories_with_flavors()
                    .await
                    .map_err(ImportError::CatalogFetch)?;
                tracing::info!("Loaded flavor catalog: {} categories", catalog.len());
                Ok(catalog)
            })
            .await
    }

    /// Активные вкусы категории (status == 1). Кэшируется по нормализованному
    /// имени, в том числе когда вкусов ноль.
    pub async fn fetch_flavors_for_category(
        &self,
        name: &str,
    ) -> Result<Arc<CategoryFlavors>, ImportError> {
        let key = catalog_key(name);
        self.cache
            .get_or_fetch(CatalogKind::CategoryFlavors, &key, || async {
                let catalog = self.flavor_catalog().await?;
                let entry = catalog
                    .iter()
                    .find(|c| catalog_key(&c.category_name) == key);

                match entry {
                    Some(entry) => Ok(CategoryFlavors {
                        category_name: entry.category_name.trim().to_string(),
                        flavors: entry
                            .flavors
                            .iter()
                            .filter(|f| f.is_active())
                            .cloned()
                            .collect(),
                    }),
                    None => Err(ImportError::CategoryNotFound {
                        name: name.trim().to_string(),
                        available: catalog
                            .iter()
                            .map(|c| c.category_name.trim().to_string())
                            .collect(),
                    }),
                }
            })
            .await
    }

    /// Таблица FlavorSummary по всему каталогу (считается один раз на экземпляр)
    pub async fn get_flavors_summary(&self) -> Result<Arc<Vec<FlavorSummary>>, ImportError> {
        self.cache
            .get_or_fetch(CatalogKind::FlavorSummary, "", || async {
                let catalog = self.flavor_catalog().await?;
                Ok::<_, ImportError>(
                    catalog
                        .iter()
                        .filter(|c| !c.category_name.trim().is_empty())
                        .map(FlavorSummary::from_catalog)
                        .collect(),
                )
            })
            .await
    }

    async fn reject(
        &self,
        reason: IssueReason,
        message: String,
        max_allowed: Option<u32>,
    ) -> Result<FlavorCheck, ImportError> {
        Ok(FlavorCheck::Invalid(FlavorRejection {
            reason,
            message,
            max_allowed,
            categories_with_flavors: self.get_flavors_summary().await?,
        }))
    }

    /// Проверки идут строго по порядку: категория, пустое значение, число,
    /// знак, наличие категории в каталоге вкусов, верхняя граница.
    pub async fn validate_flavor_count(
        &self,
        category: &str,
        value: Option<&str>,
    ) -> Result<FlavorCheck, ImportError> {
        if category.trim().is_empty() {
            return self
                .reject(IssueReason::EmptyCategory, "Category is empty".into(), None)
                .await;
        }

        let Some(raw) = value.filter(|v| !v.trim().is_empty()) else {
            return self
                .reject(
                    IssueReason::EmptyFlavorCount,
                    "Flavor_Count is empty".into(),
                    None,
                )
                .await;
        };

        let count = match parse_flavor_count(raw) {
            ParsedCount::Value(v) => v,
            ParsedCount::Rejected(reason, message) => {
                return self.reject(reason, message, None).await;
            }
        };

        let flavors = match self.fetch_flavors_for_category(category).await {
            Ok(flavors) => flavors,
            Err(ImportError::CategoryNotFound { name, .. }) => {
                return self
                    .reject(
                        IssueReason::CategoryNotFoundInFlavors,
                        format!("Category '{}' has no entry in the flavor catalog", name),
                        None,
                    )
                    .await;
            }
            Err(e) => return Err(e),
        };

        let max_allowed = flavors.max_flavors();
        if count > max_allowed {
            return self
                .reject(
                    IssueReason::ExceededLimit,
                    format!(
                        "Flavor_Count {} exceeds the {} active flavors of '{}'",
                        count, max_allowed, flavors.category_name
                    ),
                    Some(max_allowed),
                )
                .await;
        }

        Ok(FlavorCheck::Valid {
            corrected_value: count,
            max_allowed,
        })
    }

    /// Сначала категория; количество вкусов проверяется только для распознанной
    /// категории и уже по её каноническому имени.
    pub async fn validate_category_and_flavors(
        &self,
        category: Option<&str>,
        flavor_count: Option<&str>,
    ) -> Result<CategoryFlavorCheck, ImportError> {
        let input = category.unwrap_or_default();
        let correct_name = match self.categories.validate_single_category(input).await? {
            CategoryCheck::Valid { correct_name } => correct_name,
            CategoryCheck::Invalid(CategoryIssue::Empty) => {
                return Ok(CategoryFlavorCheck::Invalid {
                    issue: CategoryFlavorIssue {
                        reason: IssueReason::EmptyCategory,
                        message: "Category is empty".into(),
                        max_allowed: None,
                    },
                    canonical_category: None,
                });
            }
            CategoryCheck::Invalid(CategoryIssue::NotFound) => {
                return Ok(CategoryFlavorCheck::Invalid {
                    issue: CategoryFlavorIssue {
                        reason: IssueReason::CategoryNotFound,
                        message: format!("Category '{}' does not exist", input.trim()),
                        max_allowed: None,
                    },
                    canonical_category: None,
                });
            }
        };

        match self.validate_flavor_count(&correct_name, flavor_count).await? {
            FlavorCheck::Valid {
                corrected_value,
                max_allowed,
            } => Ok(CategoryFlavorCheck::Valid {
                category: correct_name,
                flavor_count: corrected_value,
                max_allowed,
            }),
            FlavorCheck::Invalid(rejection) => Ok(CategoryFlavorCheck::Invalid {
                issue: rejection.to_issue(),
                canonical_category: Some(correct_name),
            }),
        }
    }

    /// Сбросить всё, что относится к вкусам (список категорий не трогаем)
    pub fn clear_cache(&self) {
        self.cache.invalidate(CatalogKind::FlavorCatalog);
        self.cache.invalidate(CatalogKind::CategoryFlavors);
        self.cache.invalidate(CatalogKind::FlavorSummary);
    }
}
