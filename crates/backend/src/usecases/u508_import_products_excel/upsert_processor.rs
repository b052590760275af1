use std::sync::Arc;
use std::time::Duration;

use contracts::domain::a025_product::NormalizedProduct;
use contracts::usecases::u508_import_products_excel::{UpsertAction, UpsertDetail, UpsertSummary};

use crate::shared::gateway::InventoryGateway;

/// Построчная запись: создать или обновить товар по коду.
/// Используется только в режиме upsert.
pub struct UpsertProcessor {
    gateway: Arc<dyn InventoryGateway>,
    throttle_every: usize,
    throttle_pause: Duration,
}

impl UpsertProcessor {
    pub fn new(
        gateway: Arc<dyn InventoryGateway>,
        throttle_every: usize,
        throttle_pause: Duration,
    ) -> Self {
        Self {
            gateway,
            throttle_every,
            throttle_pause,
        }
    }

    /// Один товар. Ошибки не пробрасываются, а попадают в результат.
    pub async fn process_product(&self, product: &NormalizedProduct) -> UpsertDetail {
        let code = product.code.clone();

        let existing = match self.gateway.find_product_by_code(&code).await {
            Ok(existing) => existing,
            Err(e) => {
                // не знаем, есть ли товар: писать нельзя ни create, ни update
                tracing::warn!("Lookup failed for {}: {}", code, e);
                return UpsertDetail {
                    code,
                    action: UpsertAction::Error,
                    success: false,
                    message: format!("Lookup failed: {}", e),
                    product_id: None,
                };
            }
        };

        match existing {
            Some(record) => {
                let result = self
                    .gateway
                    .update_product(&record.id, &product.to_update())
                    .await;
                match result {
                    Ok(()) => UpsertDetail {
                        code,
                        action: UpsertAction::Update,
                        success: true,
                        message: "Updated".into(),
                        product_id: Some(record.id),
                    },
                    Err(e) => {
                        tracing::warn!("Update failed for {}: {}", code, e);
                        UpsertDetail {
                            code,
                            action: UpsertAction::Update,
                            success: false,
                            message: format!("Update failed: {}", e),
                            product_id: Some(record.id),
                        }
                    }
                }
            }
            None => match self.gateway.create_product(product).await {
                Ok(id) => UpsertDetail {
                    code,
                    action: UpsertAction::Create,
                    success: true,
                    message: "Created".into(),
                    product_id: Some(id),
                },
                Err(e) => {
                    tracing::warn!("Create failed for {}: {}", code, e);
                    UpsertDetail {
                        code,
                        action: UpsertAction::Create,
                        success: false,
                        message: format!("Create failed: {}", e),
                        product_id: None,
                    }
                }
            },
        }
    }

    /// Все товары строго по очереди. Ошибка по одной строке не останавливает пакет.
    /// `on_progress(processed, total, &detail)` вызывается после каждой строки.
    pub async fn process_products<F>(
        &self,
        products: &[NormalizedProduct],
        mut on_progress: F,
    ) -> UpsertSummary
    where
        F: FnMut(usize, usize, &UpsertDetail),
    {
        let total = products.len();
        let mut summary = UpsertSummary {
            total,
            ..Default::default()
        };

        for (idx, product) in products.iter().enumerate() {
            let detail = self.process_product(product).await;

            if !detail.success {
                summary.errors += 1;
            } else if detail.action == UpsertAction::Create {
                summary.created += 1;
            } else if detail.action == UpsertAction::Update {
                summary.updated += 1;
            }

            on_progress(idx + 1, total, &detail);
            summary.details.push(detail);

            let processed = idx + 1;
            if self.throttle_every > 0
                && !self.throttle_pause.is_zero()
                && processed % self.throttle_every == 0
                && processed < total
            {
                tokio::time::sleep(self.throttle_pause).await;
            }
        }

        summary.summary = format!(
            "Обработано: {}, создано: {}, обновлено: {}, ошибок: {}",
            summary.total, summary.created, summary.updated, summary.errors
        );
        tracing::info!("Upsert finished. {}", summary.summary);

        summary
    }
}
