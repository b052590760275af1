use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use contracts::domain::a026_category::FlavorSummary;
use contracts::enums::import_mode::ImportMode;
use contracts::usecases::u508_import_products_excel::{
    CorrectionRowView, CorrectionSessionView, ExcelRow, ImportProgress, ImportResponse,
    ImportState, NavigateDirection, ProductField, UpsertAction,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::correction_session::CorrectionSession;
use super::error::{CorrectionError, ImportError};
use super::excel_reader::{read_csv, read_excel_json, SpreadsheetUpload};
use super::field_normalizer::normalize_products;
use super::general_validator::GeneralValidator;
use super::progress_tracker::ProgressTracker;
use super::upsert_processor::UpsertProcessor;
use crate::shared::config::ImportConfig;
use crate::shared::gateway::InventoryGateway;

type SharedSession = Arc<Mutex<CorrectionSession>>;

/// Executor для UseCase импорта товаров из Excel.
///
/// Файл → проверка структуры → классификация строк → запись сразу
/// или передача неполных строк в сессию ручной корректировки.
pub struct ImportExecutor {
    gateway: Arc<dyn InventoryGateway>,
    validator: GeneralValidator,
    upsert: UpsertProcessor,
    import_mode: RwLock<ImportMode>,
    pub progress_tracker: Arc<ProgressTracker>,
    sessions: RwLock<HashMap<String, SharedSession>>,
}

impl ImportExecutor {
    pub fn new(
        gateway: Arc<dyn InventoryGateway>,
        config: &ImportConfig,
        progress_tracker: Arc<ProgressTracker>,
    ) -> Self {
        Self {
            validator: GeneralValidator::new(gateway.clone(), config.require_image_url),
            upsert: UpsertProcessor::new(
                gateway.clone(),
                config.throttle_every,
                Duration::from_millis(config.throttle_pause_ms),
            ),
            gateway,
            import_mode: RwLock::new(ImportMode::default()),
            progress_tracker,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    // ------------------------------------------------------------------
    // Режим импорта
    // ------------------------------------------------------------------

    pub fn import_mode(&self) -> ImportMode {
        *self.import_mode.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Недопустимое значение отклоняется, текущий режим не меняется
    pub fn set_import_mode(&self, code: &str) -> Result<ImportMode, ImportError> {
        let mode = ImportMode::from_code(code)
            .ok_or_else(|| ImportError::InvalidImportMode(code.to_string()))?;
        *self.import_mode.write().unwrap_or_else(|e| e.into_inner()) = mode;
        tracing::info!("Import mode set to {}", mode);
        Ok(mode)
    }

    // ------------------------------------------------------------------
    // Импорт
    // ------------------------------------------------------------------

    /// Импорт из ExcelData (JSON)
    pub async fn import_excel_json(&self, body: &[u8]) -> ImportResponse {
        let (session_id, mode) = self.start_session(None);
        match read_excel_json(body) {
            Ok(upload) => self.run_import(&session_id, mode, upload).await,
            Err(e) => self.fail(&session_id, mode, e),
        }
    }

    /// Импорт из CSV
    pub async fn import_csv(&self, body: &[u8], file_name: Option<String>) -> ImportResponse {
        let (session_id, mode) = self.start_session(file_name.clone());
        match read_csv(body, file_name) {
            Ok(upload) => self.run_import(&session_id, mode, upload).await,
            Err(e) => self.fail(&session_id, mode, e),
        }
    }

    /// Режим читается один раз на старте и дальше передаётся явно
    fn start_session(&self, file_name: Option<String>) -> (String, ImportMode) {
        let mode = self.import_mode();
        let session_id = Uuid::new_v4().to_string();
        self.progress_tracker
            .create_session(session_id.clone(), mode, file_name);
        self.progress_tracker
            .set_state(&session_id, ImportState::Reading);
        (session_id, mode)
    }

    fn fail(&self, session_id: &str, mode: ImportMode, error: ImportError) -> ImportResponse {
        tracing::error!("Import {} failed: {}", session_id, error);
        self.progress_tracker
            .add_error(session_id, error.to_string());
        self.progress_tracker
            .complete_session(session_id, ImportState::Failed);
        ImportResponse::failed(session_id.to_string(), mode, error.kind(), error.to_string())
    }

    async fn run_import(
        &self,
        session_id: &str,
        mode: ImportMode,
        upload: SpreadsheetUpload,
    ) -> ImportResponse {
        tracing::info!(
            "Starting import {} ({:?}): {} rows, mode={}",
            session_id,
            upload.file_name,
            upload.rows.len(),
            mode
        );

        self.progress_tracker
            .set_state(session_id, ImportState::StructureChecking);
        if let Err(e) = self.validator.check_structure(&upload) {
            return self.fail(session_id, mode, e);
        }

        self.progress_tracker
            .set_state(session_id, ImportState::BusinessValidating);
        let result = match self.validator.validate_excel_data(&upload).await {
            Ok(result) => result,
            Err(e) => return self.fail(session_id, mode, e),
        };

        if result.incomplete_rows.is_empty() {
            self.progress_tracker
                .set_state(session_id, ImportState::CommittingClean);
            let rows: Vec<ExcelRow> = result.complete_rows.into_iter().map(|r| r.row).collect();
            return match self.commit_rows(session_id, mode, &rows).await {
                Ok(response) => {
                    self.progress_tracker
                        .complete_session(session_id, ImportState::Done);
                    response
                }
                Err(e) => self.fail(session_id, mode, e),
            };
        }

        // дальше только по явной команде commit после корректировки
        let session = CorrectionSession::new(
            session_id.to_string(),
            mode,
            result.clone(),
            self.validator.required_fields().to_vec(),
        );
        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(session_id.to_string(), Arc::new(Mutex::new(session)));
        self.progress_tracker
            .set_state(session_id, ImportState::AwaitingManualCorrection);
        tracing::info!(
            "Import {} needs manual correction: {} of {} rows",
            session_id,
            result.summary.incomplete_rows,
            result.summary.total_rows
        );

        ImportResponse::needs_manual_edit(session_id.to_string(), mode, result)
    }

    /// Нормализация и запись: replace - одной массовой заменой, upsert - построчно
    async fn commit_rows(
        &self,
        session_id: &str,
        mode: ImportMode,
        rows: &[ExcelRow],
    ) -> Result<ImportResponse, ImportError> {
        let products = normalize_products(rows);
        self.progress_tracker.set_total(session_id, products.len());

        match mode {
            ImportMode::Replace => {
                let imported = self
                    .gateway
                    .bulk_import(&products, true)
                    .await
                    .map_err(ImportError::Commit)?;
                self.progress_tracker
                    .update_progress(session_id, products.len(), imported, 0, None);
                tracing::info!("Import {}: replaced with {} products", session_id, imported);
                Ok(ImportResponse::replaced(session_id.to_string(), mode, imported))
            }
            ImportMode::Upsert => {
                let tracker = self.progress_tracker.clone();
                let (mut created, mut updated) = (0, 0);
                let summary = self
                    .upsert
                    .process_products(&products, |processed, _total, detail| {
                        if !detail.success {
                            tracker.add_error(
                                session_id,
                                format!("{}: {}", detail.code, detail.message),
                            );
                        } else if detail.action == UpsertAction::Create {
                            created += 1;
                        } else {
                            updated += 1;
                        }
                        tracker.update_progress(
                            session_id,
                            processed,
                            created,
                            updated,
                            Some(detail.code.clone()),
                        );
                    })
                    .await;
                Ok(ImportResponse::upserted(session_id.to_string(), mode, summary))
            }
        }
    }

    /// Текущий прогресс импорта
    pub fn get_progress(&self, session_id: &str) -> Option<ImportProgress> {
        self.progress_tracker.get_progress(session_id)
    }

    // ------------------------------------------------------------------
    // Сессии корректировки
    // ------------------------------------------------------------------

    fn session(&self, session_id: &str) -> Result<SharedSession, ImportError> {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .cloned()
            .ok_or_else(|| ImportError::SessionNotFound(session_id.to_string()))
    }

    fn remove_session(&self, session_id: &str) -> Option<SharedSession> {
        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(session_id)
    }

    pub async fn session_view(
        &self,
        session_id: &str,
    ) -> Result<CorrectionSessionView, CorrectionError> {
        let session = self.session(session_id)?;
        let session = session.lock().await;
        session.view()
    }

    pub async fn row_view(
        &self,
        session_id: &str,
        index: usize,
    ) -> Result<CorrectionRowView, CorrectionError> {
        let session = self.session(session_id)?;
        let session = session.lock().await;
        session.row_view(index)
    }

    /// Правка поля; возвращает обновлённую строку
    pub async fn edit_row(
        &self,
        session_id: &str,
        index: usize,
        field: ProductField,
        value: String,
    ) -> Result<CorrectionRowView, CorrectionError> {
        let session = self.session(session_id)?;
        let mut session = session.lock().await;
        session.set_field(index, field, value)?;
        session.row_view(index)
    }

    pub async fn delete_row(
        &self,
        session_id: &str,
        index: usize,
    ) -> Result<CorrectionSessionView, CorrectionError> {
        let session = self.session(session_id)?;
        let mut session = session.lock().await;
        session.delete_row(index)?;
        session.view()
    }

    /// Соседняя доступная строка или `None` на краю списка
    pub async fn navigate(
        &self,
        session_id: &str,
        from: usize,
        direction: NavigateDirection,
    ) -> Result<Option<CorrectionRowView>, CorrectionError> {
        let session = self.session(session_id)?;
        let session = session.lock().await;
        session
            .navigate(from, direction)
            .map(|index| session.row_view(index))
            .transpose()
    }

    /// Проверка и запись итогового набора в режиме, зафиксированном в сессии.
    /// При блокировке сессия остаётся открытой для дальнейших правок.
    pub async fn commit_correction(
        &self,
        session_id: &str,
    ) -> Result<ImportResponse, CorrectionError> {
        let shared = self.session(session_id)?;
        let session = shared.lock().await;
        // параллельный commit мог закрыть сессию, пока мы ждали lock
        self.session(session_id)?;
        let mode = session.import_mode();

        let rows = match session.finalize(&self.validator).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("Commit of {} blocked: {}", session_id, e);
                return Err(e);
            }
        };

        // сессия закрывается до записи: отмена после этой точки получит SessionNotFound
        self.remove_session(session_id);
        drop(session);

        self.progress_tracker
            .set_state(session_id, ImportState::CommittingCorrected);
        let outcome = self.commit_rows(session_id, mode, &rows).await;

        Ok(match outcome {
            Ok(response) => {
                self.progress_tracker
                    .complete_session(session_id, ImportState::Done);
                response
            }
            Err(e) => self.fail(session_id, mode, e),
        })
    }

    /// Отмена: правки и удаления отбрасываются, в хранилище ничего не записано
    pub async fn cancel_correction(&self, session_id: &str) -> Result<(), ImportError> {
        let shared = self.session(session_id)?;
        let _session = shared.lock().await;
        // commit мог забрать сессию, пока мы ждали lock
        self.remove_session(session_id)
            .ok_or_else(|| ImportError::SessionNotFound(session_id.to_string()))?;
        self.progress_tracker
            .complete_session(session_id, ImportState::Cancelled);
        tracing::info!("Correction session {} cancelled", session_id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Каталог
    // ------------------------------------------------------------------

    pub async fn flavors_summary(&self) -> Result<Vec<FlavorSummary>, ImportError> {
        let summary = self.validator.flavor_validator().get_flavors_summary().await?;
        Ok(summary.as_ref().clone())
    }

    /// Кэш каталога не обновляется сам; сбрасывается только явно
    pub fn refresh_catalog(&self) {
        self.validator.clear_caches();
    }

    /// Очистка завершённых сессий прогресса
    pub fn cleanup(&self, max_age_hours: i64) {
        let removed = self.progress_tracker.cleanup_old_sessions(max_age_hours);
        if removed > 0 {
            tracing::info!("Removed {} finished import sessions", removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::u508_import_products_excel::test_support::{
        excel_json, full_row, FakeGateway,
    };
    use contracts::usecases::u508_import_products_excel::ImportErrorKind;

    fn config() -> ImportConfig {
        ImportConfig {
            require_image_url: false,
            throttle_every: 5,
            throttle_pause_ms: 0,
            progress_retention_hours: 24,
        }
    }

    fn executor(gateway: Arc<FakeGateway>) -> ImportExecutor {
        ImportExecutor::new(gateway, &config(), Arc::new(ProgressTracker::new()))
    }

    fn clean_rows() -> Vec<ExcelRow> {
        vec![
            full_row(2, "A1", "helados", "2"),
            full_row(3, "A2", "Helados", "2"),
            full_row(4, "A3", " HELADOS", "2"),
        ]
    }

    #[tokio::test]
    async fn test_scenario_a_e_replace_commits_once() {
        let gateway = Arc::new(FakeGateway::ice_cream());
        let exec = executor(gateway.clone());

        let response = exec.import_excel_json(&excel_json(&clean_rows())).await;
        assert!(response.success, "{}", response.message);
        assert_eq!(response.import_mode, ImportMode::Replace);
        assert_eq!(response.imported, Some(3));

        let bulk = gateway.bulk_imports();
        assert_eq!(bulk.len(), 1);
        assert!(bulk[0].1);
        assert!(bulk[0].0.iter().all(|p| p.category == "Helados"));
        assert_eq!(gateway.call_count("find_product_by_code"), 0);
        assert_eq!(gateway.call_count("create_product"), 0);
        assert_eq!(gateway.call_count("update_product"), 0);

        let progress = exec.get_progress(&response.session_id).unwrap();
        assert_eq!(progress.state, ImportState::Done);
    }

    #[tokio::test]
    async fn test_upsert_mode_uses_per_row_calls() {
        let gateway = Arc::new(FakeGateway::ice_cream().with_existing("A1"));
        let exec = executor(gateway.clone());
        exec.set_import_mode("upsert").unwrap();

        let response = exec.import_excel_json(&excel_json(&clean_rows())).await;
        assert_eq!(response.import_mode, ImportMode::Upsert);
        assert_eq!((response.created, response.updated), (Some(2), Some(1)));
        assert_eq!(response.details[0].action, UpsertAction::Update);
        assert_eq!(gateway.call_count("bulk_import"), 0);

        let progress = exec.get_progress(&response.session_id).unwrap();
        assert_eq!((progress.processed, progress.created, progress.updated), (3, 2, 1));
    }

    #[tokio::test]
    async fn test_upsert_row_failure_does_not_fail_batch() {
        let gateway = Arc::new(FakeGateway::ice_cream().failing_lookup("A2"));
        let exec = executor(gateway.clone());
        exec.set_import_mode("UPSERT").unwrap();

        let response = exec.import_excel_json(&excel_json(&clean_rows())).await;
        assert!(response.success);
        assert_eq!(response.errors, Some(1));
        let progress = exec.get_progress(&response.session_id).unwrap();
        assert_eq!(progress.state, ImportState::Done);
        assert_eq!(progress.errors, 1);
    }

    #[tokio::test]
    async fn test_replace_failure_is_fatal() {
        let gateway = Arc::new(FakeGateway::ice_cream().failing_bulk());
        let exec = executor(gateway);
        let response = exec.import_excel_json(&excel_json(&clean_rows())).await;
        assert!(!response.success);
        assert_eq!(response.error_kind, Some(ImportErrorKind::Commit));
        let progress = exec.get_progress(&response.session_id).unwrap();
        assert_eq!(progress.state, ImportState::Failed);
    }

    #[tokio::test]
    async fn test_parse_and_structure_errors_differ() {
        let exec = executor(Arc::new(FakeGateway::ice_cream()));

        let parse = exec.import_excel_json(b"{not json").await;
        assert_eq!(parse.error_kind, Some(ImportErrorKind::Parse));

        let structure = exec
            .import_csv(b"Code,Name\nA1,Paleta\n", Some("p.csv".into()))
            .await;
        assert_eq!(structure.error_kind, Some(ImportErrorKind::Structure));
        assert!(structure.message.contains("Category"));

        let empty = exec.import_excel_json(&excel_json(&[])).await;
        assert_eq!(empty.error_kind, Some(ImportErrorKind::Structure));
    }

    #[tokio::test]
    async fn test_catalog_outage_fails_batch() {
        let exec = executor(Arc::new(FakeGateway::ice_cream().unreachable()));
        let response = exec.import_excel_json(&excel_json(&clean_rows())).await;
        assert_eq!(response.error_kind, Some(ImportErrorKind::CatalogFetch));
    }

    #[test]
    fn test_invalid_mode_is_rejected_without_change() {
        let exec = executor(Arc::new(FakeGateway::ice_cream()));
        exec.set_import_mode("upsert").unwrap();
        assert!(matches!(
            exec.set_import_mode("merge"),
            Err(ImportError::InvalidImportMode(_))
        ));
        assert_eq!(exec.import_mode(), ImportMode::Upsert);
    }

    #[tokio::test]
    async fn test_correction_end_to_end_keeps_captured_mode() {
        let gateway = Arc::new(FakeGateway::ice_cream());
        let exec = executor(gateway.clone());

        let mut rows = clean_rows();
        rows.push(full_row(5, "A4", "Pizzas", "1"));
        rows.push(full_row(6, "A5", "Paletas", "7"));

        let response = exec.import_excel_json(&excel_json(&rows)).await;
        assert!(!response.success);
        assert!(response.needs_manual_edit);
        let data = response.data.as_ref().unwrap();
        assert_eq!(data.summary.incomplete_rows, 2);
        let sid = response.session_id.clone();
        assert_eq!(
            exec.get_progress(&sid).unwrap().state,
            ImportState::AwaitingManualCorrection
        );

        // смена режима не влияет на уже открытую сессию
        exec.set_import_mode("upsert").unwrap();

        exec.edit_row(&sid, 0, ProductField::Category, "paletas".into())
            .await
            .unwrap();
        exec.edit_row(&sid, 0, ProductField::FlavorCount, "1".into())
            .await
            .unwrap();

        match exec.commit_correction(&sid).await {
            Err(CorrectionError::CommitBlocked { index, row_number, .. }) => {
                assert_eq!((index, row_number), (1, 6));
            }
            other => panic!("unexpected {:?}", other),
        }

        let next = exec
            .navigate(&sid, 0, NavigateDirection::Next)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.index, 1);
        exec.edit_row(&sid, 1, ProductField::FlavorCount, "2".into())
            .await
            .unwrap();

        let committed = exec.commit_correction(&sid).await.unwrap();
        assert!(committed.success);
        assert_eq!(committed.import_mode, ImportMode::Replace);
        assert_eq!(committed.imported, Some(5));

        let bulk = gateway.bulk_imports();
        let codes: Vec<&str> = bulk[0].0.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["A1", "A2", "A3", "A4", "A5"]);
        assert_eq!(bulk[0].0[3].category, "Paletas");

        // сессия закрыта
        assert!(matches!(
            exec.session_view(&sid).await,
            Err(CorrectionError::Import(ImportError::SessionNotFound(_)))
        ));
        assert_eq!(exec.get_progress(&sid).unwrap().state, ImportState::Done);
    }

    #[tokio::test]
    async fn test_cancel_discards_session() {
        let gateway = Arc::new(FakeGateway::ice_cream());
        let exec = executor(gateway.clone());
        let response = exec
            .import_excel_json(&excel_json(&[full_row(2, "A1", "Pizzas", "1")]))
            .await;
        let sid = response.session_id;

        exec.delete_row(&sid, 0).await.unwrap();
        exec.cancel_correction(&sid).await.unwrap();

        assert_eq!(gateway.call_count("bulk_import"), 0);
        assert_eq!(exec.get_progress(&sid).unwrap().state, ImportState::Cancelled);
        assert!(matches!(
            exec.cancel_correction(&sid).await,
            Err(ImportError::SessionNotFound(_))
        ));
        assert!(matches!(
            exec.commit_correction(&sid).await,
            Err(CorrectionError::Import(ImportError::SessionNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_cancel_during_commit_write_is_rejected() {
        let gateway = Arc::new(FakeGateway::ice_cream().with_bulk_gate());
        let gate = gateway.bulk_gate().unwrap();
        let exec = Arc::new(executor(gateway.clone()));

        let response = exec
            .import_excel_json(&excel_json(&[full_row(2, "A1", "Pizzas", "1")]))
            .await;
        let sid = response.session_id;
        exec.edit_row(&sid, 0, ProductField::Category, "Paletas".into())
            .await
            .unwrap();
        exec.edit_row(&sid, 0, ProductField::FlavorCount, "1".into())
            .await
            .unwrap();

        let commit = tokio::spawn({
            let exec = exec.clone();
            let sid = sid.clone();
            async move { exec.commit_correction(&sid).await }
        });

        // запись уже идёт: отменять нечего
        gate.entered.notified().await;
        assert!(matches!(
            exec.cancel_correction(&sid).await,
            Err(ImportError::SessionNotFound(_))
        ));
        assert_eq!(
            exec.get_progress(&sid).unwrap().state,
            ImportState::CommittingCorrected
        );

        gate.release.notify_one();
        let committed = commit.await.unwrap().unwrap();
        assert!(committed.success);
        assert_eq!(gateway.bulk_imports().len(), 1);
        assert_eq!(exec.get_progress(&sid).unwrap().state, ImportState::Done);
    }

    #[tokio::test]
    async fn test_refresh_catalog_refetches() {
        let gateway = Arc::new(FakeGateway::ice_cream());
        let exec = executor(gateway.clone());
        exec.flavors_summary().await.unwrap();
        exec.flavors_summary().await.unwrap();
        assert_eq!(gateway.call_count("categories_with_flavors"), 1);

        exec.refresh_catalog();
        let summary = exec.flavors_summary().await.unwrap();
        assert_eq!(gateway.call_count("categories_with_flavors"), 2);
        assert!(summary.iter().any(|s| s.name == "Paletas" && s.max_flavors == 2));
    }
}
