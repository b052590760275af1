use contracts::enums::import_mode::ImportMode;
use contracts::usecases::u508_import_products_excel::{ImportProgress, ImportState};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Трекер прогресса импорта (in-memory, для real-time мониторинга)
#[derive(Clone)]
pub struct ProgressTracker {
    sessions: Arc<RwLock<HashMap<String, ImportProgress>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    // отравленный lock не должен ронять мониторинг: данные прогресса всё равно валидны
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ImportProgress>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ImportProgress>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }

    fn with_session(&self, session_id: &str, f: impl FnOnce(&mut ImportProgress)) {
        let mut sessions = self.write();
        if let Some(progress) = sessions.get_mut(session_id) {
            f(progress);
            progress.updated_at = chrono::Utc::now();
        }
    }

    /// Создать новую сессию импорта
    pub fn create_session(&self, session_id: String, mode: ImportMode, file_name: Option<String>) {
        let mut sessions = self.write();
        sessions.insert(
            session_id.clone(),
            ImportProgress::new(session_id, mode, file_name),
        );
    }

    /// Получить текущий прогресс сессии
    pub fn get_progress(&self, session_id: &str) -> Option<ImportProgress> {
        self.read().get(session_id).cloned()
    }

    /// Перевести сессию в новое состояние
    pub fn set_state(&self, session_id: &str, state: ImportState) {
        self.with_session(session_id, |p| {
            tracing::debug!("Session {}: {:?} -> {:?}", p.session_id, p.state, state);
            p.state = state;
        });
    }

    /// Начало записи: сколько строк будет записано
    pub fn set_total(&self, session_id: &str, total: usize) {
        self.with_session(session_id, |p| {
            p.total = Some(total as i32);
            p.processed = 0;
            p.current_item = None;
        });
    }

    /// Обновить счётчики записи
    pub fn update_progress(
        &self,
        session_id: &str,
        processed: usize,
        created: usize,
        updated: usize,
        current_item: Option<String>,
    ) {
        self.with_session(session_id, |p| {
            p.processed = processed as i32;
            p.created = created as i32;
            p.updated = updated as i32;
            p.current_item = current_item;
        });
    }

    /// Добавить ошибку
    pub fn add_error(&self, session_id: &str, message: String) {
        self.with_session(session_id, |p| {
            p.errors += 1;
            p.error_messages.push(message);
        });
    }

    /// Завершить сессию импорта
    pub fn complete_session(&self, session_id: &str, state: ImportState) {
        self.with_session(session_id, |p| {
            p.state = state;
            p.current_item = None;
            p.completed_at = Some(chrono::Utc::now());
        });
    }

    /// Удалить старые сессии (для очистки памяти)
    pub fn cleanup_old_sessions(&self, max_age_hours: i64) -> usize {
        let mut sessions = self.write();
        let before = sessions.len();
        let now = chrono::Utc::now();
        sessions.retain(|_, progress| match progress.completed_at {
            Some(completed_at) => (now - completed_at).num_hours() < max_age_hours,
            // Не удаляем активные сессии
            None => true,
        });
        before - sessions.len()
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
