use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::import_mode::ImportMode;

/// Состояние импорта (Idle → Reading → StructureChecking → BusinessValidating → ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportState {
    Idle,
    Reading,
    StructureChecking,
    BusinessValidating,
    /// Все строки полные, идёт запись
    CommittingClean,
    /// Есть неполные строки, ждём ручной корректировки (без таймаута)
    AwaitingManualCorrection,
    /// Запись после ручной корректировки
    CommittingCorrected,
    Done,
    /// Корректировка отменена пользователем, ничего не записано
    Cancelled,
    Failed,
}

impl ImportState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ImportState::Done | ImportState::Failed | ImportState::Cancelled
        )
    }
}

/// Текущий прогресс импорта товаров из Excel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportProgress {
    pub session_id: String,
    pub state: ImportState,
    pub import_mode: ImportMode,
    pub file_name: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,

    /// Прогресс записи
    pub processed: i32,
    pub total: Option<i32>,
    pub created: i32,
    pub updated: i32,
    pub errors: i32,

    /// Текущий обрабатываемый код товара
    pub current_item: Option<String>,

    /// Список ошибок
    pub error_messages: Vec<String>,
}

impl ImportProgress {
    pub fn new(session_id: String, import_mode: ImportMode, file_name: Option<String>) -> Self {
        Self {
            session_id,
            state: ImportState::Idle,
            import_mode,
            file_name,
            started_at: Utc::now(),
            completed_at: None,
            updated_at: Utc::now(),
            processed: 0,
            total: None,
            created: 0,
            updated: 0,
            errors: 0,
            current_item: None,
            error_messages: Vec::new(),
        }
    }
}
