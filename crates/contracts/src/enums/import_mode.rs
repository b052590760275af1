use serde::{Deserialize, Serialize};

/// Стратегия записи загруженных товаров в хранилище
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Полная замена: существующий набор товаров отбрасывается целиком
    #[default]
    Replace,
    /// Построчно: создать новый товар или обновить существующий по коду
    Upsert,
}

impl ImportMode {
    /// Получить код режима
    pub fn code(&self) -> &'static str {
        match self {
            ImportMode::Replace => "replace",
            ImportMode::Upsert => "upsert",
        }
    }

    /// Получить человекочитаемое название
    pub fn display_name(&self) -> &'static str {
        match self {
            ImportMode::Replace => "Замена всех товаров",
            ImportMode::Upsert => "Создание / обновление по коду",
        }
    }

    /// Получить все режимы
    pub fn all() -> Vec<ImportMode> {
        vec![ImportMode::Replace, ImportMode::Upsert]
    }

    /// Парсинг из строки (без учёта регистра и пробелов по краям)
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "replace" => Some(ImportMode::Replace),
            "upsert" => Some(ImportMode::Upsert),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
