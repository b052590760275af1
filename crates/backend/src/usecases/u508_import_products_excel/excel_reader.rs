//! Граница загрузки: файл → типизированные строки.
//! Дальше по конвейеру строки по строковым ключам уже не разбираются.

use contracts::usecases::u508_import_products_excel::{
    ExcelData, ExcelRow, ProductField, FIRST_DATA_ROW_NUMBER,
};

use super::error::ImportError;

/// Прочитанный файл
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetUpload {
    pub file_name: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<ExcelRow>,
}

/// Значение ячейки из JSON: числа и bool превращаются в строку, null - пустая ячейка
fn cell_to_string(header: &str, value: &serde_json::Value) -> Result<Option<String>, ImportError> {
    use serde_json::Value;
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => Err(ImportError::Parse(format!(
            "cell '{}' contains a nested value",
            header
        ))),
    }
}

/// ExcelData с фронтенда → строки
pub fn read_excel_data(data: ExcelData) -> Result<SpreadsheetUpload, ImportError> {
    // Заголовки: явный список из файла, иначе колонки из метаданных, иначе ключи первой строки
    let headers = if !data.file_headers.is_empty() {
        data.file_headers.clone()
    } else if !data.metadata.columns.is_empty() {
        data.metadata.columns.clone()
    } else {
        let mut keys: Vec<String> = data
            .rows
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    };

    let mut rows = Vec::with_capacity(data.rows.len());
    for (idx, cells) in data.rows.iter().enumerate() {
        let mut row = ExcelRow::new(idx + FIRST_DATA_ROW_NUMBER);
        for (header, value) in cells {
            let Some(field) = ProductField::from_header(header) else {
                continue;
            };
            row.set(field, cell_to_string(header, value)?);
        }
        rows.push(row);
    }

    if data.metadata.row_count != rows.len() {
        tracing::warn!(
            "{}: metadata says {} rows, got {}",
            data.metadata.file_name,
            data.metadata.row_count,
            rows.len()
        );
    }

    Ok(SpreadsheetUpload {
        file_name: Some(data.metadata.file_name),
        headers,
        rows,
    })
}

/// Тело запроса с ExcelData в JSON
pub fn read_excel_json(body: &[u8]) -> Result<SpreadsheetUpload, ImportError> {
    let data: ExcelData = serde_json::from_slice(body)
        .map_err(|e| ImportError::Parse(format!("invalid Excel payload: {}", e)))?;
    read_excel_data(data)
}

/// CSV с заголовком в первой строке
pub fn read_csv(body: &[u8], file_name: Option<String>) -> Result<SpreadsheetUpload, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ImportError::Parse(format!("cannot read CSV header: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    let columns: Vec<Option<ProductField>> = headers
        .iter()
        .map(|h| ProductField::from_header(h))
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            ImportError::Parse(format!(
                "CSV row {}: {}",
                idx + FIRST_DATA_ROW_NUMBER,
                e
            ))
        })?;

        let mut row = ExcelRow::new(idx + FIRST_DATA_ROW_NUMBER);
        for (column, value) in columns.iter().zip(record.iter()) {
            if let Some(field) = column {
                if !value.is_empty() {
                    row.set(*field, Some(value.to_string()));
                }
            }
        }
        rows.push(row);
    }

    Ok(SpreadsheetUpload {
        file_name,
        headers,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_excel_json() {
        let body = br#"{
            "metadata": {"columns": [], "row_count": 2, "file_name": "productos.xlsx"},
            "file_headers": ["Code", "Category", "Flavor_Count", "Extra"],
            "rows": [
                {"Code": "A1", "Category": "helados", "Flavor_Count": 2, "Extra": "x"},
                {"Code": "A2", "Category": null, "Flavor_Count": 0}
            ]
        }"#;
        let upload = read_excel_json(body).unwrap();
        assert_eq!(upload.file_name.as_deref(), Some("productos.xlsx"));
        assert_eq!(upload.headers.len(), 4);
        assert_eq!(upload.rows.len(), 2);

        let first = &upload.rows[0];
        assert_eq!(first.row_number, 2);
        assert_eq!(first.get(ProductField::FlavorCount), Some("2"));
        assert_eq!(first.get(ProductField::Category), Some("helados"));

        let second = &upload.rows[1];
        assert_eq!(second.row_number, 3);
        assert_eq!(second.get(ProductField::Category), None);
        assert_eq!(second.get(ProductField::FlavorCount), Some("0"));
    }

    #[test]
    fn test_headers_fall_back_to_first_row() {
        let body = br#"{
            "metadata": {"row_count": 1, "file_name": "f.xlsx"},
            "rows": [{"Name": "x", "Code": "A1"}]
        }"#;
        let upload = read_excel_json(body).unwrap();
        assert_eq!(upload.headers, vec!["Code".to_string(), "Name".to_string()]);
    }

    #[test]
    fn test_corrupt_json_is_parse_error() {
        assert!(matches!(
            read_excel_json(b"{not json"),
            Err(ImportError::Parse(_))
        ));
        let nested = br#"{
            "metadata": {"row_count": 1, "file_name": "f.xlsx"},
            "rows": [{"Code": {"a": 1}}]
        }"#;
        assert!(matches!(read_excel_json(nested), Err(ImportError::Parse(_))));
    }

    #[test]
    fn test_read_csv() {
        let body = "Code,Category,Name,Flavor_Count\nA1,Helados,Paleta,2\nA2,,Vaso,\n";
        let upload = read_csv(body.as_bytes(), Some("productos.csv".into())).unwrap();
        assert_eq!(upload.headers, vec!["Code", "Category", "Name", "Flavor_Count"]);
        assert_eq!(upload.rows.len(), 2);
        assert_eq!(upload.rows[0].row_number, 2);
        assert_eq!(upload.rows[0].get(ProductField::Name), Some("Paleta"));
        assert_eq!(upload.rows[1].row_number, 3);
        assert_eq!(upload.rows[1].get(ProductField::Category), None);
        assert_eq!(upload.rows[1].get(ProductField::FlavorCount), None);
    }

    #[test]
    fn test_ragged_csv_is_parse_error() {
        let body = "Code,Category\nA1,Helados,extra\n";
        assert!(matches!(
            read_csv(body.as_bytes(), None),
            Err(ImportError::Parse(_))
        ));
    }
}
