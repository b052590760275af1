use contracts::domain::a025_product::NormalizedProduct;
use contracts::usecases::u508_import_products_excel::{ExcelRow, ProductField};

/// Свободный текст: trim + нижний регистр
pub fn normalize_text(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Идентификаторы (код, штрихкод, категория, URL) только обрезаются:
/// регистр у них значимый, а категория уже приведена к каноническому написанию
fn normalize_identifier(value: &str) -> String {
    value.trim().to_string()
}

/// Разбирается ли значение как число с запятой или точкой
pub fn is_number(raw: &str) -> bool {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .is_ok_and(f64::is_finite)
}

/// Число с запятой или точкой ("5309,00" / "3563.00"); мусор → 0
fn parse_decimal(raw: Option<&str>, field: ProductField, row_number: usize) -> f64 {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return 0.0;
    };
    match raw.replace(',', ".").parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            tracing::warn!(
                "Row {}: {} '{}' is not a number, using 0",
                row_number,
                field,
                raw
            );
            0.0
        }
    }
}

/// Целое ("10", "10.0"); дробная часть отбрасывается
fn parse_integer(raw: Option<&str>, field: ProductField, row_number: usize) -> i64 {
    parse_decimal(raw, field, row_number).trunc() as i64
}

/// Строка (уже прошедшая проверку) → товар для записи
pub fn normalize_product(row: &ExcelRow) -> NormalizedProduct {
    let text = |field: ProductField| row.get(field).map(normalize_text).unwrap_or_default();
    let ident = |field: ProductField| {
        row.get(field)
            .map(normalize_identifier)
            .unwrap_or_default()
    };

    let flavor_count = parse_integer(
        row.get(ProductField::FlavorCount),
        ProductField::FlavorCount,
        row.row_number,
    )
    .max(0) as u32;

    NormalizedProduct {
        code: ident(ProductField::Code),
        name: text(ProductField::Name),
        category: ident(ProductField::Category),
        cost: parse_decimal(row.get(ProductField::Cost), ProductField::Cost, row.row_number),
        price: parse_decimal(row.get(ProductField::Price), ProductField::Price, row.row_number),
        stock: parse_integer(row.get(ProductField::Stock), ProductField::Stock, row.row_number),
        barcode: ident(ProductField::Barcode),
        unit: text(ProductField::Unit),
        flavor_count,
        description: text(ProductField::Description),
        image_url: row.trimmed(ProductField::ImageUrl).map(normalize_identifier),
    }
}

pub fn normalize_products(rows: &[ExcelRow]) -> Vec<NormalizedProduct> {
    rows.iter().map(normalize_product).collect()
}

/// Повторная нормализация уже готового товара (идемпотентна)
pub fn normalize_product_fields(product: &NormalizedProduct) -> NormalizedProduct {
    NormalizedProduct {
        code: normalize_identifier(&product.code),
        name: normalize_text(&product.name),
        category: normalize_identifier(&product.category),
        cost: product.cost,
        price: product.price,
        stock: product.stock,
        barcode: normalize_identifier(&product.barcode),
        unit: normalize_text(&product.unit),
        flavor_count: product.flavor_count,
        description: normalize_text(&product.description),
        image_url: product
            .image_url
            .as_deref()
            .map(normalize_identifier)
            .filter(|v| !v.is_empty()),
    }
}
