//! Document profiles
//!
//! A profile is the complete, declarative description of one document type:
//! which header the file must carry, which columns survive and under what
//! name and type, which caller parameters are stamped on every record and
//! where the batch goes. The pipeline is generic; everything per-type lives
//! here.

use crate::error::{IngestError, IngestResult};
use serde::Serialize;

/// Target type of a normalized field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Float,
    Integer,
    Date,
}

impl FieldKind {
    /// Human-readable name used in type errors
    pub fn label(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Float => "number",
            FieldKind::Integer => "integer",
            FieldKind::Date => "date",
        }
    }
}

/// Columns that complete a date field holding only the day of the month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateParts {
    /// Month number or Russian month name
    pub month: String,
    pub year: String,
}

/// Maps one source column to a canonical field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub source: String,
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_parts: Option<DateParts>,
}

impl FieldSpec {
    /// Optional field keeping its source name
    pub fn new(source: &str, kind: FieldKind) -> Self {
        Self::renamed(source, source, kind)
    }

    /// Optional field stored under a canonical name
    pub fn renamed(source: &str, name: &str, kind: FieldKind) -> Self {
        Self {
            source: source.to_string(),
            name: name.to_string(),
            kind,
            required: false,
            date_parts: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// A bare day-of-month in this column is combined with `month` and `year`
    pub fn with_date_parts(mut self, month: &str, year: &str) -> Self {
        self.date_parts = Some(DateParts {
            month: month.to_string(),
            year: year.to_string(),
        });
        self
    }
}

/// Header contract of a document type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "contract", rename_all = "snake_case")]
pub enum ColumnLayout {
    /// Header must equal `expected` exactly, in order. Only `fields` survive
    /// normalization; other columns are dropped.
    Fixed {
        expected: Vec<String>,
        fields: Vec<FieldSpec>,
    },
    /// Any non-empty, duplicate-free header. Every column passes through
    /// and no cell may be empty. A column of numbers stays numeric (integer
    /// when every value is whole); other columns keep each cell's own type.
    Open,
}

/// Caller-supplied parameter appended to every record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextField {
    pub name: String,
    pub kind: FieldKind,
}

impl ContextField {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

/// JSON layout of a remote request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum PayloadShape {
    /// One array per field, aligned by row; nested under a key when given.
    Columnar { nest_under: Option<String> },
    /// One object per record, in an array under `key`.
    Rows { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkTarget {
    /// POST to the pricing API at `base_url + path`
    Remote { path: String, shape: PayloadShape },
    /// Bulk insert into a PostgreSQL table, then dedupe on `natural_key`
    Table {
        table: String,
        natural_key: Vec<String>,
    },
}

impl SinkTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            SinkTarget::Remote { .. } => "remote",
            SinkTarget::Table { .. } => "table",
        }
    }
}

/// Everything the pipeline needs to know about one document type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentProfile {
    pub document_type: String,
    pub aliases: Vec<String>,
    /// What the upload delivers, e.g. "prices"
    pub description: String,
    pub columns: ColumnLayout,
    pub context: Vec<ContextField>,
    /// Discard the last data row (summary rows in marketplace exports)
    pub drop_trailing_row: bool,
    /// Sink failures are logged and the upload still succeeds
    pub best_effort: bool,
    pub sink: SinkTarget,
}

impl DocumentProfile {
    pub fn expected_columns(&self) -> Option<&[String]> {
        match &self.columns {
            ColumnLayout::Fixed { expected, .. } => Some(expected),
            ColumnLayout::Open => None,
        }
    }

    pub fn matches(&self, tag: &str) -> bool {
        self.document_type == tag || self.aliases.iter().any(|a| a == tag)
    }
}

/// Immutable set of profiles, keyed by document type tag or alias
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ProfileRegistry {
    profiles: Vec<DocumentProfile>,
}

impl ProfileRegistry {
    pub fn new(profiles: Vec<DocumentProfile>) -> Self {
        Self { profiles }
    }

    pub fn get(&self, tag: &str) -> IngestResult<&DocumentProfile> {
        self.profiles
            .iter()
            .find(|p| p.matches(tag))
            .ok_or_else(|| IngestError::UnknownDocumentType(tag.to_string()))
    }

    pub fn profiles(&self) -> &[DocumentProfile] {
        &self.profiles
    }

    /// The document types served by the gateway
    pub fn builtin() -> Self {
        Self::new(vec![
            price_profile(),
            margin_profile(),
            impressions_and_sales_profile(),
            sales_boost_profile(),
            offers_mapping_profile(),
        ])
    }
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn price_profile() -> DocumentProfile {
    DocumentProfile {
        document_type: "price".to_string(),
        aliases: strings(&["prices"]),
        description: "prices".to_string(),
        columns: ColumnLayout::Fixed {
            expected: strings(&["offer_id", "price"]),
            fields: vec![
                FieldSpec::new("offer_id", FieldKind::Text).required(),
                FieldSpec::new("price", FieldKind::Float).required(),
            ],
        },
        context: vec![ContextField::new("api_id", FieldKind::Text)],
        drop_trailing_row: false,
        best_effort: false,
        sink: SinkTarget::Remote {
            path: "/prices".to_string(),
            shape: PayloadShape::Columnar { nest_under: None },
        },
    }
}

fn margin_profile() -> DocumentProfile {
    DocumentProfile {
        document_type: "margin".to_string(),
        aliases: strings(&["min_margin"]),
        description: "min margin".to_string(),
        columns: ColumnLayout::Fixed {
            expected: strings(&["offer_id", "margin"]),
            fields: vec![
                FieldSpec::new("offer_id", FieldKind::Text).required(),
                FieldSpec::renamed("margin", "min_margin", FieldKind::Float).required(),
            ],
        },
        context: vec![ContextField::new("api_id", FieldKind::Text)],
        drop_trailing_row: false,
        best_effort: false,
        sink: SinkTarget::Remote {
            path: "/margins".to_string(),
            shape: PayloadShape::Columnar { nest_under: None },
        },
    }
}

/// Yandex Market "impressions and sales" export. `День` holds either a full
/// date or the day of the month; in the latter case `Месяц` and `Год` supply
/// the rest. The account name and type are descriptive and dropped.
fn impressions_and_sales_profile() -> DocumentProfile {
    use FieldKind::*;

    DocumentProfile {
        document_type: "yandex_impressions_and_sales".to_string(),
        aliases: Vec::new(),
        description: "Yandex impressions and sales".to_string(),
        columns: ColumnLayout::Fixed {
            expected: strings(&[
                "Название бизнес аккаунта",
                "Тип бизнес аккаунта",
                "ID бизнес аккаунта",
                "Магазин",
                "ID магазина",
                "День",
                "Месяц",
                "Год",
                "ID округа",
                "Федеральный округ",
                "ID бренда",
                "Бренд",
                "ID категории",
                "Категория",
                "Ваш SKU",
                "Название товара",
                "Показы",
                "Добавлено в корзину, шт.",
                "Конверсия добавления в корзину, %",
                "Продажи, шт.",
                "Цена товара, руб.",
                "Продажи, руб.",
            ]),
            fields: vec![
                FieldSpec::renamed("ID бизнес аккаунта", "business_id", Integer),
                FieldSpec::renamed("Магазин", "shop_name", Text),
                FieldSpec::renamed("ID магазина", "shop_id", Integer),
                FieldSpec::renamed("День", "date", Date)
                    .required()
                    .with_date_parts("Месяц", "Год"),
                FieldSpec::renamed("ID округа", "region_id", Integer).required(),
                FieldSpec::renamed("Федеральный округ", "region_name", Text),
                FieldSpec::renamed("ID бренда", "brand_id", Integer),
                FieldSpec::renamed("Бренд", "brand", Text),
                FieldSpec::renamed("ID категории", "category_id", Integer),
                FieldSpec::renamed("Категория", "category", Text),
                FieldSpec::renamed("Ваш SKU", "sku", Text).required(),
                FieldSpec::renamed("Название товара", "product_name", Text),
                FieldSpec::renamed("Показы", "impressions", Integer),
                FieldSpec::renamed("Добавлено в корзину, шт.", "cart_additions", Integer),
                FieldSpec::renamed("Конверсия добавления в корзину, %", "cart_conversion", Float),
                FieldSpec::renamed("Продажи, шт.", "sales_count", Integer),
                FieldSpec::renamed("Цена товара, руб.", "price", Float),
                FieldSpec::renamed("Продажи, руб.", "revenue", Float),
            ],
        },
        context: vec![ContextField::new("client_id", Integer)],
        drop_trailing_row: false,
        best_effort: true,
        sink: SinkTarget::Table {
            table: "yandex_impressions_and_sales".to_string(),
            natural_key: strings(&["client_id", "sku", "date", "region_id"]),
        },
    }
}

/// Yandex Market "sales boost" report. The export ends with a totals row.
fn sales_boost_profile() -> DocumentProfile {
    use FieldKind::*;

    DocumentProfile {
        document_type: "yandex_sales_boost".to_string(),
        aliases: Vec::new(),
        description: "Yandex sales boost report".to_string(),
        columns: ColumnLayout::Fixed {
            expected: strings(&[
                "Название бизнес аккаунта",
                "Тип бизнес аккаунта",
                "ID бизнес аккаунта",
                "Магазин",
                "ID магазина",
                "Начало периода",
                "Конец периода",
                "Ваш SKU",
                "Наименование предложения",
                "Продано с помощью продвижения, шт",
                "Продано с помощью продвижения, рубли",
                "Расход на продвижение, рубли",
                "Расход на продвижение, %",
                "Средняя стоимость продвижения",
                "Продано всего, шт",
                "Продано всего, рубли",
                "Количество, шт",
                "Доля продаж у партнера",
                "Клики по товарам со ставками, шт.",
                "Все клики, шт.",
                "Заказано товаров со ставками, шт.",
                "Всего заказано товаров, шт.",
            ]),
            fields: vec![
                FieldSpec::renamed("ID бизнес аккаунта", "business_id", Integer),
                FieldSpec::renamed("Магазин", "shop_name", Text),
                FieldSpec::renamed("ID магазина", "shop_id", Integer),
                FieldSpec::renamed("Начало периода", "period_start", Date).required(),
                FieldSpec::renamed("Конец периода", "period_end", Date).required(),
                FieldSpec::renamed("Ваш SKU", "sku", Text).required(),
                FieldSpec::renamed("Наименование предложения", "offer_name", Text),
                FieldSpec::renamed("Продано с помощью продвижения, шт", "boosted_sales_count", Integer),
                FieldSpec::renamed("Продано с помощью продвижения, рубли", "boosted_revenue", Float),
                FieldSpec::renamed("Расход на продвижение, рубли", "boost_spend", Float),
                FieldSpec::renamed("Расход на продвижение, %", "boost_spend_share", Float),
                FieldSpec::renamed("Средняя стоимость продвижения", "avg_boost_cost", Float),
                FieldSpec::renamed("Продано всего, шт", "total_sales_count", Integer),
                FieldSpec::renamed("Продано всего, рубли", "total_revenue", Float),
                FieldSpec::renamed("Количество, шт", "quantity", Integer),
                FieldSpec::renamed("Доля продаж у партнера", "partner_sales_share", Float),
                FieldSpec::renamed("Клики по товарам со ставками, шт.", "bid_clicks", Integer),
                FieldSpec::renamed("Все клики, шт.", "total_clicks", Integer),
                FieldSpec::renamed("Заказано товаров со ставками, шт.", "bid_orders", Integer),
                FieldSpec::renamed("Всего заказано товаров, шт.", "total_orders", Integer),
            ],
        },
        context: vec![ContextField::new("client_id", Integer)],
        drop_trailing_row: true,
        best_effort: true,
        sink: SinkTarget::Table {
            table: "yandex_sales_boost".to_string(),
            natural_key: strings(&["client_id", "sku", "period_start", "period_end"]),
        },
    }
}

fn offers_mapping_profile() -> DocumentProfile {
    DocumentProfile {
        document_type: "offers_mapping_table".to_string(),
        aliases: Vec::new(),
        description: "offers mapping table".to_string(),
        columns: ColumnLayout::Open,
        context: vec![ContextField::new("client_id", FieldKind::Integer)],
        drop_trailing_row: false,
        best_effort: false,
        sink: SinkTarget::Remote {
            path: "/mappings".to_string(),
            shape: PayloadShape::Columnar {
                nest_under: Some("mappings".to_string()),
            },
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookup_by_tag_and_alias() {
        let registry = ProfileRegistry::builtin();
        assert_eq!(registry.get("price").unwrap().document_type, "price");
        assert_eq!(registry.get("prices").unwrap().document_type, "price");
        assert_eq!(registry.get("min_margin").unwrap().document_type, "margin");
        assert!(matches!(
            registry.get("invoices"),
            Err(IngestError::UnknownDocumentType(_))
        ));
    }

    #[test]
    fn test_tags_are_unique() {
        let registry = ProfileRegistry::builtin();
        let mut seen = HashSet::new();
        for profile in registry.profiles() {
            assert!(seen.insert(profile.document_type.as_str()));
            for alias in &profile.aliases {
                assert!(seen.insert(alias.as_str()));
            }
        }
    }

    #[test]
    fn test_fixed_fields_reference_expected_columns() {
        for profile in ProfileRegistry::builtin().profiles() {
            if let ColumnLayout::Fixed { expected, fields } = &profile.columns {
                for field in fields {
                    assert!(
                        expected.contains(&field.source),
                        "{}: field source '{}' not in header",
                        profile.document_type,
                        field.source
                    );
                }
            }
        }
    }

    #[test]
    fn test_date_parts_reference_expected_columns() {
        for profile in ProfileRegistry::builtin().profiles() {
            if let ColumnLayout::Fixed { expected, fields } = &profile.columns {
                for parts in fields.iter().filter_map(|f| f.date_parts.as_ref()) {
                    assert!(expected.contains(&parts.month));
                    assert!(expected.contains(&parts.year));
                }
            }
        }
    }

    #[test]
    fn test_natural_keys_are_required_fields_or_context() {
        for profile in ProfileRegistry::builtin().profiles() {
            let (SinkTarget::Table { natural_key, .. }, ColumnLayout::Fixed { fields, .. }) =
                (&profile.sink, &profile.columns)
            else {
                continue;
            };
            for column in natural_key {
                let is_context = profile.context.iter().any(|c| &c.name == column);
                let is_required = fields.iter().any(|f| &f.name == column && f.required);
                assert!(is_context || is_required, "{}: {}", profile.document_type, column);
            }
        }
    }

    #[test]
    fn test_analytics_profiles_are_best_effort() {
        let registry = ProfileRegistry::builtin();
        for tag in ["yandex_impressions_and_sales", "yandex_sales_boost"] {
            let profile = registry.get(tag).unwrap();
            assert!(profile.best_effort);
            assert_eq!(profile.sink.kind(), "table");
        }
        assert!(!registry.get("price").unwrap().best_effort);
        assert!(registry.get("yandex_sales_boost").unwrap().drop_trailing_row);
    }

    #[test]
    fn test_header_sizes() {
        let registry = ProfileRegistry::builtin();
        assert_eq!(
            registry.get("yandex_impressions_and_sales").unwrap().expected_columns().unwrap().len(),
            22
        );
        assert_eq!(
            registry.get("yandex_sales_boost").unwrap().expected_columns().unwrap().len(),
            22
        );
        assert!(registry.get("offers_mapping_table").unwrap().expected_columns().is_none());
    }
}
