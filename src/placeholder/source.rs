use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Deserializer};

use crate::foundation::error::{ReelError, ReelResult};

pub const PRODUCT_NOT_FOUND_PL: &str = "Nie znaleziono produktu";
pub const PRODUCT_NOT_FOUND_EN: &str = "Product not found";
pub const MISSING_NAME_PL: &str = "Brak opisu polskiego";
pub const MISSING_NAME_EN: &str = "Brak opisu angielskiego";
pub const DESCRIPTION_NOT_FOUND: &str = "nie znaleziono opisu w bazie";

/// Product names in both catalog languages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalizedNames {
    pub pl: String,
    pub en: String,
}

/// Tabular product data keyed by item identifier.
///
/// Not-found conditions are reported as human-readable sentinel strings; `Err` is reserved for
/// lookups that cannot be answered at all (a failed cross-sheet join, an unreadable source).
pub trait ItemDataSource {
    fn names(&self, item: &str) -> ReelResult<LocalizedNames>;
    fn description(&self, item: &str) -> ReelResult<String>;
    fn materials(&self, item: &str) -> ReelResult<String>;
}

/// Data source used when no catalog is configured; every lookup fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDataSource;

impl ItemDataSource for NoDataSource {
    fn names(&self, _item: &str) -> ReelResult<LocalizedNames> {
        Err(ReelError::data("no item data source configured"))
    }

    fn description(&self, _item: &str) -> ReelResult<String> {
        Err(ReelError::data("no item data source configured"))
    }

    fn materials(&self, _item: &str) -> ReelResult<String> {
        Err(ReelError::data("no item data source configured"))
    }
}

#[derive(Clone, Debug)]
struct ItemRecord {
    names: LocalizedNames,
    description: String,
    materials: String,
}

/// In-memory data source for tests and embedding.
#[derive(Clone, Debug, Default)]
pub struct InMemorySource {
    records: HashMap<String, ItemRecord>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        item: impl Into<String>,
        names: LocalizedNames,
        description: impl Into<String>,
        materials: impl Into<String>,
    ) {
        self.records.insert(
            item.into(),
            ItemRecord {
                names,
                description: description.into(),
                materials: materials.into(),
            },
        );
    }
}

impl ItemDataSource for InMemorySource {
    fn names(&self, item: &str) -> ReelResult<LocalizedNames> {
        Ok(self
            .records
            .get(item)
            .map(|r| r.names.clone())
            .unwrap_or_else(|| LocalizedNames {
                pl: PRODUCT_NOT_FOUND_PL.to_owned(),
                en: PRODUCT_NOT_FOUND_EN.to_owned(),
            }))
    }

    fn description(&self, item: &str) -> ReelResult<String> {
        self.records
            .get(item)
            .map(|r| r.description.clone())
            .ok_or_else(|| ReelError::data(format!("item '{item}' not found")))
    }

    fn materials(&self, item: &str) -> ReelResult<String> {
        self.records
            .get(item)
            .map(|r| r.materials.clone())
            .ok_or_else(|| ReelError::data(format!("item '{item}' not found")))
    }
}

/// Row of the `Indeksy` sheet.
#[derive(Clone, Debug, Deserialize)]
pub struct IndexRow {
    #[serde(alias = "Item No_", deserialize_with = "cell_string")]
    pub item_no: String,
    #[serde(alias = "Assortment Card No_", deserialize_with = "cell_string")]
    pub assortment_card_no: String,
    #[serde(alias = "DescriptionPL", default, deserialize_with = "cell_string")]
    pub description_pl: String,
    #[serde(alias = "DescriptionENU", default, deserialize_with = "cell_string")]
    pub description_en: String,
}

/// Row of the `Opisy` sheet.
#[derive(Clone, Debug, Deserialize)]
pub struct DescriptionRow {
    #[serde(alias = "Assortment Card No_", deserialize_with = "cell_string")]
    pub assortment_card_no: String,
    #[serde(alias = "Opis Indeksu", default, deserialize_with = "cell_string")]
    pub description: String,
}

/// Row of the `Materialy` sheet.
#[derive(Clone, Debug, Deserialize)]
pub struct MaterialRow {
    #[serde(alias = "Assortment Card No_", deserialize_with = "cell_string")]
    pub assortment_card_no: String,
    #[serde(alias = "Material", default, deserialize_with = "cell_string")]
    pub material: String,
}

/// Product catalog exported from the spreadsheet as JSON records, one array per sheet.
///
/// ```json
/// { "indeksy":   [{ "item_no": "10004", "assortment_card_no": "K-1", "description_pl": "..." }],
///   "opisy":     [{ "assortment_card_no": "K-1", "description": "..." }],
///   "materialy": [{ "assortment_card_no": "K-1", "material": "..." }] }
/// ```
///
/// Raw spreadsheet column names (`"Item No_"`, `"Opis Indeksu"`, ...) and sheet names
/// (`"Indeksy"`, ...) are accepted too. Cells may be strings or numbers.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CatalogSource {
    #[serde(alias = "Indeksy", default)]
    indeksy: Vec<IndexRow>,
    #[serde(alias = "Opisy", default)]
    opisy: Vec<DescriptionRow>,
    #[serde(alias = "Materialy", default)]
    materialy: Vec<MaterialRow>,
}

impl CatalogSource {
    pub fn new(indeksy: Vec<IndexRow>, opisy: Vec<DescriptionRow>, materialy: Vec<MaterialRow>) -> Self {
        Self {
            indeksy,
            opisy,
            materialy,
        }
    }

    pub fn load(path: &Path) -> ReelResult<Self> {
        let f = File::open(path).map_err(|e| {
            ReelError::data(format!("failed to open catalog '{}': {e}", path.display()))
        })?;
        let catalog: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            ReelError::serde(format!("failed to parse catalog '{}': {e}", path.display()))
        })?;
        tracing::debug!(
            path = %path.display(),
            items = catalog.indeksy.len(),
            descriptions = catalog.opisy.len(),
            materials = catalog.materialy.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    fn rows_for<'a, 'i>(&'a self, item: &'i str) -> impl Iterator<Item = &'a IndexRow> {
        let item = item.trim();
        self.indeksy.iter().filter(move |r| r.item_no == item)
    }

    /// The cross-sheet join key for `item`; fails when the item is not in `Indeksy`.
    fn assortment_card(&self, item: &str) -> ReelResult<&str> {
        self.rows_for(item)
            .next()
            .map(|r| r.assortment_card_no.as_str())
            .ok_or_else(|| {
                ReelError::data(format!(
                    "item '{item}' has no assortment card in the index sheet"
                ))
            })
    }
}

fn join_non_empty<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl ItemDataSource for CatalogSource {
    fn names(&self, item: &str) -> ReelResult<LocalizedNames> {
        let rows: Vec<&IndexRow> = self.rows_for(item).collect();
        if rows.is_empty() {
            return Ok(LocalizedNames {
                pl: PRODUCT_NOT_FOUND_PL.to_owned(),
                en: PRODUCT_NOT_FOUND_EN.to_owned(),
            });
        }

        let pl = join_non_empty(rows.iter().map(|r| r.description_pl.as_str()));
        let en = join_non_empty(rows.iter().map(|r| r.description_en.as_str()));
        Ok(LocalizedNames {
            pl: if pl.is_empty() {
                MISSING_NAME_PL.to_owned()
            } else {
                pl
            },
            en: if en.is_empty() {
                MISSING_NAME_EN.to_owned()
            } else {
                en
            },
        })
    }

    fn description(&self, item: &str) -> ReelResult<String> {
        let card = self.assortment_card(item)?;
        let text = join_non_empty(
            self.opisy
                .iter()
                .filter(|r| r.assortment_card_no == card)
                .map(|r| r.description.as_str()),
        );
        Ok(if text.is_empty() {
            DESCRIPTION_NOT_FOUND.to_owned()
        } else {
            text
        })
    }

    fn materials(&self, item: &str) -> ReelResult<String> {
        let card = self.assortment_card(item)?;
        let text = join_non_empty(
            self.materialy
                .iter()
                .filter(|r| r.assortment_card_no == card)
                .map(|r| r.material.as_str()),
        );
        Ok(if text.is_empty() {
            DESCRIPTION_NOT_FOUND.to_owned()
        } else {
            text
        })
    }
}

/// Spreadsheet cells arrive as strings, integers, floats or null.
fn cell_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cell {
        Str(String),
        Int(i64),
        Float(f64),
        Null(()),
    }

    Ok(match Cell::deserialize(deserializer)? {
        Cell::Str(s) => s.trim().to_owned(),
        Cell::Int(i) => i.to_string(),
        Cell::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Cell::Float(f) => f.to_string(),
        Cell::Null(()) => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> CatalogSource {
        serde_json::from_value(json!({
            "Indeksy": [
                {"Item No_": 10004, "Assortment Card No_": "K-1",
                 "DescriptionPL": "Krzesło", "DescriptionENU": "Chair"},
                {"Item No_": "20001", "Assortment Card No_": "K-2",
                 "DescriptionPL": "", "DescriptionENU": null}
            ],
            "Opisy": [
                {"Assortment Card No_": "K-1", "Opis Indeksu": "Dębowe,"},
                {"Assortment Card No_": "K-1", "Opis Indeksu": "lakierowane"}
            ],
            "Materialy": [
                {"Assortment Card No_": "K-1", "Material": "dąb"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn names_join_rows_and_fall_back_to_sentinels() {
        let c = catalog();
        let n = c.names("10004").unwrap();
        assert_eq!((n.pl.as_str(), n.en.as_str()), ("Krzesło", "Chair"));

        let n = c.names("20001").unwrap();
        assert_eq!(n.pl, MISSING_NAME_PL);
        assert_eq!(n.en, MISSING_NAME_EN);

        let n = c.names("99999").unwrap();
        assert_eq!(n.pl, PRODUCT_NOT_FOUND_PL);
        assert_eq!(n.en, PRODUCT_NOT_FOUND_EN);
    }

    #[test]
    fn description_and_materials_join_through_assortment_card() {
        let c = catalog();
        assert_eq!(c.description("10004").unwrap(), "Dębowe, lakierowane");
        assert_eq!(c.materials("10004").unwrap(), "dąb");
        assert_eq!(c.description("20001").unwrap(), DESCRIPTION_NOT_FOUND);
        assert_eq!(c.materials("20001").unwrap(), DESCRIPTION_NOT_FOUND);
    }

    #[test]
    fn unknown_item_fails_the_cross_sheet_join() {
        let c = catalog();
        let err = c.description("99999").unwrap_err();
        assert!(err.to_string().contains("no assortment card"));
        assert!(c.materials("99999").is_err());
    }

    #[test]
    fn no_data_source_always_errors() {
        assert!(NoDataSource.names("1").is_err());
        assert!(NoDataSource.description("1").is_err());
        assert!(NoDataSource.materials("1").is_err());
    }
}
