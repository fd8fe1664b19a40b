use crate::error::ScrapeError;
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// One listing exactly as the source served it.
///
/// Keys read by the mapper:
///
/// | key | policy |
/// |---|---|
/// | `hdpData.homeInfo` | required, merged under the top-level keys |
/// | `address`, `city`, `state`, `zipcode`, `streetAddress` | required string |
/// | `bedrooms`, `bathrooms`, `price` | required number |
/// | `detailUrl`, `imgSrc` | required string |
/// | `zestimate`, `taxAssessedValue`, `datePriceChanged` | optional, default 0 |
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawListing(Map<String, Value>);

impl RawListing {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl TryFrom<Value> for RawListing {
    type Error = ScrapeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            _ => Err(ScrapeError::SchemaMismatch {
                path: "cat1.searchResults.listResults[]".to_string(),
            }),
        }
    }
}

/// All listings of one fetched search page plus the pagination count.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    pub listings: Vec<RawListing>,
    pub total_pages: u64,
}

const LISTINGS_PATH: [&str; 3] = ["cat1", "searchResults", "listResults"];
const TOTAL_PAGES_PATH: [&str; 3] = ["cat1", "searchList", "totalPages"];

fn lookup<'a>(document: &'a Value, path: &[&str]) -> Result<&'a Value, ScrapeError> {
    let mut current = document;
    for (depth, key) in path.iter().enumerate() {
        current = current
            .get(key)
            .ok_or_else(|| ScrapeError::SchemaMismatch {
                path: path[..=depth].join("."),
            })?;
    }
    Ok(current)
}

impl ListingPage {
    /// Read the listing array and page count from their fixed paths. Any missing
    /// segment fails the whole page.
    pub fn from_document(document: &Value) -> Result<Self, ScrapeError> {
        let listings = lookup(document, &LISTINGS_PATH)?
            .as_array()
            .ok_or_else(|| ScrapeError::SchemaMismatch {
                path: LISTINGS_PATH.join("."),
            })?
            .iter()
            .cloned()
            .map(RawListing::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let total_pages = lookup(document, &TOTAL_PAGES_PATH)?
            .as_u64()
            .ok_or_else(|| ScrapeError::SchemaMismatch {
                path: TOTAL_PAGES_PATH.join("."),
            })?;

        Ok(Self {
            listings,
            total_pages,
        })
    }
}

/// Every attribute a [`ListingRecord`] exposes for export, in declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingField {
    Address,
    Bathrooms,
    Bedrooms,
    City,
    Data,
    DatePriceChanged,
    DatePriceChangedTimestamp,
    ImgUrl,
    Price,
    State,
    StreetAddress,
    TaxAssessedValue,
    Url,
    Zestimate,
    Zipcode,
}

impl ListingField {
    pub const ALL: [ListingField; 15] = [
        ListingField::Address,
        ListingField::Bathrooms,
        ListingField::Bedrooms,
        ListingField::City,
        ListingField::Data,
        ListingField::DatePriceChanged,
        ListingField::DatePriceChangedTimestamp,
        ListingField::ImgUrl,
        ListingField::Price,
        ListingField::State,
        ListingField::StreetAddress,
        ListingField::TaxAssessedValue,
        ListingField::Url,
        ListingField::Zestimate,
        ListingField::Zipcode,
    ];

    /// Raw, internal or bulky attributes left out of "all fields" exports.
    pub const EXCLUDED: [ListingField; 3] = [
        ListingField::Data,
        ListingField::DatePriceChangedTimestamp,
        ListingField::ImgUrl,
    ];

    /// Fixed column set of the compact summary export.
    pub const SUMMARY: [ListingField; 11] = [
        ListingField::Zestimate,
        ListingField::Address,
        ListingField::City,
        ListingField::State,
        ListingField::Zipcode,
        ListingField::StreetAddress,
        ListingField::DatePriceChanged,
        ListingField::Bedrooms,
        ListingField::Bathrooms,
        ListingField::TaxAssessedValue,
        ListingField::Price,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ListingField::Address => "address",
            ListingField::Bathrooms => "bathrooms",
            ListingField::Bedrooms => "bedrooms",
            ListingField::City => "city",
            ListingField::Data => "data",
            ListingField::DatePriceChanged => "date_price_changed",
            ListingField::DatePriceChangedTimestamp => "date_price_changed_timestamp",
            ListingField::ImgUrl => "img_url",
            ListingField::Price => "price",
            ListingField::State => "state",
            ListingField::StreetAddress => "street_address",
            ListingField::TaxAssessedValue => "tax_assessed_value",
            ListingField::Url => "url",
            ListingField::Zestimate => "zestimate",
            ListingField::Zipcode => "zipcode",
        }
    }

    pub fn is_excluded(&self) -> bool {
        Self::EXCLUDED.contains(self)
    }

    /// Declared fields minus the exclusion set, in declared order.
    pub fn meaningful() -> Vec<ListingField> {
        Self::ALL
            .iter()
            .copied()
            .filter(|field| !field.is_excluded())
            .collect()
    }

    /// Parse a comma-separated list of field names. Fails on the first unknown name.
    pub fn parse_list(names: &str) -> Result<Vec<ListingField>, ScrapeError> {
        names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ListingField::from_str)
            .collect()
    }
}

impl fmt::Display for ListingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ListingField {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.name() == s)
            .ok_or_else(|| ScrapeError::UnknownField(s.to_string()))
    }
}

/// One normalized listing. Built once by [`ListingRecord::from_raw`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    pub(crate) data: Map<String, Value>,
    pub(crate) address: String,
    pub(crate) street_address: String,
    pub(crate) city: String,
    pub(crate) state: String,
    pub(crate) zipcode: String,
    pub(crate) price: f64,
    pub(crate) zestimate: f64,
    pub(crate) tax_assessed_value: f64,
    pub(crate) bedrooms: f64,
    pub(crate) bathrooms: f64,
    pub(crate) date_price_changed_timestamp: i64,
    pub(crate) date_price_changed: Option<NaiveDateTime>,
    pub(crate) url: String,
    pub(crate) img_url: String,
}

impl ListingRecord {
    /// Merged raw object the record was derived from.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn street_address(&self) -> &str {
        &self.street_address
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn zipcode(&self) -> &str {
        &self.zipcode
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn zestimate(&self) -> f64 {
        self.zestimate
    }

    pub fn tax_assessed_value(&self) -> f64 {
        self.tax_assessed_value
    }

    pub fn bedrooms(&self) -> f64 {
        self.bedrooms
    }

    pub fn bathrooms(&self) -> f64 {
        self.bathrooms
    }

    pub fn date_price_changed_timestamp(&self) -> i64 {
        self.date_price_changed_timestamp
    }

    pub fn date_price_changed(&self) -> Option<NaiveDateTime> {
        self.date_price_changed
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn img_url(&self) -> &str {
        &self.img_url
    }

    /// (year, month, day, hour) of the last price change, if there was one.
    pub fn date_price_changed_parts(&self) -> Option<(i32, u32, u32, u32)> {
        self.date_price_changed
            .map(|date| (date.year(), date.month(), date.day(), date.hour()))
    }

    /// Names of the fields worth exporting for a human reader.
    pub fn meaningful_fields(&self) -> Vec<ListingField> {
        ListingField::meaningful()
    }

    /// String form of one field as it appears in a CSV cell.
    pub fn value(&self, field: ListingField) -> String {
        match field {
            ListingField::Address => self.address.clone(),
            ListingField::Bathrooms => self.bathrooms.to_string(),
            ListingField::Bedrooms => self.bedrooms.to_string(),
            ListingField::City => self.city.clone(),
            ListingField::Data => Value::Object(self.data.clone()).to_string(),
            ListingField::DatePriceChanged => self
                .date_price_changed
                .map(|date| date.to_string())
                .unwrap_or_default(),
            ListingField::DatePriceChangedTimestamp => {
                self.date_price_changed_timestamp.to_string()
            }
            ListingField::ImgUrl => self.img_url.clone(),
            ListingField::Price => self.price.to_string(),
            ListingField::State => self.state.clone(),
            ListingField::StreetAddress => self.street_address.clone(),
            ListingField::TaxAssessedValue => self.tax_assessed_value.to_string(),
            ListingField::Url => self.url.clone(),
            ListingField::Zestimate => self.zestimate.to_string(),
            ListingField::Zipcode => self.zipcode.clone(),
        }
    }

    pub fn values(&self, fields: &[ListingField]) -> Vec<String> {
        fields.iter().map(|field| self.value(*field)).collect()
    }

    pub fn formatted_price(&self) -> String {
        format_price(self.price)
    }

    pub fn dump(&self) -> String {
        Value::Object(self.data.clone()).to_string()
    }

    pub fn dump_pretty(&self) -> Result<String, ScrapeError> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.data.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn dump_pretty_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ScrapeError> {
        let path = path.as_ref();
        fs::write(path, self.dump_pretty()?).map_err(|source| ScrapeError::WriteFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Render an amount as whole US dollars with thousands separators: `450000.0` → `"$450,000"`.
pub fn format_price(amount: f64) -> String {
    let rounded = format!("{:.0}", amount.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, digit) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if amount < 0.0 && grouped != "0" {
        format!("$-{}", grouped)
    } else {
        format!("${}", grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search_document() -> Value {
        json!({
            "cat1": {
                "searchResults": {
                    "listResults": [
                        {"zpid": "1", "price": "$450,000"},
                        {"zpid": "2", "price": "$275,000"}
                    ]
                },
                "searchList": {"totalPages": 20}
            }
        })
    }

    #[test]
    fn test_listing_page_from_document() {
        let page = ListingPage::from_document(&search_document()).unwrap();
        assert_eq!(page.total_pages, 20);
        assert_eq!(page.listings.len(), 2);
        assert_eq!(page.listings[1].get("zpid"), Some(&json!("2")));
    }

    #[test]
    fn test_listing_page_empty_results() {
        let document = json!({
            "cat1": {
                "searchResults": {"listResults": []},
                "searchList": {"totalPages": 0}
            }
        });
        let page = ListingPage::from_document(&document).unwrap();
        assert!(page.listings.is_empty());
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_listing_page_missing_segment_names_path() {
        let document = json!({"cat1": {"searchList": {"totalPages": 3}}});
        match ListingPage::from_document(&document) {
            Err(ScrapeError::SchemaMismatch { path }) => assert_eq!(path, "cat1.searchResults"),
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_listing_page_missing_total_pages() {
        let mut document = search_document();
        document["cat1"]["searchList"] = json!({});
        match ListingPage::from_document(&document) {
            Err(ScrapeError::SchemaMismatch { path }) => {
                assert_eq!(path, "cat1.searchList.totalPages")
            }
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_listing_page_rejects_non_array_results() {
        let mut document = search_document();
        document["cat1"]["searchResults"]["listResults"] = json!({"zpid": "1"});
        assert!(matches!(
            ListingPage::from_document(&document),
            Err(ScrapeError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(450000.0), "$450,000");
        assert_eq!(format_price(0.0), "$0");
        assert_eq!(format_price(999.0), "$999");
        assert_eq!(format_price(1000.0), "$1,000");
        assert_eq!(format_price(1234567.4), "$1,234,567");
        assert_eq!(format_price(-2500.0), "$-2,500");
    }

    #[test]
    fn test_meaningful_fields_exclude_internal_attributes() {
        let fields = ListingField::meaningful();
        assert_eq!(fields.len(), 12);
        assert!(!fields.contains(&ListingField::Data));
        assert!(!fields.contains(&ListingField::DatePriceChangedTimestamp));
        assert!(!fields.contains(&ListingField::ImgUrl));
        assert_eq!(fields.first(), Some(&ListingField::Address));
        assert_eq!(fields.last(), Some(&ListingField::Zipcode));
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in ListingField::ALL {
            assert_eq!(field.name().parse::<ListingField>().unwrap(), field);
        }
    }

    #[test]
    fn test_parse_field_list() {
        let fields = ListingField::parse_list("price, city,zipcode").unwrap();
        assert_eq!(
            fields,
            vec![ListingField::Price, ListingField::City, ListingField::Zipcode]
        );

        match ListingField::parse_list("price,lot_size") {
            Err(ScrapeError::UnknownField(name)) => assert_eq!(name, "lot_size"),
            other => panic!("expected UnknownField, got {:?}", other),
        }
    }
}
