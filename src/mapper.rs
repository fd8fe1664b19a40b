use crate::error::ScrapeError;
use crate::models::{ListingRecord, RawListing};
use crate::debug_eprintln;
use chrono::{DateTime, Local, NaiveDateTime};
use serde_json::{Map, Value};

/// What to do with a listing that cannot be mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MappingPolicy {
    /// Fail the whole batch on the first bad listing.
    #[default]
    Abort,
    /// Drop the bad listing and keep going.
    Skip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappingOutcome {
    pub records: Vec<ListingRecord>,
    pub skipped: usize,
}

/// Base the working record on `hdpData.homeInfo`, then overlay every top-level key.
pub fn merge_listing(raw: &RawListing) -> Result<Map<String, Value>, ScrapeError> {
    let home_info = raw
        .get("hdpData")
        .and_then(|hdp| hdp.get("homeInfo"))
        .and_then(Value::as_object)
        .ok_or_else(|| ScrapeError::RequiredFieldMissing("hdpData.homeInfo".to_string()))?;

    let mut merged = home_info.clone();
    for (key, value) in raw.fields() {
        merged.insert(key.clone(), value.clone());
    }
    Ok(merged)
}

fn present<'a>(data: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    data.get(key).filter(|value| !value.is_null())
}

fn required_string(data: &Map<String, Value>, key: &str) -> Result<String, ScrapeError> {
    match present(data, key) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(_) => Err(ScrapeError::InvalidField {
            key: key.to_string(),
            expected: "string",
        }),
        None => Err(ScrapeError::RequiredFieldMissing(key.to_string())),
    }
}

/// Leading numeric run of a display string: "$2,195/mo" → 2195, "$1,250,000+" → 1250000.
fn leading_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();

    let mut end = 0;
    for (i, c) in cleaned.char_indices() {
        if c.is_ascii_digit() || c == '.' || (i == 0 && c == '-') {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }

    cleaned[..end].parse::<f64>().ok()
}

/// Numbers may arrive as JSON numbers or as display strings like "$1,250,000".
fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => leading_number(text),
        _ => None,
    }
}

fn required_number(data: &Map<String, Value>, key: &str) -> Result<f64, ScrapeError> {
    let value = present(data, key)
        .ok_or_else(|| ScrapeError::RequiredFieldMissing(key.to_string()))?;
    parse_number(value).ok_or_else(|| ScrapeError::InvalidField {
        key: key.to_string(),
        expected: "number",
    })
}

/// Absent or unreadable values fall back to 0.
fn optional_number(data: &Map<String, Value>, key: &str) -> f64 {
    match present(data, key).and_then(parse_number) {
        Some(number) => number,
        None => {
            if let Some(value) = present(data, key) {
                debug_eprintln!("Ignoring unreadable {}: {}", key, value);
            }
            0.0
        }
    }
}

fn optional_timestamp(data: &Map<String, Value>, key: &str) -> i64 {
    let millis = present(data, key).and_then(|value| match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|millis| millis as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    });

    match millis {
        Some(millis) => millis,
        None => {
            if let Some(value) = present(data, key) {
                debug_eprintln!("Ignoring unreadable {}: {}", key, value);
            }
            0
        }
    }
}

/// Local wall-clock time for an epoch-millisecond timestamp; `None` for 0.
pub fn date_from_timestamp(millis: i64) -> Option<NaiveDateTime> {
    if millis == 0 {
        return None;
    }
    DateTime::from_timestamp_millis(millis).map(|utc| utc.with_timezone(&Local).naive_local())
}

impl ListingRecord {
    /// Map one raw listing. Fails naming the first required key that is absent.
    pub fn from_raw(raw: &RawListing) -> Result<Self, ScrapeError> {
        let data = merge_listing(raw)?;

        let zestimate = optional_number(&data, "zestimate");
        let address = required_string(&data, "address")?;
        let city = required_string(&data, "city")?;
        let state = required_string(&data, "state")?;
        let zipcode = required_string(&data, "zipcode")?;
        let street_address = required_string(&data, "streetAddress")?;
        let date_price_changed_timestamp = optional_timestamp(&data, "datePriceChanged");
        let bedrooms = required_number(&data, "bedrooms")?;
        let bathrooms = required_number(&data, "bathrooms")?;
        let tax_assessed_value = optional_number(&data, "taxAssessedValue");
        let price = required_number(&data, "price")?;
        let url = required_string(&data, "detailUrl")?;
        let img_url = required_string(&data, "imgSrc")?;
        let date_price_changed = date_from_timestamp(date_price_changed_timestamp);

        Ok(Self {
            data,
            address,
            street_address,
            city,
            state,
            zipcode,
            price,
            zestimate,
            tax_assessed_value,
            bedrooms,
            bathrooms,
            date_price_changed_timestamp,
            date_price_changed,
            url,
            img_url,
        })
    }
}

/// Map a page worth of listings in order.
pub fn map_listings(
    listings: &[RawListing],
    policy: MappingPolicy,
) -> Result<MappingOutcome, ScrapeError> {
    let mut records = Vec::with_capacity(listings.len());
    let mut skipped = 0;

    for (index, raw) in listings.iter().enumerate() {
        match ListingRecord::from_raw(raw) {
            Ok(record) => records.push(record),
            Err(e) if policy == MappingPolicy::Skip => {
                debug_eprintln!("Skipping listing {}: {}", index, e);
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(MappingOutcome { records, skipped })
}
