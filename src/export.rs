use crate::models::{ListingField, ListingRecord};
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Write a header row of field names, then one row per record in the given order.
pub fn write_records<W: Write>(
    writer: W,
    records: &[ListingRecord],
    fields: &[ListingField],
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    writer.write_record(fields.iter().map(|field| field.name()))?;
    for record in records {
        writer.write_record(&record.values(fields))?;
    }

    writer.flush()?;
    Ok(())
}

pub fn save_records_to_csv(
    records: &[ListingRecord],
    fields: &[ListingField],
    output_path: &Path,
) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .context(format!("Failed to create output directory: {}", parent.display()))?;
    }

    let file = File::create(output_path)
        .context(format!("Failed to create output file: {}", output_path.display()))?;
    write_records(file, records, fields)?;

    Ok(())
}

/// Read an exported file back as (header, rows).
pub fn load_rows_from_csv(input_path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let file = File::open(input_path)
        .context(format!("Failed to open input file: {}", input_path.display()))?;

    let mut reader = csv::Reader::from_reader(file);
    let header = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok((header, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawListing;
    use serde_json::{json, Value};

    fn record(street: &str, price: u64, date_price_changed: Option<i64>) -> ListingRecord {
        let mut home_info = json!({
            "streetAddress": street,
            "zipcode": "29401",
            "city": "Charleston",
            "state": "SC",
            "price": price,
            "bathrooms": 2,
            "bedrooms": 3
        });
        if let Some(ts) = date_price_changed {
            home_info["datePriceChanged"] = json!(ts);
        }

        let listing: Value = json!({
            "address": format!("{}, Charleston, SC 29401", street),
            "detailUrl": format!("https://www.zillow.com/homedetails/{}", street.replace(' ', "-")),
            "imgSrc": "https://photos.zillowstatic.com/p_e/1.jpg",
            "hdpData": {"homeInfo": home_info}
        });
        ListingRecord::from_raw(&RawListing::try_from(listing).unwrap()).unwrap()
    }

    #[test]
    fn test_write_records_header_and_order() {
        let records = vec![record("1 Main St", 100000, None), record("2 Main St", 250000, None)];
        let fields = [ListingField::StreetAddress, ListingField::Price, ListingField::Zestimate];

        let mut buffer = Vec::new();
        write_records(&mut buffer, &records, &fields).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert_eq!(
            text,
            "street_address,price,zestimate\n1 Main St,100000,0\n2 Main St,250000,0\n"
        );
    }

    #[test]
    fn test_quotes_values_with_commas() {
        let records = vec![record("1 Main St", 100000, None)];
        let mut buffer = Vec::new();
        write_records(&mut buffer, &records, &[ListingField::Address]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "address\n\"1 Main St, Charleston, SC 29401\"\n");
    }

    #[test]
    fn test_csv_round_trip_recovers_values() {
        let records = vec![
            record("1 Main St", 100000, Some(1_700_000_000_000)),
            record("2 Main St", 250000, None),
        ];
        let fields = records[0].meaningful_fields();

        let path = std::env::temp_dir().join(format!(
            "zillowfinder-export-{}/listings.csv",
            std::process::id()
        ));
        save_records_to_csv(&records, &fields, &path).unwrap();
        let (header, rows) = load_rows_from_csv(&path).unwrap();

        let expected_header: Vec<String> = fields.iter().map(|f| f.name().to_string()).collect();
        assert_eq!(header, expected_header);
        assert_eq!(rows.len(), records.len());
        for (row, record) in rows.iter().zip(&records) {
            assert_eq!(row, &record.values(&fields));
        }

        let date_column = header.iter().position(|h| h == "date_price_changed").unwrap();
        assert!(!rows[0][date_column].is_empty());
        assert_eq!(rows[1][date_column], "");

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_empty_record_set_writes_header_only() {
        let mut buffer = Vec::new();
        write_records(&mut buffer, &[], &ListingField::SUMMARY).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "zestimate,address,city,state,zipcode,street_address,date_price_changed,bedrooms,bathrooms,tax_assessed_value,price\n"
        );
    }
}
