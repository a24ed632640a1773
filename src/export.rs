// 📤 CSV Export - One list with totals, or every list joined

use crate::inventory::InventoryList;
use crate::price::format_cents;
use anyhow::{Context, Result};
use std::io::Write;

const LIST_HEADER: [&str; 6] = ["Item Code", "Brand", "Description", "Price", "Quantity", "Total"];

/// Write one list: a row per line, then a grand total row.
pub fn write_list_csv<W: Write>(writer: W, list: &InventoryList) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(LIST_HEADER)?;

    for (_, item) in list.lines() {
        let price = item.price.to_string();
        let qty = item.qty.to_string();
        let total = format_cents(item.total_cents());
        wtr.write_record([
            item.code.as_str(),
            item.brand.as_str(),
            item.description.as_str(),
            price.as_str(),
            qty.as_str(),
            total.as_str(),
        ])
        .with_context(|| format!("Failed to write line {}", item.code))?;
    }

    let grand = format_cents(list.grand_total_cents());
    wtr.write_record(["", "", "", "", "Grand Total", grand.as_str()])?;
    wtr.flush().context("Failed to flush CSV export")?;
    Ok(())
}

/// Write every list into one sheet, prefixed by the list name.
pub fn write_all_lists_csv<W: Write>(writer: W, lists: &[InventoryList]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["List"];
    header.extend(LIST_HEADER);
    wtr.write_record(&header)?;

    for list in lists {
        for (_, item) in list.lines() {
            let price = item.price.to_string();
            let qty = item.qty.to_string();
            let total = format_cents(item.total_cents());
            wtr.write_record([
                list.name.as_str(),
                item.code.as_str(),
                item.brand.as_str(),
                item.description.as_str(),
                price.as_str(),
                qty.as_str(),
                total.as_str(),
            ])?;
        }
    }

    wtr.flush().context("Failed to flush CSV export")?;
    Ok(())
}

/// Export as an in-memory string (HTTP responses, tests).
pub fn list_csv_string(list: &InventoryList) -> Result<String> {
    let mut buf = Vec::new();
    write_list_csv(&mut buf, list)?;
    String::from_utf8(buf).context("CSV export is not valid UTF-8")
}

pub fn all_lists_csv_string(lists: &[InventoryList]) -> Result<String> {
    let mut buf = Vec::new();
    write_all_lists_csv(&mut buf, lists)?;
    String::from_utf8(buf).context("CSV export is not valid UTF-8")
}

/// File name offered for download: list name with path-hostile characters replaced.
pub fn export_file_name(list_name: &str) -> String {
    let safe: String = list_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{}.csv", safe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barcode::{resolve, CanonicalCode};
    use crate::catalogue::{Catalogue, CatalogueEntry};
    use crate::inventory::ManualDetails;
    use crate::price::Price;

    fn counted_list(name: &str) -> InventoryList {
        let cat = Catalogue::from_entries(vec![CatalogueEntry {
            code: CanonicalCode::new("0061414100003").unwrap(),
            brand: "Acme".to_string(),
            description: "Peanut Butter, Smooth".to_string(),
            price: Price::from_cents(499),
            subdept: String::new(),
        }]);

        let mut list = InventoryList::new(name).unwrap();
        list.apply_scan(&resolve("614141000036", &cat).unwrap(), &ManualDetails::default(), 3)
            .unwrap();
        list.apply_scan(&resolve("27088050707", &cat).unwrap(), &ManualDetails::default(), 1)
            .unwrap();
        list
    }

    #[test]
    fn test_list_export_has_totals() {
        let csv = list_csv_string(&counted_list("Aisle 4")).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Item Code,Brand,Description,Price,Quantity,Total");
        // Commas inside fields are quoted
        assert_eq!(lines[1], "0061414100003,Acme,\"Peanut Butter, Smooth\",4.99,3,14.97");
        assert_eq!(lines[2], "2708805000000,,,7.07,1,7.07");
        assert_eq!(lines[3], ",,,,Grand Total,22.04");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_empty_list_export() {
        let csv = list_csv_string(&InventoryList::new("Empty").unwrap()).unwrap();
        assert_eq!(
            csv,
            "Item Code,Brand,Description,Price,Quantity,Total\n,,,,Grand Total,0.00\n"
        );
    }

    #[test]
    fn test_all_lists_export() {
        let lists = vec![counted_list("A"), counted_list("B")];
        let csv = all_lists_csv_string(&lists).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "List,Item Code,Brand,Description,Price,Quantity,Total");
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("A,0061414100003,"));
        assert!(lines[4].starts_with("B,2708805000000,"));
        assert!(!csv.contains("Grand Total"));
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("Aisle 4"), "Aisle 4.csv");
        assert_eq!(export_file_name("a/b:c"), "a_b_c.csv");
    }
}
