use crate::join::JoinedRow;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Save joined rows as CSV: `year` followed by one column per prefecture.
///
/// Cells for years a prefecture has no data are left empty.
pub fn save_csv<P: AsRef<Path>>(rows: &[JoinedRow], columns: &[String], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    let mut header = Vec::with_capacity(columns.len() + 1);
    header.push("year");
    header.extend(columns.iter().map(String::as_str));
    wtr.write_record(&header)?;
    for row in rows {
        let mut record = Vec::with_capacity(columns.len() + 1);
        record.push(row.year.to_string());
        for name in columns {
            record.push(row.get(name).map(|v| v.to_string()).unwrap_or_default());
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save joined rows as a pretty JSON array of flat `{year, <name>: value}` objects.
pub fn save_json<P: AsRef<Path>>(rows: &[JoinedRow], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let s = serde_json::to_string_pretty(rows)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_csv_and_json() {
        let dir = tempdir().unwrap();
        let csvp = dir.path().join("x.csv");
        let jsonp = dir.path().join("x.json");
        let rows = vec![
            JoinedRow {
                year: 2015,
                values: vec![("Hokkaido".into(), 5_000_000), ("Aomori".into(), 1_300_000)],
            },
            JoinedRow {
                year: 2020,
                values: vec![("Hokkaido".into(), 4_900_000)],
            },
        ];
        let columns = vec!["Hokkaido".to_string(), "Aomori".to_string()];
        save_csv(&rows, &columns, &csvp).unwrap();
        save_json(&rows, &jsonp).unwrap();

        let csv_text = std::fs::read_to_string(&csvp).unwrap();
        assert_eq!(
            csv_text,
            "year,Hokkaido,Aomori\n2015,5000000,1300000\n2020,4900000,\n"
        );
        assert!(jsonp.exists());
    }
}
