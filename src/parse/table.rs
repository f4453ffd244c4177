// src/parse/table.rs

use indexmap::IndexMap;
use tracing::{instrument, trace, warn};

use crate::error::{Error, Result};

/// One data line, keyed by normalized column name in header order. Cells are left
/// as raw text; `None` marks a cell the line was too short to provide.
pub type Record = IndexMap<String, Option<String>>;

pub const DEFAULT_DELIMITER: char = ',';

/// Trim, lowercase and snake-case a raw header cell: `" ISIN No "` → `"isin_no"`.
pub fn normalize_column(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .replace(' ', "_")
}

/// Normalized column names of a header line.
pub fn parse_columns(header: &str, delimiter: char) -> Vec<String> {
    header.split(delimiter).map(normalize_column).collect()
}

fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(['\r', '\n']).filter(|l| !l.trim().is_empty())
}

/// Split `text` into a header and data lines and zip every data line with the header.
///
/// Fails when there is no data line under the header, or when `required` is given
/// and does not appear among the normalized column names.
#[instrument(level = "debug", skip(text), fields(len = text.len()))]
pub fn parse_table(text: &str, delimiter: char, required: Option<&str>) -> Result<Vec<Record>> {
    let mut lines = lines(text);
    let header = lines
        .next()
        .ok_or_else(|| Error::invalid("no header line"))?;
    let columns = parse_columns(header, delimiter);
    trace!(?columns, "parsed header");

    if let Some(req) = required {
        if !columns.iter().any(|c| c == req) {
            warn!(required = req, "required column missing from header");
            return Err(Error::invalid(format!("missing column `{}`", req)));
        }
    }

    let records: Vec<Record> = lines
        .map(|line| {
            let mut cells = line.split(delimiter);
            columns
                .iter()
                .map(|col| (col, cells.next()))
                .filter(|(col, _)| !col.is_empty())
                .map(|(col, cell)| (col.clone(), cell.map(str::to_string)))
                .collect()
        })
        .collect();

    if records.is_empty() {
        return Err(Error::invalid("header without data lines"));
    }
    trace!(rows = records.len(), "parsed table");
    Ok(records)
}

/// `parse_table` with a comma delimiter.
pub fn parse_csv(text: &str, required: Option<&str>) -> Result<Vec<Record>> {
    parse_table(text, DEFAULT_DELIMITER, required)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EQUITY_L: &str = "SYMBOL,NAME OF COMPANY, SERIES, DATE OF LISTING,PAID UP VALUE\n\
        20MICRONS,20 Microns Limited,EQ,06-OCT-2008,5\n\
        21STCENMGM,21st Century Management Services Limited,EQ,03-MAY-1995,10\n\
        3IINFOTECH,3i Infotech Limited,EQ,22-APR-2005,10\n";

    #[test]
    fn normalizes_header_names() {
        assert_eq!(
            parse_columns("SYMBOL,NAME OF COMPANY, SERIES ", ','),
            vec!["symbol", "name_of_company", "series"]
        );
        assert_eq!(normalize_column("\u{feff}Sc Code"), "sc_code");
    }

    #[test]
    fn one_record_per_data_line() -> Result<()> {
        let records = parse_csv(EQUITY_L, Some("symbol"))?;
        assert_eq!(records.len(), 3);

        let keys: Vec<&str> = records[0].keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["symbol", "name_of_company", "series", "date_of_listing", "paid_up_value"]
        );
        for r in &records {
            assert_eq!(r.len(), 5);
        }
        assert_eq!(records[2]["symbol"].as_deref(), Some("3IINFOTECH"));
        assert_eq!(records[0]["date_of_listing"].as_deref(), Some("06-OCT-2008"));
        Ok(())
    }

    #[test]
    fn json_keeps_header_order() -> Result<()> {
        let records = parse_csv("Series,Symbol,ISIN Number\nEQ,INFY,INE009A01021\n", None)?;
        let out = serde_json::to_string(&records)?;
        assert_eq!(
            out,
            r#"[{"series":"EQ","symbol":"INFY","isin_number":"INE009A01021"}]"#
        );
        Ok(())
    }

    #[test]
    fn missing_required_column_fails() {
        let err = parse_csv(EQUITY_L, Some("isin_no")).unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[test]
    fn header_only_fails() {
        assert!(parse_csv("SYMBOL,SERIES\n", Some("symbol")).is_err());
        assert!(parse_csv("", None).is_err());
        assert!(parse_csv("\r\n\r\n", None).is_err());
    }

    #[test]
    fn crlf_and_blank_lines_are_skipped() -> Result<()> {
        let text = "Scrip Code,ISIN No\r\n\r\n500209,INE009A01021\r\n500325,INE002A01018\r\n\r\n";
        let records = parse_csv(text, Some("isin_no"))?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["scrip_code"].as_deref(), Some("500325"));
        Ok(())
    }

    #[test]
    fn short_rows_keep_the_key_set() -> Result<()> {
        let records = parse_csv("a,b,c\n1,2\n1,2,3,4\n", None)?;
        assert_eq!(records[0]["c"], None);
        assert_eq!(records[0]["b"].as_deref(), Some("2"));
        // surplus cells have no column to land in
        assert_eq!(records[1].len(), 3);
        assert_eq!(records[1]["c"].as_deref(), Some("3"));
        Ok(())
    }

    #[test]
    fn custom_delimiter_and_empty_columns() -> Result<()> {
        let records = parse_table("SC_CODE|SC_NAME|\n500209|INFOSYS LTD  |\n", '|', Some("sc_code"))?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].len(), 2);
        assert_eq!(records[0]["sc_name"].as_deref(), Some("INFOSYS LTD  "));
        Ok(())
    }
}
