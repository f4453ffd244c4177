pub mod embedded;
pub mod table;

pub use embedded::extract_embedded_json;
pub use table::{parse_columns, parse_csv, parse_table, Record};
