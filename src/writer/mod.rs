pub mod csv_writer;
pub mod options;
pub mod scramble;

pub use csv_writer::{escape_value, CsvWriter};
pub use options::{CsvDelimiter, CsvEncoding};
pub use scramble::scramble;
