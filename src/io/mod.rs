//! I/O module
//!
//! Handles CSV parsing and output for request replay.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, response serialization)
//! - `async_reader` - Asynchronous CSV reader with batch reading interface

pub mod async_reader;
pub mod csv_format;

pub use async_reader::RequestReader;
pub use csv_format::{convert_request_record, write_responses_csv, RequestRecord};
