//! Creating and populating tables through the table API.
//!
//! The endpoint layout is `{api_url}schema/{schema}/tables/{table}/`, with
//! rows at `.../rows/{n}`. [`MockTableApi`] keeps everything in memory and is
//! meant for tests.
//!
//! # Example
//!
//! ```no_run
//! use tabdefine::api::{ClientConfig, OepClient, Uploader};
//! use tabdefine::TableDefiner;
//!
//! let result = TableDefiner::new().define("protests.csv").unwrap();
//! let client = OepClient::new(ClientConfig::new("protests").with_token("...")).unwrap();
//! let report = Uploader::new(&client)
//!     .upload(&result.document, &result.data)
//!     .unwrap();
//! println!("{} row(s) inserted", report.inserted);
//! ```

mod client;
mod mock;
mod upload;

pub use client::{
    ClientConfig, DEFAULT_API_URL, DEFAULT_SCHEMA, OepClient, Row, TOKEN_ENV, TableApi,
};
pub use mock::MockTableApi;
pub use upload::{RowFailure, UploadConfig, UploadReport, Uploader};
