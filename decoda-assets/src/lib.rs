#![warn(missing_docs)]
//! decoda Assets - Download Pipeline
//!
//! Materializes the raw assets referenced by a test suite on disk:
//! fetch over HTTP, verify against recorded checksums, extract archives.
//! Downloads run on a fixed-size worker pool, one task per dispatch
//! slot, and the whole call aborts on the first task failure.
//!
//! ```text
//! TestSuite
//!     │  one DownloadTask per vector
//!     ▼
//! ┌─────────────┐   skip if cached & digest matches
//! │ worker pool │──────────────────────────────────┐
//! └──────┬──────┘                                  │
//!        │ fetch (ureq)                            │
//!        ▼                                         ▼
//!   extract archive ──────────────▶ out_dir/suite/vector/input_file
//! ```

mod archive;
mod error;
mod fetch;
mod store;

pub use archive::{extract, is_extractable};
pub use error::AssetError;
pub use fetch::{Fetcher, HttpFetcher, url_basename};
pub use store::{DownloadOptions, VectorStore};
