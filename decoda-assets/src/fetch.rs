//! HTTP asset fetching.

use crate::error::AssetError;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Transport seam of the download pipeline.
///
/// The pipeline only needs "put the file named by this URL into this
/// directory"; tests substitute an offline implementation.
pub trait Fetcher: Send + Sync {
    /// Download `url` into `dest_dir`, returning the written path.
    fn fetch(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, AssetError>;
}

/// Last path segment of a URL, used as the destination file name.
pub fn url_basename(url: &str) -> Option<&str> {
    let tail = url.split(['?', '#']).next().unwrap_or(url);
    tail.rsplit('/').next().filter(|name| !name.is_empty())
}

/// `Fetcher` backed by a blocking `ureq` GET.
#[derive(Debug, Default)]
pub struct HttpFetcher;

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, AssetError> {
        let name = url_basename(url).ok_or_else(|| AssetError::Fetch {
            url: url.to_string(),
            reason: "URL has no file name".to_string(),
        })?;
        let dest = dest_dir.join(name);

        let response = match ureq::get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                return Err(AssetError::Fetch {
                    url: url.to_string(),
                    reason: format!("HTTP {code}"),
                });
            }
            Err(err) => {
                return Err(AssetError::Fetch {
                    url: url.to_string(),
                    reason: err.to_string(),
                });
            }
        };

        let mut reader = response.into_reader();
        let mut file = File::create(&dest).map_err(|e| AssetError::io(&dest, e))?;
        io::copy(&mut reader, &mut file).map_err(|e| AssetError::io(&dest, e))?;
        Ok(dest)
    }
}
