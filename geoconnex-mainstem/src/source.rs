//! Reference dataset locations.
//!
//! A location is either a local path or a remote object. Object-storage
//! locators are mapped onto their public HTTPS endpoints:
//!
//! | Locator | Fetched from |
//! |---------|--------------|
//! | `/data/x.geojson`, `file:///data/x.geojson` | local filesystem |
//! | `https://host/x.csv` | as given |
//! | `s3://bucket/key` | `https://bucket.s3.amazonaws.com/key` |
//! | `gs://bucket/key`, `gcs://bucket/key` | `https://storage.googleapis.com/bucket/key` |

use crate::error::{ReferenceError, Result};
use bytes::Bytes;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Where a reference dataset lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceLocation {
    /// Local filesystem path.
    Local(PathBuf),

    /// Remote object fetched over HTTP(S).
    Remote {
        /// The locator as configured (`s3://...`, `https://...`).
        locator: String,
        /// The HTTP(S) URL actually fetched.
        url: String,
    },
}

impl FromStr for ReferenceLocation {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let Some((scheme, rest)) = s.split_once("://") else {
            return Ok(ReferenceLocation::Local(PathBuf::from(s)));
        };

        let url = match scheme.to_ascii_lowercase().as_str() {
            "file" => return Ok(ReferenceLocation::Local(PathBuf::from(rest))),
            "http" | "https" => s.to_string(),
            "s3" => {
                let (bucket, key) = split_bucket(s, rest)?;
                format!("https://{bucket}.s3.amazonaws.com/{key}")
            }
            "gs" | "gcs" => {
                let (bucket, key) = split_bucket(s, rest)?;
                format!("https://storage.googleapis.com/{bucket}/{key}")
            }
            other => return Err(ReferenceError::UnsupportedScheme(other.to_string())),
        };

        Ok(ReferenceLocation::Remote {
            locator: s.to_string(),
            url,
        })
    }
}

fn split_bucket<'a>(locator: &str, rest: &'a str) -> Result<(&'a str, &'a str)> {
    match rest.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => Ok((bucket, key)),
        _ => Err(ReferenceError::InvalidLocation(locator.to_string())),
    }
}

impl ReferenceLocation {
    /// Whether the location is remote.
    pub fn is_remote(&self) -> bool {
        matches!(self, ReferenceLocation::Remote { .. })
    }

    /// Startup pre-check. Local paths must exist; remote objects are assumed
    /// reachable until fetched.
    pub fn is_available(&self) -> bool {
        match self {
            ReferenceLocation::Local(path) => path.exists(),
            ReferenceLocation::Remote { .. } => true,
        }
    }

    /// Read the whole dataset.
    pub async fn fetch(&self, client: &reqwest::Client) -> Result<Bytes> {
        match self {
            ReferenceLocation::Local(path) => {
                if !path.exists() {
                    return Err(ReferenceError::NotFound(path.clone()));
                }
                let data = tokio::fs::read(path).await.map_err(|source| ReferenceError::Io {
                    path: path.clone(),
                    source,
                })?;
                Ok(Bytes::from(data))
            }
            ReferenceLocation::Remote { url, .. } => {
                tracing::debug!(url = %url, "fetching remote reference data");
                let response = client
                    .get(url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| ReferenceError::remote(url.as_str(), e))?;
                response
                    .bytes()
                    .await
                    .map_err(|e| ReferenceError::remote(url.as_str(), e))
            }
        }
    }

    /// Read the dataset as UTF-8 text.
    pub async fn fetch_text(&self, client: &reqwest::Client) -> Result<String> {
        let bytes = self.fetch(client).await?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ReferenceError::Utf8(self.to_string()))
    }
}

impl fmt::Display for ReferenceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceLocation::Local(path) => write!(f, "{}", path.display()),
            ReferenceLocation::Remote { locator, .. } => f.write_str(locator),
        }
    }
}
