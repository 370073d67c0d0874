//! Cookie jar for the command-line client
//!
//! The browser keeps `accessToken` in `document.cookie`; here the same
//! get/set/remove contract is backed by a small JSON file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Cookie holding the bearer token
pub const ACCESS_TOKEN: &str = "accessToken";

pub const JAR_FILE: &str = "cookies.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredCookie {
    value: String,
    #[serde(default)]
    expires: Option<DateTime<Utc>>,
}

impl StoredCookie {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires.map_or(true, |at| at > now)
    }
}

#[derive(Debug)]
pub struct CookieJar {
    path: PathBuf,
    cookies: BTreeMap<String, StoredCookie>,
}

impl CookieJar {
    /// Open the jar in `dir`, creating nothing until the first write
    pub fn open(dir: &Path) -> Result<Self, CookieError> {
        let path = dir.join(JAR_FILE);
        let cookies = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|e| CookieError::Corrupt {
                path: path.clone(),
                error: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(CookieError::Io {
                    path,
                    error: e.to_string(),
                })
            }
        };
        Ok(Self { path, cookies })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value of a cookie; expired cookies read as absent
    pub fn get(&self, name: &str) -> Option<&str> {
        let now = Utc::now();
        self.cookies
            .get(name)
            .filter(|c| c.is_live(now))
            .map(|c| c.value.as_str())
    }

    pub fn set(
        &mut self,
        name: &str,
        value: &str,
        expires: Option<DateTime<Utc>>,
    ) -> Result<(), CookieError> {
        self.cookies.insert(
            name.to_string(),
            StoredCookie {
                value: value.to_string(),
                expires,
            },
        );
        self.save()
    }

    /// Returns whether the cookie was present
    pub fn remove(&mut self, name: &str) -> Result<bool, CookieError> {
        let removed = self.cookies.remove(name).is_some();
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    fn save(&mut self) -> Result<(), CookieError> {
        let now = Utc::now();
        self.cookies.retain(|_, c| c.is_live(now));

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CookieError::Io {
                path: parent.to_path_buf(),
                error: e.to_string(),
            })?;
        }
        let content = serde_json::to_string_pretty(&self.cookies).map_err(|e| {
            CookieError::Corrupt {
                path: self.path.clone(),
                error: e.to_string(),
            }
        })?;

        // replace atomically
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(|e| CookieError::Io {
                path: self.path.clone(),
                error: e.to_string(),
            })
    }
}

#[derive(Error, Debug)]
pub enum CookieError {
    #[error("Failed to access cookie jar {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Cookie jar {path:?} is corrupt: {error}")]
    Corrupt { path: PathBuf, error: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_remove_persist() {
        let dir = TempDir::new().unwrap();
        let mut jar = CookieJar::open(dir.path()).unwrap();
        assert_eq!(jar.get(ACCESS_TOKEN), None);

        let expires = Utc::now() + Duration::hours(1);
        jar.set(ACCESS_TOKEN, "Bearer abc", Some(expires)).unwrap();
        assert_eq!(jar.get(ACCESS_TOKEN), Some("Bearer abc"));

        let reopened = CookieJar::open(dir.path()).unwrap();
        assert_eq!(reopened.get(ACCESS_TOKEN), Some("Bearer abc"));

        assert!(jar.remove(ACCESS_TOKEN).unwrap());
        assert!(!jar.remove(ACCESS_TOKEN).unwrap());
        let reopened = CookieJar::open(dir.path()).unwrap();
        assert_eq!(reopened.get(ACCESS_TOKEN), None);
    }

    #[test]
    fn test_expired_cookie_reads_absent() {
        let dir = TempDir::new().unwrap();
        let mut jar = CookieJar::open(dir.path()).unwrap();
        jar.set(ACCESS_TOKEN, "old", Some(Utc::now() - Duration::seconds(1)))
            .unwrap();
        assert_eq!(jar.get(ACCESS_TOKEN), None);

        jar.set("session", "forever", None).unwrap();
        assert_eq!(jar.get("session"), Some("forever"));
    }

    #[test]
    fn test_corrupt_jar() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(JAR_FILE), "{not json").unwrap();
        assert!(matches!(
            CookieJar::open(dir.path()),
            Err(CookieError::Corrupt { .. })
        ));
    }
}
