//! Backend entries and the validated backend set

use std::ops::Index;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

use crate::http::is_http_url;
use crate::{Error, Result};

/// Weight given to every backend when none is configured
pub const DEFAULT_WEIGHT: u32 = 20;

/// One interchangeable upstream base URL
#[derive(Debug)]
pub struct BackendEntry {
    base_url: String,
    weight: u32,
    last_access: AtomicI64,
}

impl BackendEntry {
    /// Backend without an explicit weight
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::weighted(base_url, 0)
    }

    /// Backend with an explicit weight; 0 means "no weight"
    pub fn weighted(base_url: impl Into<String>, weight: u32) -> Self {
        Self {
            base_url: base_url.into(),
            weight,
            last_access: AtomicI64::new(Utc::now().timestamp()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Last time a request was issued against this backend
    ///
    /// Informational only; concurrent updates may race.
    pub fn last_access(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.last_access.load(Ordering::Relaxed), 0)
    }

    pub(crate) fn touch(&self) {
        self.last_access.store(Utc::now().timestamp(), Ordering::Relaxed);
    }
}

impl Clone for BackendEntry {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            weight: self.weight,
            last_access: AtomicI64::new(self.last_access.load(Ordering::Relaxed)),
        }
    }
}

/// Non-empty, validated list of backends with resolved weights
#[derive(Debug, Clone)]
pub struct BackendSet {
    entries: Vec<BackendEntry>,
}

impl BackendSet {
    /// Validate `entries` and resolve default weights
    ///
    /// Weights must be all zero (uniform) or all positive. Every base URL
    /// must be an absolute HTTP or HTTPS URL.
    pub fn new(mut entries: Vec<BackendEntry>) -> Result<Self> {
        let first = entries
            .first()
            .ok_or_else(|| Error::config("no backend items"))?;

        if !is_http_url(&first.base_url) {
            return Err(not_http(&first.base_url));
        }
        let uniform = first.weight == 0;

        for (i, entry) in entries.iter().enumerate().skip(1) {
            if !is_http_url(&entry.base_url) {
                return Err(not_http(&entry.base_url));
            }
            if entry.weight > 0 && uniform {
                return Err(Error::config(format!("weights before item #{} expected", i)));
            }
            if entry.weight == 0 && !uniform {
                return Err(Error::config(format!(
                    "weight for item #{}({}) expected",
                    i, entry.base_url
                )));
            }
        }

        if uniform {
            for entry in &mut entries {
                entry.weight = DEFAULT_WEIGHT;
            }
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BackendEntry> {
        self.entries.iter()
    }

    /// Resolved weights in entry order
    pub fn weights(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.weight).collect()
    }

    /// Attempt order starting at `start` and wrapping once around the set
    pub fn rotation(&self, start: usize) -> impl Iterator<Item = usize> {
        rotation(start, self.entries.len())
    }
}

impl Index<usize> for BackendSet {
    type Output = BackendEntry;

    fn index(&self, index: usize) -> &Self::Output {
        &self.entries[index]
    }
}

/// Indices `start, start+1, …, len-1, 0, …, start-1`
pub fn rotation(start: usize, len: usize) -> impl Iterator<Item = usize> {
    (0..len).map(move |offset| (start + offset) % len)
}

fn not_http(base_url: &str) -> Error {
    Error::config(format!(
        "prefix of base URL {} is not http or https",
        base_url
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_weights_resolved() {
        let set = BackendSet::new(vec![
            BackendEntry::new("http://a.example"),
            BackendEntry::new("https://b.example"),
        ])
        .unwrap();
        assert_eq!(set.weights(), vec![DEFAULT_WEIGHT, DEFAULT_WEIGHT]);
    }

    #[test]
    fn test_explicit_weights_kept() {
        let set = BackendSet::new(vec![
            BackendEntry::weighted("http://a.example", 3),
            BackendEntry::weighted("http://b.example", 1),
        ])
        .unwrap();
        assert_eq!(set.weights(), vec![3, 1]);
        assert_eq!(set[1].base_url(), "http://b.example");
    }

    #[test]
    fn test_empty_set_rejected() {
        let err = BackendSet::new(Vec::new()).unwrap_err();
        assert!(err.to_string().contains("no backend items"));
    }

    #[test]
    fn test_mixed_weights_rejected() {
        let err = BackendSet::new(vec![
            BackendEntry::new("http://a.example"),
            BackendEntry::weighted("http://b.example", 5),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("weights before item #1 expected"));

        let err = BackendSet::new(vec![
            BackendEntry::weighted("http://a.example", 5),
            BackendEntry::new("http://b.example"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("weight for item #1(http://b.example) expected"));
    }

    #[test]
    fn test_non_http_base_url_rejected() {
        let err = BackendSet::new(vec![BackendEntry::new("ftp://a.example")]).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));

        let err = BackendSet::new(vec![
            BackendEntry::new("http://a.example"),
            BackendEntry::new("b.example"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("b.example"));
    }

    #[test]
    fn test_rotation_wraps() {
        assert_eq!(rotation(2, 4).collect::<Vec<_>>(), vec![2, 3, 0, 1]);
        assert_eq!(rotation(0, 1).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_touch_updates_last_access() {
        let entry = BackendEntry::new("http://a.example");
        entry.last_access.store(0, Ordering::Relaxed);
        entry.touch();
        assert!(entry.last_access().unwrap().timestamp() > 0);
    }
}
