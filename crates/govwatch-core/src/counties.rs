//! County (jurisdiction) registry.
//!
//! The list is supplied externally and loaded once at start-up. Two JSON
//! shapes are accepted:
//!
//! ```json
//! [{ "code": "047", "name": "Nairobi" }]
//! ```
//!
//! ```json
//! ["Nairobi", "Kisumu"]
//! ```
//!
//! In the second form the name doubles as the code. When no list is
//! configured, the bundled list of Kenya's 47 counties is used.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{Result, TrackerError};

const BUNDLED_COUNTIES: &str = include_str!("../data/kenya_counties.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct County {
    pub code: String,
    pub name: String,
}

impl County {
    /// Selector label, e.g. `047 - Nairobi`.
    pub fn label(&self) -> String {
        if self.code == self.name {
            self.name.clone()
        } else {
            format!("{} - {}", self.code, self.name)
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CountyEntry {
    Full(County),
    Name(String),
}

#[derive(Debug, Clone, Default)]
pub struct CountyRegistry {
    counties: Vec<County>,
}

impl CountyRegistry {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let entries: Vec<CountyEntry> = serde_json::from_str(json)?;
        let mut counties: Vec<County> = Vec::with_capacity(entries.len());
        for entry in entries {
            let county = match entry {
                CountyEntry::Full(c) => c,
                CountyEntry::Name(name) => County {
                    code: name.clone(),
                    name,
                },
            };
            if !counties.iter().any(|c| c.code == county.code) {
                counties.push(county);
            }
        }
        Ok(Self { counties })
    }

    /// Kenya's 47 counties, coded `001`..`047`.
    pub fn bundled() -> Self {
        Self::from_json(BUNDLED_COUNTIES).unwrap_or_else(|e| {
            error!(error = %e, "bundled county list is unreadable");
            Self::default()
        })
    }

    pub fn name_for(&self, code: &str) -> Option<&str> {
        self.counties
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.name.as_str())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.name_for(code).is_some()
    }

    /// Reject a county filter that names no known county. Empty is allowed
    /// and means "no county filter".
    pub fn validate(&self, code: &str) -> Result<()> {
        if code.is_empty() || self.contains(code) {
            Ok(())
        } else {
            Err(TrackerError::UnknownCounty(code.to_string()))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &County> {
        self.counties.iter()
    }

    pub fn len(&self) -> usize {
        self.counties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counties.is_empty()
    }
}
