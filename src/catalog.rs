//! The external movement catalog: a JSON document mapping canonical
//! movement identifiers to per-track, per-gender defaults. Building this
//! file is the job of a separate harvester utility; this module only
//! loads and queries it.

use std::fs;
use std::path::Path;

use fnv::FnvHashMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::WodcError;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Catalog {
    #[serde(default)]
    pub movements: FnvHashMap<String, MovementEntry>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct MovementEntry {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub preferred: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub reps: FnvHashMap<String, GenderMap<f64>>,
    #[serde(default)]
    pub distance: FnvHashMap<String, GenderMap<f64>>,
    #[serde(default)]
    pub cal: FnvHashMap<String, GenderMap<f64>>,
    /// A load default may be a plain string token (`"135kg"`) or an
    /// already-structured object; deferred to `serde_json::Value` and
    /// parsed by the resolver the same way a `raw` load would be.
    #[serde(default)]
    pub load: FnvHashMap<String, GenderMap<Value>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GenderMap<T> {
    pub male: Option<T>,
    pub female: Option<T>,
}

impl<T> GenderMap<T> {
    pub fn get(&self, gender: Gender) -> Option<&T> {
        match gender {
            Gender::Male => self.male.as_ref(),
            Gender::Female => self.female.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Catalog, WodcError> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| WodcError::Catalog(format!("{}: {e}", path.display())))
    }

    /// A flat lookup by movement id, tolerant of an absent entry.
    pub fn movement(&self, id: &str) -> Option<&MovementEntry> {
        self.movements.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_catalog() {
        let json = r#"{
            "movements": {
                "row": {
                    "cal": { "rx": { "male": 20, "female": 15 } },
                    "load": { "rx": { "male": "2000m" } }
                }
            }
        }"#;
        let cat: Catalog = serde_json::from_str(json).unwrap();
        let row = cat.movement("row").unwrap();
        let rx = row.cal.get("rx").unwrap();
        assert_eq!(rx.get(Gender::Male), Some(&20.0));
        assert_eq!(rx.get(Gender::Female), Some(&15.0));
    }
}
