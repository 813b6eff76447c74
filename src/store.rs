use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::DEFAULT_FOODS;
use crate::error::{FoodyError, Result};

/// The whole persisted state: candidate foods plus every past spin, keyed by
/// `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodDocument {
    pub food_list: Vec<String>,
    #[serde(default)]
    pub history: BTreeMap<String, Vec<String>>,
}

impl Default for FoodDocument {
    fn default() -> Self {
        Self {
            food_list: DEFAULT_FOODS.iter().map(|s| s.to_string()).collect(),
            history: BTreeMap::new(),
        }
    }
}

impl FoodDocument {
    pub fn new(food_list: Vec<String>) -> Self {
        Self {
            food_list,
            history: BTreeMap::new(),
        }
    }

    pub fn contains_food(&self, name: &str) -> bool {
        self.food_list.iter().any(|f| f == name)
    }

    /// Picks recorded for `date_key`, empty if there are none.
    pub fn picks_for(&self, date_key: &str) -> &[String] {
        self.history.get(date_key).map(Vec::as_slice).unwrap_or(&[])
    }
}

pub trait FoodRepository: Send + Sync {
    fn load(&self) -> Result<FoodDocument>;
    fn save(&self, doc: &FoodDocument) -> Result<()>;
}

/// Reads and overwrites a single JSON file. No locking: concurrent writers
/// from other processes race and the last one wins.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn path_string(&self) -> String {
        self.path.display().to_string()
    }
}

impl FoodRepository for JsonFileStore {
    fn load(&self) -> Result<FoodDocument> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path_string(), "Data file not found, starting from the default food list");
                return Ok(FoodDocument::default());
            }
            Err(source) => {
                return Err(FoodyError::Io {
                    path: self.path_string(),
                    source,
                })
            }
        };

        let doc: FoodDocument = serde_json::from_str(&raw).map_err(|source| FoodyError::Json {
            path: self.path_string(),
            source,
        })?;
        debug!(
            foods = doc.food_list.len(),
            days = doc.history.len(),
            "Loaded food data"
        );
        Ok(doc)
    }

    fn save(&self, doc: &FoodDocument) -> Result<()> {
        // serde_json writes non-ASCII as raw UTF-8, never \u escapes.
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        doc.serialize(&mut ser).map_err(|source| FoodyError::Json {
            path: self.path_string(),
            source,
        })?;

        std::fs::write(&self.path, buf).map_err(|source| FoodyError::Io {
            path: self.path_string(),
            source,
        })?;
        debug!(path = %self.path_string(), "Saved food data");
        Ok(())
    }
}
