use std::cell::RefCell;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::event::Channel;

/// Which root the tree view shows. `Auto` resolves to the last concrete mode
/// the user picked.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    #[default]
    Auto,
    Repositories,
    History,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AnnotationKind {
    #[default]
    Heatmap,
    Gutter,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct HeatmapOptions {
    pub hot_color: String,
    pub cold_color: String,
    /// Commits at least this old get the cold color.
    pub age_threshold_days: u32,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        Self {
            hot_color: "#f66a0a".to_string(),
            cold_color: "#0a60f6".to_string(),
            age_threshold_days: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GutterOptions {
    pub date_format: String,
}

impl Default for GutterOptions {
    fn default() -> Self {
        Self {
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnotationOptions {
    pub kind: AnnotationKind,
    pub heatmap: HeatmapOptions,
    pub gutter: GutterOptions,
}

/// Quiescence window for editor focus and visibility events.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewOptions {
    pub mode: ViewMode,
    pub auto_refresh: bool,
    pub debounce_ms: u64,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            mode: ViewMode::Auto,
            auto_refresh: true,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub views: ViewOptions,
    pub annotations: AnnotationOptions,
}

pub mod keys {
    pub const VIEWS: &str = "views";
    pub const VIEW_MODE: &str = "views.mode";
    pub const AUTO_REFRESH: &str = "views.autoRefresh";
    pub const DEBOUNCE_MS: &str = "views.debounceMs";
    pub const ANNOTATIONS: &str = "annotations";

    // Workspace state.
    pub const LAST_VIEW_MODE: &str = "views.lastMode";
    pub const WORKSPACE_AUTO_REFRESH: &str = "views.repositories.autoRefresh";
}

/// Paths touched by a single configuration update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChange {
    paths: Vec<String>,
}

impl ConfigChange {
    pub fn new(paths: Vec<String>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// True when `path` is the changed path, one of its sections, or nested
    /// beneath it.
    pub fn affects(&self, path: &str) -> bool {
        self.paths
            .iter()
            .any(|changed| is_section_of(changed, path) || is_section_of(path, changed))
    }
}

fn is_section_of(section: &str, path: &str) -> bool {
    path == section
        || (path.starts_with(section) && path.as_bytes().get(section.len()) == Some(&b'.'))
}

/// Key/value store addressed by dotted paths (`views.mode`).
///
/// Used both for user settings and for persisted workspace state.
pub trait ConfigStore {
    fn value(&self, path: &str) -> Result<Option<Value>>;
    fn update(&self, path: &str, value: Value) -> Result<()>;
    fn on_did_change(&self) -> &Channel<ConfigChange>;
}

impl<'a> dyn ConfigStore + 'a {
    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        match self.value(path)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| Error::InvalidValue {
                    path: path.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    pub fn get_or_default<T: DeserializeOwned + Default>(&self, path: &str) -> Result<T> {
        Ok(self.get(path)?.unwrap_or_default())
    }

    pub fn set<T: Serialize>(&self, path: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|source| Error::InvalidValue {
            path: path.to_string(),
            source,
        })?;
        self.update(path, value)
    }

    /// The whole settings tree, with defaults for anything unset.
    pub fn config(&self) -> Result<Config> {
        let views = self.get_or_default::<ViewOptions>(keys::VIEWS)?;
        let annotations = self.get_or_default::<AnnotationOptions>(keys::ANNOTATIONS)?;
        Ok(Config { views, annotations })
    }
}

/// In-memory `ConfigStore` backed by a JSON object.
#[derive(Debug)]
pub struct JsonStore {
    root: RefCell<Value>,
    changed: Channel<ConfigChange>,
}

impl JsonStore {
    pub fn new() -> Self {
        Self::from_value(Value::Object(Map::new()))
    }

    pub fn from_value(root: Value) -> Self {
        Self {
            root: RefCell::new(root),
            changed: Channel::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::from_value(serde_json::from_str(json)?))
    }

    pub fn snapshot(&self) -> Value {
        self.root.borrow().clone()
    }
}

impl Default for JsonStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for JsonStore {
    fn value(&self, path: &str) -> Result<Option<Value>> {
        let root = self.root.borrow();
        let mut current = &*root;
        for segment in path.split('.') {
            match current.get(segment) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current.clone()))
    }

    fn update(&self, path: &str, value: Value) -> Result<()> {
        {
            let mut root = self.root.borrow_mut();
            let mut current = &mut *root;
            let segments: Vec<&str> = path.split('.').collect();
            let (last, parents) = segments.split_last().ok_or_else(|| Error::Config {
                path: path.to_string(),
                message: "empty path".to_string(),
            })?;

            for segment in parents {
                let object = current.as_object_mut().ok_or_else(|| Error::Config {
                    path: path.to_string(),
                    message: format!("`{}` is not an object", segment),
                })?;
                current = object
                    .entry(segment.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
            }

            let object = current.as_object_mut().ok_or_else(|| Error::Config {
                path: path.to_string(),
                message: "parent is not an object".to_string(),
            })?;
            object.insert(last.to_string(), value);
        }

        // Borrow released before listeners run; they may read the store.
        self.changed.publish(&ConfigChange::new(vec![path.to_string()]));
        Ok(())
    }

    fn on_did_change(&self) -> &Channel<ConfigChange> {
        &self.changed
    }
}
