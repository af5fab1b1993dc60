//! Settings document consumed by the mutator.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bom_core::{Record, Value};
use serde::{Deserialize, Serialize};

use crate::builder::BuildOptions;
use crate::document::load_document;
use crate::{SkeletonError, SkeletonResult};

/// Root part of a build.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopRef {
    #[serde(rename = "ref")]
    pub reference: String,
    /// Taken from the existing skeleton when absent.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl TopRef {
    pub fn new(reference: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            kind: Some(kind.into()),
        }
    }
}

/// A pool of named records: files to load plus entries given inline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub location: Vec<PathBuf>,
    #[serde(flatten)]
    pub inline: Record,
}

impl Section {
    pub fn with_location(location: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            location: location.into_iter().map(Into::into).collect(),
            inline: Record::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.location.is_empty() && self.inline.is_empty()
    }
}

/// Analysis modules: run order plus definitions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Modules {
    /// Position ("0", "1", ...) -> module name.
    #[serde(default)]
    pub order: BTreeMap<String, String>,
    #[serde(default)]
    pub location: Vec<PathBuf>,
    #[serde(flatten)]
    pub definitions: Record,
}

impl Modules {
    /// Module names in run order. Positions must be contiguous from "0".
    pub fn ordered(&self) -> SkeletonResult<Vec<&str>> {
        (0..self.order.len())
            .map(|position| {
                self.order
                    .get(&position.to_string())
                    .map(String::as_str)
                    .ok_or_else(|| SkeletonError::ConfigurationIncomplete {
                        what: format!("modules.order has no entry for position {position}"),
                    })
            })
            .collect()
    }
}

/// One module definition. Only `requirements` matters to the mutator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleDef {
    /// Reference -> patch merged into that record.
    #[serde(default)]
    pub requirements: Record,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Record,
    #[serde(default)]
    pub class_str: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<Value>,
}

impl ModuleDef {
    pub fn from_value(name: &str, value: &Value) -> SkeletonResult<Self> {
        serde_json::from_value(value.clone()).map_err(|e| SkeletonError::InvalidDocument {
            what: format!("module '{name}': {e}"),
        })
    }
}

/// Settings for one mutation pass. Every section is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<TopRef>,
    /// Reference -> patch applied to the catalog entry of that part's type.
    pub part_changes: Record,
    /// Reference -> patch applied to the record itself.
    pub other_changes: Record,
    pub parts: Section,
    pub parameters: Section,
    pub defaults: Section,
    pub storage: Section,
    pub modules: Modules,
}

impl Settings {
    pub fn from_value(value: &Value) -> SkeletonResult<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone()).map_err(|e| SkeletonError::InvalidDocument {
            what: format!("settings: {e}"),
        })
    }

    pub fn load(path: &Path) -> SkeletonResult<Self> {
        Self::from_value(&load_document(path)?)
    }

    /// Fill what the settings leave out from the configuration.
    pub fn checked(mut self, config: &ConfigView) -> Self {
        if self.top.is_none() {
            self.top = config.top.clone();
        }
        self
    }
}

/// The part of the framework configuration the skeleton stage reads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigView {
    pub parts: Vec<PathBuf>,
    pub parameters: Vec<PathBuf>,
    pub top: Option<TopRef>,
    pub options: BuildOptions,
}
