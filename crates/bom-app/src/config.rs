//! Framework configuration: where the catalogs live, the default top part,
//! parameter frame options, material priority order and output directories.
//!
//! The document is YAML or JSON:
//!
//! ```yaml
//! parts: {location: [parts.json]}
//! parameters: {location: [params.json]}
//! top: {ref: mycar, type: car}
//! restrict_param: false
//! default_param_type: PintFrame
//! materials:
//!   priority_order:
//!     - {class_str: [table], data: {path: materials.json}}
//! working_dir: out
//! ```

use std::path::{Path, PathBuf};

use bom_core::{Record, Value};
use bom_graph::{GraphOptions, NodeClasses};
use bom_materials::{BackendRegistry, MaterialSelector};
use bom_params::{FrameKind, FrameOptions};
use bom_skeleton::{BuildOptions, ConfigView, TopRef, deep_merge, load_document};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{AppError, AppResult};

const DEFAULT_PARAM_TYPE: &str = "PintFrame";

/// Files holding catalog entries, merged in order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Locations {
    #[serde(default)]
    pub location: Vec<PathBuf>,
}

/// The configuration document as written on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts: Option<Locations>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Locations>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<TopRef>,
    pub restrict_param: bool,
    pub default_param_type: String,
    /// Selector persisted form (current or legacy).
    pub materials: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Anything else, kept for round trips.
    #[serde(flatten)]
    pub extra: Record,
}

impl Default for ConfigDef {
    fn default() -> Self {
        Self {
            parts: None,
            parameters: None,
            top: None,
            restrict_param: false,
            default_param_type: DEFAULT_PARAM_TYPE.to_string(),
            materials: Value::Null,
            working_dir: None,
            temp_dir: None,
            plot_dir: None,
            data_dir: None,
            extra: Record::new(),
        }
    }
}

impl ConfigDef {
    /// Join relative catalog locations onto `base`.
    fn resolve_locations(&mut self, base: &Path) {
        for section in [self.parts.as_mut(), self.parameters.as_mut()]
            .into_iter()
            .flatten()
        {
            for location in &mut section.location {
                if location.is_relative() {
                    *location = base.join(&*location);
                }
            }
        }
    }
}

/// A validated configuration with its material selector built.
///
/// Passed explicitly to the [`Framework`](crate::Framework); there is no
/// process-wide configuration.
#[derive(Clone, Debug)]
pub struct Configuration {
    def: ConfigDef,
    materials: MaterialSelector,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            def: ConfigDef::default(),
            materials: MaterialSelector::new(),
        }
    }
}

impl Configuration {
    pub fn new(def: ConfigDef) -> AppResult<Self> {
        if FrameKind::from_class_str(&def.default_param_type).is_none() {
            return Err(AppError::InvalidConfiguration(format!(
                "unknown parameter frame type '{}'",
                def.default_param_type
            )));
        }
        let materials = if def.materials.is_null() {
            MaterialSelector::new()
        } else {
            MaterialSelector::from_value(&def.materials, BackendRegistry::with_builtins())?
        };
        Ok(Self { def, materials })
    }

    pub fn from_value(value: &Value) -> AppResult<Self> {
        let def: ConfigDef = serde_json::from_value(value.clone())
            .map_err(|e| AppError::InvalidConfiguration(e.to_string()))?;
        Self::new(def)
    }

    /// Load a configuration file. Relative catalog locations are taken from the
    /// file's directory.
    pub fn load(path: &Path) -> AppResult<Self> {
        Self::define(Some(path), &Value::Null)
    }

    /// Load an optional file and deep-merge `overrides` on top of it.
    pub fn define(path: Option<&Path>, overrides: &Value) -> AppResult<Self> {
        let mut document = match path {
            Some(path) => load_document(path).map_err(|source| AppError::ConfigFileRead {
                path: path.to_path_buf(),
                source,
            })?,
            None => Value::Object(Record::new()),
        };
        if !overrides.is_null() {
            deep_merge(&mut document, overrides);
        }
        let mut def: ConfigDef = serde_json::from_value(document)
            .map_err(|e| AppError::InvalidConfiguration(e.to_string()))?;
        if let Some(base) = path.and_then(Path::parent) {
            def.resolve_locations(base);
        }
        debug!(path = ?path, "loaded configuration");
        Self::new(def)
    }

    /// Deep-merge `changes` into the current document and revalidate.
    pub fn update(&mut self, changes: &Value) -> AppResult<()> {
        let mut document = self.to_value()?;
        deep_merge(&mut document, changes);
        *self = Self::from_value(&document)?;
        Ok(())
    }

    pub fn def(&self) -> &ConfigDef {
        &self.def
    }

    /// The document with the selector in its current persisted form.
    pub fn to_value(&self) -> AppResult<Value> {
        let mut value = serde_json::to_value(&self.def)?;
        if let Value::Object(record) = &mut value {
            record.insert("materials".to_string(), self.materials.to_value());
        }
        Ok(value)
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        let value = self.to_value()?;
        let content = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => serde_yaml::to_string(&value)?,
            _ => serde_json::to_string_pretty(&value)?,
        };
        std::fs::write(path, content).map_err(|source| AppError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parts(&self) -> AppResult<&[PathBuf]> {
        match &self.def.parts {
            Some(parts) => Ok(parts.location.as_slice()),
            None => Err(incomplete(
                "location of any files which contain parts to be assembled required as a list",
            )),
        }
    }

    pub fn parameters(&self) -> AppResult<&[PathBuf]> {
        match &self.def.parameters {
            Some(parameters) => Ok(parameters.location.as_slice()),
            None => Err(incomplete(
                "parameters with a location must be supplied to load from the configuration",
            )),
        }
    }

    pub fn top(&self) -> AppResult<&TopRef> {
        self.def
            .top
            .as_ref()
            .ok_or_else(|| incomplete("top reference and type required"))
    }

    pub fn set_top(&mut self, top: TopRef) {
        self.def.top = Some(top);
    }

    pub fn materials(&self) -> &MaterialSelector {
        &self.materials
    }

    pub fn set_materials(&mut self, selector: MaterialSelector) {
        self.def.materials = selector.to_value();
        self.materials = selector;
    }

    pub fn restrict_param(&self) -> bool {
        self.def.restrict_param
    }

    pub fn default_param_type(&self) -> &str {
        &self.def.default_param_type
    }

    pub fn frame_options(&self) -> FrameOptions {
        FrameOptions {
            kind: FrameKind::from_class_str(&self.def.default_param_type).unwrap_or_default(),
            restricted: self.def.restrict_param,
        }
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            default_param_class: self.def.default_param_type.clone(),
        }
    }

    pub fn graph_options(&self) -> GraphOptions {
        GraphOptions {
            frame: self.frame_options(),
            classes: NodeClasses::with_builtins(),
        }
    }

    /// What the skeleton stage reads. Missing catalog locations read as empty.
    pub fn config_view(&self) -> ConfigView {
        ConfigView {
            parts: self.def.parts.clone().unwrap_or_default().location,
            parameters: self.def.parameters.clone().unwrap_or_default().location,
            top: self.def.top.clone(),
            options: self.build_options(),
        }
    }

    /// Defaults to the process working directory.
    pub fn working_dir(&self) -> PathBuf {
        match &self.def.working_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.output_dir("temp_dir", self.def.temp_dir.as_ref())
    }

    pub fn plot_dir(&self) -> PathBuf {
        self.output_dir("plot_dir", self.def.plot_dir.as_ref())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.output_dir("data_dir", self.def.data_dir.as_ref())
    }

    fn output_dir(&self, name: &str, dir: Option<&PathBuf>) -> PathBuf {
        match dir {
            Some(dir) => dir.clone(),
            None => {
                warn!("{name} not supplied, defaulting to working_dir");
                self.working_dir()
            }
        }
    }
}

fn incomplete(what: &str) -> AppError {
    error!("{what}");
    AppError::ConfigurationIncomplete {
        what: what.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_configuration_is_incomplete() {
        let config = Configuration::default();
        assert!(matches!(
            config.parts(),
            Err(AppError::ConfigurationIncomplete { .. })
        ));
        assert!(matches!(
            config.top(),
            Err(AppError::ConfigurationIncomplete { .. })
        ));
        assert!(config.materials().is_empty());
        assert_eq!(config.frame_options(), FrameOptions::default());
    }

    #[test]
    fn output_dirs_default_to_working_dir() {
        let config = Configuration::from_value(&json!({
            "working_dir": "/tmp/bom",
            "plot_dir": "/tmp/plots"
        }))
        .unwrap();
        assert_eq!(config.temp_dir(), PathBuf::from("/tmp/bom"));
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/bom"));
        assert_eq!(config.plot_dir(), PathBuf::from("/tmp/plots"));
    }

    #[test]
    fn frame_options_follow_document() {
        let config = Configuration::from_value(&json!({
            "restrict_param": true,
            "default_param_type": "bom_analysis.parameters.ParameterFrame"
        }))
        .unwrap();
        assert_eq!(
            config.frame_options(),
            FrameOptions {
                kind: FrameKind::Flex,
                restricted: true
            }
        );
        assert_eq!(
            config.build_options().default_param_class,
            "bom_analysis.parameters.ParameterFrame"
        );
    }

    #[test]
    fn unknown_frame_type_is_rejected() {
        let err = Configuration::from_value(&json!({"default_param_type": "DataFrame"})).unwrap_err();
        assert!(matches!(err, AppError::InvalidConfiguration(_)));
    }

    #[test]
    fn legacy_material_order_is_read() {
        let config = Configuration::from_value(&json!({
            "materials": {
                "order": {"0": "inhouse"},
                "inhouse": {"class_str": ["table"], "table": {"Steel": {"density": 7800}}}
            }
        }))
        .unwrap();
        assert_eq!(config.materials().len(), 1);
        let value = config.to_value().unwrap();
        assert_eq!(
            value["materials"]["priority_order"][0]["class_str"],
            json!(["table"])
        );
    }

    #[test]
    fn update_merges_and_keeps_unknown_keys() {
        let mut config = Configuration::from_value(&json!({
            "top": {"ref": "mycar", "type": "car"},
            "login": {"username": "me"}
        }))
        .unwrap();
        config
            .update(&json!({"top": {"ref": "yourcar"}, "restrict_param": true}))
            .unwrap();
        assert_eq!(config.top().unwrap(), &TopRef::new("yourcar", "car"));
        assert!(config.restrict_param());
        assert_eq!(config.def().extra["login"], json!({"username": "me"}));
    }

    #[test]
    fn relative_locations_follow_the_file() {
        let dir = std::env::temp_dir().join("bom_app_config_locations");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yaml");
        std::fs::write(
            &path,
            "parts:\n  location: [parts.json, /abs/more.json]\nparameters:\n  location: []\n",
        )
        .unwrap();

        let config = Configuration::load(&path).unwrap();
        assert_eq!(
            config.parts().unwrap(),
            &[dir.join("parts.json"), PathBuf::from("/abs/more.json")]
        );
        assert!(config.parameters().unwrap().is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_names_the_path() {
        let path = Path::new("/definitely/not/here/config.json");
        match Configuration::load(path) {
            Err(AppError::ConfigFileRead { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected ConfigFileRead, got {other:?}"),
        }
    }
}
