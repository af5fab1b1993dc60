//! Property table backend.
//!
//! A table is a JSON object keyed by material, each holding `property -> value`,
//! plus an optional `units` column (`property -> unit`):
//!
//! ```json
//! {
//!   "Steel":    {"density": 7800, "youngs_modulus": 200},
//!   "Tungsten": {"density": 19300},
//!   "units":    {"density": "kg/m^3", "youngs_modulus": "GPa"}
//! }
//! ```
//!
//! Arguments: `table` (inline) or `path` (JSON file), and optional `aliases`
//! (`name -> column name`) applied to both materials and properties.

use std::collections::BTreeMap;
use std::path::Path;

use bom_core::{Quantity, Record, Value, parse_quantity, parse_unit};
use tracing::debug;

use crate::backend::MaterialBackend;
use crate::error::{MaterialError, MaterialResult};
use crate::record::MaterialRecord;

const UNITS_COLUMN: &str = "units";

#[derive(Clone, Debug, Default)]
pub struct TableBackend {
    materials: BTreeMap<String, Record>,
    units: BTreeMap<String, String>,
    aliases: BTreeMap<String, String>,
}

impl TableBackend {
    pub const KIND: &'static str = "table";

    /// Build from a table document (see module docs).
    pub fn from_table(table: &Record) -> MaterialResult<Self> {
        let mut backend = Self::default();
        for (column, entries) in table {
            let Value::Object(entries) = entries else {
                return Err(MaterialError::InvalidArgs {
                    backend: Self::KIND.to_string(),
                    what: format!("column '{column}' must be a mapping"),
                });
            };
            if column == UNITS_COLUMN {
                for (property, unit) in entries {
                    if let Some(unit) = unit.as_str() {
                        backend.units.insert(property.clone(), unit.to_string());
                    }
                }
            } else {
                backend.materials.insert(column.clone(), entries.clone());
            }
        }
        Ok(backend)
    }

    pub fn from_path(path: &Path) -> MaterialResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let table: Record = serde_json::from_str(&content)?;
        debug!(path = %path.display(), materials = table.len(), "loaded material table");
        Self::from_table(&table)
    }

    pub fn from_args(args: &Record) -> MaterialResult<Self> {
        let invalid = |what: &str| MaterialError::InvalidArgs {
            backend: Self::KIND.to_string(),
            what: what.to_string(),
        };

        let mut backend = match (args.get("table"), args.get("path")) {
            (Some(Value::Object(table)), _) => Self::from_table(table)?,
            (Some(_), _) => return Err(invalid("'table' must be a mapping")),
            (None, Some(Value::String(path))) => Self::from_path(Path::new(path))?,
            (None, Some(_)) => return Err(invalid("'path' must be a string")),
            (None, None) => return Err(invalid("table backend must be supplied a 'table' or 'path'")),
        };

        if let Some(aliases) = args.get("aliases") {
            let Value::Object(aliases) = aliases else {
                return Err(invalid("'aliases' must be a mapping"));
            };
            for (name, translated) in aliases {
                let translated = translated
                    .as_str()
                    .ok_or_else(|| invalid("alias targets must be strings"))?;
                backend.aliases.insert(name.clone(), translated.to_string());
            }
        }
        Ok(backend)
    }

    pub fn with_alias(mut self, name: impl Into<String>, column: impl Into<String>) -> Self {
        self.aliases.insert(name.into(), column.into());
        self
    }

    fn translate<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn materials(&self) -> impl Iterator<Item = &str> {
        self.materials.keys().map(String::as_str)
    }
}

impl MaterialBackend for TableBackend {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn contains(&self, material: &str) -> bool {
        self.materials.contains_key(self.translate(material))
    }

    fn extract(&self, record: &MaterialRecord, property: &str) -> MaterialResult<Quantity> {
        let absent = |reason: &str| MaterialError::DataAbsent {
            material: record.name.clone(),
            property: property.to_string(),
            backend: Self::KIND.to_string(),
            reason: reason.to_string(),
        };

        let column = self
            .materials
            .get(self.translate(&record.name))
            .ok_or_else(|| absent("material not in table"))?;
        let key = self.translate(property);
        let unit = self
            .units
            .get(key)
            .cloned()
            .unwrap_or_else(|| "dimensionless".to_string());

        match column.get(key) {
            None | Some(Value::Null) => Err(absent("no entry")),
            Some(Value::Number(n)) => {
                let value = n.as_f64().ok_or_else(|| absent("not a finite number"))?;
                parse_unit(&unit).map_err(|e| MaterialError::Backend {
                    message: e.to_string(),
                })?;
                Ok(Quantity::new(value, unit))
            }
            Some(Value::String(text)) => parse_quantity(text).map_err(|e| absent(&e.to_string())),
            Some(_) => Err(absent("entry is not a number")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn steel_table() -> Record {
        json!({
            "Steel": {"density": 7800, "conductivity": "45 W/(m*K)", "poisson": null},
            "units": {"density": "kg/m^3"}
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn extract_with_units_column() {
        let backend = TableBackend::from_table(&steel_table()).unwrap();
        let record = MaterialRecord::new("Steel");
        assert!(backend.contains("Steel"));
        assert!(!backend.contains("units"));
        let rho = backend.extract(&record, "density").unwrap();
        assert_eq!(rho, Quantity::new(7800.0, "kg/m^3"));
        let k = backend.extract(&record, "conductivity").unwrap();
        assert_eq!(k.unit, "W/(m*K)");
    }

    #[test]
    fn missing_entries_are_absent() {
        let backend = TableBackend::from_table(&steel_table()).unwrap();
        let record = MaterialRecord::new("Steel");
        for property in ["poisson", "melting_point"] {
            assert!(matches!(
                backend.extract(&record, property),
                Err(MaterialError::DataAbsent { .. })
            ));
        }
    }

    #[test]
    fn aliases_translate_names() {
        let backend = TableBackend::from_table(&steel_table())
            .unwrap()
            .with_alias("SS316", "Steel")
            .with_alias("rho", "density");
        assert!(backend.contains("SS316"));
        let rho = backend.extract(&MaterialRecord::new("SS316"), "rho").unwrap();
        assert_eq!(rho.value, 7800.0);
    }

    #[test]
    fn args_need_a_source() {
        let err = TableBackend::from_args(&Record::new()).unwrap_err();
        assert!(matches!(err, MaterialError::InvalidArgs { .. }));
    }

    #[test]
    fn load_from_json_file() {
        let path = std::env::temp_dir().join("bom_materials_table_test.json");
        std::fs::write(&path, serde_json::to_string(&steel_table()).unwrap()).unwrap();

        let mut args = Record::new();
        args.insert("path".into(), json!(path.to_string_lossy()));
        let backend = TableBackend::from_args(&args).unwrap();
        assert_eq!(backend.materials().collect::<Vec<_>>(), vec!["Steel"]);

        let _ = std::fs::remove_file(&path);
    }
}
