//! Settings-driven changes to an existing skeleton.

use std::path::PathBuf;

use bom_core::{Record, Value};
use bom_materials::MaterialSelector;
use tracing::{debug, error, info, warn};

use crate::builder::{
    BuildOptions, DATA, MATERIAL_FIELD, PARAMS_FIELD, PARAMS_NAME, add_bones, graft_params,
    inherit, move_material, names_of, spine,
};
use crate::catalog::{Catalog, ParameterSets, Skeleton};
use crate::document::load_and_merge;
use crate::merge::{deep_merge, merge_records};
use crate::settings::{ConfigView, ModuleDef, Section, Settings};
use crate::{SkeletonError, SkeletonResult};

/// Data the mutator draws from, loaded from settings and configuration locations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pools {
    /// Part templates by type (the catalog the spine is rebuilt from).
    pub parts: Catalog,
    pub parameters: ParameterSets,
    /// Reference -> default fields and parameters.
    pub defaults: Record,
    /// Named templates for non-part fields carrying `inherits`.
    pub storage: Catalog,
    /// Module name -> definition.
    pub modules: Record,
}

fn section_pool(section: &Section, also: &[PathBuf]) -> SkeletonResult<Record> {
    let mut paths = section.location.clone();
    paths.extend(also.iter().cloned());
    let mut pool = load_and_merge(&paths)?;
    merge_records(&mut pool, &section.inline);
    Ok(pool)
}

impl Pools {
    pub fn load(settings: &Settings, config: &ConfigView) -> SkeletonResult<Self> {
        let mut modules = load_and_merge(&settings.modules.location)?;
        merge_records(&mut modules, &settings.modules.definitions);
        Ok(Self {
            parts: Catalog::from_record(section_pool(&settings.parts, &config.parts)?)?,
            parameters: Catalog::from_record(section_pool(
                &settings.parameters,
                &config.parameters,
            )?)?,
            defaults: section_pool(&settings.defaults, &[])?,
            storage: Catalog::from_record(section_pool(&settings.storage, &[])?)?,
            modules,
        })
    }
}

/// Applies a settings document to a skeleton in place.
///
/// Order: part changes (and spine rebuild), inheritance and parameters, module
/// requirements, then per record defaults, other changes, material binding,
/// storage and parameters again.
#[derive(Debug)]
pub struct SkeletonMutator<'a> {
    settings: Settings,
    options: BuildOptions,
    pools: Pools,
    selector: Option<&'a MaterialSelector>,
}

impl<'a> SkeletonMutator<'a> {
    /// Load every pool the settings and configuration point at.
    pub fn new(
        settings: Settings,
        config: &ConfigView,
        selector: Option<&'a MaterialSelector>,
    ) -> SkeletonResult<Self> {
        let settings = settings.checked(config);
        let pools = Pools::load(&settings, config)?;
        Ok(Self::with_pools(settings, config, pools, selector))
    }

    pub fn with_pools(
        settings: Settings,
        config: &ConfigView,
        pools: Pools,
        selector: Option<&'a MaterialSelector>,
    ) -> Self {
        Self {
            settings: settings.checked(config),
            options: config.options.clone(),
            pools,
            selector,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn pools(&self) -> &Pools {
        &self.pools
    }

    pub fn apply(&mut self, skeleton: &mut Skeleton) -> SkeletonResult<()> {
        self.alter_parts(skeleton)?;
        if !self.settings.part_changes.is_empty() {
            warn!("rebuilding spine, all skeleton data will be wiped");
            self.rebuild_spine(skeleton)?;
        }
        add_bones(
            skeleton,
            &self.pools.parts,
            &self.pools.parameters,
            &self.options,
        )?;
        self.add_marrow(skeleton)?;
        info!(records = skeleton.len(), "applied settings to skeleton");
        Ok(())
    }

    /// Merge each part change into the template of that part's current type.
    fn alter_parts(&mut self, skeleton: &Skeleton) -> SkeletonResult<()> {
        for (reference, patch) in &self.settings.part_changes {
            let Value::Object(patch) = patch else {
                return Err(SkeletonError::InvalidDocument {
                    what: format!("part change for '{reference}' must be a mapping"),
                });
            };
            let Some(kind) = skeleton.type_of(reference) else {
                debug!(reference, "part change for a reference not in the skeleton");
                continue;
            };
            match self.pools.parts.get_mut(kind) {
                Some(template) => merge_records(template, patch),
                None => debug!(reference, kind, "part change for a type not in the parts pool"),
            }
        }
        Ok(())
    }

    fn rebuild_spine(&self, skeleton: &mut Skeleton) -> SkeletonResult<()> {
        let top = self
            .settings
            .top
            .as_ref()
            .ok_or_else(|| SkeletonError::ConfigurationIncomplete {
                what: "a top reference is needed to rebuild the spine".to_string(),
            })?;
        let kind = match &top.kind {
            Some(kind) => kind.clone(),
            None => skeleton
                .type_of(&top.reference)
                .map(str::to_string)
                .ok_or_else(|| SkeletonError::ConfigurationIncomplete {
                    what: format!("top '{}' has no type and is not in the skeleton", top.reference),
                })?,
        };
        skeleton.clear();
        spine(skeleton, &top.reference, &kind, &self.pools.parts)
    }

    fn add_marrow(&self, skeleton: &mut Skeleton) -> SkeletonResult<()> {
        self.load_module_requirements(skeleton)?;
        for (reference, record) in skeleton.iter_mut() {
            load_defaults(reference, record, &self.pools.defaults);
            if let Some(change) = self.settings.other_changes.get(reference.as_str()) {
                let Value::Object(change) = change else {
                    return Err(SkeletonError::InvalidDocument {
                        what: format!("other change for '{reference}' must be a mapping"),
                    });
                };
                merge_records(record, change);
            }
            move_material(reference, record)?;
            self.bind_material(reference, record)?;
            load_storage(record, &self.pools.storage)?;
            graft_params(reference, record, &self.pools.parameters, &self.options)?;
        }
        Ok(())
    }

    fn load_module_requirements(&self, skeleton: &mut Skeleton) -> SkeletonResult<()> {
        if self.pools.modules.is_empty() {
            return Ok(());
        }
        for name in self.settings.modules.ordered()? {
            let definition = self.pools.modules.get(name).ok_or_else(|| {
                SkeletonError::ConfigurationIncomplete {
                    what: format!("module '{name}' is ordered but not defined"),
                }
            })?;
            let module = ModuleDef::from_value(name, definition)?;
            for (reference, change) in &module.requirements {
                let Some(record) = skeleton.get_mut(reference) else {
                    let err = SkeletonError::ModuleRequirementMissing {
                        module: name.to_string(),
                        reference: reference.clone(),
                    };
                    error!("{err}");
                    return Err(err);
                };
                if let Value::Object(change) = change {
                    merge_records(record, change);
                }
            }
        }
        Ok(())
    }

    /// Resolve a bare material name to the backend that holds it.
    ///
    /// The selector's result is the base; the record's own fields go on top.
    fn bind_material(&self, reference: &str, record: &mut Record) -> SkeletonResult<()> {
        let Some(selector) = self.selector else {
            return Ok(());
        };
        let Some(Value::Object(material)) = record.get_mut(MATERIAL_FIELD) else {
            return Ok(());
        };
        if material.contains_key("backend") {
            return Ok(());
        }
        let Some(name) = material.get("name").and_then(Value::as_str) else {
            return Ok(());
        };

        let bound = selector.select(name)?;
        let mut base = Record::new();
        base.insert("name".to_string(), Value::String(name.to_string()));
        if let Some(descriptor) = &bound.record().backend {
            base.insert("backend".to_string(), descriptor.to_value());
        }
        debug!(reference, material = name, backend = bound.backend_kind(), "bound material");
        merge_records(&mut base, material);
        *material = base;
        Ok(())
    }
}

fn is_unset(parameter: &Value) -> bool {
    match parameter {
        Value::Null => true,
        Value::Object(parameter) => parameter.get("value").is_none_or(Value::is_null),
        _ => false,
    }
}

/// Merge literal defaults, and fill parameters whose value is still null.
fn load_defaults(reference: &str, record: &mut Record, defaults: &Record) {
    let Some(Value::Object(default)) = defaults.get(reference) else {
        return;
    };
    let mut literal = default.clone();
    let params = literal.remove(PARAMS_FIELD);
    merge_records(record, &literal);

    let Some(Value::Object(incoming)) = params.as_ref().and_then(|p| p.get(DATA)) else {
        return;
    };
    let Some(Value::Object(current)) = record
        .get_mut(PARAMS_FIELD)
        .and_then(|params| params.get_mut(DATA))
    else {
        return;
    };
    for (var, value) in incoming {
        match current.get_mut(var) {
            Some(existing) if is_unset(existing) => deep_merge(existing, value),
            Some(_) => debug!(reference, var, "parameter already set, default skipped"),
            None => {}
        }
    }
}

/// Resolve `inherits` on every mapping field against the storage pool.
///
/// `params_name` found inside those fields moves up to the record.
fn load_storage(record: &mut Record, storage: &Catalog) -> SkeletonResult<()> {
    let mut names = match record.remove(PARAMS_NAME) {
        Some(own) => names_of(&own, PARAMS_NAME)?,
        None => Vec::new(),
    };
    for value in record.values_mut() {
        let Value::Object(field) = value else {
            continue;
        };
        inherit(field, storage)?;
        if let Some(nested) = field.remove(PARAMS_NAME) {
            names.extend(names_of(&nested, PARAMS_NAME)?);
        }
    }
    if !names.is_empty() {
        record.insert(
            PARAMS_NAME.to_string(),
            Value::Array(names.into_iter().map(Value::String).collect()),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn defaults_fill_only_null_parameters() {
        let mut record = rec(json!({
            "colour": "red",
            "_params": {"data": {
                "mass": {"var": "mass", "value": null, "unit": "kg"},
                "length": {"var": "length", "value": 2.0, "unit": "m"},
                "width": null
            }}
        }));
        let defaults = rec(json!({"part": {
            "colour": "blue",
            "_params": {"data": {
                "mass": {"value": 10},
                "length": {"value": 5.0},
                "width": {"var": "width", "value": 1.0, "unit": "m"},
                "height": {"var": "height", "value": 3.0}
            }}
        }}));
        load_defaults("part", &mut record, &defaults);

        let data = &record["_params"]["data"];
        assert_eq!(record["colour"], json!("blue"));
        assert_eq!(data["mass"], json!({"var": "mass", "value": 10, "unit": "kg"}));
        assert_eq!(data["length"]["value"], json!(2.0));
        assert_eq!(data["width"]["value"], json!(1.0));
        assert!(data.get("height").is_none());
    }

    #[test]
    fn storage_inherits_and_hoists_params_name() {
        let storage = Catalog::from_value(&json!({
            "thermal_store": {"class_str": ["Storage"], "params_name": ["thermal"]}
        }))
        .unwrap();
        let mut record = rec(json!({
            "params_name": ["own"],
            "thermal": {"inherits": ["thermal_store"], "note": "x"}
        }));
        load_storage(&mut record, &storage).unwrap();
        assert_eq!(record["params_name"], json!(["own", "thermal"]));
        assert_eq!(
            record["thermal"],
            json!({"class_str": ["Storage"], "note": "x", "inherited": ["thermal_store"]})
        );
    }
}
