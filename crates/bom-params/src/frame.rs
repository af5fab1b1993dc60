//! The parameter frame: a uniform table of parameter snapshots.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use bom_core::{Quantity, Record, Value};
use tracing::warn;

use crate::error::{ParamError, ParamResult};
use crate::parameter::{Parameter, UNIT, VALUE, VAR};

const FLEX_CLASS: &str = "ParameterFrame";
const UNIT_CHECKED_CLASS: &str = "PintFrame";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameKind {
    /// Values stored as given.
    Flex,
    /// Values carry a unit with a fixed dimension class.
    #[default]
    UnitChecked,
}

impl FrameKind {
    pub fn class_str(self) -> &'static str {
        match self {
            FrameKind::Flex => FLEX_CLASS,
            FrameKind::UnitChecked => UNIT_CHECKED_CLASS,
        }
    }

    /// Accepts bare names and dotted paths (`"bom_analysis.parameters.PintFrame"`).
    pub fn from_class_str(class_str: &str) -> Option<Self> {
        let name = class_str.rsplit('.').next().unwrap_or(class_str);
        match name {
            FLEX_CLASS => Some(FrameKind::Flex),
            UNIT_CHECKED_CLASS => Some(FrameKind::UnitChecked),
            _ => None,
        }
    }
}

/// Frame construction options, injected from the configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameOptions {
    pub kind: FrameKind,
    /// Forbid introducing unknown parameter names through `set`/`add_defaults`.
    pub restricted: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ParameterFrame {
    kind: FrameKind,
    restricted: bool,
    data: BTreeMap<String, Arc<Parameter>>,
    order: Vec<String>,
    /// Descriptive fields present on every parameter.
    extra_fields: BTreeSet<String>,
}

impl ParameterFrame {
    pub fn new(options: FrameOptions) -> Self {
        Self {
            kind: options.kind,
            restricted: options.restricted,
            ..Self::default()
        }
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    pub fn class_str(&self) -> &'static str {
        self.kind.class_str()
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    pub fn set_restricted(&mut self, restricted: bool) {
        self.restricted = restricted;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contains(&self, var: &str) -> bool {
        self.data.contains_key(var)
    }

    /// Parameter names in the order they were added.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Column names shared by every parameter: `var`, `value`, `unit` (unit-checked), extras.
    pub fn fields(&self) -> Vec<String> {
        let mut fields = vec![VAR.to_string(), VALUE.to_string()];
        if self.kind == FrameKind::UnitChecked {
            fields.push(UNIT.to_string());
        }
        fields.extend(self.extra_fields.iter().cloned());
        fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Parameter>> {
        self.order.iter().filter_map(|var| self.data.get(var))
    }

    fn missing(&self, var: &str) -> ParamError {
        ParamError::MissingParameter {
            var: var.to_string(),
            available: self.order.clone(),
        }
    }

    /// The bare value of a parameter.
    pub fn get(&self, var: &str) -> ParamResult<&Value> {
        self.data
            .get(var)
            .map(|param| &param.value)
            .ok_or_else(|| self.missing(var))
    }

    /// Any stored field of a parameter (`unit`, `source`, ...).
    pub fn get_field(&self, var: &str, field: &str) -> ParamResult<Value> {
        let param = self.data.get(var).ok_or_else(|| self.missing(var))?;
        param.field(field).ok_or_else(|| ParamError::MissingField {
            var: var.to_string(),
            field: field.to_string(),
        })
    }

    /// The current snapshot. Later replacements do not affect it.
    pub fn param(&self, var: &str) -> ParamResult<Arc<Parameter>> {
        self.data.get(var).cloned().ok_or_else(|| self.missing(var))
    }

    /// Numeric value with its unit, for unit-checked frames.
    pub fn quantity(&self, var: &str) -> ParamResult<Quantity> {
        let param = self.param(var)?;
        let value = param
            .value
            .as_f64()
            .ok_or_else(|| ParamError::InvalidParameter {
                what: format!("'{var}' is not numeric: {}", param.value),
            })?;
        let unit = param.unit.clone().unwrap_or_else(|| "dimensionless".to_string());
        Ok(Quantity::new(value, unit))
    }

    /// Add (or overwrite) a parameter from a `{var, value, ...}` record.
    ///
    /// This is the explicit way to declare a parameter and is allowed in
    /// restricted frames.
    pub fn add_parameter(&mut self, record: Record) -> ParamResult<Arc<Parameter>> {
        let param = Parameter::from_record(self.kind, record, None)?;
        Ok(self.insert(param))
    }

    /// Convenience wrapper around [`ParameterFrame::add_parameter`].
    pub fn add(
        &mut self,
        var: &str,
        value: impl Into<Value>,
        unit: Option<&str>,
    ) -> ParamResult<Arc<Parameter>> {
        let mut record = Record::new();
        record.insert(VAR.to_string(), Value::String(var.to_string()));
        record.insert(VALUE.to_string(), value.into());
        if let Some(unit) = unit {
            record.insert(UNIT.to_string(), Value::String(unit.to_string()));
        }
        self.add_parameter(record)
    }

    /// Set the value of a parameter.
    ///
    /// Existing parameters get a new snapshot (dimension class enforced). Unknown
    /// names are admitted unless the frame is restricted.
    pub fn set(&mut self, var: &str, value: impl Into<Value>) -> ParamResult<()> {
        let value = value.into();
        if self.contains(var) {
            let mut changes = Record::new();
            changes.insert(VALUE.to_string(), value);
            return self.update_parameter(var, changes);
        }
        if self.restricted {
            return Err(self.missing(var));
        }
        self.add(var, value, None)?;
        Ok(())
    }

    /// Replace any fields (except `var`) of an existing parameter.
    pub fn update_parameter(&mut self, var: &str, changes: Record) -> ParamResult<()> {
        let current = self.data.get(var).ok_or_else(|| self.missing(var))?;
        let next = current.replaced(self.kind, changes)?;
        self.insert(next);
        Ok(())
    }

    fn insert(&mut self, param: Parameter) -> Arc<Parameter> {
        let new_fields: Vec<String> = param
            .extra
            .keys()
            .filter(|field| !self.extra_fields.contains(*field))
            .cloned()
            .collect();
        for field in new_fields {
            for entry in self.data.values_mut() {
                if let Some(padded) = entry.padded(&field) {
                    *entry = Arc::new(padded);
                }
            }
            self.extra_fields.insert(field);
        }

        let mut param = param;
        for field in &self.extra_fields {
            param.extra.entry(field.clone()).or_insert(Value::Null);
        }

        let var = param.var.clone();
        if !self.data.contains_key(&var) {
            self.order.push(var.clone());
        }
        let param = Arc::new(param);
        self.data.insert(var, Arc::clone(&param));
        param
    }

    /// Merge default parameters into the frame.
    ///
    /// Accepts a skeleton record (`_params.data`), a template (`params.data`), a
    /// serialized frame (`data`) or a flat `var -> value | record` mapping. Known
    /// parameters are updated; unknown ones are added unless the frame is restricted.
    pub fn add_defaults(&mut self, data: &Value) -> ParamResult<()> {
        for record in parameter_records(data)? {
            let var = record
                .get(VAR)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if !self.contains(&var) && !self.restricted {
                self.add_parameter(record)?;
            } else {
                self.update_parameter(&var, record)?;
            }
        }
        Ok(())
    }

    /// `{class_str: [..], data: {var: {var, value, unit, ...}}}`.
    pub fn to_value(&self) -> Value {
        let mut data = Record::new();
        for param in self.iter() {
            data.insert(param.var.clone(), Value::Object(param.to_record_for(self.kind)));
        }
        let mut out = Record::new();
        out.insert(
            "class_str".to_string(),
            Value::Array(vec![Value::String(self.class_str().to_string())]),
        );
        out.insert("data".to_string(), Value::Object(data));
        Value::Object(out)
    }

    /// Rebuild a frame from [`ParameterFrame::to_value`] output.
    ///
    /// The recorded `class_str` overrides `options.kind`. Parameters listed in the
    /// document are declared even in restricted frames.
    pub fn from_value(value: &Value, options: FrameOptions) -> ParamResult<Self> {
        let kind = value
            .get("class_str")
            .and_then(class_str_kind)
            .unwrap_or(options.kind);
        let mut frame = Self::new(FrameOptions { kind, ..options });
        for record in parameter_records(value)? {
            frame.add_parameter(record)?;
        }
        Ok(frame)
    }
}

fn class_str_kind(value: &Value) -> Option<FrameKind> {
    match value {
        Value::String(s) => FrameKind::from_class_str(s),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .find_map(FrameKind::from_class_str),
        _ => None,
    }
}

/// Pull the parameter table out of the accepted layouts.
fn nested_data(data: &Value) -> &Value {
    if let Some(inner) = data.get("_params").and_then(|p| p.get("data"))
        && !inner.is_null()
    {
        return inner;
    }
    if let Some(inner) = data.get("params").and_then(|p| p.get("data"))
        && !inner.is_null()
    {
        return inner;
    }
    if let Some(inner) = data.get("data")
        && !inner.is_null()
    {
        return inner;
    }
    data
}

/// Normalise a parameter table into `{var, value, ...}` records.
fn parameter_records(data: &Value) -> ParamResult<Vec<Record>> {
    let table = match nested_data(data) {
        Value::Object(table) => table,
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(ParamError::InvalidParameter {
                what: format!("parameter table must be a mapping, got {other}"),
            });
        }
    };

    let mut records = Vec::with_capacity(table.len());
    for (key, entry) in table {
        let record = match entry {
            Value::Object(fields) => {
                let mut fields = fields.clone();
                match fields.get(VAR).and_then(Value::as_str) {
                    None => {
                        fields.insert(VAR.to_string(), Value::String(key.clone()));
                    }
                    Some(var) if var != key => {
                        warn!(
                            "supplied key in dictionary ({key}) not equal to supplied by value['var'] ({var})"
                        );
                    }
                    Some(_) => {}
                }
                fields
            }
            value => {
                let mut fields = Record::new();
                fields.insert(VAR.to_string(), Value::String(key.clone()));
                fields.insert(VALUE.to_string(), value.clone());
                fields
            }
        };
        records.push(record);
    }
    Ok(records)
}
