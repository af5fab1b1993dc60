//! Immutable parameter snapshots.

use std::collections::BTreeMap;

use bom_core::{Record, UnitError, Value, parse_quantity, parse_unit};

use crate::error::{ParamError, ParamResult};
use crate::frame::FrameKind;

pub const VAR: &str = "var";
pub const VALUE: &str = "value";
pub const UNIT: &str = "unit";

/// One named value plus descriptive fields (name, source, description, ...).
///
/// Snapshots are never mutated; frames swap in a new `Arc<Parameter>` on every change.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub var: String,
    pub value: Value,
    /// Unit string. Always `None` in flex frames, where "unit" is a plain field.
    pub unit: Option<String>,
    pub extra: BTreeMap<String, Value>,
}

impl Parameter {
    /// Build a snapshot from a `{var, value, unit, ...}` record.
    ///
    /// In unit-checked frames the value is normalised: `"1.5 m"` is split into
    /// magnitude and unit, text that is not a quantity is kept as text, and a bare
    /// number takes the supplied unit or `dimensionless`. When `previous` is given
    /// the unit's dimension class must match it.
    pub fn from_record(
        kind: FrameKind,
        record: Record,
        previous: Option<&Parameter>,
    ) -> ParamResult<Self> {
        let mut record = record;
        for value in record.values_mut() {
            if value.as_str() == Some("None") {
                *value = Value::Null;
            }
        }

        let var = match record.remove(VAR) {
            Some(Value::String(var)) => var,
            other => {
                return Err(ParamError::InvalidParameter {
                    what: format!("parameter record needs a string 'var', got {other:?}"),
                });
            }
        };
        let value = record.remove(VALUE).unwrap_or(Value::Null);

        match kind {
            FrameKind::Flex => Ok(Self {
                var,
                value,
                unit: None,
                extra: record.into_iter().collect(),
            }),
            FrameKind::UnitChecked => {
                let unit = match record.remove(UNIT) {
                    Some(Value::String(unit)) => Some(unit),
                    Some(Value::Null) | None => None,
                    Some(other) => {
                        return Err(ParamError::InvalidParameter {
                            what: format!("unit of '{var}' must be a string, got {other}"),
                        });
                    }
                };
                let (value, unit, checked) = normalise_quantity(&var, value, unit)?;
                if checked && let Some(previous) = previous {
                    check_dimensionality(&var, previous.unit.as_deref(), unit.as_deref())?;
                }
                Ok(Self {
                    var,
                    value,
                    unit,
                    extra: record.into_iter().collect(),
                })
            }
        }
    }

    /// A new snapshot with `changes` applied on top of this one.
    pub fn replaced(&self, kind: FrameKind, changes: Record) -> ParamResult<Self> {
        let mut record = self.to_record();
        for (key, value) in changes {
            if key == VAR {
                continue;
            }
            record.insert(key, value);
        }
        Self::from_record(kind, record, Some(self))
    }

    /// Look up any stored field, including `var`, `value` and `unit`.
    pub fn field(&self, field: &str) -> Option<Value> {
        match field {
            VAR => Some(Value::String(self.var.clone())),
            VALUE => Some(self.value.clone()),
            UNIT if self.unit.is_some() => self.unit.clone().map(Value::String),
            other => self.extra.get(other).cloned(),
        }
    }

    /// The `{var, value, unit, ...}` record form. Unit is emitted in unit-checked frames only.
    pub fn to_record_for(&self, kind: FrameKind) -> Record {
        let mut record = Record::new();
        record.insert(VAR.to_string(), Value::String(self.var.clone()));
        record.insert(VALUE.to_string(), self.value.clone());
        if kind == FrameKind::UnitChecked {
            record.insert(
                UNIT.to_string(),
                self.unit.clone().map(Value::String).unwrap_or(Value::Null),
            );
        }
        for (key, value) in &self.extra {
            record.insert(key.clone(), value.clone());
        }
        record
    }

    fn to_record(&self) -> Record {
        let mut record = self.to_record_for(FrameKind::Flex);
        if let Some(unit) = &self.unit {
            record.insert(UNIT.to_string(), Value::String(unit.clone()));
        }
        record
    }

    /// Same snapshot with `field` added as null, if it is missing.
    pub(crate) fn padded(&self, field: &str) -> Option<Self> {
        if self.extra.contains_key(field) {
            return None;
        }
        let mut next = self.clone();
        next.extra.insert(field.to_string(), Value::Null);
        Some(next)
    }
}

/// Returns `(value, unit, dimension_checked)`.
fn normalise_quantity(
    var: &str,
    value: Value,
    unit: Option<String>,
) -> ParamResult<(Value, Option<String>, bool)> {
    let unknown = |source: UnitError| ParamError::UnknownUnit {
        var: var.to_string(),
        source,
    };

    match value {
        Value::Null => Ok((Value::Null, unit, false)),
        Value::String(text) => match parse_quantity(&text) {
            Ok(quantity) => Ok((Value::from(quantity.value), Some(quantity.unit), true)),
            Err(UnitError::Parse { .. } | UnitError::UnknownUnit { .. }) => Ok((
                Value::String(text),
                Some(unit.unwrap_or_else(|| "dimensionless".to_string())),
                false,
            )),
            Err(err) => Err(unknown(err)),
        },
        other => {
            let unit = unit.unwrap_or_else(|| "dimensionless".to_string());
            parse_unit(&unit).map_err(unknown)?;
            Ok((other, Some(unit), true))
        }
    }
}

fn check_dimensionality(var: &str, from: Option<&str>, to: Option<&str>) -> ParamResult<()> {
    let (Some(from), Some(to)) = (from, to) else {
        return Ok(());
    };
    let unknown = |source: UnitError| ParamError::UnknownUnit {
        var: var.to_string(),
        source,
    };
    let old = parse_unit(from).map_err(unknown)?;
    let new = parse_unit(to).map_err(unknown)?;
    if old.dimension != new.dimension {
        return Err(ParamError::DimensionalityViolation {
            var: var.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    Ok(())
}
