//! Material records: a material name and the state it is used at.

use bom_core::units::{Pressure, Temperature, k, pa};
use bom_core::{Record, Value, parse_quantity, parse_unit};
use serde::{Deserialize, Serialize};

use crate::backend::BackendDescriptor;
use crate::error::{MaterialError, MaterialResult};

pub const DEFAULT_TEMPERATURE_K: f64 = 293.0;
pub const DEFAULT_PRESSURE_PA: f64 = 100_000.0;

/// A named material at a thermodynamic state.
///
/// Temperature and pressure serialize as SI numbers (K, Pa) and also accept
/// strings with units (`"20 degC"`, `"1 bar"`). Irradiation is in dpa.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    #[serde(alias = "mat", default)]
    pub name: String,

    #[serde(with = "temperature_serde", default = "default_temperature")]
    pub temperature: Temperature,

    #[serde(with = "pressure_serde", default = "default_pressure")]
    pub pressure: Pressure,

    #[serde(with = "dpa_serde", default)]
    pub irradiation: f64,

    /// The backend this record was bound to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendDescriptor>,

    /// Any other descriptive fields.
    #[serde(flatten)]
    pub extra: Record,
}

fn default_temperature() -> Temperature {
    k(DEFAULT_TEMPERATURE_K)
}

fn default_pressure() -> Pressure {
    pa(DEFAULT_PRESSURE_PA)
}

impl Default for MaterialRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            temperature: default_temperature(),
            pressure: default_pressure(),
            irradiation: 0.0,
            backend: None,
            extra: Record::new(),
        }
    }
}

impl MaterialRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, temperature: Temperature, pressure: Pressure) -> Self {
        self.temperature = temperature;
        self.pressure = pressure;
        self
    }

    pub fn temperature_k(&self) -> f64 {
        self.temperature.value
    }

    pub fn pressure_pa(&self) -> f64 {
        self.pressure.value
    }

    /// Copy temperature, pressure and irradiation from another record.
    pub fn copy_state_from(&mut self, other: &MaterialRecord) {
        self.temperature = other.temperature;
        self.pressure = other.pressure;
        self.irradiation = other.irradiation;
    }

    pub fn from_value(value: &Value) -> MaterialResult<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn to_value(&self) -> MaterialResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Convert a number (already SI) or a quantity string into SI in `expected_si` units.
fn to_si(raw: NumberOrText, expected_si: &str) -> MaterialResult<f64> {
    match raw {
        NumberOrText::Number(v) => Ok(v),
        NumberOrText::Text(text) => {
            let invalid = |e: bom_core::UnitError| MaterialError::InvalidRecord {
                what: e.to_string(),
            };
            let quantity = parse_quantity(&text).map_err(invalid)?;
            let target = parse_unit(expected_si).map_err(invalid)?;
            if quantity.dimension().map_err(invalid)? != target.dimension {
                return Err(MaterialError::InvalidRecord {
                    what: format!("'{text}' is not convertible to {expected_si}"),
                });
            }
            quantity.si_value().map_err(invalid)
        }
    }
}

mod temperature_serde {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &Temperature, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(t.value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Temperature, D::Error> {
        let raw = NumberOrText::deserialize(d)?;
        to_si(raw, "K").map(k).map_err(serde::de::Error::custom)
    }
}

mod pressure_serde {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(p: &Pressure, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(p.value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Pressure, D::Error> {
        let raw = NumberOrText::deserialize(d)?;
        to_si(raw, "Pa").map(pa).map_err(serde::de::Error::custom)
    }
}

mod dpa_serde {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(*v)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        let raw = NumberOrText::deserialize(d)?;
        to_si(raw, "dpa").map_err(serde::de::Error::custom)
    }
}
