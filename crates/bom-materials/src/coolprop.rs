//! CoolProp-based backend for pure fluids.

use std::collections::BTreeMap;

use bom_core::{Quantity, Record, Value};
use rfluids::prelude::*;
use rfluids::substance::Pure;

use crate::backend::MaterialBackend;
use crate::error::{MaterialError, MaterialResult};
use crate::record::MaterialRecord;

/// Known fluids by lower-case name or formula.
const FLUIDS: &[(&[&str], Pure)] = &[
    (&["water", "h2o"], Pure::Water),
    (&["nitrogen", "n2"], Pure::Nitrogen),
    (&["oxygen", "o2"], Pure::Oxygen),
    (&["air"], Pure::Air),
    (&["hydrogen", "h2"], Pure::Hydrogen),
    (&["helium", "he"], Pure::Helium),
    (&["argon", "ar"], Pure::Argon),
    (&["neon", "ne"], Pure::Neon),
    (&["methane", "ch4"], Pure::Methane),
    (&["carbondioxide", "carbon dioxide", "co2"], Pure::CarbonDioxide),
    (&["carbonmonoxide", "carbon monoxide", "co"], Pure::CarbonMonoxide),
    (&["ammonia", "nh3"], Pure::Ammonia),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Property {
    Density,
    Enthalpy,
    Entropy,
    SpecificHeat,
    SoundSpeed,
}

impl Property {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "density" | "D" | "Dmass" | "rho" => Some(Property::Density),
            "enthalpy" | "H" | "Hmass" => Some(Property::Enthalpy),
            "entropy" | "S" | "Smass" => Some(Property::Entropy),
            "specific_heat" | "cp" | "C" | "Cpmass" => Some(Property::SpecificHeat),
            "sound_speed" | "speed_of_sound" | "A" => Some(Property::SoundSpeed),
            _ => None,
        }
    }

    fn unit(self) -> &'static str {
        match self {
            Property::Density => "kg/m^3",
            Property::Enthalpy => "J/kg",
            Property::Entropy | Property::SpecificHeat => "J/(kg*K)",
            Property::SoundSpeed => "m/s",
        }
    }
}

/// Pure-fluid properties at the record's temperature and pressure.
///
/// Optional argument `aliases` maps material names onto CoolProp fluid names.
#[derive(Clone, Debug, Default)]
pub struct CoolPropBackend {
    aliases: BTreeMap<String, String>,
}

impl CoolPropBackend {
    pub const KIND: &'static str = "coolprop";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_args(args: &Record) -> MaterialResult<Self> {
        let mut backend = Self::new();
        match args.get("aliases") {
            None => {}
            Some(Value::Object(aliases)) => {
                for (name, fluid) in aliases {
                    let fluid = fluid.as_str().ok_or_else(|| MaterialError::InvalidArgs {
                        backend: Self::KIND.to_string(),
                        what: format!("alias '{name}' must map to a string"),
                    })?;
                    backend.aliases.insert(name.clone(), fluid.to_string());
                }
            }
            Some(_) => {
                return Err(MaterialError::InvalidArgs {
                    backend: Self::KIND.to_string(),
                    what: "'aliases' must be a mapping".to_string(),
                });
            }
        }
        Ok(backend)
    }

    fn pure(&self, material: &str) -> Option<Pure> {
        let name = self
            .aliases
            .get(material)
            .map(String::as_str)
            .unwrap_or(material)
            .to_ascii_lowercase();
        FLUIDS
            .iter()
            .find(|(names, _)| names.contains(&name.as_str()))
            .map(|(_, pure)| *pure)
    }

    /// Create a Fluid instance at given P,T state.
    fn fluid_at_pt(&self, pure: Pure, p_pa: f64, t_k: f64) -> MaterialResult<Fluid> {
        Fluid::from(pure)
            .in_state(FluidInput::pressure(p_pa), FluidInput::temperature(t_k))
            .map_err(|e| MaterialError::Backend {
                message: format!("rfluids error at P={} Pa, T={} K: {}", p_pa, t_k, e),
            })
    }
}

impl MaterialBackend for CoolPropBackend {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn contains(&self, material: &str) -> bool {
        self.pure(material).is_some()
    }

    fn extract(&self, record: &MaterialRecord, property: &str) -> MaterialResult<Quantity> {
        let absent = |reason: String| MaterialError::DataAbsent {
            material: record.name.clone(),
            property: property.to_string(),
            backend: Self::KIND.to_string(),
            reason,
        };

        let pure = self
            .pure(&record.name)
            .ok_or_else(|| absent("not a CoolProp fluid".to_string()))?;
        let kind =
            Property::parse(property).ok_or_else(|| absent("unsupported property".to_string()))?;

        let mut fluid = self.fluid_at_pt(pure, record.pressure_pa(), record.temperature_k())?;
        let value = match kind {
            Property::Density => fluid.density(),
            Property::Enthalpy => fluid.enthalpy(),
            Property::Entropy => fluid.entropy(),
            Property::SpecificHeat => fluid.specific_heat(),
            Property::SoundSpeed => fluid.sound_speed(),
        }
        .map_err(|e| absent(format!("rfluids error getting {property}: {e}")))?;

        if !value.is_finite() {
            return Err(absent(format!("non-finite {property}")));
        }
        Ok(Quantity::new(value, kind.unit()))
    }
}
