//! CoolProp backend smoke tests.
//!
//! Broad tolerances avoid backend version issues while keeping values physical.

use bom_core::units::{k, pa};
use bom_materials::{
    BackendDescriptor, CoolPropBackend, MaterialBackend, MaterialRecord, MaterialSelector,
};

#[test]
fn water_density_at_300k() {
    let backend = CoolPropBackend::new();
    let record = MaterialRecord::new("Water").with_state(k(300.0), pa(101_325.0));
    let rho = backend.extract(&record, "density").unwrap();
    assert_eq!(rho.unit, "kg/m^3");
    assert!(rho.value > 900.0 && rho.value < 1100.0, "rho = {}", rho.value);
}

#[test]
fn helium_falls_back_from_table_to_coolprop() {
    let mut selector = MaterialSelector::new();
    let mut args = serde_json::Map::new();
    args.insert(
        "table".into(),
        serde_json::json!({"Helium": {"purity": 0.9999}}),
    );
    selector
        .add_backend(BackendDescriptor::new("table", args))
        .unwrap();
    selector
        .add_backend(BackendDescriptor::new("coolprop", serde_json::Map::new()))
        .unwrap();

    let mut bound = selector.select("Helium").unwrap();
    bound.record_mut().temperature = k(80.0);
    bound.record_mut().pressure = pa(8.0e6);

    let cp = bound.extract("specific_heat", &selector).unwrap();
    assert_eq!(cp.unit, "J/(kg*K)");
    assert!(cp.value > 4000.0 && cp.value < 8000.0, "cp = {}", cp.value);
}
