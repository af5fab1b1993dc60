use bom_graph::{Bom, GraphError, NodeKind};
use bom_skeleton::{BuildOptions, Catalog, Skeleton, build_skeleton};
use proptest::prelude::*;
use serde_json::json;

fn built_car() -> Skeleton {
    let parts = Catalog::from_value(&json!({
        "car": {"children": {
            "engine": {"type": "engine"},
            "front_axle": {"type": "axle"},
            "rear_axle": {"type": "axle"}
        }},
        "engine": {
            "children": {"piston": {"type": "piston", "count": 4}},
            "params": {"data": {"power": {"var": "power", "value": 90, "unit": "kW"}}}
        },
        "axle": {"children": {"wheel_bolt": {"type": "bolt", "count": 10}}},
        "piston": {"material": {"name": "Aluminium", "temperature": 450.0}},
        "bolt": {"assignment": ["fasteners"]}
    }))
    .unwrap();
    build_skeleton("mycar", "car", &parts, &Catalog::new(), &BuildOptions::default()).unwrap()
}

#[test]
fn skeleton_round_trip_is_stable() {
    let mut bom = Bom::default();
    let car = bom.from_skeleton(&built_car(), "mycar").unwrap();
    let first = bom.to_skeleton(car).unwrap();

    let mut again = Bom::default();
    let rebuilt = again.from_skeleton(&first, "mycar").unwrap();
    let second = again.to_skeleton(rebuilt).unwrap();
    assert_eq!(first, second);

    let axle = first.get("front_axle").unwrap();
    assert_eq!(axle["children"], json!({"wheel_bolt": {"type": "bolt", "count": 10}}));
    assert_eq!(first.get("wheel_bolt").unwrap()["assignment"], json!(["fasteners"]));
}

#[test]
fn skeleton_file_round_trip() {
    let mut bom = Bom::default();
    let car = bom.from_skeleton(&built_car(), "mycar").unwrap();
    let skeleton = bom.to_skeleton(car).unwrap();
    let path = std::env::temp_dir().join("bom_graph_round_trip.json");
    skeleton.save(&path).unwrap();
    assert_eq!(Skeleton::load(&path).unwrap(), skeleton);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn shared_parts_keep_identity() {
    let mut bom = Bom::default();
    let car = bom.from_skeleton(&built_car(), "mycar").unwrap();
    let front = bom.component_from_path(car, "front_axle.wheel_bolt").unwrap();
    let rear = bom.component_from_path(car, "mycar.rear_axle.wheel_bolt").unwrap();
    assert_eq!(front, rear);
    assert_eq!(bom.registry(car).unwrap().len(), 6);
    assert_eq!(bom.node(car).unwrap().kind(), NodeKind::Assembly);
}

#[test]
fn copies_are_independent() {
    let mut bom = Bom::default();
    let car = bom.from_skeleton(&built_car(), "mycar").unwrap();
    let engine = bom.resolve(car, "engine").unwrap().unwrap();
    let copy = bom.copy_part(engine).unwrap();
    assert_ne!(copy, engine);
    assert_eq!(bom.registry(copy).unwrap().len(), 2);

    bom.node_mut(copy)
        .unwrap()
        .params_mut()
        .set("power", json!(120))
        .unwrap();
    assert_eq!(bom.node(engine).unwrap().params().get("power").unwrap(), &json!(90));

    // the copy uses the same references, so it cannot join the original graph
    assert!(matches!(
        bom.attach(car, copy, None),
        Err(GraphError::DuplicateReference { .. })
    ));
}

#[test]
fn hierarchy_of_built_car() {
    let mut bom = Bom::default();
    let car = bom.from_skeleton(&built_car(), "mycar").unwrap();
    let expected = "\
mycar
├── engine
│   └── piston x4
├── front_axle
│   └── wheel_bolt x10
└── rear_axle
    └── wheel_bolt x10
";
    assert_eq!(bom.hierarchy(car).unwrap(), expected);
}

proptest! {
    /// After any sequence of attaches and detaches, every registry equals the set
    /// of references connected to its nodes.
    #[test]
    fn registry_matches_reachable(ops in prop::collection::vec((0usize..4, 0usize..6, any::<bool>()), 0..40)) {
        let mut bom = Bom::default();
        let assemblies: Vec<_> = (0..4).map(|i| bom.add_assembly(format!("a{i}"))).collect();
        let leaves: Vec<_> = (0..2).map(|i| bom.add_component(format!("c{i}"))).collect();
        let all: Vec<_> = assemblies.iter().chain(leaves.iter()).copied().collect();

        for (parent, child, attach) in ops {
            let parent = assemblies[parent];
            let child = all[child];
            if attach {
                let _ = bom.attach(parent, child, None);
            } else {
                let reference = bom.node(child).unwrap().reference().to_string();
                bom.detach(parent, &reference).unwrap();
            }
        }

        for &id in &all {
            let registry = bom.registry(id).unwrap();
            prop_assert_eq!(registry.get(bom.node(id).unwrap().reference()), Some(&id));
            for &other in &all {
                let connected = bom.registry(other).unwrap() == registry;
                let listed = registry.values().any(|&v| v == other);
                prop_assert_eq!(connected, listed);
            }
            for child in bom.children(id).unwrap().values() {
                prop_assert!(registry.values().any(|v| v == child));
            }
        }
    }
}
