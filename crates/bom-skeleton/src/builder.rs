//! Skeleton construction: spine expansion, inheritance and parameter grafting.

use bom_core::{Record, Value};
use tracing::{debug, warn};

use crate::catalog::{Catalog, ParameterSets, Skeleton};
use crate::merge::{merge_records, merge_records_distinct};
use crate::{SkeletonError, SkeletonResult};

pub const TYPE: &str = "type";
pub const CHILDREN: &str = "children";
pub const COUNT: &str = "count";
pub const INHERITS: &str = "inherits";
pub const INHERITED: &str = "inherited";
pub const PARAMS: &str = "params";
pub const PARAMS_NAME: &str = "params_name";
pub const PARAMS_FIELD: &str = "_params";
pub const MATERIAL: &str = "material";
pub const MATERIAL_FIELD: &str = "_material";
pub const CLASS_STR: &str = "class_str";
pub const DATA: &str = "data";

/// Options that shape a freshly built skeleton.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildOptions {
    /// Frame class given to records without one.
    pub default_param_class: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            default_param_class: "PintFrame".to_string(),
        }
    }
}

/// Build the full skeleton below `root_ref`.
pub fn build_skeleton(
    root_ref: &str,
    root_type: &str,
    catalog: &Catalog,
    parameters: &ParameterSets,
    options: &BuildOptions,
) -> SkeletonResult<Skeleton> {
    let mut skeleton = Skeleton::new();
    spine(&mut skeleton, root_ref, root_type, catalog)?;
    add_bones(&mut skeleton, catalog, parameters, options)?;
    debug!(root = root_ref, records = skeleton.len(), "built skeleton");
    Ok(skeleton)
}

/// Expand `root_ref` and every declared descendant into the skeleton.
///
/// Records already in the skeleton are reused, with the child stub merged in
/// without repeating list entries.
pub fn spine(
    skeleton: &mut Skeleton,
    root_ref: &str,
    root_type: &str,
    catalog: &Catalog,
) -> SkeletonResult<()> {
    let mut stub = Record::new();
    stub.insert(TYPE.to_string(), Value::String(root_type.to_string()));
    let mut path = Vec::new();
    expand(skeleton, catalog, root_ref, &stub, &mut path)
}

fn expand(
    skeleton: &mut Skeleton,
    catalog: &Catalog,
    reference: &str,
    stub: &Record,
    path: &mut Vec<String>,
) -> SkeletonResult<()> {
    if path.iter().any(|ancestor| ancestor == reference) {
        let mut cycle = path.clone();
        cycle.push(reference.to_string());
        return Err(SkeletonError::HierarchyCycle {
            reference: reference.to_string(),
            path: cycle,
        });
    }

    let needed_by = path.last().map(String::as_str).unwrap_or("root");
    let record = match skeleton.remove(reference) {
        Some(existing) => combine(existing, stub, true),
        None => {
            let kind = stub.get(TYPE).and_then(Value::as_str).ok_or_else(|| {
                SkeletonError::InvalidDocument {
                    what: format!("child '{reference}' of '{needed_by}' has no type"),
                }
            })?;
            let template = catalog_copy(catalog, kind, needed_by)?;
            merge_child_definition(template, stub)
        }
    };

    let children = match record.get(CHILDREN) {
        None | Some(Value::Null) => Record::new(),
        Some(Value::Object(children)) => children.clone(),
        Some(_) => {
            return Err(SkeletonError::InvalidDocument {
                what: format!("children of '{reference}' must be a mapping"),
            });
        }
    };
    skeleton.insert(reference, record);

    path.push(reference.to_string());
    for (child_ref, child_stub) in &children {
        let Value::Object(child_stub) = child_stub else {
            return Err(SkeletonError::InvalidDocument {
                what: format!("child '{child_ref}' of '{reference}' must be a mapping"),
            });
        };
        expand(skeleton, catalog, child_ref, child_stub, path)?;
    }
    path.pop();
    Ok(())
}

/// A catalog entry tagged with its type, inheritance already resolved.
fn catalog_copy(catalog: &Catalog, kind: &str, needed_by: &str) -> SkeletonResult<Record> {
    let mut template = catalog
        .get(kind)
        .cloned()
        .ok_or_else(|| SkeletonError::MissingTemplate {
            name: kind.to_string(),
            needed_by: needed_by.to_string(),
        })?;
    inherit(&mut template, catalog)?;
    template.insert(TYPE.to_string(), Value::String(kind.to_string()));
    Ok(template)
}

/// Combine a record with the stub its parent declares for it.
///
/// A stub of a different type replaces the record outright; otherwise the stub
/// is merged on top. The `count` multiplicity stays on the parent's stub.
pub fn merge_child_definition(base: Record, stub: &Record) -> Record {
    combine(base, stub, false)
}

/// `distinct` keeps list entries from piling up when a shared record is
/// reached again through another parent.
fn combine(base: Record, stub: &Record, distinct: bool) -> Record {
    let mut stub = stub.clone();
    stub.remove(COUNT);

    let base_type = base.get(TYPE).and_then(Value::as_str);
    let stub_type = stub.get(TYPE).and_then(Value::as_str);
    match (base_type, stub_type) {
        (Some(base_type), Some(stub_type)) if base_type != stub_type => {
            debug!(from = base_type, to = stub_type, "child definition replaces record");
            stub
        }
        _ => {
            let mut base = base;
            if distinct {
                merge_records_distinct(&mut base, &stub);
            } else {
                merge_records(&mut base, &stub);
            }
            base
        }
    }
}

pub(crate) fn names_of(value: &Value, field: &str) -> SkeletonResult<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(name) => Ok(vec![name.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| SkeletonError::InvalidDocument {
                        what: format!("'{field}' entries must be strings, got {item}"),
                    })
            })
            .collect(),
        other => Err(SkeletonError::InvalidDocument {
            what: format!("'{field}' must be a string or list, got {other}"),
        }),
    }
}

/// Resolve the record's `inherits` chain against `parents`.
///
/// Parents are merged in list order with the record itself on top. The
/// `inherits` marker becomes `inherited`, so running this twice is a no-op.
pub fn inherit(record: &mut Record, parents: &Catalog) -> SkeletonResult<()> {
    let mut chain = Vec::new();
    resolve(record, parents, &mut chain)
}

fn resolve(record: &mut Record, parents: &Catalog, chain: &mut Vec<String>) -> SkeletonResult<()> {
    let Some(raw) = record.remove(INHERITS) else {
        return Ok(());
    };
    let names = names_of(&raw, INHERITS)?;

    let mut combined = Record::new();
    let mut lineage = names.clone();
    for name in &names {
        if chain.contains(name) {
            let mut cycle = chain.clone();
            cycle.push(name.clone());
            return Err(SkeletonError::InheritanceCycle { chain: cycle });
        }
        let mut parent = parents
            .get(name)
            .cloned()
            .ok_or_else(|| SkeletonError::MissingTemplate {
                name: name.clone(),
                needed_by: chain.last().cloned().unwrap_or_else(|| "record".to_string()),
            })?;

        chain.push(name.clone());
        resolve(&mut parent, parents, chain)?;
        chain.pop();

        if let Some(ancestors) = parent.remove(INHERITED) {
            lineage.extend(names_of(&ancestors, INHERITED)?);
        }
        merge_records(&mut combined, &parent);
    }

    let mut inherited = match record.remove(INHERITED) {
        Some(existing) => names_of(&existing, INHERITED)?,
        None => Vec::new(),
    };
    merge_records(&mut combined, record);
    for name in lineage {
        if !inherited.contains(&name) {
            inherited.push(name);
        }
    }
    combined.insert(
        INHERITED.to_string(),
        Value::Array(inherited.into_iter().map(Value::String).collect()),
    );
    *record = combined;
    Ok(())
}

/// Resolve inheritance and graft parameters on every record.
pub fn add_bones(
    skeleton: &mut Skeleton,
    parents: &Catalog,
    parameters: &ParameterSets,
    options: &BuildOptions,
) -> SkeletonResult<()> {
    for (reference, record) in skeleton.iter_mut() {
        inherit(record, parents)?;
        graft_params(reference, record, parameters, options)?;
    }
    Ok(())
}

fn mapping_field<'a>(
    record: &'a mut Record,
    field: &str,
    reference: &str,
) -> SkeletonResult<&'a mut Record> {
    let value = record
        .entry(field.to_string())
        .or_insert_with(|| Value::Object(Record::new()));
    if value.is_null() {
        *value = Value::Object(Record::new());
    }
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(SkeletonError::InvalidDocument {
            what: format!("'{field}' of '{reference}' must be a mapping"),
        }),
    }
}

/// Ensure `_params` exists and fold in literal and named parameter sets.
///
/// Also moves a `material` request into `_material`.
pub fn graft_params(
    reference: &str,
    record: &mut Record,
    parameters: &ParameterSets,
    options: &BuildOptions,
) -> SkeletonResult<()> {
    let mut incoming = Vec::new();
    if let Some(params) = record.remove(PARAMS) {
        match params {
            Value::Object(mut params) => match params.remove(DATA) {
                Some(Value::Object(data)) => incoming.push(data),
                Some(Value::Null) => {}
                Some(_) => {
                    return Err(SkeletonError::InvalidDocument {
                        what: format!("'params.data' of '{reference}' must be a mapping"),
                    });
                }
                None => incoming.push(params),
            },
            Value::Null => {}
            _ => {
                return Err(SkeletonError::InvalidDocument {
                    what: format!("'params' of '{reference}' must be a mapping"),
                });
            }
        }
    }
    if let Some(names) = record.remove(PARAMS_NAME) {
        for name in names_of(&names, PARAMS_NAME)? {
            let set = parameters
                .get(&name)
                .ok_or_else(|| SkeletonError::UnknownParameterSet {
                    name: name.clone(),
                    reference: reference.to_string(),
                })?;
            incoming.push(set.clone());
        }
    }

    let frame = mapping_field(record, PARAMS_FIELD, reference)?;
    if !frame.contains_key(CLASS_STR) {
        frame.insert(
            CLASS_STR.to_string(),
            Value::Array(vec![Value::String(options.default_param_class.clone())]),
        );
    }
    let data = mapping_field(frame, DATA, reference)?;
    for source in &incoming {
        merge_records(data, source);
    }

    move_material(reference, record)
}

/// Move a `material` request into `_material`, merging with any bound data.
pub(crate) fn move_material(reference: &str, record: &mut Record) -> SkeletonResult<()> {
    let Some(request) = record.remove(MATERIAL) else {
        return Ok(());
    };
    let request = match request {
        Value::Null => return Ok(()),
        Value::String(name) => {
            let mut request = Record::new();
            request.insert("name".to_string(), Value::String(name));
            request
        }
        Value::Object(request) => request,
        other => {
            warn!(reference, "ignoring material request {other}");
            return Ok(());
        }
    };
    let material = mapping_field(record, MATERIAL_FIELD, reference)?;
    merge_records(material, &request);
    Ok(())
}
