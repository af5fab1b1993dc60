//! Static checks on a part catalog.

use bom_core::Value;

use crate::builder::{CHILDREN, PARAMS_NAME, TYPE, inherit, names_of};
use crate::catalog::{Catalog, ParameterSets};
use crate::SkeletonError;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogIssue {
    #[error("{template}: child '{child}' has type '{kind}' which is not in the catalog")]
    MissingChildType {
        template: String,
        child: String,
        kind: String,
    },

    #[error("{template}: child '{child}' has no type")]
    UntypedChild { template: String, child: String },

    #[error("{template}: inherits unknown template '{parent}'")]
    MissingParent { template: String, parent: String },

    #[error("{template}: cyclic inheritance {}", .chain.join(" -> "))]
    InheritanceCycle { template: String, chain: Vec<String> },

    #[error("{template}: unknown parameter set '{name}'")]
    UnknownParameterSet { template: String, name: String },

    #[error("{template}: malformed field '{field}'")]
    Malformed { template: String, field: String },
}

/// Collect every problem a build from this catalog could hit.
///
/// Parameter set names are only checked when `parameters` is given.
pub fn validate_catalog(catalog: &Catalog, parameters: Option<&ParameterSets>) -> Vec<CatalogIssue> {
    let mut issues = Vec::new();
    for (name, template) in catalog.iter() {
        match template.get(CHILDREN) {
            None | Some(Value::Null) => {}
            Some(Value::Object(children)) => {
                for (child, stub) in children {
                    match stub.get(TYPE).and_then(Value::as_str) {
                        Some(kind) if !catalog.contains(kind) => {
                            issues.push(CatalogIssue::MissingChildType {
                                template: name.clone(),
                                child: child.clone(),
                                kind: kind.to_string(),
                            });
                        }
                        Some(_) => {}
                        None => issues.push(CatalogIssue::UntypedChild {
                            template: name.clone(),
                            child: child.clone(),
                        }),
                    }
                }
            }
            Some(_) => issues.push(CatalogIssue::Malformed {
                template: name.clone(),
                field: CHILDREN.to_string(),
            }),
        }

        let mut resolved = template.clone();
        match inherit(&mut resolved, catalog) {
            Ok(()) => {}
            Err(SkeletonError::MissingTemplate { name: parent, .. }) => {
                issues.push(CatalogIssue::MissingParent {
                    template: name.clone(),
                    parent,
                });
            }
            Err(SkeletonError::InheritanceCycle { chain }) => {
                issues.push(CatalogIssue::InheritanceCycle {
                    template: name.clone(),
                    chain,
                });
            }
            Err(_) => issues.push(CatalogIssue::Malformed {
                template: name.clone(),
                field: "inherits".to_string(),
            }),
        }

        if let Some(parameters) = parameters
            && let Some(requested) = template.get(PARAMS_NAME)
        {
            match names_of(requested, PARAMS_NAME) {
                Ok(names) => {
                    for set in names.into_iter().filter(|set| !parameters.contains(set)) {
                        issues.push(CatalogIssue::UnknownParameterSet {
                            template: name.clone(),
                            name: set,
                        });
                    }
                }
                Err(_) => issues.push(CatalogIssue::Malformed {
                    template: name.clone(),
                    field: PARAMS_NAME.to_string(),
                }),
            }
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_catalog() {
        let catalog = Catalog::from_value(&json!({
            "car": {"children": {"engine": {"type": "engine"}}, "params_name": ["car"]},
            "engine": {"inherits": ["machine"]},
            "machine": {}
        }))
        .unwrap();
        let sets = Catalog::from_value(&json!({"car": {}})).unwrap();
        assert!(validate_catalog(&catalog, Some(&sets)).is_empty());
    }

    #[test]
    fn reports_every_problem() {
        let catalog = Catalog::from_value(&json!({
            "car": {"children": {"engine": {"type": "motor"}, "seat": {}}, "params_name": ["car"]},
            "a": {"inherits": ["b"]},
            "b": {"inherits": ["a"]},
            "c": {"inherits": "ghost"}
        }))
        .unwrap();
        let issues = validate_catalog(&catalog, Some(&Catalog::new()));

        assert!(issues.contains(&CatalogIssue::MissingChildType {
            template: "car".into(),
            child: "engine".into(),
            kind: "motor".into(),
        }));
        assert!(issues.contains(&CatalogIssue::UntypedChild {
            template: "car".into(),
            child: "seat".into(),
        }));
        assert!(issues.contains(&CatalogIssue::MissingParent {
            template: "c".into(),
            parent: "ghost".into(),
        }));
        assert!(issues.contains(&CatalogIssue::UnknownParameterSet {
            template: "car".into(),
            name: "car".into(),
        }));
        let cycles = issues
            .iter()
            .filter(|issue| matches!(issue, CatalogIssue::InheritanceCycle { .. }))
            .count();
        assert_eq!(cycles, 2);
        assert_eq!(issues.len(), 6);
    }
}
