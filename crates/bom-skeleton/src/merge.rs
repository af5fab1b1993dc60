//! Deep merge of schema-flexible records.
//!
//! Rules, applied key by key with the source winning:
//! - mappings merge recursively
//! - lists concatenate (target first), or skip entries already present when distinct
//! - scalars of the same kind are overwritten
//! - a kind mismatch overwrites, with a warning unless either side is null

use bom_core::{Record, Value, type_name};
use tracing::{debug, warn};

/// Merge `source` into `target` in place.
pub fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => merge_records(target, source),
        (target, source) => *target = source.clone(),
    }
}

/// Merge every field of `source` into `target` in place.
pub fn merge_records(target: &mut Record, source: &Record) {
    merge_fields(target, source, false);
}

/// Like [`merge_records`], but list entries already in the target are not
/// appended again.
pub fn merge_records_distinct(target: &mut Record, source: &Record) {
    merge_fields(target, source, true);
}

fn merge_fields(target: &mut Record, source: &Record, distinct: bool) {
    for (key, incoming) in source {
        let Some(current) = target.get_mut(key) else {
            target.insert(key.clone(), incoming.clone());
            continue;
        };
        match (current, incoming) {
            (Value::Object(current), Value::Object(incoming)) => {
                merge_fields(current, incoming, distinct);
            }
            (Value::Array(current), Value::Array(incoming)) if distinct => {
                for item in incoming {
                    if !current.contains(item) {
                        current.push(item.clone());
                    }
                }
            }
            (Value::Array(current), Value::Array(incoming)) => {
                current.extend(incoming.iter().cloned());
            }
            (current @ Value::String(_), Value::String(_)) => {
                debug!("overwriting {key}={current} with {incoming}");
                *current = incoming.clone();
            }
            (current @ Value::Number(_), Value::Number(_))
            | (current @ Value::Bool(_), Value::Bool(_)) => {
                *current = incoming.clone();
            }
            (current, incoming) => {
                if !current.is_null() && !incoming.is_null() {
                    warn!(
                        "data type changed in dictionary update: {key} main={} data={}",
                        type_name(current),
                        type_name(incoming)
                    );
                }
                *current = incoming.clone();
            }
        }
    }
}

/// Merge several sources in order; the last one wins.
pub fn merged<'a>(sources: impl IntoIterator<Item = &'a Record>) -> Record {
    let mut out = Record::new();
    for source in sources {
        merge_records(&mut out, source);
    }
    out
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            (-1000i64..1000).prop_map(Value::from),
            "[a-z]{0,4}".prop_map(Value::String),
        ]
    }

    fn record() -> impl Strategy<Value = Record> {
        prop::collection::btree_map("[a-d]", scalar(), 0..5)
            .prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        #[test]
        fn every_source_key_ends_up_in_target(a in record(), b in record()) {
            let mut target = a.clone();
            merge_records(&mut target, &b);
            for (key, value) in &b {
                prop_assert_eq!(&target[key], value);
            }
            for key in a.keys() {
                prop_assert!(target.contains_key(key));
            }
        }

        #[test]
        fn merging_into_empty_is_a_copy(a in record()) {
            let mut target = Record::new();
            merge_records(&mut target, &a);
            prop_assert_eq!(target, a);
        }
    }
}
