//! Snapshot flattening.
//!
//! A full snapshot arrives as one arbitrarily nested object; incremental
//! updates arrive as flat patches. Flattening turns the snapshot into the
//! same patch shape, so subscribers only ever implement "handle a patch"
//! and never a separate full-state code path.

use serde_json::{Map, Value};

use crate::patch::Patch;

/// Flatten a snapshot object into one synthetic Replace patch per terminal
/// value.
///
/// Every nested-object property extends the path by `/<name>` and recurses;
/// every other property (scalar, array, null) emits a patch at the
/// accumulated path. Emission follows the object's own property order;
/// no ordering holds across sibling subtrees.
#[must_use]
pub fn flatten_snapshot(snapshot: &Map<String, Value>) -> Vec<Patch> {
    let mut patches = Vec::new();
    traverse(snapshot, "", &mut patches);
    patches
}

fn traverse(object: &Map<String, Value>, path: &str, patches: &mut Vec<Patch>) {
    for (name, value) in object {
        let current = format!("{path}/{name}");
        match value {
            Value::Object(nested) => traverse(nested, &current, patches),
            terminal => patches.push(Patch::replace(current, terminal.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::PatchOp;
    use serde_json::json;

    fn snapshot(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_single_leaf_flattens_to_one_patch() {
        let status = snapshot(json!({
            "mixers": {"SN1": {"levels": {"volumes": {"Mic": 128}}}}
        }));

        let patches = flatten_snapshot(&status);

        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].op, PatchOp::Replace);
        assert_eq!(patches[0].path, "/mixers/SN1/levels/volumes/Mic");
        assert_eq!(patches[0].value, Some(json!(128)));
    }

    #[test]
    fn test_emission_follows_property_order() {
        let status = snapshot(json!({
            "mixers": {
                "SN1": {
                    "levels": {"volumes": {"Mic": 128, "Chat": 64}},
                    "muted": false
                }
            },
            "config": {"daemon_version": "1.2.0"}
        }));

        let patches = flatten_snapshot(&status);
        let paths: Vec<&str> = patches.iter().map(|p| p.path.as_str()).collect();

        assert_eq!(
            paths,
            vec![
                "/mixers/SN1/levels/volumes/Mic",
                "/mixers/SN1/levels/volumes/Chat",
                "/mixers/SN1/muted",
                "/config/daemon_version",
            ]
        );
    }

    #[test]
    fn test_arrays_and_null_are_terminals() {
        let status = snapshot(json!({
            "mixers": {"SN1": {"router": [true, false], "profile": null}}
        }));

        let patches = flatten_snapshot(&status);

        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].path, "/mixers/SN1/router");
        assert_eq!(patches[0].value, Some(json!([true, false])));
        assert_eq!(patches[1].path, "/mixers/SN1/profile");
        assert_eq!(patches[1].value, Some(Value::Null));
    }

    #[test]
    fn test_empty_object_emits_nothing() {
        let patches = flatten_snapshot(&snapshot(json!({"mixers": {}})));
        assert!(patches.is_empty());
    }
}
