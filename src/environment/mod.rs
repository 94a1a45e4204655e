//! Per-request template environments.
//!
//! # Data Flow
//! ```text
//! module default env (deep copy)
//!     → request values (baseurl, models = [])
//!     → per-page assets (mainjs, css)
//!     → sidecar.rs (page JSON, per-model JSON)
//!     → model outputs, in model-reference order
//!     → template render
//! ```
//!
//! # Design Decisions
//! - Environments are plain JSON objects so sidecars and model output share one type
//! - Sequences concatenate on merge; every other value is replaced by the later layer
//! - Layers are applied in a fixed order so key collisions resolve deterministically

pub mod composer;
pub mod sidecar;

use serde_json::{Map, Value};

pub use composer::EnvironmentComposer;

/// Mapping passed into template rendering.
pub type Environment = Map<String, Value>;

/// Well-known environment keys.
pub mod keys {
    pub const BASE_URL: &str = "baseurl";
    pub const MODELS: &str = "models";
    pub const MAIN_JS: &str = "mainjs";
    pub const CSS: &str = "css";
    pub const DEV: &str = "dev";
    pub const ERROR_CODE: &str = "errcode";
    pub const USE_REDIRECT: &str = "useRedirect";
    pub const REQUIRES_LOGIN: &str = "requiresLogin";
    pub const USE_PERMISSIONS: &str = "usePermissions";
    pub const PERMISSIONS: &str = "permissions";
    pub const ALLOWED_POSITIONS: &str = "allowedPositions";
}

/// Merge `layer` into `env`.
///
/// Keys present in both as arrays are concatenated (existing items first);
/// otherwise the incoming value replaces the existing one.
pub fn merge(env: &mut Environment, layer: Environment) {
    for (key, incoming) in layer {
        match (env.get_mut(&key), incoming) {
            (Some(Value::Array(existing)), Value::Array(items)) => existing.extend(items),
            (_, incoming) => {
                env.insert(key, incoming);
            }
        }
    }
}

/// Truthiness of an environment flag, loosely following JSON semantics.
pub fn flag(env: &Environment, key: &str) -> bool {
    match env.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// String entries of an array-valued key. Non-string items are skipped.
pub fn string_list(env: &Environment, key: &str) -> Vec<String> {
    match env.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Convert a JSON value into an environment layer.
///
/// Returns `None` for anything that is not an object.
pub fn from_value(value: Value) -> Option<Environment> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(value: Value) -> Environment {
        from_value(value).unwrap()
    }

    #[test]
    fn test_arrays_concatenate() {
        let mut acc = env(json!({ "a": [1, 2] }));
        merge(&mut acc, env(json!({ "a": [3] })));
        assert_eq!(acc["a"], json!([1, 2, 3]));
    }

    #[test]
    fn test_scalars_replace() {
        let mut acc = env(json!({ "a": 5 }));
        merge(&mut acc, env(json!({ "a": 6 })));
        assert_eq!(acc["a"], json!(6));
    }

    #[test]
    fn test_mixed_types_replace() {
        let mut acc = env(json!({ "a": [1], "b": "x" }));
        merge(&mut acc, env(json!({ "a": "flat", "b": ["list"] })));
        assert_eq!(acc["a"], json!("flat"));
        assert_eq!(acc["b"], json!(["list"]));
    }

    #[test]
    fn test_layer_order_decides_collisions() {
        let mut acc = env(json!({ "title": "default", "css": ["site.css"] }));
        merge(&mut acc, env(json!({ "title": "page", "css": ["page.css"] })));
        merge(&mut acc, env(json!({ "title": "model" })));
        assert_eq!(acc["title"], json!("model"));
        assert_eq!(acc["css"], json!(["site.css", "page.css"]));
    }

    #[test]
    fn test_new_keys_are_added() {
        let mut acc = Environment::new();
        merge(&mut acc, env(json!({ "x": { "nested": true } })));
        assert_eq!(acc["x"]["nested"], json!(true));
    }

    #[test]
    fn test_flag_truthiness() {
        let e = env(json!({ "t": true, "f": false, "zero": 0, "one": 1, "empty": "", "list": [] }));
        assert!(flag(&e, "t"));
        assert!(!flag(&e, "f"));
        assert!(!flag(&e, "zero"));
        assert!(flag(&e, "one"));
        assert!(!flag(&e, "empty"));
        assert!(flag(&e, "list"));
        assert!(!flag(&e, "missing"));
    }

    #[test]
    fn test_string_list() {
        let e = env(json!({ "p": ["a", 1, "b"], "s": "solo" }));
        assert_eq!(string_list(&e, "p"), vec!["a", "b"]);
        assert_eq!(string_list(&e, "s"), vec!["solo"]);
        assert!(string_list(&e, "missing").is_empty());
    }
}
