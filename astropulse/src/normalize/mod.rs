//! Best-effort normalization of loosely structured tool payloads.
//!
//! The reasoning loop moves data between a language model and deterministic
//! tools. Neither side is trustworthy about shape: the model emits argument
//! text that may be plain prose, JSON, or quasi-JSON, and tools hand back
//! JSON-encoded strings as often as structured values. Everything funnels
//! through here so the trace and the tools always see well-formed
//! `serde_json::Value`s. None of these functions can fail; undecodable input
//! degrades to a `{"value": <raw>}` wrapper.

mod relaxed;

use serde_json::{json, Value};

/// Normalizes a model-emitted argument payload into a mapping-shaped bag.
///
/// Decoding policy, first success wins:
/// 1. strict JSON — a decoded mapping is returned unwrapped, a decoded
///    sequence is wrapped as `{"list": [...]}` (tools expect a mapping-shaped
///    argument bag, so the wrap is deliberate and one-sided);
/// 2. the relaxed literal dialect (single quotes, unquoted keys) — same
///    shaping rules;
/// 3. `{"value": <raw>}` for everything else, including text that decodes to
///    a bare scalar.
pub fn normalize_args(raw: &str) -> Value {
    let trimmed = raw.trim();
    let decoded = serde_json::from_str::<Value>(trimmed)
        .ok()
        .or_else(|| relaxed::parse(trimmed));
    match decoded.and_then(into_arg_bag) {
        Some(bag) => bag,
        None => json!({ "value": raw }),
    }
}

fn into_arg_bag(decoded: Value) -> Option<Value> {
    match decoded {
        Value::Object(_) => Some(decoded),
        Value::Array(items) => Some(json!({ "list": items })),
        _ => None,
    }
}

/// Normalizes a value that may already be structured. Mappings, sequences
/// and non-string scalars pass through untouched; text goes through
/// [`normalize_args`].
pub fn normalize_value(raw: Value) -> Value {
    match raw {
        Value::String(s) => normalize_args(&s),
        other => other,
    }
}

/// Normalizes a raw tool result for the trace and the next reasoning turn.
///
/// Tool output is trusted enough to skip the relaxed decode: strings are
/// strictly parsed (mapping unwrapped, sequence wrapped as `{"list": ...}`)
/// and otherwise wrapped raw; structured values pass through.
pub fn normalize_result(raw: Value) -> Value {
    match raw {
        Value::String(s) => match serde_json::from_str::<Value>(s.trim()) {
            Ok(Value::Object(map)) => Value::Object(map),
            Ok(Value::Array(items)) => json!({ "list": items }),
            _ => json!({ "value": s }),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_json_mapping_is_unwrapped() {
        let args = normalize_args(r#"{"days_back": 7}"#);
        assert_eq!(args, json!({"days_back": 7}));
    }

    #[test]
    fn strict_json_sequence_is_wrapped() {
        let args = normalize_args(r#"[{"classType": "M2.1"}, {"classType": "X1.0"}]"#);
        assert_eq!(
            args,
            json!({"list": [{"classType": "M2.1"}, {"classType": "X1.0"}]})
        );
    }

    #[test]
    fn relaxed_literal_path_handles_model_dialect() {
        let args = normalize_args("{flare_class: 'X1.8', source_location: 'N24E63'}");
        assert_eq!(
            args,
            json!({"flare_class": "X1.8", "source_location": "N24E63"})
        );
    }

    #[test]
    fn undecodable_text_degrades_to_raw_wrapper() {
        let args = normalize_args("just fetch everything please");
        assert_eq!(args, json!({"value": "just fetch everything please"}));
    }

    #[test]
    fn scalar_decodes_degrade_to_raw_wrapper() {
        assert_eq!(normalize_args("7"), json!({"value": "7"}));
        assert_eq!(normalize_args("\"M5.2\""), json!({"value": "\"M5.2\""}));
    }

    #[test]
    fn structured_values_pass_through() {
        let mapping = json!({"kp_index": 5});
        assert_eq!(normalize_value(mapping.clone()), mapping);
        let sequence = json!([1, 2, 3]);
        assert_eq!(normalize_value(sequence.clone()), sequence);
        assert_eq!(normalize_value(json!(42)), json!(42));
    }

    #[test]
    fn result_strings_are_strictly_decoded() {
        let decoded = normalize_result(json!(r#"{"trend": "STABLE"}"#));
        assert_eq!(decoded, json!({"trend": "STABLE"}));
        let wrapped = normalize_result(json!(r#"[1, 2]"#));
        assert_eq!(wrapped, json!({"list": [1, 2]}));
    }

    #[test]
    fn malformed_result_strings_are_wrapped_not_errors() {
        let wrapped = normalize_result(json!("{broken json"));
        assert_eq!(wrapped, json!({"value": "{broken json"}));
    }

    #[test]
    fn never_panics_on_hostile_text() {
        for raw in [
            "",
            "{{{{",
            "]][[",
            "{'a': }",
            "__import__('os')",
            "{\"a\": 1, \"b\": [}",
        ] {
            let bag = normalize_args(raw);
            assert!(bag.is_object(), "expected mapping for {raw:?}, got {bag}");
        }
    }
}
