//! Relationship-field entries and the pure functions that strip them.
//!
//! Stored data is inconsistent about how a reference is written: a bare ID
//! string, a populated `{ "id": .. }` object, or the legacy
//! `{ "value": .. }` form. An object carrying both is a reference to either
//! of them. Anything else is [`Reference::Unknown`] and is never treated as
//! pointing at anything.

use serde_json::{Map, Value};

/// One relationship entry, classified by shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reference<'a> {
  Bare(&'a str),
  /// An object with a string `id`, a string `value`, or both.
  Object {
    id:    Option<&'a str>,
    value: Option<&'a str>,
  },
  Unknown(&'a Value),
}

fn string_prop<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
  obj.get(key).and_then(Value::as_str)
}

impl<'a> Reference<'a> {
  pub fn parse(value: &'a Value) -> Self {
    match value {
      Value::String(id) => Self::Bare(id),
      Value::Object(obj) => match (string_prop(obj, "id"), string_prop(obj, "value")) {
        (None, None) => Self::Unknown(value),
        (id, value) => Self::Object { id, value },
      },
      other => Self::Unknown(other),
    }
  }

  /// Every ID this entry resolves to; empty for unknown shapes.
  pub fn ids(&self) -> impl Iterator<Item = &'a str> {
    let (first, second) = match *self {
      Self::Bare(id) => (Some(id), None),
      Self::Object { id, value } => (id, value),
      Self::Unknown(_) => (None, None),
    };
    first.into_iter().chain(second)
  }

  pub fn points_at(&self, target: &str) -> bool { self.ids().any(|id| id == target) }
}

/// Whether a field value (single or multi-valued) references `target`.
pub fn field_references(value: &Value, target: &str) -> bool {
  match value {
    Value::Array(items) => items.iter().any(|v| Reference::parse(v).points_at(target)),
    single => Reference::parse(single).points_at(target),
  }
}

/// Copy of `items` without the entries that resolve to `target`.
///
/// Order and the shape of every kept element are preserved.
pub fn strip_reference(items: &[Value], target: &str) -> Vec<Value> {
  items
    .iter()
    .filter(|v| !Reference::parse(v).points_at(target))
    .cloned()
    .collect()
}

/// Apply [`strip_reference`] to a whole field value.
///
/// A single-valued reference to `target` becomes `null`; values that are
/// neither arrays nor matching references come back unchanged.
pub fn strip_field(value: &Value, target: &str) -> Value {
  match value {
    Value::Array(items) => Value::Array(strip_reference(items, target)),
    single if Reference::parse(single).points_at(target) => Value::Null,
    other => other.clone(),
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn parses_each_shape() {
    assert_eq!(Reference::parse(&json!("a")), Reference::Bare("a"));
    assert_eq!(
      Reference::parse(&json!({"id": "a", "title": "x"})),
      Reference::Object { id: Some("a"), value: None }
    );
    assert_eq!(
      Reference::parse(&json!({"value": "a"})),
      Reference::Object { id: None, value: Some("a") }
    );
    assert_eq!(
      Reference::parse(&json!({"id": 7, "value": "a"})),
      Reference::Object { id: None, value: Some("a") }
    );
    assert!(matches!(Reference::parse(&json!(7)), Reference::Unknown(_)));
    assert!(matches!(Reference::parse(&json!({"id": 7})), Reference::Unknown(_)));
    assert!(matches!(Reference::parse(&json!(null)), Reference::Unknown(_)));
  }

  #[test]
  fn id_and_value_both_count() {
    let r = json!({"id": "a", "value": "b"});
    assert!(Reference::parse(&r).points_at("a"));
    assert!(Reference::parse(&r).points_at("b"));
    assert!(!Reference::parse(&r).points_at("c"));
  }

  #[test]
  fn entry_is_dropped_when_value_matches_despite_other_id() {
    let items = vec![json!({"id": "U", "value": "T"}), json!("C")];
    assert_eq!(strip_reference(&items, "T"), vec![json!("C")]);
    assert_eq!(strip_field(&json!({"id": "U", "value": "T"}), "T"), Value::Null);
  }

  #[test]
  fn strips_every_shape_and_keeps_order() {
    let items = vec![
      json!("B"),
      json!("C"),
      json!({"id": "B"}),
      json!({"value": "B", "relationTo": "products"}),
      json!({"id": "D"}),
    ];
    let out = strip_reference(&items, "B");
    assert_eq!(out, vec![json!("C"), json!({"id": "D"})]);
  }

  #[test]
  fn unknown_shapes_are_kept() {
    let items = vec![json!(42), json!({"slug": "B"}), json!(null), json!(["B"])];
    assert_eq!(strip_reference(&items, "B"), items);
    assert_eq!(strip_reference(&[json!(42)], "42"), vec![json!(42)]);
  }

  #[test]
  fn stripping_twice_equals_stripping_once() {
    let items = vec![json!("A"), json!({"id": "B"}), json!({"value": "A"}), json!(3)];
    let once = strip_reference(&items, "A");
    let twice = strip_reference(&once, "A");
    assert_eq!(once, twice);
  }

  #[test]
  fn input_is_untouched() {
    let items = vec![json!("A"), json!("B")];
    let _ = strip_reference(&items, "A");
    assert_eq!(items.len(), 2);
  }

  #[test]
  fn strip_field_handles_single_values() {
    assert_eq!(strip_field(&json!("A"), "A"), Value::Null);
    assert_eq!(strip_field(&json!({"id": "A"}), "A"), Value::Null);
    assert_eq!(strip_field(&json!("B"), "A"), json!("B"));
    assert_eq!(strip_field(&json!(null), "A"), Value::Null);
    assert_eq!(strip_field(&json!([{"value": "A"}]), "A"), json!([]));
  }

  #[test]
  fn detects_membership() {
    assert!(field_references(&json!(["x", {"id": "A"}]), "A"));
    assert!(field_references(&json!({"value": "A"}), "A"));
    assert!(!field_references(&json!(["AA", "a"]), "A"));
  }

  // ── Properties ──────────────────────────────────────────────────────────────

  mod properties {
    use proptest::prelude::*;
    use serde_json::{Value, json};

    use super::super::*;

    const IDS: [&str; 3] = ["T", "U", "TT"];

    fn arb_id() -> impl Strategy<Value = String> {
      prop::sample::select(&IDS[..]).prop_map(|id| id.to_owned())
    }

    fn arb_known() -> impl Strategy<Value = Value> {
      prop_oneof![
        arb_id().prop_map(Value::String),
        arb_id().prop_map(|id| json!({ "id": id })),
        arb_id().prop_map(|id| json!({ "value": id, "relationTo": "products" })),
        (arb_id(), arb_id()).prop_map(|(id, value)| json!({ "id": id, "value": value })),
      ]
    }

    fn arb_unknown() -> impl Strategy<Value = Value> {
      prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
        arb_id().prop_map(|id| json!({ "slug": id })),
        arb_id().prop_map(|id| json!({ "id": 7, "value": [id] })),
        arb_id().prop_map(|id| json!([id])),
      ]
    }

    fn arb_entry() -> impl Strategy<Value = Value> { prop_oneof![arb_known(), arb_unknown()] }

    proptest! {
      #[test]
      fn stripping_is_idempotent(
        items in prop::collection::vec(arb_entry(), 0..12),
        target in arb_id(),
      ) {
        let once = strip_reference(&items, &target);
        prop_assert_eq!(strip_reference(&once, &target), once);
      }

      #[test]
      fn nothing_left_points_at_target(
        items in prop::collection::vec(arb_entry(), 0..12),
        target in arb_id(),
      ) {
        let out = strip_reference(&items, &target);
        prop_assert!(out.iter().all(|v| !Reference::parse(v).points_at(&target)));
        prop_assert!(!field_references(&Value::Array(out), &target));
      }

      #[test]
      fn unknown_shapes_always_survive(
        items in prop::collection::vec(arb_unknown(), 0..12),
        target in arb_id(),
      ) {
        prop_assert_eq!(strip_reference(&items, &target), items);
      }

      #[test]
      fn kept_entries_keep_their_order(
        items in prop::collection::vec(arb_entry(), 0..12),
        target in arb_id(),
      ) {
        let expected: Vec<Value> = items
          .iter()
          .filter(|v| !Reference::parse(v).points_at(&target))
          .cloned()
          .collect();
        prop_assert_eq!(strip_reference(&items, &target), expected);
      }
    }
  }
}
