//! Graph assembly for encoded crates
//!
//! The encoder emits some entities more than once: a `DefinedTerm` used by
//! two screens, its `DefinedTermSet`, a person listed twice under the same
//! ORCID. [`GraphBuilder`] keeps one entity per @id at the position of its
//! first insertion and folds later copies into it.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::collect::extract_id;

/// Fold a later copy of an entity into the first one
///
/// Types are unioned. Properties the first copy lacks are taken from the
/// later one, and array properties gain the items they are missing. A scalar
/// the first copy already holds is kept, so a term keeps the name and
/// spelling it was first emitted with.
fn fold_entity(first: &mut Map<String, Value>, later: Map<String, Value>) {
    for (key, value) in later {
        if key == "@id" {
            continue;
        }
        let Some(existing) = first.get_mut(&key) else {
            first.insert(key, value);
            continue;
        };
        if *existing == value {
            continue;
        }
        match (key.as_str(), existing) {
            ("@type", existing) => {
                let mut types = as_items(existing);
                push_missing(&mut types, as_items(&value));
                *existing = if types.len() == 1 {
                    types.remove(0)
                } else {
                    Value::Array(types)
                };
            }
            (_, Value::Array(items)) => push_missing(items, as_items(&value)),
            _ => {}
        }
    }
}

fn as_items(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

fn push_missing(items: &mut Vec<Value>, more: Vec<Value>) {
    for item in more {
        if !items.contains(&item) {
            items.push(item);
        }
    }
}

/// Insertion-ordered @graph under construction
#[derive(Debug, Default)]
pub struct GraphBuilder {
    entities: Vec<Value>,
    positions: HashMap<String, usize>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity, folding it into an earlier one with the same @id
    ///
    /// Entities without an @id are appended as-is.
    pub fn add(&mut self, entity: Value) {
        let Some(id) = extract_id(&entity).map(String::from) else {
            self.entities.push(entity);
            return;
        };
        match self.positions.get(&id) {
            Some(&pos) => {
                if let (Value::Object(first), Value::Object(later)) =
                    (&mut self.entities[pos], entity)
                {
                    fold_entity(first, later);
                }
            }
            None => {
                self.positions.insert(id, self.entities.len());
                self.entities.push(entity);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn build(self) -> Vec<Value> {
        self.entities
    }
}
