//! Actions: descriptions of an intended state change.
//!
//! Every action carries a `type` discriminator. Typed actions (usually an
//! enum) are valid by construction; dynamic actions are JSON records
//! ([`serde_json::Value`]) and are checked by [`Action::validate`] before a
//! store hands them to a reducer.
//!
//! # Example
//!
//! ```
//! use unistore_core::action::{Action, INIT};
//! use serde_json::json;
//!
//! let action = json!({ "type": "todos/add", "text": "write docs" });
//! assert!(action.validate().is_ok());
//! assert_eq!(action.type_name(), "todos/add");
//!
//! assert!(json!([1, 2, 3]).validate().is_err());
//! assert!(serde_json::Value::init().is_init());
//! assert_eq!(serde_json::Value::init()["type"], INIT);
//! ```

use serde_json::{Value, json};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Reserved action type dispatched when a store is created and whenever its
/// reducer is replaced.
///
/// Reducers see it in their fallthrough branch; it never collides with a
/// caller-chosen type because of the `@@` namespace.
pub const INIT: &str = "@@unistore/INIT";

/// Errors raised when an action fails validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The action is a primitive, array or null instead of a record
    #[error("Actions must be plain objects, found {found}")]
    NotPlainObject {
        /// JSON kind of the rejected value
        found: &'static str,
    },

    /// The record has no `type` key
    #[error("Actions may not have an undefined \"type\" property. Have you misspelled a constant?")]
    UndefinedType,
}

/// An action that can be dispatched to a store.
///
/// # Example
///
/// ```
/// use unistore_core::action::Action;
///
/// #[derive(Debug, Clone, PartialEq)]
/// enum CounterAction {
///     Init,
///     Increment,
///     Add(i64),
/// }
///
/// impl Action for CounterAction {
///     fn init() -> Self {
///         Self::Init
///     }
///
///     fn is_init(&self) -> bool {
///         matches!(self, Self::Init)
///     }
/// }
///
/// assert!(CounterAction::init().is_init());
/// assert!(CounterAction::Add(2).validate().is_ok());
/// ```
pub trait Action: fmt::Debug {
    /// The reserved bootstrap action for this action type.
    fn init() -> Self
    where
        Self: Sized;

    /// Whether this action is the bootstrap action.
    fn is_init(&self) -> bool;

    /// The `type` discriminator rendered as text, used in logs and metric labels.
    ///
    /// Defaults to the leading identifier of the `Debug` output, which for a
    /// derived enum is the variant name (`Add(2)` gives `Add`).
    fn type_name(&self) -> Cow<'_, str> {
        let mut rendered = format!("{self:?}");
        if let Some(end) = rendered.find(|c: char| !(c.is_alphanumeric() || c == '_')) {
            if end > 0 {
                rendered.truncate(end);
            }
        }
        Cow::Owned(rendered)
    }

    /// Check the action's shape before it reaches a reducer.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError`] when the action is not a record or lacks a `type`.
    fn validate(&self) -> Result<(), ActionError> {
        Ok(())
    }
}

impl Action for Value {
    fn init() -> Self {
        json!({ "type": INIT })
    }

    fn is_init(&self) -> bool {
        self.get("type").and_then(Value::as_str) == Some(INIT)
    }

    fn type_name(&self) -> Cow<'_, str> {
        match self.get("type") {
            Some(Value::String(name)) => Cow::Borrowed(name.as_str()),
            Some(other) => Cow::Owned(other.to_string()),
            None => Cow::Borrowed("<undefined>"),
        }
    }

    fn validate(&self) -> Result<(), ActionError> {
        let Value::Object(record) = self else {
            return Err(ActionError::NotPlainObject {
                found: json_kind(self),
            });
        };

        // A `null` type is defined; only a missing key counts as undefined.
        if record.contains_key("type") {
            Ok(())
        } else {
            Err(ActionError::UndefinedType)
        }
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_with_type_is_valid() {
        let action = json!({ "type": "add", "amount": 3 });
        assert_eq!(action.validate(), Ok(()));
        assert_eq!(action.type_name(), "add");
        assert!(!action.is_init());
    }

    #[test]
    fn test_non_records_are_rejected() {
        for (value, kind) in [
            (json!(null), "null"),
            (json!(true), "boolean"),
            (json!(42), "number"),
            (json!("add"), "string"),
            (json!([{ "type": "add" }]), "array"),
        ] {
            assert_eq!(
                value.validate(),
                Err(ActionError::NotPlainObject { found: kind })
            );
        }
    }

    #[test]
    fn test_missing_type_is_rejected() {
        let action = json!({ "kind": "add" });
        assert_eq!(action.validate(), Err(ActionError::UndefinedType));
        assert_eq!(action.type_name(), "<undefined>");
    }

    #[test]
    fn test_null_type_counts_as_defined() {
        let action = json!({ "type": null });
        assert_eq!(action.validate(), Ok(()));
        assert_eq!(action.type_name(), "null");
    }

    #[test]
    fn test_init_action() {
        let init = Value::init();
        assert!(init.is_init());
        assert_eq!(init.validate(), Ok(()));
        assert_eq!(init.type_name(), INIT);
    }

    #[derive(Debug)]
    enum Typed {
        Init,
        Add(i64),
        Rename { to: String },
    }

    impl Action for Typed {
        fn init() -> Self {
            Self::Init
        }

        fn is_init(&self) -> bool {
            matches!(self, Self::Init)
        }
    }

    #[test]
    fn test_typed_actions_are_labelled_by_variant() {
        assert_eq!(Typed::init().type_name(), "Init");
        assert_eq!(Typed::Add(2).type_name(), "Add");
        assert_eq!(Typed::Rename { to: "x".into() }.type_name(), "Rename");
        assert_ne!(Typed::Init.type_name(), Typed::Add(1).type_name());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ActionError::NotPlainObject { found: "array" }.to_string(),
            "Actions must be plain objects, found array"
        );
        assert!(ActionError::UndefinedType.to_string().contains("undefined \"type\""));
    }
}
