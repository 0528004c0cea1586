//! Lifecycle state enums for every persisted entity.
//!
//! Each enum is closed: a value outside the enumeration cannot be
//! constructed, and parsing an unknown string yields
//! [`CoreError::Validation`]. The string form (`"NEW"`, `"DELETED"`, ...) is
//! what the `state` columns store and what the JSON API exchanges.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Generates a closed string-backed enum with `as_str`, `ALL`, `Display`,
/// `FromStr` and `TryFrom<String>` (used by `sqlx(try_from)` when decoding rows).
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($label:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $value)] $variant, )+
        }

        impl $name {
            /// Every legal value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Return the database / wire string representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }

            /// Comma-separated list of legal values, for error messages.
            pub fn possible_values() -> String {
                Self::ALL
                    .iter()
                    .map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    other => Err(CoreError::Validation(format!(
                        "Wrong '{}' value: '{other}'. Possible values: {}",
                        $label,
                        Self::possible_values()
                    ))),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

/// A lifecycle state with a terminal tombstone value.
pub trait LifecycleState: Copy + Eq {
    /// The terminal soft-delete state.
    const DELETED: Self;

    fn is_deleted(&self) -> bool {
        *self == Self::DELETED
    }
}

string_enum! {
    /// Lifecycle of a task.
    pub enum TaskState("State") {
        New => "NEW",
        Done => "DONE",
        Deleted => "DELETED",
    }
}

string_enum! {
    /// Lifecycle of a tag.
    pub enum TagState("State") {
        New => "NEW",
        Blocked => "BLOCKED",
        Deleted => "DELETED",
    }
}

string_enum! {
    /// Lifecycle of a user account.
    pub enum UserState("State") {
        New => "NEW",
        Confirmed => "CONFIRMED",
        Blocked => "BLOCKED",
        Deleted => "DELETED",
    }
}

string_enum! {
    /// Lifecycle of a note.
    pub enum NoteState("State") {
        New => "NEW",
        Deleted => "DELETED",
    }
}

string_enum! {
    /// Lifecycle of a comment.
    pub enum CommentState("State") {
        New => "NEW",
        Blocked => "BLOCKED",
        Deleted => "DELETED",
    }
}

string_enum! {
    /// Role assigned to a user account.
    pub enum UserRole("Role") {
        Owner => "OWNER",
        Resident => "RESIDENT",
        Gi => "GI",
    }
}

impl LifecycleState for TaskState {
    const DELETED: Self = TaskState::Deleted;
}

impl LifecycleState for TagState {
    const DELETED: Self = TagState::Deleted;
}

impl LifecycleState for UserState {
    const DELETED: Self = UserState::Deleted;
}

impl LifecycleState for NoteState {
    const DELETED: Self = NoteState::Deleted;
}

impl LifecycleState for CommentState {
    const DELETED: Self = CommentState::Deleted;
}

/// Parse a caller-supplied state and reject the tombstone value.
///
/// `operation` names the write path (`"create"`, `"update"`) and is carried
/// in the resulting [`CoreError::DeletedStateInput`].
pub fn parse_active_state<S>(raw: &str, operation: &'static str) -> Result<S, CoreError>
where
    S: LifecycleState + FromStr<Err = CoreError>,
{
    let state: S = raw.parse()?;
    if state.is_deleted() {
        return Err(CoreError::DeletedStateInput { operation });
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_value() {
        for state in TaskState::ALL {
            assert_eq!(state.as_str().parse::<TaskState>().unwrap(), *state);
        }
        for state in UserState::ALL {
            assert_eq!(state.as_str().parse::<UserState>().unwrap(), *state);
        }
    }

    #[test]
    fn unknown_value_is_rejected_with_possible_values() {
        let err = "ARCHIVED".parse::<TagState>().unwrap_err();
        match err {
            CoreError::Validation(msg) => {
                assert!(msg.contains("ARCHIVED"));
                assert!(msg.contains("NEW, BLOCKED, DELETED"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert!("new".parse::<NoteState>().is_err());
    }

    #[test]
    fn note_has_no_blocked_state() {
        assert!("BLOCKED".parse::<NoteState>().is_err());
        assert_eq!(NoteState::ALL.len(), 2);
    }

    #[test]
    fn active_state_rejects_deleted() {
        let err = parse_active_state::<TaskState>("DELETED", "update").unwrap_err();
        assert!(matches!(
            err,
            CoreError::DeletedStateInput { operation: "update" }
        ));

        let ok = parse_active_state::<TaskState>("DONE", "update").unwrap();
        assert_eq!(ok, TaskState::Done);
    }

    #[test]
    fn deleted_constant_matches_variant() {
        assert!(CommentState::Deleted.is_deleted());
        assert!(!CommentState::Blocked.is_deleted());
        assert!(UserState::DELETED.is_deleted());
    }

    #[test]
    fn serializes_as_upper_case_name() {
        let json = serde_json::to_string(&UserState::Confirmed).unwrap();
        assert_eq!(json, "\"CONFIRMED\"");
        let role: UserRole = serde_json::from_str("\"RESIDENT\"").unwrap();
        assert_eq!(role, UserRole::Resident);
    }

    #[test]
    fn try_from_string_reports_invalid_rows() {
        assert!(TaskState::try_from("NEW".to_string()).is_ok());
        assert!(TaskState::try_from("BLOCKED".to_string()).is_err());
    }
}
