use log::warn;
use serde_json::Value;

use crate::room::Room;

/// One field condition inside an `$or` combinator.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The named field equals the value.
    Equals { field: String, value: Value },
    /// The named sequence field contains the value.
    Contains { field: String, value: Value },
}

impl Condition {
    pub fn host(value: impl Into<String>) -> Self {
        Condition::Equals {
            field: "host".to_string(),
            value: Value::String(value.into()),
        }
    }

    pub fn participant(value: impl Into<String>) -> Self {
        Condition::Contains {
            field: "participants".to_string(),
            value: Value::String(value.into()),
        }
    }

    pub fn field(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, room: &Room) -> bool {
        match self {
            Condition::Equals { field, value } => room
                .field_value(field)
                .map_or(false, |current| current == *value),
            Condition::Contains { field, value } => {
                room.field_value(field).map_or(false, |current| match current {
                    Value::Array(items) => items.contains(value),
                    _ => false,
                })
            }
        }
    }
}

/// Decides whether a room is part of a `find` result.
///
/// Only the shapes the store has ever needed are expressible: the empty
/// filter and a single `$or` over field conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RoomFilter {
    #[default]
    MatchAll,
    Or(Vec<Condition>),
}

impl RoomFilter {
    pub fn or(conditions: Vec<Condition>) -> Self {
        RoomFilter::Or(conditions)
    }

    pub fn matches(&self, room: &Room) -> bool {
        match self {
            RoomFilter::MatchAll => true,
            // conditions are checked in list order, first hit wins
            RoomFilter::Or(conditions) => {
                conditions.iter().any(|condition| condition.matches(room))
            }
        }
    }

    /// Parses the document form of a filter: `{}` or `{"$or": [...]}`.
    ///
    /// Unsupported keys and combinators are ignored and contribute nothing
    /// to filtering.
    pub fn from_document(document: &Value) -> Self {
        let entries = match document.as_object() {
            Some(entries) => entries,
            None => {
                warn!("filter document is not an object, matching everything");
                return RoomFilter::MatchAll;
            }
        };

        let mut conditions = None;
        for (key, value) in entries {
            if key == "$or" {
                match value.as_array() {
                    Some(items) => {
                        conditions =
                            Some(items.iter().filter_map(parse_condition).collect());
                    }
                    None => warn!("$or value is not an array, ignoring"),
                }
            } else {
                warn!("unsupported filter key `{key}`, ignoring");
            }
        }

        match conditions {
            Some(conditions) => RoomFilter::Or(conditions),
            None => RoomFilter::MatchAll,
        }
    }
}

fn parse_condition(entry: &Value) -> Option<Condition> {
    let fields = match entry.as_object() {
        Some(fields) => fields,
        None => {
            warn!("filter condition is not an object, ignoring");
            return None;
        }
    };

    // conditions are single-key records; only the first key counts
    let (field, value) = fields.iter().next()?;
    let condition = match field.as_str() {
        "participants" => Condition::Contains {
            field: field.clone(),
            value: value.clone(),
        },
        _ => Condition::Equals {
            field: field.clone(),
            value: value.clone(),
        },
    };
    Some(condition)
}
