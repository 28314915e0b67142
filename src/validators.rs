//! Type validator table: maps a type tag to a predicate over a decoded value.
//!
//! | Tag | Accepts |
//! |-----|---------|
//! | `Int` | integer number |
//! | `String` | string |
//! | `Boolean` | boolean |
//! | `List` | array (elements unchecked) |
//! | `Date` | `DD-MM-YYYY` string naming a real calendar date |
//! | `UUID` | version 4 UUID string |
//! | `BearerAuth` | `Bearer <token>` string |
//!
//! Predicates never fail: a value of the wrong JSON type is simply rejected,
//! so the string `"true"` is not a `Boolean` and `"42"` is not an `Int`.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use chrono::NaiveDate;
use email_address::EmailAddress;
use regex::Regex;
use serde_json::Value;

/// Predicate deciding whether a value has the shape a tag names.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Mapping from type tag to predicate.
#[derive(Clone)]
pub struct ValidatorTable {
    predicates: HashMap<String, Predicate>,
}

impl ValidatorTable {
    /// An empty table; every tag is unknown.
    pub fn empty() -> Self {
        Self {
            predicates: HashMap::new(),
        }
    }

    /// The built-in tags listed in the module docs.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        table.insert("Int", is_int);
        table.insert("String", is_string);
        table.insert("Boolean", is_boolean);
        table.insert("List", is_list);
        table.insert("Date", is_date);
        table.insert("UUID", is_uuid);
        table.insert("BearerAuth", is_bearer_auth);
        table
    }

    /// Add or replace the predicate for `tag`.
    pub fn insert<F>(&mut self, tag: impl Into<String>, predicate: F)
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(tag.into(), Arc::new(predicate));
    }

    pub fn get(&self, tag: &str) -> Option<&Predicate> {
        self.predicates.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.predicates.contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.predicates.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl Default for ValidatorTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for ValidatorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorTable")
            .field("tags", &self.tags())
            .finish()
    }
}

pub fn is_int(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        _ => false,
    }
}

pub fn is_string(value: &Value) -> bool {
    value.is_string()
}

pub fn is_boolean(value: &Value) -> bool {
    value.is_boolean()
}

pub fn is_list(value: &Value) -> bool {
    value.is_array()
}

/// `DD-MM-YYYY` with zero-padded day and month, checked against the calendar.
pub fn is_date(value: &Value) -> bool {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    let Some(s) = value.as_str() else {
        return false;
    };
    let shape = SHAPE.get_or_init(|| Regex::new(r"^\d{2}-\d{2}-\d{4}$").unwrap());
    shape.is_match(s) && NaiveDate::parse_from_str(s, "%d-%m-%Y").is_ok()
}

/// Version 4 UUID: version nibble `4`, variant nibble one of `8 9 a b`.
pub fn is_uuid(value: &Value) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let Some(s) = value.as_str() else {
        return false;
    };
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(
            r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-4[0-9a-fA-F]{3}-[89abAB][0-9a-fA-F]{3}-[0-9a-fA-F]{12}$",
        )
        .unwrap()
    });
    pattern.is_match(s.trim())
}

/// `Bearer <token>` where the token uses the RFC 6750 character set.
pub fn is_bearer_auth(value: &Value) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let Some(s) = value.as_str() else {
        return false;
    };
    let pattern =
        PATTERN.get_or_init(|| Regex::new(r"^Bearer [A-Za-z0-9\-._~+/]+=*$").unwrap());
    pattern.is_match(s.trim())
}

/// RFC 5322 mailbox, bare (`local@domain`) or with display text
/// (`Name <local@domain>`). Single-label domains such as `localhost` pass.
///
/// Not part of [`ValidatorTable::builtin`]; add it with
/// `table.insert("Email", is_email)`.
pub fn is_email(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| EmailAddress::is_valid(s.trim()))
}
