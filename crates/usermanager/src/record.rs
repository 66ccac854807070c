//! User records and drafts.
//!
//! Every field is kept as the string the user typed; nothing here checks that
//! an email is well formed or an age is numeric. Whatever the document store
//! accepts is accepted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One editable field of a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Display name.
    Name,
    /// Email address.
    Email,
    /// Age, stored untyped.
    Age,
}

impl Field {
    /// All fields in form order.
    pub const ALL: [Field; 3] = [Field::Name, Field::Email, Field::Age];
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Email => write!(f, "email"),
            Self::Age => write!(f, "age"),
        }
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "age" => Ok(Self::Age),
            other => Err(format!("unknown field '{other}' (expected name, email or age)")),
        }
    }
}

/// The field set of a user document, without an identifier.
///
/// Used both as the new-record draft and as the payload sent to the store on
/// insert and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Draft {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Age as typed.
    pub age: String,
}

impl Draft {
    /// Create a draft from its three fields.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            age: age.into(),
        }
    }

    /// Read one field.
    #[must_use]
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Age => &self.age,
        }
    }

    /// Replace one field.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Age => &mut self.age,
        };
        *slot = value.into();
    }

    /// Check if every field is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty() && self.age.is_empty()
    }
}

/// A user document as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Identifier assigned by the store.
    pub id: String,

    /// The document's fields.
    #[serde(flatten)]
    pub fields: Draft,
}

impl Record {
    /// Create a record from an identifier and its fields.
    #[must_use]
    pub fn new(id: impl Into<String>, fields: Draft) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// An edit in progress: a copy of one record, detached from the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditDraft {
    /// Identifier of the record being edited.
    pub id: String,
    /// Working copy of the record's fields.
    pub fields: Draft,
}

impl From<&Record> for EditDraft {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            fields: record.fields.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_display_and_parse() {
        for field in Field::ALL {
            assert_eq!(field.to_string().parse::<Field>(), Ok(field));
        }
        assert_eq!("EMAIL".parse::<Field>(), Ok(Field::Email));
        assert!("phone".parse::<Field>().is_err());
    }

    #[test]
    fn test_draft_default_is_empty() {
        let draft = Draft::default();
        assert!(draft.is_empty());
        assert_eq!(draft.get(Field::Name), "");
    }

    #[test]
    fn test_draft_set_one_field() {
        let mut draft = Draft::default();
        draft.set(Field::Email, "a@x.com");

        assert_eq!(draft.email, "a@x.com");
        assert_eq!(draft.name, "");
        assert!(!draft.is_empty());
    }

    #[test]
    fn test_draft_accepts_unvalidated_values() {
        let mut draft = Draft::new("", "not-an-email", "");
        draft.set(Field::Age, "thirty");
        assert_eq!(draft.get(Field::Age), "thirty");
        assert_eq!(draft.get(Field::Email), "not-an-email");
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = Record::new("u1", Draft::new("A", "a@x.com", "30"));
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["id"], "u1");
        assert_eq!(json["name"], "A");
        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["age"], "30");
    }

    #[test]
    fn test_draft_deserialize_missing_fields_default() {
        let draft: Draft = serde_json::from_str(r#"{"name": "Only"}"#).unwrap();
        assert_eq!(draft.name, "Only");
        assert_eq!(draft.email, "");
        assert_eq!(draft.age, "");
    }

    #[test]
    fn test_edit_draft_copies_record() {
        let record = Record::new("u9", Draft::new("B", "b@x.com", "41"));
        let mut edit = EditDraft::from(&record);
        edit.fields.set(Field::Name, "C");

        assert_eq!(edit.id, "u9");
        assert_eq!(record.fields.name, "B");
    }
}
