// This file contains the user record structs and related definitions.
#![forbid(unsafe_code)]

use poem_openapi::Object;

// Role assigned when a create request omits one.
pub const DEFAULT_ROLE: &str = "user";

// ---------------------------------------------------------------------------
// User:
// ---------------------------------------------------------------------------
/// A live user record.  The id is assigned by the store and never changes.
#[derive(Object, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl User {
    pub fn new(id: i64, name: &str, email: &str, role: &str) -> User {
        User {id, name: name.to_string(), email: email.to_string(), role: role.to_string()}
    }
}

// ---------------------------------------------------------------------------
// UserInput:
// ---------------------------------------------------------------------------
/// Fields of a record about to be created.  An absent or empty role is
/// replaced with DEFAULT_ROLE by the store.
#[derive(Debug, Clone)]
pub struct UserInput {
    pub name: String,
    pub email: String,
    pub role: Option<String>,
}

impl UserInput {
    pub fn new(name: String, email: String, role: Option<String>) -> UserInput {
        UserInput {name, email, role}
    }
}

// ---------------------------------------------------------------------------
// UserPatch:
// ---------------------------------------------------------------------------
/// A partial update.  Only the fields that are Some replace the stored values.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl UserPatch {
    pub fn new(name: Option<String>, email: Option<String>, role: Option<String>) -> UserPatch {
        UserPatch {name, email, role}
    }

    /// Overlay the supplied fields onto the record, leaving the rest untouched.
    pub fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(role) = &self.role {
            user.role = role.clone();
        }
    }
}
