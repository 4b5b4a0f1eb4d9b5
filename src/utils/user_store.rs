#![forbid(unsafe_code)]

use std::sync::{Mutex, MutexGuard};

use log::{debug, error};

use crate::utils::errors::Errors;
use crate::utils::store_types::{User, UserInput, UserPatch, DEFAULT_ROLE};

// ***************************************************************************
//                                Seed Records
// ***************************************************************************
// Records present in every freshly started store.
const SEED_USERS: [(i64, &str, &str, &str); 3] = [
    (1, "Zhang San", "zhangsan@example.com", "admin"),
    (2, "Li Si",     "lisi@example.com",     "user"),
    (3, "Wang Wu",   "wangwu@example.com",   "user"),
];

// ***************************************************************************
//                                 UserStore
// ***************************************************************************
// ---------------------------------------------------------------------------
// UserStore:
// ---------------------------------------------------------------------------
/** The in-memory user collection.  A single mutex guards both the ordered
 * record list and the id counter, so every operation observes a consistent
 * snapshot and mutations are serialized.  The lock is only held for the
 * in-memory work; callers receive clones, never references into the list.
 *
 * Ids come from a counter that only moves forward, so an id freed by a
 * delete is never handed out again.
 */
#[derive(Debug)]
pub struct UserStore {
    inner: Mutex<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    users: Vec<User>,
    next_id: i64,
}

impl UserStore {
    /// Create a store holding the seed records.
    pub fn new() -> Self {
        let users = SEED_USERS
            .iter()
            .map(|(id, name, email, role)| User::new(*id, name, email, role))
            .collect();
        Self::with_users(users)
    }

    /// Create a store holding exactly the given records.
    pub fn with_users(users: Vec<User>) -> Self {
        let next_id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        Self {inner: Mutex::new(StoreInner {users, next_id})}
    }

    /// All records in insertion order.
    pub fn list(&self) -> Result<Vec<User>, Errors> {
        Ok(self.lock()?.users.clone())
    }

    /// Number of live records.
    pub fn len(&self) -> Result<usize, Errors> {
        Ok(self.lock()?.users.len())
    }

    pub fn is_empty(&self) -> Result<bool, Errors> {
        Ok(self.lock()?.users.is_empty())
    }

    pub fn find_by_id(&self, id: i64) -> Result<User, Errors> {
        let inner = self.lock()?;
        inner.users.iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(Errors::UserNotFound(id))
    }

    /// Append a new record.  Name and email are validated by the caller.
    pub fn create(&self, input: UserInput) -> Result<User, Errors> {
        let role = match input.role {
            Some(r) if !r.is_empty() => r,
            _ => DEFAULT_ROLE.to_string(),
        };

        let mut inner = self.lock()?;
        let user = User {id: inner.next_id, name: input.name, email: input.email, role};
        inner.next_id += 1;
        inner.users.push(user.clone());
        debug!("User {} created, next id is {}.", user.id, inner.next_id);
        Ok(user)
    }

    /// Merge the patch into the record with the given id.
    pub fn update(&self, id: i64, patch: &UserPatch) -> Result<User, Errors> {
        let mut inner = self.lock()?;
        let user = inner.users.iter_mut()
            .find(|u| u.id == id)
            .ok_or(Errors::UserNotFound(id))?;
        patch.apply(user);
        Ok(user.clone())
    }

    /// Remove and return the record with the given id.
    pub fn delete(&self, id: i64) -> Result<User, Errors> {
        let mut inner = self.lock()?;
        let index = inner.users.iter()
            .position(|u| u.id == id)
            .ok_or(Errors::UserNotFound(id))?;
        Ok(inner.users.remove(index))
    }

    // ---------------------------------------------------------------------------
    // lock:
    // ---------------------------------------------------------------------------
    // A poisoned lock means a thread panicked mid-mutation; report it
    // instead of propagating the panic into this request.
    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>, Errors> {
        self.inner.lock().map_err(|e| {
            let err = Errors::StoreUnavailable(e.to_string());
            error!("{}", err);
            err
        })
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}
