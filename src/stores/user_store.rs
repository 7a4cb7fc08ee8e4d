use crate::core::error::StoreError;
use crate::models::user::{NewUser, Presence, User, UserUpdate};
use crate::wal::wal::{Wal, WalOperation};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// In-memory user table backed by the write-ahead log.
///
/// Every mutation is appended to the WAL before it becomes visible. The
/// userid index doubles as the uniqueness constraint: a userid is reserved
/// under the index entry lock, so two concurrent registrations for the same
/// handle cannot both succeed.
pub struct UserStore {
    users: DashMap<u32, User>,
    by_userid: DashMap<String, u32>,
    next_id: AtomicU32,
    wal: Arc<Wal>,
}

impl UserStore {
    pub fn new(wal: Arc<Wal>) -> Self {
        Self::with_capacity(wal, 0)
    }

    pub fn with_capacity(wal: Arc<Wal>, capacity: usize) -> Self {
        Self {
            users: DashMap::with_capacity(capacity),
            by_userid: DashMap::with_capacity(capacity),
            next_id: AtomicU32::new(1),
            wal,
        }
    }

    /// Insert a new user. Fails with `DuplicateUserId` if the handle is taken.
    pub fn create(&self, new_user: NewUser, now: i64) -> Result<User, StoreError> {
        let slot = match self.by_userid.entry(new_user.userid.clone()) {
            Entry::Occupied(_) => {
                return Err(StoreError::DuplicateUserId(new_user.userid));
            }
            Entry::Vacant(slot) => slot,
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        self.wal.log_operation(&WalOperation::CreateUser {
            id,
            username: new_user.username.clone(),
            userid: new_user.userid.clone(),
            password_hash: new_user.password_hash.clone(),
            degree_year: new_user.degree_year,
            created_at: now,
        })?;

        let user = User::new(
            id,
            new_user.username,
            new_user.userid,
            new_user.password_hash,
            new_user.degree_year,
            now,
        );
        self.users.insert(id, user.clone());
        slot.insert(id);

        debug!(user_id = id, userid = %user.userid, "User row created");

        Ok(user)
    }

    pub fn find_by_id(&self, id: u32) -> Option<User> {
        self.users.get(&id).map(|entry| entry.value().clone())
    }

    pub fn find_by_userid(&self, userid: &str) -> Option<User> {
        let id = *self.by_userid.get(userid)?.value();
        self.find_by_id(id)
    }

    pub fn userid_exists(&self, userid: &str) -> bool {
        self.by_userid.contains_key(userid)
    }

    /// Users on one side of the index page, grouped by cohort
    /// (D, M2, M1, B4, B3, then OB) and by ascending id within a cohort.
    pub fn list_by_presence(&self, presence: Presence) -> Vec<User> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|entry| entry.value().presence() == presence)
            .map(|entry| entry.value().clone())
            .collect();

        users.sort_by_key(|user| (user.degree_year.listing_rank(), user.id));
        users
    }

    /// Apply a partial update to one row and return the new row.
    ///
    /// The row stays locked from the WAL append until the change is applied,
    /// so a failed append leaves it untouched.
    pub fn update(&self, id: u32, update: &UserUpdate) -> Result<User, StoreError> {
        let mut row = self.users.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if update.is_empty() {
            return Ok(row.clone());
        }

        self.wal.log_operation(&WalOperation::UpdateUser {
            id,
            update: update.clone(),
        })?;

        update.apply_to(&mut row);
        Ok(row.clone())
    }

    /// Rebuild state from a replayed WAL entry without logging it again
    pub fn apply_replayed(&self, op: &WalOperation) {
        match op {
            WalOperation::CreateUser {
                id,
                username,
                userid,
                password_hash,
                degree_year,
                created_at,
            } => {
                if let Some(previous) = self.by_userid.get(userid.as_str()).map(|e| *e.value()) {
                    if previous != *id {
                        warn!(
                            user_id = id,
                            existing_id = previous,
                            userid = %userid,
                            "Duplicate userid in WAL, skipping create"
                        );
                        return;
                    }
                }

                let user = User::new(
                    *id,
                    username.clone(),
                    userid.clone(),
                    password_hash.clone(),
                    *degree_year,
                    *created_at,
                );
                self.users.insert(*id, user);
                self.by_userid.insert(userid.clone(), *id);
                self.next_id.fetch_max(id.saturating_add(1), Ordering::SeqCst);
            }
            WalOperation::UpdateUser { id, update } => match self.users.get_mut(id) {
                Some(mut row) => update.apply_to(&mut row),
                None => {
                    warn!(user_id = id, "WAL update for unknown user, skipping");
                }
            },
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
