//! In-process user repository

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tavola_core::entities::User;
use tavola_core::traits::{RepoResult, UserRepository};
use tavola_core::value_objects::{Role, TenantId, UserId};
use tavola_core::DomainError;

struct UserRecord {
    user: User,
    password_hash: String,
}

/// User repository backed by concurrent maps.
///
/// A secondary index maps `(tenant, phone)` to the user id; the phone claim
/// goes through the index entry so two concurrent registrations of the same
/// phone cannot both succeed.
pub struct MemoryUserRepository {
    users: DashMap<UserId, UserRecord>,
    by_phone: DashMap<(TenantId, String), UserId>,
}

impl MemoryUserRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            by_phone: DashMap::new(),
        }
    }

    /// Number of stored users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryUserRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryUserRepository")
            .field("users", &self.users.len())
            .finish()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: &User, password_hash: &str) -> RepoResult<()> {
        let key = (user.tenant_id, user.phone.clone());
        match self.by_phone.entry(key) {
            Entry::Occupied(_) => return Err(DomainError::PhoneAlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }

        self.users.insert(
            user.id,
            UserRecord {
                user: user.clone(),
                password_hash: password_hash.to_string(),
            },
        );

        tracing::debug!(user_id = %user.id, tenant_id = %user.tenant_id, "User created");
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        Ok(self.users.get(&id).map(|r| r.user.clone()))
    }

    async fn find_by_phone(&self, tenant_id: TenantId, phone: &str) -> RepoResult<Option<User>> {
        let Some(id) = self
            .by_phone
            .get(&(tenant_id, phone.to_string()))
            .map(|r| *r)
        else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|r| r.user.clone()))
    }

    async fn phone_exists(&self, tenant_id: TenantId, phone: &str) -> RepoResult<bool> {
        Ok(self.by_phone.contains_key(&(tenant_id, phone.to_string())))
    }

    async fn get_password_hash(&self, id: UserId) -> RepoResult<Option<String>> {
        Ok(self.users.get(&id).map(|r| r.password_hash.clone()))
    }

    async fn update_role(&self, id: UserId, role: Role) -> RepoResult<()> {
        let mut record = self
            .users
            .get_mut(&id)
            .ok_or(DomainError::UserNotFound(id))?;
        record.user.set_role(role);
        tracing::debug!(user_id = %id, role = %role, "User role updated");
        Ok(())
    }
}
