//! Test helpers: in-memory directory and grant store.
//!
//! The pipeline only touches its collaborators through the grantly-core
//! traits, so the suite runs against these in-memory implementations
//! instead of a live Postgres. Lookup counters let tests assert the
//! batching behavior (one lookup per distinct identifier, one existence
//! query per upload).

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use grantly_core::models::{
    AccessTier, GrantDetails, GrantKey, GrantStatus, NewGrant, System, SystemInstance, User,
};
use grantly_core::{AppError, GrantStore, SystemDirectory, UserDirectory};
use grantly_services::BulkUploadService;
use uuid::Uuid;

#[derive(Default)]
pub struct TestDirectory {
    users: Mutex<Vec<User>>,
    systems: Mutex<Vec<System>>,
    tiers: Mutex<Vec<AccessTier>>,
    instances: Mutex<Vec<SystemInstance>>,
    active_grants: Mutex<HashSet<GrantKey>>,
    created: Mutex<Vec<GrantDetails>>,
    fail_next_insert: Mutex<Option<AppError>>,
    pub user_lookups: AtomicUsize,
    pub system_lookups: AtomicUsize,
    pub tier_lookups: AtomicUsize,
    pub existence_queries: AtomicUsize,
}

impl TestDirectory {
    pub fn add_user(&self, name: &str, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.users.lock().unwrap().push(User {
            id,
            name: name.to_string(),
            email: email.to_string(),
        });
        id
    }

    pub fn add_system(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.systems.lock().unwrap().push(System {
            id,
            name: name.to_string(),
        });
        id
    }

    pub fn add_tier(&self, system_id: Uuid, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.tiers.lock().unwrap().push(AccessTier {
            id,
            system_id,
            name: name.to_string(),
        });
        id
    }

    pub fn add_instance(&self, system_id: Uuid, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.instances.lock().unwrap().push(SystemInstance {
            id,
            system_id,
            name: name.to_string(),
        });
        id
    }

    pub fn add_active_grant(&self, key: GrantKey) {
        self.active_grants.lock().unwrap().insert(key);
    }

    pub fn fail_next_insert_with(&self, err: AppError) {
        *self.fail_next_insert.lock().unwrap() = Some(err);
    }

    pub fn created_grants(&self) -> Vec<GrantDetails> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserDirectory for TestDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.user_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()))
            .cloned())
    }
}

#[async_trait]
impl SystemDirectory for TestDirectory {
    async fn find_by_name(&self, name: &str) -> Result<Option<System>, AppError> {
        self.system_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .systems
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
            .cloned())
    }

    async fn find_tier_by_name(
        &self,
        system_id: Uuid,
        name: &str,
    ) -> Result<Option<AccessTier>, AppError> {
        self.tier_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .tiers
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.system_id == system_id && t.name.eq_ignore_ascii_case(name.trim()))
            .cloned())
    }

    async fn find_instance_by_name(
        &self,
        system_id: Uuid,
        name: &str,
    ) -> Result<Option<SystemInstance>, AppError> {
        Ok(self
            .instances
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.system_id == system_id && i.name.eq_ignore_ascii_case(name.trim()))
            .cloned())
    }
}

#[async_trait]
impl GrantStore for TestDirectory {
    async fn existing_active_grants(&self, keys: &[GrantKey]) -> Result<Vec<GrantKey>, AppError> {
        self.existence_queries.fetch_add(1, Ordering::SeqCst);
        let active = self.active_grants.lock().unwrap();
        Ok(keys.iter().filter(|k| active.contains(k)).copied().collect())
    }

    async fn create_many(
        &self,
        grants: &[NewGrant],
        granted_by: Uuid,
    ) -> Result<Vec<GrantDetails>, AppError> {
        if let Some(err) = self.fail_next_insert.lock().unwrap().take() {
            return Err(err);
        }
        if grants.is_empty() {
            return Ok(Vec::new());
        }

        // Mirror the partial unique index: reject the whole batch if any
        // key already has an active grant.
        {
            let active = self.active_grants.lock().unwrap();
            if grants.iter().any(|g| active.contains(&g.key())) {
                return Err(AppError::Conflict(
                    "An identical active grant was created concurrently; no records were inserted"
                        .to_string(),
                ));
            }
        }

        // One timestamp for the whole batch.
        let granted_at = Utc::now();
        let mut details = Vec::with_capacity(grants.len());
        for grant in grants {
            let user = self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == grant.user_id)
                .cloned()
                .expect("grant references a known user");
            let system = self
                .systems
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.id == grant.system_id)
                .cloned()
                .expect("grant references a known system");
            let tier = self
                .tiers
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.id == grant.tier_id)
                .cloned()
                .expect("grant references a known tier");
            let instance = grant.instance_id.map(|id| {
                self.instances
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|i| i.id == id)
                    .cloned()
                    .expect("grant references a known instance")
            });

            details.push(GrantDetails {
                id: Uuid::new_v4(),
                user_id: user.id,
                user_email: user.email,
                user_name: user.name,
                system_id: system.id,
                system_name: system.name,
                tier_id: tier.id,
                tier_name: tier.name,
                instance_id: grant.instance_id,
                instance_name: instance.map(|i| i.name),
                status: GrantStatus::Active,
                granted_by,
                granted_at,
                notes: grant.notes.clone(),
            });
            self.active_grants.lock().unwrap().insert(grant.key());
        }

        self.created.lock().unwrap().extend(details.clone());
        Ok(details)
    }
}

/// Seeded entity ids for the standard fixture.
pub struct Fixture {
    pub alice: Uuid,
    pub bob: Uuid,
    pub github: Uuid,
    pub github_admin: Uuid,
    pub github_viewer: Uuid,
    pub github_production: Uuid,
    pub jira: Uuid,
    pub jira_admin: Uuid,
    pub granted_by: Uuid,
}

/// Directory with two users, a GitHub system (Admin/Viewer tiers, one
/// Production instance), and a Jira system (Admin tier only).
pub fn seed() -> (Arc<TestDirectory>, Fixture) {
    let dir = Arc::new(TestDirectory::default());
    let alice = dir.add_user("Alice", "alice@example.com");
    let bob = dir.add_user("Bob", "bob@example.com");
    let github = dir.add_system("GitHub");
    let github_admin = dir.add_tier(github, "Admin");
    let github_viewer = dir.add_tier(github, "Viewer");
    let github_production = dir.add_instance(github, "Production");
    let jira = dir.add_system("Jira");
    let jira_admin = dir.add_tier(jira, "Admin");
    let granted_by = dir.add_user("Admin User", "admin@example.com");

    let fixture = Fixture {
        alice,
        bob,
        github,
        github_admin,
        github_viewer,
        github_production,
        jira,
        jira_admin,
        granted_by,
    };
    (dir, fixture)
}

pub fn service(dir: &Arc<TestDirectory>) -> BulkUploadService {
    BulkUploadService::new(dir.clone(), dir.clone(), dir.clone())
}
