//! Batched entity resolution for one upload.
//!
//! An upload may carry hundreds of rows referencing a handful of users,
//! systems, and tiers. Instead of resolving per row, the cache collects the
//! distinct referenced identifiers across the whole upload, issues the
//! directory lookups concurrently, and runs a single batched query for
//! pre-existing active grants. Validation then runs entirely against the
//! in-memory maps.
//!
//! Map keys are lower-cased (matching is case-insensitive end to end);
//! resolved entities keep their canonical stored names.

use std::collections::{BTreeSet, HashMap, HashSet};

use futures::future::try_join_all;
use grantly_core::{
    models::{AccessTier, GrantKey, System, SystemInstance, UploadRow, User},
    AppError, GrantStore, SystemDirectory, UserDirectory,
};
use uuid::Uuid;

/// Lower-cased, trimmed form of an identifier used as a cache key.
pub(crate) fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Resolved entities and pre-existing grant keys for one upload.
pub struct ResolutionCache {
    users_by_email: HashMap<String, User>,
    systems_by_name: HashMap<String, System>,
    tiers_by_system_and_name: HashMap<(Uuid, String), AccessTier>,
    instances_by_system_and_name: HashMap<(Uuid, String), SystemInstance>,
    existing_active_grants: HashSet<GrantKey>,
}

impl ResolutionCache {
    /// Resolve every entity referenced by `rows`.
    ///
    /// Lookups are deduplicated per distinct identifier and issued
    /// concurrently; tier and instance lookups only go out for systems
    /// that resolved. The existing-grant check is one batched store query
    /// over every fully-resolved candidate tuple.
    #[tracing::instrument(skip_all, fields(rows = rows.len()))]
    pub async fn build(
        rows: &[UploadRow],
        users: &dyn UserDirectory,
        systems: &dyn SystemDirectory,
        grants: &dyn GrantStore,
    ) -> Result<Self, AppError> {
        // BTreeSet keeps lookup issue order deterministic.
        let emails: BTreeSet<String> = rows
            .iter()
            .map(|r| normalize(&r.user_email))
            .filter(|e| !e.is_empty())
            .collect();
        let system_names: BTreeSet<String> = rows
            .iter()
            .map(|r| normalize(&r.system_name))
            .filter(|n| !n.is_empty())
            .collect();

        let resolved_users =
            try_join_all(emails.iter().map(|email| users.find_by_email(email))).await?;
        let users_by_email: HashMap<String, User> = emails
            .into_iter()
            .zip(resolved_users)
            .filter_map(|(email, user)| user.map(|u| (email, u)))
            .collect();

        let resolved_systems =
            try_join_all(system_names.iter().map(|name| systems.find_by_name(name))).await?;
        let systems_by_name: HashMap<String, System> = system_names
            .into_iter()
            .zip(resolved_systems)
            .filter_map(|(name, system)| system.map(|s| (name, s)))
            .collect();

        // Tier and instance names are only meaningful within a resolved
        // system, so the dedup key is (system_id, normalized name).
        let mut tier_keys: BTreeSet<(Uuid, String)> = BTreeSet::new();
        let mut instance_keys: BTreeSet<(Uuid, String)> = BTreeSet::new();
        for row in rows {
            if let Some(system) = systems_by_name.get(&normalize(&row.system_name)) {
                let tier = normalize(&row.access_tier_name);
                if !tier.is_empty() {
                    tier_keys.insert((system.id, tier));
                }
                let instance = normalize(&row.instance_name);
                if !instance.is_empty() {
                    instance_keys.insert((system.id, instance));
                }
            }
        }

        let resolved_tiers = try_join_all(
            tier_keys
                .iter()
                .map(|(system_id, name)| systems.find_tier_by_name(*system_id, name)),
        )
        .await?;
        let tiers_by_system_and_name: HashMap<(Uuid, String), AccessTier> = tier_keys
            .into_iter()
            .zip(resolved_tiers)
            .filter_map(|(key, tier)| tier.map(|t| (key, t)))
            .collect();

        let resolved_instances = try_join_all(
            instance_keys
                .iter()
                .map(|(system_id, name)| systems.find_instance_by_name(*system_id, name)),
        )
        .await?;
        let instances_by_system_and_name: HashMap<(Uuid, String), SystemInstance> = instance_keys
            .into_iter()
            .zip(resolved_instances)
            .filter_map(|(key, instance)| instance.map(|i| (key, i)))
            .collect();

        let mut cache = Self {
            users_by_email,
            systems_by_name,
            tiers_by_system_and_name,
            instances_by_system_and_name,
            existing_active_grants: HashSet::new(),
        };

        // One batched existence query over every row whose user, system,
        // and tier all resolved.
        let candidates: Vec<GrantKey> = {
            let mut seen = HashSet::new();
            rows.iter()
                .filter_map(|row| cache.candidate_key(row))
                .filter(|key| seen.insert(*key))
                .collect()
        };
        cache.existing_active_grants = grants
            .existing_active_grants(&candidates)
            .await?
            .into_iter()
            .collect();

        Ok(cache)
    }

    pub fn user(&self, email: &str) -> Option<&User> {
        self.users_by_email.get(&normalize(email))
    }

    pub fn system(&self, name: &str) -> Option<&System> {
        self.systems_by_name.get(&normalize(name))
    }

    pub fn tier(&self, system_id: Uuid, name: &str) -> Option<&AccessTier> {
        self.tiers_by_system_and_name
            .get(&(system_id, normalize(name)))
    }

    pub fn instance(&self, system_id: Uuid, name: &str) -> Option<&SystemInstance> {
        self.instances_by_system_and_name
            .get(&(system_id, normalize(name)))
    }

    pub fn has_active_grant(&self, key: &GrantKey) -> bool {
        self.existing_active_grants.contains(key)
    }

    /// Grant key for a row whose user, system, and tier all resolved.
    ///
    /// The instance id is the resolved instance when present, `None` when
    /// the row names no instance or the name did not resolve (such a row
    /// carries an instance error of its own).
    pub fn candidate_key(&self, row: &UploadRow) -> Option<GrantKey> {
        let user = self.user(&row.user_email)?;
        let system = self.system(&row.system_name)?;
        let tier = self.tier(system.id, &row.access_tier_name)?;
        let instance_id = row
            .instance_name_opt()
            .and_then(|name| self.instance(system.id, name))
            .map(|i| i.id);
        Some(GrantKey {
            user_id: user.id,
            system_id: system.id,
            tier_id: tier.id,
            instance_id,
        })
    }
}
