use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};

use super::cf_metadata::CfMetaData;
use crate::error::SchemaError;
use crate::schema_rows::SchemaMutation;

type FamilyKey = (String, String);
type FamilyMap = HashMap<FamilyKey, Arc<CfMetaData>>;

/// The set of column family definitions currently visible to readers.
///
/// The whole map is an immutable snapshot behind an [`ArcSwap`]: readers load
/// the current snapshot without locking, and writers install a modified copy
/// with a compare-and-swap, retrying if another writer got there first. A
/// [`CfMetaData`] obtained from [`get`](Self::get) therefore never changes
/// underneath its holder.
pub struct SchemaCache {
    families: ArcSwap<FamilyMap>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self {
            families: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Looks up the current definition of `keyspace.family`.
    pub fn get(&self, keyspace: &str, family: &str) -> Option<Arc<CfMetaData>> {
        self.families
            .load()
            .get(&(keyspace.to_string(), family.to_string()))
            .cloned()
    }

    /// Publishes `cfm`, replacing any previous definition of the same family.
    ///
    /// Returns the definition it replaced.
    pub fn publish(&self, cfm: CfMetaData) -> Option<Arc<CfMetaData>> {
        let key = (cfm.ks_name().to_string(), cfm.cf_name().to_string());
        let cfm = Arc::new(cfm);

        #[cfg(feature = "logging")]
        log::info!(
            "Publishing schema of {}.{} (generation {})",
            key.0,
            key.1,
            cfm.generation()
        );

        let previous = self.families.rcu(|current| {
            let mut next = FamilyMap::clone(current);
            next.insert(key.clone(), Arc::clone(&cfm));
            next
        });
        previous.get(&key).cloned()
    }

    /// Removes a dropped family, returning its last definition.
    pub fn remove(&self, keyspace: &str, family: &str) -> Option<Arc<CfMetaData>> {
        let key = (keyspace.to_string(), family.to_string());
        let previous = self.families.rcu(|current| {
            let mut next = FamilyMap::clone(current);
            next.remove(&key);
            next
        });
        let removed = previous.get(&key).cloned();

        if removed.is_some() {
            #[cfg(feature = "logging")]
            log::info!("Removed schema of {keyspace}.{family}");
        }

        removed
    }

    /// Replaces the definition of `keyspace.family` with `f` applied to it.
    ///
    /// `f` may run more than once if other writers race with this one; it
    /// always sees the definition it is about to replace.
    pub fn update<F>(
        &self,
        keyspace: &str,
        family: &str,
        f: F,
    ) -> Result<Arc<CfMetaData>, SchemaError>
    where
        F: Fn(&CfMetaData) -> Result<CfMetaData, SchemaError>,
    {
        let key = (keyspace.to_string(), family.to_string());
        let mut current = self.families.load_full();
        loop {
            let existing = current.get(&key).ok_or_else(|| {
                SchemaError::InvalidConfiguration(format!(
                    "column family {keyspace}.{family} does not exist"
                ))
            })?;
            let updated = Arc::new(f(existing)?);

            let mut next = FamilyMap::clone(&current);
            next.insert(key.clone(), Arc::clone(&updated));

            let previous = self.families.compare_and_swap(&current, Arc::new(next));
            if Arc::ptr_eq(&previous, &current) {
                return Ok(updated);
            }
            current = Guard::into_inner(previous);
        }
    }

    /// Every family of `keyspace`, ordered by name.
    pub fn families(&self, keyspace: &str) -> Vec<Arc<CfMetaData>> {
        let snapshot = self.families.load();
        let mut families: Vec<_> = snapshot
            .iter()
            .filter(|((ks, _), _)| ks == keyspace)
            .map(|(_, cfm)| Arc::clone(cfm))
            .collect();
        families.sort_by(|a, b| a.cf_name().cmp(b.cf_name()));
        families
    }

    pub fn len(&self) -> usize {
        self.families.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.load().is_empty()
    }

    /// Fingerprint of every published definition.
    ///
    /// Two caches holding equal definitions report the same version, whatever
    /// timestamps the definitions were written with.
    pub fn version(&self) -> u32 {
        let snapshot = self.families.load();
        let mut keys: Vec<_> = snapshot.keys().collect();
        keys.sort();

        let mut hasher = crc32fast::Hasher::new();
        for key in keys {
            if let Some(cfm) = snapshot.get(key) {
                let digest = SchemaMutation::from_metadata(cfm, 0).digest();
                hasher.update(&digest.to_le_bytes());
            }
        }
        hasher.finalize()
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new()
    }
}
