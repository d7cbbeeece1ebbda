use crate::domain::contribution::Contribution;
use crate::domain::group::{ActorId, Group, GroupId};
use crate::domain::membership::Membership;
use crate::domain::ports::{ContributionStore, GroupStore, MembershipStore};
use crate::error::{Result, TontineError};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Column family for group records.
pub const CF_GROUPS: &str = "groups";
/// Column family for membership records.
pub const CF_MEMBERSHIPS: &str = "memberships";
/// Column family for contribution records.
pub const CF_CONTRIBUTIONS: &str = "contributions";

/// Key in the default column family holding the group id counter.
const NEXT_GROUP_ID_KEY: &[u8] = b"next_group_id";

/// A persistent store implementation using RocksDB.
///
/// One column family per table, big-endian composite keys so records of a
/// group are adjacent, JSON values. `Clone` shares the underlying `Arc<DB>`.
/// Inserts take an internal mutex so the existence check and the put form
/// one atomic step; that is what makes the unique-key constraints hold under
/// concurrent duplicate submissions.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| TontineError::Storage(Box::new(e)))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| TontineError::Storage(Box::new(e)))
}

fn membership_key(group: GroupId, actor: ActorId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&group.0.to_be_bytes());
    key[8..].copy_from_slice(&actor.0.to_be_bytes());
    key
}

fn contribution_key(group: GroupId, actor: ActorId, round: u32) -> [u8; 20] {
    let mut key = [0u8; 20];
    key[..8].copy_from_slice(&group.0.to_be_bytes());
    key[8..16].copy_from_slice(&actor.0.to_be_bytes());
    key[16..].copy_from_slice(&round.to_be_bytes());
    key
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the given path, ensuring the
    /// three column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_GROUPS, Options::default()),
            ColumnFamilyDescriptor::new(CF_MEMBERSHIPS, Options::default()),
            ColumnFamilyDescriptor::new(CF_CONTRIBUTIONS, Options::default()),
        ];
        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            TontineError::Storage(Box::new(std::io::Error::other(format!(
                "column family {name} not found"
            ))))
        })
    }

    /// All records of a column family whose key starts with `prefix`.
    fn scan_prefix<T: DeserializeOwned>(&self, cf_name: &str, prefix: &[u8]) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mode = rocksdb::IteratorMode::From(prefix, rocksdb::Direction::Forward);
        let mut records = Vec::new();
        for item in self.db.iterator_cf(cf, mode) {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            records.push(decode(&value)?);
        }
        Ok(records)
    }

    fn scan_all<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut records = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            records.push(decode(&value)?);
        }
        Ok(records)
    }
}

#[async_trait]
impl GroupStore for RocksDbStore {
    async fn allocate_id(&self) -> Result<GroupId> {
        let guard = self.write_lock.lock().expect("store lock poisoned");
        let next = match self.db.get(NEXT_GROUP_ID_KEY)? {
            Some(bytes) => {
                let buf: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    TontineError::Storage(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "corrupt group id counter",
                    )))
                })?;
                u64::from_be_bytes(buf) + 1
            }
            None => 1,
        };
        self.db.put(NEXT_GROUP_ID_KEY, next.to_be_bytes())?;
        drop(guard);
        Ok(GroupId(next))
    }

    async fn insert(&self, group: Group) -> Result<()> {
        let cf = self.cf(CF_GROUPS)?;
        self.db
            .put_cf(&cf, group.id.0.to_be_bytes(), encode(&group)?)?;
        Ok(())
    }

    async fn get(&self, id: GroupId) -> Result<Option<Group>> {
        let cf = self.cf(CF_GROUPS)?;
        match self.db.get_cf(&cf, id.0.to_be_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, group: Group) -> Result<()> {
        GroupStore::insert(self, group).await
    }

    async fn all(&self) -> Result<Vec<Group>> {
        let mut groups: Vec<Group> = self.scan_all(CF_GROUPS)?;
        groups.sort_by_key(|g| g.id);
        Ok(groups)
    }
}

#[async_trait]
impl MembershipStore for RocksDbStore {
    async fn insert(&self, membership: Membership) -> Result<()> {
        let cf = self.cf(CF_MEMBERSHIPS)?;
        let key = membership_key(membership.group_id, membership.actor_id);

        let guard = self.write_lock.lock().expect("store lock poisoned");
        if self.db.get_pinned_cf(&cf, key)?.is_some() {
            return Err(TontineError::Conflict(format!(
                "actor {} is already a participant of group {}",
                membership.actor_id, membership.group_id
            )));
        }
        let siblings: Vec<Membership> =
            self.scan_prefix(CF_MEMBERSHIPS, &membership.group_id.0.to_be_bytes())?;
        if siblings.iter().any(|m| m.position == membership.position) {
            return Err(TontineError::Conflict(format!(
                "position {} is already taken in group {}",
                membership.position, membership.group_id
            )));
        }
        self.db.put_cf(&cf, key, encode(&membership)?)?;
        drop(guard);
        Ok(())
    }

    async fn get(&self, group: GroupId, actor: ActorId) -> Result<Option<Membership>> {
        let cf = self.cf(CF_MEMBERSHIPS)?;
        match self.db.get_cf(&cf, membership_key(group, actor))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, membership: Membership) -> Result<()> {
        let cf = self.cf(CF_MEMBERSHIPS)?;
        let key = membership_key(membership.group_id, membership.actor_id);
        if self.db.get_pinned_cf(&cf, key)?.is_none() {
            return Err(TontineError::NotFound(format!(
                "membership of actor {} in group {}",
                membership.actor_id, membership.group_id
            )));
        }
        self.db.put_cf(&cf, key, encode(&membership)?)?;
        Ok(())
    }

    async fn for_group(&self, group: GroupId) -> Result<Vec<Membership>> {
        let mut members: Vec<Membership> =
            self.scan_prefix(CF_MEMBERSHIPS, &group.0.to_be_bytes())?;
        members.sort_by_key(|m| m.position);
        Ok(members)
    }

    async fn group_ids_for_actor(&self, actor: ActorId) -> Result<Vec<GroupId>> {
        let all: Vec<Membership> = self.scan_all(CF_MEMBERSHIPS)?;
        let mut ids: Vec<GroupId> = all
            .into_iter()
            .filter(|m| m.actor_id == actor)
            .map(|m| m.group_id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl ContributionStore for RocksDbStore {
    async fn insert(&self, contribution: Contribution) -> Result<()> {
        let cf = self.cf(CF_CONTRIBUTIONS)?;
        let key = contribution_key(
            contribution.group_id,
            contribution.actor_id,
            contribution.round_number,
        );

        let guard = self.write_lock.lock().expect("store lock poisoned");
        if self.db.get_pinned_cf(&cf, key)?.is_some() {
            return Err(TontineError::Conflict(format!(
                "actor {} has already paid for round {} of group {}",
                contribution.actor_id, contribution.round_number, contribution.group_id
            )));
        }
        self.db.put_cf(&cf, key, encode(&contribution)?)?;
        drop(guard);
        Ok(())
    }

    async fn get(
        &self,
        group: GroupId,
        actor: ActorId,
        round: u32,
    ) -> Result<Option<Contribution>> {
        let cf = self.cf(CF_CONTRIBUTIONS)?;
        match self.db.get_cf(&cf, contribution_key(group, actor, round))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn for_round(&self, group: GroupId, round: u32) -> Result<Vec<Contribution>> {
        let all: Vec<Contribution> = self.scan_prefix(CF_CONTRIBUTIONS, &group.0.to_be_bytes())?;
        Ok(all
            .into_iter()
            .filter(|c| c.round_number == round)
            .collect())
    }
}
