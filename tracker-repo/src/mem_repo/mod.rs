use crate::lifecycle::{Clock, Deletion, SystemClock};
use crate::reversal_repo::TransactionReversal;
use crate::tag_repo::TransactionTag;
use crate::transaction_repo::Transaction;
use crate::user_repo::User;
use crate::{HealthCheck, Repos};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

mod reversal_repo;
mod tag_repo;
mod transaction_repo;
mod user_repo;

pub fn create_repos() -> Repos {
    create_repos_with_clock(Arc::new(SystemClock))
}

pub fn create_repos_with_clock(clock: Arc<dyn Clock>) -> Repos {
    Repos::from_backend(Arc::new(MemRepo::new(clock)))
}

/// Row of the many-to-many join between transactions and tags.
#[derive(Hash, PartialEq, Eq, Clone, Copy)]
struct TagLink {
    transaction_id: Uuid,
    tag_id: Uuid,
}

/// A stored transaction. Its tags live in `State::tag_links`.
#[derive(Clone)]
struct TransactionEntry {
    id: Uuid,
    amount: Decimal,
    description: String,
    transaction_date: DateTime<Utc>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted: Deletion,
}

impl TransactionEntry {
    fn into_transaction(self, tags: HashSet<Uuid>) -> Transaction {
        Transaction {
            id: self.id,
            amount: self.amount,
            description: self.description,
            transaction_date: self.transaction_date,
            created_by: self.created_by,
            tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted: self.deleted,
        }
    }
}

struct State {
    users: HashMap<Uuid, User>,
    tags: HashMap<Uuid, TransactionTag>,
    transactions: HashMap<Uuid, TransactionEntry>,
    reversals: HashMap<Uuid, TransactionReversal>,
    tag_links: HashSet<TagLink>,
}

impl State {
    fn tags_of(&self, transaction_id: Uuid) -> HashSet<Uuid> {
        self.tag_links
            .iter()
            .filter(|link| link.transaction_id == transaction_id)
            .map(|link| link.tag_id)
            .collect()
    }

    fn to_transaction(&self, entry: &TransactionEntry) -> Transaction {
        entry.clone().into_transaction(self.tags_of(entry.id))
    }

    fn remove_transaction(&mut self, transaction_id: Uuid) -> bool {
        if self.transactions.remove(&transaction_id).is_none() {
            return false;
        }
        self.reversals
            .retain(|_, r| r.transaction_id != transaction_id);
        self.tag_links
            .retain(|link| link.transaction_id != transaction_id);
        true
    }

    fn remove_tag(&mut self, tag_id: Uuid) -> bool {
        if self.tags.remove(&tag_id).is_none() {
            return false;
        }
        self.tag_links.retain(|link| link.tag_id != tag_id);
        true
    }
}

/// In-process store behind every in-memory repository.
///
/// One lock guards all tables, so each write sees and checks a consistent
/// snapshot before it mutates anything.
pub struct MemRepo {
    state: RwLock<State>,
    clock: Arc<dyn Clock>,
}

impl MemRepo {
    pub fn new(clock: Arc<dyn Clock>) -> MemRepo {
        let state = State {
            users: HashMap::new(),
            tags: HashMap::new(),
            transactions: HashMap::new(),
            reversals: HashMap::new(),
            tag_links: HashSet::new(),
        };
        MemRepo {
            state: RwLock::new(state),
            clock,
        }
    }

    fn read_lock(&self) -> Result<RwLockReadGuard<State>, anyhow::Error> {
        self.state
            .read()
            .map_err(|_| anyhow!("Unable to acquire lock"))
    }

    fn write_lock(&self) -> Result<RwLockWriteGuard<State>, anyhow::Error> {
        self.state
            .write()
            .map_err(|_| anyhow!("Unable to acquire lock"))
    }
}

#[async_trait]
impl HealthCheck for MemRepo {
    async fn check(&self) -> bool {
        self.read_lock().is_ok()
    }
}
