//! In-memory contract store.
//!
//! Holds every contract behind a single `parking_lot::RwLock`. Reads hand out
//! clones, so no caller ever holds a reference into a stored analysis.
//! Durable persistence lives outside this service.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::domain::contracts::{Contract, LifecycleError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("contract {0} not found")]
    NotFound(Uuid),

    #[error("contract limit of {0} reached")]
    CapacityReached(usize),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Shared, cloneable handle to the contract collection.
#[derive(Clone)]
pub struct ContractStore {
    contracts: Arc<RwLock<HashMap<Uuid, Contract>>>,
    max_contracts: usize,
}

impl ContractStore {
    pub fn new(max_contracts: usize) -> Self {
        Self {
            contracts: Arc::new(RwLock::new(HashMap::new())),
            max_contracts,
        }
    }

    /// Add a new contract, enforcing the configured limit.
    pub fn insert(&self, contract: Contract) -> Result<(), StoreError> {
        let mut contracts = self.contracts.write();
        if contracts.len() >= self.max_contracts {
            return Err(StoreError::CapacityReached(self.max_contracts));
        }
        debug!(contract_id = %contract.id, "Contract stored");
        contracts.insert(contract.id, contract);
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Option<Contract> {
        self.contracts.read().get(&id).cloned()
    }

    /// Fetch several contracts in the requested order. Fails on the first
    /// unknown id.
    pub fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Contract>, StoreError> {
        let contracts = self.contracts.read();
        ids.iter()
            .map(|id| contracts.get(id).cloned().ok_or(StoreError::NotFound(*id)))
            .collect()
    }

    /// One page of contracts, newest first, plus the total count.
    pub fn list(&self, offset: usize, limit: usize) -> (Vec<Contract>, usize) {
        let mut all = self.snapshot();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        let total = all.len();
        let page = all.into_iter().skip(offset).take(limit).collect();
        (page, total)
    }

    /// Copy of every stored contract, in no particular order.
    pub fn snapshot(&self) -> Vec<Contract> {
        self.contracts.read().values().cloned().collect()
    }

    pub fn remove(&self, id: Uuid) -> Result<Contract, StoreError> {
        self.contracts
            .write()
            .remove(&id)
            .ok_or(StoreError::NotFound(id))
    }

    /// Run a lifecycle change against one contract under the write lock.
    pub fn update<T, F>(&self, id: Uuid, change: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Contract) -> Result<T, LifecycleError>,
    {
        let mut contracts = self.contracts.write();
        let contract = contracts.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        Ok(change(contract)?)
    }

    pub fn len(&self) -> usize {
        self.contracts.read().len()
    }
}
