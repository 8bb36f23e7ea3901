// Copyright 2022 Webb Technologies Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::Path;

use meta_relayer_utils::{Error, QueueConflict};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;

use crate::{NewTransaction, PendingKey, PendingTxStore, QueuedTransaction};

const TXS_TREE: &str = "pending_txs";
const INDEX_TREE: &str = "pending_index";

/// SledStore is a store that keeps the queue in a [Sled](https://sled.rs)-based database.
///
/// Two trees are used: `pending_txs` maps the big-endian id to the JSON
/// record, and `pending_index` maps each taken [`PendingKey`] to the id
/// holding it.
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
    txs: sled::Tree,
    index: sled::Tree,
}

impl std::fmt::Debug for SledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore").finish()
    }
}

impl SledStore {
    /// Create a new SledStore.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let db = sled::Config::new()
            .path(path)
            .temporary(cfg!(test))
            .mode(sled::Mode::HighThroughput)
            .open()?;
        Self::from_db(db)
    }

    /// Creates a temporary SledStore.
    pub fn temporary() -> crate::Result<Self> {
        let dir = tempfile::tempdir()?;
        let db = sled::Config::new()
            .path(dir.path())
            .temporary(true)
            .open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> crate::Result<Self> {
        let txs = db.open_tree(TXS_TREE)?;
        let index = db.open_tree(INDEX_TREE)?;
        Ok(Self { db, txs, index })
    }

    /// Gets the total amount of data stored on disk
    pub fn get_data_stored_size(&self) -> u64 {
        self.db.size_on_disk().unwrap_or_default()
    }

    fn read_tx(&self, id: u64) -> crate::Result<Option<QueuedTransaction>> {
        match self.txs.get(id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

impl PendingTxStore for SledStore {
    #[tracing::instrument(skip(self))]
    fn key_free(&self, key: PendingKey) -> crate::Result<()> {
        if self.index.contains_key(key.to_string())? {
            return Err(key.conflict().into());
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(from = ?tx.from, kind = %tx.action.kind()))]
    fn insert_tx(&self, tx: NewTransaction) -> crate::Result<QueuedTransaction> {
        let key = PendingKey::of(tx.from, &tx.action);
        let index_key = key.to_string();
        let id = self.db.generate_id()?;
        let queued = QueuedTransaction::from_new(id, tx);
        let bytes = serde_json::to_vec(&queued)?;
        let id_bytes = id.to_be_bytes();
        // the index lookup and both writes happen in one transaction, so a
        // concurrent insert for the same key either sees ours or retries.
        let res: Result<(), TransactionError<QueueConflict>> =
            (&self.txs, &self.index).transaction(|(txs, index)| {
                if index.get(index_key.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(
                        key.conflict(),
                    ));
                }
                txs.insert(&id_bytes[..], bytes.as_slice())?;
                index.insert(index_key.as_bytes(), &id_bytes[..])?;
                Ok(())
            });
        res?;
        // flush the db to make sure we don't lose anything.
        self.db.flush()?;
        tracing::trace!(id, %key, "queued transaction");
        Ok(queued)
    }

    #[tracing::instrument(skip(self))]
    fn get_tx(&self, id: u64) -> crate::Result<Option<QueuedTransaction>> {
        self.read_tx(id)
    }

    #[tracing::instrument(skip(self))]
    fn pending_txs(&self) -> crate::Result<Vec<QueuedTransaction>> {
        let mut pending = Vec::new();
        for entry in self.txs.iter() {
            let (_, bytes) = entry?;
            let tx: QueuedTransaction = serde_json::from_slice(&bytes)?;
            if !tx.executed {
                pending.push(tx);
            }
        }
        Ok(pending)
    }

    #[tracing::instrument(skip(self))]
    fn mark_executed(&self, id: u64) -> crate::Result<QueuedTransaction> {
        let mut tx = self.read_tx(id)?.ok_or(Error::TxNotFound(id))?;
        tx.executed = true;
        let bytes = serde_json::to_vec(&tx)?;
        let id_bytes = id.to_be_bytes();
        let index_key = PendingKey::of(tx.from, &tx.action).to_string();
        let res: Result<(), TransactionError<QueueConflict>> =
            (&self.txs, &self.index).transaction(|(txs, index)| {
                txs.insert(&id_bytes[..], bytes.as_slice())?;
                let holder = index.get(index_key.as_bytes())?;
                if holder.as_deref() == Some(&id_bytes[..]) {
                    index.remove(index_key.as_bytes())?;
                }
                Ok(())
            });
        res?;
        self.db.flush()?;
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{delegation, vote};
    use ethers::types::Address;
    use std::sync::Arc;

    #[test]
    fn queue_should_work() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SledStore::open(tmp.path()).unwrap();
        assert!(store.pending_txs().unwrap().is_empty());

        let a = store.insert_tx(delegation(1)).unwrap();
        let b = store.insert_tx(vote(1, 7)).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.get_tx(b.id).unwrap(), Some(b.clone()));
        assert_eq!(store.pending_txs().unwrap(), vec![a.clone(), b.clone()]);

        let signer = Address::from_low_u64_be(1);
        assert!(matches!(
            store.delegation_allowed(signer),
            Err(Error::QueueConflict(QueueConflict::DelegationPending))
        ));
        assert!(matches!(
            store.insert_tx(vote(1, 7)),
            Err(Error::QueueConflict(QueueConflict::VotePending))
        ));
        assert!(store.vote_allowed(signer, 8.into()).is_ok());
    }

    #[test]
    fn mark_executed_should_free_the_key() {
        let store = SledStore::temporary().unwrap();
        let tx = store.insert_tx(vote(2, 7)).unwrap();
        let done = store.mark_executed(tx.id).unwrap();
        assert!(done.executed);
        assert!(store.pending_txs().unwrap().is_empty());
        assert!(store.get_tx(tx.id).unwrap().unwrap().executed);
        let signer = Address::from_low_u64_be(2);
        assert!(store.vote_allowed(signer, 7.into()).is_ok());
        assert!(matches!(
            store.mark_executed(tx.id + 1000),
            Err(Error::TxNotFound(_))
        ));
    }

    #[test]
    fn concurrent_identical_inserts_admit_exactly_one() {
        let store = Arc::new(SledStore::temporary().unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.insert_tx(vote(3, 1)).is_ok())
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 1);
        assert_eq!(store.pending_txs().unwrap().len(), 1);
    }

    #[test]
    fn queue_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let id = {
            let db = sled::Config::new().path(tmp.path()).open().unwrap();
            let store = SledStore::from_db(db).unwrap();
            store.insert_tx(delegation(4)).unwrap().id
        };
        let db = sled::Config::new().path(tmp.path()).open().unwrap();
        let store = SledStore::from_db(db).unwrap();
        assert!(store.get_tx(id).unwrap().is_some());
        assert!(store
            .delegation_allowed(Address::from_low_u64_be(4))
            .is_err());
    }
}
