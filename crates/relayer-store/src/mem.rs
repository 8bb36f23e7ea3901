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

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use meta_relayer_utils::Error;

use crate::{NewTransaction, PendingKey, PendingTxStore, QueuedTransaction};

#[derive(Default)]
struct MemQueue {
    last_id: u64,
    txs: BTreeMap<u64, QueuedTransaction>,
    pending: HashMap<PendingKey, u64>,
}

/// InMemoryStore is a store that keeps the queue in memory.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    queue: Arc<RwLock<MemQueue>>,
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore").finish()
    }
}

impl PendingTxStore for InMemoryStore {
    #[tracing::instrument(skip(self))]
    fn key_free(&self, key: PendingKey) -> crate::Result<()> {
        let guard = self.queue.read();
        if guard.pending.contains_key(&key) {
            return Err(key.conflict().into());
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(from = ?tx.from, kind = %tx.action.kind()))]
    fn insert_tx(&self, tx: NewTransaction) -> crate::Result<QueuedTransaction> {
        let key = PendingKey::of(tx.from, &tx.action);
        // check and insert under the same write lock.
        let mut guard = self.queue.write();
        if guard.pending.contains_key(&key) {
            return Err(key.conflict().into());
        }
        guard.last_id += 1;
        let id = guard.last_id;
        let queued = QueuedTransaction::from_new(id, tx);
        guard.txs.insert(id, queued.clone());
        guard.pending.insert(key, id);
        tracing::trace!(id, %key, "queued transaction");
        Ok(queued)
    }

    #[tracing::instrument(skip(self))]
    fn get_tx(&self, id: u64) -> crate::Result<Option<QueuedTransaction>> {
        Ok(self.queue.read().txs.get(&id).cloned())
    }

    #[tracing::instrument(skip(self))]
    fn pending_txs(&self) -> crate::Result<Vec<QueuedTransaction>> {
        let guard = self.queue.read();
        Ok(guard.txs.values().filter(|tx| !tx.executed).cloned().collect())
    }

    #[tracing::instrument(skip(self))]
    fn mark_executed(&self, id: u64) -> crate::Result<QueuedTransaction> {
        let mut guard = self.queue.write();
        let tx = guard.txs.get_mut(&id).ok_or(Error::TxNotFound(id))?;
        tx.executed = true;
        let tx = tx.clone();
        let key = PendingKey::of(tx.from, &tx.action);
        if guard.pending.get(&key) == Some(&id) {
            guard.pending.remove(&key);
        }
        Ok(tx)
    }
}
