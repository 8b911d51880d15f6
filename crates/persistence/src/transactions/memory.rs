//! In-memory transaction.

use crate::core::{Mutation, MutationIter, Transaction};
use crate::error::TransactionResult;

/// A transaction backed by a vector.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransaction {
    mutations: Vec<Mutation>,
}

impl MemoryTransaction {
    /// Creates an empty transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mutations in append order.
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }
}

impl Transaction for MemoryTransaction {
    fn persist(&mut self, mutation: Mutation) -> TransactionResult<()> {
        self.mutations.push(mutation);
        Ok(())
    }

    fn len(&self) -> usize {
        self.mutations.len()
    }

    fn iter(&self) -> TransactionResult<MutationIter<'_>> {
        Ok(Box::new(self.mutations.iter().cloned().map(Ok)))
    }
}

impl FromIterator<Mutation> for MemoryTransaction {
    fn from_iter<I: IntoIterator<Item = Mutation>>(iter: I) -> Self {
        Self {
            mutations: iter.into_iter().collect(),
        }
    }
}
