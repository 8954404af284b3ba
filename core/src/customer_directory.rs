//! Customer directory: a chained hash table keyed by customer id.
//!
//! `bucket(id) = |id| mod B`. Each bucket is a chain; newer records sit
//! in front of older ones, so a lookup returns the most recent match.
//! The directory does not check for duplicate ids. The Ledger does.

use crate::{customer::Customer, types::CustomerId};

pub use crate::config::DEFAULT_BUCKET_COUNT;

#[derive(Debug, Clone)]
pub struct CustomerDirectory {
    // Each chain is stored oldest-first; walks go newest-first.
    buckets: Vec<Vec<Customer>>,
    len:     usize,
}

impl Default for CustomerDirectory {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_COUNT)
    }
}

impl CustomerDirectory {
    /// A directory with `bucket_count` chains. Zero is bumped to one.
    pub fn new(bucket_count: usize) -> Self {
        let bucket_count = bucket_count.max(1);
        Self {
            buckets: (0..bucket_count).map(|_| Vec::new()).collect(),
            len:     0,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Customers stored, counting shadowed duplicates.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_of(&self, id: CustomerId) -> usize {
        (id.unsigned_abs() % self.buckets.len() as u64) as usize
    }

    /// Put `customer` at the head of its chain.
    /// Inserting an id that is already present shadows the earlier record.
    pub fn insert(&mut self, customer: Customer) -> &mut Customer {
        let b = self.bucket_of(customer.id());
        let chain = &mut self.buckets[b];
        chain.push(customer);
        self.len += 1;
        log::debug!("directory: bucket {b} chain length {}", chain.len());
        let head = chain.len() - 1;
        &mut chain[head]
    }

    pub fn find(&self, id: CustomerId) -> Option<&Customer> {
        self.buckets[self.bucket_of(id)]
            .iter()
            .rev()
            .find(|c| c.id() == id)
    }

    pub fn find_mut(&mut self, id: CustomerId) -> Option<&mut Customer> {
        let b = self.bucket_of(id);
        self.buckets[b].iter_mut().rev().find(|c| c.id() == id)
    }

    pub fn contains(&self, id: CustomerId) -> bool {
        self.find(id).is_some()
    }

    /// Walk one chain head to tail. Out-of-range indexes yield nothing.
    pub fn bucket(&self, index: usize) -> impl Iterator<Item = &Customer> + '_ {
        self.buckets
            .get(index)
            .into_iter()
            .flat_map(|chain| chain.iter().rev())
    }

    /// Every customer, bucket by bucket.
    pub fn iter(&self) -> impl Iterator<Item = &Customer> + '_ {
        self.buckets.iter().flat_map(|chain| chain.iter().rev())
    }

    /// Release every customer and its index. Returns how many were released.
    pub fn teardown(self) -> usize {
        let released = self.len;
        let transactions: usize = self.iter().map(|c| c.transaction_count()).sum();
        log::info!("directory teardown: {released} customers, {transactions} transactions");
        released
    }
}
