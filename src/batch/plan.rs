//! Batch partitioning.

use crate::dataset::RequestItem;
use crate::{Error, ErrorContext, Result};

/// A contiguous slice of the dataset, dispatched together.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// 1-based position in the plan.
    pub number: usize,
    /// `(dataset index, item)` pairs in dataset order.
    pub items: Vec<(usize, RequestItem)>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.items.iter().map(|(i, _)| *i).collect()
    }
}

/// Number of batches for `items` entries at `batch_size` per batch.
pub fn batch_count(items: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    items.div_ceil(batch_size)
}

/// Ordered, gap-free partition of a dataset into batches of at most
/// `batch_size` items. Only the last batch may be shorter.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan {
    batch_size: usize,
    total_items: usize,
    batches: Vec<Batch>,
}

impl BatchPlan {
    pub fn new(items: Vec<RequestItem>, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::configuration_with_context(
                "batch size must be a positive integer",
                ErrorContext::new()
                    .with_field_path("batch_size")
                    .with_details("got 0")
                    .with_source("batch_plan"),
            ));
        }

        let total_items = items.len();
        let mut batches = Vec::with_capacity(batch_count(total_items, batch_size));
        let mut iter = items.into_iter().enumerate().peekable();
        while iter.peek().is_some() {
            let chunk: Vec<(usize, RequestItem)> = iter.by_ref().take(batch_size).collect();
            batches.push(Batch {
                number: batches.len() + 1,
                items: chunk,
            });
        }

        Ok(Self {
            batch_size,
            total_items,
            batches,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.iter().map(Batch::len).collect()
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn into_batches(self) -> Vec<Batch> {
        self.batches
    }
}
