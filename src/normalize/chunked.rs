//! Cooperative traversal of large arrays.
//!
//! Transformers walk request lists and folder trees through a
//! [`ChunkedTraversal`], which suspends the task after every `chunk_size`
//! items so a long import never monopolizes the executor thread. Order and
//! completeness are unaffected by how many times it yields.

use serde_json::Value;
use tracing::trace;

/// Items processed between two yields.
pub const DEFAULT_CHUNK_SIZE: usize = 200;

#[derive(Debug, Clone)]
pub struct ChunkedTraversal {
    chunk_size: usize,
    processed: usize,
    yields: usize,
    pending_yield: bool,
}

impl Default for ChunkedTraversal {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl ChunkedTraversal {
    /// A zero chunk size is treated as 1.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            processed: 0,
            yields: 0,
            pending_yield: false,
        }
    }

    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Items visited so far.
    #[must_use]
    pub const fn processed(&self) -> usize {
        self.processed
    }

    /// Times control was handed back to the scheduler.
    #[must_use]
    pub const fn yields(&self) -> usize {
        self.yields
    }

    // A yield is only taken when another item follows, so a traversal that
    // ends exactly on a chunk boundary does not suspend for nothing.
    async fn before_item(&mut self) {
        if self.pending_yield {
            self.pending_yield = false;
            self.yields += 1;
            trace!(processed = self.processed, "yielding to scheduler");
            tokio::task::yield_now().await;
        }
    }

    fn after_item(&mut self) {
        self.processed += 1;
        if self.processed % self.chunk_size == 0 {
            self.pending_yield = true;
        }
    }

    /// Transform every item, in order.
    pub async fn map<T, U, F>(&mut self, items: impl IntoIterator<Item = T>, mut f: F) -> Vec<U>
    where
        F: FnMut(T) -> U,
    {
        let iter = items.into_iter();
        let mut out = Vec::with_capacity(iter.size_hint().0);
        for item in iter {
            self.before_item().await;
            out.push(f(item));
            self.after_item();
        }
        out
    }

    /// Depth-first walk over a folder tree, visiting leaves in document order.
    ///
    /// `children` returns the sub-items of a folder node and `None` for a
    /// leaf. Only leaves count towards the chunk cadence. The walk keeps an
    /// explicit stack, so its depth is bounded by the tree's nesting depth.
    pub async fn walk_tree<'a, U, C, F>(
        &mut self,
        roots: &'a [Value],
        children: C,
        mut visit: F,
    ) -> Vec<U>
    where
        C: Fn(&'a Value) -> Option<&'a [Value]>,
        F: FnMut(&'a Value) -> U,
    {
        let mut out = Vec::new();
        let mut stack = vec![roots.iter()];
        while let Some(top) = stack.last_mut() {
            let Some(node) = top.next() else {
                stack.pop();
                continue;
            };
            if let Some(kids) = children(node) {
                stack.push(kids.iter());
                continue;
            }
            self.before_item().await;
            out.push(visit(node));
            self.after_item();
        }
        out
    }
}
