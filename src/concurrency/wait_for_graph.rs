use std::collections::{HashMap, HashSet};

use super::TransactionId;

/// Directed wait-for graph: `graph[a]` is the set of transactions `a` is currently blocked on.
/// Stored as adjacency maps over plain transaction ids (not pointers), so the graph has no
/// lifetime tied to any live `Transaction` value.
pub(crate) struct WaitForGraph {
    graph: HashMap<TransactionId, HashSet<TransactionId>>,
}

impl WaitForGraph {
    pub(crate) fn new() -> Self {
        Self {
            graph: HashMap::new(),
        }
    }

    /// Replaces the full set of transactions that `tid` waits on. A transaction blocks on at most
    /// one page at a time in this lock manager, so its wait set is exactly the current holders of
    /// that page.
    pub(crate) fn set_waits(&mut self, tid: TransactionId, waits_on: HashSet<TransactionId>) {
        if waits_on.is_empty() {
            self.graph.remove(&tid);
        } else {
            self.graph.insert(tid, waits_on);
        }
    }

    pub(crate) fn clear(&mut self, tid: TransactionId) {
        self.graph.remove(&tid);
    }

    /// Iterative DFS cycle detection over the whole graph, with explicit visited/on-stack sets
    /// (no recursion, so the depth of the wait chain cannot blow the call stack).
    pub(crate) fn has_cycle(&self) -> bool {
        let mut visited: HashSet<TransactionId> = HashSet::new();

        for &start in self.graph.keys() {
            if visited.contains(&start) {
                continue;
            }
            if self.has_cycle_from(start, &mut visited) {
                return true;
            }
        }
        false
    }

    fn has_cycle_from(&self, start: TransactionId, visited: &mut HashSet<TransactionId>) -> bool {
        let mut on_stack: HashSet<TransactionId> = HashSet::new();
        // Each frame: the node, and how far we've iterated through its neighbor list.
        let mut stack: Vec<(TransactionId, std::vec::IntoIter<TransactionId>)> = Vec::new();

        let neighbors = |node: TransactionId| -> Vec<TransactionId> {
            self.graph
                .get(&node)
                .map(|s| s.iter().copied().collect())
                .unwrap_or_default()
        };

        visited.insert(start);
        on_stack.insert(start);
        stack.push((start, neighbors(start).into_iter()));

        while let Some((node, iter)) = stack.last_mut() {
            let node = *node;
            match iter.next() {
                Some(next) => {
                    if on_stack.contains(&next) {
                        return true;
                    }
                    if !visited.contains(&next) {
                        visited.insert(next);
                        on_stack.insert(next);
                        stack.push((next, neighbors(next).into_iter()));
                    }
                }
                None => {
                    on_stack.remove(&node);
                    stack.pop();
                }
            }
        }
        false
    }
}
