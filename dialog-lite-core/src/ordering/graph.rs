//! Constraint graph and topological sort
//!
//! Implements Kahn's algorithm with:
//! - Stable selection (earliest declared ready node first)
//! - Cycle tolerance: a blocked graph releases the earliest node of a cycle
//!   that nothing outside the cycle still waits on, so every input node is
//!   returned and constraints outside cycles always hold
//! - A report of the constraints that cycle resolution had to break

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use tracing::debug;

use super::orderable::Orderable;

/// Directed "must precede" graph over nodes identified by declaration index.
#[derive(Debug, Clone)]
pub struct Graph {
    names: Vec<String>,
    /// successors[i] = nodes that i must precede
    successors: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
}

/// Result of [`Graph::sort`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphOrder {
    /// Declaration indices in output order
    pub order: Vec<usize>,
    /// Edges `(from, to)` that could not be honoured because of a cycle
    pub broken: Vec<(usize, usize)>,
}

/// A before/after constraint that cycle resolution had to violate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenConstraint {
    pub before: String,
    pub after: String,
}

/// Min-heap entry: intact nodes first, then declaration order.
#[derive(Debug, Eq, PartialEq)]
struct ReadyEntry {
    broken: bool,
    idx: usize,
}

impl Ord for ReadyEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap
        other
            .broken
            .cmp(&self.broken)
            .then_with(|| other.idx.cmp(&self.idx))
    }
}

impl PartialOrd for ReadyEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Graph {
    /// Build the graph from orderables in declaration order.
    ///
    /// `A.before = B` adds A→B, `A.after = B` adds B→A. Links naming an
    /// unknown node, or the node itself, are ignored. When names repeat, links
    /// resolve to the first node with that name.
    pub fn from_orderables<T>(nodes: &[Orderable<T>]) -> Self {
        let mut index: HashMap<&str, usize> = HashMap::new();
        for (idx, node) in nodes.iter().enumerate() {
            index.entry(node.name()).or_insert(idx);
        }

        let mut graph = Graph {
            names: nodes.iter().map(|n| n.name().to_string()).collect(),
            successors: vec![Vec::new(); nodes.len()],
            in_degree: vec![0; nodes.len()],
        };

        for (idx, node) in nodes.iter().enumerate() {
            if let Some(&target) = node.before().and_then(|name| index.get(name)) {
                graph.add_edge(idx, target);
            }
            if let Some(&target) = node.after().and_then(|name| index.get(name)) {
                graph.add_edge(target, idx);
            }
        }
        graph
    }

    fn add_edge(&mut self, from: usize, to: usize) {
        if from == to || self.successors[from].contains(&to) {
            return;
        }
        self.successors[from].push(to);
        self.in_degree[to] += 1;
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Stable topological order of all nodes.
    pub fn sort(&self) -> GraphOrder {
        let n = self.len();
        let mut in_degree = self.in_degree.clone();
        let mut emitted = vec![false; n];
        let mut order: Vec<usize> = Vec::with_capacity(n);
        let mut components: Option<Vec<usize>> = None;

        let mut heap: BinaryHeap<ReadyEntry> = BinaryHeap::new();
        for (idx, &degree) in in_degree.iter().enumerate() {
            if degree == 0 {
                heap.push(ReadyEntry { broken: false, idx });
            }
        }

        while order.len() < n {
            let idx = match heap.pop() {
                Some(entry) => entry.idx,
                None => {
                    // Everything left is blocked by a cycle
                    let components = components.get_or_insert_with(|| self.components());
                    let Some(forced) = self.release_candidate(components, &emitted) else {
                        break;
                    };
                    debug!(node = %self.names[forced], "releasing node blocked by cycle");
                    forced
                }
            };
            if emitted[idx] {
                continue;
            }
            emitted[idx] = true;
            order.push(idx);

            for &next in &self.successors[idx] {
                in_degree[next] = in_degree[next].saturating_sub(1);
                if in_degree[next] == 0 && !emitted[next] {
                    let broken = self.successors[next].iter().any(|&s| emitted[s]);
                    heap.push(ReadyEntry { broken, idx: next });
                }
            }
        }

        let mut position = vec![0usize; n];
        for (pos, &idx) in order.iter().enumerate() {
            position[idx] = pos;
        }
        let mut broken = Vec::new();
        for (from, succs) in self.successors.iter().enumerate() {
            for &to in succs {
                if position[from] > position[to] {
                    broken.push((from, to));
                }
            }
        }

        GraphOrder { order, broken }
    }

    /// Earliest unemitted node whose strongly connected component has no
    /// unemitted predecessor outside itself.
    fn release_candidate(&self, component: &[usize], emitted: &[bool]) -> Option<usize> {
        let mut waiting = vec![false; self.len()];
        for (from, succs) in self.successors.iter().enumerate() {
            if emitted[from] {
                continue;
            }
            for &to in succs {
                if component[from] != component[to] {
                    waiting[component[to]] = true;
                }
            }
        }
        (0..self.len()).find(|&idx| !emitted[idx] && !waiting[component[idx]])
    }

    /// Strongly connected component id per node (Tarjan).
    fn components(&self) -> Vec<usize> {
        struct Tarjan<'g> {
            successors: &'g [Vec<usize>],
            next_index: usize,
            index: Vec<Option<usize>>,
            low: Vec<usize>,
            stack: Vec<usize>,
            on_stack: Vec<bool>,
            component: Vec<usize>,
            count: usize,
        }

        impl Tarjan<'_> {
            fn visit(&mut self, v: usize) {
                self.index[v] = Some(self.next_index);
                self.low[v] = self.next_index;
                self.next_index += 1;
                self.stack.push(v);
                self.on_stack[v] = true;

                let successors = self.successors;
                for &w in &successors[v] {
                    match self.index[w] {
                        None => {
                            self.visit(w);
                            self.low[v] = self.low[v].min(self.low[w]);
                        }
                        Some(w_index) if self.on_stack[w] => {
                            self.low[v] = self.low[v].min(w_index);
                        }
                        Some(_) => {}
                    }
                }

                if Some(self.low[v]) == self.index[v] {
                    while let Some(w) = self.stack.pop() {
                        self.on_stack[w] = false;
                        self.component[w] = self.count;
                        if w == v {
                            break;
                        }
                    }
                    self.count += 1;
                }
            }
        }

        let n = self.len();
        let mut tarjan = Tarjan {
            successors: &self.successors,
            next_index: 0,
            index: vec![None; n],
            low: vec![0; n],
            stack: Vec::new(),
            on_stack: vec![false; n],
            component: vec![0; n],
            count: 0,
        };
        for v in 0..n {
            if tarjan.index[v].is_none() {
                tarjan.visit(v);
            }
        }
        tarjan.component
    }

    /// Name of the node at a declaration index.
    pub fn name(&self, idx: usize) -> &str {
        &self.names[idx]
    }
}

/// Sort orderables, discarding the broken-constraint report.
pub fn sort_orderables<T>(nodes: Vec<Orderable<T>>) -> Vec<Orderable<T>> {
    sort_orderables_with_report(nodes).0
}

/// Sort orderables and return the constraints that cycles forced the sort to break.
pub fn sort_orderables_with_report<T>(
    nodes: Vec<Orderable<T>>,
) -> (Vec<Orderable<T>>, Vec<BrokenConstraint>) {
    let graph = Graph::from_orderables(&nodes);
    let GraphOrder { order, broken } = graph.sort();

    let report = broken
        .iter()
        .map(|&(from, to)| BrokenConstraint {
            before: graph.name(from).to_string(),
            after: graph.name(to).to_string(),
        })
        .collect();

    let mut slots: Vec<Option<Orderable<T>>> = nodes.into_iter().map(Some).collect();
    let sorted = order
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect();
    (sorted, report)
}
