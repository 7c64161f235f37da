//! Dependency-Tracked Computation Graph
//!
//! Thread-safe reactive cache built on DashMap:
//! - Cells: mutable values keyed by `(kind, param)`; writes invalidate dependents
//! - Nodes: memoized async computations keyed by `(kind, param)`
//! - Reads made through a [`Ctx`] register dependency edges
//! - Concurrent reads of a pending node share one in-flight evaluation
//! - Evaluations run to completion on the runtime even if every reader is gone
//!
//! Node results (values and errors) stay cached until one of their transitive
//! inputs changes, they are invalidated explicitly, or they are evicted as
//! idle leaves by [`Graph::evict`].

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{join_all, BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error};

use crate::models::errors::{AppError, AppResult, ErrorCode};

type Erased = Arc<dyn Any + Send + Sync>;
type NodeOutput = Result<Erased, AppError>;
type SharedNode = Shared<BoxFuture<'static, NodeOutput>>;

/// Identity of a cell or node: its kind plus serialized parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    kind: &'static str,
    param: String,
}

impl Key {
    fn new<P: Serialize>(kind: &'static str, param: &P) -> AppResult<Self> {
        let param = serde_json::to_string(param).map_err(|e| {
            error!("❌ Unserializable parameter for {}: {}", kind, e);
            AppError::with_source(
                ErrorCode::Internal,
                format!("Unserializable parameter for {}", kind),
                e,
            )
        })?;
        Ok(Self { kind, param })
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.param)
    }
}

/// Family of mutable cells, one per parameter value
pub struct CellFamily<P, T> {
    kind: &'static str,
    initial: fn(&P) -> T,
}

impl<P, T> CellFamily<P, T> {
    pub const fn new(kind: &'static str, initial: fn(&P) -> T) -> Self {
        Self { kind, initial }
    }
}

/// Family of memoized async computations, one per parameter value
pub struct NodeFamily<E, P, T> {
    kind: &'static str,
    compute: fn(Ctx<E>, P) -> BoxFuture<'static, AppResult<T>>,
}

impl<E, P, T> NodeFamily<E, P, T> {
    pub const fn new(
        kind: &'static str,
        compute: fn(Ctx<E>, P) -> BoxFuture<'static, AppResult<T>>,
    ) -> Self {
        Self { kind, compute }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

/// Graph statistics for monitoring
#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub cells: usize,
    pub edges: usize,
    pub evaluations: u64,
    pub invalidations: u64,
    pub evictions: u64,
    pub generation: u64,
}

/// Which cached nodes [`Graph::evict`] may drop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Leaves not read for this long are dropped
    pub max_idle: Duration,
    /// Least recently read leaves are dropped until at most this many nodes remain
    pub max_nodes: usize,
}

struct GraphInner<E> {
    env: E,
    cells: DashMap<Key, Erased>,
    nodes: DashMap<Key, SharedNode>,
    /// dependency -> nodes that read it during their last evaluation
    dependents: DashMap<Key, HashSet<Key>>,
    /// node -> cells and nodes it read (reverse of `dependents`)
    dependencies: DashMap<Key, HashSet<Key>>,
    last_read: DashMap<Key, Instant>,
    generation: AtomicU64,
    evaluations: AtomicU64,
    invalidations: AtomicU64,
    evictions: AtomicU64,
}

/// Shared handle to the graph; cloning is cheap
pub struct Graph<E> {
    inner: Arc<GraphInner<E>>,
}

impl<E> Clone for Graph<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Send + Sync + 'static> Graph<E> {
    /// Create an empty graph around a static environment
    pub fn new(env: E) -> Self {
        Self {
            inner: Arc::new(GraphInner {
                env,
                cells: DashMap::new(),
                nodes: DashMap::new(),
                dependents: DashMap::new(),
                dependencies: DashMap::new(),
                last_read: DashMap::new(),
                generation: AtomicU64::new(0),
                evaluations: AtomicU64::new(0),
                invalidations: AtomicU64::new(0),
                evictions: AtomicU64::new(0),
            }),
        }
    }

    pub fn env(&self) -> &E {
        &self.inner.env
    }

    /// Incremented on every cell write and explicit invalidation
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    // ============================================
    // Cells
    // ============================================

    /// Read a cell without registering a dependency
    pub fn get_cell<P, T>(&self, family: &CellFamily<P, T>, param: &P) -> T
    where
        P: Serialize,
        T: Clone + Send + Sync + 'static,
    {
        match Key::new(family.kind, param) {
            Ok(key) => self.cell_value(&key, family, param),
            Err(_) => (family.initial)(param),
        }
    }

    fn cell_value<P, T>(&self, key: &Key, family: &CellFamily<P, T>, param: &P) -> T
    where
        T: Clone + Send + Sync + 'static,
    {
        self.inner
            .cells
            .get(key)
            .and_then(|v| v.value().downcast_ref::<T>().cloned())
            .unwrap_or_else(|| (family.initial)(param))
    }

    /// Write a cell. Dependents are invalidated only if the value changed.
    /// Returns whether it changed.
    pub fn set<P, T>(&self, family: &CellFamily<P, T>, param: &P, value: T) -> bool
    where
        P: Serialize,
        T: PartialEq + Clone + Send + Sync + 'static,
    {
        let Ok(key) = Key::new(family.kind, param) else {
            return false;
        };
        let changed = {
            let mut entry = self
                .inner
                .cells
                .entry(key.clone())
                .or_insert_with(|| Arc::new((family.initial)(param)));
            let same = entry.value().downcast_ref::<T>() == Some(&value);
            if !same {
                *entry = Arc::new(value);
            }
            !same
        };

        if changed {
            self.after_write(&key);
        } else {
            debug!("📭 CELL UNCHANGED: {}", key);
        }
        changed
    }

    /// Atomically replace a cell value with `f(current)`; always invalidates.
    /// An unaddressable cell is left untouched and `f(initial)` is returned.
    pub fn update<P, T>(&self, family: &CellFamily<P, T>, param: &P, f: impl FnOnce(&T) -> T) -> T
    where
        P: Serialize,
        T: Clone + Send + Sync + 'static,
    {
        let Ok(key) = Key::new(family.kind, param) else {
            return f(&(family.initial)(param));
        };
        let next = {
            let mut entry = self
                .inner
                .cells
                .entry(key.clone())
                .or_insert_with(|| Arc::new((family.initial)(param)));
            let current = entry
                .value()
                .downcast_ref::<T>()
                .cloned()
                .unwrap_or_else(|| (family.initial)(param));
            let next = f(&current);
            *entry = Arc::new(next.clone());
            next
        };

        self.after_write(&key);
        next
    }

    fn after_write(&self, key: &Key) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let dropped = self.invalidate_dependents(key);
        debug!(
            "✏️ CELL WRITE: {} (generation {}, {} nodes invalidated)",
            key, generation, dropped
        );
    }

    // ============================================
    // Nodes
    // ============================================

    /// Read a node from outside any computation (no dependency edge)
    pub async fn get<P, T>(&self, family: &NodeFamily<E, P, T>, param: P) -> AppResult<T>
    where
        P: Serialize + Send + 'static,
        T: Clone + Send + Sync + 'static,
    {
        self.read_node(family, param, None).await
    }

    /// Drop a node and everything downstream of it; the next read recomputes.
    /// Returns the number of cached nodes dropped.
    pub fn invalidate<P, T>(&self, family: &NodeFamily<E, P, T>, param: &P) -> usize
    where
        P: Serialize,
    {
        let Ok(key) = Key::new(family.kind, param) else {
            return 0;
        };
        let own = usize::from(self.drop_node(&key));
        if own > 0 {
            self.inner.invalidations.fetch_add(1, Ordering::Relaxed);
        }
        let dropped = own + self.invalidate_dependents(&key);
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        debug!("🗑️ NODE INVALIDATE: {} ({} nodes dropped)", key, dropped);
        dropped
    }

    /// Snapshot of cache statistics
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.inner.nodes.len(),
            cells: self.inner.cells.len(),
            edges: self.inner.dependents.iter().map(|e| e.value().len()).sum(),
            evaluations: self.inner.evaluations.load(Ordering::Relaxed),
            invalidations: self.inner.invalidations.load(Ordering::Relaxed),
            evictions: self.inner.evictions.load(Ordering::Relaxed),
            generation: self.generation(),
        }
    }

    /// Drop settled leaf nodes (nothing cached reads them) that are idle past
    /// `max_idle`, then the least recently read leaves while more than
    /// `max_nodes` remain. Inputs orphaned by a drop become leaves and are
    /// considered in the same call. Pending evaluations are never dropped.
    /// Returns the number of nodes evicted.
    pub fn evict(&self, policy: EvictionPolicy) -> usize {
        let mut evicted = 0;

        loop {
            let mut leaves = self.settled_leaves();
            if leaves.is_empty() {
                break;
            }
            leaves.sort_by_key(|(_, read_at)| *read_at);

            let now = Instant::now();
            let excess = self.inner.nodes.len().saturating_sub(policy.max_nodes);
            let mut round = 0;
            for (index, (key, read_at)) in leaves.into_iter().enumerate() {
                let idle = now.saturating_duration_since(read_at) >= policy.max_idle;
                if (idle || index < excess) && self.drop_node(&key) {
                    round += 1;
                }
            }

            if round == 0 {
                break;
            }
            evicted += round;
        }

        if evicted > 0 {
            self.inner
                .evictions
                .fetch_add(evicted as u64, Ordering::Relaxed);
            debug!(
                "🧹 NODE EVICT: {} nodes dropped, {} remain",
                evicted,
                self.inner.nodes.len()
            );
        }
        evicted
    }

    /// Completed nodes with no cached dependents, with their last read time
    fn settled_leaves(&self) -> Vec<(Key, Instant)> {
        self.inner
            .nodes
            .iter()
            .filter(|entry| entry.value().peek().is_some())
            .filter(|entry| {
                self.inner
                    .dependents
                    .get(entry.key())
                    .map_or(true, |d| d.is_empty())
            })
            .map(|entry| {
                let read_at = self
                    .inner
                    .last_read
                    .get(entry.key())
                    .map(|t| *t)
                    .unwrap_or_else(Instant::now);
                (entry.key().clone(), read_at)
            })
            .collect()
    }

    /// Remove a cached node together with the edges it registered as a reader.
    /// Returns whether it was cached.
    fn drop_node(&self, key: &Key) -> bool {
        let removed = self.inner.nodes.remove(key).is_some();
        self.inner.last_read.remove(key);
        if let Some((_, inputs)) = self.inner.dependencies.remove(key) {
            for input in inputs {
                let emptied = match self.inner.dependents.get_mut(&input) {
                    Some(mut readers) => {
                        readers.remove(key);
                        readers.is_empty()
                    }
                    None => false,
                };
                if emptied {
                    self.inner.dependents.remove_if(&input, |_, readers| readers.is_empty());
                }
            }
        }
        removed
    }

    async fn read_node<P, T>(
        &self,
        family: &NodeFamily<E, P, T>,
        param: P,
        observer: Option<&Key>,
    ) -> AppResult<T>
    where
        P: Serialize + Send + 'static,
        T: Clone + Send + Sync + 'static,
    {
        let key = Key::new(family.kind, &param)?;
        // Edge first, so an invalidation racing this read still reaches the observer.
        if let Some(observer) = observer {
            self.add_edge(&key, observer);
        }
        self.inner.last_read.insert(key.clone(), Instant::now());

        let output = self.node_future(family, key.clone(), param).await?;
        output
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| AppError::internal(format!("Type mismatch reading node {}", key)))
    }

    fn node_future<P, T>(&self, family: &NodeFamily<E, P, T>, key: Key, param: P) -> SharedNode
    where
        P: Send + 'static,
        T: Send + Sync + 'static,
    {
        let (shared, inserted) = match self.inner.nodes.entry(key.clone()) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let graph = self.clone();
                let compute = family.compute;
                let observer = key.clone();
                let future: BoxFuture<'static, NodeOutput> = async move {
                    let ctx = Ctx {
                        graph,
                        observer: Some(observer),
                    };
                    compute(ctx, param).await.map(|v| Arc::new(v) as Erased)
                }
                .boxed();
                let shared = future.shared();
                entry.insert(shared.clone());
                (shared, true)
            }
        };

        if inserted {
            self.inner.evaluations.fetch_add(1, Ordering::Relaxed);
            debug!("⚙️ NODE EVAL: {}", key);
            // Drive to completion independently of the readers.
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(shared.clone());
            }
        } else {
            debug!("✅ NODE HIT: {}", key);
        }
        shared
    }

    fn add_edge(&self, dependency: &Key, dependent: &Key) {
        self.inner
            .dependents
            .entry(dependency.clone())
            .or_default()
            .insert(dependent.clone());
        self.inner
            .dependencies
            .entry(dependent.clone())
            .or_default()
            .insert(dependency.clone());
    }

    fn invalidate_dependents(&self, root: &Key) -> usize {
        let mut dropped = 0;
        let mut seen = HashSet::new();
        let mut stack = vec![root.clone()];

        while let Some(key) = stack.pop() {
            if !seen.insert(key.clone()) {
                continue;
            }
            if let Some((_, dependents)) = self.inner.dependents.remove(&key) {
                for dependent in dependents {
                    if self.drop_node(&dependent) {
                        dropped += 1;
                    }
                    stack.push(dependent);
                }
            }
        }

        self.inner
            .invalidations
            .fetch_add(dropped as u64, Ordering::Relaxed);
        dropped
    }
}

/// Handle given to a node's compute function; reads register dependencies
pub struct Ctx<E> {
    graph: Graph<E>,
    observer: Option<Key>,
}

impl<E: Send + Sync + 'static> Ctx<E> {
    pub fn env(&self) -> &E {
        self.graph.env()
    }

    /// Read a cell and subscribe to its changes
    pub fn cell<P, T>(&self, family: &CellFamily<P, T>, param: &P) -> T
    where
        P: Serialize,
        T: Clone + Send + Sync + 'static,
    {
        let Ok(key) = Key::new(family.kind, param) else {
            return (family.initial)(param);
        };
        if let Some(observer) = &self.observer {
            self.graph.add_edge(&key, observer);
        }
        self.graph.cell_value(&key, family, param)
    }

    /// Read another node and subscribe to its invalidation
    pub async fn read<P, T>(&self, family: &NodeFamily<E, P, T>, param: P) -> AppResult<T>
    where
        P: Serialize + Send + 'static,
        T: Clone + Send + Sync + 'static,
    {
        self.graph
            .read_node(family, param, self.observer.as_ref())
            .await
    }

    /// Evaluate independent nodes concurrently; one failure does not cancel the rest
    pub async fn read_all<P, T>(
        &self,
        family: &NodeFamily<E, P, T>,
        params: Vec<P>,
    ) -> Vec<AppResult<T>>
    where
        P: Serialize + Send + 'static,
        T: Clone + Send + Sync + 'static,
    {
        join_all(params.into_iter().map(|param| self.read(family, param))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[derive(Default)]
    struct Counters {
        doubles: AtomicUsize,
        sums: AtomicUsize,
    }

    static FACTOR: CellFamily<(), u64> = CellFamily::new("factor", |_| 2);
    static REFRESH: CellFamily<u64, u32> = CellFamily::new("refresh", |_| 0);

    static DOUBLE: NodeFamily<Counters, u64, u64> = NodeFamily::new("double", double);
    static SUM: NodeFamily<Counters, Vec<u64>, u64> = NodeFamily::new("sum", sum);
    static FAIL_ODD: NodeFamily<Counters, u64, u64> = NodeFamily::new("failOdd", fail_odd);

    fn double(ctx: Ctx<Counters>, x: u64) -> BoxFuture<'static, AppResult<u64>> {
        async move {
            ctx.env().doubles.fetch_add(1, Ordering::SeqCst);
            ctx.cell(&REFRESH, &x);
            let factor = ctx.cell(&FACTOR, &());
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(x * factor)
        }
        .boxed()
    }

    fn sum(ctx: Ctx<Counters>, xs: Vec<u64>) -> BoxFuture<'static, AppResult<u64>> {
        async move {
            ctx.env().sums.fetch_add(1, Ordering::SeqCst);
            let mut total = 0;
            for value in ctx.read_all(&DOUBLE, xs).await {
                total += value?;
            }
            Ok(total)
        }
        .boxed()
    }

    fn fail_odd(_ctx: Ctx<Counters>, x: u64) -> BoxFuture<'static, AppResult<u64>> {
        async move {
            if x % 2 == 1 {
                Err(AppError::remote_read("failOdd", x, "odd"))
            } else {
                Ok(x)
            }
        }
        .boxed()
    }

    /// Parameter type that refuses to serialize
    struct Opaque;

    impl Serialize for Opaque {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("opaque parameter"))
        }
    }

    static OPAQUE: NodeFamily<Counters, Opaque, u64> = NodeFamily::new("opaque", opaque);

    fn opaque(_ctx: Ctx<Counters>, _: Opaque) -> BoxFuture<'static, AppResult<u64>> {
        async move { Ok(1) }.boxed()
    }

    fn graph() -> Graph<Counters> {
        Graph::new(Counters::default())
    }

    fn keep_for(max_idle: Duration, max_nodes: usize) -> EvictionPolicy {
        EvictionPolicy {
            max_idle,
            max_nodes,
        }
    }

    #[tokio::test]
    async fn test_node_is_memoized() {
        let g = graph();
        assert_eq!(g.get(&DOUBLE, 3).await.unwrap(), 6);
        assert_eq!(g.get(&DOUBLE, 3).await.unwrap(), 6);
        assert_eq!(g.env().doubles.load(Ordering::SeqCst), 1);
        assert_eq!(g.stats().evaluations, 1);
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_evaluation() {
        let g = graph();
        let (a, b, c) = tokio::join!(g.get(&DOUBLE, 7), g.get(&DOUBLE, 7), g.get(&DOUBLE, 7));
        assert_eq!((a.unwrap(), b.unwrap(), c.unwrap()), (14, 14, 14));
        assert_eq!(g.env().doubles.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cell_write_invalidates_transitively() {
        let g = graph();
        assert_eq!(g.get(&SUM, vec![1, 2]).await.unwrap(), 6);

        assert!(g.set(&FACTOR, &(), 10));
        assert_eq!(g.get(&SUM, vec![1, 2]).await.unwrap(), 30);
        assert_eq!(g.env().sums.load(Ordering::SeqCst), 2);
        assert_eq!(g.env().doubles.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_unchanged_write_keeps_cache() {
        let g = graph();
        let before = g.generation();
        g.get(&DOUBLE, 4).await.unwrap();
        assert!(!g.set(&FACTOR, &(), 2));
        g.get(&DOUBLE, 4).await.unwrap();
        assert_eq!(g.env().doubles.load(Ordering::SeqCst), 1);
        assert_eq!(g.generation(), before);
    }

    #[tokio::test]
    async fn test_keyed_refresh_only_touches_its_key() {
        let g = graph();
        g.get(&DOUBLE, 1).await.unwrap();
        g.get(&DOUBLE, 2).await.unwrap();

        assert_eq!(g.update(&REFRESH, &1, |id| id + 1), 1);
        g.get(&DOUBLE, 1).await.unwrap();
        g.get(&DOUBLE, 2).await.unwrap();
        assert_eq!(g.env().doubles.load(Ordering::SeqCst), 3);
        assert_eq!(g.get_cell(&REFRESH, &1), 1);
        assert_eq!(g.get_cell(&REFRESH, &2), 0);
    }

    #[tokio::test]
    async fn test_explicit_invalidate_reaches_dependents() {
        let g = graph();
        g.get(&SUM, vec![5]).await.unwrap();
        let dropped = g.invalidate(&DOUBLE, &5);
        assert_eq!(dropped, 2);
        g.get(&SUM, vec![5]).await.unwrap();
        assert_eq!(g.env().sums.load(Ordering::SeqCst), 2);
        assert_eq!(g.env().doubles.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_cached_and_contained() {
        let g = graph();
        let results = join_all(vec![g.get(&FAIL_ODD, 1), g.get(&FAIL_ODD, 2)]).await;
        assert_eq!(results[0].as_ref().unwrap_err().code, ErrorCode::RemoteReadFailure);
        assert_eq!(*results[1].as_ref().unwrap(), 2);

        g.get(&FAIL_ODD, 1).await.unwrap_err();
        assert_eq!(g.stats().evaluations, 2);
    }

    #[tokio::test]
    async fn test_abandoned_evaluation_still_populates_cache() {
        let g = graph();
        let pending = g.get(&DOUBLE, 9);
        let _ = tokio::time::timeout(Duration::from_millis(1), pending).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(g.get(&DOUBLE, 9).await.unwrap(), 18);
        assert_eq!(g.env().doubles.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unserializable_parameter_is_an_error() {
        let g = graph();
        let err = g.get(&OPAQUE, Opaque).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(g.get(&OPAQUE, Opaque).await.unwrap_err().code, ErrorCode::Internal);
        assert_eq!(g.stats().evaluations, 0);
        assert_eq!(g.stats().nodes, 0);
    }

    #[tokio::test]
    async fn test_evict_idle_cascades_through_orphaned_inputs() {
        let g = graph();
        g.get(&SUM, vec![1, 2]).await.unwrap();
        assert_eq!(g.stats().nodes, 3);

        // Inputs of a cached reader are not leaves.
        assert_eq!(g.evict(keep_for(Duration::from_secs(3600), usize::MAX)), 0);
        assert_eq!(g.evict(keep_for(Duration::ZERO, usize::MAX)), 3);

        let stats = g.stats();
        assert_eq!((stats.nodes, stats.edges, stats.evictions), (0, 0, 3));

        assert_eq!(g.get(&SUM, vec![1, 2]).await.unwrap(), 6);
        assert_eq!(g.env().sums.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_evict_keeps_shared_inputs_of_live_readers() {
        let g = graph();
        g.get(&SUM, vec![1]).await.unwrap();
        g.get(&DOUBLE, 2).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        g.get(&SUM, vec![1]).await.unwrap();

        // Only the standalone leaf has been idle long enough.
        assert_eq!(g.evict(keep_for(Duration::from_millis(10), usize::MAX)), 1);
        g.get(&SUM, vec![1]).await.unwrap();
        assert_eq!(g.env().doubles.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_evict_bounds_node_count() {
        let g = graph();
        for x in 0..50 {
            g.get(&DOUBLE, x).await.unwrap();
        }
        assert_eq!(g.stats().nodes, 50);

        assert_eq!(g.evict(keep_for(Duration::from_secs(3600), 10)), 40);
        assert_eq!(g.stats().nodes, 10);

        // Most recently read nodes survive.
        g.get(&DOUBLE, 49).await.unwrap();
        assert_eq!(g.env().doubles.load(Ordering::SeqCst), 50);
        g.get(&DOUBLE, 0).await.unwrap();
        assert_eq!(g.env().doubles.load(Ordering::SeqCst), 51);
    }

    #[tokio::test]
    async fn test_invalidation_after_eviction_stays_consistent() {
        let g = graph();
        g.get(&SUM, vec![3]).await.unwrap();
        g.evict(keep_for(Duration::ZERO, usize::MAX));

        assert!(g.set(&FACTOR, &(), 3));
        assert_eq!(g.get(&SUM, vec![3]).await.unwrap(), 9);
        assert_eq!(g.stats().nodes, 2);
    }
}
