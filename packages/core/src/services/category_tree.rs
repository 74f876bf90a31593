//! Category Tree Cache and Builder
//!
//! The authoritative in-process view of the category forest, rebuilt from
//! flat rows on demand.
//!
//! # Reconstruction
//!
//! Rows encode parent linkage in `pid` and sibling order as a singly linked
//! list in `next_id`. Reconstruction buckets rows by `pid` (0 is the virtual
//! root group), then rebuilds each bucket's order by walking `next_id`
//! chains: pick the first unvisited member, follow links within the bucket
//! while marking members visited, and prepend each finished partial chain
//! before the list built so far. A walk that starts mid-chain later meets an
//! already-visited member and its segment lands in front, so the result is
//! the unique linked-list order whenever the rows are well formed - and a
//! deterministic, terminating best-effort order when they are not (cycles,
//! links pointing outside the bucket).
//!
//! # Cache invalidation
//!
//! The cache is process-wide shared state with a single stale flag: any
//! committed mutation calls `mark_stale()`, and the next accessor rebuilds
//! the whole snapshot. There is no finer-grained invalidation and no TTL.

use crate::db::DatabaseService;
use crate::models::{Category, CategoryNode};
use crate::services::error::CategoryServiceError;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Immutable view of the category forest at one reload.
///
/// Holds the id map, the per-group sibling order (key 0 = root group), and
/// the materialized forest. Served behind an `Arc`; never patched in place.
#[derive(Debug, Default)]
pub struct TreeSnapshot {
    map: HashMap<i64, Category>,
    order: HashMap<i64, Vec<i64>>,
    forest: Vec<CategoryNode>,
}

impl TreeSnapshot {
    /// Build a snapshot from raw rows.
    ///
    /// Row order determines the walk order inside malformed buckets, so the
    /// caller fetches `ORDER BY id` to keep reconstruction deterministic.
    pub fn build(rows: Vec<Category>) -> Self {
        let map: HashMap<i64, Category> = rows.iter().map(|c| (c.id, c.clone())).collect();

        let mut buckets: HashMap<i64, Vec<i64>> = HashMap::new();
        buckets.insert(0, Vec::new());
        for row in &rows {
            if row.pid != 0 && !map.contains_key(&row.pid) {
                tracing::warn!(
                    id = row.id,
                    pid = row.pid,
                    "category references a missing parent; kept in map, dropped from forest"
                );
            }
            buckets.entry(row.pid).or_default().push(row.id);
        }

        let order: HashMap<i64, Vec<i64>> = buckets
            .iter()
            .map(|(pid, members)| (*pid, chain_order(members, &map)))
            .collect();

        let forest = assemble(0, &map, &order);

        Self { map, order, forest }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.map.contains_key(&id)
    }

    pub fn get(&self, id: i64) -> Option<&Category> {
        self.map.get(&id)
    }

    /// Number of direct children of `id`
    pub fn child_count(&self, id: i64) -> usize {
        self.order.get(&id).map(Vec::len).unwrap_or(0)
    }

    /// Ordered member ids of the sibling group under `pid` (0 = root group)
    pub fn group(&self, pid: i64) -> &[i64] {
        self.order.get(&pid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The root forest, in sibling order
    pub fn roots(&self) -> &[CategoryNode] {
        &self.forest
    }

    /// Find the sibling in group `pid` whose `next_id` equals `next_id`.
    ///
    /// With `next_id == 0` this returns the group's tail, which is why the
    /// group is always named explicitly: the 0 sentinel alone cannot select
    /// a sibling group.
    pub fn predecessor_in_group(&self, pid: i64, next_id: i64) -> Option<&Category> {
        let ids = self.order.get(&pid)?;
        ids.iter()
            .filter_map(|id| self.map.get(id))
            .find(|c| c.next_id == next_id)
    }

    /// Whether `ancestor` appears in `id`'s parent chain (or equals it).
    ///
    /// The walk is hop-bounded so malformed `pid` data cannot loop forever.
    pub fn has_ancestor_or_self(&self, mut id: i64, ancestor: i64) -> bool {
        let mut hops = 0;
        while id != 0 && hops <= self.map.len() {
            if id == ancestor {
                return true;
            }
            id = self.map.get(&id).map(|c| c.pid).unwrap_or(0);
            hops += 1;
        }
        false
    }
}

/// Reconstruct one sibling bucket's order from its `next_id` links.
///
/// `members` is the bucket in row order; the walk never leaves the bucket.
fn chain_order(members: &[i64], map: &HashMap<i64, Category>) -> Vec<i64> {
    let member_set: HashSet<i64> = members.iter().copied().collect();
    let mut visited: HashSet<i64> = HashSet::with_capacity(members.len());
    let mut ordered: Vec<i64> = Vec::with_capacity(members.len());

    for &start in members {
        if visited.contains(&start) {
            continue;
        }

        let mut chain = Vec::new();
        let mut current = start;
        loop {
            chain.push(current);
            visited.insert(current);

            let next = match map.get(&current) {
                Some(category) => category.next_id,
                None => break,
            };
            if next == 0 {
                break;
            }
            if !member_set.contains(&next) {
                tracing::warn!(
                    id = current,
                    next_id = next,
                    "sibling link points outside its group; chain truncated"
                );
                break;
            }
            if visited.contains(&next) {
                // Re-entered a finished segment: this chain is the part that
                // comes before it.
                break;
            }
            current = next;
        }

        chain.append(&mut ordered);
        ordered = chain;
    }

    ordered
}

/// Materialize the subtree under `group` (0 = root forest) from the ordered
/// buckets.
fn assemble(
    group: i64,
    map: &HashMap<i64, Category>,
    order: &HashMap<i64, Vec<i64>>,
) -> Vec<CategoryNode> {
    let Some(ids) = order.get(&group) else {
        return Vec::new();
    };

    ids.iter()
        .filter_map(|id| {
            map.get(id).map(|category| CategoryNode {
                category: category.clone(),
                children: assemble(*id, map, order),
            })
        })
        .collect()
}

/// Staleness-gated, process-wide cache of the category forest.
pub struct CategoryTreeCache {
    db: Arc<DatabaseService>,
    snapshot: RwLock<Arc<TreeSnapshot>>,
    stale: AtomicBool,
}

impl CategoryTreeCache {
    /// Create an empty cache; the first accessor triggers a reload.
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self {
            db,
            snapshot: RwLock::new(Arc::new(TreeSnapshot::default())),
            stale: AtomicBool::new(true),
        }
    }

    /// Current snapshot, reloading first if the cache is stale.
    pub async fn snapshot(&self) -> Result<Arc<TreeSnapshot>, CategoryServiceError> {
        if self.stale.load(Ordering::Acquire) {
            self.reload().await?;
        }
        Ok(self.snapshot.read().await.clone())
    }

    /// The root forest (cloned out of the snapshot).
    pub async fn tree(&self) -> Result<Vec<CategoryNode>, CategoryServiceError> {
        Ok(self.snapshot().await?.roots().to_vec())
    }

    /// Invalidate the cache; the next accessor rebuilds from fresh rows.
    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::Release);
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }

    /// Rebuild the snapshot from the database.
    ///
    /// The stale flag is cleared before the fetch: a mutation committing
    /// while the reload is in flight re-marks the cache and the next
    /// accessor reloads again.
    async fn reload(&self) -> Result<(), CategoryServiceError> {
        let mut guard = self.snapshot.write().await;
        if !self.stale.swap(false, Ordering::AcqRel) {
            // Another task rebuilt the snapshot while we waited for the lock
            return Ok(());
        }

        let rows = match self.db.db_fetch_categories().await {
            Ok(rows) => rows,
            Err(e) => {
                self.stale.store(true, Ordering::Release);
                return Err(e.into());
            }
        };

        let snapshot = TreeSnapshot::build(rows);
        tracing::debug!(categories = snapshot.len(), "rebuilt category tree cache");
        *guard = Arc::new(snapshot);

        Ok(())
    }
}
