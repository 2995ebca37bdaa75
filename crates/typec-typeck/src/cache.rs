//! Per-node type cache
//!
//! Each node is either absent, in progress or done. A query that reaches an
//! in-progress node sees the recursion placeholder, and every computation
//! started after that node is marked tainted: its result is handed back to
//! the caller but not stored, so it is recomputed once the outer node is
//! done. The outer node itself is stored as usual.

use la_arena::ArenaMap;
use typec_ast::NodeId;

use crate::types::Type;

#[derive(Debug, Clone)]
pub enum CacheEntry {
    InProgress,
    Done(Type),
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeId,
    tainted: bool,
}

#[derive(Default)]
pub struct TypeCache {
    entries: ArenaMap<NodeId, CacheEntry>,
    frames: Vec<Frame>,
    len: usize,
    /// Lowest frame position observed in progress since the last mark
    lowest_observed: Option<usize>,
}

/// Taken before a computation that is memoized outside this cache
#[derive(Debug, Clone, Copy)]
pub struct Mark {
    depth: usize,
    saved: Option<usize>,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: NodeId) -> Option<&CacheEntry> {
        self.entries.get(node)
    }

    /// The finished type of a node, if any
    pub fn done(&self, node: NodeId) -> Option<&Type> {
        match self.entries.get(node) {
            Some(CacheEntry::Done(ty)) => Some(ty),
            _ => None,
        }
    }

    pub fn is_in_progress(&self, node: NodeId) -> bool {
        matches!(self.entries.get(node), Some(CacheEntry::InProgress))
    }

    /// Number of finished entries
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn mark(&mut self) -> Mark {
        Mark {
            depth: self.frames.len(),
            saved: self.lowest_observed.take(),
        }
    }

    /// Whether anything since `mark` observed a computation that was already
    /// running when the mark was taken.
    pub fn observed_outside(&mut self, mark: Mark) -> bool {
        let hit = self.lowest_observed.is_some_and(|pos| pos < mark.depth);
        self.lowest_observed = match (self.lowest_observed, mark.saved) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        hit
    }

    pub fn begin(&mut self, node: NodeId) {
        self.entries.insert(node, CacheEntry::InProgress);
        self.frames.push(Frame {
            node,
            tainted: false,
        });
    }

    /// Mark every computation started after `node` as depending on it.
    pub fn observe_in_progress(&mut self, node: NodeId) {
        if let Some(pos) = self.frames.iter().rposition(|f| f.node == node) {
            self.lowest_observed = Some(self.lowest_observed.map_or(pos, |low| low.min(pos)));
            for frame in &mut self.frames[pos + 1..] {
                frame.tainted = true;
            }
        }
    }

    /// Close the innermost computation. Returns whether the result was stored.
    pub fn finish(&mut self, node: NodeId, ty: Type) -> bool {
        let frame = self.frames.pop();
        debug_assert!(frame.is_some_and(|f| f.node == node));
        let tainted = frame.is_some_and(|f| f.tainted);

        if tainted {
            self.entries.remove(node);
            false
        } else {
            self.entries.insert(node, CacheEntry::Done(ty));
            self.len += 1;
            true
        }
    }

    /// Drop a finished entry. In-progress entries are left alone.
    pub fn remove(&mut self, node: NodeId) -> bool {
        if let Some(CacheEntry::Done(_)) = self.entries.get(node) {
            self.entries.remove(node);
            self.len -= 1;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.entries = ArenaMap::default();
        self.frames.clear();
        self.len = 0;
        self.lowest_observed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typec_ast::{NodeKind, Program, Span};

    fn nodes(count: usize) -> Vec<NodeId> {
        let mut program = Program::new();
        (0..count)
            .map(|_| program.alloc(NodeKind::NullLiteral, Span::default()))
            .collect()
    }

    #[test]
    fn test_tri_state() {
        let ids = nodes(1);
        let mut cache = TypeCache::new();
        assert!(cache.get(ids[0]).is_none());

        cache.begin(ids[0]);
        assert!(cache.is_in_progress(ids[0]));

        assert!(cache.finish(ids[0], Type::bool()));
        assert_eq!(cache.done(ids[0]), Some(&Type::bool()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_results_under_an_in_progress_node_are_not_stored() {
        let ids = nodes(3);
        let mut cache = TypeCache::new();
        cache.begin(ids[0]);
        cache.begin(ids[1]);
        cache.begin(ids[2]);
        cache.observe_in_progress(ids[0]);

        assert!(!cache.finish(ids[2], Type::recursion_placeholder()));
        assert!(!cache.finish(ids[1], Type::recursion_placeholder()));
        assert!(cache.finish(ids[0], Type::void()));

        assert!(cache.get(ids[1]).is_none());
        assert!(cache.get(ids[2]).is_none());
        assert_eq!(cache.done(ids[0]), Some(&Type::void()));
    }

    #[test]
    fn test_marks_only_report_outer_nodes() {
        let ids = nodes(3);
        let mut cache = TypeCache::new();
        cache.begin(ids[0]);

        let mark = cache.mark();
        cache.begin(ids[1]);
        cache.begin(ids[2]);
        cache.observe_in_progress(ids[1]);
        cache.finish(ids[2], Type::void());
        cache.finish(ids[1], Type::void());
        assert!(!cache.observed_outside(mark));

        let mark = cache.mark();
        cache.begin(ids[2]);
        cache.observe_in_progress(ids[0]);
        cache.finish(ids[2], Type::void());
        assert!(cache.observed_outside(mark));
    }

    #[test]
    fn test_remove_and_clear() {
        let ids = nodes(2);
        let mut cache = TypeCache::new();
        for id in &ids {
            cache.begin(*id);
            cache.finish(*id, Type::string());
        }
        assert!(cache.remove(ids[0]));
        assert!(!cache.remove(ids[0]));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.done(ids[1]).is_none());
    }
}
