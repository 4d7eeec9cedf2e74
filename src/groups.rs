pub type TileId = usize;
pub type GroupId = usize;

/// Disjoint-set partition of tiles into rigid groups.
///
/// A group's id is the id of its root tile. `union(a, b)` keeps `a`'s root,
/// so the merged group carries the id of the side that initiated the merge.
/// Member lists are kept per root so that enumerating a group does not scan
/// the whole tile set.
#[derive(Clone, Debug, Default)]
pub struct DisjointSet {
    parent: Vec<TileId>,
    members: Vec<Vec<TileId>>,
}

impl DisjointSet {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            members: (0..len).map(|id| vec![id]).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Root lookup with path compression.
    pub fn find(&mut self, id: TileId) -> GroupId {
        let mut root = id;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = id;
        while current != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// Root lookup without mutation, for read-only queries.
    pub fn root(&self, id: TileId) -> GroupId {
        let mut root = id;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        root
    }

    pub fn same_group(&self, a: TileId, b: TileId) -> bool {
        self.root(a) == self.root(b)
    }

    /// Merges `b`'s group into `a`'s. Returns the surviving group id, or
    /// `None` when both already share a group.
    pub fn union(&mut self, a: TileId, b: TileId) -> Option<GroupId> {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return None;
        }
        self.parent[root_b] = root_a;
        let moved = std::mem::take(&mut self.members[root_b]);
        self.members[root_a].extend(moved);
        Some(root_a)
    }

    /// Members of the group containing `id`, in merge order.
    pub fn members(&self, id: TileId) -> &[TileId] {
        &self.members[self.root(id)]
    }

    pub fn group_size(&self, id: TileId) -> usize {
        self.members(id).len()
    }

    pub fn group_count(&self) -> usize {
        self.parent
            .iter()
            .enumerate()
            .filter(|(id, parent)| *id == **parent)
            .count()
    }
}
