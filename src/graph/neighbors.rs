/// A directed neighbor list in compressed sparse row format.
/// Rows are sorted and deduplicated and never contain their own index.
/// Rows may be empty and the relation need not be symmetric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborList {
    offsets: Vec<u32>,
    neighbors: Vec<u32>,
}

impl NeighborList {
    /// Construct a neighbor list from per-node adjacency lists.
    pub fn new(mut lists: Vec<Vec<u32>>) -> Self {
        for (i, row) in lists.iter_mut().enumerate() {
            row.retain(|&j| j as usize != i);
            row.sort_unstable();
            row.dedup();
        }

        Self {
            offsets: std::iter::once(0u32).chain(
                lists.iter()
                    .map(|v| v.len() as u32)
                    .scan(0u32, |acc, len| {*acc += len; Some(*acc)})
            ).collect::<Vec<u32>>(),
            neighbors: lists.into_iter().flatten().collect(),
        }
    }

    /// Construct a neighbor list with `num_nodes` empty rows.
    pub fn empty(num_nodes: usize) -> Self {
        Self { offsets: vec![0; num_nodes + 1], neighbors: Vec::new() }
    }

    /// Get the number of nodes.
    #[inline] pub fn len(&self) -> usize { self.offsets.len() - 1 }

    /// Check if there are no nodes.
    #[inline] pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Get the number of directed links.
    #[inline] pub fn edge_count(&self) -> usize { self.neighbors.len() }

    /// Get the range of links for a given node.
    #[inline]
    fn range(&self, node: usize) -> std::ops::Range<usize> {
        self.offsets[node] as usize .. self.offsets[node + 1] as usize
    }

    /// Get the degree (number of neighbors) of a given node.
    #[inline] pub fn degree(&self, node: usize) -> usize { self.range(node).len() }

    /// Get the sorted neighbors of a given node.
    #[inline] pub fn row(&self, node: usize) -> &[u32] { &self.neighbors[self.range(node)] }

    /// Get an iterator over the neighbors of a given node.
    #[inline]
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.row(node).iter().map(|&j| j as usize)
    }

    /// Check whether `other` is a neighbor of `node`.
    #[inline]
    pub fn contains(&self, node: usize, other: usize) -> bool {
        self.row(node).binary_search(&(other as u32)).is_ok()
    }

    /// Get the nodes without any neighbors.
    pub fn islands(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(|&i| self.degree(i) == 0)
    }

    /// Check whether every link has a reverse link.
    pub fn is_symmetric(&self) -> bool {
        (0..self.len()).all(|i| self.neighbors(i).all(|j| self.contains(j, i)))
    }

    /// Node-wise union of two neighbor lists over the same nodes.
    pub fn union(&self, other: &NeighborList) -> NeighborList {
        assert_eq!(self.len(), other.len(), "neighbor lists must cover the same nodes");
        NeighborList::new(
            (0..self.len())
                .map(|i| self.row(i).iter().chain(other.row(i)).copied().collect())
                .collect()
        )
    }

    /// Average number of neighbors per node.
    pub fn mean_degree(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.edge_count() as f64 / self.len() as f64 }
    }
}
