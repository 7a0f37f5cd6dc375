//! Node↔edge incidence index and its builder.
//!
//! # Data layout
//!
//! The incidence relation is stored twice in **Compressed Sparse Row (CSR)**
//! format, once per direction:
//!
//! ```text
//! node → edges:  incid_ind[ incid_ptr[n] .. incid_ptr[n+1] ]
//! edge → nodes:  coinc_ind[ coinc_ptr[e] .. coinc_ptr[e+1] ]
//! ```
//!
//! Both views describe the same relation; `from_csr` checks this once at
//! construction so the simulation loops can trust it without re-checking.
//! Iterating the edges of a node (or the nodes of an edge) is a contiguous
//! slice scan.

use sm_core::{EdgeId, NodeId};

use crate::{GraphError, GraphResult};

// ── Incidence ─────────────────────────────────────────────────────────────────

/// Immutable bipartite incidence between nodes and edges.
///
/// Build with [`IncidenceBuilder`] or, when the CSR blocks come from
/// elsewhere, with [`Incidence::from_csr`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Incidence {
    /// Row pointer of the node → edges view.  Length = `node_count + 1`.
    incid_ptr: Vec<u32>,
    /// Edge indices, ascending within each node row.
    incid_ind: Vec<u32>,
    /// Row pointer of the edge → nodes view.  Length = `edge_count + 1`.
    coinc_ptr: Vec<u32>,
    /// Node indices of each edge.
    coinc_ind: Vec<u32>,
}

impl Incidence {
    /// Wrap externally supplied CSR blocks.
    ///
    /// Checks pointer shapes, index bounds, that every edge covers at least
    /// one node without repeats, and that both views encode the same
    /// relation.
    pub fn from_csr(
        incid_ptr: Vec<u32>,
        incid_ind: Vec<u32>,
        coinc_ptr: Vec<u32>,
        coinc_ind: Vec<u32>,
    ) -> GraphResult<Self> {
        check_csr("incid", &incid_ptr, incid_ind.len())?;
        check_csr("coinc", &coinc_ptr, coinc_ind.len())?;
        if incid_ind.len() != coinc_ind.len() {
            return Err(GraphError::MalformedCsr {
                what:   "incid/coinc",
                reason: format!("{} vs {} incidences", incid_ind.len(), coinc_ind.len()),
            });
        }

        let node_count = incid_ptr.len() - 1;
        let edge_count = coinc_ptr.len() - 1;

        for node in 0..node_count {
            for &e in &incid_ind[incid_ptr[node] as usize..incid_ptr[node + 1] as usize] {
                if e as usize >= edge_count {
                    return Err(GraphError::EdgeOutOfRange {
                        node: NodeId(node as u32),
                        edge: EdgeId(e),
                        edge_count,
                    });
                }
            }
        }

        let (t_ptr, t_ind) = transpose(&incid_ptr, &incid_ind, edge_count);
        let mut row: Vec<u32> = Vec::new();
        for edge in 0..edge_count {
            let id = EdgeId(edge as u32);
            row.clear();
            row.extend_from_slice(&coinc_ind[coinc_ptr[edge] as usize..coinc_ptr[edge + 1] as usize]);
            check_edge_row(id, &mut row, node_count)?;
            if row[..] != t_ind[t_ptr[edge] as usize..t_ptr[edge + 1] as usize] {
                return Err(GraphError::Inconsistent(id));
            }
        }

        Ok(Self { incid_ptr, incid_ind, coinc_ptr, coinc_ind })
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.incid_ptr.len() - 1
    }

    pub fn edge_count(&self) -> usize {
        self.coinc_ptr.len() - 1
    }

    /// Total number of (node, edge) incidences.
    pub fn nnz(&self) -> usize {
        self.coinc_ind.len()
    }

    /// `true` if every edge joins exactly two nodes.
    pub fn is_simple(&self) -> bool {
        self.coinc_ptr.windows(2).all(|w| w[1] - w[0] == 2)
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    /// Edges incident to `node`, ascending.  No heap allocation.
    #[inline]
    pub fn edges_of(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.edge_slice(node).iter().map(|&e| EdgeId(e))
    }

    /// Nodes covered by `edge`.  No heap allocation.
    #[inline]
    pub fn nodes_of(&self, edge: EdgeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node_slice(edge).iter().map(|&n| NodeId(n))
    }

    /// Raw edge indices of `node` (hot-path form of [`edges_of`](Self::edges_of)).
    #[inline]
    pub fn edge_slice(&self, node: NodeId) -> &[u32] {
        let start = self.incid_ptr[node.index()] as usize;
        let end   = self.incid_ptr[node.index() + 1] as usize;
        &self.incid_ind[start..end]
    }

    /// Raw node indices of `edge` (hot-path form of [`nodes_of`](Self::nodes_of)).
    #[inline]
    pub fn node_slice(&self, edge: EdgeId) -> &[u32] {
        let start = self.coinc_ptr[edge.index()] as usize;
        let end   = self.coinc_ptr[edge.index() + 1] as usize;
        &self.coinc_ind[start..end]
    }

    #[inline]
    pub fn node_degree(&self, node: NodeId) -> usize {
        self.edge_slice(node).len()
    }

    #[inline]
    pub fn edge_size(&self, edge: EdgeId) -> usize {
        self.node_slice(edge).len()
    }

    // ── CSR blocks ────────────────────────────────────────────────────────

    pub fn incid_ptr(&self) -> &[u32] {
        &self.incid_ptr
    }

    pub fn incid_ind(&self) -> &[u32] {
        &self.incid_ind
    }

    pub fn coinc_ptr(&self) -> &[u32] {
        &self.coinc_ptr
    }

    pub fn coinc_ind(&self) -> &[u32] {
        &self.coinc_ind
    }
}

// ── IncidenceBuilder ──────────────────────────────────────────────────────────

/// Construct an [`Incidence`] from explicit edge node lists, then call
/// [`build`](Self::build).
///
/// Edges are numbered in insertion order.  `build()` sorts each edge's nodes,
/// validates them, and derives the node → edges view by transposition.
///
/// # Example
///
/// ```
/// use sm_core::NodeId;
/// use sm_graph::IncidenceBuilder;
///
/// // Triangle: three nodes, three pair edges.
/// let mut b = IncidenceBuilder::new(3);
/// b.add_pair(NodeId(0), NodeId(1));
/// b.add_pair(NodeId(0), NodeId(2));
/// b.add_pair(NodeId(1), NodeId(2));
/// let g = b.build().unwrap();
/// assert_eq!(g.edge_count(), 3);
/// assert!(g.is_simple());
/// assert_eq!(g.node_degree(NodeId(0)), 2);
/// ```
pub struct IncidenceBuilder {
    node_count: usize,
    edges:      Vec<Vec<NodeId>>,
}

impl IncidenceBuilder {
    pub fn new(node_count: usize) -> Self {
        Self { node_count, edges: Vec::new() }
    }

    pub fn with_capacity(node_count: usize, edges: usize) -> Self {
        Self { node_count, edges: Vec::with_capacity(edges) }
    }

    /// Add an edge covering `nodes` and return its `EdgeId` (sequential from 0).
    pub fn add_edge(&mut self, nodes: &[NodeId]) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(nodes.to_vec());
        id
    }

    /// Convenience for simple graphs: an edge joining `a` and `b`.
    pub fn add_pair(&mut self, a: NodeId, b: NodeId) -> EdgeId {
        self.add_edge(&[a, b])
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Consume the builder and produce an [`Incidence`].
    pub fn build(self) -> GraphResult<Incidence> {
        let mut coinc_ptr = Vec::with_capacity(self.edges.len() + 1);
        let mut coinc_ind = Vec::with_capacity(self.edges.iter().map(Vec::len).sum());
        coinc_ptr.push(0u32);

        let mut row: Vec<u32> = Vec::new();
        for (i, nodes) in self.edges.iter().enumerate() {
            row.clear();
            row.extend(nodes.iter().map(|n| n.0));
            check_edge_row(EdgeId(i as u32), &mut row, self.node_count)?;
            coinc_ind.extend_from_slice(&row);
            coinc_ptr.push(coinc_ind.len() as u32);
        }

        let (incid_ptr, incid_ind) = transpose(&coinc_ptr, &coinc_ind, self.node_count);
        Ok(Incidence { incid_ptr, incid_ind, coinc_ptr, coinc_ind })
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn check_csr(what: &'static str, ptr: &[u32], nnz: usize) -> GraphResult<()> {
    let malformed = |reason: String| GraphError::MalformedCsr { what, reason };
    match (ptr.first(), ptr.last()) {
        (None, _) => return Err(malformed("empty row pointer".into())),
        (Some(&first), _) if first != 0 => {
            return Err(malformed(format!("row pointer starts at {first}")));
        }
        (_, Some(&last)) if last as usize != nnz => {
            return Err(malformed(format!("row pointer ends at {last}, expected {nnz}")));
        }
        _ => {}
    }
    if let Some(i) = ptr.windows(2).position(|w| w[1] < w[0]) {
        return Err(malformed(format!("row pointer decreases at row {i}")));
    }
    Ok(())
}

/// Sort an edge's node list in place and check it is non-empty, in range,
/// and free of repeats.
fn check_edge_row(edge: EdgeId, row: &mut [u32], node_count: usize) -> GraphResult<()> {
    if row.is_empty() {
        return Err(GraphError::EmptyEdge(edge));
    }
    row.sort_unstable();
    if let Some(&n) = row.iter().find(|&&n| n as usize >= node_count) {
        return Err(GraphError::NodeOutOfRange { edge, node: NodeId(n), node_count });
    }
    if let Some(w) = row.windows(2).find(|w| w[0] == w[1]) {
        return Err(GraphError::DuplicateNode { edge, node: NodeId(w[0]) });
    }
    Ok(())
}

/// Transpose a CSR block with `cols` columns.  Rows are visited in order, so
/// each output row comes out ascending.
fn transpose(ptr: &[u32], ind: &[u32], cols: usize) -> (Vec<u32>, Vec<u32>) {
    let mut t_ptr = vec![0u32; cols + 1];
    for &c in ind {
        t_ptr[c as usize + 1] += 1;
    }
    for i in 1..=cols {
        t_ptr[i] += t_ptr[i - 1];
    }

    let mut cursor = t_ptr.clone();
    let mut t_ind  = vec![0u32; ind.len()];
    for row in 0..ptr.len() - 1 {
        for &c in &ind[ptr[row] as usize..ptr[row + 1] as usize] {
            let slot = &mut cursor[c as usize];
            t_ind[*slot as usize] = row as u32;
            *slot += 1;
        }
    }
    debug_assert_eq!(t_ptr[cols] as usize, ind.len());
    (t_ptr, t_ind)
}
