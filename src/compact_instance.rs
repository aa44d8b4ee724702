use std::path::Path;

use bit_set::BitSet;

use crate::color::{ColoringInstance, VertexId};
use crate::dimacs::read_from_file;
use crate::error::LoadError;

/// instances at least this dense get an adjacency matrix
const DENSE_THRESHOLD:f64 = 0.5;

/** models a Graph Coloring instance.  */
#[derive(Debug, Clone)]
pub struct CompactInstance {
    /// nb vertices
    n: usize,
    /// edges of the graph (u < v)
    edges: Vec<(VertexId,VertexId)>,
    /// adj_list[i]: list of vertices adjacent to i (sorted)
    adj_list: Vec<Vec<VertexId>>,
    /// if exists: adj_matrix[i] represents a bitset of its neighbors
    adj_matrix: Option<Vec<BitSet>>,
}

impl ColoringInstance for CompactInstance {
    fn nb_vertices(&self) -> usize { self.n }

    fn neighbors(&self, u:VertexId) -> &[VertexId] { &self.adj_list[u] }

    fn are_adjacent(&self, u:VertexId, v:VertexId) -> bool {
        match &self.adj_matrix { // if the matrix representation does not exist, search the list
            None => { self.adj_list[u].binary_search(&v).is_ok() },
            Some(matrix) => { matrix[u].contains(v) } // otherwise, use it
        }
    }

    fn edges(&self) -> &[(VertexId, VertexId)] { &self.edges }

    fn display_statistics(&self) {
        println!("\t{} \t vertices", self.nb_vertices());
        println!("\t{} \t edges", self.nb_edges());
        let degrees:Vec<usize> = self.vertices().map(|i| self.degree(i)).collect();
        println!("\t{} \t min degree", degrees.iter().min().unwrap_or(&0));
        println!("\t{} \t max degree", degrees.iter().max().unwrap_or(&0));
        if self.adj_matrix.is_some() {
            println!("\tadj matrix computed");
        }
    }
}


impl CompactInstance {

    /** constructor using a number of vertices and an edge list (0-based).
    Parallel edges are merged. Fails on self-loops and on out of range vertices.
    */
    pub fn from_edges(n:usize, edges:&[(VertexId,VertexId)]) -> Result<Self, LoadError> {
        let mut adj_list:Vec<Vec<VertexId>> = vec![Vec::new() ; n];
        for (u,v) in edges {
            let (u,v) = (*u,*v);
            if u >= n || v >= n { return Err(LoadError::VertexOutOfRange { u, v, n }); }
            if u == v { return Err(LoadError::SelfLoop(u)); }
            adj_list[u].push(v);
            adj_list[v].push(u);
        }
        Ok(Self::new(adj_list))
    }

    /** constructor using an adjacency list.
    The list is made symmetric, sorted and deduplicated (self-loops are dropped).
    Dense instances also get an adjacency matrix.
    */
    pub fn new(mut adj_list:Vec<Vec<VertexId>>) -> Self {
        let n = adj_list.len();
        // symmetrize
        for u in 0..n {
            for i in 0..adj_list[u].len() {
                let v = adj_list[u][i];
                if v < n && v != u { adj_list[v].push(u); }
            }
        }
        for (u,l) in adj_list.iter_mut().enumerate() {
            l.retain(|v| *v < n && *v != u);
            l.sort_unstable();
            l.dedup();
        }
        let edges = Self::build_edges(&adj_list);
        let mut res = Self { n, edges, adj_list, adj_matrix:None };
        if res.density() >= DENSE_THRESHOLD { res.populate_adj_matrix(); }
        res
    }

    /// number of edges divided by the number of vertex pairs (0 with less than 2 vertices)
    pub fn density(&self) -> f64 {
        if self.n < 2 { return 0.; }
        self.edges.len() as f64 / (self.n * (self.n-1) / 2) as f64
    }

    /// true iff the adjacency matrix is available
    pub fn has_adj_matrix(&self) -> bool { self.adj_matrix.is_some() }

    /// creates an instance from a DIMACS file
    pub fn from_file<P:AsRef<Path>>(filename:P) -> Result<Self, LoadError> {
        let (n,edges) = read_from_file(filename)?;
        Self::from_edges(n, &edges)
    }

    /// builds the edge list
    fn build_edges(adj_list:&[Vec<VertexId>]) -> Vec<(VertexId,VertexId)> {
        let mut res = Vec::new();
        for (i,l) in adj_list.iter().enumerate() {
            for j in l {
                if i < *j {
                    res.push((i,*j));
                }
            }
        }
        res
    }

    /// if called, populate the adj_matrix
    pub fn populate_adj_matrix(&mut self) {
        let mut res = vec![BitSet::with_capacity(self.n); self.n];
        for (a,resa) in res.iter_mut().enumerate() {
            for b in &self.adj_list[a] {
                resa.insert(*b);
            }
        }
        self.adj_matrix = Some(res);
    }
}
