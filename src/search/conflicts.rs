use std::collections::HashSet;

use bit_set::BitSet;
use serde::{Deserialize, Serialize};

use crate::color::{Color, ColoringInstance, VertexId};

/** fitness of a coloring: nb_conflicts * weight + nb_colors (lower is better) */
pub type Fitness = u64;

/** conflicts, colors and fitness of a coloring */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// number of edges whose endpoints share a color
    pub nb_conflicts: usize,
    /// number of distinct colors
    pub nb_colors: usize,
    /// nb_conflicts * weight + nb_colors
    pub fitness: Fitness,
}

impl Evaluation {
    /// true iff no edge is conflicting
    pub fn is_feasible(&self) -> bool { self.nb_conflicts == 0 }
}

/// number of edges (u,v) such that coloring[u] == coloring[v]
pub fn nb_conflicts(inst:&dyn ColoringInstance, coloring:&[Color]) -> usize {
    nb_conflicts_from_edges(inst.edges(), coloring)
}

/// same as [`nb_conflicts`], given the edge list only (usable from worker threads)
pub fn nb_conflicts_from_edges(edges:&[(VertexId,VertexId)], coloring:&[Color]) -> usize {
    edges.iter().filter(|(u,v)| coloring[*u] == coloring[*v]).count()
}

/// number of distinct colors used
pub fn nb_colors(coloring:&[Color]) -> usize {
    coloring.iter().collect::<HashSet<_>>().len()
}

/** fitness of a coloring. The weight should exceed the largest possible number of colors
(see [`conflict_weight`]) so that any feasible coloring is better than any infeasible one.
*/
pub fn fitness(nb_conflicts:usize, nb_colors:usize, weight:u64) -> Fitness {
    nb_conflicts as u64 * weight + nb_colors as u64
}

/// weight to use for an instance: at least n+1
pub fn conflict_weight(inst:&dyn ColoringInstance, configured:u64) -> u64 {
    configured.max(inst.nb_vertices() as u64 + 1)
}

/// evaluates a coloring given the edge list
pub fn evaluate_from_edges(edges:&[(VertexId,VertexId)], coloring:&[Color], weight:u64) -> Evaluation {
    let nb_conflicts = nb_conflicts_from_edges(edges, coloring);
    let nb_colors = nb_colors(coloring);
    Evaluation { nb_conflicts, nb_colors, fitness: fitness(nb_conflicts, nb_colors, weight) }
}

/// evaluates a coloring
pub fn evaluate(inst:&dyn ColoringInstance, coloring:&[Color], weight:u64) -> Evaluation {
    evaluate_from_edges(inst.edges(), coloring, weight)
}

/// true iff v has a neighbor with the same color
pub fn is_vertex_conflicting(inst:&dyn ColoringInstance, coloring:&[Color], v:VertexId) -> bool {
    inst.neighbors(v).iter().any(|u| coloring[*u] == coloring[v])
}

/// list of vertices having at least one conflict (increasing order)
pub fn conflicting_vertices(inst:&dyn ColoringInstance, coloring:&[Color]) -> Vec<VertexId> {
    inst.vertices().filter(|v| is_vertex_conflicting(inst, coloring, *v)).collect()
}


/** incremental conflict evaluation for colorings using colors 0..k-1.
Maintains for every vertex the number of neighbors of each color, allowing to
evaluate a recoloring in O(1) and to apply it in O(d(v)).
*/
#[derive(Debug, Clone)]
pub struct ConflictTracker {
    /// colors[v]: color of the vertex v
    colors: Vec<Color>,
    /// number of colors allowed
    nb_colors: usize,
    /// nb_neigh_colors[v][c]: number of neighbors of v that are assigned color c
    nb_neigh_colors: Vec<Vec<usize>>,
    /// vertices having at least one conflict
    conflicting_vertices: BitSet,
    /// number of conflicting edges
    nb_conflicting_edges: usize,
}

impl ConflictTracker {
    /** builds the tracker. every color must be smaller than k. Time complexity: O(n.k + m) */
    pub fn new(inst:&dyn ColoringInstance, coloring:&[Color], k:usize) -> Self {
        let n = inst.nb_vertices();
        assert!(coloring.iter().all(|c| *c < k), "ConflictTracker: colors must be smaller than k");
        let mut nb_neigh_colors = vec![vec![0 ; k] ; n];
        for u in inst.vertices() {
            for v in inst.neighbors(u) {
                nb_neigh_colors[u][coloring[*v]] += 1;
            }
        }
        let mut conflicting_vertices = BitSet::with_capacity(n);
        for u in inst.vertices() {
            if nb_neigh_colors[u][coloring[u]] > 0 { conflicting_vertices.insert(u); }
        }
        Self {
            colors: coloring.to_vec(),
            nb_colors: k,
            nb_neigh_colors,
            conflicting_vertices,
            nb_conflicting_edges: nb_conflicts(inst, coloring),
        }
    }

    /// current coloring
    pub fn colors(&self) -> &[Color] { &self.colors }

    /// color of v
    pub fn color(&self, v:VertexId) -> Color { self.colors[v] }

    /// number of allowed colors (k)
    pub fn nb_allowed_colors(&self) -> usize { self.nb_colors }

    /// number of conflicting edges
    pub fn nb_conflicts(&self) -> usize { self.nb_conflicting_edges }

    /// vertices having at least one conflict (increasing order)
    pub fn conflicting_vertices(&self) -> impl Iterator<Item=VertexId> + '_ {
        self.conflicting_vertices.iter()
    }

    /// variation of the number of conflicts if v is recolored with c
    pub fn move_delta(&self, v:VertexId, c:Color) -> i64 {
        self.nb_neigh_colors[v][c] as i64 - self.nb_neigh_colors[v][self.colors[v]] as i64
    }

    /// number of conflicts if v is recolored with c
    pub fn conflicts_after_move(&self, v:VertexId, c:Color) -> usize {
        (self.nb_conflicting_edges as i64 + self.move_delta(v, c)) as usize
    }

    /** recolors v with c and updates the structure. Time complexity: O(d(v)) */
    pub fn change_color(&mut self, inst:&dyn ColoringInstance, v:VertexId, c:Color) {
        assert!(c < self.nb_colors);
        let previous_color = self.colors[v];
        if previous_color == c { return; }
        self.nb_conflicting_edges = self.conflicts_after_move(v, c);
        self.colors[v] = c;
        for u in inst.neighbors(v) {
            let u = *u;
            debug_assert!(self.nb_neigh_colors[u][previous_color] > 0);
            self.nb_neigh_colors[u][previous_color] -= 1;
            self.nb_neigh_colors[u][c] += 1;
            // only neighbors leaving or entering the color of v change their status
            if self.colors[u] == previous_color || self.colors[u] == c {
                self.update_status(u);
            }
        }
        self.update_status(v);
    }

    /// updates the membership of v in the conflicting vertices
    fn update_status(&mut self, v:VertexId) {
        if self.nb_neigh_colors[v][self.colors[v]] > 0 {
            self.conflicting_vertices.insert(v);
        } else {
            self.conflicting_vertices.remove(v);
        }
    }
}
