use std::collections::BTreeMap;
use std::fmt::Debug;
use std::ops::Range;

use bit_set::BitSet;

/** Vertex Id */
pub type VertexId = usize;

/** Color (nonnegative integer) */
pub type Color = usize;

/** coloring of a graph: coloring[v] is the color of the vertex v */
pub type Coloring = Vec<Color>;

/** Solution of a graph coloring problem
(represented as a partition).
*/
pub type Solution = Vec<Vec<VertexId>>;

/** models a Graph Coloring instance.
Vertices are `0..nb_vertices()`, the adjacency is symmetric and the instance
does not change once built.
*/
pub trait ColoringInstance: Debug {
    /// number of vertices
    fn nb_vertices(&self) -> usize;

    /// vertices of the graph
    fn vertices(&self) -> Range<VertexId> { 0..self.nb_vertices() }

    /// list of vertices adjacent to u
    fn neighbors(&self, u:VertexId) -> &[VertexId];

    /// degree of u
    fn degree(&self, u:VertexId) -> usize { self.neighbors(u).len() }

    /// true iff u and v are adjacent
    fn are_adjacent(&self, u:VertexId, v:VertexId) -> bool;

    /// edge list (u < v for every edge (u,v))
    fn edges(&self) -> &[(VertexId, VertexId)];

    /// number of edges
    fn nb_edges(&self) -> usize { self.edges().len() }

    /// maximum degree (0 for an empty graph)
    fn max_degree(&self) -> usize {
        self.vertices().map(|u| self.degree(u)).max().unwrap_or(0)
    }

    /// prints statistics about the instance
    fn display_statistics(&self) {
        println!("\t{} \t vertices", self.nb_vertices());
        println!("\t{} \t edges", self.nb_edges());
        let min_degree = self.vertices().map(|u| self.degree(u)).min().unwrap_or(0);
        println!("\t{} \t min degree", min_degree);
        println!("\t{} \t max degree", self.max_degree());
    }
}


/** result of the solution checker */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckerResult {
    /// the solution is valid and uses the given number of colors
    Ok(usize),
    /// a vertex appears in more than one color class
    VertexDuplicated(VertexId),
    /// a vertex does not belong to the instance
    UnknownVertex(VertexId),
    /// some vertex is not colored
    VertexMissing(VertexId),
    /// the two vertices share a color and are adjacent
    Conflict(VertexId, VertexId),
}

/**
checks a solution given as a partition.
returns the number of colors if the solution is feasible, or the first violation found.
*/
pub fn checker(inst:&dyn ColoringInstance, sol:&[Vec<VertexId>]) -> CheckerResult {
    let n = inst.nb_vertices();
    // check that all vertices are added exactly once
    let mut visited = BitSet::with_capacity(n);
    for class in sol {
        for v in class {
            if *v >= n { return CheckerResult::UnknownVertex(*v); }
            if !visited.insert(*v) { return CheckerResult::VertexDuplicated(*v); }
        }
    }
    if let Some(v) = inst.vertices().find(|v| !visited.contains(*v)) {
        return CheckerResult::VertexMissing(v);
    }
    // check conflicts
    for class in sol {
        for (i,u) in class.iter().enumerate() {
            for v in &class[i+1..] {
                if inst.are_adjacent(*u, *v) { return CheckerResult::Conflict(*u, *v); }
            }
        }
    }
    CheckerResult::Ok(sol.iter().filter(|c| !c.is_empty()).count())
}

/** builds the partition of a coloring (color classes by increasing color, no empty class) */
pub fn coloring_to_solution(coloring:&[Color]) -> Solution {
    let mut classes:BTreeMap<Color, Vec<VertexId>> = BTreeMap::new();
    for (v,c) in coloring.iter().enumerate() {
        classes.entry(*c).or_default().push(v);
    }
    classes.into_values().collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    use crate::compact_instance::CompactInstance;

    fn triangle_with_tails() -> CompactInstance {
        CompactInstance::from_edges(5, &[(0,1),(0,2),(1,2),(1,3),(2,4)]).unwrap()
    }

    #[test]
    fn test_checker_ok() {
        let inst = triangle_with_tails();
        let sol = vec![vec![0,3,4], vec![1], vec![2]];
        assert_eq!(checker(&inst, &sol), CheckerResult::Ok(3));
    }

    #[test]
    fn test_checker_violations() {
        let inst = triangle_with_tails();
        assert_eq!(
            checker(&inst, &[vec![0,1], vec![2,3,4]]),
            CheckerResult::Conflict(0,1)
        );
        assert_eq!(
            checker(&inst, &[vec![0,3], vec![1,4]]),
            CheckerResult::VertexMissing(2)
        );
        assert_eq!(
            checker(&inst, &[vec![0,3,4], vec![1,3], vec![2]]),
            CheckerResult::VertexDuplicated(3)
        );
        assert_eq!(
            checker(&inst, &[vec![0,3,4,7], vec![1], vec![2]]),
            CheckerResult::UnknownVertex(7)
        );
    }

    #[test]
    fn test_coloring_to_solution() {
        let coloring = vec![4,1,7,4,1];
        let sol = coloring_to_solution(&coloring);
        assert_eq!(sol, vec![vec![1,4], vec![0,3], vec![2]]);
    }
}
