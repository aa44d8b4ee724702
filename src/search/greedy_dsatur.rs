use std::cmp::Ordering;

use priority_queue::PriorityQueue;
use bit_set::BitSet;
use tracing::debug;

use crate::color::{Color, Coloring, ColoringInstance, VertexId};
use crate::search::conflicts::nb_colors;

#[derive(PartialEq, Eq)]
struct DSatInfo {
    dsat: usize,
    degree: usize,
    /// reversed id: ties go to the smallest vertex
    rev_id: usize,
}

impl Ord for DSatInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dsat.cmp(&other.dsat)
            .then_with(|| self.degree.cmp(&other.degree))
            .then_with(|| self.rev_id.cmp(&other.rev_id))
    }
}

// `PartialOrd` needs to be implemented as well.
impl PartialOrd for DSatInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/** implements a greedy DSATUR algorithm.
    1. choose an uncolored vertex that sees the most colors (break ties by the largest degree)
    2. assign it the first color available
    3. mark all its neighbors seeing this color
    4. repeat until a proper coloring is found

The result is conflict-free and deterministic.
*/
pub fn greedy_dsatur(inst:&dyn ColoringInstance) -> Coloring {
    let n:usize = inst.nb_vertices();
    let mut remaining_vertices:PriorityQueue<VertexId, DSatInfo> = PriorityQueue::new();
    for i in inst.vertices() {
        remaining_vertices.push(i, DSatInfo { dsat:0, degree:inst.degree(i), rev_id:n-i });
    }
    let mut colors:Vec<Option<Color>> = vec![None ; n]; // colors[v] -> color assigned to vertex v
    let mut adj_colors:Vec<BitSet> = vec![BitSet::default() ; n]; // adj_colors[v] -> colors v sees
    while let Some((current_vertex,_)) = remaining_vertices.pop() {
        // assign it a color
        let mut color:Color = 0;
        while adj_colors[current_vertex].contains(color) { color += 1; }
        colors[current_vertex] = Some(color);
        // update saturation degree information
        for conflict_vertex in inst.neighbors(current_vertex).iter()
        .filter(|conflict_vertex| colors[**conflict_vertex].is_none()) {
            if adj_colors[*conflict_vertex].insert(color) {
                remaining_vertices.change_priority_by(conflict_vertex, |p| { p.dsat += 1; });
            }
        }
    }
    let res:Coloring = colors.into_iter().map(|c| c.unwrap_or(0)).collect();
    debug!(nb_colors = nb_colors(&res), "dsatur greedy done");
    res
}


#[cfg(test)]
mod tests {
    use super::*;

    use crate::compact_instance::CompactInstance;
    use crate::search::conflicts::nb_conflicts;

    #[test]
    fn test_dsatur_triangle_with_tails() {
        let inst = CompactInstance::from_file("insts/triangle_tails.col").unwrap();
        let coloring = greedy_dsatur(&inst);
        assert_eq!(nb_conflicts(&inst, &coloring), 0);
        assert_eq!(nb_colors(&coloring), 3);
    }

    #[test]
    fn test_dsatur_is_feasible() {
        for filename in ["insts/myciel3.col", "insts/queen5_5.col", "insts/grid2x2.col"] {
            let inst = CompactInstance::from_file(filename).unwrap();
            let coloring = greedy_dsatur(&inst);
            assert_eq!(nb_conflicts(&inst, &coloring), 0);
            assert!(nb_colors(&coloring) <= inst.max_degree() + 1);
        }
    }

    #[test]
    fn test_dsatur_bipartite() {
        // DSATUR is exact on bipartite graphs
        let inst = CompactInstance::from_file("insts/grid2x2.col").unwrap();
        assert_eq!(nb_colors(&greedy_dsatur(&inst)), 2);
    }
}
