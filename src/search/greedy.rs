use bit_set::BitSet;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::color::{Color, Coloring, ColoringInstance, VertexId};

/** order in which the greedy visits the vertices */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexOrder {
    /// 0, 1, ..., n-1
    Natural,
    /// largest degree first (ties broken by vertex id)
    DegreeDescending,
    /// uniformly shuffled
    Random,
}

impl Default for VertexOrder {
    fn default() -> Self { Self::DegreeDescending }
}

/// builds the visiting order of the vertices
pub fn vertex_order<R:Rng>(inst:&dyn ColoringInstance, order:VertexOrder, rng:&mut R) -> Vec<VertexId> {
    let mut res:Vec<VertexId> = inst.vertices().collect();
    match order {
        VertexOrder::Natural => {},
        VertexOrder::DegreeDescending => {
            res.sort_by(|a,b| inst.degree(*b).cmp(&inst.degree(*a)).then(a.cmp(b)));
        },
        VertexOrder::Random => res.shuffle(rng),
    }
    res
}

/** first-fit greedy: visits the vertices in the given order and assigns each of them the
smallest color not used by an already colored neighbor.
The result has no conflict and uses at most Δ(G)+1 colors. Time complexity: O(n+m).
*/
pub fn first_fit(inst:&dyn ColoringInstance, order:&[VertexId]) -> Coloring {
    let n = inst.nb_vertices();
    let mut colors:Vec<Option<Color>> = vec![None ; n];
    let mut neigh_colors = BitSet::with_capacity(inst.max_degree()+1);
    for u in order {
        neigh_colors.clear();
        for v in inst.neighbors(*u) {
            if let Some(c) = colors[*v] { neigh_colors.insert(c); }
        }
        let mut color:Color = 0;
        while neigh_colors.contains(color) { color += 1; }
        colors[*u] = Some(color);
    }
    colors.into_iter().map(|c| c.unwrap_or(0)).collect()
}

/// greedy coloring using the given vertex order
pub fn greedy_coloring<R:Rng>(inst:&dyn ColoringInstance, order:VertexOrder, rng:&mut R) -> Coloring {
    let visit = vertex_order(inst, order, rng);
    first_fit(inst, &visit)
}

/** maps every color c to c mod k (may introduce conflicts).

# Panics
if k is 0.
*/
pub fn remap_modulo(coloring:&mut [Color], k:usize) {
    assert!(k > 0, "remap_modulo: the number of colors must be positive");
    for c in coloring.iter_mut() {
        *c %= k;
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::compact_instance::CompactInstance;
    use crate::search::conflicts::{nb_colors, nb_conflicts};

    /// random graph G(n,p)
    fn random_graph(n:usize, p:f64, rng:&mut StdRng) -> CompactInstance {
        let mut edges = Vec::new();
        for u in 0..n {
            for v in u+1..n {
                if rng.gen_bool(p) { edges.push((u,v)); }
            }
        }
        CompactInstance::from_edges(n, &edges).unwrap()
    }

    #[test]
    fn test_greedy_is_feasible_and_bounded() {
        let mut rng = StdRng::seed_from_u64(42);
        for i in 0..20 {
            let inst = random_graph(10 + 3*i, 0.05 * (1 + i%10) as f64, &mut rng);
            for order in [VertexOrder::Natural, VertexOrder::DegreeDescending, VertexOrder::Random] {
                let coloring = greedy_coloring(&inst, order, &mut rng);
                assert_eq!(coloring.len(), inst.nb_vertices());
                assert_eq!(nb_conflicts(&inst, &coloring), 0);
                assert!(nb_colors(&coloring) <= inst.max_degree() + 1);
            }
        }
    }

    #[test]
    fn test_natural_order_on_triangle_with_tails() {
        let inst = CompactInstance::from_file("insts/triangle_tails.col").unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let coloring = greedy_coloring(&inst, VertexOrder::Natural, &mut rng);
        assert_eq!(coloring, vec![0,1,2,0,0]);
    }

    #[test]
    fn test_degree_descending_order() {
        let inst = CompactInstance::from_file("insts/triangle_tails.col").unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(vertex_order(&inst, VertexOrder::DegreeDescending, &mut rng), vec![1,2,0,3,4]);
    }

    #[test]
    fn test_random_order_is_a_permutation() {
        let inst = CompactInstance::from_file("insts/myciel3.col").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut order = vertex_order(&inst, VertexOrder::Random, &mut rng);
        order.sort_unstable();
        assert_eq!(order, (0..11).collect::<Vec<_>>());
    }

    #[test]
    fn test_remap_modulo_may_create_conflicts() {
        let inst = CompactInstance::from_file("insts/triangle_tails.col").unwrap();
        let mut coloring = vec![0,1,2,0,0];
        remap_modulo(&mut coloring, 2);
        assert_eq!(coloring, vec![0,1,0,0,0]);
        assert_eq!(nb_conflicts(&inst, &coloring), 2);
    }

    #[test]
    fn test_empty_graph() {
        let inst = CompactInstance::new(vec![]);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(greedy_coloring(&inst, VertexOrder::Random, &mut rng).is_empty());
    }
}
