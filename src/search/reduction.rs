use rand::Rng;
use tracing::debug;

use crate::color::{Color, Coloring, ColoringInstance};
use crate::search::conflicts::{nb_colors, nb_conflicts};
use crate::search::greedy::{greedy_coloring, remap_modulo, VertexOrder};

/** renumbers the colors to 0..nb_colors-1, preserving their relative order.
Conflicts and the number of colors are unchanged.
*/
pub fn normalize(coloring:&[Color]) -> Coloring {
    let mut used:Vec<Color> = coloring.to_vec();
    used.sort_unstable();
    used.dedup();
    coloring.iter()
        .map(|c| used.binary_search(c).unwrap_or_default())
        .collect()
}

/** tries to remove color classes from a feasible coloring.
Repeatedly takes the highest color and moves each of its vertices to the smallest
lower color not used in its neighborhood. If every vertex can be moved, the class
disappears and the procedure goes on, otherwise the last coloring is kept.
The result is normalized, feasible, and never uses more colors than the input.
*/
pub fn eliminate_color_classes(inst:&dyn ColoringInstance, coloring:&[Color]) -> Coloring {
    debug_assert_eq!(nb_conflicts(inst, coloring), 0);
    let mut current = normalize(coloring);
    loop {
        let nb = nb_colors(&current);
        if nb <= 1 { break; }
        let highest = nb - 1;
        let mut candidate = current.clone();
        let mut eliminated = true;
        for v in inst.vertices().filter(|v| current[*v] == highest) {
            let free = (0..highest).find(|c| {
                inst.neighbors(v).iter().all(|u| candidate[*u] != *c)
            });
            match free {
                Some(c) => candidate[v] = c,
                None => { eliminated = false; break; }
            }
        }
        if !eliminated { break; }
        debug!(nb_colors = highest, "color class eliminated");
        current = candidate;
    }
    current
}

/** randomized greedy reduction: for j = nb_colors-1 down to 1, builds a random order greedy
coloring and folds it modulo j. Keeps it if it is feasible, stops at the first failure.
*/
pub fn greedy_remap_reduction<R:Rng>(inst:&dyn ColoringInstance, coloring:&[Color], rng:&mut R) -> Coloring {
    let mut best = coloring.to_vec();
    let initial_colors = nb_colors(coloring);
    for j in (1..initial_colors).rev() {
        let mut candidate = greedy_coloring(inst, VertexOrder::Random, rng);
        remap_modulo(&mut candidate, j);
        if nb_conflicts(inst, &candidate) == 0 {
            debug!(nb_colors = j, "greedy remap reduction succeeded");
            best = candidate;
        } else {
            break;
        }
    }
    normalize(&best)
}


#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::compact_instance::CompactInstance;

    #[test]
    fn test_normalize_round_trip() {
        let inst = CompactInstance::from_file("insts/triangle_tails.col").unwrap();
        let coloring = vec![3,8,12,3,8];
        assert_eq!(nb_conflicts(&inst, &coloring), 0);
        let normalized = normalize(&coloring);
        assert_eq!(normalized, vec![0,1,2,0,1]);
        assert_eq!(nb_conflicts(&inst, &normalized), 0);
        assert_eq!(nb_colors(&normalized), nb_colors(&coloring));
        assert_eq!(normalize(&normalized), normalized);
    }

    #[test]
    fn test_eliminate_wasteful_coloring() {
        let inst = CompactInstance::from_file("insts/triangle_tails.col").unwrap();
        let coloring = vec![0,1,2,3,4];
        let reduced = eliminate_color_classes(&inst, &coloring);
        assert_eq!(nb_conflicts(&inst, &reduced), 0);
        assert_eq!(nb_colors(&reduced), 3);
        assert_eq!(reduced, vec![0,1,2,0,0]);
    }

    #[test]
    fn test_elimination_stops_when_a_vertex_is_stuck() {
        let inst = CompactInstance::from_file("insts/triangle_tails.col").unwrap();
        // the triangle needs its three colors
        let coloring = vec![0,1,2,0,1];
        assert_eq!(eliminate_color_classes(&inst, &coloring), coloring);
    }

    #[test]
    fn test_elimination_never_increases_colors() {
        let inst = CompactInstance::from_file("insts/queen5_5.col").unwrap();
        let coloring:Vec<Color> = (0..inst.nb_vertices()).collect();
        let reduced = eliminate_color_classes(&inst, &coloring);
        assert_eq!(nb_conflicts(&inst, &reduced), 0);
        assert!(nb_colors(&reduced) <= inst.nb_vertices());
        assert!(nb_colors(&reduced) >= 5);
    }

    #[test]
    fn test_greedy_remap_reduction() {
        let inst = CompactInstance::from_file("insts/grid2x2.col").unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let reduced = greedy_remap_reduction(&inst, &[0,1,2,3], &mut rng);
        assert_eq!(nb_conflicts(&inst, &reduced), 0);
        assert!(nb_colors(&reduced) <= 4);
    }
}
