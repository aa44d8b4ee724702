use std::collections::VecDeque;
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::color::{Color, Coloring, ColoringInstance, VertexId};
use crate::config::TabuConfig;
use crate::search::conflicts::{nb_colors, ConflictTracker};
use crate::search::controller::{Attempt, ColoringEngine, RunResult, decremental_search};
use crate::search::greedy::remap_modulo;


/**
Decision of changing the color of vertex v to c
*/
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize)]
pub struct Move {
    /// vertex to recolor
    pub vertex: VertexId,
    /// color to use
    pub color: Color,
}

/** bounded FIFO of recently applied moves. Its length never exceeds its capacity. */
#[derive(Debug, Clone)]
pub struct TabuList {
    /// moves, oldest first
    moves: VecDeque<Move>,
    /// maximum number of moves kept
    capacity: usize,
}

impl TabuList {
    /// creates an empty tabu list
    pub fn new(capacity:usize) -> Self {
        Self { moves: VecDeque::with_capacity(capacity+1), capacity }
    }

    /// inserts a move, forgetting the oldest one if the list is full
    pub fn push(&mut self, mv:Move) {
        self.moves.push_back(mv);
        while self.moves.len() > self.capacity {
            self.moves.pop_front();
        }
    }

    /// true iff the move is tabu
    pub fn contains(&self, mv:&Move) -> bool { self.moves.contains(mv) }

    /// number of moves in the list
    pub fn len(&self) -> usize { self.moves.len() }

    /// true iff no move is tabu
    pub fn is_empty(&self) -> bool { self.moves.is_empty() }

    /// maximum number of moves kept
    pub fn capacity(&self) -> usize { self.capacity }
}


/** state of a tabu search */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TabuStatus {
    /// the search goes on
    Searching,
    /// a conflict-free coloring was found
    Improved,
    /// iteration budget exhausted
    Stalled,
    /// no admissible move
    Exhausted,
}

/** result of one call to [`TabuSearch::step`] */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// a move was applied
    Moved {
        /// applied move
        mv: Move,
        /// number of conflicts after the move
        nb_conflicts: usize,
        /// the move was tabu and accepted by the aspiration criterion
        was_tabu: bool,
    },
    /// the search was already in a terminal state, or just reached one without moving
    Finished(TabuStatus),
}

/** statistics of a tabu search */
#[derive(Debug, Clone, Default, Serialize)]
pub struct TabuStatistics {
    /// number of moves applied
    pub nb_iter: usize,
    /// number of tabu moves accepted by the aspiration criterion
    pub nb_aspiration_moves: usize,
    /// best_history[i]: best number of conflicts after i moves
    pub best_history: Vec<usize>,
}

/** result of a tabu search for a given number of colors */
#[derive(Debug, Clone, Serialize)]
pub struct TabuResult {
    /// best coloring seen
    pub coloring: Coloring,
    /// conflicts of the best coloring
    pub nb_conflicts: usize,
    /// distinct colors of the best coloring
    pub nb_colors: usize,
    /// terminal state
    pub status: TabuStatus,
    /// search statistics
    pub statistics: TabuStatistics,
}


/** (see https://doi.org/10.1016/j.cor.2005.07.028)
Implements a local search procedure for the graph coloring with k colors (TabuCol).
Starts with an initial coloring (remapped modulo k if it uses larger colors) and
makes changes in the coloring to minimize the number of conflicts.

each iteration:
 1. every vertex involved in a conflicting edge is a move candidate (the other vertices
    are never recolored: this restriction is an approximation of the full neighborhood)
 2. every other color of such a vertex is evaluated incrementally
 3. the best move that is not tabu, or that improves the best number of conflicts ever
    seen (aspiration), is applied and becomes tabu.
    Ties are broken by the first move seen (increasing vertex, then increasing color).
*/
#[derive(Debug)]
pub struct TabuSearch {
    /// reference instance
    inst: Rc<dyn ColoringInstance>,
    /// current coloring and incremental evaluation
    tracker: ConflictTracker,
    /// recently applied moves
    tabu: TabuList,
    /// best coloring seen
    best: Coloring,
    /// conflicts of the best coloring
    best_conflicts: usize,
    /// iteration budget
    max_iter: usize,
    /// state of the search
    status: TabuStatus,
    /// search statistics
    statistics: TabuStatistics,
}

impl TabuSearch {
    /** creates a tabu search with k colors starting from a coloring.

    # Panics
    if k is 0.
    */
    pub fn new(inst:Rc<dyn ColoringInstance>, k:usize, start:&[Color], config:&TabuConfig) -> Self {
        assert!(k > 0, "TabuSearch: the number of colors must be positive");
        let mut colors = start.to_vec();
        if colors.iter().any(|c| *c >= k) {
            remap_modulo(&mut colors, k);
        }
        let tracker = ConflictTracker::new(inst.as_ref(), &colors, k);
        let best_conflicts = tracker.nb_conflicts();
        let status = if best_conflicts == 0 {
            TabuStatus::Improved
        } else if config.max_iter == 0 {
            TabuStatus::Stalled
        } else {
            TabuStatus::Searching
        };
        Self {
            inst,
            tracker,
            tabu: TabuList::new(config.tabu_size),
            best: colors,
            best_conflicts,
            max_iter: config.max_iter,
            status,
            statistics: TabuStatistics { best_history: vec![best_conflicts], ..Default::default() },
        }
    }

    /// state of the search
    pub fn status(&self) -> TabuStatus { self.status }

    /// current coloring
    pub fn current(&self) -> &[Color] { self.tracker.colors() }

    /// number of conflicts of the current coloring
    pub fn nb_conflicts(&self) -> usize { self.tracker.nb_conflicts() }

    /// best number of conflicts seen so far
    pub fn best_conflicts(&self) -> usize { self.best_conflicts }

    /// tabu list
    pub fn tabu_list(&self) -> &TabuList { &self.tabu }

    /// search statistics
    pub fn statistics(&self) -> &TabuStatistics { &self.statistics }

    /// aspiration criterion: a tabu move is admissible iff it beats the best number of conflicts
    pub fn is_admissible(&self, mv:&Move, nb_conflicts_after:usize) -> bool {
        !self.tabu.contains(mv) || nb_conflicts_after < self.best_conflicts
    }

    /// finds the best admissible move (move, conflicts after the move, is tabu)
    fn best_move(&self) -> Option<(Move, usize, bool)> {
        let mut res:Option<(Move, usize, bool)> = None;
        for v in self.tracker.conflicting_vertices() {
            let current_color = self.tracker.color(v);
            for c in (0..self.tracker.nb_allowed_colors()).filter(|c| *c != current_color) {
                let nb_conflicts_after = self.tracker.conflicts_after_move(v, c);
                if let Some((_, best_value, _)) = res {
                    if nb_conflicts_after >= best_value { continue; } // first seen wins ties
                }
                let mv = Move { vertex: v, color: c };
                if self.is_admissible(&mv, nb_conflicts_after) {
                    res = Some((mv, nb_conflicts_after, self.tabu.contains(&mv)));
                }
            }
        }
        res
    }

    /** performs one iteration of the search */
    pub fn step(&mut self) -> StepOutcome {
        if self.status != TabuStatus::Searching {
            return StepOutcome::Finished(self.status);
        }
        let (mv, nb_conflicts, was_tabu) = match self.best_move() {
            None => {
                warn!(
                    nb_conflicts = self.tracker.nb_conflicts(),
                    k = self.tracker.nb_allowed_colors(),
                    "tabu search: no admissible move"
                );
                self.status = TabuStatus::Exhausted;
                return StepOutcome::Finished(self.status);
            },
            Some(m) => m,
        };
        self.tracker.change_color(self.inst.as_ref(), mv.vertex, mv.color);
        debug_assert_eq!(self.tracker.nb_conflicts(), nb_conflicts);
        self.tabu.push(mv);
        self.statistics.nb_iter += 1;
        if was_tabu { self.statistics.nb_aspiration_moves += 1; }
        if nb_conflicts < self.best_conflicts {
            self.best_conflicts = nb_conflicts;
            self.best = self.tracker.colors().to_vec();
            debug!(iter = self.statistics.nb_iter, nb_conflicts, "tabu search: new best");
        }
        self.statistics.best_history.push(self.best_conflicts);
        if self.best_conflicts == 0 {
            self.status = TabuStatus::Improved;
        } else if self.statistics.nb_iter >= self.max_iter {
            self.status = TabuStatus::Stalled;
        }
        StepOutcome::Moved { mv, nb_conflicts, was_tabu }
    }

    /** iterates until a terminal state is reached and returns the best coloring seen */
    pub fn run(mut self) -> TabuResult {
        while self.status == TabuStatus::Searching {
            self.step();
        }
        TabuResult {
            nb_colors: nb_colors(&self.best),
            coloring: self.best,
            nb_conflicts: self.best_conflicts,
            status: self.status,
            statistics: self.statistics,
        }
    }
}


/** tabu search as an engine of the run controller */
#[derive(Debug, Clone, Default)]
pub struct TabuEngine {
    /// parameters used for every attempt
    config: TabuConfig,
}

impl TabuEngine {
    /// creates the engine
    pub fn new(config:TabuConfig) -> Self { Self { config } }
}

impl ColoringEngine for TabuEngine {
    fn name(&self) -> &str { "tabucol" }

    fn attempt(&mut self, inst:Rc<dyn ColoringInstance>, k:usize, seed:&[Color]) -> Attempt {
        let res = TabuSearch::new(inst, k, seed, &self.config).run();
        debug!(
            k, status = ?res.status, iterations = res.statistics.nb_iter,
            aspiration_moves = res.statistics.nb_aspiration_moves,
            "tabu search finished"
        );
        Attempt {
            k,
            coloring: res.coloring,
            nb_conflicts: res.nb_conflicts,
            nb_colors: res.nb_colors,
        }
    }
}

/**
Runs the decremental tabucol: starting from a coloring, lowers the number of colors by one
after each conflict-free result (restarting from the previous success remapped to the new
number of colors) until an attempt fails. The last success is the best coloring.
*/
pub fn tabucol(inst:Rc<dyn ColoringInstance>, start:&[Color], config:&TabuConfig) -> RunResult {
    let mut engine = TabuEngine::new(config.clone());
    decremental_search(inst, &mut engine, start, None)
}


#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::compact_instance::CompactInstance;
    use crate::search::conflicts::nb_conflicts;
    use crate::search::greedy::{greedy_coloring, VertexOrder};

    fn load(filename:&str) -> Rc<dyn ColoringInstance> {
        Rc::new(CompactInstance::from_file(filename).unwrap())
    }

    fn config(max_iter:usize, tabu_size:usize) -> TabuConfig {
        TabuConfig { max_iter, tabu_size }
    }

    #[test]
    fn test_tabu_list_is_bounded_fifo() {
        let mut tabu = TabuList::new(2);
        tabu.push(Move { vertex:0, color:1 });
        tabu.push(Move { vertex:1, color:1 });
        tabu.push(Move { vertex:2, color:0 });
        assert_eq!(tabu.len(), 2);
        assert!(!tabu.contains(&Move { vertex:0, color:1 }));
        assert!(tabu.contains(&Move { vertex:1, color:1 }));
        assert!(tabu.contains(&Move { vertex:2, color:0 }));
        let mut empty = TabuList::new(0);
        empty.push(Move { vertex:0, color:0 });
        assert!(empty.is_empty());
    }

    #[test]
    fn test_triangle_with_tails_three_colors() {
        let inst = load("insts/triangle_tails.col");
        let res = TabuSearch::new(inst.clone(), 3, &[0,0,0,0,0], &config(50, 5)).run();
        assert_eq!(res.status, TabuStatus::Improved);
        assert_eq!(res.nb_conflicts, 0);
        assert_eq!(nb_conflicts(inst.as_ref(), &res.coloring), 0);
        assert_eq!(res.coloring, vec![0,1,2,0,0]);
        assert_eq!(res.statistics.nb_iter, 2);
    }

    #[test]
    fn test_triangle_with_tails_two_colors_fails() {
        let inst = load("insts/triangle_tails.col");
        for max_iter in [1, 10, 1000] {
            let res = TabuSearch::new(inst.clone(), 2, &[0,1,2,0,0], &config(max_iter, 3)).run();
            assert!(res.nb_conflicts > 0);
            assert_ne!(res.status, TabuStatus::Improved);
            assert_eq!(nb_conflicts(inst.as_ref(), &res.coloring), res.nb_conflicts);
        }
    }

    #[test]
    fn test_start_is_remapped() {
        let inst = load("insts/triangle_tails.col");
        let search = TabuSearch::new(inst, 2, &[0,1,2,0,0], &config(10, 3));
        assert_eq!(search.current(), &[0,1,0,0,0]);
        assert_eq!(search.nb_conflicts(), 2);
    }

    #[test]
    fn test_feasible_start_is_improved() {
        let inst = load("insts/triangle_tails.col");
        let mut search = TabuSearch::new(inst, 3, &[0,1,2,0,0], &config(10, 3));
        assert_eq!(search.status(), TabuStatus::Improved);
        assert_eq!(search.step(), StepOutcome::Finished(TabuStatus::Improved));
    }

    #[test]
    fn test_single_color_is_exhausted() {
        let inst = load("insts/triangle_tails.col");
        let res = TabuSearch::new(inst, 1, &[0,0,0,0,0], &config(10, 3)).run();
        assert_eq!(res.status, TabuStatus::Exhausted);
        assert_eq!(res.nb_conflicts, 5);
    }

    #[test]
    fn test_invariants_during_search() {
        let inst = load("insts/queen5_5.col");
        let mut rng = StdRng::seed_from_u64(1);
        let start = greedy_coloring(inst.as_ref(), VertexOrder::Random, &mut rng);
        let capacity = 7;
        let mut search = TabuSearch::new(inst.clone(), 5, &start, &config(2000, capacity));
        let mut previous_best = search.best_conflicts();
        while search.status() == TabuStatus::Searching {
            let best_before = search.best_conflicts();
            match search.step() {
                StepOutcome::Moved { mv, nb_conflicts, was_tabu } => {
                    // aspiration: tabu moves are taken only when they beat the best
                    if was_tabu { assert!(nb_conflicts < best_before); }
                    assert_eq!(search.current()[mv.vertex], mv.color);
                    assert_eq!(nb_conflicts, search.nb_conflicts());
                },
                StepOutcome::Finished(_) => {},
            }
            assert!(search.tabu_list().len() <= capacity);
            assert!(search.best_conflicts() <= previous_best);
            previous_best = search.best_conflicts();
        }
        let history = &search.statistics().best_history;
        assert!(history.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_aspiration_criterion() {
        let inst = load("insts/triangle_tails.col");
        let mut search = TabuSearch::new(inst, 3, &[0,0,0,0,0], &config(50, 5));
        // first move: vertex 1 -> color 1 (3 conflicts removed)
        let first = search.step();
        assert_eq!(first, StepOutcome::Moved {
            mv: Move { vertex:1, color:1 }, nb_conflicts:2, was_tabu:false
        });
        let mv = Move { vertex:1, color:1 };
        assert!(search.tabu_list().contains(&mv));
        assert_eq!(search.best_conflicts(), 2);
        // tabu moves are admissible iff strictly better than the best
        assert!(search.is_admissible(&mv, 1));
        assert!(!search.is_admissible(&mv, 2));
        assert!(search.is_admissible(&Move { vertex:2, color:2 }, 2));
    }

    #[test]
    fn test_tabucol_decremental() {
        let inst = load("insts/myciel3.col");
        let start = greedy_coloring(inst.as_ref(), VertexOrder::Natural, &mut StdRng::seed_from_u64(0));
        let res = tabucol(inst.clone(), &start, &config(500, 5));
        let (best, nb_colors) = res.best.clone().unwrap();
        assert_eq!(nb_conflicts(inst.as_ref(), &best), 0);
        assert!(nb_colors >= 4); // chromatic number of myciel3
        assert!(nb_colors <= crate::search::conflicts::nb_colors(&start));
        let ks = res.successful_ks();
        assert!(ks.windows(2).all(|w| w[1] < w[0]));
    }
}
