use std::rc::Rc;

use bit_set::BitSet;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::color::{Color, Coloring, ColoringInstance, VertexId};
use crate::config::{GeneticConfig, Selection};
use crate::error::ConfigError;
use crate::search::conflicts::{
    conflict_weight, conflicting_vertices, evaluate, evaluate_from_edges, is_vertex_conflicting,
    nb_colors, Evaluation, Fitness,
};
use crate::search::controller::{Attempt, ColoringEngine};
use crate::search::greedy::{greedy_coloring, remap_modulo, VertexOrder};
use crate::search::reduction::{eliminate_color_classes, greedy_remap_reduction, normalize};

/** member of the population: a coloring and its evaluation */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Individual {
    /// colors in 0..k-1
    pub coloring: Coloring,
    /// conflicts, colors and fitness
    pub evaluation: Evaluation,
}

impl Individual {
    /// fitness of the individual (lower is better)
    pub fn fitness(&self) -> Fitness { self.evaluation.fitness }
}

/// state of a genetic search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GeneticStatus {
    /// still evolving
    Evolving,
    /// a conflict-free individual was found
    Solved,
    /// too many generations without improvement
    Stagnated,
    /// generation budget exhausted
    GenerationLimit,
}

/// counters of a genetic search
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneticStatistics {
    /// generations performed
    pub nb_generations: usize,
    /// individuals improved by the local repair
    pub nb_repaired: usize,
    /// individuals replaced by random ones
    pub nb_reinjected: usize,
    /// best fitness after each generation (the first value is the initial population)
    pub best_history: Vec<Fitness>,
    /// mutation rate at the end of the search
    pub final_mutation_rate: f64,
}

/// result of a genetic search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneticResult {
    /// best coloring (postprocessed if conflict-free)
    pub coloring: Coloring,
    /// conflicts of the coloring
    pub nb_conflicts: usize,
    /// distinct colors of the coloring
    pub nb_colors: usize,
    /// final state
    pub status: GeneticStatus,
    /// counters
    pub statistics: GeneticStatistics,
}


/// uniform coloring over 0..k-1
pub fn random_coloring<R:Rng>(n:usize, k:usize, rng:&mut R) -> Coloring {
    (0..n).map(|_| rng.gen_range(0..k)).collect()
}

/// evaluates colorings, possibly with the rayon thread pool
pub fn evaluate_all(
    edges:&[(VertexId,VertexId)],
    colorings:&[Coloring],
    weight:u64,
    parallel:bool,
) -> Vec<Evaluation> {
    if parallel {
        colorings.par_iter().map(|c| evaluate_from_edges(edges, c, weight)).collect()
    } else {
        colorings.iter().map(|c| evaluate_from_edges(edges, c, weight)).collect()
    }
}

/// best of `size` individuals drawn with replacement
pub fn tournament_selection<R:Rng>(population:&[Individual], size:usize, rng:&mut R) -> usize {
    let mut res = rng.gen_range(0..population.len());
    for _ in 1..size {
        let i = rng.gen_range(0..population.len());
        if population[i].fitness() < population[res].fitness() { res = i; }
    }
    res
}

/// draws an individual with a probability proportional to max_fitness - fitness + 1
pub fn roulette_selection<R:Rng>(population:&[Individual], rng:&mut R) -> usize {
    let max_fitness = population.iter().map(|i| i.fitness()).max().unwrap_or(0);
    let weights:Vec<u64> = population.iter().map(|i| max_fitness - i.fitness() + 1).collect();
    let total:u64 = weights.iter().sum();
    let mut r = rng.gen_range(0..total);
    for (i,w) in weights.iter().enumerate() {
        if r < *w { return i; }
        r -= w;
    }
    population.len() - 1
}

/// uniform among the `pool` first individuals (the population is sorted)
pub fn truncation_selection<R:Rng>(population:&[Individual], pool:usize, rng:&mut R) -> usize {
    rng.gen_range(0..pool.clamp(1, population.len()))
}

/// selects the index of a parent in a non-empty population
pub fn select_parent<R:Rng>(population:&[Individual], selection:Selection, rng:&mut R) -> usize {
    match selection {
        Selection::Tournament { size } => tournament_selection(population, size, rng),
        Selection::Roulette => roulette_selection(population, rng),
        Selection::Truncation { pool } => truncation_selection(population, pool, rng),
    }
}

/** conflict-aware uniform crossover.
For each vertex, if exactly one parent has no conflict on it, the child takes this parent's
color, otherwise the color of a parent chosen uniformly. Colors are taken modulo k.
*/
pub fn crossover<R:Rng>(
    inst:&dyn ColoringInstance, parent1:&[Color], parent2:&[Color], k:usize, rng:&mut R
) -> Coloring {
    inst.vertices().map(|v| {
        let ok1 = !is_vertex_conflicting(inst, parent1, v);
        let ok2 = !is_vertex_conflicting(inst, parent2, v);
        let c = match (ok1, ok2) {
            (true, false) => parent1[v],
            (false, true) => parent2[v],
            _ => if rng.gen_bool(0.5) { parent1[v] } else { parent2[v] },
        };
        c % k
    }).collect()
}

/** recolors a conflicting vertex (any vertex if there is none) with a color unused by its
neighbors, or a random color if every color is used.
*/
pub fn mutate<R:Rng>(inst:&dyn ColoringInstance, coloring:&mut [Color], k:usize, rng:&mut R) {
    if coloring.is_empty() { return; }
    let conflicting = conflicting_vertices(inst, coloring);
    let v = if conflicting.is_empty() {
        rng.gen_range(0..coloring.len())
    } else {
        conflicting[rng.gen_range(0..conflicting.len())]
    };
    let neighbor_colors:BitSet = inst.neighbors(v).iter().map(|u| coloring[*u]).collect();
    let free:Vec<Color> = (0..k).filter(|c| !neighbor_colors.contains(*c)).collect();
    coloring[v] = if free.is_empty() { rng.gen_range(0..k) } else { free[rng.gen_range(0..free.len())] };
}

/** greedy repair pass: in increasing id order, each vertex takes the smallest color below k
unused by its already processed neighbors (it keeps its color if there is none).
*/
pub fn local_repair(inst:&dyn ColoringInstance, coloring:&[Color], k:usize) -> Coloring {
    let mut res = coloring.to_vec();
    for v in inst.vertices() {
        let used:BitSet = inst.neighbors(v).iter()
            .filter(|u| **u < v)
            .map(|u| res[*u])
            .collect();
        if let Some(c) = (0..k).find(|c| !used.contains(*c)) {
            res[v] = c;
        }
    }
    res
}


/**
Genetic algorithm searching a coloring with k colors.

The population is kept sorted by increasing fitness. Each generation copies the elite,
produces offspring by selection, crossover and mutation, repairs the first individuals,
and periodically replaces the worst ones by random colorings.
*/
#[derive(Debug)]
pub struct GeneticSearch {
    inst: Rc<dyn ColoringInstance>,
    k: usize,
    config: GeneticConfig,
    weight: u64,
    rng: StdRng,
    /// sorted by increasing fitness
    population: Vec<Individual>,
    best: Individual,
    generation: usize,
    mutation_rate: f64,
    /// generations since the last improvement of the best fitness
    nb_stagnation: usize,
    status: GeneticStatus,
    statistics: GeneticStatistics,
}

impl GeneticSearch {
    /** builds the initial population. The seed coloring (remapped modulo k) is the first
    individual, a `heuristic_fraction` of the population comes from random order greedy
    colorings remapped modulo k, and the rest is random.

    # Panics
    if k is 0. The configuration is expected to be valid ([`GeneticConfig::validate`]):
    rates outside of [0,1] make the generations panic.
    */
    pub fn new(
        inst:Rc<dyn ColoringInstance>, k:usize, seed:&[Color], config:&GeneticConfig, mut rng:StdRng
    ) -> Self {
        assert!(k > 0, "at least one color is needed");
        let n = inst.nb_vertices();
        let weight = conflict_weight(inst.as_ref(), config.conflict_weight);
        let population_size = config.population_size.max(1);
        let nb_heuristic = ((config.heuristic_fraction * population_size as f64).round() as usize)
            .clamp(1, population_size);
        let mut colorings:Vec<Coloring> = Vec::with_capacity(population_size);
        let mut first = seed.to_vec();
        remap_modulo(&mut first, k);
        colorings.push(first);
        while colorings.len() < nb_heuristic {
            let mut c = greedy_coloring(inst.as_ref(), VertexOrder::Random, &mut rng);
            remap_modulo(&mut c, k);
            colorings.push(c);
        }
        while colorings.len() < population_size {
            colorings.push(random_coloring(n, k, &mut rng));
        }
        let evaluations = evaluate_all(inst.edges(), &colorings, weight, config.parallel_evaluation);
        let mut population:Vec<Individual> = colorings.into_iter().zip(evaluations)
            .map(|(coloring, evaluation)| Individual { coloring, evaluation })
            .collect();
        population.sort_by_key(|i| i.fitness());
        let best = population[0].clone();
        let mut res = Self {
            inst, k,
            config: config.clone(),
            weight,
            rng,
            best,
            population,
            generation: 0,
            mutation_rate: config.mutation_rate,
            nb_stagnation: 0,
            status: GeneticStatus::Evolving,
            statistics: GeneticStatistics::default(),
        };
        res.statistics.best_history.push(res.best.fitness());
        res.update_status();
        res
    }

    /// current state
    pub fn status(&self) -> GeneticStatus { self.status }

    /// population, sorted by increasing fitness
    pub fn population(&self) -> &[Individual] { &self.population }

    /// best individual found so far
    pub fn best(&self) -> &Individual { &self.best }

    /// number of generations performed
    pub fn generation(&self) -> usize { self.generation }

    /// current mutation rate
    pub fn mutation_rate(&self) -> f64 { self.mutation_rate }

    /// counters
    pub fn statistics(&self) -> &GeneticStatistics { &self.statistics }

    fn update_status(&mut self) {
        self.status = if self.best.evaluation.is_feasible() {
            GeneticStatus::Solved
        } else if self.nb_stagnation >= self.config.max_stagnation {
            GeneticStatus::Stagnated
        } else if self.generation >= self.config.max_generations {
            GeneticStatus::GenerationLimit
        } else {
            GeneticStatus::Evolving
        };
    }

    fn individual(&self, coloring:Coloring) -> Individual {
        let evaluation = evaluate(self.inst.as_ref(), &coloring, self.weight);
        Individual { coloring, evaluation }
    }

    /// produces the offspring of the current population
    fn offspring(&mut self, nb:usize) -> Vec<Coloring> {
        let inst = self.inst.clone();
        let mut res = Vec::with_capacity(nb);
        while res.len() < nb {
            let p1 = select_parent(&self.population, self.config.selection, &mut self.rng);
            let mut child = if self.rng.gen_bool(self.config.crossover_rate) {
                let p2 = select_parent(&self.population, self.config.selection, &mut self.rng);
                crossover(
                    inst.as_ref(),
                    &self.population[p1].coloring,
                    &self.population[p2].coloring,
                    self.k,
                    &mut self.rng,
                )
            } else {
                self.population[p1].coloring.clone()
            };
            if self.rng.gen_bool(self.mutation_rate) {
                mutate(inst.as_ref(), &mut child, self.k, &mut self.rng);
            }
            res.push(child);
        }
        res
    }

    /// performs a generation (does nothing once the search is over)
    pub fn step(&mut self) -> GeneticStatus {
        if self.status != GeneticStatus::Evolving { return self.status; }
        self.generation += 1;
        let population_size = self.population.len();
        let nb_elites = self.config.elitism.min(population_size);
        // elites and offspring
        let children = self.offspring(population_size - nb_elites);
        let evaluations = evaluate_all(
            self.inst.edges(), &children, self.weight, self.config.parallel_evaluation
        );
        let mut next:Vec<Individual> = self.population[..nb_elites].to_vec();
        next.extend(children.into_iter().zip(evaluations)
            .map(|(coloring, evaluation)| Individual { coloring, evaluation }));
        // local repair, never accepted if worse
        let nb_repair = (self.config.local_repair_fraction * population_size as f64).round() as usize;
        for i in 0..nb_repair.min(population_size) {
            let repaired = self.individual(local_repair(self.inst.as_ref(), &next[i].coloring, self.k));
            if repaired.fitness() < next[i].fitness() {
                self.statistics.nb_repaired += 1;
            }
            if repaired.fitness() <= next[i].fitness() {
                next[i] = repaired;
            }
        }
        next.sort_by_key(|i| i.fitness());
        // diversity reinjection (the elite slice is kept)
        let interval = self.config.reinjection_interval;
        if interval > 0 && self.generation % interval == 0 {
            let nb = ((self.config.reinjection_fraction * population_size as f64).round() as usize)
                .min(population_size - nb_elites);
            for i in population_size-nb..population_size {
                let coloring = random_coloring(self.inst.nb_vertices(), self.k, &mut self.rng);
                next[i] = self.individual(coloring);
            }
            self.statistics.nb_reinjected += nb;
            next.sort_by_key(|i| i.fitness());
        }
        self.population = next;
        // best individual and adaptive mutation
        if self.population[0].fitness() < self.best.fitness() {
            self.best = self.population[0].clone();
            self.nb_stagnation = 0;
        } else {
            self.nb_stagnation += 1;
            let every = self.config.mutation_increase_every;
            if every > 0 && self.nb_stagnation % every == 0 {
                self.mutation_rate = (self.mutation_rate + self.config.mutation_increase_step).min(1.);
                debug!(generation = self.generation, mutation_rate = self.mutation_rate, "mutation rate increased");
            }
        }
        self.statistics.nb_generations = self.generation;
        self.statistics.best_history.push(self.best.fitness());
        debug!(
            generation = self.generation,
            best_fitness = self.best.fitness(),
            nb_conflicts = self.best.evaluation.nb_conflicts,
            "generation done"
        );
        self.update_status();
        self.status
    }

    /** evolves the population until a stopping criterion is met. A conflict-free result is
    normalized and its color classes are reduced as configured.
    */
    pub fn run(mut self) -> GeneticResult {
        while self.step() == GeneticStatus::Evolving {}
        self.statistics.final_mutation_rate = self.mutation_rate;
        let mut coloring = self.best.coloring;
        if self.best.evaluation.is_feasible() {
            coloring = normalize(&coloring);
            if self.config.aggressive_reduction {
                coloring = eliminate_color_classes(self.inst.as_ref(), &coloring);
            }
            if self.config.greedy_reduction {
                let reduced = greedy_remap_reduction(self.inst.as_ref(), &coloring, &mut self.rng);
                if nb_colors(&reduced) < nb_colors(&coloring) { coloring = reduced; }
            }
        }
        GeneticResult {
            nb_conflicts: self.best.evaluation.nb_conflicts,
            nb_colors: nb_colors(&coloring),
            coloring,
            status: self.status,
            statistics: self.statistics,
        }
    }
}


/** genetic algorithm as an engine of the run controller */
#[derive(Debug, Clone)]
pub struct GeneticEngine {
    config: GeneticConfig,
    /// seeds every attempt
    rng: StdRng,
}

impl GeneticEngine {
    /// creates the engine (random seed if none is given), fails if the configuration is invalid
    pub fn new(config:GeneticConfig, seed:Option<u64>) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match seed {
            None => StdRng::from_entropy(),
            Some(s) => StdRng::seed_from_u64(s),
        };
        Ok(Self { config, rng })
    }
}

impl ColoringEngine for GeneticEngine {
    fn name(&self) -> &str { "genetic" }

    fn attempt(&mut self, inst:Rc<dyn ColoringInstance>, k:usize, seed:&[Color]) -> Attempt {
        let rng = StdRng::seed_from_u64(self.rng.gen());
        let res = GeneticSearch::new(inst, k, seed, &self.config, rng).run();
        debug!(
            k, status = ?res.status, generations = res.statistics.nb_generations,
            mutation_rate = res.statistics.final_mutation_rate,
            "genetic search finished"
        );
        Attempt {
            k,
            coloring: res.coloring,
            nb_conflicts: res.nb_conflicts,
            nb_colors: res.nb_colors,
        }
    }
}
