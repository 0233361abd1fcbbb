//! Anytime branch-and-bound placement search.
//!
//! Walks the ranked candidates in order. At each candidate the skip branch
//! is explored first, then every open action in benefit order. One working
//! board is mutated and restored in place; nothing is copied per branch.
//!
//! Every leaf that beats the best known score (the input board's score at
//! the start) is emitted as a `NewSolution`. Progress is reported by
//! splitting `[0, 1]` evenly among the branches of every node shallower
//! than the configured progress depth.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::actions::{ActionError, Catalog, Undo};
use crate::board::{Board, Building, BuildingSet, CityId};
use crate::eval::{evaluate, Score};

use super::candidates::{rank_candidates, Candidate, CandidateAction, CityIndex};
use super::config::{SearchConfig, SearchTuning};
use super::events::{CancelToken, EventSink, HistoryEntry, SearchEvent, Solution, TileCoords};

/// Errors that stop a search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptimizeError {
    #[error("overall budget must not be negative, got {0}")]
    NegativeBudget(i64),

    #[error("action catalog is empty")]
    EmptyCatalog,

    #[error("no participating cities")]
    NoCities,

    #[error("city {0} owns no tiles on this board")]
    UnknownCity(CityId),

    #[error(transparent)]
    Action(#[from] ActionError),
}

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// Every branch was explored.
    Completed,
    /// The cancel token was observed before the search finished.
    Cancelled,
}

/// Result of one search run.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Best board found, or a copy of the input if nothing improved on it.
    pub board: Board,
    pub score: Score,
    /// The last emitted solution, if any.
    pub best: Option<Solution>,
    pub status: SearchStatus,
    pub iterations: u64,
}

impl SearchOutcome {
    pub fn is_cancelled(&self) -> bool {
        self.status == SearchStatus::Cancelled
    }
}

/// One applied action on the current path.
#[derive(Debug, Clone, Copy)]
struct Step {
    index: usize,
    city: usize,
    action: CandidateAction,
}

struct Search<'a, S: EventSink + ?Sized> {
    board: Board,
    candidates: &'a [Candidate],
    /// Candidate position of each tile, if it is one.
    position: Vec<Option<usize>>,
    cities: &'a CityIndex,
    /// Advanced kinds standing or placed in each city.
    used: Vec<BuildingSet>,
    path: Vec<Step>,
    best_score: Score,
    best: Option<Solution>,
    iterations: u64,
    yield_interval: u64,
    progress_depth: usize,
    progress: f64,
    cancelled: bool,
    cancel: &'a CancelToken,
    sink: &'a mut S,
    /// Fails the apply made at this path length.
    #[cfg(test)]
    fail_at_depth: Option<usize>,
}

impl<S: EventSink + ?Sized> Search<'_, S> {
    fn stopped(&mut self) -> bool {
        if self.cancel.is_cancelled() {
            self.cancelled = true;
        }
        self.cancelled
    }

    fn descend(
        &mut self,
        pos: usize,
        remaining: u64,
        lo: f64,
        width: f64,
    ) -> Result<(), OptimizeError> {
        if self.stopped() {
            return Ok(());
        }
        self.iterations += 1;
        if self.iterations % self.yield_interval == 0 {
            self.sink.checkpoint();
            if self.stopped() {
                return Ok(());
            }
        }

        let candidates = self.candidates;
        let Some(candidate) = candidates.get(pos) else {
            self.visit_leaf();
            return Ok(());
        };

        let tracked = pos < self.progress_depth;
        let branches = if tracked {
            1 + candidate
                .actions
                .iter()
                .filter(|a| self.is_open(candidate, a, pos, remaining))
                .count()
        } else {
            1
        };
        let step = width / branches as f64;

        self.descend(pos + 1, remaining, lo, step)?;
        let mut done = 1;
        if tracked {
            self.report_progress(lo + step);
        }

        for action in &candidate.actions {
            if self.stopped() {
                return Ok(());
            }
            if !self.is_open(candidate, action, pos, remaining) {
                continue;
            }

            let undo = self.apply(action, candidate.index)?;
            let marked = action.places.filter(|b| b.is_advanced());
            if let Some(kind) = marked {
                self.used[candidate.city].insert(kind);
            }
            self.path.push(Step {
                index: candidate.index,
                city: candidate.city,
                action: *action,
            });

            let result = self.descend(
                pos + 1,
                remaining - u64::from(action.cost),
                lo + done as f64 * step,
                step,
            );

            self.path.pop();
            if let Some(kind) = marked {
                self.used[candidate.city].remove(kind);
            }
            self.board.undo(undo);
            result?;

            done += 1;
            if tracked {
                self.report_progress(lo + done as f64 * step);
            }
        }
        Ok(())
    }

    fn apply(&mut self, action: &CandidateAction, index: usize) -> Result<Undo, ActionError> {
        #[cfg(test)]
        if self.fail_at_depth == Some(self.path.len()) {
            let tile = self.board.tile_at(index);
            return Err(ActionError::Infeasible {
                action: action.id,
                x: tile.x,
                y: tile.y,
            });
        }
        self.board.apply(action.id, index)
    }

    /// Returns true if `action` may be tried at this node. Capabilities
    /// were already filtered when the candidates were ranked.
    fn is_open(
        &self,
        candidate: &Candidate,
        action: &CandidateAction,
        pos: usize,
        remaining: u64,
    ) -> bool {
        if u64::from(action.cost) > remaining {
            return false;
        }
        if let Some(kind) = action.places {
            if kind.is_advanced() && self.used[candidate.city].contains(kind) {
                return false;
            }
        }
        if !action.id.is_feasible(&self.board, candidate.index) {
            return false;
        }
        action
            .places
            .map_or(true, |kind| self.can_contribute(kind, candidate.index, pos))
    }

    /// Cheap pruning: a building whose partners can never appear next to it
    /// scores nothing. Later candidates are still undecided and count if
    /// some action there could place a partner.
    fn can_contribute(&self, kind: Building, index: usize, pos: usize) -> bool {
        let partners = kind.partners();
        if partners.is_empty() {
            return true;
        }
        self.board.neighbors(index).any(|n| {
            self.board
                .tile_at(n)
                .building
                .is_some_and(|b| partners.contains(b))
                || self.position[n]
                    .is_some_and(|p| p > pos && self.candidates[p].hosts.intersects(partners))
        })
    }

    fn visit_leaf(&mut self) {
        let score = evaluate(&self.board);
        if score <= self.best_score {
            return;
        }
        self.best_score = score;
        let solution = Solution {
            score: score.primary,
            secondary_score: score.secondary,
            iteration: self.iterations,
            board: self.board.clone(),
            history: self.history(),
        };
        trace!(
            score = score.primary,
            secondary = score.secondary,
            iteration = self.iterations,
            "new best"
        );
        self.sink.emit(SearchEvent::NewSolution(solution.clone()));
        self.best = Some(solution);
    }

    fn history(&self) -> Vec<HistoryEntry> {
        self.path
            .iter()
            .map(|step| {
                let tile = self.board.tile_at(step.index);
                HistoryEntry {
                    action_id: step.action.id,
                    tile_coords: TileCoords { x: tile.x, y: tile.y },
                    city_id: Some(self.cities.ids()[step.city].clone()),
                    cost: step.action.cost,
                }
            })
            .collect()
    }

    fn report_progress(&mut self, value: f64) {
        let value = value.min(1.0);
        if value > self.progress {
            self.progress = value;
            self.sink.emit(SearchEvent::Progress(value));
        }
    }
}

fn validate(
    board: &Board,
    config: &SearchConfig,
    catalog: &Catalog,
) -> Result<u64, OptimizeError> {
    if config.overall_budget < 0 {
        return Err(OptimizeError::NegativeBudget(config.overall_budget));
    }
    if catalog.is_empty() {
        return Err(OptimizeError::EmptyCatalog);
    }
    if config.participating_cities.is_empty() {
        return Err(OptimizeError::NoCities);
    }
    let present = board.city_ids();
    if let Some(missing) = config
        .participating_cities
        .iter()
        .find(|c| !present.contains(*c))
    {
        return Err(OptimizeError::UnknownCity(missing.clone()));
    }
    Ok(config.overall_budget as u64)
}

/// Ranked candidates and city layout for one run.
struct Plan {
    budget: u64,
    tuning: SearchTuning,
    cities: CityIndex,
    candidates: Vec<Candidate>,
}

impl Plan {
    fn new(board: &Board, config: &SearchConfig, catalog: &Catalog, budget: u64) -> Self {
        let cities = CityIndex::new(config);
        let candidates = rank_candidates(board, config, catalog, &cities, budget);
        Plan {
            budget,
            tuning: config.tuning.unwrap_or_default(),
            cities,
            candidates,
        }
    }

    fn search<'a, S: EventSink + ?Sized>(
        &'a self,
        board: &Board,
        cancel: &'a CancelToken,
        sink: &'a mut S,
    ) -> Search<'a, S> {
        let mut position = vec![None; board.len()];
        for (pos, candidate) in self.candidates.iter().enumerate() {
            position[candidate.index] = Some(pos);
        }
        let used = self
            .cities
            .ids()
            .iter()
            .map(|id| board.advanced_in_city(id))
            .collect();
        Search {
            board: board.clone(),
            candidates: &self.candidates,
            position,
            cities: &self.cities,
            used,
            path: Vec::with_capacity(self.candidates.len()),
            best_score: evaluate(board),
            best: None,
            iterations: 0,
            yield_interval: self.tuning.yield_interval.max(1),
            progress_depth: self.tuning.progress_depth,
            progress: 0.0,
            cancelled: false,
            cancel,
            sink,
            #[cfg(test)]
            fail_at_depth: None,
        }
    }
}

/// Searches for the best placement on `board` under `config`.
///
/// Improving solutions and progress are emitted into `sink` as they are
/// found. The returned outcome is never worse than the input board. A
/// cancelled run returns the best board found so far with
/// `SearchStatus::Cancelled`.
pub fn optimize<S: EventSink + ?Sized>(
    board: &Board,
    cancel: &CancelToken,
    config: &SearchConfig,
    catalog: &Catalog,
    sink: &mut S,
) -> Result<SearchOutcome, OptimizeError> {
    let budget = validate(board, config, catalog)?;
    let plan = Plan::new(board, config, catalog, budget);
    debug!(
        candidates = plan.candidates.len(),
        cities = plan.cities.len(),
        budget,
        "search started"
    );

    let mut search = plan.search(board, cancel, sink);
    search.descend(0, plan.budget, 0.0, 1.0)?;

    let status = if search.cancelled {
        SearchStatus::Cancelled
    } else {
        search.report_progress(1.0);
        SearchStatus::Completed
    };
    debug!(
        iterations = search.iterations,
        score = search.best_score.primary,
        ?status,
        "search finished"
    );

    let board = match &search.best {
        Some(solution) => solution.board.clone(),
        None => board.clone(),
    };
    Ok(SearchOutcome {
        board,
        score: search.best_score,
        best: search.best,
        status,
        iterations: search.iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Action, ActionId, Capability};
    use crate::board::parse_board;
    use crate::search::config::SearchTuning;
    use crate::search::events::FnSink;

    fn market_and_sawmill() -> Catalog {
        Catalog::new(vec![
            Action {
                id: ActionId::BuildMarket,
                cost: 5,
                capability: Capability::Trade,
            },
            Action {
                id: ActionId::BuildSawmill,
                cost: 5,
                capability: Capability::Mathematics,
            },
        ])
    }

    fn two_cities() -> Board {
        parse_board(
            "tLa gSa g-a
             w-. w-. w-.
             tLb gSb g-b",
        )
        .unwrap()
    }

    fn config(budget: i64, cities: &[&str]) -> SearchConfig {
        SearchConfig::new(budget, cities.iter().map(|&c| CityId::from(c))).with_all_capabilities()
    }

    fn run(
        board: &Board,
        config: &SearchConfig,
        catalog: &Catalog,
    ) -> (SearchOutcome, Vec<SearchEvent>) {
        let mut events = Vec::new();
        let outcome = optimize(board, &CancelToken::new(), config, catalog, &mut events).unwrap();
        (outcome, events)
    }

    fn markets(board: &Board) -> usize {
        board
            .tiles()
            .iter()
            .filter(|t| t.building == Some(Building::Market))
            .count()
    }

    #[test]
    fn global_budget_places_one_market() {
        let (outcome, _) = run(&two_cities(), &config(5, &["a", "b"]), &market_and_sawmill());
        assert_eq!(outcome.status, SearchStatus::Completed);
        assert_eq!(markets(&outcome.board), 1);
        assert_eq!(outcome.score.primary, 1);
        let best = outcome.best.unwrap();
        assert_eq!(best.total_cost(), 5);
        assert_eq!(best.history.len(), 1);
        assert_eq!(best.history[0].action_id, ActionId::BuildMarket);
    }

    #[test]
    fn larger_budget_places_both_markets() {
        let (outcome, _) = run(&two_cities(), &config(10, &["a", "b"]), &market_and_sawmill());
        assert_eq!(markets(&outcome.board), 2);
        assert_eq!(outcome.score.primary, 2);
        assert_eq!(outcome.best.unwrap().total_cost(), 10);
    }

    #[test]
    fn non_participating_city_is_untouched() {
        let (outcome, _) = run(&two_cities(), &config(10, &["a"]), &market_and_sawmill());
        assert_eq!(markets(&outcome.board), 1);
        assert_eq!(outcome.board.tile_at(8).building, None);
        let best = outcome.best.unwrap();
        assert_eq!(best.history[0].city_id, Some(CityId::from("a")));
        assert_eq!(best.history[0].tile_coords, TileCoords { x: 2, y: 0 });
    }

    #[test]
    fn one_market_per_city() {
        let board = parse_board(
            "g-a gSa g-a
             w-. tLa w-.",
        )
        .unwrap();
        let (outcome, _) = run(&board, &config(100, &["a"]), Catalog::standard());
        assert_eq!(markets(&outcome.board), 1);
        assert_eq!(outcome.score.primary, 1);
    }

    #[test]
    fn existing_market_blocks_another() {
        let board = parse_board(
            "gMa w-. g-a
             w-. w-. gSa
             w-. w-. tLa",
        )
        .unwrap();
        let (outcome, events) = run(&board, &config(100, &["a"]), Catalog::standard());
        assert_eq!(outcome.board, board);
        assert!(outcome.best.is_none());
        assert!(!events.iter().any(|e| matches!(e, SearchEvent::NewSolution(_))));
    }

    #[test]
    fn no_improvement_returns_input() {
        let board = parse_board("g-a g-a\ng-a g-a").unwrap();
        let (outcome, events) = run(&board, &config(100, &["a"]), Catalog::standard());
        assert_eq!(outcome.status, SearchStatus::Completed);
        assert_eq!(outcome.board, board);
        assert!(outcome.best.is_none());
        assert_eq!(events.last(), Some(&SearchEvent::Progress(1.0)));
    }

    #[test]
    fn zero_capabilities_is_a_no_op() {
        let board = two_cities();
        let cfg = SearchConfig::new(100, [CityId::from("a"), CityId::from("b")]);
        let (outcome, _) = run(&board, &cfg, Catalog::standard());
        assert_eq!(outcome.board, board);
        assert_eq!(outcome.iterations, 1);
    }

    #[test]
    fn solutions_strictly_improve() {
        let board = parse_board(
            "tLa gSa g-a tLa
             g-a g-a g-a g-a
             cFa cFa mNa g-a",
        )
        .unwrap();
        let (outcome, events) = run(&board, &config(30, &["a"]), Catalog::standard());
        let scores: Vec<Score> = events
            .iter()
            .filter_map(|e| match e {
                SearchEvent::NewSolution(s) => Some(s.score_value()),
                _ => None,
            })
            .collect();
        assert!(!scores.is_empty());
        assert!(scores.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(outcome.score, *scores.last().unwrap());
        assert!(outcome.best.unwrap().total_cost() <= 30);
    }

    #[test]
    fn progress_is_monotone_and_completes() {
        let board = parse_board(
            "tLa gSa g-a tLa
             g-a g-a g-a g-a
             cFa cFa mNa g-a",
        )
        .unwrap();
        let (_, events) = run(&board, &config(30, &["a"]), Catalog::standard());
        let progress: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                SearchEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert!(progress.len() > 1);
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert!(progress.iter().all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(progress.last(), Some(&1.0));
    }

    #[test]
    fn cancelled_before_start_returns_input() {
        let board = two_cities();
        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = optimize(
            &board,
            &cancel,
            &config(10, &["a", "b"]),
            &market_and_sawmill(),
            &mut (),
        )
        .unwrap();
        assert_eq!(outcome.status, SearchStatus::Cancelled);
        assert_eq!(outcome.board, board);
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn cancel_mid_search_keeps_best_so_far() {
        let board = two_cities();
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let mut sink = FnSink(move |event: SearchEvent| {
            if matches!(event, SearchEvent::NewSolution(_)) {
                token.cancel();
            }
        });
        let outcome = optimize(
            &board,
            &cancel,
            &config(10, &["a", "b"]),
            &market_and_sawmill(),
            &mut sink,
        )
        .unwrap();
        assert!(outcome.is_cancelled());
        assert_eq!(outcome.score.primary, 1);
        assert!(outcome.score > evaluate(&board));
    }

    #[test]
    fn checkpoint_runs_every_interval() {
        struct Counting {
            checkpoints: u64,
        }
        impl EventSink for Counting {
            fn emit(&mut self, _event: SearchEvent) {}
            fn checkpoint(&mut self) {
                self.checkpoints += 1;
            }
        }

        let cfg = config(10, &["a", "b"]).with_tuning(SearchTuning {
            yield_interval: 1,
            progress_depth: 0,
        });
        let mut sink = Counting { checkpoints: 0 };
        let outcome = optimize(
            &two_cities(),
            &CancelToken::new(),
            &cfg,
            &market_and_sawmill(),
            &mut sink,
        )
        .unwrap();
        assert!(outcome.iterations > 1);
        assert_eq!(sink.checkpoints, outcome.iterations);
    }

    #[test]
    fn invalid_configs_fail_fast() {
        let board = two_cities();
        let catalog = market_and_sawmill();
        let err = |cfg: SearchConfig, catalog: &Catalog| {
            optimize(&board, &CancelToken::new(), &cfg, catalog, &mut ()).unwrap_err()
        };
        assert_eq!(err(config(-1, &["a"]), &catalog), OptimizeError::NegativeBudget(-1));
        assert_eq!(err(config(5, &["a"]), &Catalog::new(Vec::new())), OptimizeError::EmptyCatalog);
        assert_eq!(err(config(5, &[]), &catalog), OptimizeError::NoCities);
        assert_eq!(
            err(config(5, &["a", "z"]), &catalog),
            OptimizeError::UnknownCity(CityId::from("z"))
        );
    }

    #[test]
    fn failed_apply_unwinds_every_open_step() {
        let board = two_cities();
        let catalog = market_and_sawmill();
        let plan = Plan::new(&board, &config(10, &["a", "b"]), &catalog, 10);
        let cancel = CancelToken::new();
        let mut events = Vec::new();
        let mut search = plan.search(&board, &cancel, &mut events);
        let seeded = search.used.clone();
        // The second stacked placement fails with the first one still applied.
        search.fail_at_depth = Some(1);

        let err = search.descend(0, plan.budget, 0.0, 1.0).unwrap_err();
        assert!(matches!(err, OptimizeError::Action(ActionError::Infeasible { .. })));
        assert_eq!(search.board, board);
        assert!(search.path.is_empty());
        assert_eq!(search.used, seeded);
    }
}
