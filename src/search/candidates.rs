//! Candidate selection and ordering.
//!
//! A candidate is an empty field tile owned by a participating city. Every
//! enabled, affordable, feasible action is scored in isolation against the
//! starting board; candidates are then sorted by their best single-action
//! gain so the anytime search reaches good leaves early. The ordering never
//! changes which assignments are explored, only when.
//!
//! Feasibility of a placement on an empty field depends only on terrain and
//! basic buildings, which the search never touches. A candidate with no
//! feasible action in isolation therefore has none during the search and is
//! dropped.

use rayon::prelude::*;

use crate::actions::{ActionId, Catalog};
use crate::board::{Board, Building, BuildingSet, CityId};
use crate::eval::{evaluate, Score};

use super::config::SearchConfig;

/// Dense index over the participating cities.
#[derive(Debug, Clone)]
pub(crate) struct CityIndex {
    ids: Vec<CityId>,
}

impl CityIndex {
    pub(crate) fn new(config: &SearchConfig) -> Self {
        // BTreeSet iteration is sorted, so binary search works below.
        CityIndex {
            ids: config.participating_cities.iter().cloned().collect(),
        }
    }

    pub(crate) fn position(&self, id: &CityId) -> Option<usize> {
        self.ids.binary_search(id).ok()
    }

    pub(crate) fn ids(&self) -> &[CityId] {
        &self.ids
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}

/// One action a candidate may take, with its isolated gain.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CandidateAction {
    pub id: ActionId,
    pub cost: u32,
    pub places: Option<Building>,
    pub benefit: Score,
}

#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    /// Tile index on the board.
    pub index: usize,
    /// Dense city index.
    pub city: usize,
    /// Actions in descending benefit order.
    pub actions: Vec<CandidateAction>,
    /// Every building some action here can place.
    pub hosts: BuildingSet,
    pub best: Score,
}

/// Collects and orders the candidates of one search.
pub(crate) fn rank_candidates(
    board: &Board,
    config: &SearchConfig,
    catalog: &Catalog,
    cities: &CityIndex,
    budget: u64,
) -> Vec<Candidate> {
    let base = evaluate(board);
    let enabled: Vec<_> = catalog
        .actions()
        .iter()
        .filter(|a| config.is_enabled(a.capability) && u64::from(a.cost) <= budget)
        .copied()
        .collect();
    if enabled.is_empty() {
        return Vec::new();
    }

    let eligible: Vec<(usize, usize)> = board
        .tiles()
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_empty())
        .filter_map(|(i, t)| {
            let city = cities.position(t.city.as_ref()?)?;
            Some((i, city))
        })
        .collect();

    let mut ranked: Vec<Candidate> = eligible
        .par_iter()
        .map_init(
            || board.clone(),
            |scratch, &(index, city)| {
                // apply rejects infeasible actions without touching the board.
                let mut actions: Vec<CandidateAction> = enabled
                    .iter()
                    .filter_map(|a| {
                        let undo = scratch.apply(a.id, index).ok()?;
                        let benefit = evaluate(scratch) - base;
                        scratch.undo(undo);
                        Some(CandidateAction {
                            id: a.id,
                            cost: a.cost,
                            places: a.id.places(),
                            benefit,
                        })
                    })
                    .collect();
                // Stable sort keeps catalog order among equal gains.
                actions.sort_by(|a, b| b.benefit.cmp(&a.benefit));
                let hosts = actions.iter().filter_map(|a| a.places).collect();
                let best = actions.first().map_or(Score::default(), |a| a.benefit);
                Candidate {
                    index,
                    city,
                    actions,
                    hosts,
                    best,
                }
            },
        )
        .filter(|c| !c.actions.is_empty())
        .collect();

    ranked.sort_by(|a, b| b.best.cmp(&a.best).then(a.index.cmp(&b.index)));
    ranked
}
