//! Picks a depot tile for each resource cluster.
//!
//! Every tile where a depot fits is scored by how close it is to the
//! cluster's resources: within `influence_radius` of a resource a tile gains
//! `(2 R^2 - d^2) * weight`, so the winner is the spot nearest to most of
//! the cluster at once. Geysers weigh more than minerals because a base
//! only ever gets one or two of them.

use crate::constants::*;
use crate::location::*;
use crate::pipeline::AnalysisConfig;
use crate::terrain::*;
use log::*;
use std::collections::VecDeque;

/// Tiles where the top-left corner of a depot may go: the whole footprint
/// is buildable and keeps the required gap from every resource.
pub fn base_build_map(buildability: &Grid<bool>, resources: &[ResourceObject]) -> Grid<bool> {
    let width = buildability.width() as i32;
    let height = buildability.height() as i32;
    let mut build_map = Grid::new(buildability.width(), buildability.height(), false);

    for y in 0..height {
        for x in 0..width {
            let fits = (0..DEPOT_HEIGHT).all(|dy| {
                (0..DEPOT_WIDTH).all(|dx| buildability.try_get(x + dx, y + dy) == Some(true))
            });
            if fits {
                build_map.set(x as usize, y as usize, true);
            }
        }
    }

    for resource in resources {
        let pos = resource.position;
        build_map.fill_rect(
            pos.x - (DEPOT_WIDTH + RESOURCE_GAP - 1),
            pos.y - (DEPOT_HEIGHT + RESOURCE_GAP - 1),
            pos.x + resource.width + RESOURCE_GAP - 1,
            pos.y + resource.height + RESOURCE_GAP - 1,
            false,
        );
    }

    build_map
}

/// Influence score of every candidate tile for one cluster. Tiles that
/// cannot hold a depot score 0.
pub fn score_candidates(build_map: &Grid<bool>, resources: &[&ResourceObject], config: &AnalysisConfig) -> Grid<i64> {
    let mut scores = Grid::new(build_map.width(), build_map.height(), 0i64);
    let radius = config.influence_radius;
    let max_square = 2 * (radius as i64) * (radius as i64);

    for resource in resources {
        let origin = resource.position;
        let weight = if resource.is_mineral() {
            config.mineral_weight
        } else {
            config.geyser_weight
        };

        let min_x = (origin.x - radius).max(0);
        let max_x = (origin.x + radius).min(build_map.width() as i32 - 1);
        let min_y = (origin.y - radius).max(0);
        let max_y = (origin.y + radius).min(build_map.height() as i32 - 1);
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                if !*build_map.get(x as usize, y as usize) {
                    continue;
                }
                let square = origin.square_distance(TilePosition::new(x, y));
                *scores.get_mut(x as usize, y as usize) += (max_square - square) * weight;
            }
        }
    }

    scores
}

/// Tile with the strictly greatest positive score, first in x-major scan
/// order on ties.
pub fn best_candidate(scores: &Grid<i64>) -> Option<(TilePosition, i64)> {
    let mut best: Option<(TilePosition, i64)> = None;
    for x in 0..scores.width() {
        for y in 0..scores.height() {
            let score = *scores.get(x, y);
            if score > 0 && best.map_or(true, |(_, s)| score > s) {
                best = Some((TilePosition::new(x as i32, y as i32), score));
            }
        }
    }
    best
}

/// Placement for one cluster, or `None` if no buildable tile scored.
pub fn place_cluster(
    build_map: &Grid<bool>,
    resources: &[&ResourceObject],
    config: &AnalysisConfig,
) -> Option<(TilePosition, i64)> {
    best_candidate(&score_candidates(build_map, resources, config))
}

/// Flag placements that match a start position hint. Each hint is used at
/// most once, by the first placement within range.
pub fn match_start_locations(placements: &[TilePosition], hints: &[TilePosition], threshold: i32) -> Vec<bool> {
    let mut remaining: VecDeque<TilePosition> = hints.iter().copied().collect();
    let matches = placements
        .iter()
        .map(|tile| {
            match remaining
                .iter()
                .position(|hint| tile.approx_distance(*hint) < threshold)
            {
                Some(index) => {
                    remaining.remove(index);
                    true
                }
                None => false,
            }
        })
        .collect();

    for hint in &remaining {
        warn!("Start location hint {:?} matched no base location", hint);
    }

    matches
}
