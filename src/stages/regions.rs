//! Partitions walkable space into regions separated by chokepoint walls.

use super::choke_sides::ChokeSides;
use crate::distance::nearest_walkable;
use crate::geometry::*;
use crate::graph::*;
use crate::location::*;
use crate::pipeline::analysis::*;
use crate::terrain::*;
use log::*;
use std::collections::BTreeMap;

/// Seeds further than this from any walkable cell are dropped.
const SEED_SNAP_RADIUS: i32 = 8;

pub struct RegionLayout {
    pub regions: Vec<Region>,
    pub chokepoints: Vec<Chokepoint>,
    pub region_map: Grid<Option<RegionId>>,
}

/// Cells blocked by chokepoint walls, so regions stop at the passage.
fn choke_barriers(walkability: &Grid<bool>, sides: &BTreeMap<NodeId, Option<ChokeSides>>) -> Grid<bool> {
    let mut barriers = Grid::new(walkability.width(), walkability.height(), false);
    for (a, b) in sides.values().flatten() {
        for cell in rasterize_segment(&Segment::new(*a, *b), 1.0) {
            if walkability.try_get(cell.x, cell.y) == Some(true) {
                barriers.set(cell.x as usize, cell.y as usize, true);
            }
        }
    }
    barriers
}

/// Cell closest to the centroid of a set of cells.
fn central_cell(cells: &[WalkPosition]) -> Option<WalkPosition> {
    let n = cells.len() as f64;
    let (sx, sy) = cells
        .iter()
        .fold((0.0, 0.0), |(x, y), c| (x + c.x as f64 + 0.5, y + c.y as f64 + 0.5));
    let centroid = Point::new(sx / n, sy / n);
    cells.iter().copied().min_by(|a, b| {
        Point::from_walk(*a)
            .distance_to(centroid)
            .total_cmp(&Point::from_walk(*b).distance_to(centroid))
    })
}

/// Label every walkable cell with a region and build the region and
/// chokepoint entities. Regions are numbered in node order, followed by
/// regions for walkable pockets no skeleton node reached.
pub fn build_regions(
    graph: &RegionGraph,
    sides: &BTreeMap<NodeId, Option<ChokeSides>>,
    walkability: &Grid<bool>,
) -> RegionLayout {
    let mut regions = Vec::new();
    let mut node_regions: BTreeMap<NodeId, RegionId> = BTreeMap::new();
    let mut seeds = Vec::new();

    for id in graph.nodes_of_kind(NodeKind::Region) {
        let node = match graph.node(id) {
            Some(node) => node,
            None => continue,
        };
        let seed = match nearest_walkable(walkability, node.position.to_walk(), SEED_SNAP_RADIUS) {
            Some(seed) => seed,
            None => {
                warn!("Region node {:?} at {:?} is not near walkable ground, dropping it", id, node.position);
                continue;
            }
        };

        let region_id = RegionId(regions.len() as u32);
        node_regions.insert(id, region_id);
        seeds.push((seed, region_id.0));
        regions.push(Region {
            id: region_id,
            polygon: Polygon::default(),
            center: node.position,
            clearance: node.clearance,
            chokepoints: Vec::new(),
            base_locations: Vec::new(),
        });
    }

    let barriers = choke_barriers(walkability, sides);
    let mut labels: Grid<Option<u32>> = Grid::new(walkability.width(), walkability.height(), None);

    // grow regions up to the chokepoint walls
    flood_fill_labels(&mut labels, &seeds, &NEIGHBORS_4, |x, y| {
        walkability.try_get(x, y) == Some(true) && barriers.try_get(x, y) == Some(false)
    });

    // absorb the walls themselves and any pockets they cut off
    let grown: Vec<(WalkPosition, u32)> = labels
        .iter()
        .filter_map(|((x, y), label)| label.map(|l| (WalkPosition::new(x as i32, y as i32), l)))
        .collect();
    flood_fill_labels(&mut labels, &grown, &NEIGHBORS_8, |x, y| {
        walkability.try_get(x, y) == Some(true)
    });

    // walkable components without any skeleton node
    let mut open = Grid::new(walkability.width(), walkability.height(), false);
    for ((x, y), walkable) in walkability.iter() {
        if *walkable && labels.get(x, y).is_none() {
            open.set(x, y, true);
        }
    }
    let (components, _) = label_components(&open, |v| v);
    let mut pocket_cells: BTreeMap<u32, Vec<WalkPosition>> = BTreeMap::new();
    for ((x, y), component) in components.iter() {
        if *component != 0 {
            pocket_cells
                .entry(*component)
                .or_default()
                .push(WalkPosition::new(x as i32, y as i32));
        }
    }
    for cells in pocket_cells.values() {
        let center = match central_cell(cells) {
            Some(center) => center,
            None => continue,
        };
        let region_id = RegionId(regions.len() as u32);
        for cell in cells {
            labels.set(cell.x as usize, cell.y as usize, Some(region_id.0));
        }
        regions.push(Region {
            id: region_id,
            polygon: Polygon::default(),
            center: Point::from_walk(center),
            clearance: 0.0,
            chokepoints: Vec::new(),
            base_locations: Vec::new(),
        });
    }
    if !pocket_cells.is_empty() {
        debug!("Added {} regions for unreached walkable areas", pocket_cells.len());
    }

    let mut outlines = trace_polygons(&labels, |l| l);
    for region in regions.iter_mut() {
        region.polygon = outlines.remove(&region.id.0).unwrap_or_default();
    }

    let mut chokepoints = Vec::new();
    let incidence = graph.incidence();
    for id in graph.nodes_of_kind(NodeKind::Chokepoint) {
        let node = match graph.node(id) {
            Some(node) => node,
            None => continue,
        };
        let ends: Vec<RegionId> = incidence
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|e| node_regions.get(&graph.edges()[*e].other(id)).copied())
            .collect();
        let (a, b) = match ends.as_slice() {
            [a, b] if a != b => (*a, *b),
            _ => {
                warn!("Chokepoint {:?} does not join two regions, dropping it", id);
                continue;
            }
        };

        let choke_sides = sides.get(&id).copied().flatten();
        let width = match choke_sides {
            Some((left, right)) => left.distance_to(right),
            None => node.clearance * 2.0,
        };

        let choke_id = ChokepointId(chokepoints.len() as u32);
        regions[a.index()].chokepoints.push(choke_id);
        regions[b.index()].chokepoints.push(choke_id);
        chokepoints.push(Chokepoint {
            id: choke_id,
            sides: choke_sides,
            center: node.position,
            regions: (a, b),
            width,
        });
    }

    let region_map = labels.map(|l| l.map(RegionId));
    RegionLayout {
        regions,
        chokepoints,
        region_map,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two rooms joined by a gap at y in [8, 12) through a wall at x in [18, 22).
    fn two_rooms() -> Grid<bool> {
        let mut walk = Grid::new(40, 20, true);
        walk.fill_rect(18, 0, 21, 7, false);
        walk.fill_rect(18, 12, 21, 19, false);
        walk
    }

    fn two_room_graph() -> (RegionGraph, NodeId) {
        let mut graph = RegionGraph::new();
        let left = graph.add_node(Point::new(9.0, 10.0), 8.0, NodeKind::Region);
        let right = graph.add_node(Point::new(30.0, 10.0), 8.0, NodeKind::Region);
        let choke = graph.add_node(Point::new(20.0, 10.0), 2.0, NodeKind::Chokepoint);
        graph.add_edge(GraphEdge::new(left, choke));
        graph.add_edge(GraphEdge::new(choke, right));
        (graph, choke)
    }

    #[test]
    fn chokepoint_wall_splits_rooms() {
        let walk = two_rooms();
        let (graph, choke) = two_room_graph();
        let mut sides = BTreeMap::new();
        sides.insert(choke, Some((Point::new(20.0, 8.0), Point::new(20.0, 12.0))));

        let layout = build_regions(&graph, &sides, &walk);
        assert_eq!(layout.regions.len(), 2);
        assert_eq!(layout.chokepoints.len(), 1);
        assert_eq!(layout.chokepoints[0].regions, (RegionId(0), RegionId(1)));
        assert_eq!(layout.chokepoints[0].width, 4.0);
        assert_eq!(layout.regions[0].chokepoints, vec![ChokepointId(0)]);

        assert_eq!(*layout.region_map.get(5, 5), Some(RegionId(0)));
        assert_eq!(*layout.region_map.get(35, 15), Some(RegionId(1)));
        assert_eq!(*layout.region_map.get(19, 2), None);

        // no gaps, no overlaps
        let walkable = walk.iter().filter(|(_, w)| **w).count();
        let labeled = layout.region_map.iter().filter(|(_, r)| r.is_some()).count();
        assert_eq!(walkable, labeled);
        let area: f64 = layout.regions.iter().map(|r| r.area()).sum();
        assert_eq!(area, walkable as f64);
    }

    #[test]
    fn missing_sides_fall_back_to_clearance_width() {
        let walk = two_rooms();
        let (graph, choke) = two_room_graph();
        let mut sides = BTreeMap::new();
        sides.insert(choke, None);

        let layout = build_regions(&graph, &sides, &walk);
        assert_eq!(layout.chokepoints[0].width, 4.0);
        assert_eq!(layout.chokepoints[0].sides, None);
        // without a wall both seeds grow until they meet
        assert_eq!(*layout.region_map.get(2, 2), Some(RegionId(0)));
        assert_eq!(*layout.region_map.get(35, 15), Some(RegionId(1)));
    }

    #[test]
    fn unreached_pocket_becomes_region() {
        let mut walk = Grid::new(30, 10, true);
        walk.fill_rect(10, 0, 11, 9, false);
        let mut graph = RegionGraph::new();
        graph.add_node(Point::new(4.0, 5.0), 4.0, NodeKind::Region);

        let layout = build_regions(&graph, &BTreeMap::new(), &walk);
        assert_eq!(layout.regions.len(), 2);
        assert_eq!(*layout.region_map.get(20, 5), Some(RegionId(1)));
        assert_eq!(layout.regions[1].clearance, 0.0);
        assert!(layout.regions[1].polygon.contains(layout.regions[1].center));
    }

    #[test]
    fn region_ids_go_past_u16() {
        // isolated walkable specks, one pocket region each
        let mut walk = Grid::new(514, 514, false);
        for y in (0..514).step_by(2) {
            for x in (0..514).step_by(2) {
                walk.set(x, y, true);
            }
        }

        let layout = build_regions(&RegionGraph::new(), &BTreeMap::new(), &walk);
        assert_eq!(layout.regions.len(), 257 * 257);
        let last = layout.regions.last().unwrap();
        assert_eq!(last.id, RegionId(257 * 257 - 1));
        assert_eq!(*layout.region_map.get(512, 512), Some(last.id));
        assert_eq!(last.area(), 1.0);
    }

    #[test]
    fn seed_in_wall_snaps_to_ground() {
        let mut walk = Grid::new(20, 20, true);
        walk.fill_rect(8, 8, 10, 10, false);
        let mut graph = RegionGraph::new();
        graph.add_node(Point::new(9.5, 9.5), 3.0, NodeKind::Region);

        let layout = build_regions(&graph, &BTreeMap::new(), &walk);
        assert_eq!(layout.regions.len(), 1);
        assert_eq!(*layout.region_map.get(0, 0), Some(RegionId(0)));
    }
}
