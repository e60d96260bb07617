use terrain_analysis::constants::*;
use terrain_analysis::*;

/// Kernel that hands back a fixed set of skeleton edges.
struct FixedKernel {
    edges: Vec<VoronoiEdge>,
}

impl GeometryKernel for FixedKernel {
    fn voronoi_edges(&self, _obstacles: &ObstacleSet, _width: usize, _height: usize) -> Vec<VoronoiEdge> {
        self.edges.clone()
    }
}

fn edge(x1: f64, y1: f64, x2: f64, y2: f64) -> VoronoiEdge {
    VoronoiEdge::new(Point::new(x1, y1), Point::new(x2, y2))
}

fn buildability(walkability: &Grid<bool>) -> Grid<bool> {
    let scale = WALK_PER_TILE as usize;
    let mut tiles = Grid::new(walkability.width() / scale, walkability.height() / scale, false);
    for ty in 0..tiles.height() {
        for tx in 0..tiles.width() {
            let open = (0..scale).all(|dy| (0..scale).all(|dx| *walkability.get(tx * scale + dx, ty * scale + dy)));
            tiles.set(tx, ty, open);
        }
    }
    tiles
}

fn mineral_lines() -> Vec<ResourceObject> {
    let mut resources = Vec::new();
    for x in [0, 20] {
        for y in [1, 3, 5, 7] {
            resources.push(ResourceObject::mineral(x, y));
        }
    }
    resources
}

/// Two 40x40 rooms joined by an 8 cell wide corridor.
fn two_rooms() -> (MapData, FixedKernel) {
    let mut walkability = Grid::new(88, 40, true);
    walkability.fill_rect(40, 0, 47, 15, false);
    walkability.fill_rect(40, 24, 47, 39, false);

    let map = MapData {
        buildability: buildability(&walkability),
        walkability,
        resources: mineral_lines(),
        start_locations: vec![TilePosition::new(6, 5), TilePosition::new(14, 5)],
        hash: "two-rooms".to_string(),
    };
    let kernel = FixedKernel {
        edges: vec![edge(2.0, 20.0, 86.0, 20.0)],
    };
    (map, kernel)
}

/// The same rooms with the corridor walled off.
fn split_rooms() -> (MapData, FixedKernel) {
    let mut walkability = Grid::new(88, 40, true);
    walkability.fill_rect(40, 0, 47, 39, false);

    let map = MapData {
        buildability: buildability(&walkability),
        walkability,
        resources: mineral_lines(),
        start_locations: Vec::new(),
        hash: "split-rooms".to_string(),
    };
    let kernel = FixedKernel {
        edges: vec![edge(2.0, 20.0, 38.0, 20.0), edge(50.0, 20.0, 86.0, 20.0)],
    };
    (map, kernel)
}

#[test]
fn two_rooms_and_a_chokepoint() {
    let (map, kernel) = two_rooms();
    let analysis = run_analysis(&map, &kernel, &AnalysisConfig::default()).unwrap();

    assert_eq!(analysis.regions.len(), 2);
    assert_eq!(analysis.chokepoints.len(), 1);

    let left = analysis.region_at(WalkPosition::new(10, 20)).unwrap().id;
    let right = analysis.region_at(WalkPosition::new(78, 20)).unwrap().id;
    assert_ne!(left, right);
    assert!(analysis.region_at(WalkPosition::new(43, 5)).is_none());
    assert!(analysis.nearest_region(WalkPosition::new(43, 5)).is_some());

    let choke = &analysis.chokepoints[0];
    assert!(choke.connects(left) && choke.connects(right));
    assert_eq!(choke.other_region(left), right);
    assert!(choke.width >= 6.0 && choke.width <= 10.0, "width {}", choke.width);
    assert!(choke.center.x >= 38.0 && choke.center.x <= 50.0);

    // the strip itself is owned by one of the two regions
    let strip = analysis.region_at(choke.center.to_walk()).map(|r| r.id);
    assert!(strip == Some(left) || strip == Some(right));

    for region in &analysis.regions {
        assert!(region.area() > 0.0);
        assert_eq!(region.chokepoints, vec![choke.id]);
        assert_eq!(region.neighbors(&analysis).count(), 1);
    }
}

#[test]
fn bases_are_placed_next_to_their_minerals() {
    let (map, kernel) = two_rooms();
    let analysis = run_analysis(&map, &kernel, &AnalysisConfig::default()).unwrap();

    let bases = &analysis.base_locations;
    assert_eq!(bases.len(), 2);
    assert_eq!(bases[0].tile_position, TilePosition::new(5, 4));
    assert_eq!(bases[1].tile_position, TilePosition::new(13, 4));
    assert_eq!(bases[0].walk_position, WalkPosition::new(28, 22));

    let left = analysis.region_at(WalkPosition::new(10, 20)).map(|r| r.id);
    let right = analysis.region_at(WalkPosition::new(78, 20)).map(|r| r.id);
    assert_eq!(bases[0].region, left);
    assert_eq!(bases[1].region, right);

    assert_eq!(bases[0].resources, (0..4).map(ResourceId).collect::<Vec<_>>());
    assert_eq!(bases[1].resources, (4..8).map(ResourceId).collect::<Vec<_>>());
    assert_eq!(analysis.start_locations().count(), 2);

    for base in bases {
        assert!(!base.is_island());
        assert!(base.score > 0);
    }
}

#[test]
fn distances_between_connected_bases() {
    let (map, kernel) = two_rooms();
    let analysis = run_analysis(&map, &kernel, &AnalysisConfig::default()).unwrap();
    let (a, b) = (BaseLocationId(0), BaseLocationId(1));

    // straight through the corridor, 32 walk cells
    assert_eq!(analysis.ground_distance(a, b), Some(8.0));
    assert_eq!(analysis.ground_distance(a, b), analysis.ground_distance(b, a));
    assert_eq!(analysis.ground_distance(a, a), Some(0.0));
    assert_eq!(analysis.air_distance(a, b), Some(8.0));

    assert_eq!(analysis.nearest_base_location(WalkPosition::new(2, 2)).map(|b| b.id), Some(a));
    assert_eq!(analysis.nearest_base_location(WalkPosition::new(85, 37)).map(|b| b.id), Some(b));
    assert!(analysis.nearest_chokepoint(WalkPosition::new(10, 20)).is_some());
    assert!(analysis.is_connected(TilePosition::new(1, 1), TilePosition::new(20, 8)));
}

#[test]
fn walled_off_rooms_are_islands() {
    let (map, kernel) = split_rooms();
    let analysis = run_analysis(&map, &kernel, &AnalysisConfig::default()).unwrap();

    assert_eq!(analysis.regions.len(), 2);
    assert!(analysis.chokepoints.is_empty());
    assert_eq!(analysis.base_locations.len(), 2);
    assert!(analysis.base_locations.iter().all(|b| b.is_island()));
    assert_eq!(analysis.ground_distance(BaseLocationId(0), BaseLocationId(1)), None);
    assert!(analysis.air_distance(BaseLocationId(0), BaseLocationId(1)).is_some());
    assert!(!analysis.is_connected(TilePosition::new(1, 1), TilePosition::new(20, 8)));
    assert!(analysis.nearest_chokepoint(WalkPosition::new(10, 20)).is_none());
}

#[test]
fn unbounded_voronoi_edges_are_ignored() {
    let walkability = Grid::new(32, 32, true);
    let map = MapData {
        buildability: buildability(&walkability),
        walkability,
        resources: Vec::new(),
        start_locations: Vec::new(),
        hash: "far-edge".to_string(),
    };
    let kernel = FixedKernel {
        edges: vec![edge(10.0, 10.0, 1e15, 10.0), edge(f64::NAN, 4.0, 8.0, 4.0)],
    };

    let analysis = run_analysis(&map, &kernel, &AnalysisConfig::default()).unwrap();
    assert!(!analysis.regions.is_empty());
    assert!(analysis.chokepoints.is_empty());
}

#[test]
fn depot_on_solid_ground_is_skipped() {
    // the provider claims every tile buildable, but only the mineral strip is walkable
    let mut walkability = Grid::new(64, 32, true);
    walkability.fill_rect(12, 0, 63, 31, false);
    let map = MapData {
        buildability: Grid::new(16, 8, true),
        walkability,
        resources: [1, 3, 5].iter().map(|y| ResourceObject::mineral(0, *y)).collect(),
        start_locations: Vec::new(),
        hash: "solid-depot".to_string(),
    };
    let kernel = FixedKernel { edges: Vec::new() };

    let analysis = run_analysis(&map, &kernel, &AnalysisConfig::default()).unwrap();
    assert!(analysis.base_locations.is_empty());
    assert!(!analysis.regions.is_empty());
}

#[test]
fn mismatched_grids_are_rejected() {
    let (mut map, kernel) = two_rooms();
    map.buildability = Grid::new(20, 10, true);
    assert!(matches!(
        run_analysis(&map, &kernel, &AnalysisConfig::default()),
        Err(AnalysisError::DimensionMismatch { .. })
    ));
}

#[test]
fn analyzer_reuses_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let (map, kernel) = two_rooms();

    let mut analyzer = AnalyzerBuilder::new(Box::new(kernel)).cache_dir(dir.path()).build();
    assert!(analyzer.current().is_none());
    let first = analyzer.analyze(&map).unwrap();
    assert!(cache::cache_path(dir.path(), "two-rooms").exists());
    assert_eq!(analyzer.current().as_deref(), Some(&*first));

    // a kernel with no edges only finds zero-clearance pocket regions, so a match proves the cache was used
    let empty = FixedKernel { edges: Vec::new() };
    let mut cached = AnalyzerBuilder::new(Box::new(empty)).cache_dir(dir.path()).build();
    assert_eq!(*cached.analyze(&map).unwrap(), *first);
}

#[test]
fn stale_cache_is_recomputed() {
    let dir = tempfile::tempdir().unwrap();
    let (map, kernel) = two_rooms();
    let cold = analyze_map(&map, Box::new(kernel)).unwrap();

    let path = cache::cache_path(dir.path(), "two-rooms");
    std::fs::write(&path, [CACHE_FORMAT_VERSION.wrapping_add(1), 0, 0, 0]).unwrap();

    let (_, kernel) = two_rooms();
    let mut analyzer = AnalyzerBuilder::new(Box::new(kernel)).cache_dir(dir.path()).build();
    assert_eq!(*analyzer.analyze(&map).unwrap(), *cold);

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes[0], CACHE_FORMAT_VERSION);
    assert_eq!(cache::load_analysis(&path, "two-rooms").unwrap(), *cold);
}
