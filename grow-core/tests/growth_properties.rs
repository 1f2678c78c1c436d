use glam::DVec2;
use grow_core::{
    attractor::{GrowthAttractor, GrowthField},
    config::GrowthConfig,
    constraints::SpatialConstraints,
    engine::{GrowthEngine, LayerContext},
    geometry::{PlanarOracle, PlanarShape},
    grid::OccupancyGrid,
    light::distance_to_void,
    rng::create_rng,
    selection::Score,
    types::{Cell, CellState},
};
use rand::Rng;

fn config(grow: usize, min: usize, max: usize) -> GrowthConfig {
    GrowthConfig {
        cell_size: 1.0,
        growth_per_layer: vec![grow],
        min_cells_per_layer: vec![min],
        max_cells_per_layer: vec![max],
        ..GrowthConfig::default()
    }
}

/// Square site whose boundary runs from the origin to `size`.
fn square_site(size: f64, config: &GrowthConfig) -> SpatialConstraints<PlanarOracle> {
    let boundary = PlanarShape::rectangle(DVec2::ZERO, DVec2::splat(size));
    SpatialConstraints::new(PlanarOracle, boundary, config).unwrap()
}

fn seeded_grid(engine: &GrowthEngine<'_, PlanarOracle>) -> OccupancyGrid {
    let mut grid = engine.new_grid();
    for s in engine.seeds() {
        grid.set(s.x, s.y, CellState::Occupied);
    }
    grid
}

fn is_seed_connected(engine: &GrowthEngine<'_, PlanarOracle>, grid: &OccupancyGrid) -> bool {
    match engine.live_seed(grid) {
        Some(s) => grid.connected_component(s.x, s.y).len() == grid.alive_count(),
        None => grid.alive_count() == 0,
    }
}

fn random_grid<R: Rng>(cols: usize, rows: usize, fill: f64, rng: &mut R) -> OccupancyGrid {
    let mut grid = OccupancyGrid::with_size(cols, rows);
    for y in 0..rows as i32 {
        for x in 0..cols as i32 {
            if rng.random_bool(fill) {
                grid.set(x, y, CellState::Occupied);
            }
        }
    }
    grid
}

#[test]
fn single_seed_grows_exactly_the_requested_cells() {
    let cfg = config(4, 0, 400);
    let constraints = square_site(9.0, &cfg);
    assert_eq!((constraints.cols(), constraints.rows()), (10, 10));

    let engine =
        GrowthEngine::new(&cfg, &constraints, &GrowthField::new(), vec![Cell::new(5, 5)]).unwrap();
    let ctx = LayerContext::base("Living");

    for seed in 0..20 {
        let mut rng = create_rng(seed);
        let mut grid = seeded_grid(&engine);
        let before = grid.alive_count();

        let outcome = engine.growth_phase(&mut grid, &ctx, 4, &mut rng);
        assert_eq!(outcome.placed, 4);
        assert_eq!(grid.alive_count(), before + 4);
        assert!(is_seed_connected(&engine, &grid));
        for c in grid.alive_cells() {
            if c != Cell::new(5, 5) {
                assert!(grid.has_alive_neighbor_4(c.x, c.y));
            }
        }

        let mut layer = seeded_grid(&engine);
        let report = engine.grow_layer(&mut layer, &ctx, &mut rng);
        assert_eq!(report.final_count, 5);
    }
}

#[test]
fn every_placement_keeps_the_grid_connected() {
    let cfg = config(1, 0, 400);
    let constraints = square_site(14.0, &cfg);
    let engine = GrowthEngine::new(
        &cfg,
        &constraints,
        &GrowthField::new(),
        vec![Cell::new(7, 7), Cell::new(8, 7)],
    )
    .unwrap();
    let ctx = LayerContext::base("Work");
    let mut rng = create_rng(99);
    let mut grid = seeded_grid(&engine);

    for _ in 0..60 {
        let outcome = engine.growth_phase(&mut grid, &ctx, 1, &mut rng);
        assert!(is_seed_connected(&engine, &grid));
        if outcome.starved {
            break;
        }
    }
    assert!(grid.alive_count() > 20);
}

#[test]
fn legality_gate_excludes_every_constraint_kind() {
    let cfg = config(1, 0, 400);
    let mut constraints = square_site(20.0, &cfg);
    constraints.add_membrane(PlanarShape::rectangle(
        DVec2::new(10.0, 10.0),
        DVec2::new(14.0, 14.0),
    ));
    constraints.add_obstacle(PlanarShape::segment(
        DVec2::new(3.2, 0.0),
        DVec2::new(3.2, 6.0),
    ));
    constraints.add_outer_line(PlanarShape::segment(
        DVec2::new(0.0, 18.2),
        DVec2::new(20.0, 18.2),
    ));

    for y in 0..constraints.rows() as i32 {
        for x in 0..constraints.cols() as i32 {
            let center = constraints.frame().cell_center(x, y);
            let outside = center.x > 20.0 || center.y > 20.0;
            let in_membrane = (10.0..=14.0).contains(&center.x) && (10.0..=14.0).contains(&center.y);
            if outside || in_membrane {
                assert!(!constraints.is_allowed(x, y), "({x}, {y})");
            }
        }
    }
    for c in [(-1, 0), (0, -1), (21, 3), (3, 21)] {
        assert!(!constraints.is_allowed(c.0, c.1));
    }
    // Columns 2 and 3 sit within one cell of the obstacle.
    assert!(!constraints.is_allowed(2, 3));
    assert!(!constraints.is_allowed(3, 3));
    assert!(constraints.is_allowed(5, 3));
    // Row 18 is 0.3 from the outer line, row 17 0.7.
    assert!(!constraints.is_allowed(5, 18));
    assert!(constraints.is_allowed(5, 17));
}

#[test]
fn tentative_placement_round_trips_exactly() {
    let mut rng = create_rng(3);
    for _ in 0..10 {
        let mut grid = random_grid(9, 7, 0.45, &mut rng);
        let before = grid.clone();
        for y in -1..8 {
            for x in -1..10 {
                for state in [CellState::Occupied, CellState::Empty] {
                    let probe = grid.tentative(x, y, state);
                    let _ = distance_to_void(&probe, x, y);
                    drop(probe);
                    assert_eq!(grid, before);
                }
            }
        }
    }
}

#[test]
fn light_distance_is_stable_and_lit_at_the_border() {
    let mut rng = create_rng(4);
    for _ in 0..10 {
        let grid = random_grid(12, 9, 0.8, &mut rng);
        for y in 0..9 {
            assert_eq!(distance_to_void(&grid, 0, y), Some(1));
            assert_eq!(distance_to_void(&grid, 11, y), Some(1));
            for x in 0..12 {
                assert_eq!(distance_to_void(&grid, x, y), distance_to_void(&grid, x, y));
            }
        }
    }
}

#[test]
fn hard_blockade_vetoes_a_cell_across_many_trials() {
    let cfg = GrowthConfig {
        max_grow_attempts: 50,
        ..config(8, 12, 400)
    };
    let constraints = square_site(4.0, &cfg);
    let field = GrowthField::from_attractors(vec![GrowthAttractor::point(
        DVec2::new(0.5, 0.5),
        -10.0,
        1.5,
    )])
    .unwrap();
    let engine = GrowthEngine::new(&cfg, &constraints, &field, vec![Cell::new(1, 1)]).unwrap();
    let ctx = LayerContext::base("Living");

    // The cell is otherwise placeable next to an occupied neighbor.
    let mut primed = seeded_grid(&engine);
    primed.set(1, 0, CellState::Occupied);
    assert!(engine.can_place(&mut primed, 0, 0, &ctx));
    assert_eq!(engine.score_candidate(&mut primed, 0, 0, &ctx), Score::Blocked);

    let mut rng = create_rng(2024);
    for trial in 0..1000 {
        let mut grid = seeded_grid(&engine);
        let report = engine.grow_layer(&mut grid, &ctx, &mut rng);
        assert!(grid.is_empty(0, 0), "trial {trial} placed the blockaded cell");
        assert!(report.final_count > 1);
    }
}

#[test]
fn strict_support_over_an_empty_layer_adds_nothing() {
    let cfg = GrowthConfig {
        layer_growth_freedom: 0.05,
        ..config(10, 5, 400)
    };
    let constraints = square_site(12.0, &cfg);
    let engine = GrowthEngine::new(
        &cfg,
        &constraints,
        &GrowthField::new(),
        vec![Cell::new(6, 6), Cell::new(7, 6)],
    )
    .unwrap();
    let lower = engine.new_grid();
    let ctx = LayerContext::above(1, "Living", &lower);
    let mut rng = create_rng(8);

    let mut empty = engine.new_grid();
    let outcome = engine.growth_phase(&mut empty, &ctx, 10, &mut rng);
    assert_eq!(outcome.placed, 0);
    assert_eq!(empty.alive_count(), 0);

    let mut grid = seeded_grid(&engine);
    let report = engine.grow_layer(&mut grid, &ctx, &mut rng);
    assert_eq!(report.placed, 0);
    assert_eq!(report.extra_placed, 0);
    assert!(!report.min_reached);
    assert_eq!(grid.alive_count(), 2);
}

#[test]
fn forced_pruning_never_fragments() {
    for seed in 0..12u64 {
        let mut rng = create_rng(seed);
        let cfg = GrowthConfig {
            max_line: rng.random_range(2..=6),
            ..config(45, 0, 400)
        };
        let constraints = square_site(16.0, &cfg);
        let start = Cell::new(rng.random_range(4..12), rng.random_range(4..12));
        let engine =
            GrowthEngine::new(&cfg, &constraints, &GrowthField::new(), vec![start]).unwrap();
        let mut grid = seeded_grid(&engine);
        engine.grow_layer(&mut grid, &LayerContext::base("Industry"), &mut rng);
        assert!(grid.alive_count() > 10);

        while let Some(removed) = engine.prune_step(&mut grid) {
            assert_ne!(removed, start);
            assert!(is_seed_connected(&engine, &grid), "seed {seed} split after removing {removed}");
        }
        assert_eq!(grid.all_alive_cells(), vec![start]);
    }
}
