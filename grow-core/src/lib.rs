//! Core layered organic-growth library.
//!
//! Main components:
//! - [`grid`] — per-layer occupancy grids, the shared grid frame and
//!   breadth-first search.
//! - [`geometry`] — the geometry oracle seam and a planar reference oracle.
//! - [`constraints`] — boundary, membrane, outer-line and obstacle legality.
//! - [`attractor`] — point and line attractors forming the growth field.
//! - [`influence_map`] — per-cell cache of summed growth-field influence.
//! - [`shape`] — smoothness and convexity heuristics.
//! - [`light`] — light distance to the nearest empty cell.
//! - [`voids`] — vertical voids carried from the base layer upwards.
//! - [`selection`] — tagged scores and weighted roulette selection.
//! - [`engine`] — candidate discovery, hard filters and scoring.
//! - [`phases`] — the per-layer growth and repair pipeline.
//! - [`stack`] — seeds, layer plans and whole-stack orchestration.
//! - [`config`] — configuration and its validation.
//! - [`error`] — setup errors.
//! - [`rng`] — seedable random number generation.
//! - [`types`] — shared cell types and neighbor offsets.

pub mod attractor;
pub mod config;
pub mod constraints;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod influence_map;
pub mod light;
pub mod phases;
pub mod rng;
pub mod selection;
pub mod shape;
pub mod stack;
pub mod types;
pub mod voids;
