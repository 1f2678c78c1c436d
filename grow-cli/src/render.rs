use grow_core::{grid::OccupancyGrid, stack::LayerStack, types::Cell};
use std::fmt::Write;

const OCCUPIED: char = '#';
const SEED: char = 'S';
const VOID: char = 'o';
const EMPTY: char = '.';

/// ASCII plan of one layer, highest row first so north is up.
pub fn render_layer(grid: &OccupancyGrid, seeds: &[Cell], voids: &[Cell]) -> String {
    let mut out = String::with_capacity((grid.cols() + 1) * grid.rows());
    for y in (0..grid.rows() as i32).rev() {
        for x in 0..grid.cols() as i32 {
            let c = Cell::new(x, y);
            let ch = if grid.is_alive(x, y) {
                if seeds.contains(&c) { SEED } else { OCCUPIED }
            } else if voids.contains(&c) {
                VOID
            } else {
                EMPTY
            };
            out.push(ch);
        }
        out.push('\n');
    }
    out
}

/// Every layer with its report line, followed by the run totals.
pub fn render_stack(stack: &LayerStack) -> String {
    let mut out = String::new();
    for (grid, report) in stack.layers.iter().zip(&stack.reports) {
        let _ = writeln!(
            out,
            "layer {} ({}): {} cells, placed {}/{}, extra {}, pruned {}{}",
            report.index,
            report.function,
            report.final_count,
            report.placed,
            report.target,
            report.extra_placed,
            report.pruned,
            if report.min_reached { "" } else { ", below minimum" },
        );
        out.push_str(&render_layer(grid, &stack.seeds, &stack.voids));
        out.push('\n');
    }
    let _ = writeln!(out, "total cells: {}", stack.total_cells());
    let _ = writeln!(out, "vertical voids: {}", stack.void_count());
    out
}
