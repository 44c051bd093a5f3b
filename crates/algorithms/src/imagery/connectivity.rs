//! Connected pixel counting
//!
//! Labels each unmasked pixel with the size of the connected component of
//! equal-valued pixels it belongs to, capped at `max_size`.

use ndarray::Array2;
use statgis_core::{Error, Raster, Result};
use std::collections::VecDeque;

/// 4-neighbourhood offsets (N, W, E, S)
const N4_OFFSETS: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

/// 8-neighbourhood offsets, clockwise from N
const N8_OFFSETS: [(isize, isize); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

/// Size of each pixel's equal-valued connected component, capped at `max_size`.
///
/// Masked pixels neither join components nor receive a count.
///
/// # Arguments
/// * `raster` - Input raster, typically a 0/1 mask
/// * `max_size` - Upper bound of the reported size
/// * `eight_connected` - Use the 8-neighbourhood instead of the 4-neighbourhood
pub fn connected_pixel_count(raster: &Raster, max_size: usize, eight_connected: bool) -> Result<Raster> {
    if max_size == 0 {
        return Err(Error::InvalidParameter {
            name: "max_size",
            value: "0".into(),
            reason: "must be at least 1".into(),
        });
    }

    let offsets: &[(isize, isize)] = if eight_connected { &N8_OFFSETS } else { &N4_OFFSETS };
    let (rows, cols) = raster.shape();
    let mut visited = Array2::from_elem((rows, cols), false);
    let mut counts = Array2::from_elem((rows, cols), f64::NAN);
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
    let mut component: Vec<(usize, usize)> = Vec::new();

    for row in 0..rows {
        for col in 0..cols {
            if visited[(row, col)] {
                continue;
            }
            let value = unsafe { raster.get_unchecked(row, col) };
            if value.is_nan() {
                continue;
            }

            // BFS over the component seeded at (row, col)
            visited[(row, col)] = true;
            queue.push_back((row, col));
            component.clear();
            while let Some((r, c)) = queue.pop_front() {
                component.push((r, c));
                for &(dr, dc) in offsets {
                    let nr = r as isize + dr;
                    let nc = c as isize + dc;
                    if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                        continue;
                    }
                    let (nr, nc) = (nr as usize, nc as usize);
                    if visited[(nr, nc)] {
                        continue;
                    }
                    if unsafe { raster.get_unchecked(nr, nc) } == value {
                        visited[(nr, nc)] = true;
                        queue.push_back((nr, nc));
                    }
                }
            }

            let size = component.len().min(max_size) as f64;
            for &cell in &component {
                counts[cell] = size;
            }
        }
    }

    let mut output = raster.clone();
    *output.data_mut() = counts;
    Ok(output)
}
