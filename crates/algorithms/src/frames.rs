//! Frame-parallel helpers over collections

use crate::maybe_rayon::*;
use statgis_core::{Collection, Frame, Result};

/// Apply `f` to every frame, in parallel when the `parallel` feature is on.
///
/// Output order matches input order; the first error encountered is returned.
pub(crate) fn map_frames<F>(collection: &Collection, f: F) -> Result<Collection>
where
    F: Fn(&Frame) -> Result<Frame> + Sync + Send,
{
    let frames = collection.frames();
    let mapped: Vec<Frame> = (0..frames.len())
        .into_par_iter()
        .map(|i| f(&frames[i]))
        .collect::<Result<Vec<_>>>()?;
    Ok(Collection::from_frames(mapped))
}

/// Flatten per-row buffers into row-major cell order
pub(crate) fn rows_to_vec(rows: Vec<Vec<f64>>) -> Vec<f64> {
    rows.into_iter().flatten().collect()
}
