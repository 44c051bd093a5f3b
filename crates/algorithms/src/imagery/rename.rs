//! Band renaming for sensor products

use statgis_core::{Collection, Frame, Result};

/// Select `native` bands and give them `renamed` names, pairwise.
///
/// Bands not listed in `native` are dropped.
pub fn rename_bands(frame: &Frame, native: &[&str], renamed: &[&str]) -> Result<Frame> {
    frame.rename(native, renamed)
}

/// [`rename_bands`] over every frame of a collection
pub fn rename_collection(collection: &Collection, native: &[&str], renamed: &[&str]) -> Result<Collection> {
    collection.map(|frame| frame.rename(native, renamed))
}
