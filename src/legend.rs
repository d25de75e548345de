//! Non-core convenience for building the comma-joined biome legend string
//! that becomes a land-cover layer's metadata (spec.md §3, §6). Kept
//! separate from the C1-C6 pipeline since legend *parsing* is out of scope
//! for the core (spec.md §1); this module only turns an already-parsed
//! index->name table into the metadata bytes and a remap table, matching
//! `original_source/landcover.py`'s `set_legend`.

use crate::error::{GeomgError, Result};

/// `legend[i]` gives the biome index `i`'s 1-based position in the sorted,
/// deduplicated legend (0 = unassigned). Applying this to a land-cover
/// raster's raw byte values remaps them to dense 1-based biome indices.
pub struct Legend {
    pub metadata: Vec<u8>,
    pub remap: [u8; 256],
}

/// Builds a [`Legend`] from `(index, biome_name)` pairs (one per legend
/// line, spec.md §6). Biome names are sorted lexicographically before
/// assignment for determinism (spec.md §9 open question 2: the original's
/// first-seen-order assignment from a `np.unique` scan is not guaranteed
/// stable across toolchains).
pub fn build_legend(entries: &[(u8, String)]) -> Result<Legend> {
    if entries.is_empty() {
        return Err(GeomgError::InvalidInput("legend has no entries".into()));
    }
    for (_, name) in entries {
        if name.len() > 64 {
            return Err(GeomgError::InvalidInput(format!(
                "biome name '{name}' exceeds 64 characters"
            )));
        }
        if name.contains(',') {
            return Err(GeomgError::InvalidInput(format!(
                "biome name '{name}' contains a comma, which would corrupt the joined metadata"
            )));
        }
    }

    let mut names: Vec<&str> = entries.iter().map(|(_, n)| n.as_str()).collect();
    names.sort_unstable();
    names.dedup();

    let mut remap = [0u8; 256];
    for (idx, name) in entries {
        let pos = names.binary_search(&name.as_str()).unwrap();
        remap[*idx as usize] = (pos + 1) as u8;
    }

    let metadata = names.join(",").into_bytes();
    Ok(Legend { metadata, remap })
}
