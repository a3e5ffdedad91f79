//! Cross-tile deduplication of visible features
//!
//! A logical feature that straddles tile boundaries is stored as one fragment per tile. This
//! module walks the resident tiles in collaborator order and reports each logical feature at
//! most once.
//!
//! # First tile wins
//!
//! Once a fragment of a feature has been judged visible, later fragments with the same
//! identifier are skipped without re-testing visibility. Tiles have no priority: the first
//! visible fragment in iteration order is the one reported.

use crate::{Feature, FeatureId, Frustum, Result, Tile, TileSpace, visibility};
use std::collections::HashSet;

/// How a feature is identified for deduplication
///
/// Resolution order is total and fixed: the configured unique-id property (when it holds a
/// number or a string), then the geometry-level id, then [`FeatureIdentity::Anonymous`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeatureIdentity {
    Keyed(FeatureId),
    /// No usable identifier; the feature is never deduplicated
    Anonymous,
}

impl FeatureIdentity {
    pub fn resolve(feature: &Feature, unique_id_property: &str) -> Self {
        feature
            .property(unique_id_property)
            .and_then(FeatureId::from_json)
            .or_else(|| feature.id.clone())
            .map_or(Self::Anonymous, Self::Keyed)
    }
}

/// Counters collected during one deduplication pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    /// Tiles walked
    pub tiles: usize,
    /// Features whose visibility was tested
    pub tested: usize,
    /// Fragments skipped because their identifier was already accepted
    pub duplicates: usize,
    /// Features reported
    pub accepted: usize,
}

/// Query-scoped deduplicator
///
/// Holds the set of accepted identifiers for a single query; create a new one per query.
#[derive(Debug)]
pub struct FeatureDeduplicator<'a> {
    space: TileSpace,
    frustum: &'a Frustum,
    unique_id_property: &'a str,
    accepted_ids: HashSet<FeatureId>,
    stats: DedupStats,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<'a> FeatureDeduplicator<'a> {
    pub fn new(space: TileSpace, frustum: &'a Frustum, unique_id_property: &'a str) -> Self {
        Self {
            space,
            frustum,
            unique_id_property,
            accepted_ids: HashSet::new(),
            stats: DedupStats::default(),
        }
    }

    /// Append the newly visible features of `tile` to `out`, in within-tile order
    pub fn push_tile<'t>(&mut self, tile: &'t Tile, out: &mut Vec<&'t Feature>) -> Result<()> {
        let transform = self.space.transform_for(tile.coord());
        self.stats.tiles += 1;

        for feature in &tile.content {
            let identity = FeatureIdentity::resolve(feature, self.unique_id_property);

            if let FeatureIdentity::Keyed(id) = &identity {
                if self.accepted_ids.contains(id) {
                    self.stats.duplicates += 1;
                    continue;
                }
            }

            self.stats.tested += 1;
            if !visibility::is_geometry_visible(&feature.geometry, &transform, self.frustum)? {
                continue;
            }

            if let FeatureIdentity::Keyed(id) = identity {
                self.accepted_ids.insert(id);
            }
            self.stats.accepted += 1;
            out.push(feature);
        }

        tracing::trace!(
            "Tile {}/{}/{}: {} features, {} accepted so far",
            tile.z,
            tile.x,
            tile.y,
            tile.content.len(),
            self.stats.accepted
        );

        Ok(())
    }

    /// Visible, deduplicated features of all `tiles`, in tile order then within-tile order
    pub fn run<'t>(mut self, tiles: &'t [Tile]) -> Result<(Vec<&'t Feature>, DedupStats)> {
        let mut out = Vec::new();
        for tile in tiles {
            self.push_tile(tile, &mut out)?;
        }
        Ok((out, self.stats))
    }

    #[inline]
    pub fn stats(&self) -> DedupStats {
        self.stats
    }
}
