//! Read-only R-tree over catchment envelopes.
//!
//! Queries run in two phases: an envelope prefilter on the R-tree, then (for
//! point queries) an exact boundary-inclusive refine against the polygon.
//!
//! # Ordering
//!
//! R-tree traversal order depends on bulk-load packing, so it is never
//! exposed. Point queries that match several catchments (overlapping source
//! polygons, or a point on a shared edge) return the lowest catchment id.
//! Box queries return ids in ascending order.
//!
//! A single best catchment for a box ([`CatchmentIndex::best_in_bbox`]) is
//! ranked: envelope fully inside the box first, then polygon actually
//! touching the box, then lowest id. Catchments tile the plane, so a box
//! drawn around one catchment always touches its neighbours' envelopes.

use crate::geometry::{BBox, GeometryStore};
use geo::Intersects;
use geo_types::{coord, Point, Rect};
use std::cmp::Reverse;
use rstar::{RTree, RTreeObject, AABB};

/// R-tree leaf: one catchment envelope plus its store slot.
#[derive(Debug, Clone)]
struct CatchmentEnvelope {
    slot: usize,
    id: i64,
    env: AABB<[f64; 2]>,
}

impl RTreeObject for CatchmentEnvelope {
    type Envelope = AABB<[f64; 2]>;

    #[inline]
    fn envelope(&self) -> Self::Envelope {
        self.env
    }
}

fn bbox_envelope(bbox: &BBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bbox.min_lng, bbox.min_lat], [bbox.max_lng, bbox.max_lat])
}

/// Index statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexStats {
    /// Indexed catchments.
    pub catchments: usize,

    /// Total polygon members across all catchments.
    pub polygons: usize,
}

/// Spatial index over a [`GeometryStore`].
///
/// Owns the store; built once and never mutated.
pub struct CatchmentIndex {
    store: GeometryStore,
    tree: RTree<CatchmentEnvelope>,
    stats: IndexStats,
}

impl CatchmentIndex {
    /// Bulk-load the index from a store.
    pub fn build(store: GeometryStore) -> Self {
        let mut polygons = 0;
        let envelopes: Vec<CatchmentEnvelope> = (0..store.len())
            .map(|slot| {
                let (catchment, meta) = store.slot(slot);
                polygons += catchment.geometry.0.len();
                CatchmentEnvelope {
                    slot,
                    id: catchment.id,
                    env: bbox_envelope(&meta.bbox),
                }
            })
            .collect();

        let stats = IndexStats {
            catchments: envelopes.len(),
            polygons,
        };
        let tree = RTree::bulk_load(envelopes);
        tracing::debug!(
            catchments = stats.catchments,
            polygons = stats.polygons,
            "catchment index built"
        );

        Self { store, tree, stats }
    }

    /// Catchment containing `(lng, lat)`, boundary inclusive.
    ///
    /// When several catchments contain the point the lowest id is returned.
    pub fn query_point(&self, lng: f64, lat: f64) -> Option<i64> {
        let point = Point::new(lng, lat);
        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([lng, lat]))
            .filter(|leaf| {
                let (catchment, _) = self.store.slot(leaf.slot);
                catchment.geometry.intersects(&point)
            })
            .map(|leaf| leaf.id)
            .min()
    }

    /// Catchments whose envelope intersects the box, ascending by id.
    pub fn query_box(&self, min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Vec<i64> {
        self.query_bbox(&BBox::new(min_lng, min_lat, max_lng, max_lat))
    }

    /// [`query_box`](Self::query_box) taking a [`BBox`].
    pub fn query_bbox(&self, bbox: &BBox) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .tree
            .locate_in_envelope_intersecting(&bbox_envelope(bbox))
            .map(|leaf| leaf.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Single best catchment for a box.
    ///
    /// Candidates are the envelope matches of [`query_bbox`](Self::query_bbox),
    /// ranked by: envelope contained in the box, polygon intersecting the
    /// box, lowest id.
    pub fn best_in_bbox(&self, bbox: &BBox) -> Option<i64> {
        let rect = Rect::new(
            coord! { x: bbox.min_lng, y: bbox.min_lat },
            coord! { x: bbox.max_lng, y: bbox.max_lat },
        );
        self.tree
            .locate_in_envelope_intersecting(&bbox_envelope(bbox))
            .map(|leaf| {
                let (catchment, meta) = self.store.slot(leaf.slot);
                let contained = bbox.contains_bbox(&meta.bbox);
                let touches = contained || catchment.geometry.intersects(&rect);
                (Reverse(contained), Reverse(touches), leaf.id)
            })
            .min()
            .map(|(_, _, id)| id)
    }

    /// The underlying geometry store.
    pub fn store(&self) -> &GeometryStore {
        &self.store
    }

    /// Number of indexed catchments.
    pub fn len(&self) -> usize {
        self.stats.catchments
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.stats.catchments == 0
    }

    /// Build statistics.
    pub fn stats(&self) -> IndexStats {
        self.stats
    }
}

impl std::fmt::Debug for CatchmentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatchmentIndex")
            .field("catchments", &self.stats.catchments)
            .field("polygons", &self.stats.polygons)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Catchment;

    fn square(id: i64, x0: f64, y0: f64, size: f64) -> Catchment {
        let (x1, y1) = (x0 + size, y0 + size);
        Catchment::from_wkt(
            id,
            &format!("POLYGON(({x0} {y0}, {x1} {y0}, {x1} {y1}, {x0} {y1}, {x0} {y0}))"),
        )
        .unwrap()
    }

    fn grid_index() -> CatchmentIndex {
        // 30 | 20  (two unit squares side by side, sharing the edge x = 1)
        // plus a triangle (10) whose envelope covers the square [4,6]x[0,2]
        let triangle = Catchment::from_wkt(10, "POLYGON((4 0, 6 0, 4 2, 4 0))").unwrap();
        let store = GeometryStore::new(vec![
            square(30, 0.0, 0.0, 1.0),
            square(20, 1.0, 0.0, 1.0),
            triangle,
        ])
        .unwrap();
        CatchmentIndex::build(store)
    }

    #[test]
    fn test_point_inside() {
        let index = grid_index();
        assert_eq!(index.query_point(0.5, 0.5), Some(30));
        assert_eq!(index.query_point(1.5, 0.5), Some(20));
        assert_eq!(index.query_point(4.2, 0.2), Some(10));
    }

    #[test]
    fn test_point_outside() {
        let index = grid_index();
        assert_eq!(index.query_point(-3.0, 7.0), None);
        // inside the triangle's envelope but outside its polygon
        assert_eq!(index.query_point(5.8, 1.8), None);
    }

    #[test]
    fn test_shared_boundary_lowest_id_wins() {
        let index = grid_index();
        assert_eq!(index.query_point(1.0, 0.5), Some(20));
        // corner shared by both squares
        assert_eq!(index.query_point(1.0, 1.0), Some(20));
    }

    #[test]
    fn test_overlapping_polygons_lowest_id_wins() {
        let store = GeometryStore::new(vec![
            square(9, 0.0, 0.0, 2.0),
            square(3, 1.0, 1.0, 2.0),
            square(5, 0.5, 0.5, 2.0),
        ])
        .unwrap();
        let index = CatchmentIndex::build(store);
        assert_eq!(index.query_point(1.5, 1.5), Some(3));
        assert_eq!(index.query_point(0.25, 0.25), Some(9));
    }

    #[test]
    fn test_box_query_sorted_envelope_matches() {
        let index = grid_index();
        assert_eq!(index.query_box(0.2, 0.2, 1.8, 0.8), vec![20, 30]);
        // touches only the triangle's envelope, not its polygon
        assert_eq!(index.query_box(5.5, 1.5, 5.9, 1.9), vec![10]);
        assert!(index.query_box(10.0, 10.0, 11.0, 11.0).is_empty());
    }

    #[test]
    fn test_best_in_box_prefers_contained_catchment() {
        let index = grid_index();
        // box drawn exactly around 20 also touches 30 along x = 1
        assert_eq!(index.query_box(1.0, 0.0, 2.0, 1.0), vec![20, 30]);
        assert_eq!(index.best_in_bbox(&BBox::new(1.0, 0.0, 2.0, 1.0)), Some(20));
        assert_eq!(index.best_in_bbox(&BBox::new(-0.5, -0.5, 1.2, 1.5)), Some(30));
    }

    #[test]
    fn test_best_in_box_prefers_real_polygon_overlap() {
        let store = GeometryStore::new(vec![
            Catchment::from_wkt(1, "POLYGON((4 0, 6 0, 4 2, 4 0))").unwrap(),
            square(2, 5.0, 1.0, 0.4),
        ])
        .unwrap();
        let index = CatchmentIndex::build(store);
        // both envelopes hit, neither contained; only 2's polygon overlaps
        assert_eq!(index.best_in_bbox(&BBox::new(5.2, 1.2, 6.0, 1.9)), Some(2));
    }

    #[test]
    fn test_best_in_box_lowest_id_among_equals() {
        let index = grid_index();
        assert_eq!(index.best_in_bbox(&BBox::new(0.5, 0.2, 1.5, 0.8)), Some(20));
        assert_eq!(index.best_in_bbox(&BBox::new(10.0, 10.0, 11.0, 11.0)), None);
    }

    #[test]
    fn test_degenerate_box_behaves_like_envelope_point() {
        let index = grid_index();
        assert_eq!(index.query_box(0.5, 0.5, 0.5, 0.5), vec![30]);
    }

    #[test]
    fn test_stats() {
        let index = grid_index();
        assert_eq!(index.len(), 3);
        assert_eq!(index.stats().polygons, 3);
        assert!(!index.is_empty());
    }
}
