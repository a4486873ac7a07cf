//! Catchment geometry storage and metadata computation.
//!
//! This module provides:
//! - The [`Catchment`] record (id + polygon geometry)
//! - The immutable [`GeometryStore`] keyed by catchment id
//! - Precomputed metadata (bbox, centroid) for index construction
//! - WKT parsing for fixtures and ad hoc geometry input
//!
//! All coordinates are EPSG:4326 longitude/latitude; x is longitude.

use crate::error::{Result, SpatialError};
use geo::{BoundingRect, Centroid};
use geo_types::{Geometry, MultiPolygon};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in longitude/latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BBox {
    /// Create a new bounding box from `(minx, miny, maxx, maxy)`.
    pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
        Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    /// Degenerate box covering a single point.
    pub fn point(lng: f64, lat: f64) -> Self {
        Self::new(lng, lat, lng, lat)
    }

    /// Check if this bbox intersects another (shared edges count).
    pub fn intersects(&self, other: &BBox) -> bool {
        self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
            && self.min_lng <= other.max_lng
            && self.max_lng >= other.min_lng
    }

    /// Check if this bbox contains a point.
    pub fn contains_point(&self, lng: f64, lat: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }

    /// Check if this bbox fully contains another bbox.
    pub fn contains_bbox(&self, other: &BBox) -> bool {
        self.min_lat <= other.min_lat
            && self.max_lat >= other.max_lat
            && self.min_lng <= other.min_lng
            && self.max_lng >= other.max_lng
    }

    /// Compute from a multipolygon. `None` for empty geometry.
    pub fn from_geometry(geom: &MultiPolygon<f64>) -> Option<Self> {
        let rect = geom.bounding_rect()?;
        Some(Self {
            min_lng: rect.min().x,
            min_lat: rect.min().y,
            max_lng: rect.max().x,
            max_lat: rect.max().y,
        })
    }
}

/// A land-surface catchment: the area draining to one flowline segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Catchment {
    /// Catchment feature id (equal to the flowline COMID).
    pub id: i64,

    /// Catchment boundary.
    pub geometry: MultiPolygon<f64>,
}

impl Catchment {
    /// Create a catchment from any polygonal geometry.
    ///
    /// Polygons are wrapped as single-member multipolygons; other geometry
    /// types are rejected.
    pub fn new(id: i64, geometry: Geometry<f64>) -> Result<Self> {
        Ok(Self {
            id,
            geometry: into_multi_polygon(geometry)?,
        })
    }

    /// Create a catchment from WKT.
    pub fn from_wkt(id: i64, wkt: &str) -> Result<Self> {
        Self::new(id, parse_wkt(wkt)?)
    }
}

/// Precomputed per-catchment metadata.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CatchmentMetadata {
    /// Bounding box.
    pub bbox: BBox,

    /// Centroid as `(lng, lat)`, absent for degenerate rings.
    pub centroid: Option<(f64, f64)>,
}

impl CatchmentMetadata {
    /// Compute metadata for a catchment geometry.
    pub fn compute(geom: &MultiPolygon<f64>) -> Result<Self> {
        let bbox = BBox::from_geometry(geom)
            .ok_or_else(|| SpatialError::InvalidGeometry("empty polygon".into()))?;
        let centroid = geom.centroid().map(|c| (c.x(), c.y()));
        Ok(Self { bbox, centroid })
    }
}

/// Immutable collection of catchments keyed by id.
///
/// Built once from a reference dataset; there is no mutation API. Slots are
/// stable and are what the spatial index refers to.
#[derive(Debug, Default)]
pub struct GeometryStore {
    catchments: Vec<Catchment>,
    metadata: Vec<CatchmentMetadata>,
    by_id: FxHashMap<i64, usize>,
}

impl GeometryStore {
    /// Build a store, rejecting duplicate ids and empty geometries.
    pub fn new(catchments: Vec<Catchment>) -> Result<Self> {
        let mut by_id = FxHashMap::default();
        by_id.reserve(catchments.len());
        let mut metadata = Vec::with_capacity(catchments.len());

        for (slot, catchment) in catchments.iter().enumerate() {
            if by_id.insert(catchment.id, slot).is_some() {
                return Err(SpatialError::DuplicateCatchment(catchment.id));
            }
            let meta = CatchmentMetadata::compute(&catchment.geometry).map_err(|_| {
                SpatialError::InvalidGeometry(format!("catchment {} has no area", catchment.id))
            })?;
            metadata.push(meta);
        }

        Ok(Self {
            catchments,
            metadata,
            by_id,
        })
    }

    /// Get a catchment by id.
    pub fn get(&self, id: i64) -> Option<&Catchment> {
        self.by_id.get(&id).map(|&slot| &self.catchments[slot])
    }

    /// Get precomputed metadata by id.
    pub fn metadata(&self, id: i64) -> Option<&CatchmentMetadata> {
        self.by_id.get(&id).map(|&slot| &self.metadata[slot])
    }

    pub(crate) fn slot(&self, slot: usize) -> (&Catchment, &CatchmentMetadata) {
        (&self.catchments[slot], &self.metadata[slot])
    }

    /// Number of catchments.
    pub fn len(&self) -> usize {
        self.catchments.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.catchments.is_empty()
    }

    /// Iterate over all catchments in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Catchment> {
        self.catchments.iter()
    }
}

/// Parse WKT string to geo-types Geometry.
pub fn parse_wkt(wkt: &str) -> Result<Geometry<f64>> {
    use std::str::FromStr;
    wkt::Wkt::from_str(wkt)
        .map_err(|e| SpatialError::WktParse(format!("{:?}", e)))
        .and_then(|w| {
            w.try_into()
                .map_err(|e: wkt::conversion::Error| SpatialError::WktParse(format!("{:?}", e)))
        })
}

/// Centroid of a WKT geometry as `(lng, lat)`.
///
/// `None` when the geometry is empty and has no centroid.
pub fn wkt_centroid(wkt: &str) -> Result<Option<(f64, f64)>> {
    let geom = parse_wkt(wkt)?;
    Ok(geom.centroid().map(|c| (c.x(), c.y())))
}

/// Narrow a geometry to a multipolygon.
pub fn into_multi_polygon(geom: Geometry<f64>) -> Result<MultiPolygon<f64>> {
    match geom {
        Geometry::Polygon(p) => Ok(MultiPolygon::new(vec![p])),
        Geometry::MultiPolygon(mp) => Ok(mp),
        Geometry::Rect(r) => Ok(MultiPolygon::new(vec![r.to_polygon()])),
        other => Err(SpatialError::InvalidGeometry(format!(
            "catchments must be polygonal, found {}",
            geometry_kind(&other)
        ))),
    }
}

fn geometry_kind(geom: &Geometry<f64>) -> &'static str {
    match geom {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        _ => "Geometry",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_polygon() {
        let wkt = "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))";
        let geom = parse_wkt(wkt).unwrap();
        assert!(matches!(geom, Geometry::Polygon(_)));
    }

    #[test]
    fn test_wkt_centroid() {
        let c = wkt_centroid("POLYGON((0 0, 2 0, 2 2, 0 2, 0 0))").unwrap();
        assert_eq!(c, Some((1.0, 1.0)));
        let c = wkt_centroid("LINESTRING(0 0, 4 0)").unwrap();
        assert_eq!(c, Some((2.0, 0.0)));
        assert_eq!(wkt_centroid("MULTIPOINT EMPTY").unwrap(), None);
        assert!(matches!(
            wkt_centroid("POLYGON((0 0, 1"),
            Err(SpatialError::WktParse(_))
        ));
    }

    #[test]
    fn test_bbox_computation() {
        let c = Catchment::from_wkt(1, "POLYGON((0 0, 10 0, 10 20, 0 20, 0 0))").unwrap();
        let bbox = BBox::from_geometry(&c.geometry).unwrap();
        assert_eq!(bbox.min_lng, 0.0);
        assert_eq!(bbox.max_lng, 10.0);
        assert_eq!(bbox.min_lat, 0.0);
        assert_eq!(bbox.max_lat, 20.0);
    }

    #[test]
    fn test_bbox_edge_touch_intersects() {
        let a = BBox::new(0.0, 0.0, 1.0, 1.0);
        let b = BBox::new(1.0, 0.0, 2.0, 1.0);
        let c = BBox::new(1.5, 1.5, 2.0, 2.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains_point(1.0, 0.5));
        assert!(BBox::new(-1.0, -1.0, 3.0, 3.0).contains_bbox(&a));
    }

    #[test]
    fn test_rejects_non_polygonal() {
        let err = Catchment::from_wkt(7, "LINESTRING(0 0, 1 1)").unwrap_err();
        assert!(matches!(err, SpatialError::InvalidGeometry(_)));
    }

    #[test]
    fn test_store_rejects_duplicate_ids() {
        let a = Catchment::from_wkt(1, "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))").unwrap();
        let b = Catchment::from_wkt(1, "POLYGON((2 2, 3 2, 3 3, 2 3, 2 2))").unwrap();
        let err = GeometryStore::new(vec![a, b]).unwrap_err();
        assert!(matches!(err, SpatialError::DuplicateCatchment(1)));
    }

    #[test]
    fn test_store_lookup_and_centroid() {
        let a = Catchment::from_wkt(42, "POLYGON((0 0, 2 0, 2 2, 0 2, 0 0))").unwrap();
        let store = GeometryStore::new(vec![a]).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(42).map(|c| c.id), Some(42));
        assert!(store.get(43).is_none());
        let meta = store.metadata(42).unwrap();
        assert_eq!(meta.centroid, Some((1.0, 1.0)));
    }

    #[test]
    fn test_store_rejects_empty_geometry() {
        let empty = Catchment {
            id: 5,
            geometry: MultiPolygon::new(vec![]),
        };
        let err = GeometryStore::new(vec![empty]).unwrap_err();
        assert!(matches!(err, SpatialError::InvalidGeometry(_)));
    }
}
