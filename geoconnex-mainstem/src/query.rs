//! Query input model.
//!
//! A query is exactly one of a point, a bounding box or a WKT geometry, in
//! EPSG:4326 longitude/latitude. Reprojection is the caller's job. A WKT
//! geometry resolves through its centroid.

use crate::error::ResolveError;
use serde::{Deserialize, Serialize};

/// A longitude/latitude point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
}

/// A `(minx, miny, maxx, maxy)` bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl Point {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Check the coordinates are finite and within geographic range.
    pub fn validate(&self) -> Result<(), ResolveError> {
        check_lon(self.lon)?;
        check_lat(self.lat)
    }

    /// Centroid of a WKT geometry, checked like any other point.
    pub fn from_wkt_centroid(wkt: &str) -> Result<Self, ResolveError> {
        let centroid = geoconnex_spatial::wkt_centroid(wkt)
            .map_err(|e| ResolveError::invalid_input(e.to_string()))?;
        let (lon, lat) = centroid.ok_or_else(|| {
            ResolveError::invalid_input("Got an empty centroid result for WKT")
        })?;
        let point = Self::new(lon, lat);
        point.validate()?;
        Ok(point)
    }
}

impl BoundingBox {
    pub fn new(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Self {
        Self {
            minx,
            miny,
            maxx,
            maxy,
        }
    }

    /// Check ranges and corner ordering.
    pub fn validate(&self) -> Result<(), ResolveError> {
        check_lon(self.minx)?;
        check_lat(self.miny)?;
        check_lon(self.maxx)?;
        check_lat(self.maxy)?;
        if self.minx > self.maxx {
            return Err(ResolveError::invalid_input(
                "Bbox minx must not be greater than maxx",
            ));
        }
        if self.miny > self.maxy {
            return Err(ResolveError::invalid_input(
                "Bbox miny must not be greater than maxy",
            ));
        }
        Ok(())
    }
}

fn check_lon(v: f64) -> Result<(), ResolveError> {
    if !v.is_finite() || !(-180.0..=180.0).contains(&v) {
        return Err(ResolveError::invalid_input(format!(
            "Longitude {v} is outside [-180, 180]"
        )));
    }
    Ok(())
}

fn check_lat(v: f64) -> Result<(), ResolveError> {
    if !v.is_finite() || !(-90.0..=90.0).contains(&v) {
        return Err(ResolveError::invalid_input(format!(
            "Latitude {v} is outside [-90, 90]"
        )));
    }
    Ok(())
}

/// A mainstem lookup request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MainstemQuery {
    Point(Point),
    BoundingBox(BoundingBox),
    /// WKT geometry, resolved through its centroid.
    Geometry(String),
}

impl MainstemQuery {
    /// Parse the transport parameters `point=lon,lat`,
    /// `bbox=minx,miny,maxx,maxy` and `wkt=<geometry>`.
    ///
    /// Exactly one must be present.
    pub fn from_params(
        point: Option<&str>,
        bbox: Option<&str>,
        wkt: Option<&str>,
    ) -> Result<Self, ResolveError> {
        let query = match (point, bbox, wkt) {
            (None, None, None) => {
                return Err(ResolveError::invalid_input(
                    "You must specify either a point, a bounding box or a WKT geometry to filter by",
                ))
            }
            (Some(p), None, None) => {
                let [lon, lat] = parse_coords::<2>(p).ok_or_else(|| {
                    ResolveError::invalid_input("Point must be specified as [longitude, latitude]")
                })?;
                MainstemQuery::Point(Point::new(lon, lat))
            }
            (None, Some(b), None) => {
                let [minx, miny, maxx, maxy] = parse_coords::<4>(b).ok_or_else(|| {
                    ResolveError::invalid_input(
                        "Bbox must be specified as [minx, miny, maxx, maxy]",
                    )
                })?;
                MainstemQuery::BoundingBox(BoundingBox::new(minx, miny, maxx, maxy))
            }
            (None, None, Some(w)) => MainstemQuery::Geometry(w.trim().to_string()),
            (Some(_), Some(_), None) => {
                return Err(ResolveError::invalid_input(
                    "You cannot specify both a point and a bounding box to filter by",
                ))
            }
            _ => {
                return Err(ResolveError::invalid_input(
                    "You cannot specify a WKT geometry together with a point or a bounding box",
                ))
            }
        };
        query.validate()?;
        Ok(query)
    }

    /// Validate coordinates. A geometry must parse and have a centroid.
    pub fn validate(&self) -> Result<(), ResolveError> {
        match self {
            MainstemQuery::Point(p) => p.validate(),
            MainstemQuery::BoundingBox(b) => b.validate(),
            MainstemQuery::Geometry(wkt) => Point::from_wkt_centroid(wkt).map(|_| ()),
        }
    }
}

/// Split on commas into exactly `N` numbers. Surrounding `[` `]` are allowed.
fn parse_coords<const N: usize>(s: &str) -> Option<[f64; N]> {
    let s = s.trim().trim_start_matches('[').trim_end_matches(']');
    let mut out = [0.0; N];
    let mut parts = s.split(',');
    for slot in out.iter_mut() {
        *slot = parts.next()?.trim().parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: ResolveError) -> String {
        match err {
            ResolveError::InvalidInput(m) => m,
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_point_params() {
        let q = MainstemQuery::from_params(Some("-105.2,40.1"), None, None).unwrap();
        assert_eq!(q, MainstemQuery::Point(Point::new(-105.2, 40.1)));
        let q = MainstemQuery::from_params(Some("[-105.2, 40.1]"), None, None).unwrap();
        assert_eq!(q, MainstemQuery::Point(Point::new(-105.2, 40.1)));
    }

    #[test]
    fn test_bbox_params() {
        let q = MainstemQuery::from_params(None, Some("-106,39,-105,40"), None).unwrap();
        assert_eq!(
            q,
            MainstemQuery::BoundingBox(BoundingBox::new(-106.0, 39.0, -105.0, 40.0))
        );
    }

    #[test]
    fn test_both_and_neither() {
        let both = MainstemQuery::from_params(Some("0,0"), Some("0,0,1,1"), None).unwrap_err();
        assert!(message(both).contains("cannot specify both"));
        let neither = MainstemQuery::from_params(None, None, None).unwrap_err();
        assert!(message(neither).contains("must specify either"));
    }

    #[test]
    fn test_arity_and_numbers() {
        for bad in ["1", "1,2,3", "", "a,b", "1,"] {
            let err = MainstemQuery::from_params(Some(bad), None, None).unwrap_err();
            assert!(message(err).starts_with("Point must be"), "input {bad:?}");
        }
        let err = MainstemQuery::from_params(None, Some("1,2,3"), None).unwrap_err();
        assert!(message(err).starts_with("Bbox must be"));
    }

    #[test]
    fn test_ranges_and_ordering() {
        assert!(MainstemQuery::from_params(Some("181,0"), None, None).is_err());
        assert!(MainstemQuery::from_params(Some("0,-91"), None, None).is_err());
        assert!(MainstemQuery::from_params(Some("NaN,0"), None, None).is_err());
        assert!(MainstemQuery::from_params(Some("inf,0"), None, None).is_err());
        let err = MainstemQuery::from_params(None, Some("2,0,1,1"), None).unwrap_err();
        assert!(message(err).contains("minx"));
        let err = MainstemQuery::from_params(None, Some("0,2,1,1"), None).unwrap_err();
        assert!(message(err).contains("miny"));
        // degenerate boxes are allowed
        assert!(MainstemQuery::from_params(None, Some("1,1,1,1"), None).is_ok());
    }

    #[test]
    fn test_wkt_params() {
        let wkt = "POLYGON((-105 40, -104.9 40, -104.9 40.1, -105 40.1, -105 40))";
        let q = MainstemQuery::from_params(None, None, Some(wkt)).unwrap();
        assert_eq!(q, MainstemQuery::Geometry(wkt.to_string()));

        let err = MainstemQuery::from_params(Some("0,0"), None, Some(wkt)).unwrap_err();
        assert!(message(err).contains("WKT geometry together"));
        let err = MainstemQuery::from_params(None, Some("0,0,1,1"), Some(wkt)).unwrap_err();
        assert!(message(err).contains("WKT geometry together"));
    }

    #[test]
    fn test_wkt_centroid_point() {
        let p = Point::from_wkt_centroid("LINESTRING(-105 40, -104 40)").unwrap();
        assert_eq!(p, Point::new(-104.5, 40.0));

        let err = Point::from_wkt_centroid("MULTIPOINT EMPTY").unwrap_err();
        assert!(message(err).contains("empty centroid"));
        let err = MainstemQuery::from_params(None, None, Some("POLYGON((0 0,")).unwrap_err();
        assert!(message(err).contains("WKT"));
        // centroid outside geographic range
        assert!(MainstemQuery::from_params(None, None, Some("POINT(200 0)")).is_err());
    }
}
