//! USGS hydrology web services
use geo::{Geometry, MultiPolygon};
use geojson::Feature;

pub mod nldi;
pub mod nwis;
pub mod states;
pub mod wbd;

/// Polygonal geometry of a feature; other geometry types yield `None`.
pub fn feature_polygons(feature: &Feature) -> Option<MultiPolygon<f64>> {
    let geometry = Geometry::<f64>::try_from(feature.geometry.clone()?).ok()?;
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p])),
        Geometry::MultiPolygon(mp) => Some(mp),
        _ => None,
    }
}

pub fn feature_property<'a>(feature: &'a Feature, name: &str) -> Option<&'a str> {
    feature.properties.as_ref()?.get(name)?.as_str()
}
