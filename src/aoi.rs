//! Area of interest loading for extraction requests
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;

/// Property stripped from every feature before submission.
const DROPPED_PROPERTY: &str = "loaddate";

#[derive(Debug, Clone)]
pub struct Aoi {
    features: Vec<Feature>,
}

impl Aoi {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read AOI file {}", path.display()))?;
        let geojson: GeoJson = content
            .parse()
            .with_context(|| format!("{} is not a GeoJSON document", path.display()))?;
        Self::from_geojson(geojson)
    }

    pub fn from_geojson(geojson: GeoJson) -> Result<Self> {
        let features = match geojson {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(f) => vec![f],
            GeoJson::Geometry(g) => vec![Feature::from(g)],
        };

        let mut exploded = vec![];
        for mut feature in features {
            if let Some(props) = feature.properties.as_mut() {
                props.remove(DROPPED_PROPERTY);
            }
            let Some(geometry) = feature.geometry.take() else {
                continue;
            };
            for part in explode(geometry) {
                exploded.push(Feature {
                    bbox: None,
                    geometry: Some(part),
                    id: None,
                    properties: feature.properties.clone(),
                    foreign_members: None,
                });
            }
        }

        if exploded.is_empty() {
            return Err(anyhow!("AOI contains no geometries"));
        }
        Ok(Self { features: exploded })
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.features.clone(),
            foreign_members: None,
        }
    }
}

/// Splits multi-part geometries into their single parts.
fn explode(geometry: Geometry) -> Vec<Geometry> {
    match geometry.value {
        Value::MultiPolygon(polygons) => polygons
            .into_iter()
            .map(|p| Geometry::new(Value::Polygon(p)))
            .collect(),
        Value::MultiLineString(lines) => lines
            .into_iter()
            .map(|l| Geometry::new(Value::LineString(l)))
            .collect(),
        Value::MultiPoint(points) => points
            .into_iter()
            .map(|p| Geometry::new(Value::Point(p)))
            .collect(),
        Value::GeometryCollection(geometries) => {
            geometries.into_iter().flat_map(explode).collect()
        }
        value => vec![Geometry::new(value)],
    }
}

/// `<file stem>_<YYYYMMDD>`, where the stem is the file name up to its first dot.
pub fn task_name<P: AsRef<Path>>(path: P, date: NaiveDate) -> String {
    let file_name = path
        .as_ref()
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.split('.').next().unwrap_or_default();
    format!("{}_{}", stem, date.format("%Y%m%d"))
}
