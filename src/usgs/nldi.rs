use super::feature_polygons;
use crate::config::Settings;
use crate::http::get_feature_collection;
use anyhow::{anyhow, Result};
use geo::MultiPolygon;
use geojson::FeatureCollection;
use reqwest::Client;

/// Upstream contributing area of a gauge site.
#[derive(Debug, Clone)]
pub struct Basin {
    pub collection: FeatureCollection,
    pub geometry: MultiPolygon<f64>,
}

impl Basin {
    pub fn from_collection(collection: FeatureCollection) -> Result<Self> {
        let polygons = collection
            .features
            .iter()
            .filter_map(feature_polygons)
            .flat_map(|mp| mp.0)
            .collect::<Vec<_>>();
        if polygons.is_empty() {
            return Err(anyhow!("Basin response contains no polygons"));
        }
        Ok(Self {
            collection,
            geometry: MultiPolygon::new(polygons),
        })
    }
}

pub async fn fetch_upstream_basin(client: &Client, settings: &Settings, site: &str) -> Result<Basin> {
    let url = settings
        .nldi_api
        .join(&format!("nwissite/USGS-{}/basin", site))?;
    let collection = get_feature_collection(client, url).await?;
    Basin::from_collection(collection)
}
