use super::{feature_polygons, feature_property};
use crate::config::Settings;
use crate::http::get_feature_collection;
use anyhow::Result;
use geo::{MultiPolygon, Rect};
use geojson::FeatureCollection;
use reqwest::Client;
use serde_json::Value;
use url::Url;

/// A 12-digit hydrologic unit from the Watershed Boundary Dataset.
#[derive(Debug, Clone)]
pub struct Huc12 {
    pub huc12: String,
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

pub fn huc12s_from_collection(collection: &FeatureCollection) -> Vec<Huc12> {
    collection
        .features
        .iter()
        .filter_map(|f| {
            Some(Huc12 {
                huc12: feature_property(f, "huc12").unwrap_or_default().to_string(),
                name: feature_property(f, "name").unwrap_or_default().to_string(),
                geometry: feature_polygons(f)?,
            })
        })
        .collect()
}

/// Query url for one page of HUC12 units intersecting `bbox` (EPSG:4326).
pub fn huc12_query_url(base: &Url, bbox: Rect<f64>, offset: usize) -> Url {
    let envelope = format!(
        "{},{},{},{}",
        bbox.min().x,
        bbox.min().y,
        bbox.max().x,
        bbox.max().y
    );
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("geometry", &envelope)
        .append_pair("geometryType", "esriGeometryEnvelope")
        .append_pair("inSR", "4326")
        .append_pair("spatialRel", "esriSpatialRelIntersects")
        .append_pair("outFields", "huc12,name")
        .append_pair("orderByFields", "huc12")
        .append_pair("returnGeometry", "true")
        .append_pair("outSR", "4326")
        .append_pair("f", "geojson");
    if offset > 0 {
        url.query_pairs_mut()
            .append_pair("resultOffset", &offset.to_string());
    }
    url
}

/// ArcGIS flags a truncated result either at the top level of the collection
/// or inside its `properties` member.
pub fn exceeded_transfer_limit(collection: &FeatureCollection) -> bool {
    let Some(members) = &collection.foreign_members else {
        return false;
    };
    let flag = members.get("exceededTransferLimit").or_else(|| {
        members
            .get("properties")
            .and_then(|p| p.get("exceededTransferLimit"))
    });
    matches!(flag, Some(Value::Bool(true)))
}

/// HUC12 units intersecting `bbox` (EPSG:4326), following result pages until
/// the service stops reporting a truncated response.
pub async fn fetch_huc12_by_bbox(
    client: &Client,
    settings: &Settings,
    bbox: Rect<f64>,
) -> Result<Vec<Huc12>> {
    let mut huc12s = vec![];
    let mut offset = 0;
    loop {
        let url = huc12_query_url(&settings.wbd_huc12_query, bbox, offset);
        let page = get_feature_collection(client, url).await?;
        huc12s.extend(huc12s_from_collection(&page));

        if !exceeded_transfer_limit(&page) || page.features.is_empty() {
            break;
        }
        offset += page.features.len();
        tracing::debug!(offset, "HUC12 query truncated, fetching next page");
    }
    tracing::info!(count = huc12s.len(), "Fetched neighbouring HUC12s");
    Ok(huc12s)
}
