use super::{feature_polygons, feature_property};
use crate::config::Settings;
use crate::error::FetchError;
use crate::http::get_feature_collection;
use anyhow::Result;
use geo::MultiPolygon;
use geojson::FeatureCollection;
use reqwest::Client;

const NON_CONTIGUOUS: [&str; 2] = ["Alaska", "Hawaii"];

#[derive(Debug, Clone)]
pub struct State {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

pub fn validate_state_count(count: u32) -> Result<(), FetchError> {
    match count {
        48 | 50 => Ok(()),
        _ => Err(FetchError::InvalidStateCount(count)),
    }
}

/// All 50 states, or only the contiguous 48.
pub fn select_states(collection: &FeatureCollection, count: u32) -> Result<Vec<State>, FetchError> {
    validate_state_count(count)?;
    let states = collection
        .features
        .iter()
        .filter_map(|f| {
            let name = feature_property(f, "NAME_1").unwrap_or_default();
            if count == 48 && NON_CONTIGUOUS.contains(&name) {
                return None;
            }
            Some(State {
                name: name.to_string(),
                geometry: feature_polygons(f)?,
            })
        })
        .collect();
    Ok(states)
}

pub async fn fetch_us_states(client: &Client, settings: &Settings, count: u32) -> Result<Vec<State>> {
    validate_state_count(count)?;
    let collection = get_feature_collection(client, settings.us_states_url.clone()).await?;
    Ok(select_states(&collection, count)?)
}
