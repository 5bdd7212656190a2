//! Gauge site, upstream basin and neighbouring HUC12s
use crate::config::Settings;
use crate::render;
use crate::usgs::nldi::{fetch_upstream_basin, Basin};
use crate::usgs::nwis::{fetch_site_info, SiteInfo};
use crate::usgs::states::{fetch_us_states, validate_state_count};
use crate::usgs::wbd::{fetch_huc12_by_bbox, Huc12};
use anyhow::{anyhow, Result};
use geo::BoundingRect;
use geojson::GeoJson;
use reqwest::Client;
use std::fs;
use std::path::{Path, PathBuf};

pub struct BasinOptions {
    pub site: String,
    pub output_dir: PathBuf,
    pub states: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct Basins {
    pub info: SiteInfo,
    pub basin: Basin,
    pub neighbors: Vec<Huc12>,
}

pub fn basin_path(output_dir: &Path, site: &str) -> PathBuf {
    output_dir.join(format!("basin_{}.json", site))
}

pub fn map_path(output_dir: &Path, site: &str) -> PathBuf {
    output_dir.join(format!("map_basins_{}.png", site))
}

pub fn save_basin<P: AsRef<Path>>(basin: &Basin, path: P) -> Result<()> {
    let geojson = GeoJson::FeatureCollection(basin.collection.clone());
    fs::write(path, serde_json::to_string_pretty(&geojson)?)?;
    Ok(())
}

/// Fetches site metadata, the upstream basin and the HUC12s within the basin's
/// bounding box. The basin is also written to `basin_<site>.json`.
pub async fn get_basins(
    client: &Client,
    settings: &Settings,
    site: &str,
    output_dir: &Path,
) -> Result<Basins> {
    let info = fetch_site_info(client, settings, site).await?;
    let basin = fetch_upstream_basin(client, settings, site).await?;

    fs::create_dir_all(output_dir)?;
    let path = basin_path(output_dir, site);
    save_basin(&basin, &path)?;
    tracing::info!(file = %path.display(), "Saved upstream basin");

    let bbox = basin
        .geometry
        .bounding_rect()
        .ok_or(anyhow!("Upstream basin has no extent"))?;
    let neighbors = fetch_huc12_by_bbox(client, settings, bbox).await?;

    Ok(Basins {
        info,
        basin,
        neighbors,
    })
}

/// Runs the basin flow end to end and returns the path of the rendered map.
/// Options are checked before any request is made or file written.
pub async fn run(settings: &Settings, options: &BasinOptions) -> Result<PathBuf> {
    validate_state_count(options.states)?;

    let client = Client::new();
    let basins = get_basins(&client, settings, &options.site, &options.output_dir).await?;
    let states = fetch_us_states(&client, settings, options.states).await?;

    let path = map_path(&options.output_dir, &options.site);
    render::render_basin_map(&basins, &states, options.width, options.height)?.save(&path)?;
    tracing::info!(file = %path.display(), title = %basins.info.station_nm, "Rendered basin map");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_paths() {
        let dir = Path::new("out");
        assert_eq!(basin_path(dir, "07340300"), dir.join("basin_07340300.json"));
        assert_eq!(map_path(dir, "07340300"), dir.join("map_basins_07340300.png"));
    }

    #[tokio::test]
    async fn test_run_rejects_state_count_first() {
        let dir = tempfile::tempdir().unwrap();
        let options = BasinOptions {
            site: "07340300".to_string(),
            output_dir: dir.path().to_path_buf(),
            states: 49,
            width: 200,
            height: 100,
        };
        let err = run(&Settings::default(), &options).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::error::FetchError>(),
            Some(crate::error::FetchError::InvalidStateCount(49))
        ));
        assert!(!basin_path(dir.path(), "07340300").exists());
    }

    #[tokio::test]
    async fn test_get_basins_rejects_bad_site_code() {
        let dir = tempfile::tempdir().unwrap();
        let err = get_basins(&Client::new(), &Settings::default(), "7340300", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::error::FetchError>(),
            Some(crate::error::FetchError::InvalidSiteCode(_))
        ));
        assert!(!basin_path(dir.path(), "7340300").exists());
    }

    #[test]
    fn test_save_basin() {
        let dir = tempfile::tempdir().unwrap();
        let geojson: GeoJson = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-94.3, 34.4], [-94.2, 34.4], [-94.2, 34.6], [-94.3, 34.4]]]
                }
            }]
        }"#
        .parse()
        .unwrap();
        let GeoJson::FeatureCollection(fc) = geojson else {
            panic!("expected a feature collection");
        };
        let basin = Basin::from_collection(fc).unwrap();
        let path = basin_path(dir.path(), "07340300");
        save_basin(&basin, &path).unwrap();

        let saved: GeoJson = fs::read_to_string(&path).unwrap().parse().unwrap();
        let GeoJson::FeatureCollection(saved) = saved else {
            panic!("expected a feature collection");
        };
        assert_eq!(saved.features.len(), 1);
    }
}
