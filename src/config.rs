//! Endpoint and credential settings read from the environment
use std::env;
use url::Url;

const APPEEARS_API: &str = "https://appeears.earthdatacloud.nasa.gov/api/";
const NWIS_SITE_API: &str = "https://waterservices.usgs.gov/nwis/site/";
const NLDI_API: &str = "https://api.water.usgs.gov/nldi/linked-data/";
const WBD_HUC12_QUERY: &str =
    "https://hydro.nationalmap.gov/arcgis/rest/services/wbd/MapServer/6/query";
const US_STATES_URL: &str =
    "https://github.com/jitendra-kumar/hydrology_codes/raw/main/data/USA_states_epsg4326.geojson";

/// Remote endpoints used by both flows, plus optional Earthdata credentials.
#[derive(Debug, Clone)]
pub struct Settings {
    pub appeears_api: Url,
    pub nwis_site_api: Url,
    pub nldi_api: Url,
    pub wbd_huc12_query: Url,
    pub us_states_url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Settings {
    /// Reads settings from the environment, loading a `.env` file first if one
    /// is present. Unset endpoints fall back to the public services.
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenv::dotenv();

        Ok(Self {
            appeears_api: endpoint("APPEEARS_API", APPEEARS_API)?,
            nwis_site_api: endpoint("NWIS_SITE_API", NWIS_SITE_API)?,
            nldi_api: endpoint("NLDI_API", NLDI_API)?,
            wbd_huc12_query: endpoint("WBD_HUC12_QUERY", WBD_HUC12_QUERY)?,
            us_states_url: endpoint("US_STATES_URL", US_STATES_URL)?,
            username: env::var("EARTHDATA_USERNAME").ok(),
            password: env::var("EARTHDATA_PASSWORD").ok(),
        })
    }

    /// Returns `(username, password)`, prompting on the terminal for whichever
    /// is not already set. Input is not echoed.
    pub fn credentials(&self) -> anyhow::Result<(String, String)> {
        let username = match &self.username {
            Some(u) => u.clone(),
            None => rpassword::prompt_password("Enter NASA Earthdata Login Username: ")?,
        };
        let password = match &self.password {
            Some(p) => p.clone(),
            None => rpassword::prompt_password("Enter NASA Earthdata Login Password: ")?,
        };
        Ok((username, password))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            appeears_api: Url::parse(APPEEARS_API).expect("default url is valid"),
            nwis_site_api: Url::parse(NWIS_SITE_API).expect("default url is valid"),
            nldi_api: Url::parse(NLDI_API).expect("default url is valid"),
            wbd_huc12_query: Url::parse(WBD_HUC12_QUERY).expect("default url is valid"),
            us_states_url: Url::parse(US_STATES_URL).expect("default url is valid"),
            username: None,
            password: None,
        }
    }
}

/// Parses a base url, ensuring a trailing slash on directory-style endpoints so
/// that `Url::join` appends rather than replaces the last segment.
fn endpoint(var: &str, default: &str) -> anyhow::Result<Url> {
    let raw = env::var(var).unwrap_or_else(|_| default.to_string());
    let raw = if default.ends_with('/') && !raw.ends_with('/') {
        format!("{raw}/")
    } else {
        raw
    };
    Ok(Url::parse(&raw)?)
}
