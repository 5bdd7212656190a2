use crate::config::Settings;
use crate::error::FetchError;
use crate::http::check_status;
use anyhow::{anyhow, Result};
use regex::Regex;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::OnceLock;
use url::Url;

static SITE_CODE: OnceLock<Regex> = OnceLock::new();

/// Site attributes from the NWIS site service (expanded output).
#[derive(Debug, Clone, PartialEq)]
pub struct SiteInfo {
    pub agency_cd: String,
    pub site_no: String,
    pub station_nm: String,
    pub dec_lat_va: f64,
    pub dec_long_va: f64,
    pub huc_cd: Option<String>,
    pub drain_area_va: Option<f64>,
}

pub fn validate_site_code(site: &str) -> Result<(), FetchError> {
    let re = SITE_CODE
        .get_or_init(|| Regex::new(r"^\d{8,15}$").expect("Regex pattern should always compile"));
    if re.is_match(site) {
        Ok(())
    } else {
        Err(FetchError::InvalidSiteCode(site.to_string()))
    }
}

/// Parses a USGS RDB table: `#` comment lines, a tab-separated header, a
/// column-format row, then data rows.
pub fn parse_rdb(text: &str) -> Vec<HashMap<String, String>> {
    let mut lines = text
        .lines()
        .filter(|l| !l.starts_with('#') && !l.trim().is_empty());

    let Some(header) = lines.next() else {
        return vec![];
    };
    let columns: Vec<&str> = header.split('\t').collect();
    // Column widths and types, e.g. "5s\t15s"
    let _ = lines.next();

    lines
        .map(|line| {
            columns
                .iter()
                .zip(line.split('\t'))
                .map(|(c, v)| (c.to_string(), v.trim().to_string()))
                .collect()
        })
        .collect()
}

pub fn parse_site_info(text: &str, site: &str) -> Result<SiteInfo> {
    let rows = parse_rdb(text);
    let row = rows
        .iter()
        .find(|r| r.get("site_no").map(String::as_str) == Some(site))
        .ok_or_else(|| FetchError::SiteNotFound(site.to_string()))?;

    let field = |name: &'static str| -> Result<&str> {
        row.get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| FetchError::MissingField(name).into())
    };
    let number = |name: &'static str| -> Result<f64> {
        let value = field(name)?;
        value
            .parse()
            .map_err(|_| anyhow!("Invalid {} value: {}", name, value))
    };

    Ok(SiteInfo {
        agency_cd: field("agency_cd")?.to_string(),
        site_no: field("site_no")?.to_string(),
        station_nm: field("station_nm")?.to_string(),
        dec_lat_va: number("dec_lat_va")?,
        dec_long_va: number("dec_long_va")?,
        huc_cd: field("huc_cd").ok().map(str::to_string),
        drain_area_va: number("drain_area_va").ok(),
    })
}

pub fn site_info_url(base: &Url, site: &str) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("format", "rdb")
        .append_pair("sites", site)
        .append_pair("siteOutput", "expanded")
        .append_pair("siteStatus", "all");
    url
}

/// Site metadata for `site`. The code is validated before anything is sent.
pub async fn fetch_site_info(client: &Client, settings: &Settings, site: &str) -> Result<SiteInfo> {
    validate_site_code(site)?;

    let url = site_info_url(&settings.nwis_site_api, site);

    tracing::debug!(%url, "Fetching site info");
    let response = check_status(client.get(url).send().await?).await?;
    let text = response.text().await?;
    let info = parse_site_info(&text, site)?;
    tracing::info!(site = %info.site_no, name = %info.station_nm, "Site info");
    Ok(info)
}
