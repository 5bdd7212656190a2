use crate::error::FetchError;
use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use toml;

/// Describes what to extract for the area of interest: which product layers,
/// over which dates, and in which output format.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct RequestSelection {
    pub task_type: String,
    pub dates: DateRange,
    pub output: OutputFormat,
    products: Vec<Product>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DateRange {
    /// `MM-DD-YYYY`, or `MM-DD` when recurring.
    pub start: String,
    pub end: String,
    pub recurring: bool,
    pub year_range: [i32; 2],
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct OutputFormat {
    pub format: String,
    pub projection: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Product {
    pub id: String,
    name: String,
    pub layer: String,
    download: bool,
}

pub fn template() -> toml::Table {
    toml::toml! {
        task_type = "area"

        [dates]
        start = "01-01-2000"
        end = "12-31-2022"
        recurring = false
        year_range = [1950, 2050]

        [output]
        format = "netcdf4"
        projection = "geographic"

        [[products]]
        id = "MYD16A2.061"
        name = "ET - MODIS Aqua"
        layer = "ET_500m"
        download = true

        [[products]]
        id = "MOD16A2.061"
        name = "ET - MODIS Terra"
        layer = "ET_500m"
        download = false

        [[products]]
        id = "MCD15A2H.061"
        name = "LAI - combined MODIS"
        layer = "Lai_500m"
        download = true

        [[products]]
        id = "MYD15A2H.061"
        name = "LAI - MODIS Aqua"
        layer = "Lai_500m"
        download = false

        [[products]]
        id = "MOD15A2H.061"
        name = "LAI - MODIS Terra"
        layer = "Lai_500m"
        download = false

        [[products]]
        id = "MYD17A2H.061"
        name = "GPP - MODIS Aqua"
        layer = "Gpp_500m"
        download = true

        [[products]]
        id = "MOD17A2H.061"
        name = "GPP - MODIS Terra"
        layer = "Gpp_500m"
        download = false
    }
}

impl RequestSelection {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let selection: Self = toml::from_str(&content)?;
        Ok(selection)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn from_template(table: &toml::Table) -> Result<Self> {
        let selection: Self = toml::from_str(&table.to_string())?;
        Ok(selection)
    }

    /// `(product, layer)` pairs flagged for download, in catalogue order.
    pub fn layers(&self) -> Result<Vec<(String, String)>, FetchError> {
        let layers = self
            .products
            .iter()
            .filter(|p| p.download)
            .map(|p| (p.id.clone(), p.layer.clone()))
            .collect::<Vec<_>>();
        if layers.is_empty() {
            return Err(FetchError::NoLayers);
        }
        Ok(layers)
    }

    pub fn validate(&self) -> Result<(), FetchError> {
        self.layers()?;
        let dates = &self.dates;
        if dates.recurring {
            // Recurring ranges carry no year; pin one so chrono accepts the day.
            parse_date(&format!("{}-2000", dates.start), &dates.start, "MM-DD")?;
            parse_date(&format!("{}-2000", dates.end), &dates.end, "MM-DD")?;
        } else {
            let start = parse_date(&dates.start, &dates.start, "MM-DD-YYYY")?;
            let end = parse_date(&dates.end, &dates.end, "MM-DD-YYYY")?;
            if start > end {
                return Err(FetchError::InvalidDate {
                    value: format!("{} > {}", dates.start, dates.end),
                    format: "start date on or before end date",
                });
            }
        }
        Ok(())
    }
}

fn parse_date(
    candidate: &str,
    original: &str,
    format: &'static str,
) -> Result<NaiveDate, FetchError> {
    NaiveDate::parse_from_str(candidate, "%m-%d-%Y").map_err(|_| FetchError::InvalidDate {
        value: original.to_string(),
        format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template() {
        let selection = RequestSelection::from_template(&template()).unwrap();
        assert_eq!(selection.task_type, "area");
        assert_eq!(selection.products.len(), 7);
        assert_eq!(selection.output.format, "netcdf4");
        assert!(selection.validate().is_ok());
    }

    #[test]
    fn test_template_layers() {
        let selection = RequestSelection::from_template(&template()).unwrap();
        let layers = selection.layers().unwrap();
        assert_eq!(
            layers,
            vec![
                ("MYD16A2.061".to_string(), "ET_500m".to_string()),
                ("MCD15A2H.061".to_string(), "Lai_500m".to_string()),
                ("MYD17A2H.061".to_string(), "Gpp_500m".to_string()),
            ]
        );
    }

    #[test]
    fn test_read_write_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selection.toml");
        let selection = RequestSelection::from_template(&template()).unwrap();
        selection.write(&path).unwrap();

        let selection = RequestSelection::read(&path).unwrap();
        assert_eq!(selection.dates.start, "01-01-2000");
        assert_eq!(selection.dates.year_range, [1950, 2050]);
        assert_eq!(selection.products.len(), 7);
    }

    #[test]
    fn test_no_layers_selected() {
        let mut selection = RequestSelection::from_template(&template()).unwrap();
        for p in selection.products.iter_mut() {
            p.download = false;
        }
        assert!(matches!(selection.layers(), Err(FetchError::NoLayers)));
        assert!(selection.validate().is_err());
    }

    #[test]
    fn test_invalid_dates() {
        let mut selection = RequestSelection::from_template(&template()).unwrap();
        selection.dates.start = "2000-01-01".to_string();
        assert!(matches!(
            selection.validate(),
            Err(FetchError::InvalidDate { .. })
        ));

        let mut selection = RequestSelection::from_template(&template()).unwrap();
        selection.dates.start = "12-31-2023".to_string();
        assert!(selection.validate().is_err());
    }

    #[test]
    fn test_recurring_dates() {
        let mut selection = RequestSelection::from_template(&template()).unwrap();
        selection.dates.recurring = true;
        selection.dates.start = "05-01".to_string();
        selection.dates.end = "09-30".to_string();
        assert!(selection.validate().is_ok());

        selection.dates.end = "13-30".to_string();
        assert!(selection.validate().is_err());
    }
}
