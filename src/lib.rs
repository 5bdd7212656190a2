#![allow(async_fn_in_trait)]
pub mod acquire;
pub mod aoi;
pub mod appeears;
pub mod basin;
pub mod config;
pub mod download_plan;
pub mod error;
mod http;
pub mod render;
pub mod selection;
pub mod service;
pub mod usgs;
