use anyhow::Context;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::{
    data::{seed_restaurants, LatLng, Restaurant, ZOO_CENTER},
    db::STORAGE_KEY,
    map::{IconOptions, PopupOptions, TileLayerOptions},
};

/// Widget settings. Every field has a default, so a host page only needs to
/// pass what it wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default, rename_all = "camelCase")]
#[builder(default, setter(into))]
pub struct Config {
    /// DOM id of the element the map is mounted in.
    pub container_id: String,
    pub storage_key: String,
    pub center: LatLng,
    pub zoom: u8,
    pub zoom_control: bool,
    pub tiles: TileLayerOptions,
    pub marker_icon: IconOptions,
    pub popup: PopupOptions,
    pub restaurants: Vec<Restaurant>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            container_id: "map".to_string(),
            storage_key: STORAGE_KEY.to_string(),
            center: ZOO_CENTER,
            zoom: 17,
            zoom_control: true,
            tiles: TileLayerOptions::default(),
            marker_icon: IconOptions::default(),
            popup: PopupOptions::default(),
            restaurants: seed_restaurants(),
        }
    }
}

impl Config {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("fail to parse widget config")
    }
}
