use anyhow::Context;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    data::{LatLng, Restaurant},
};

const LEAFLET_IMAGES: &str = "https://unpkg.com/leaflet@1.9.4/dist/images";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default, rename_all = "camelCase")]
#[builder(default, setter(into))]
pub struct TileLayerOptions {
    /// Passed to the tile layer separately from the options object.
    #[serde(skip_serializing)]
    pub url_template: String,
    pub max_zoom: u8,
    pub attribution: String,
}

impl Default for TileLayerOptions {
    fn default() -> Self {
        Self {
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            max_zoom: 19,
            attribution: "&copy; OpenStreetMap contributors".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default, rename_all = "camelCase")]
#[builder(default, setter(into))]
pub struct IconOptions {
    pub icon_url: String,
    pub icon_retina_url: String,
    pub shadow_url: String,
    pub icon_size: [u32; 2],
    pub icon_anchor: [i32; 2],
    pub popup_anchor: [i32; 2],
    pub shadow_size: [u32; 2],
}

impl Default for IconOptions {
    fn default() -> Self {
        Self {
            icon_url: format!("{LEAFLET_IMAGES}/marker-icon.png"),
            icon_retina_url: format!("{LEAFLET_IMAGES}/marker-icon-2x.png"),
            shadow_url: format!("{LEAFLET_IMAGES}/marker-shadow.png"),
            icon_size: [25, 41],
            icon_anchor: [12, 41],
            popup_anchor: [1, -34],
            shadow_size: [41, 41],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default, rename_all = "camelCase")]
#[builder(default, setter(into))]
pub struct PopupOptions {
    pub close_button: bool,
    pub auto_pan: bool,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            close_button: true,
            auto_pan: true,
        }
    }
}

/// The slice of a slippy-map library the widget relies on.
pub trait MapView {
    fn set_view(&mut self, center: LatLng, zoom: u8) -> anyhow::Result<()>;

    fn add_tile_layer(&mut self, tiles: &TileLayerOptions) -> anyhow::Result<()>;

    /// Place a marker for `restaurant`. Clicking it must open the restaurant's
    /// popup through the interaction controller.
    fn add_marker(&mut self, restaurant: &Restaurant, icon: &IconOptions) -> anyhow::Result<()>;
}

pub fn bootstrap(view: &mut impl MapView, config: &Config) -> anyhow::Result<()> {
    view.set_view(config.center, config.zoom)
        .context("fail to center map")?;
    view.add_tile_layer(&config.tiles)
        .context("fail to add tile layer")?;
    for restaurant in &config.restaurants {
        view.add_marker(restaurant, &config.marker_icon)
            .with_context(|| format!("fail to place marker for {}", restaurant.id))?;
    }

    tracing::info!(markers = config.restaurants.len(), "map ready");
    Ok(())
}
