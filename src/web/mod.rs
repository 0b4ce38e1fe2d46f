//! Browser host: Leaflet map, `localStorage` persistence and DOM click binding.

pub mod handler;

#[cfg(target_arch = "wasm32")]
mod host;
#[cfg(target_arch = "wasm32")]
mod leaflet;
#[cfg(target_arch = "wasm32")]
mod logging;
#[cfg(target_arch = "wasm32")]
mod storage;

#[cfg(target_arch = "wasm32")]
pub use host::{mount, mount_with_config, start};

#[cfg(target_arch = "wasm32")]
pub(crate) fn js_err(e: wasm_bindgen::JsValue) -> anyhow::Error {
    anyhow::anyhow!("{e:?}")
}
