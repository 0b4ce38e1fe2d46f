//! Bindings for the parts of Leaflet (`window.L`) the widget calls.
//!
//! Every call that can throw is imported with `catch`, so a Leaflet exception
//! comes back as an `Err` instead of unwinding through wasm.

use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    pub type Map;

    #[wasm_bindgen(catch, js_namespace = L, js_name = map)]
    pub fn map(container_id: &str, options: &JsValue) -> Result<Map, JsValue>;

    #[wasm_bindgen(catch, method, js_name = setView)]
    pub fn set_view(this: &Map, center: &JsValue, zoom: u8) -> Result<Map, JsValue>;
}

#[wasm_bindgen]
extern "C" {
    pub type TileLayer;

    #[wasm_bindgen(catch, js_namespace = L, js_name = tileLayer)]
    pub fn tile_layer(url_template: &str, options: &JsValue) -> Result<TileLayer, JsValue>;

    #[wasm_bindgen(catch, method, js_name = addTo)]
    pub fn add_to(this: &TileLayer, map: &Map) -> Result<TileLayer, JsValue>;
}

#[wasm_bindgen]
extern "C" {
    pub type Icon;

    #[wasm_bindgen(catch, js_namespace = L, js_name = icon)]
    pub fn icon(options: &JsValue) -> Result<Icon, JsValue>;
}

#[wasm_bindgen]
extern "C" {
    pub type Marker;

    #[wasm_bindgen(catch, js_namespace = L, js_name = marker)]
    pub fn marker(lat_lng: &JsValue, options: &JsValue) -> Result<Marker, JsValue>;

    #[wasm_bindgen(catch, method, js_name = addTo)]
    pub fn add_to(this: &Marker, map: &Map) -> Result<Marker, JsValue>;

    #[wasm_bindgen(catch, method)]
    pub fn on(this: &Marker, event: &str, handler: &js_sys::Function) -> Result<Marker, JsValue>;
}

#[wasm_bindgen]
extern "C" {
    pub type Popup;

    #[wasm_bindgen(catch, js_namespace = L, js_name = popup)]
    pub fn popup(options: &JsValue) -> Result<Popup, JsValue>;

    #[wasm_bindgen(catch, method, js_name = setLatLng)]
    pub fn set_lat_lng(this: &Popup, lat_lng: &JsValue) -> Result<Popup, JsValue>;

    #[wasm_bindgen(catch, method, js_name = setContent)]
    pub fn set_content(this: &Popup, html: &str) -> Result<Popup, JsValue>;

    #[wasm_bindgen(catch, method, js_name = openOn)]
    pub fn open_on(this: &Popup, map: &Map) -> Result<Popup, JsValue>;

    #[wasm_bindgen(method, js_name = isOpen)]
    pub fn is_open(this: &Popup) -> bool;

    #[wasm_bindgen(method, js_name = getElement)]
    pub fn get_element(this: &Popup) -> Option<web_sys::HtmlElement>;
}
