//! Browser host: Leaflet map, `localStorage` persistence and DOM click binding.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use anyhow::Context;
use serde::Serialize;
use wasm_bindgen::{prelude::*, JsCast};

use crate::{
    config::Config,
    controller::{ClickTarget, InteractionController, PopupHost},
    data::{Category, LatLng, Restaurant},
    db::{MemoryStorage, RatingsStore, Storage},
    map::{bootstrap, IconOptions, MapView, TileLayerOptions},
};

use super::{handler::HandlerSlot, js_err, leaflet, logging, storage::LocalStorage};

fn to_js<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| anyhow::anyhow!("fail to convert options: {e}"))
}

fn lat_lng(position: LatLng) -> anyhow::Result<JsValue> {
    to_js(&[position.lat, position.lng])
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapOptions {
    zoom_control: bool,
}

struct Widget {
    config: Config,
    map: leaflet::Map,
    controller: RefCell<InteractionController<Box<dyn Storage>>>,
    /// The open popup and the restaurant it belongs to.
    popup: RefCell<Option<(String, leaflet::Popup)>>,
    /// Click handler of the currently mounted popup fragment.
    listener: RefCell<HandlerSlot<web_sys::Element, Closure<dyn FnMut(web_sys::Event)>>>,
}

impl Widget {
    fn container(&self) -> anyhow::Result<web_sys::Element> {
        let popup = self.popup.borrow();
        let (_, popup) = popup.as_ref().context("no popup open")?;
        let element = popup.get_element().context("popup is not mounted")?;
        element
            .query_selector(".popup-container")
            .map_err(js_err)?
            .context("popup has no container")
    }
}

struct DomHost<'a> {
    widget: &'a Rc<Widget>,
}

impl PopupHost for DomHost<'_> {
    fn show(&mut self, restaurant: &Restaurant, html: &str) -> anyhow::Result<()> {
        {
            let mut current = self.widget.popup.borrow_mut();
            match current.as_ref() {
                Some((id, popup)) if *id == restaurant.id && popup.is_open() => {
                    popup
                        .set_content(html)
                        .map_err(js_err)
                        .context("fail to refresh popup")?;
                }
                _ => {
                    let popup = leaflet::popup(&to_js(&self.widget.config.popup)?).map_err(js_err)?;
                    popup
                        .set_lat_lng(&lat_lng(restaurant.position())?)
                        .map_err(js_err)?;
                    popup.set_content(html).map_err(js_err)?;
                    popup
                        .open_on(&self.widget.map)
                        .map_err(js_err)
                        .context("fail to open popup")?;
                    *current = Some((restaurant.id.clone(), popup));
                }
            }
        }

        // Leaflet mounts the new content asynchronously
        defer_bind(Rc::downgrade(self.widget), restaurant.clone())
    }

    fn render_selection(
        &mut self,
        restaurant_id: &str,
        picks: &BTreeMap<Category, u8>,
    ) -> anyhow::Result<()> {
        let container = self.widget.container()?;
        let buttons = container
            .query_selector_all(".rating-input")
            .map_err(js_err)?;

        for i in 0..buttons.length() {
            let Some(button) = buttons.item(i).and_then(|n| n.dyn_into::<web_sys::Element>().ok())
            else {
                continue;
            };
            if button.get_attribute("data-restaurant-id").as_deref() != Some(restaurant_id) {
                continue;
            }

            let picked = button
                .get_attribute("data-category")
                .and_then(|c| c.parse::<Category>().ok())
                .and_then(|c| picks.get(&c));
            let checked = match (picked, button.get_attribute("data-value")) {
                (Some(picked), Some(value)) => picked.to_string() == value,
                _ => false,
            };
            button
                .set_attribute("data-checked", if checked { "true" } else { "false" })
                .map_err(js_err)?;
        }
        Ok(())
    }
}

fn defer_bind(widget: Weak<Widget>, restaurant: Restaurant) -> anyhow::Result<()> {
    let callback = Closure::once_into_js(move || {
        let Some(widget) = widget.upgrade() else {
            return;
        };
        if let Err(e) = bind(&widget, &restaurant) {
            tracing::error!("fail to bind popup for {}: {e:#}", restaurant.id);
        }
    });

    web_sys::window()
        .context("no global window")?
        .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), 0)
        .map_err(js_err)?;
    Ok(())
}

fn click_target(event: &web_sys::Event) -> Option<ClickTarget> {
    let element = event.target()?.dyn_into::<web_sys::Element>().ok()?;
    let button = element.closest("button").ok()??;
    Some(ClickTarget {
        action: button.get_attribute("data-action"),
        category: button.get_attribute("data-category"),
        value: button.get_attribute("data-value"),
        rating_input: button.class_list().contains("rating-input"),
    })
}

fn bind(widget: &Rc<Widget>, restaurant: &Restaurant) -> anyhow::Result<()> {
    let container = widget.container()?;

    let weak = Rc::downgrade(widget);
    let owner = restaurant.clone();
    let listener = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
        let Some(widget) = weak.upgrade() else {
            return;
        };
        let Some(target) = click_target(&event) else {
            return;
        };
        let mut host = DomHost { widget: &widget };
        widget
            .controller
            .borrow_mut()
            .click(&mut host, &owner, &target);
    });
    container
        .add_event_listener_with_callback("click", listener.as_ref().unchecked_ref())
        .map_err(js_err)?;
    widget
        .listener
        .borrow_mut()
        .replace(container, listener, |element, old| {
            if let Err(e) = element
                .remove_event_listener_with_callback("click", old.as_ref().unchecked_ref())
            {
                tracing::warn!("fail to detach popup handler: {e:?}");
            }
        });

    let picks = widget
        .controller
        .borrow()
        .selection()
        .picks_for(&restaurant.id);
    DomHost { widget }.render_selection(&restaurant.id, &picks)
}

struct LeafletView<'a> {
    widget: &'a Rc<Widget>,
}

impl MapView for LeafletView<'_> {
    fn set_view(&mut self, center: LatLng, zoom: u8) -> anyhow::Result<()> {
        self.widget
            .map
            .set_view(&lat_lng(center)?, zoom)
            .map_err(js_err)?;
        Ok(())
    }

    fn add_tile_layer(&mut self, tiles: &TileLayerOptions) -> anyhow::Result<()> {
        leaflet::tile_layer(&tiles.url_template, &to_js(tiles)?)
            .map_err(js_err)?
            .add_to(&self.widget.map)
            .map_err(js_err)?;
        Ok(())
    }

    fn add_marker(&mut self, restaurant: &Restaurant, icon: &IconOptions) -> anyhow::Result<()> {
        let options = js_sys::Object::new();
        js_sys::Reflect::set(&options, &"title".into(), &restaurant.name.as_str().into())
            .map_err(js_err)?;
        js_sys::Reflect::set(&options, &"icon".into(), &leaflet::icon(&to_js(icon)?).map_err(js_err)?)
            .map_err(js_err)?;

        let marker = leaflet::marker(&lat_lng(restaurant.position())?, &options)
            .map_err(js_err)?
            .add_to(&self.widget.map)
            .map_err(js_err)?;

        // markers keep the widget alive for the lifetime of the page
        let widget = Rc::clone(self.widget);
        let restaurant = restaurant.clone();
        let on_click = Closure::<dyn FnMut()>::new(move || {
            let mut host = DomHost { widget: &widget };
            widget
                .controller
                .borrow_mut()
                .open(&mut host, &restaurant);
        });
        marker
            .on("click", on_click.as_ref().unchecked_ref())
            .map_err(js_err)?;
        on_click.forget();
        Ok(())
    }
}

fn mount_config(config: Config) -> anyhow::Result<()> {
    let storage: Box<dyn Storage> = match LocalStorage::open() {
        Ok(storage) => Box::new(storage),
        Err(e) => {
            tracing::warn!("ratings will not survive a reload: {e:#}");
            Box::new(MemoryStorage::default())
        }
    };
    let store = RatingsStore::new(storage, config.storage_key.clone());

    let map = leaflet::map(
        &config.container_id,
        &to_js(&MapOptions {
            zoom_control: config.zoom_control,
        })?,
    )
    .map_err(js_err)
    .with_context(|| format!("fail to create map in #{}", config.container_id))?;
    let widget = Rc::new(Widget {
        config,
        map,
        controller: RefCell::new(InteractionController::new(store)),
        popup: RefCell::new(None),
        listener: RefCell::new(HandlerSlot::default()),
    });

    bootstrap(&mut LeafletView { widget: &widget }, &widget.config)
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    logging::init();
}

/// Mount the widget with the built-in zoo configuration.
#[wasm_bindgen]
pub fn mount() -> Result<(), JsValue> {
    mount_config(Config::default()).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}

/// Mount the widget with a (possibly partial) configuration object.
#[wasm_bindgen(js_name = mountWithConfig)]
pub fn mount_with_config(config: JsValue) -> Result<(), JsValue> {
    let config: Config = serde_wasm_bindgen::from_value(config)?;
    mount_config(config).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
