use anyhow::Context;

use super::js_err;
use crate::db::Storage;

/// `window.localStorage`.
pub struct LocalStorage(web_sys::Storage);

impl LocalStorage {
    pub fn open() -> anyhow::Result<Self> {
        let window = web_sys::window().context("no global window")?;
        let storage = window
            .local_storage()
            .map_err(js_err)
            .context("localStorage access denied")?
            .context("localStorage unavailable")?;
        Ok(Self(storage))
    }
}

impl Storage for LocalStorage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.0.get_item(key).map_err(js_err)
    }

    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.0.set_item(key, value).map_err(js_err)
    }
}
