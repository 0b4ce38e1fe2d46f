use std::io;

use wasm_bindgen::JsValue;

/// Collects one formatted event and prints it to the browser console on drop.
#[derive(Default)]
pub struct ConsoleWriter {
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buf);
        web_sys::console::log_1(&JsValue::from_str(line.trim_end()));
    }
}

pub fn init() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_file(false)
        .without_time()
        .with_writer(ConsoleWriter::default)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        web_sys::console::warn_1(&JsValue::from_str(&format!("fail to setup logging: {e}")));
    }
}
