//! # apa-wasm
//!
//! WebAssembly bindings for the hosted-widgets gateway.
//!
//! This crate provides WASM-compatible functions for:
//! - Resolving the widget script URL at the edge
//! - Mapping a storefront country to a payment region
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { widget_url, region_for_country } from 'apa-wasm';
//!
//! await init();
//!
//! const script = widget_url('', false, false, 'A2SELLER', 'GB');
//! console.log(region_for_country('DE')); // "eu"
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

use apa_core::{
    resolve_region, resolve_widget_url, ApaResult, Environment, FixedStorefront, Region, Settings,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Resolved widget script with the region and environment it was picked for
#[derive(Debug, Serialize)]
pub struct WidgetInfo {
    pub widget_url: String,
    pub region: String,
    pub environment: String,
}

fn settings_for(region: &str, sandbox: bool, login_app: bool, seller_id: &str) -> Settings {
    Settings::default()
        .with_region(region)
        .with_sandbox(sandbox)
        .with_login_app(login_app)
        .with_seller_id(seller_id)
}

fn resolve_info(
    region: &str,
    sandbox: bool,
    login_app: bool,
    seller_id: &str,
    base_country: &str,
) -> ApaResult<WidgetInfo> {
    let settings = settings_for(region, sandbox, login_app, seller_id);
    let storefront = FixedStorefront::new(base_country);

    Ok(WidgetInfo {
        region: resolve_region(&settings, &storefront)?.to_string(),
        widget_url: resolve_widget_url(&settings, &storefront)?,
        environment: Environment::from_sandbox(sandbox).to_string(),
    })
}

/// Widget script URL for the given settings.
///
/// An empty `region` falls back to `base_country`.
#[wasm_bindgen]
pub fn widget_url(
    region: &str,
    sandbox: bool,
    login_app: bool,
    seller_id: &str,
    base_country: &str,
) -> Result<String, JsValue> {
    resolve_info(region, sandbox, login_app, seller_id, base_country)
        .map(|info| info.widget_url)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Widget URL, region and environment as a JSON string
#[wasm_bindgen]
pub fn widget_info(
    region: &str,
    sandbox: bool,
    login_app: bool,
    seller_id: &str,
    base_country: &str,
) -> Result<String, JsValue> {
    let info = resolve_info(region, sandbox, login_app, seller_id, base_country)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    serde_json::to_string(&info)
        .map_err(|e| JsValue::from_str(&format!("Failed to encode widget info: {}", e)))
}

/// Payment region code for a storefront country
#[wasm_bindgen]
pub fn region_for_country(country: &str) -> String {
    Region::from_country(country).to_string()
}

/// Supported payment region codes
#[wasm_bindgen]
pub fn supported_regions() -> Vec<String> {
    Region::ALL.iter().map(|r| r.to_string()).collect()
}

/// Log to browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
