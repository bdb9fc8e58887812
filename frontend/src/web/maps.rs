//! Google Maps JavaScript API 绑定
//!
//! SDK 通过注入 `<script>` 加载；`window.google.maps` 已存在时直接复用。
//! `GoogleMap` 实现 `MapSurface`，标记与浮窗的生命周期由 `MarkerLayer` 管理。

use crate::clinics::{MapSurface, MarkerKind, MarkerSpec};
use crate::error::MapError;
use crate::request::encode_component;
use futures::channel::oneshot;
use js_sys::{Function, Object, Reflect};
use medisight_shared::{Clinic, Coordinate};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlElement, HtmlScriptElement};

const SCRIPT_ID: &str = "google-maps-sdk";
const SDK_URL: &str = "https://maps.googleapis.com/maps/api/js";
const USER_ICON_URL: &str = "https://maps.google.com/mapfiles/ms/icons/blue-dot.png";
const SINGLE_POINT_ZOOM: f64 = 14.0;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["google", "maps"], js_name = Map)]
    type GMap;

    #[wasm_bindgen(constructor, catch, js_namespace = ["google", "maps"], js_class = "Map")]
    fn new(element: &HtmlElement, options: &JsValue) -> Result<GMap, JsValue>;

    #[wasm_bindgen(method, js_name = fitBounds)]
    fn fit_bounds(this: &GMap, bounds: &LatLngBounds);

    #[wasm_bindgen(method, js_name = setCenter)]
    fn set_center(this: &GMap, center: &JsValue);

    #[wasm_bindgen(method, js_name = setZoom)]
    fn set_zoom(this: &GMap, zoom: f64);

    #[wasm_bindgen(js_namespace = ["google", "maps"], js_name = Marker)]
    type GMarker;

    #[wasm_bindgen(constructor, js_namespace = ["google", "maps"], js_class = "Marker")]
    fn new(options: &JsValue) -> GMarker;

    #[wasm_bindgen(method, js_name = setMap)]
    fn set_map(this: &GMarker, map: &JsValue);

    #[wasm_bindgen(method, js_name = addListener)]
    fn add_listener(this: &GMarker, event: &str, handler: &Function) -> JsValue;

    #[wasm_bindgen(js_namespace = ["google", "maps"], js_name = LatLngBounds)]
    type LatLngBounds;

    #[wasm_bindgen(constructor, js_namespace = ["google", "maps"], js_class = "LatLngBounds")]
    fn new() -> LatLngBounds;

    #[wasm_bindgen(method)]
    fn extend(this: &LatLngBounds, point: &JsValue);

    #[wasm_bindgen(js_namespace = ["google", "maps"], js_name = InfoWindow)]
    type InfoWindow;

    #[wasm_bindgen(constructor, js_namespace = ["google", "maps"], js_class = "InfoWindow")]
    fn new() -> InfoWindow;

    #[wasm_bindgen(method, js_name = setContent)]
    fn set_content(this: &InfoWindow, content: &str);

    #[wasm_bindgen(method)]
    fn open(this: &InfoWindow, options: &JsValue);

    #[wasm_bindgen(method)]
    fn close(this: &InfoWindow);
}

// =========================================================
// 加载器
// =========================================================

pub fn script_url(api_key: &str, map_id: Option<&str>) -> String {
    let mut url = format!(
        "{SDK_URL}?key={}&libraries=places",
        encode_component(api_key)
    );
    if let Some(id) = map_id.filter(|id| !id.is_empty()) {
        url.push_str("&map_ids=");
        url.push_str(&encode_component(id));
    }
    url
}

fn sdk_present() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    Reflect::get(&window, &JsValue::from_str("google"))
        .ok()
        .filter(|g| g.is_object())
        .and_then(|g| Reflect::get(&g, &JsValue::from_str("maps")).ok())
        .is_some_and(|m| m.is_object())
}

/// 加载 SDK；未配置 key 时立即失败
pub async fn load_google_maps(api_key: Option<&str>, map_id: Option<&str>) -> Result<(), MapError> {
    let api_key = api_key
        .filter(|k| !k.trim().is_empty())
        .ok_or(MapError::MissingApiKey)?;

    if sdk_present() {
        return Ok(());
    }

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| MapError::ScriptLoad("document unavailable".to_string()))?;

    // 另一个视图已开始加载时复用同一个脚本元素
    let script: HtmlScriptElement = match document.get_element_by_id(SCRIPT_ID) {
        Some(existing) => existing
            .dyn_into()
            .map_err(|_| MapError::ScriptLoad("unexpected element".to_string()))?,
        None => {
            let script: HtmlScriptElement = document
                .create_element("script")
                .map_err(|e| MapError::ScriptLoad(format!("{:?}", e)))?
                .dyn_into()
                .map_err(|_| MapError::ScriptLoad("unexpected element".to_string()))?;
            script.set_id(SCRIPT_ID);
            script.set_src(&script_url(api_key, map_id));
            script.set_async(true);
            script.set_defer(true);
            let head = document
                .head()
                .ok_or_else(|| MapError::ScriptLoad("document has no <head>".to_string()))?;
            head.append_child(&script)
                .map_err(|e| MapError::ScriptLoad(format!("{:?}", e)))?;
            script
        }
    };

    let (tx, rx) = oneshot::channel::<bool>();
    let tx = Rc::new(RefCell::new(Some(tx)));
    let settle = |ok: bool| {
        let tx = tx.clone();
        Closure::<dyn FnMut()>::new(move || {
            if let Some(tx) = tx.borrow_mut().take() {
                let _ = tx.send(ok);
            }
        })
    };
    let on_load = settle(true);
    let on_error = settle(false);
    script
        .add_event_listener_with_callback("load", on_load.as_ref().unchecked_ref())
        .map_err(|e| MapError::ScriptLoad(format!("{:?}", e)))?;
    script
        .add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref())
        .map_err(|e| MapError::ScriptLoad(format!("{:?}", e)))?;

    let loaded = rx.await.unwrap_or(false);
    let _ = script.remove_event_listener_with_callback("load", on_load.as_ref().unchecked_ref());
    let _ = script.remove_event_listener_with_callback("error", on_error.as_ref().unchecked_ref());

    if loaded && sdk_present() {
        log::info!("[Maps] SDK loaded");
        Ok(())
    } else {
        Err(MapError::ScriptLoad(
            "Failed to load Google Maps script".to_string(),
        ))
    }
}

// =========================================================
// 浮窗内容
// =========================================================

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// 诊所浮窗 HTML，所有后端字段均经过转义
pub fn overlay_html(clinic: &Clinic) -> String {
    let mut html = format!(
        r#"<div class="clinic-overlay"><h3 style="font-weight:600;margin-bottom:4px">{}</h3>"#,
        escape_html(&clinic.name)
    );
    if let Some(address) = &clinic.address {
        html.push_str(&format!("<p>{}</p>", escape_html(address)));
    }
    if let Some(phone) = &clinic.phone {
        html.push_str(&format!("<p>{}</p>", escape_html(phone)));
    }
    if let Some(rating) = clinic.rating {
        let count = clinic
            .total_ratings
            .map(|n| format!(" ({n})"))
            .unwrap_or_default();
        html.push_str(&format!("<p>&#9733; {rating:.1}{count}</p>"));
    }
    match clinic.is_open_now() {
        Some(true) => html.push_str(r#"<p style="color:#16a34a">Open now</p>"#),
        Some(false) => html.push_str(r#"<p style="color:#dc2626">Closed</p>"#),
        None => {}
    }
    if let Some(url) = clinic.directions_url() {
        html.push_str(&format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer">Get directions</a>"#,
            escape_html(&url)
        ));
    }
    html.push_str("</div>");
    html
}

// =========================================================
// GoogleMap
// =========================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapOptions<'a> {
    center: Coordinate,
    zoom: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    map_id: Option<&'a str>,
    map_type_control: bool,
    street_view_control: bool,
}

#[derive(Serialize)]
struct MarkerOptions<'a> {
    position: Coordinate,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<&'a str>,
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, MapError> {
    crate::serde_helper::to_value(value).map_err(|e| MapError::Init(e.to_string()))
}

pub struct MarkerHandle {
    marker: GMarker,
    _on_click: Closure<dyn FnMut()>,
}

pub struct GoogleMap {
    map: GMap,
    info: InfoWindow,
}

impl GoogleMap {
    pub fn new(
        element: &HtmlElement,
        center: Coordinate,
        map_id: Option<&str>,
    ) -> Result<Self, MapError> {
        let options = to_js(&MapOptions {
            center,
            zoom: 13.0,
            map_id: map_id.filter(|id| !id.is_empty()),
            map_type_control: false,
            street_view_control: false,
        })?;
        let map = GMap::new(element, &options).map_err(|e| MapError::Init(format!("{:?}", e)))?;
        Ok(Self {
            map,
            info: InfoWindow::new(),
        })
    }
}

impl MapSurface for GoogleMap {
    type Marker = MarkerHandle;

    fn add_marker(&self, def: &MarkerSpec, on_activate: Rc<dyn Fn()>) -> MarkerHandle {
        let icon = matches!(def.kind, MarkerKind::User).then_some(USER_ICON_URL);
        let options = to_js(&MarkerOptions {
            position: def.position,
            title: &def.title,
            icon,
        })
        .unwrap_or_else(|err| {
            log::error!("[Maps] {}", err);
            Object::new().into()
        });
        let marker = GMarker::new(&options);
        marker.set_map(&self.map);

        let on_click = Closure::<dyn FnMut()>::new(move || on_activate());
        marker.add_listener("click", on_click.as_ref().unchecked_ref());
        MarkerHandle {
            marker,
            _on_click: on_click,
        }
    }

    fn remove_marker(&self, marker: MarkerHandle) {
        marker.marker.set_map(&JsValue::NULL);
    }

    fn open_overlay(&self, marker: &MarkerHandle, clinic: &Clinic) {
        self.info.set_content(&overlay_html(clinic));
        let options = Object::new();
        let _ = Reflect::set(&options, &JsValue::from_str("anchor"), &marker.marker);
        let _ = Reflect::set(&options, &JsValue::from_str("map"), &self.map);
        self.info.open(&options);
    }

    fn close_overlay(&self) {
        self.info.close();
    }

    fn fit_bounds(&self, points: &[Coordinate]) {
        match points {
            [] => {}
            [only] => {
                if let Ok(center) = to_js(only) {
                    self.map.set_center(&center);
                    self.map.set_zoom(SINGLE_POINT_ZOOM);
                }
            }
            many => {
                let bounds = LatLngBounds::new();
                for point in many {
                    if let Ok(value) = to_js(point) {
                        bounds.extend(&value);
                    }
                }
                self.map.fit_bounds(&bounds);
            }
        }
    }
}
