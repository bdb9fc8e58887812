//! 浏览器定位
//!
//! 只请求一次当前位置，不设置超时，由浏览器决定何时返回。

use crate::clinics::Geolocator;
use crate::error::GeolocationError;
use futures::channel::oneshot;
use js_sys::Reflect;
use medisight_shared::Coordinate;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

fn number(value: &JsValue, key: &str) -> Option<f64> {
    Reflect::get(value, &JsValue::from_str(key)).ok()?.as_f64()
}

fn coordinate(position: &JsValue) -> Option<Coordinate> {
    let coords = Reflect::get(position, &JsValue::from_str("coords")).ok()?;
    Some(Coordinate::new(
        number(&coords, "latitude")?,
        number(&coords, "longitude")?,
    ))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserGeolocator;

#[async_trait::async_trait(?Send)]
impl Geolocator for BrowserGeolocator {
    async fn locate(&self) -> Result<Coordinate, GeolocationError> {
        let geolocation = web_sys::window()
            .and_then(|w| w.navigator().geolocation().ok())
            .ok_or(GeolocationError::Unsupported)?;

        let (tx, rx) = oneshot::channel::<Result<Coordinate, GeolocationError>>();
        let tx = Rc::new(RefCell::new(Some(tx)));

        let on_success = {
            let tx = tx.clone();
            Closure::<dyn FnMut(JsValue)>::new(move |position: JsValue| {
                let result = coordinate(&position).ok_or(GeolocationError::Unavailable);
                if let Some(tx) = tx.borrow_mut().take() {
                    let _ = tx.send(result);
                }
            })
        };
        let on_error = {
            let tx = tx.clone();
            Closure::<dyn FnMut(JsValue)>::new(move |error: JsValue| {
                let code = number(&error, "code").unwrap_or(2.0) as u16;
                if let Some(tx) = tx.borrow_mut().take() {
                    let _ = tx.send(Err(GeolocationError::from_code(code)));
                }
            })
        };

        geolocation
            .get_current_position_with_error_callback(
                on_success.as_ref().unchecked_ref(),
                Some(on_error.as_ref().unchecked_ref()),
            )
            .map_err(|_| GeolocationError::Unsupported)?;

        // 两个回调在等待期间保持存活
        let result = rx.await.unwrap_or(Err(GeolocationError::Unavailable));
        drop(on_success);
        drop(on_error);
        result
    }
}
