//! 定时器封装模块
//!
//! 使用 `setTimeout` 实现异步等待与一次性延迟回调。

use futures::channel::oneshot;
use wasm_bindgen::prelude::*;

/// 一次性定时器
///
/// 封装 `setTimeout`。在触发前被 drop 时自动清除。
pub struct Timeout {
    handle: Option<i32>,
    #[allow(dead_code)]
    closure: Closure<dyn FnMut()>,
}

impl Timeout {
    /// 无法获取 window 时回调永远不会执行
    pub fn new<F>(millis: u32, callback: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        let mut callback = Some(callback);
        let closure = Closure::<dyn FnMut()>::new(move || {
            if let Some(callback) = callback.take() {
                callback();
            }
        });

        let handle = web_sys::window().and_then(|window| {
            window
                .set_timeout_with_callback_and_timeout_and_arguments_0(
                    closure.as_ref().unchecked_ref(),
                    millis as i32,
                )
                .ok()
        });
        if handle.is_none() {
            log::error!("[Timer] setTimeout unavailable");
        }

        Self { handle, closure }
    }

    /// 让定时器在 drop 后仍然触发
    pub fn forget(self) {
        std::mem::forget(self);
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        if let (Some(handle), Some(window)) = (self.handle, web_sys::window()) {
            window.clear_timeout_with_handle(handle);
        }
    }
}

/// 异步等待指定毫秒
pub async fn sleep(millis: u32) {
    let (tx, rx) = oneshot::channel::<()>();
    let _timeout = Timeout::new(millis, move || {
        let _ = tx.send(());
    });
    let _ = rx.await;
}
