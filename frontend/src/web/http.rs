//! 基于 `fetch` 的 HTTP 客户端
//!
//! 使用 `web_sys::fetch` 实现 `HttpClient`，multipart 请求体通过 `FormData` 构造，
//! boundary 由浏览器生成。

use crate::error::HttpError;
use crate::request::{FilePart, HttpClient, HttpRequest, HttpResponse, RequestBody};
use js_sys::{Array, Uint8Array};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, FormData, Headers, Request, RequestInit, Response};

fn js_error(e: JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{:?}", e))
}

fn form_data(parts: &[FilePart]) -> Result<FormData, HttpError> {
    let form = FormData::new()
        .map_err(|e| HttpError::RequestBuild(format!("创建 FormData 失败: {}", js_error(e))))?;

    for part in parts {
        let bytes = Uint8Array::from(part.bytes.as_slice());
        let options = BlobPropertyBag::new();
        options.set_type(&part.content_type);
        let blob = Blob::new_with_u8_array_sequence_and_options(&Array::of1(&bytes), &options)
            .map_err(|e| HttpError::RequestBuild(format!("创建 Blob 失败: {}", js_error(e))))?;
        form.append_with_blob_and_filename(&part.field, &blob, &part.file_name)
            .map_err(|e| HttpError::RequestBuild(js_error(e)))?;
    }
    Ok(form)
}

/// 浏览器 HTTP 客户端
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchClient;

#[async_trait::async_trait(?Send)]
impl HttpClient for FetchClient {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        let headers = Headers::new()
            .map_err(|e| HttpError::RequestBuild(format!("创建 Headers 失败: {}", js_error(e))))?;
        for (key, value) in &req.headers {
            headers
                .set(key, value)
                .map_err(|e| HttpError::RequestBuild(format!("设置 Header 失败: {}", js_error(e))))?;
        }

        let opts = RequestInit::new();
        opts.set_method(req.method.as_str());
        opts.set_headers(&headers.into());

        match &req.body {
            RequestBody::Empty => {}
            RequestBody::Json(body) => opts.set_body(&JsValue::from_str(body)),
            RequestBody::Multipart(parts) => opts.set_body(&form_data(parts)?.into()),
        }

        let request = Request::new_with_str_and_init(&req.url, &opts)
            .map_err(|e| HttpError::RequestBuild(js_error(e)))?;

        let window = web_sys::window()
            .ok_or_else(|| HttpError::Network("无法获取 window 对象".to_string()))?;

        let resp_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| HttpError::Network(js_error(e)))?;

        let response: Response = resp_value
            .dyn_into()
            .map_err(|e| HttpError::ResponseRead(format!("Response 类型转换失败: {:?}", e)))?;

        let status = response.status();
        let promise = response
            .text()
            .map_err(|e| HttpError::ResponseRead(js_error(e)))?;
        let body = JsFuture::from(promise)
            .await
            .map_err(|e| HttpError::ResponseRead(js_error(e)))?
            .as_string()
            .unwrap_or_default();

        Ok(HttpResponse { status, body })
    }
}
