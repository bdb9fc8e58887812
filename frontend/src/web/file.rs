//! `<input type="file">` 选中的文件

use crate::error::UploadError;
use crate::upload::ImageSource;
use futures::channel::oneshot;
use js_sys::Uint8Array;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, FileReader, HtmlInputElement};

fn read_error(e: JsValue) -> UploadError {
    UploadError::Read(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

#[derive(Debug, Clone)]
pub struct BrowserFile {
    file: File,
}

impl BrowserFile {
    pub fn new(file: File) -> Self {
        Self { file }
    }

    /// 取输入框中的第一个文件
    pub fn from_input(input: &HtmlInputElement) -> Option<Self> {
        input.files()?.get(0).map(Self::new)
    }

    pub fn from_event(ev: &web_sys::Event) -> Option<Self> {
        let input: HtmlInputElement = ev.target()?.dyn_into().ok()?;
        Self::from_input(&input)
    }
}

#[async_trait::async_trait(?Send)]
impl ImageSource for BrowserFile {
    fn name(&self) -> String {
        self.file.name()
    }

    fn size(&self) -> u64 {
        self.file.size() as u64
    }

    fn mime_type(&self) -> String {
        self.file.type_()
    }

    async fn data_url(&self) -> Result<String, UploadError> {
        let reader = FileReader::new().map_err(read_error)?;
        let (tx, rx) = oneshot::channel::<()>();
        let mut tx = Some(tx);
        let onloadend = Closure::<dyn FnMut()>::new(move || {
            if let Some(tx) = tx.take() {
                let _ = tx.send(());
            }
        });
        reader.set_onloadend(Some(onloadend.as_ref().unchecked_ref()));
        reader.read_as_data_url(&self.file).map_err(read_error)?;

        let _ = rx.await;
        reader.set_onloadend(None);
        drop(onloadend);

        reader
            .result()
            .map_err(read_error)?
            .as_string()
            .ok_or_else(|| UploadError::Read("empty result".to_string()))
    }

    async fn bytes(&self) -> Result<Vec<u8>, UploadError> {
        let buffer = JsFuture::from(self.file.array_buffer())
            .await
            .map_err(read_error)?;
        Ok(Uint8Array::new(&buffer).to_vec())
    }
}
