use serde::Serialize;
use wasm_bindgen::JsValue;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serde-wasm-bindgen: {0}")]
    SerdeWasmBindgen(#[from] serde_wasm_bindgen::Error),
}

/// Rust 值转为普通 JS 对象（传给 Maps SDK 的选项）
pub fn to_value<T: Serialize>(value: &T) -> Result<JsValue, Error> {
    // 大整数按 JS number 输出，SDK 不接受 BigInt
    let serializer = serde_wasm_bindgen::Serializer::new()
        .serialize_large_number_types_as_bigints(false)
        .serialize_maps_as_objects(true);
    Ok(value.serialize(&serializer)?)
}
