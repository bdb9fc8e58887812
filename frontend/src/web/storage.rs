//! LocalStorage 封装模块
//!
//! 只保存两项：认证刷新令牌与最近一次登录的邮箱。

use crate::auth::firebase::{REFRESH_TOKEN_KEY, TokenStore};

pub const LAST_EMAIL_KEY: &str = "medisight_last_email";

/// 本地存储操作封装
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }

    /// 键不存在或存储不可用时返回 `None`
    pub fn get(key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok()?
    }

    pub fn set(key: &str, value: &str) -> bool {
        Self::storage()
            .and_then(|s| s.set_item(key, value).ok())
            .is_some()
    }

    pub fn delete(key: &str) -> bool {
        Self::storage()
            .and_then(|s| s.remove_item(key).ok())
            .is_some()
    }

    /// 登录页邮箱自动填充
    pub fn last_email() -> Option<String> {
        Self::get(LAST_EMAIL_KEY).filter(|e| !e.is_empty())
    }

    pub fn remember_email(email: &str) {
        if !Self::set(LAST_EMAIL_KEY, email) {
            log::warn!("[Storage] Failed to remember last email");
        }
    }
}

/// 刷新令牌的浏览器持久化
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserTokenStore;

impl TokenStore for BrowserTokenStore {
    fn load(&self) -> Option<String> {
        LocalStorage::get(REFRESH_TOKEN_KEY)
    }

    fn save(&self, token: &str) {
        if !LocalStorage::set(REFRESH_TOKEN_KEY, token) {
            log::warn!("[Storage] Failed to persist refresh token");
        }
    }

    fn clear(&self) {
        LocalStorage::delete(REFRESH_TOKEN_KEY);
    }
}
