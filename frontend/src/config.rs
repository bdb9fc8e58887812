//! 运行时配置
//!
//! 配置在编译期从环境变量读取（`option_env!`），未设置时使用默认值。
//! `from_lookup` 接受任意键查找函数，便于测试构造配置。

use medisight_shared::{Coordinate, DEFAULT_CLINIC_RADIUS_M};

// =========================================================
// 默认值
// =========================================================

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
/// 纽约市
pub const DEFAULT_LOCATION: Coordinate = Coordinate::new(40.7128, -74.0060);
pub const DEFAULT_MAX_UPLOAD_MB: u32 = 5;

const ENV_API_BASE_URL: &str = "MEDISIGHT_API_BASE_URL";
const ENV_FIREBASE_API_KEY: &str = "MEDISIGHT_FIREBASE_API_KEY";
const ENV_MAPS_API_KEY: &str = "MEDISIGHT_GOOGLE_MAPS_API_KEY";
const ENV_MAPS_MAP_ID: &str = "MEDISIGHT_GOOGLE_MAPS_MAP_ID";
const ENV_DEFAULT_LATITUDE: &str = "MEDISIGHT_DEFAULT_LATITUDE";
const ENV_DEFAULT_LONGITUDE: &str = "MEDISIGHT_DEFAULT_LONGITUDE";
const ENV_CLINIC_RADIUS: &str = "MEDISIGHT_CLINIC_RADIUS_M";
const ENV_MAX_UPLOAD_MB: &str = "MEDISIGHT_MAX_UPLOAD_MB";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub firebase_api_key: Option<String>,
    pub maps_api_key: Option<String>,
    pub maps_map_id: Option<String>,
    pub default_location: Coordinate,
    pub clinic_radius_m: u32,
    pub max_upload_mb: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            firebase_api_key: None,
            maps_api_key: None,
            maps_map_id: None,
            default_location: DEFAULT_LOCATION,
            clinic_radius_m: DEFAULT_CLINIC_RADIUS_M,
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
        }
    }
}

impl AppConfig {
    /// 构建期环境变量
    pub fn from_env() -> Self {
        Self::from_lookup(|key| {
            let value = match key {
                ENV_API_BASE_URL => option_env!("MEDISIGHT_API_BASE_URL"),
                ENV_FIREBASE_API_KEY => option_env!("MEDISIGHT_FIREBASE_API_KEY"),
                ENV_MAPS_API_KEY => option_env!("MEDISIGHT_GOOGLE_MAPS_API_KEY"),
                ENV_MAPS_MAP_ID => option_env!("MEDISIGHT_GOOGLE_MAPS_MAP_ID"),
                ENV_DEFAULT_LATITUDE => option_env!("MEDISIGHT_DEFAULT_LATITUDE"),
                ENV_DEFAULT_LONGITUDE => option_env!("MEDISIGHT_DEFAULT_LONGITUDE"),
                ENV_CLINIC_RADIUS => option_env!("MEDISIGHT_CLINIC_RADIUS_M"),
                ENV_MAX_UPLOAD_MB => option_env!("MEDISIGHT_MAX_UPLOAD_MB"),
                _ => None,
            };
            value.map(str::to_string)
        })
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        // 空字符串视为未设置
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_base_url = get(ENV_API_BASE_URL)
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);

        let lat = get(ENV_DEFAULT_LATITUDE).and_then(|v| v.parse::<f64>().ok());
        let lng = get(ENV_DEFAULT_LONGITUDE).and_then(|v| v.parse::<f64>().ok());
        let default_location = match (lat, lng) {
            (Some(lat), Some(lng)) if Coordinate::new(lat, lng).is_valid() => {
                Coordinate::new(lat, lng)
            }
            _ => defaults.default_location,
        };

        Self {
            api_base_url,
            firebase_api_key: get(ENV_FIREBASE_API_KEY),
            maps_api_key: get(ENV_MAPS_API_KEY),
            maps_map_id: get(ENV_MAPS_MAP_ID),
            default_location,
            clinic_radius_m: get(ENV_CLINIC_RADIUS)
                .and_then(|v| v.parse().ok())
                .filter(|r| *r > 0)
                .unwrap_or(defaults.clinic_radius_m),
            max_upload_mb: get(ENV_MAX_UPLOAD_MB)
                .and_then(|v| v.parse().ok())
                .filter(|m| *m > 0)
                .unwrap_or(defaults.max_upload_mb),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]);
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.api_base_url, "http://localhost:5000/api");
        assert_eq!(config.clinic_radius_m, 5000);
        assert_eq!(config.max_upload_mb, 5);
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("MEDISIGHT_API_BASE_URL", "https://api.example.com/api/"),
            ("MEDISIGHT_GOOGLE_MAPS_API_KEY", "maps-key"),
            ("MEDISIGHT_DEFAULT_LATITUDE", "51.5"),
            ("MEDISIGHT_DEFAULT_LONGITUDE", "-0.12"),
            ("MEDISIGHT_CLINIC_RADIUS_M", "2500"),
        ]);

        assert_eq!(config.api_base_url, "https://api.example.com/api");
        assert_eq!(config.maps_api_key.as_deref(), Some("maps-key"));
        assert_eq!(config.default_location, Coordinate::new(51.5, -0.12));
        assert_eq!(config.clinic_radius_m, 2500);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config_from(&[
            ("MEDISIGHT_FIREBASE_API_KEY", "   "),
            ("MEDISIGHT_DEFAULT_LATITUDE", "200"),
            ("MEDISIGHT_DEFAULT_LONGITUDE", "10"),
            ("MEDISIGHT_MAX_UPLOAD_MB", "zero"),
        ]);

        assert_eq!(config.firebase_api_key, None);
        assert_eq!(config.default_location, DEFAULT_LOCATION);
        assert_eq!(config.max_upload_mb, DEFAULT_MAX_UPLOAD_MB);
    }
}
