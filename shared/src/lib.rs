use serde::{Deserialize, Deserializer, Serialize};

pub mod date;
pub mod protocol;

pub use chrono;
pub use date::Timestamp;

// =========================================================
// 常量定义 (Constants)
// =========================================================

/// 附近诊所搜索的默认半径（米）
pub const DEFAULT_CLINIC_RADIUS_M: u32 = 5000;
/// 扫描历史分页大小
pub const DEFAULT_HISTORY_PAGE_SIZE: u32 = 20;
/// 图像分析接口中 multipart 的字段名
pub const MULTIPART_IMAGE_FIELD: &str = "image";

// =========================================================
// 地理位置 (Geography)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude", alias = "lon")]
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// 纬度 [-90, 90]，经度 [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

// =========================================================
// 诊所 (Clinic)
// =========================================================

/// 后端附近搜索返回的诊所记录，收到后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clinic {
    pub name: String,
    #[serde(default, alias = "vicinity")]
    pub address: Option<String>,
    #[serde(default, alias = "phone_number")]
    pub phone: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default, alias = "user_ratings_total")]
    pub total_ratings: Option<u32>,
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default, alias = "type")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_opening_hours")]
    pub opening_hours: Option<OpeningHours>,
    #[serde(default)]
    pub open_now: Option<bool>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default, alias = "google_maps_url", alias = "url")]
    pub maps_url: Option<String>,
    #[serde(
        default,
        alias = "coordinates",
        alias = "geometry",
        deserialize_with = "lenient_location"
    )]
    pub location: Option<Coordinate>,
}

/// 营业时间：`weekday_text` 为逐日描述
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OpeningHours {
    #[serde(default)]
    pub open_now: Option<bool>,
    #[serde(default)]
    pub weekday_text: Vec<String>,
}

impl Clinic {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            phone: None,
            rating: None,
            total_ratings: None,
            place_id: None,
            category: None,
            opening_hours: None,
            open_now: None,
            website: None,
            maps_url: None,
            location: None,
        }
    }

    pub fn with_location(mut self, location: Coordinate) -> Self {
        self.location = Some(location);
        self
    }

    /// 可用于地图标记的坐标（无效坐标视为缺失）
    pub fn marker_position(&self) -> Option<Coordinate> {
        self.location.filter(Coordinate::is_valid)
    }

    /// 列表渲染用的稳定 key
    pub fn key(&self) -> String {
        self.place_id.clone().unwrap_or_else(|| self.name.clone())
    }

    /// 顶层 `open_now` 优先，其次取营业时间里的值
    pub fn is_open_now(&self) -> Option<bool> {
        self.open_now
            .or_else(|| self.opening_hours.as_ref().and_then(|h| h.open_now))
    }

    pub fn hours_summary(&self) -> Option<&str> {
        self.opening_hours
            .as_ref()
            .and_then(|h| h.weekday_text.first())
            .map(String::as_str)
    }

    /// 导航链接：优先使用后端给出的地图 URL（仅限 http/https）
    pub fn directions_url(&self) -> Option<String> {
        if let Some(url) = self.maps_url.as_deref().filter(|u| is_web_url(u)) {
            return Some(url.to_string());
        }
        self.marker_position().map(|c| {
            format!(
                "https://www.google.com/maps/dir/?api=1&destination={},{}",
                c.lat, c.lng
            )
        })
    }
}

// =========================================================
// 扫描 (Scan)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScanModality {
    #[default]
    Skin,
    Eye,
}

impl ScanModality {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanModality::Skin => "skin",
            ScanModality::Eye => "eye",
        }
    }

    /// 分析接口路径
    pub fn endpoint(&self) -> &'static str {
        match self {
            ScanModality::Skin => "/scan/skin",
            ScanModality::Eye => "/scan/eye",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScanModality::Skin => "Skin",
            ScanModality::Eye => "Eye",
        }
    }

    /// 后端未给出建议时的默认建议
    pub fn default_recommendation(&self) -> &'static str {
        match self {
            ScanModality::Skin => "Consult a dermatologist",
            ScanModality::Eye => "Consult an ophthalmologist",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
}

impl Severity {
    /// 宽松解析，未知值回落到 Medium
    pub fn parse_lossy(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" | "mild" => Severity::Low,
            "high" | "severe" => Severity::High,
            _ => Severity::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

/// 分析接口的原始响应，字段均可能缺失
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default, alias = "diagnosis", alias = "prediction")]
    pub disease_name: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub recommendations: Option<Vec<String>>,
    #[serde(default)]
    pub severity: Option<String>,
}

/// 一次扫描的展示结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub disease_name: String,
    /// 百分比 [0, 100]
    pub confidence: u8,
    pub recommendations: Vec<String>,
    pub image_url: Option<String>,
    pub severity: Severity,
    pub scan_type: ScanModality,
}

/// 扫描历史中的一条记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(alias = "type")]
    pub scan_type: ScanModality,
    #[serde(alias = "diagnosis", alias = "prediction")]
    pub disease_name: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, alias = "timestamp")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    #[serde(default, alias = "history", alias = "scans")]
    pub items: Vec<ScanRecord>,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub per_page: u32,
    #[serde(default)]
    pub total: u32,
}

impl HistoryPage {
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 1;
        }
        self.total.div_ceil(self.per_page).max(1)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

fn first_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_HISTORY_PAGE_SIZE
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(default)]
    pub total_scans: u32,
    #[serde(default)]
    pub skin_scans: u32,
    #[serde(default)]
    pub eye_scans: u32,
}

/// 仪表盘聚合统计：由 stats 与 appointments 两次调用在客户端合并而来
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_scans: u32,
    pub skin_scans: u32,
    pub eye_scans: u32,
    pub total_appointments: u32,
    pub upcoming_appointments: u32,
}

// =========================================================
// 预约 (Appointments)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    #[serde(alias = "pending", alias = "confirmed", alias = "upcoming")]
    Scheduled,
    Completed,
    #[serde(alias = "canceled")]
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub doctor_name: String,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub clinic_name: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Appointment {
    pub fn parsed_date(&self) -> Option<chrono::NaiveDate> {
        chrono::NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }
}

/// 预约表单提交的负载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub user_id: String,
    pub doctor_name: String,
    pub specialty: String,
    pub clinic_name: String,
    pub date: String,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// 创建预约的回执
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentReceipt {
    #[serde(default, alias = "appointment_id", deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// =========================================================
// 聊天 (Chat)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "bot", alias = "model")]
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == ChatRole::User
    }
}

// =========================================================
// 反序列化辅助 (Deserialize helpers)
// =========================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Int(i64),
    Float(f64),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Int(n) => n.to_string(),
            StringOrNumber::Float(n) => n.to_string(),
        }
    }
}

/// 后端 id 可能是数字也可能是字符串
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<StringOrNumber>::deserialize(deserializer).map(|v| v.map(String::from))
}

fn is_web_url(url: &str) -> bool {
    let url = url.trim_start().to_ascii_lowercase();
    url.starts_with("https://") || url.starts_with("http://")
}

// 坐标可能是平铺的 {lat,lng}，也可能是 Places 的 {location:{lat,lng}}
#[derive(Deserialize)]
#[serde(untagged)]
enum LocationShape {
    Flat(Coordinate),
    Nested { location: Coordinate },
    Other(serde::de::IgnoredAny),
}

/// 形状不认识的坐标视为缺失，不让整条记录解码失败
fn lenient_location<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Coordinate>, D::Error> {
    Ok(match LocationShape::deserialize(deserializer)? {
        LocationShape::Flat(c) | LocationShape::Nested { location: c } => Some(c),
        LocationShape::Other(_) => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OpeningHoursShape {
    Lines(Vec<String>),
    Places(OpeningHours),
    Other(serde::de::IgnoredAny),
}

fn lenient_opening_hours<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<OpeningHours>, D::Error> {
    Ok(match OpeningHoursShape::deserialize(deserializer)? {
        OpeningHoursShape::Lines(weekday_text) => Some(OpeningHours {
            open_now: None,
            weekday_text,
        }),
        OpeningHoursShape::Places(hours) => Some(hours),
        OpeningHoursShape::Other(_) => None,
    })
}
