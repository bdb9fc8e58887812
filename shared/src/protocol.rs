use crate::{
    Appointment, AppointmentReceipt, AppointmentStatus, ChatMessage, Clinic,
    CreateAppointmentRequest, DEFAULT_CLINIC_RADIUS_M, DEFAULT_HISTORY_PAGE_SIZE, HistoryPage,
    ScanModality, UserStats,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// 是否携带 JSON 请求体
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
///
/// 路径相对于后端的 base URL；`Get` / `Delete` 请求不发送请求体，参数只走路径与查询串。
pub trait ApiRequest: Serialize {
    /// The response type returned by this request.
    type Response: DeserializeOwned;
    /// The HTTP method.
    const METHOD: HttpMethod;
    /// 操作名，出现在错误信息里
    const OPERATION: &'static str;

    /// The URL path (or suffix).
    fn path(&self) -> String;

    fn query(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// 只关心成功与否的接口的响应
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

// =========================================================
// Chat
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(alias = "reply", alias = "message")]
    pub response: String,
}

impl ApiRequest for ChatRequest {
    type Response = ChatResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    const OPERATION: &'static str = "chat";

    fn path(&self) -> String {
        "/chat".to_string()
    }
}

// =========================================================
// Appointments
// =========================================================

impl ApiRequest for CreateAppointmentRequest {
    type Response = AppointmentReceipt;
    const METHOD: HttpMethod = HttpMethod::Post;
    const OPERATION: &'static str = "create appointment";

    fn path(&self) -> String {
        "/appointments".to_string()
    }
}

/// 预约列表：后端可能返回 `{"appointments": [...]}` 或裸数组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AppointmentList {
    Wrapped { appointments: Vec<Appointment> },
    Bare(Vec<Appointment>),
}

impl AppointmentList {
    pub fn into_vec(self) -> Vec<Appointment> {
        match self {
            AppointmentList::Wrapped { appointments } => appointments,
            AppointmentList::Bare(list) => list,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListAppointmentsRequest {
    pub user_id: String,
    pub status: Option<AppointmentStatus>,
}

impl ApiRequest for ListAppointmentsRequest {
    type Response = AppointmentList;
    const METHOD: HttpMethod = HttpMethod::Get;
    const OPERATION: &'static str = "list appointments";

    fn path(&self) -> String {
        format!("/appointments/{}", self.user_id)
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        self.status
            .map(|s| vec![("status", s.as_str().to_string())])
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub id: String,
}

impl ApiRequest for CancelAppointmentRequest {
    type Response = Option<Ack>;
    const METHOD: HttpMethod = HttpMethod::Delete;
    const OPERATION: &'static str = "cancel appointment";

    fn path(&self) -> String {
        format!("/appointments/{}", self.id)
    }
}

// =========================================================
// Clinics
// =========================================================

/// 附近诊所响应：`{"clinics": [...]}` 或裸数组。缺少 name 的记录整体解码失败。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClinicSearchResponse {
    Wrapped { clinics: Vec<Clinic> },
    Bare(Vec<Clinic>),
}

impl ClinicSearchResponse {
    pub fn into_vec(self) -> Vec<Clinic> {
        match self {
            ClinicSearchResponse::Wrapped { clinics } => clinics,
            ClinicSearchResponse::Bare(list) => list,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NearbyClinicsRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: u32,
}

impl NearbyClinicsRequest {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            radius: DEFAULT_CLINIC_RADIUS_M,
        }
    }
}

impl ApiRequest for NearbyClinicsRequest {
    type Response = ClinicSearchResponse;
    const METHOD: HttpMethod = HttpMethod::Get;
    const OPERATION: &'static str = "nearby clinics";

    fn path(&self) -> String {
        "/clinics/nearby".to_string()
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
            ("radius", self.radius.to_string()),
        ]
    }
}

// =========================================================
// Users / History / Stats
// =========================================================

/// 幂等注册（upsert）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub uid: String,
    pub email: String,
    pub name: String,
}

impl ApiRequest for RegisterUserRequest {
    type Response = Option<Ack>;
    const METHOD: HttpMethod = HttpMethod::Post;
    const OPERATION: &'static str = "register user";

    fn path(&self) -> String {
        "/auth/register".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanHistoryRequest {
    pub user_id: String,
    pub page: u32,
    pub per_page: u32,
    pub scan_type: Option<ScanModality>,
}

impl ScanHistoryRequest {
    pub fn first_page(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            page: 1,
            per_page: DEFAULT_HISTORY_PAGE_SIZE,
            scan_type: None,
        }
    }
}

impl ApiRequest for ScanHistoryRequest {
    type Response = HistoryPage;
    const METHOD: HttpMethod = HttpMethod::Get;
    const OPERATION: &'static str = "scan history";

    fn path(&self) -> String {
        format!("/detect/history/{}", self.user_id)
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        if let Some(modality) = self.scan_type {
            query.push(("type", modality.as_str().to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatsRequest {
    pub user_id: String,
}

impl ApiRequest for UserStatsRequest {
    type Response = UserStats;
    const METHOD: HttpMethod = HttpMethod::Get;
    const OPERATION: &'static str = "user stats";

    fn path(&self) -> String {
        format!("/detect/stats/{}", self.user_id)
    }
}
