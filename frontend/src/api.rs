//! 后端 REST API 网关
//!
//! 每个后端操作对应一个方法、一次 HTTP 请求，不重试、不缓存。
//! 非 2xx 状态、传输失败、响应无法解码分别映射为 `ApiError` 的三个变体。

use crate::error::ApiError;
use crate::request::{FilePart, HttpClient, HttpRequest, join_url, with_query};
use medisight_shared::chrono::NaiveDate;
use medisight_shared::protocol::{
    ApiRequest, CancelAppointmentRequest, ChatRequest, HttpMethod, ListAppointmentsRequest,
    NearbyClinicsRequest, RegisterUserRequest, ScanHistoryRequest, UserStatsRequest,
};
use medisight_shared::{
    AnalysisResponse, Appointment, AppointmentReceipt, AppointmentStatus, ChatMessage, Clinic,
    Coordinate, CreateAppointmentRequest, DashboardStats, HistoryPage, MULTIPART_IMAGE_FIELD,
    ScanModality, UserStats,
};

#[cfg(test)]
mod tests;

/// 待分析的图像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    fn into_part(self) -> FilePart {
        FilePart {
            field: MULTIPART_IMAGE_FIELD.to_string(),
            file_name: self.file_name,
            content_type: self.content_type,
            bytes: self.bytes,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MediSightApi<C> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> MediSightApi<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// 发送请求并解析响应
    async fn dispatch<T: serde::de::DeserializeOwned>(
        &self,
        operation: &'static str,
        req: HttpRequest,
    ) -> Result<T, ApiError> {
        let res = self
            .client
            .send(req)
            .await
            .map_err(|source| ApiError::Network { operation, source })?;

        if !res.ok() {
            return Err(ApiError::Status {
                operation,
                status: res.status,
            });
        }

        res.json::<T>().map_err(|e| ApiError::Decode {
            operation,
            message: e.to_string(),
        })
    }

    /// 通用执行：方法、路径、查询串均由 `ApiRequest` 描述
    pub async fn execute<R: ApiRequest>(&self, request: &R) -> Result<R::Response, ApiError> {
        let url = with_query(self.url(&request.path()), &request.query());
        let mut req = HttpRequest::new(&url, R::METHOD);

        if R::METHOD.has_body() {
            let body = serde_json::to_string(request).map_err(|e| ApiError::Decode {
                operation: R::OPERATION,
                message: e.to_string(),
            })?;
            req = req.with_json(body);
        }

        self.dispatch(R::OPERATION, req).await
    }

    // =========================================================
    // 扫描
    // =========================================================

    /// 上传图像做分析，`token` 存在时附带 Bearer 头
    pub async fn analyze_image(
        &self,
        modality: ScanModality,
        image: ImagePayload,
        token: Option<&str>,
    ) -> Result<AnalysisResponse, ApiError> {
        let operation = match modality {
            ScanModality::Skin => "analyze skin image",
            ScanModality::Eye => "analyze eye image",
        };
        let req = HttpRequest::new(&self.url(modality.endpoint()), HttpMethod::Post)
            .with_bearer(token)
            .with_file(image.into_part());

        self.dispatch(operation, req).await
    }

    pub async fn analyze_skin(
        &self,
        image: ImagePayload,
        token: Option<&str>,
    ) -> Result<AnalysisResponse, ApiError> {
        self.analyze_image(ScanModality::Skin, image, token).await
    }

    pub async fn analyze_eye(
        &self,
        image: ImagePayload,
        token: Option<&str>,
    ) -> Result<AnalysisResponse, ApiError> {
        self.analyze_image(ScanModality::Eye, image, token).await
    }

    // =========================================================
    // 聊天
    // =========================================================

    pub async fn chat(&self, message: &str, history: &[ChatMessage]) -> Result<String, ApiError> {
        let request = ChatRequest {
            message: message.to_string(),
            history: history.to_vec(),
        };
        Ok(self.execute(&request).await?.response)
    }

    // =========================================================
    // 预约
    // =========================================================

    pub async fn create_appointment(
        &self,
        request: &CreateAppointmentRequest,
    ) -> Result<AppointmentReceipt, ApiError> {
        self.execute(request).await
    }

    pub async fn list_appointments(
        &self,
        user_id: &str,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>, ApiError> {
        let request = ListAppointmentsRequest {
            user_id: user_id.to_string(),
            status,
        };
        Ok(self.execute(&request).await?.into_vec())
    }

    pub async fn cancel_appointment(&self, id: &str) -> Result<(), ApiError> {
        let request = CancelAppointmentRequest { id: id.to_string() };
        self.execute(&request).await.map(|_| ())
    }

    // =========================================================
    // 诊所 / 用户 / 历史
    // =========================================================

    pub async fn nearby_clinics(
        &self,
        location: Coordinate,
        radius_m: u32,
    ) -> Result<Vec<Clinic>, ApiError> {
        let request = NearbyClinicsRequest {
            latitude: location.lat,
            longitude: location.lng,
            radius: radius_m,
        };
        Ok(self.execute(&request).await?.into_vec())
    }

    pub async fn register_user(&self, request: &RegisterUserRequest) -> Result<(), ApiError> {
        self.execute(request).await.map(|_| ())
    }

    pub async fn scan_history(&self, request: &ScanHistoryRequest) -> Result<HistoryPage, ApiError> {
        self.execute(request).await
    }

    pub async fn user_stats(&self, user_id: &str) -> Result<UserStats, ApiError> {
        let request = UserStatsRequest {
            user_id: user_id.to_string(),
        };
        self.execute(&request).await
    }

    /// 并发请求扫描统计与预约列表，两者都返回后同步合并
    pub async fn dashboard_stats(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<DashboardStats, ApiError> {
        let (stats, appointments) = futures::join!(
            self.user_stats(user_id),
            self.list_appointments(user_id, None)
        );
        Ok(crate::appointments::merge_dashboard_stats(
            stats?,
            &appointments?,
            today,
        ))
    }
}
