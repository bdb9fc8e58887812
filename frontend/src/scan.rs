//! 扫描流程与结果展示
//!
//! 分析失败时不会向用户报错，而是提示后延迟展示该模态的演示结果。

use crate::api::{ImagePayload, MediSightApi};
use crate::error::ApiError;
use crate::request::HttpClient;
use medisight_shared::{
    AnalysisResponse, ScanModality, ScanRecord, ScanResult, Severity, Timestamp,
};
use std::future::Future;

pub const NO_IMAGE_MESSAGE: &str = "Please select an image first";
pub const ANALYSIS_COMPLETE_MESSAGE: &str = "Analysis complete!";
pub const DEMO_WARNING: &str = "Using demo data - Backend API not connected";
pub const DEMO_DELAY_MS: u32 = 2000;
pub const UNKNOWN_CONDITION: &str = "Unknown Condition";

#[async_trait::async_trait(?Send)]
pub trait ScanAnalyzer {
    async fn analyze(
        &self,
        modality: ScanModality,
        image: ImagePayload,
        token: Option<&str>,
    ) -> Result<AnalysisResponse, ApiError>;
}

#[async_trait::async_trait(?Send)]
impl<C: HttpClient> ScanAnalyzer for MediSightApi<C> {
    async fn analyze(
        &self,
        modality: ScanModality,
        image: ImagePayload,
        token: Option<&str>,
    ) -> Result<AnalysisResponse, ApiError> {
        self.analyze_image(modality, image, token).await
    }
}

// =========================================================
// 结果构造
// =========================================================

pub fn clamp_confidence(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

/// 以模态默认值补全后端响应
pub fn result_from_analysis(
    modality: ScanModality,
    response: AnalysisResponse,
    image_url: Option<String>,
) -> ScanResult {
    let disease_name = response
        .disease_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_CONDITION.to_string());
    let recommendations = response
        .recommendations
        .filter(|list| !list.is_empty())
        .unwrap_or_else(|| vec![modality.default_recommendation().to_string()]);

    ScanResult {
        disease_name,
        confidence: clamp_confidence(response.confidence.unwrap_or(0.0)),
        recommendations,
        image_url,
        severity: response
            .severity
            .as_deref()
            .map(Severity::parse_lossy)
            .unwrap_or_default(),
        scan_type: modality,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn demo_result(modality: ScanModality, image_url: Option<String>) -> ScanResult {
    let (disease_name, confidence, recommendations) = match modality {
        ScanModality::Skin => (
            "Eczema (Dermatitis)",
            87,
            strings(&[
                "Consult a dermatologist for professional diagnosis",
                "Keep the affected area moisturized",
                "Avoid harsh soaps and irritants",
                "Consider using hypoallergenic skincare products",
                "Monitor for any changes in symptoms",
            ]),
        ),
        ScanModality::Eye => (
            "Cataracts (Early Stage)",
            82,
            strings(&[
                "Schedule an appointment with an ophthalmologist immediately",
                "Get a comprehensive eye examination",
                "Discuss treatment options including surgery if needed",
                "Protect eyes from UV light with sunglasses",
                "Monitor vision changes regularly",
                "Consider lifestyle modifications to slow progression",
            ]),
        ),
    };
    ScanResult {
        disease_name: disease_name.to_string(),
        confidence,
        recommendations,
        image_url,
        severity: Severity::Medium,
        scan_type: modality,
    }
}

/// 结果页在没有扫描结果时展示的样例
pub fn sample_result() -> ScanResult {
    ScanResult {
        disease_name: "Sample Diagnosis".to_string(),
        confidence: 85,
        recommendations: strings(&[
            "Consult a healthcare professional for proper diagnosis",
            "Monitor symptoms regularly",
            "Follow recommended treatment plans",
        ]),
        image_url: None,
        severity: Severity::Medium,
        scan_type: ScanModality::Skin,
    }
}

/// 历史记录的“查看详情”
pub fn result_from_record(record: &ScanRecord) -> ScanResult {
    ScanResult {
        disease_name: record.disease_name.clone(),
        confidence: clamp_confidence(record.confidence),
        recommendations: strings(&[
            "Consult a healthcare professional",
            "Monitor symptoms regularly",
            "Follow recommended treatment plans",
        ]),
        image_url: record.image_url.clone(),
        severity: record.severity,
        scan_type: record.scan_type,
    }
}

// =========================================================
// 流程
// =========================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Analyzed(ScanResult),
    /// 后端不可用，使用演示数据
    Demo(ScanResult),
}

impl ScanOutcome {
    pub fn result(&self) -> &ScanResult {
        match self {
            ScanOutcome::Analyzed(r) | ScanOutcome::Demo(r) => r,
        }
    }

    pub fn into_result(self) -> ScanResult {
        match self {
            ScanOutcome::Analyzed(r) | ScanOutcome::Demo(r) => r,
        }
    }

    pub fn is_demo(&self) -> bool {
        matches!(self, ScanOutcome::Demo(_))
    }
}

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub modality: ScanModality,
    pub image: ImagePayload,
    /// 结果页展示用的本地预览
    pub image_url: Option<String>,
    pub token: Option<String>,
}

/// 发送图像并构造结果
///
/// 失败时先调用 `on_fallback` 提示，等待 `sleep(DEMO_DELAY_MS)` 后返回演示结果。
pub async fn run_scan<A, S, Fut>(
    analyzer: &A,
    request: ScanRequest,
    on_fallback: impl FnOnce(&'static str),
    sleep: S,
) -> ScanOutcome
where
    A: ScanAnalyzer + ?Sized,
    S: FnOnce(u32) -> Fut,
    Fut: Future<Output = ()>,
{
    let ScanRequest {
        modality,
        image,
        image_url,
        token,
    } = request;

    match analyzer.analyze(modality, image, token.as_deref()).await {
        Ok(response) => {
            log::info!("[Scan] {} analysis complete", modality.as_str());
            ScanOutcome::Analyzed(result_from_analysis(modality, response, image_url))
        }
        Err(err) => {
            log::error!("[Scan] {}", err);
            on_fallback(DEMO_WARNING);
            sleep(DEMO_DELAY_MS).await;
            ScanOutcome::Demo(demo_result(modality, image_url))
        }
    }
}

// =========================================================
// 展示
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    High,
    Moderate,
    Low,
}

impl ConfidenceTier {
    pub fn of(confidence: u8) -> Self {
        match confidence {
            80.. => ConfidenceTier::High,
            60..=79 => ConfidenceTier::Moderate,
            _ => ConfidenceTier::Low,
        }
    }

    pub fn text_class(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "text-success",
            ConfidenceTier::Moderate => "text-warning",
            ConfidenceTier::Low => "text-error",
        }
    }
}

pub fn severity_label(severity: Severity) -> String {
    format!("{} Severity", severity.label())
}

pub fn severity_badge_class(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "badge-success",
        Severity::Medium => "badge-warning",
        Severity::High => "badge-error",
    }
}

fn record_time(record: &ScanRecord) -> Option<Timestamp> {
    let raw = record.created_at.as_deref()?;
    Timestamp::parse_rfc3339(raw).or_else(|| Timestamp::parse_millis(raw))
}

/// 最新的排在前面；无法解析时间的排在最后
pub fn newest_first(records: &mut [ScanRecord]) {
    records.sort_by(|a, b| record_time(b).cmp(&record_time(a)));
}

pub fn record_date(record: &ScanRecord) -> String {
    record_time(record)
        .map(|t| t.to_date_string())
        .unwrap_or_else(|| "N/A".to_string())
}
