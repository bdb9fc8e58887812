use super::*;
use crate::error::HttpError;
use crate::request::{HttpResponse, MockHttpClient, RequestBody};
use medisight_shared::Severity;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

const BASE: &str = "http://api.test/api";

fn api() -> (MediSightApi<Rc<MockHttpClient>>, Rc<MockHttpClient>) {
    let client = Rc::new(MockHttpClient::new());
    (MediSightApi::new(client.clone(), format!("{BASE}/")), client)
}

fn image() -> ImagePayload {
    ImagePayload {
        file_name: "mole.png".to_string(),
        content_type: "image/png".to_string(),
        bytes: vec![0x89, 0x50, 0x4e, 0x47],
    }
}

#[tokio::test]
async fn analyze_sends_multipart_with_bearer() {
    let (api, client) = api();
    client.mock_response(
        HttpMethod::Post,
        &format!("{BASE}/scan/skin"),
        200,
        json!({ "disease_name": "Melanoma", "confidence": 91.5, "severity": "high" }),
    );

    let resp = api.analyze_skin(image(), Some("id-token")).await.unwrap();
    assert_eq!(resp.disease_name.as_deref(), Some("Melanoma"));
    assert_eq!(resp.severity.as_deref(), Some("high"));

    let req = client.last_request().unwrap();
    assert_eq!(req.header("Authorization"), Some("Bearer id-token"));
    match req.body {
        RequestBody::Multipart(parts) => {
            assert_eq!(parts.len(), 1);
            assert_eq!(parts[0].field, "image");
            assert_eq!(parts[0].file_name, "mole.png");
        }
        other => panic!("unexpected body {other:?}"),
    }
}

#[tokio::test]
async fn analyze_without_token_omits_header() {
    let (api, client) = api();
    client.mock_response(HttpMethod::Post, &format!("{BASE}/scan/eye"), 200, json!({}));

    let resp = api.analyze_eye(image(), None).await.unwrap();
    assert_eq!(resp, AnalysisResponse::default());
    assert!(client.last_request().unwrap().header("Authorization").is_none());
}

#[tokio::test]
async fn non_success_status_names_the_operation() {
    let (api, client) = api();
    client.mock_response(HttpMethod::Post, &format!("{BASE}/scan/eye"), 500, json!({}));

    let err = api.analyze_eye(image(), None).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Status {
            operation: "analyze eye image",
            status: 500
        }
    );
    assert!(err.is_server_error());
}

#[tokio::test]
async fn transport_failure_is_network_error() {
    let (api, client) = api();
    let url = format!("{BASE}/clinics/nearby?latitude=1&longitude=2&radius=5000");
    client.mock_network_error(HttpMethod::Get, &url);

    let err = api
        .nearby_clinics(Coordinate::new(1.0, 2.0), 5000)
        .await
        .unwrap_err();
    assert!(err.is_network());
}

#[tokio::test]
async fn nearby_clinics_accepts_both_shapes() {
    let (api, client) = api();
    let url = format!("{BASE}/clinics/nearby?latitude=40.7128&longitude=-74.006&radius=5000");
    client.mock_response(
        HttpMethod::Get,
        &url,
        200,
        json!({ "clinics": [{ "name": "City Medical Center", "location": { "lat": 40.71, "lng": -74.0 } }] }),
    );

    let clinics = api
        .nearby_clinics(Coordinate::new(40.7128, -74.006), 5000)
        .await
        .unwrap();
    assert_eq!(clinics.len(), 1);
    assert_eq!(clinics[0].name, "City Medical Center");

    client.mock_response(HttpMethod::Get, &url, 200, json!([{ "name": "A" }, { "name": "B" }]));
    let clinics = api
        .nearby_clinics(Coordinate::new(40.7128, -74.006), 5000)
        .await
        .unwrap();
    assert_eq!(clinics.len(), 2);
}

#[tokio::test]
async fn nameless_clinic_is_decode_error() {
    let (api, client) = api();
    let url = format!("{BASE}/clinics/nearby?latitude=0&longitude=0&radius=100");
    client.mock_response(HttpMethod::Get, &url, 200, json!([{ "address": "x" }]));

    let err = api
        .nearby_clinics(Coordinate::new(0.0, 0.0), 100)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode { operation: "nearby clinics", .. }));
}

#[tokio::test]
async fn chat_forwards_history() {
    let (api, client) = api();
    client.mock_response(
        HttpMethod::Post,
        &format!("{BASE}/chat"),
        200,
        json!({ "response": "Drink water." }),
    );

    let history = vec![ChatMessage::assistant("Hello!")];
    let reply = api.chat("I have a headache", &history).await.unwrap();
    assert_eq!(reply, "Drink water.");

    let req = client.last_request().unwrap();
    assert_eq!(req.header("Content-Type"), Some("application/json"));
    let RequestBody::Json(body) = req.body else {
        panic!("expected json body");
    };
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["message"], "I have a headache");
    assert_eq!(body["history"][0]["role"], "assistant");
}

#[tokio::test]
async fn history_and_stats_paths() {
    let (api, client) = api();
    client.mock_response(
        HttpMethod::Get,
        &format!("{BASE}/detect/history/u1?page=2&per_page=20&type=skin"),
        200,
        json!({ "items": [{ "id": 7, "scan_type": "skin", "disease_name": "Acne", "confidence": 70.0 }], "page": 2, "per_page": 20, "total": 21 }),
    );
    client.mock_response(
        HttpMethod::Get,
        &format!("{BASE}/detect/stats/u1"),
        200,
        json!({ "total_scans": 3, "skin_scans": 2, "eye_scans": 1 }),
    );

    let mut request = ScanHistoryRequest::first_page("u1");
    request.page = 2;
    request.scan_type = Some(ScanModality::Skin);
    let page = api.scan_history(&request).await.unwrap();
    assert_eq!(page.items[0].id, "7");
    assert_eq!(page.items[0].severity, Severity::Medium);
    assert!(!page.has_next());

    let stats = api.user_stats("u1").await.unwrap();
    assert_eq!(stats.total_scans, 3);
}

#[tokio::test]
async fn register_accepts_empty_body() {
    let (api, client) = api();
    client.mock_raw(HttpMethod::Post, &format!("{BASE}/auth/register"), 201, "");

    let request = RegisterUserRequest {
        uid: "u1".into(),
        email: "a@b.co".into(),
        name: "a".into(),
    };
    api.register_user(&request).await.unwrap();
}

#[tokio::test]
async fn dashboard_stats_merges_both_calls() {
    let (api, client) = api();
    client.mock_response(
        HttpMethod::Get,
        &format!("{BASE}/detect/stats/u1"),
        200,
        json!({ "total_scans": 5, "skin_scans": 3, "eye_scans": 2 }),
    );
    client.mock_response(
        HttpMethod::Get,
        &format!("{BASE}/appointments/u1"),
        200,
        json!({ "appointments": [
            { "id": "1", "doctor_name": "Dr. Sarah Johnson", "date": "2030-01-01", "time": "09:00 AM", "status": "scheduled" },
            { "id": "2", "doctor_name": "Dr. Michael Chen", "date": "2020-01-01", "time": "10:00 AM", "status": "completed" },
            { "id": "3", "doctor_name": "Dr. Emily Williams", "date": "2030-02-01", "time": "11:00 AM", "status": "cancelled" }
        ] }),
    );

    let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let stats = api.dashboard_stats("u1", today).await.unwrap();
    assert_eq!(stats.total_scans, 5);
    assert_eq!(stats.skin_scans, 3);
    assert_eq!(stats.total_appointments, 3);
    assert_eq!(stats.upcoming_appointments, 1);
}

#[tokio::test]
async fn dashboard_stats_fails_when_either_call_fails() {
    let (api, client) = api();
    client.mock_response(
        HttpMethod::Get,
        &format!("{BASE}/detect/stats/u1"),
        200,
        json!({ "total_scans": 5 }),
    );
    // appointments 未 mock => 404

    let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let err = api.dashboard_stats("u1", today).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.operation(), "list appointments");
}

// =========================================================
// 有状态的假后端：预约的创建、列出、取消
// =========================================================

#[derive(Default)]
struct FakeBackend {
    appointments: RefCell<Vec<serde_json::Value>>,
    next_id: RefCell<u32>,
}

#[async_trait::async_trait(?Send)]
impl HttpClient for FakeBackend {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        let path = req
            .url
            .strip_prefix(BASE)
            .ok_or_else(|| HttpError::Network("unknown host".into()))?
            .to_string();
        let reply = |status: u16, body: serde_json::Value| -> Result<HttpResponse, HttpError> {
            Ok(HttpResponse {
                status,
                body: body.to_string(),
            })
        };

        match (req.method, path.as_str()) {
            (HttpMethod::Post, "/appointments") => {
                let RequestBody::Json(body) = &req.body else {
                    return reply(400, json!({ "error": "json expected" }));
                };
                let mut record: serde_json::Value = serde_json::from_str(body)
                    .map_err(|e| HttpError::ResponseRead(e.to_string()))?;
                let mut next = self.next_id.borrow_mut();
                *next += 1;
                record["id"] = json!(*next);
                record["status"] = json!("scheduled");
                self.appointments.borrow_mut().push(record);
                reply(201, json!({ "id": *next, "message": "Appointment booked" }))
            }
            (HttpMethod::Get, p) if p.starts_with("/appointments/") => {
                reply(200, json!(self.appointments.borrow().clone()))
            }
            (HttpMethod::Delete, p) if p.starts_with("/appointments/") => {
                let id: u32 = p.trim_start_matches("/appointments/").parse().unwrap_or(0);
                let mut list = self.appointments.borrow_mut();
                let before = list.len();
                list.retain(|a| a["id"] != json!(id));
                if list.len() == before {
                    reply(404, json!({ "error": "not found" }))
                } else {
                    Ok(HttpResponse {
                        status: 204,
                        body: String::new(),
                    })
                }
            }
            _ => reply(404, json!({ "error": "not found" })),
        }
    }
}

#[tokio::test]
async fn appointment_round_trip() {
    let api = MediSightApi::new(FakeBackend::default(), BASE);

    let booking = CreateAppointmentRequest {
        user_id: "u1".into(),
        doctor_name: "Dr. Emily Williams".into(),
        specialty: "General Physician".into(),
        clinic_name: "MediSight Clinic".into(),
        date: "2030-03-04".into(),
        time: "02:00 PM".into(),
        notes: None,
    };

    let receipt = api.create_appointment(&booking).await.unwrap();
    assert_eq!(receipt.id.as_deref(), Some("1"));

    let listed = api.list_appointments("u1", None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].doctor_name, "Dr. Emily Williams");
    assert_eq!(listed[0].status, AppointmentStatus::Scheduled);

    api.cancel_appointment(&listed[0].id).await.unwrap();
    assert!(api.list_appointments("u1", None).await.unwrap().is_empty());

    let err = api.cancel_appointment("99").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}
