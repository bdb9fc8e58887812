//! Firebase Authentication（REST API）
//!
//! 通过 Identity Toolkit 与 Secure Token 两组 REST 接口实现 `AuthProvider`。
//! refresh token 持久化在 `TokenStore` 中，启动时据此恢复会话。

use super::{AuthProvider, IdentityListener, ListenerRegistry, ProviderUser, Subscription};
use crate::error::ProviderError;
use crate::request::{HttpClient, HttpRequest, HttpResponse};
use medisight_shared::Timestamp;
use medisight_shared::protocol::HttpMethod;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

// =========================================================
// 常量定义
// =========================================================

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/token";
pub const REFRESH_TOKEN_KEY: &str = "medisight_refresh_token";
/// 距过期不足该时长时刷新 ID token
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// refresh token 的持久化位置
pub trait TokenStore {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

// =========================================================
// 协议结构
// =========================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    user_id: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// 服务端错误码（`"WEAK_PASSWORD : Password should be ..."` 取冒号前部分）
fn translate_error(raw: &str) -> ProviderError {
    let (code, detail) = match raw.split_once(" : ") {
        Some((code, detail)) => (code.trim(), detail.trim()),
        None => (raw.trim(), ""),
    };
    let mapped = match code {
        "EMAIL_EXISTS" => "auth/email-already-in-use",
        "EMAIL_NOT_FOUND" => "auth/user-not-found",
        "INVALID_PASSWORD" => "auth/wrong-password",
        "INVALID_LOGIN_CREDENTIALS" => "auth/invalid-credential",
        "USER_DISABLED" => "auth/user-disabled",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "auth/too-many-requests",
        "INVALID_EMAIL" | "MISSING_EMAIL" => "auth/invalid-email",
        "WEAK_PASSWORD" => "auth/weak-password",
        "TOKEN_EXPIRED" | "INVALID_ID_TOKEN" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => {
            "auth/user-token-expired"
        }
        _ => "auth/internal-error",
    };
    let message = if detail.is_empty() { code } else { detail };
    ProviderError::new(mapped, message)
}

fn lifetime(expires_in: Option<&str>) -> Duration {
    let secs = expires_in
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    Duration::from_secs(secs)
}

// =========================================================
// 会话状态
// =========================================================

#[derive(Debug, Clone)]
struct TokenState {
    user: ProviderUser,
    id_token: String,
    refresh_token: String,
    expires_at: Timestamp,
}

impl TokenState {
    fn needs_refresh(&self, now: Timestamp) -> bool {
        now + TOKEN_REFRESH_MARGIN >= self.expires_at
    }
}

pub struct FirebaseAuth<C, S> {
    client: C,
    store: S,
    api_key: Option<String>,
    state: RefCell<Option<TokenState>>,
    listeners: Rc<ListenerRegistry>,
    clock: fn() -> Timestamp,
}

impl<C: HttpClient, S: TokenStore> FirebaseAuth<C, S> {
    pub fn new(client: C, store: S, api_key: Option<String>) -> Self {
        Self {
            client,
            store,
            api_key,
            state: RefCell::new(None),
            listeners: ListenerRegistry::new(),
            clock: Timestamp::now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> Timestamp) -> Self {
        self.clock = clock;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ProviderError::new("auth/not-configured", "Firebase API key is missing"))
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, ProviderError> {
        let body = serde_json::to_string(body)
            .map_err(|e| ProviderError::new("auth/internal-error", e.to_string()))?;
        let req = HttpRequest::new(&url, HttpMethod::Post).with_json(body);

        let res: HttpResponse = self
            .client
            .send(req)
            .await
            .map_err(|e| ProviderError::network(e.to_string()))?;

        if !res.ok() {
            return Err(match serde_json::from_str::<ErrorEnvelope>(&res.body) {
                Ok(envelope) => translate_error(&envelope.error.message),
                Err(_) => ProviderError::new(
                    "auth/internal-error",
                    format!("authentication service returned {}", res.status),
                ),
            });
        }

        res.json::<T>()
            .map_err(|e| ProviderError::new("auth/internal-error", e.to_string()))
    }

    fn toolkit_url(&self, method: &str) -> Result<String, ProviderError> {
        Ok(format!("{IDENTITY_TOOLKIT_URL}/accounts:{method}?key={}", self.key()?))
    }

    /// 写入新的令牌状态并通知监听器
    fn establish(&self, state: TokenState) -> ProviderUser {
        self.store.save(&state.refresh_token);
        let user = state.user.clone();
        *self.state.borrow_mut() = Some(state);
        self.listeners.emit(Some(user.clone()));
        user
    }

    fn clear(&self) {
        self.store.clear();
        let had_session = self.state.borrow_mut().take().is_some();
        if had_session {
            self.listeners.emit(None);
        }
    }

    async fn password_flow(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, ProviderError> {
        let url = self.toolkit_url(method)?;
        let resp: TokenResponse = self
            .post(
                url,
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        let (id_token, refresh_token) = match (resp.id_token, resp.refresh_token) {
            (Some(id), Some(refresh)) => (id, refresh),
            _ => {
                return Err(ProviderError::new(
                    "auth/internal-error",
                    "missing tokens in response",
                ));
            }
        };

        // 创建时间由 lookup 提供；新注册账户以当前时间近似
        let created_at = match self.lookup(&id_token).await {
            Ok(Some(user)) => user.created_at,
            _ if method == "signUp" => Some((self.clock)()),
            _ => None,
        };

        let state = TokenState {
            user: ProviderUser {
                uid: resp.local_id,
                email: resp.email.unwrap_or_else(|| email.to_string()),
                display_name: resp.display_name.filter(|n| !n.is_empty()),
                created_at,
            },
            id_token,
            refresh_token,
            expires_at: (self.clock)() + lifetime(resp.expires_in.as_deref()),
        };
        Ok(self.establish(state))
    }

    async fn lookup(&self, id_token: &str) -> Result<Option<ProviderUser>, ProviderError> {
        let url = self.toolkit_url("lookup")?;
        let resp: LookupResponse = self.post(url, &LookupRequest { id_token }).await?;
        Ok(resp.users.into_iter().next().map(|u| ProviderUser {
            uid: u.local_id,
            email: u.email.unwrap_or_default(),
            display_name: u.display_name.filter(|n| !n.is_empty()),
            created_at: u.created_at.as_deref().and_then(Timestamp::parse_millis),
        }))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, ProviderError> {
        let url = format!("{SECURE_TOKEN_URL}?key={}", self.key()?);
        self.post(
            url,
            &RefreshRequest {
                grant_type: "refresh_token",
                refresh_token,
            },
        )
        .await
    }

    /// 刷新当前会话的 ID token；令牌失效时清除会话
    async fn refresh_current(&self, current: TokenState) -> Option<String> {
        match self.refresh(&current.refresh_token).await {
            Ok(resp) => {
                let expires_at = (self.clock)() + lifetime(resp.expires_in.as_deref());
                self.store.save(&resp.refresh_token);
                let token = resp.id_token.clone();
                *self.state.borrow_mut() = Some(TokenState {
                    id_token: resp.id_token,
                    refresh_token: resp.refresh_token,
                    expires_at,
                    ..current
                });
                Some(token)
            }
            Err(err) if err.code == "auth/network-request-failed" => {
                log::warn!("[Auth] Token refresh failed: {}", err);
                None
            }
            Err(err) => {
                log::warn!("[Auth] Session expired: {}", err);
                self.clear();
                None
            }
        }
    }
}

#[async_trait::async_trait(?Send)]
impl<C: HttpClient, S: TokenStore> AuthProvider for FirebaseAuth<C, S> {
    fn subscribe(&self, listener: IdentityListener) -> Subscription {
        self.listeners.add(listener)
    }

    async fn restore(&self) {
        let Some(refresh_token) = self.store.load() else {
            self.listeners.emit(None);
            return;
        };
        if !self.is_configured() {
            self.listeners.emit(None);
            return;
        }

        let restored = async {
            let resp = self.refresh(&refresh_token).await?;
            let user = self
                .lookup(&resp.id_token)
                .await?
                .unwrap_or_else(|| ProviderUser {
                    uid: resp.user_id.clone(),
                    email: String::new(),
                    display_name: None,
                    created_at: None,
                });
            Ok::<_, ProviderError>(TokenState {
                user,
                expires_at: (self.clock)() + lifetime(resp.expires_in.as_deref()),
                id_token: resp.id_token,
                refresh_token: resp.refresh_token,
            })
        }
        .await;

        match restored {
            Ok(state) => {
                log::info!("[Auth] Session restored for {}", state.user.uid);
                self.establish(state);
            }
            Err(err) => {
                log::warn!("[Auth] Could not restore session: {}", err);
                if err.code != "auth/network-request-failed" {
                    self.store.clear();
                }
                self.listeners.emit(None);
            }
        }
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, ProviderError> {
        self.password_flow("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, ProviderError> {
        self.password_flow("signInWithPassword", email, password)
            .await
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.clear();
        Ok(())
    }

    async fn update_display_name(&self, name: &str) -> Result<ProviderUser, ProviderError> {
        let id_token = self
            .id_token()
            .await
            .ok_or_else(|| ProviderError::new("auth/user-token-expired", "Not signed in"))?;
        let url = self.toolkit_url("update")?;
        let resp: TokenResponse = self
            .post(
                url,
                &UpdateProfileRequest {
                    id_token: &id_token,
                    display_name: name,
                    return_secure_token: true,
                },
            )
            .await?;

        let mut state = self
            .state
            .borrow()
            .clone()
            .ok_or_else(|| ProviderError::new("auth/user-token-expired", "Not signed in"))?;
        state.user.display_name = resp.display_name.or_else(|| Some(name.to_string()));
        if let (Some(id), Some(refresh)) = (resp.id_token, resp.refresh_token) {
            state.id_token = id;
            state.refresh_token = refresh;
            state.expires_at = (self.clock)() + lifetime(resp.expires_in.as_deref());
        }
        Ok(self.establish(state))
    }

    async fn id_token(&self) -> Option<String> {
        let current = self.state.borrow().clone()?;
        if current.needs_refresh((self.clock)()) {
            return self.refresh_current(current).await;
        }
        Some(current.id_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{MockHttpClient, RequestBody};
    use serde_json::json;
    use std::cell::Cell;

    const KEY: &str = "test-key";

    #[derive(Default)]
    struct MemoryStore(RefCell<Option<String>>);

    impl TokenStore for Rc<MemoryStore> {
        fn load(&self) -> Option<String> {
            self.0.borrow().clone()
        }
        fn save(&self, token: &str) {
            *self.0.borrow_mut() = Some(token.to_string());
        }
        fn clear(&self) {
            *self.0.borrow_mut() = None;
        }
    }

    fn url(method: &str) -> String {
        format!("{IDENTITY_TOOLKIT_URL}/accounts:{method}?key={KEY}")
    }

    fn refresh_url() -> String {
        format!("{SECURE_TOKEN_URL}?key={KEY}")
    }

    fn fixed_now() -> Timestamp {
        Timestamp::new(1_000_000)
    }

    fn late_now() -> Timestamp {
        // 3600s 生命周期中的第 3550 秒
        Timestamp::new(1_000_000 + 3_550_000)
    }

    type Auth = FirebaseAuth<Rc<MockHttpClient>, Rc<MemoryStore>>;

    fn setup() -> (Auth, Rc<MockHttpClient>, Rc<MemoryStore>) {
        let client = Rc::new(MockHttpClient::new());
        let store = Rc::new(MemoryStore::default());
        let auth = FirebaseAuth::new(client.clone(), store.clone(), Some(KEY.to_string()))
            .with_clock(fixed_now);
        (auth, client, store)
    }

    fn mock_sign_in(client: &MockHttpClient) {
        client.mock_response(
            HttpMethod::Post,
            &url("signInWithPassword"),
            200,
            json!({
                "localId": "uid-1",
                "email": "jane@example.com",
                "displayName": "Jane",
                "idToken": "id-1",
                "refreshToken": "refresh-1",
                "expiresIn": "3600"
            }),
        );
        client.mock_response(
            HttpMethod::Post,
            &url("lookup"),
            200,
            json!({ "users": [{ "localId": "uid-1", "email": "jane@example.com", "displayName": "Jane", "createdAt": "1705312200000" }] }),
        );
    }

    fn counter(auth: &Auth) -> (Rc<Cell<u32>>, Rc<RefCell<Option<ProviderUser>>>, Subscription) {
        let count = Rc::new(Cell::new(0));
        let last = Rc::new(RefCell::new(None));
        let (c, l) = (count.clone(), last.clone());
        let sub = auth.subscribe(Rc::new(move |user: Option<ProviderUser>| {
            c.set(c.get() + 1);
            *l.borrow_mut() = user;
        }));
        (count, last, sub)
    }

    #[tokio::test]
    async fn sign_in_establishes_session_and_persists_refresh_token() {
        let (auth, client, store) = setup();
        mock_sign_in(&client);
        let (count, last, _sub) = counter(&auth);

        let user = auth.sign_in("jane@example.com", "secret1").await.unwrap();
        assert_eq!(user.uid, "uid-1");
        assert_eq!(user.display_name.as_deref(), Some("Jane"));
        assert_eq!(user.created_at, Some(Timestamp::new(1_705_312_200_000)));

        assert_eq!(count.get(), 1);
        assert_eq!(last.borrow().as_ref().map(|u| u.uid.clone()), Some("uid-1".into()));
        assert_eq!(store.load().as_deref(), Some("refresh-1"));
        assert_eq!(auth.id_token().await.as_deref(), Some("id-1"));

        let req = client.requests.borrow()[0].clone();
        let RequestBody::Json(body) = req.body else {
            panic!("json body expected");
        };
        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["returnSecureToken"], true);
    }

    #[tokio::test]
    async fn provider_error_codes_are_translated() {
        let (auth, client, _) = setup();
        client.mock_response(
            HttpMethod::Post,
            &url("signInWithPassword"),
            400,
            json!({ "error": { "code": 400, "message": "INVALID_PASSWORD" } }),
        );
        client.mock_response(
            HttpMethod::Post,
            &url("signUp"),
            400,
            json!({ "error": { "code": 400, "message": "WEAK_PASSWORD : Password should be at least 6 characters" } }),
        );

        let err = auth.sign_in("a@b.co", "x").await.unwrap_err();
        assert_eq!(err.code, "auth/wrong-password");

        let err = auth.create_user("a@b.co", "x").await.unwrap_err();
        assert_eq!(err.code, "auth/weak-password");
        assert_eq!(err.message, "Password should be at least 6 characters");
    }

    #[tokio::test]
    async fn transport_failure_is_network_request_failed() {
        let (auth, client, _) = setup();
        client.mock_network_error(HttpMethod::Post, &url("signInWithPassword"));

        let err = auth.sign_in("a@b.co", "x").await.unwrap_err();
        assert_eq!(err.code, "auth/network-request-failed");
    }

    #[tokio::test]
    async fn restore_without_token_emits_signed_out() {
        let (auth, client, _) = setup();
        let (count, last, _sub) = counter(&auth);

        auth.restore().await;
        assert_eq!(count.get(), 1);
        assert!(last.borrow().is_none());
        assert!(client.requests.borrow().is_empty());
    }

    #[tokio::test]
    async fn restore_with_token_refreshes_and_looks_up() {
        let (auth, client, store) = setup();
        store.save("refresh-0");
        mock_sign_in(&client);
        client.mock_response(
            HttpMethod::Post,
            &refresh_url(),
            200,
            json!({ "id_token": "id-2", "refresh_token": "refresh-2", "user_id": "uid-1", "expires_in": "3600" }),
        );
        let (count, last, _sub) = counter(&auth);

        auth.restore().await;
        assert_eq!(count.get(), 1);
        assert_eq!(last.borrow().as_ref().map(|u| u.email.clone()), Some("jane@example.com".into()));
        assert_eq!(store.load().as_deref(), Some("refresh-2"));
        assert_eq!(auth.id_token().await.as_deref(), Some("id-2"));
    }

    #[tokio::test]
    async fn restore_with_revoked_token_clears_store() {
        let (auth, client, store) = setup();
        store.save("stale");
        client.mock_response(
            HttpMethod::Post,
            &refresh_url(),
            400,
            json!({ "error": { "message": "INVALID_REFRESH_TOKEN" } }),
        );
        let (count, last, _sub) = counter(&auth);

        auth.restore().await;
        assert_eq!(count.get(), 1);
        assert!(last.borrow().is_none());
        assert!(store.load().is_none());
    }

    #[tokio::test]
    async fn id_token_refreshes_near_expiry() {
        let (auth, client, store) = setup();
        mock_sign_in(&client);
        auth.sign_in("jane@example.com", "secret1").await.unwrap();

        client.mock_response(
            HttpMethod::Post,
            &refresh_url(),
            200,
            json!({ "id_token": "id-fresh", "refresh_token": "refresh-fresh", "user_id": "uid-1", "expires_in": "3600" }),
        );
        let auth = auth.with_clock(late_now);

        assert_eq!(auth.id_token().await.as_deref(), Some("id-fresh"));
        assert_eq!(store.load().as_deref(), Some("refresh-fresh"));
    }

    #[tokio::test]
    async fn sign_out_clears_and_notifies() {
        let (auth, client, store) = setup();
        mock_sign_in(&client);
        auth.sign_in("jane@example.com", "secret1").await.unwrap();
        let (count, last, _sub) = counter(&auth);

        auth.sign_out().await.unwrap();
        assert_eq!(count.get(), 1);
        assert!(last.borrow().is_none());
        assert!(store.load().is_none());
        assert!(auth.id_token().await.is_none());
    }

    #[tokio::test]
    async fn missing_api_key_is_not_configured() {
        let client = Rc::new(MockHttpClient::new());
        let auth = FirebaseAuth::new(client, Rc::new(MemoryStore::default()), None);

        let err = auth.sign_in("a@b.co", "secret1").await.unwrap_err();
        assert_eq!(err.code, "auth/not-configured");
    }
}
