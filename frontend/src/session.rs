//! 会话存储
//!
//! 标签页生命周期内持有当前身份。对认证服务只订阅一次，
//! 把身份通知镜像为可观察的 `SessionState`；在第一次通知到达前 `loading` 保持为 true。

use crate::api::MediSightApi;
use crate::auth::{AuthProvider, ProviderUser, Subscription};
use crate::error::{AuthError, FormError};
use crate::request::HttpClient;
use crate::web::route::AuthStatus;
use medisight_shared::Timestamp;
use medisight_shared::protocol::RegisterUserRequest;
use std::cell::RefCell;
use std::rc::{Rc, Weak};


const MIN_PASSWORD_LEN: usize = 6;

// =========================================================
// 会话模型
// =========================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: Option<Timestamp>,
}

impl From<ProviderUser> for Session {
    fn from(user: ProviderUser) -> Self {
        Self {
            uid: user.uid,
            email: user.email,
            display_name: user.display_name,
            created_at: user.created_at,
        }
    }
}

impl Session {
    /// 显示名；缺失时取邮箱 `@` 之前的部分
    pub fn name(&self) -> String {
        self.display_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email_local_part(&self.email).to_string())
    }

    /// 最多两个单词的首字母，大写
    pub fn initials(&self) -> String {
        initials(&self.name())
    }

    pub fn member_since(&self) -> String {
        self.created_at
            .map(|t| t.to_date_string())
            .unwrap_or_else(|| "N/A".to_string())
    }
}

pub fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .take(2)
        .filter_map(|w| w.chars().next())
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() {
        "U".to_string()
    } else {
        letters
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub current: Option<Session>,
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            current: None,
            loading: true,
        }
    }
}

impl SessionState {
    pub fn auth_status(&self) -> AuthStatus {
        match (&self.current, self.loading) {
            (_, true) => AuthStatus::Pending,
            (Some(_), false) => AuthStatus::Authenticated,
            (None, false) => AuthStatus::Anonymous,
        }
    }
}

// =========================================================
// 表单校验
// =========================================================

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

pub fn validate_login(email: &str, password: &str) -> Result<(), FormError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(FormError::MissingFields);
    }
    if !is_valid_email(email) {
        return Err(FormError::InvalidEmail);
    }
    Ok(())
}

pub fn validate_signup(
    name: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<(), FormError> {
    if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() || confirm.is_empty()
    {
        return Err(FormError::MissingFields);
    }
    if !is_valid_email(email) {
        return Err(FormError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(FormError::PasswordTooShort);
    }
    if password != confirm {
        return Err(FormError::PasswordMismatch);
    }
    Ok(())
}

pub fn validate_display_name(name: &str) -> Result<(), FormError> {
    if name.trim().is_empty() {
        return Err(FormError::EmptyName);
    }
    Ok(())
}

// =========================================================
// SessionStore
// =========================================================

type Watcher = Rc<dyn Fn(&SessionState)>;

struct Inner<P, C> {
    provider: P,
    api: Rc<MediSightApi<C>>,
    state: RefCell<SessionState>,
    watchers: RefCell<Vec<Watcher>>,
    subscription: RefCell<Option<Subscription>>,
}

pub struct SessionStore<P, C> {
    inner: Rc<Inner<P, C>>,
}

impl<P, C> Clone for SessionStore<P, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: AuthProvider + 'static, C: HttpClient + 'static> SessionStore<P, C> {
    pub fn new(provider: P, api: Rc<MediSightApi<C>>) -> Self {
        Self {
            inner: Rc::new(Inner {
                provider,
                api,
                state: RefCell::new(SessionState::default()),
                watchers: RefCell::new(Vec::new()),
                subscription: RefCell::new(None),
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn current(&self) -> Option<Session> {
        self.inner.state.borrow().current.clone()
    }

    /// 注册状态观察者，立即以当前状态调用一次
    pub fn watch(&self, watcher: impl Fn(&SessionState) + 'static) {
        let watcher: Watcher = Rc::new(watcher);
        let snapshot = self.state();
        self.inner.watchers.borrow_mut().push(watcher.clone());
        watcher(&snapshot);
    }

    /// 订阅身份通知（只订阅一次），随后恢复持久化会话
    pub async fn start(&self) {
        if self.inner.subscription.borrow().is_some() {
            return;
        }

        let weak: Weak<Inner<P, C>> = Rc::downgrade(&self.inner);
        let subscription = self.inner.provider.subscribe(Rc::new(move |user: Option<ProviderUser>| {
            if let Some(inner) = weak.upgrade() {
                Self::apply(&inner, user);
            }
        }));
        *self.inner.subscription.borrow_mut() = Some(subscription);

        self.inner.provider.restore().await;
    }

    fn apply(inner: &Inner<P, C>, user: Option<ProviderUser>) {
        let snapshot = {
            let mut state = inner.state.borrow_mut();
            state.current = user.map(Session::from);
            state.loading = false;
            state.clone()
        };
        match &snapshot.current {
            Some(session) => log::info!("[Session] Signed in as {}", session.uid),
            None => log::info!("[Session] Signed out"),
        }
        let watchers: Vec<Watcher> = inner.watchers.borrow().clone();
        for watcher in watchers {
            watcher(&snapshot);
        }
    }

    /// 后端注册失败只记录日志
    async fn register_best_effort(&self, session: &Session) {
        let request = RegisterUserRequest {
            uid: session.uid.clone(),
            email: session.email.clone(),
            name: session.name(),
        };
        if let Err(err) = self.inner.api.register_user(&request).await {
            log::warn!("[Session] Backend registration failed: {}", err);
        }
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Session, AuthError> {
        let provider = &self.inner.provider;
        let mut user = provider
            .create_user(email.trim(), password)
            .await
            .map_err(|e| AuthError::from_provider(e, "Failed to create account"))?;

        let display_name = display_name.trim();
        if !display_name.is_empty() {
            user = provider
                .update_display_name(display_name)
                .await
                .map_err(|e| AuthError::from_provider(e, "Failed to create account"))?;
        }

        let session = Session::from(user);
        self.register_best_effort(&session).await;
        Ok(session)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let user = self
            .inner
            .provider
            .sign_in(email.trim(), password)
            .await
            .map_err(|e| AuthError::from_provider(e, "Failed to login"))?;

        let session = Session::from(user);
        self.register_best_effort(&session).await;
        Ok(session)
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        self.inner
            .provider
            .sign_out()
            .await
            .map_err(|e| AuthError::from_provider(e, "Failed to logout"))
    }

    pub async fn update_display_name(&self, name: &str) -> Result<Session, AuthError> {
        if self.current().is_none() {
            return Err(AuthError::NotSignedIn);
        }
        self.inner
            .provider
            .update_display_name(name.trim())
            .await
            .map(Session::from)
            .map_err(|e| AuthError::from_provider(e, "Failed to update profile"))
    }

    pub async fn id_token(&self) -> Option<String> {
        self.inner.provider.id_token().await
    }
}
