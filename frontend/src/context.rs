//! 应用上下文
//!
//! 浏览器服务（API、会话、聊天）只创建一次，经 `StoredValue` 放入 Context；
//! 视图层只读写下面的信号。

use crate::api::MediSightApi;
use crate::auth::firebase::FirebaseAuth;
use crate::chat::ChatSession;
use crate::config::AppConfig;
use crate::session::{SessionState, SessionStore};
use crate::web::route::AuthStatus;
use crate::web::{BrowserTokenStore, FetchClient, Timeout};
use leptos::prelude::*;
use leptos::task::spawn_local;
use medisight_shared::chrono::{Local, NaiveDate};
use medisight_shared::{ChatMessage, ScanResult};
use std::rc::Rc;

pub type Api = MediSightApi<FetchClient>;
pub type Auth = FirebaseAuth<FetchClient, BrowserTokenStore>;
pub type Sessions = SessionStore<Rc<Auth>, FetchClient>;
pub type Chat = ChatSession<Rc<Api>>;

const TOAST_MILLIS: u32 = 3000;

pub struct Services {
    pub config: AppConfig,
    pub api: Rc<Api>,
    pub session: Sessions,
}

impl Services {
    pub fn new(config: AppConfig) -> Self {
        let api = Rc::new(MediSightApi::new(FetchClient, &config.api_base_url));
        let auth = Rc::new(FirebaseAuth::new(
            FetchClient,
            BrowserTokenStore,
            config.firebase_api_key.clone(),
        ));
        if !auth.is_configured() {
            log::warn!("[App] Firebase API key is not configured; sign-in is unavailable");
        }
        let session = SessionStore::new(auth, api.clone());
        Self {
            config,
            api,
            session,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastKind {
    pub fn alert_class(&self) -> &'static str {
        match self {
            ToastKind::Success => "alert alert-success shadow-lg",
            ToastKind::Error => "alert alert-error shadow-lg",
            ToastKind::Warning => "alert alert-warning shadow-lg",
            ToastKind::Info => "alert alert-info shadow-lg",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
}

/// 临时通知：3 秒后自动消失，新通知替换旧通知
#[derive(Clone, Copy)]
pub struct Notifier {
    toast: RwSignal<Option<Toast>>,
    next_id: StoredValue<u64>,
}

impl Notifier {
    fn new() -> Self {
        Self {
            toast: RwSignal::new(None),
            next_id: StoredValue::new(0),
        }
    }

    pub fn current(&self) -> Signal<Option<Toast>> {
        self.toast.into()
    }

    pub fn show(&self, kind: ToastKind, message: impl Into<String>) {
        let id = self.next_id.get_value() + 1;
        self.next_id.set_value(id);
        self.toast.set(Some(Toast {
            id,
            kind,
            message: message.into(),
        }));

        let toast = self.toast;
        Timeout::new(TOAST_MILLIS, move || {
            // 只清除自己那条
            if toast.with_untracked(|t| t.as_ref().is_some_and(|t| t.id == id)) {
                toast.set(None);
            }
        })
        .forget();
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(ToastKind::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(ToastKind::Error, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.show(ToastKind::Warning, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.show(ToastKind::Info, message);
    }

    pub fn dismiss(&self) {
        self.toast.set(None);
    }
}

#[derive(Clone, Copy)]
pub struct AppContext {
    services: StoredValue<Rc<Services>, LocalStorage>,
    chat: StoredValue<Chat, LocalStorage>,
    session: RwSignal<SessionState>,
    chat_log: RwSignal<(Vec<ChatMessage>, bool)>,
    pub notifier: Notifier,
    /// 扫描页交给结果页的结果（仅内存）
    pub last_scan: RwSignal<Option<ScanResult>>,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        let services = Rc::new(Services::new(config));
        let chat = ChatSession::new(services.api.clone());
        Self {
            services: StoredValue::new_local(services),
            chat: StoredValue::new_local(chat),
            session: RwSignal::new(SessionState::default()),
            chat_log: RwSignal::new((Vec::new(), false)),
            notifier: Notifier::new(),
            last_scan: RwSignal::new(None),
        }
    }

    pub fn config(&self) -> AppConfig {
        self.services.with_value(|s| s.config.clone())
    }

    pub fn api(&self) -> Rc<Api> {
        self.services.with_value(|s| s.api.clone())
    }

    pub fn sessions(&self) -> Sessions {
        self.services.with_value(|s| s.session.clone())
    }

    pub fn chat(&self) -> Chat {
        self.chat.get_value()
    }

    /// 对话消息与是否在等待回复
    pub fn chat_log(&self) -> Signal<(Vec<ChatMessage>, bool)> {
        self.chat_log.into()
    }

    pub fn session(&self) -> Signal<SessionState> {
        self.session.into()
    }

    pub fn auth_status(&self) -> Signal<AuthStatus> {
        auth_status_memo(self.session()).into()
    }

    /// 当前用户 uid（非响应式）
    pub fn uid(&self) -> Option<String> {
        self.session
            .with_untracked(|s| s.current.as_ref().map(|c| c.uid.clone()))
    }

    /// 订阅会话与对话变化，并恢复持久化的会话
    fn start(&self) {
        let chat_log = self.chat_log;
        self.chat()
            .watch(move |messages, waiting| chat_log.set((messages.to_vec(), waiting)));

        let sessions = self.sessions();
        let session = self.session;
        sessions.watch(move |state| session.set(state.clone()));
        spawn_local(async move {
            sessions.start().await;
        });
    }
}

pub fn provide_app_context(config: AppConfig) -> AppContext {
    let ctx = AppContext::new(config);
    provide_context(ctx);
    ctx.start();
    ctx
}

pub fn use_app() -> AppContext {
    use_context::<AppContext>().expect("AppContext not found in context. Ensure App provides it.")
}

/// 本地日期
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// 会话里的资料变化（如改名）不改变身份状态时，不通知下游
pub fn auth_status_memo(session: Signal<SessionState>) -> Memo<AuthStatus> {
    Memo::new(move |_| session.with(SessionState::auth_status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn signed_in(name: &str) -> SessionState {
        SessionState {
            current: Some(Session {
                uid: "u1".to_string(),
                email: "ada@example.com".to_string(),
                display_name: Some(name.to_string()),
                created_at: None,
            }),
            loading: false,
        }
    }

    #[test]
    fn auth_status_ignores_profile_edits() {
        let session = RwSignal::new(signed_in("Ada"));
        let status = auth_status_memo(session.into());

        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let outlet = Memo::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            status.get()
        });

        assert_eq!(outlet.get(), AuthStatus::Authenticated);

        session.set(signed_in("Ada Lovelace"));
        assert_eq!(outlet.get(), AuthStatus::Authenticated);
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        session.set(SessionState {
            current: None,
            loading: false,
        });
        assert_eq!(outlet.get(), AuthStatus::Anonymous);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
