//! MediSight 前端应用
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `web::route`: 路由定义与守卫（领域模型）
//! - `web::router`: 路由服务（核心引擎）
//! - `session`: 会话状态，经由 `context` 注入视图
//! - `api`: 后端 REST 网关
//! - `clinics` / `upload` / `scan` / `chat` / `appointments`: 各流程的状态与逻辑
//! - `components` / `pages`: UI 层

pub mod api;
pub mod appointments;
pub mod auth;
pub mod chat;
pub mod clinics;
pub mod config;
mod context;
pub mod error;
pub mod request;
pub mod scan;
mod serde_helper;
pub mod session;
pub mod upload;

mod components {
    pub mod appointment_form;
    pub mod chat_widget;
    pub mod clinic_map;
    pub mod icons;
    pub mod image_upload;
    pub mod navbar;
    pub mod result_card;
    pub mod toast;
}

mod pages {
    pub mod appointments;
    pub mod chat;
    pub mod clinics;
    pub mod dashboard;
    pub mod history;
    pub mod home;
    pub mod login;
    pub mod not_found;
    pub mod profile;
    pub mod register;
    pub mod result;
    pub mod scanner;
}

// 原生 Web API 封装模块
// 浏览器相关的实现都集中在这里：业务模块只依赖 trait，
// 这里提供 fetch、LocalStorage、定时器、定位、文件读取、地图与控制台日志的实现。
pub mod web {
    mod file;
    mod geolocation;
    mod http;
    mod logger;
    pub mod maps;
    pub mod route;
    pub mod router;
    mod storage;
    mod timer;

    pub use file::BrowserFile;
    pub use geolocation::BrowserGeolocator;
    pub use http::FetchClient;
    pub use logger::ConsoleLogger;
    pub use maps::{GoogleMap, load_google_maps};
    pub use storage::{BrowserTokenStore, LocalStorage};
    pub use timer::{Timeout, sleep};
}

use crate::components::navbar::Navbar;
use crate::components::toast::ToastHost;
use crate::config::AppConfig;
use crate::context::provide_app_context;
use crate::pages::appointments::AppointmentsPage;
use crate::pages::chat::ChatPage;
use crate::pages::clinics::ClinicsPage;
use crate::pages::dashboard::DashboardPage;
use crate::pages::history::ScanHistoryPage;
use crate::pages::home::HomePage;
use crate::pages::login::LoginPage;
use crate::pages::not_found::NotFoundPage;
use crate::pages::profile::ProfilePage;
use crate::pages::register::RegisterPage;
use crate::pages::result::ResultPage;
use crate::pages::scanner::ScannerPage;

use leptos::prelude::*;
use medisight_shared::ScanModality;
use web::route::AppRoute;
use web::router::{Router, RouterOutlet};

/// 路由匹配函数
///
/// 根据 AppRoute 枚举返回对应的视图组件。
fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Home => view! { <HomePage /> }.into_any(),
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::Register => view! { <RegisterPage /> }.into_any(),
        AppRoute::Dashboard => view! { <DashboardPage /> }.into_any(),
        AppRoute::SkinScan => view! { <ScannerPage modality=ScanModality::Skin /> }.into_any(),
        AppRoute::EyeScan => view! { <ScannerPage modality=ScanModality::Eye /> }.into_any(),
        AppRoute::Result => view! { <ResultPage /> }.into_any(),
        AppRoute::Appointments => view! { <AppointmentsPage /> }.into_any(),
        AppRoute::Clinics => view! { <ClinicsPage /> }.into_any(),
        AppRoute::Chat => view! { <ChatPage /> }.into_any(),
        AppRoute::Profile => view! { <ProfilePage /> }.into_any(),
        AppRoute::History => view! { <ScanHistoryPage /> }.into_any(),
        AppRoute::NotFound => view! { <NotFoundPage /> }.into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 创建服务与会话上下文，开始恢复持久化会话
    let app = provide_app_context(AppConfig::from_env());

    // 2. 身份状态信号，用于注入路由服务
    let auth_status = app.auth_status();

    view! {
        // 3. 路由器组件：注入身份信号实现守卫
        <Router auth_status=auth_status>
            <div class="min-h-screen flex flex-col bg-base-100">
                <Navbar />
                <main class="flex-1">
                    <RouterOutlet matcher=route_matcher />
                </main>
                <footer class="footer footer-center p-6 bg-base-200 text-base-content/60 text-sm">
                    <p>"© MediSight. For informational purposes only; not a substitute for professional medical advice."</p>
                </footer>
            </div>
            <ToastHost />
        </Router>
    }
}
