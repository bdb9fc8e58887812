//! 路由定义模块 - 领域模型
//!
//! 这是纯粹的业务逻辑层，不依赖于 DOM 或 web_sys。
//! 定义了应用的所有路由及其属性，以及受保护路由的守卫判定。

use std::fmt::Display;

/// 应用路由枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppRoute {
    /// 首页
    #[default]
    Home,
    Login,
    Register,
    Dashboard,
    SkinScan,
    EyeScan,
    Result,
    Appointments,
    Clinics,
    Chat,
    Profile,
    History,
    /// 页面未找到
    NotFound,
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举
    pub fn from_path(path: &str) -> Self {
        // 忽略查询串、哈希与末尾斜杠
        let path = path.split(['?', '#']).next().unwrap_or("/");
        let path = match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        match path {
            "/" => Self::Home,
            "/login" => Self::Login,
            "/register" => Self::Register,
            "/dashboard" => Self::Dashboard,
            "/scan/skin" => Self::SkinScan,
            "/scan/eye" => Self::EyeScan,
            "/result" => Self::Result,
            "/appointments" => Self::Appointments,
            "/clinics" => Self::Clinics,
            "/chat" => Self::Chat,
            "/profile" => Self::Profile,
            "/history" => Self::History,
            _ => Self::NotFound,
        }
    }

    /// 获取路由对应的 URL path
    pub fn to_path(&self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Dashboard => "/dashboard",
            Self::SkinScan => "/scan/skin",
            Self::EyeScan => "/scan/eye",
            Self::Result => "/result",
            Self::Appointments => "/appointments",
            Self::Clinics => "/clinics",
            Self::Chat => "/chat",
            Self::Profile => "/profile",
            Self::History => "/history",
            Self::NotFound => "/404",
        }
    }

    /// **核心守卫逻辑：定义该路由是否需要认证**
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Self::Dashboard
                | Self::SkinScan
                | Self::EyeScan
                | Self::Result
                | Self::Appointments
                | Self::Clinics
                | Self::Chat
                | Self::Profile
                | Self::History
        )
    }

    /// 定义已认证用户是否应该离开此路由（如登录页）
    pub fn should_redirect_when_authenticated(&self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }

    /// 获取认证失败时的重定向目标
    pub fn auth_failure_redirect() -> Self {
        Self::Login
    }

    /// 获取认证成功时的重定向目标（从登录页）
    pub fn auth_success_redirect() -> Self {
        Self::Dashboard
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

/// 身份解析状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// 尚未收到第一次身份通知
    Pending,
    Anonymous,
    Authenticated,
}

/// 守卫判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(AppRoute),
    /// 既不渲染也不跳转，等身份解析完成后重新判定
    Defer,
}

/// 守卫：根据目标路由与身份状态给出判定
pub fn guard(target: AppRoute, status: AuthStatus) -> GateDecision {
    match status {
        AuthStatus::Pending if target.requires_auth() || target.should_redirect_when_authenticated() => {
            GateDecision::Defer
        }
        AuthStatus::Anonymous if target.requires_auth() => {
            GateDecision::Redirect(AppRoute::auth_failure_redirect())
        }
        AuthStatus::Authenticated if target.should_redirect_when_authenticated() => {
            GateDecision::Redirect(AppRoute::auth_success_redirect())
        }
        _ => GateDecision::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [AppRoute; 13] = [
        AppRoute::Home,
        AppRoute::Login,
        AppRoute::Register,
        AppRoute::Dashboard,
        AppRoute::SkinScan,
        AppRoute::EyeScan,
        AppRoute::Result,
        AppRoute::Appointments,
        AppRoute::Clinics,
        AppRoute::Chat,
        AppRoute::Profile,
        AppRoute::History,
        AppRoute::NotFound,
    ];

    #[test]
    fn paths_round_trip() {
        for route in ALL.into_iter().filter(|r| *r != AppRoute::NotFound) {
            assert_eq!(AppRoute::from_path(route.to_path()), route);
        }
        assert_eq!(AppRoute::from_path("/unknown"), AppRoute::NotFound);
        assert_eq!(AppRoute::from_path("/scan/skin/"), AppRoute::SkinScan);
        assert_eq!(AppRoute::from_path("/clinics?x=1"), AppRoute::Clinics);
        assert_eq!(AppRoute::from_path(""), AppRoute::Home);
    }

    #[test]
    fn anonymous_is_redirected_from_every_protected_route() {
        for route in ALL.into_iter().filter(AppRoute::requires_auth) {
            assert_eq!(
                guard(route, AuthStatus::Anonymous),
                GateDecision::Redirect(AppRoute::Login),
                "{route}"
            );
        }
        assert_eq!(guard(AppRoute::Home, AuthStatus::Anonymous), GateDecision::Allow);
        assert_eq!(guard(AppRoute::Login, AuthStatus::Anonymous), GateDecision::Allow);
    }

    #[test]
    fn pending_defers_gated_routes_only() {
        assert_eq!(guard(AppRoute::Profile, AuthStatus::Pending), GateDecision::Defer);
        assert_eq!(guard(AppRoute::Login, AuthStatus::Pending), GateDecision::Defer);
        assert_eq!(guard(AppRoute::Home, AuthStatus::Pending), GateDecision::Allow);
        assert_eq!(guard(AppRoute::NotFound, AuthStatus::Pending), GateDecision::Allow);
    }

    #[test]
    fn authenticated_leaves_login_and_register() {
        assert_eq!(
            guard(AppRoute::Register, AuthStatus::Authenticated),
            GateDecision::Redirect(AppRoute::Dashboard)
        );
        assert_eq!(
            guard(AppRoute::History, AuthStatus::Authenticated),
            GateDecision::Allow
        );
    }
}
