//! 路由服务模块 - 核心引擎
//!
//! 封装了 web_sys 的 History API，实现高内聚：
//! 所有对 window.history 的操作都集中在此模块。
//! 实现了"监听 -> 验证 -> 处理 -> 加载"的导航流程；验证由 `route::guard` 完成。

use leptos::prelude::*;
use wasm_bindgen::prelude::*;

use super::route::{AppRoute, AuthStatus, GateDecision, guard};

/// 获取当前浏览器路径
fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

/// 写入 History：`push` 为 false 时替换当前条目（用于重定向）
fn write_history(path: &str, push: bool) {
    let Some(history) = web_sys::window().and_then(|w| w.history().ok()) else {
        return;
    };
    let result = if push {
        history.push_state_with_url(&JsValue::NULL, "", Some(path))
    } else {
        history.replace_state_with_url(&JsValue::NULL, "", Some(path))
    };
    if let Err(e) = result {
        log::warn!("[Router] History update failed: {:?}", e);
    }
}

/// 经守卫判定后落定路由
///
/// 重定向总是替换当前条目；待定与放行都记录请求的路由，由出口决定显示内容。
fn settle(set_route: WriteSignal<AppRoute>, target: AppRoute, status: AuthStatus, push: bool) {
    match guard(target, status) {
        GateDecision::Redirect(redirect) => {
            log::info!("[Router] {} denied ({:?}), redirecting to {}", target, status, redirect);
            write_history(redirect.to_path(), false);
            set_route.set(redirect);
        }
        GateDecision::Defer | GateDecision::Allow => {
            if push {
                write_history(target.to_path(), true);
            }
            set_route.set(target);
        }
    }
}

/// 路由器服务
///
/// 封装所有路由操作，通过 Signal 驱动界面更新。
/// 通过注入身份状态信号实现与会话系统的解耦。
#[derive(Clone, Copy)]
pub struct RouterService {
    /// 当前路由（只读信号）
    current_route: ReadSignal<AppRoute>,
    /// 设置当前路由（写入信号）
    set_route: WriteSignal<AppRoute>,
    /// 身份状态（注入的信号，实现解耦）
    auth_status: Signal<AuthStatus>,
}

impl RouterService {
    /// 创建新的路由服务
    ///
    /// # Arguments
    /// * `auth_status` - 身份状态信号，由外部注入实现解耦
    fn new(auth_status: Signal<AuthStatus>) -> Self {
        // 1. 初始化当前路由（从 URL 解析）；守卫在 Effect 中首次执行
        let initial_route = AppRoute::from_path(&current_path());
        let (current_route, set_route) = signal(initial_route);

        Self {
            current_route,
            set_route,
            auth_status,
        }
    }

    /// 获取当前路由信号
    pub fn current_route(&self) -> ReadSignal<AppRoute> {
        self.current_route
    }

    /// 导航到指定路由（pushState），经由守卫
    pub fn go(&self, route: AppRoute) {
        settle(self.set_route, route, self.auth_status.get_untracked(), true);
    }

    /// 初始化浏览器后退/前进按钮监听
    fn init_popstate_listener(&self) {
        let set_route = self.set_route;
        let auth_status = self.auth_status;

        // 浏览器已更新地址，只需判定
        let closure = Closure::<dyn Fn()>::new(move || {
            let target = AppRoute::from_path(&current_path());
            settle(set_route, target, auth_status.get_untracked(), false);
        });

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // 泄漏闭包以保持监听器存活
        closure.forget();
    }

    /// 身份状态变化时对当前路由重新判定（登录、登出、首次解析）
    fn setup_auth_redirect(&self) {
        let current_route = self.current_route;
        let set_route = self.set_route;
        let auth_status = self.auth_status;

        Effect::new(move |_| {
            let status = auth_status.get();
            let route = current_route.get_untracked();

            if matches!(guard(route, status), GateDecision::Redirect(_)) {
                settle(set_route, route, status, false);
            }
        });
    }
}

/// 提供路由服务到 Context 并初始化
fn provide_router(auth_status: Signal<AuthStatus>) -> RouterService {
    let router = RouterService::new(auth_status);

    // 初始化监听器
    router.init_popstate_listener();
    router.setup_auth_redirect();

    provide_context(router);
    router
}

/// 从 Context 获取路由服务
pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

// ============================================================================
// UI 组件
// ============================================================================

/// 路由器根组件
///
/// 提供路由上下文，应在 App 根部使用。
#[component]
pub fn Router(
    /// 身份状态信号
    auth_status: Signal<AuthStatus>,
    /// 子组件
    children: Children,
) -> impl IntoView {
    provide_router(auth_status);

    children()
}

/// 路由出口组件
///
/// 根据当前路由与身份状态渲染：放行时渲染页面，待定或即将重定向时显示等待状态。
#[component]
pub fn RouterOutlet(
    /// 路由匹配函数：接收当前路由，返回对应视图
    matcher: fn(AppRoute) -> AnyView,
) -> impl IntoView {
    let router = use_router();
    let auth_status = router.auth_status;

    // 只有路由或守卫结果变化时才重建页面
    let decision = Memo::new(move |_| {
        let current = router.current_route().get();
        (current, guard(current, auth_status.get()))
    });

    move || {
        let (current, decision) = decision.get();
        match decision {
            GateDecision::Allow => matcher(current),
            GateDecision::Defer | GateDecision::Redirect(_) => view! {
                <div class="flex items-center justify-center min-h-screen">
                    <span class="loading loading-spinner loading-lg text-primary"></span>
                </div>
            }
            .into_any(),
        }
    }
}

/// 站内链接：拦截点击，经由路由服务导航
#[component]
pub fn Link(
    /// 目标路由
    to: AppRoute,
    #[prop(optional, into)] class: String,
    children: Children,
) -> impl IntoView {
    let router = use_router();

    let on_click = move |ev: leptos::ev::MouseEvent| {
        ev.prevent_default();
        router.go(to);
    };

    view! {
        <a href=to.to_path() class=class on:click=on_click>
            {children()}
        </a>
    }
}
