use crate::components::icons::{Activity, LogOut};
use crate::context::use_app;
use crate::web::route::AppRoute;
use crate::web::router::{Link, use_router};
use leptos::prelude::*;
use leptos::task::spawn_local;

const NAV_LINKS: [(AppRoute, &str); 7] = [
    (AppRoute::Dashboard, "Dashboard"),
    (AppRoute::SkinScan, "Skin Scan"),
    (AppRoute::EyeScan, "Eye Scan"),
    (AppRoute::Clinics, "Clinics"),
    (AppRoute::Appointments, "Appointments"),
    (AppRoute::History, "History"),
    (AppRoute::Chat, "Assistant"),
];

#[component]
pub fn Navbar() -> impl IntoView {
    let app = use_app();
    let router = use_router();
    let session = app.session();

    let on_logout = move |_| {
        let sessions = app.sessions();
        spawn_local(async move {
            match sessions.logout().await {
                Ok(()) => {
                    app.notifier.success("Logged out successfully");
                    router.go(AppRoute::Home);
                }
                Err(e) => app.notifier.error(e.to_string()),
            }
        });
    };

    view! {
        <div class="navbar bg-base-100 shadow-md sticky top-0 z-40 px-4">
            <div class="flex-1">
                <Link to=AppRoute::Home class="btn btn-ghost text-xl gap-2">
                    <Activity attr:class="h-6 w-6 text-primary" />
                    "MediSight"
                </Link>
            </div>
            <div class="flex-none gap-2">
                {move || match session.get().current {
                    Some(user) => view! {
                        <ul class="menu menu-horizontal px-1 hidden lg:flex">
                            {NAV_LINKS
                                .iter()
                                .map(|(route, label)| view! {
                                    <li><Link to=*route>{*label}</Link></li>
                                })
                                .collect_view()}
                        </ul>
                        <Link to=AppRoute::Profile class="btn btn-ghost btn-circle avatar placeholder">
                            <div class="bg-primary text-primary-content rounded-full w-10">
                                <span>{user.initials()}</span>
                            </div>
                        </Link>
                        <button class="btn btn-outline btn-sm gap-2" on:click=on_logout>
                            <LogOut attr:class="h-4 w-4" />
                            "Logout"
                        </button>
                    }
                    .into_any(),
                    None => view! {
                        <Link to=AppRoute::Login class="btn btn-ghost btn-sm">"Login"</Link>
                        <Link to=AppRoute::Register class="btn btn-primary btn-sm">"Sign Up"</Link>
                    }
                    .into_any(),
                }}
            </div>
        </div>
    }
}
