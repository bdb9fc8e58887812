use crate::components::chat_widget::ChatWidget;
use crate::components::icons::{Activity, CalendarIcon, EyeIcon, HistoryIcon, ScanIcon};
use crate::context::{today, use_app};
use crate::scan::{
    ConfidenceTier, clamp_confidence, newest_first, record_date, severity_badge_class,
    severity_label,
};
use crate::web::route::AppRoute;
use crate::web::router::Link;
use leptos::prelude::*;
use leptos::task::spawn_local;
use medisight_shared::protocol::ScanHistoryRequest;
use medisight_shared::{DashboardStats, ScanRecord};

const RECENT_SCANS: usize = 3;

#[component]
fn QuickAction(
    to: AppRoute,
    title: &'static str,
    subtitle: &'static str,
    children: Children,
) -> impl IntoView {
    view! {
        <Link to=to class="card bg-base-100 shadow-md hover:shadow-xl transition-shadow">
            <div class="card-body items-center text-center">
                <div class="p-3 bg-primary/10 rounded-xl text-primary">{children()}</div>
                <h3 class="font-semibold">{title}</h3>
                <p class="text-sm text-base-content/60">{subtitle}</p>
            </div>
        </Link>
    }
}

#[component]
fn StatCard(title: &'static str, value: Signal<Option<u32>>) -> impl IntoView {
    view! {
        <div class="stat bg-base-100 rounded-box shadow">
            <div class="stat-title">{title}</div>
            <div class="stat-value text-primary">
                {move || match value.get() {
                    Some(v) => v.to_string().into_any(),
                    None => view! { <span class="loading loading-dots loading-sm"></span> }.into_any(),
                }}
            </div>
        </div>
    }
}

#[component]
fn RecentScan(record: ScanRecord) -> impl IntoView {
    let tier = ConfidenceTier::of(clamp_confidence(record.confidence));
    view! {
        <li class="flex items-center justify-between py-3">
            <div>
                <p class="font-medium">{record.disease_name.clone()}</p>
                <p class="text-sm text-base-content/60">
                    {format!("{} · {}", record.scan_type.label(), record_date(&record))}
                </p>
            </div>
            <div class="flex items-center gap-3">
                <span class=format!("font-semibold {}", tier.text_class())>
                    {format!("{:.0}%", record.confidence)}
                </span>
                <span class=severity_badge_class(record.severity)>{severity_label(record.severity)}</span>
            </div>
        </li>
    }
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let app = use_app();
    let session = app.session();
    let (stats, set_stats) = signal(Option::<DashboardStats>::None);
    let (recent, set_recent) = signal(Option::<Vec<ScanRecord>>::None);

    if let Some(uid) = app.uid() {
        let api = app.api();
        spawn_local(async move {
            match api.dashboard_stats(&uid, today()).await {
                Ok(s) => {
                    let _ = set_stats.try_set(Some(s));
                }
                Err(e) => {
                    log::error!("[Dashboard] {}", e);
                    let _ = set_stats.try_set(Some(DashboardStats::default()));
                }
            }

            let mut records = match api.scan_history(&ScanHistoryRequest::first_page(uid)).await {
                Ok(page) => page.items,
                Err(e) => {
                    log::error!("[Dashboard] {}", e);
                    Vec::new()
                }
            };
            newest_first(&mut records);
            records.truncate(RECENT_SCANS);
            let _ = set_recent.try_set(Some(records));
        });
    }

    let stat = move |f: fn(&DashboardStats) -> u32| -> Signal<Option<u32>> {
        Signal::derive(move || stats.with(|s| s.as_ref().map(f)))
    };

    view! {
        <div class="max-w-6xl mx-auto p-4 md:p-8 space-y-8">
            <div>
                <h1 class="text-3xl font-bold">
                    {move || {
                        let name = session.with(|s| s.current.as_ref().map(|c| c.name()));
                        format!("Welcome back, {}!", name.unwrap_or_else(|| "there".to_string()))
                    }}
                </h1>
                <p class="text-base-content/70">"Here's an overview of your health activity"</p>
            </div>

            <div class="grid grid-cols-2 md:grid-cols-4 gap-4">
                <QuickAction to=AppRoute::SkinScan title="Scan Skin" subtitle="Detect skin conditions">
                    <ScanIcon attr:class="h-6 w-6" />
                </QuickAction>
                <QuickAction to=AppRoute::EyeScan title="Scan Eye" subtitle="Check eye health">
                    <EyeIcon attr:class="h-6 w-6" />
                </QuickAction>
                <QuickAction to=AppRoute::Appointments title="Book Appointment" subtitle="Schedule with doctor">
                    <CalendarIcon attr:class="h-6 w-6" />
                </QuickAction>
                <QuickAction to=AppRoute::History title="View History" subtitle="Past scans & results">
                    <HistoryIcon attr:class="h-6 w-6" />
                </QuickAction>
            </div>

            <div class="stats stats-vertical md:stats-horizontal w-full gap-4 bg-transparent">
                <StatCard title="Total Scans" value=stat(|s| s.total_scans) />
                <StatCard title="Skin Scans" value=stat(|s| s.skin_scans) />
                <StatCard title="Eye Scans" value=stat(|s| s.eye_scans) />
                <StatCard title="Upcoming Appointments" value=stat(|s| s.upcoming_appointments) />
            </div>

            <div class="card bg-base-100 shadow">
                <div class="card-body">
                    <div class="flex items-center justify-between">
                        <h2 class="card-title gap-2">
                            <Activity attr:class="h-5 w-5 text-primary" />
                            "Recent Scans"
                        </h2>
                        <Link to=AppRoute::History class="link link-primary text-sm">"View all"</Link>
                    </div>
                    {move || match recent.get() {
                        None => view! {
                            <div class="flex justify-center py-6">
                                <span class="loading loading-spinner"></span>
                            </div>
                        }
                        .into_any(),
                        Some(list) if list.is_empty() => view! {
                            <p class="text-base-content/60 py-6 text-center">
                                "No scans yet. Start by scanning your skin or eyes."
                            </p>
                        }
                        .into_any(),
                        Some(list) => view! {
                            <ul class="divide-y divide-base-200">
                                {list
                                    .into_iter()
                                    .map(|record| view! { <RecentScan record=record /> })
                                    .collect_view()}
                            </ul>
                        }
                        .into_any(),
                    }}
                </div>
            </div>

            <ChatWidget />
        </div>
    }
}
