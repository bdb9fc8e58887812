use crate::components::icons::{ChevronLeft, ChevronRight, EyeIcon, ScanIcon};
use crate::context::use_app;
use crate::scan::{
    ConfidenceTier, clamp_confidence, newest_first, record_date, result_from_record,
    severity_badge_class, severity_label,
};
use crate::web::route::AppRoute;
use crate::web::router::{Link, use_router};
use leptos::prelude::*;
use leptos::task::spawn_local;
use medisight_shared::protocol::ScanHistoryRequest;
use medisight_shared::{HistoryPage, ScanModality, ScanRecord};

const FILTERS: [(Option<ScanModality>, &str); 3] = [
    (None, "All"),
    (Some(ScanModality::Skin), "Skin"),
    (Some(ScanModality::Eye), "Eye"),
];

#[derive(Debug, Clone, PartialEq)]
enum PageState {
    Loading,
    Loaded(HistoryPage),
    Failed,
}

#[component]
fn HistoryItem(record: ScanRecord) -> impl IntoView {
    let app = use_app();
    let router = use_router();
    let confidence = clamp_confidence(record.confidence);
    let tier = ConfidenceTier::of(confidence);
    let details = result_from_record(&record);

    let view_details = move |_| {
        app.last_scan.set(Some(details.clone()));
        router.go(AppRoute::Result);
    };

    view! {
        <div class="card bg-base-100 shadow hover:shadow-md transition-shadow">
            <div class="card-body p-4 md:p-6 flex-row gap-4">
                {match &record.image_url {
                    Some(url) => view! {
                        <img src=url.clone() alt="Scan" class="w-24 h-24 object-cover rounded-lg shrink-0" />
                    }
                    .into_any(),
                    None => view! {
                        <div class="w-24 h-24 rounded-lg bg-base-200 flex items-center justify-center shrink-0 text-base-content/40">
                            {match record.scan_type {
                                ScanModality::Skin => view! { <ScanIcon attr:class="h-8 w-8" /> }.into_any(),
                                ScanModality::Eye => view! { <EyeIcon attr:class="h-8 w-8" /> }.into_any(),
                            }}
                        </div>
                    }
                    .into_any(),
                }}
                <div class="flex-1 space-y-3">
                    <div class="flex items-start justify-between gap-4">
                        <div>
                            <div class="flex items-center gap-2 flex-wrap">
                                <h3 class="font-semibold text-lg">{record.disease_name.clone()}</h3>
                                <span class=severity_badge_class(record.severity)>{severity_label(record.severity)}</span>
                            </div>
                            <p class="text-sm text-base-content/60">
                                {format!("{} scan · {}", record.scan_type.label(), record_date(&record))}
                            </p>
                        </div>
                        <div class="text-right">
                            <p class="text-sm text-base-content/60">"Confidence"</p>
                            <p class=format!("text-2xl font-bold {}", tier.text_class())>{format!("{}%", confidence)}</p>
                        </div>
                    </div>
                    <button class="btn btn-outline btn-sm" on:click=view_details>"View Details"</button>
                </div>
            </div>
        </div>
    }
}

#[component]
pub fn ScanHistoryPage() -> impl IntoView {
    let app = use_app();
    let page = RwSignal::new(1u32);
    let filter = RwSignal::new(Option::<ScanModality>::None);
    let (state, set_state) = signal(PageState::Loading);

    Effect::new(move |_| {
        let request_page = page.get();
        let scan_type = filter.get();
        let Some(uid) = app.uid() else {
            return;
        };
        set_state.set(PageState::Loading);
        let api = app.api();
        spawn_local(async move {
            let request = ScanHistoryRequest {
                page: request_page,
                scan_type,
                ..ScanHistoryRequest::first_page(uid)
            };
            let next = match api.scan_history(&request).await {
                Ok(mut history) => {
                    newest_first(&mut history.items);
                    PageState::Loaded(history)
                }
                Err(e) => {
                    log::error!("[History] {}", e);
                    PageState::Failed
                }
            };
            // 翻页过快时丢弃旧页
            let current = (page.try_get_untracked(), filter.try_get_untracked());
            if current == (Some(request_page), Some(scan_type)) {
                let _ = set_state.try_set(next);
            }
        });
    });

    let loaded = move || match state.get() {
        PageState::Loaded(history) => Some(history),
        _ => None,
    };

    view! {
        <div class="max-w-4xl mx-auto p-4 md:p-8 space-y-6">
            <div class="flex flex-col md:flex-row md:items-end md:justify-between gap-4">
                <div>
                    <h1 class="text-3xl font-bold">"Scan History"</h1>
                    <p class="text-base-content/70">"View and manage your previous scan results"</p>
                </div>
                <div role="tablist" class="tabs tabs-boxed">
                    {FILTERS
                        .iter()
                        .map(|(value, label)| {
                            let value = *value;
                            view! {
                                <a
                                    role="tab"
                                    class=move || if filter.get() == value { "tab tab-active" } else { "tab" }
                                    on:click=move |_| {
                                        filter.set(value);
                                        page.set(1);
                                    }
                                >
                                    {*label}
                                </a>
                            }
                        })
                        .collect_view()}
                </div>
            </div>

            {move || match state.get() {
                PageState::Loading => view! {
                    <div class="flex justify-center py-16">
                        <span class="loading loading-spinner loading-lg"></span>
                    </div>
                }
                .into_any(),
                PageState::Failed => view! {
                    <div role="alert" class="alert alert-error">
                        <span>"Failed to load scan history"</span>
                    </div>
                }
                .into_any(),
                PageState::Loaded(history) if history.items.is_empty() => view! {
                    <div class="text-center py-16 space-y-4">
                        <p class="text-base-content/60">"No scans found"</p>
                        <Link to=AppRoute::SkinScan class="btn btn-primary">"Start a Scan"</Link>
                    </div>
                }
                .into_any(),
                PageState::Loaded(history) => view! {
                    <div class="space-y-4">
                        {history
                            .items
                            .into_iter()
                            .map(|record| view! { <HistoryItem record=record /> })
                            .collect_view()}
                    </div>
                }
                .into_any(),
            }}

            <Show when=move || loaded().is_some_and(|h| h.total_pages() > 1)>
                <div class="join flex justify-center">
                    <button
                        class="join-item btn"
                        disabled=move || !loaded().is_some_and(|h| h.has_previous())
                        on:click=move |_| page.update(|p| *p = p.saturating_sub(1).max(1))
                    >
                        <ChevronLeft attr:class="h-4 w-4" />
                    </button>
                    <span class="join-item btn btn-disabled">
                        {move || loaded().map(|h| format!("Page {} of {}", h.page, h.total_pages())).unwrap_or_default()}
                    </span>
                    <button
                        class="join-item btn"
                        disabled=move || !loaded().is_some_and(|h| h.has_next())
                        on:click=move |_| page.update(|p| *p += 1)
                    >
                        <ChevronRight attr:class="h-4 w-4" />
                    </button>
                </div>
            </Show>
        </div>
    }
}
