use crate::clinics::{DiscoveryPhase, DiscoverySettings, DiscoveryView};
use crate::components::clinic_map::{ClinicMap, Discovery};
use crate::components::icons::{AlertCircle, Clock, MapPin, Navigation, Phone, RefreshCw, Star};
use crate::context::use_app;
use crate::web::BrowserGeolocator;
use leptos::prelude::*;
use leptos::task::spawn_local;
use medisight_shared::Clinic;

const FALLBACK_NOTICE: &str =
    "Could not access your location. Showing clinics near the default location instead.";

#[component]
fn ClinicCard(clinic: Clinic, selected: Signal<bool>, on_pick: Callback<()>) -> impl IntoView {
    let directions = clinic.directions_url();
    let class = move || {
        if selected.get() {
            "card bg-base-100 shadow ring-2 ring-primary cursor-pointer"
        } else {
            "card bg-base-100 shadow hover:shadow-md transition-shadow cursor-pointer"
        }
    };

    view! {
        <div class=class on:click=move |_| on_pick.run(())>
            <div class="card-body p-4 space-y-2">
                <div class="flex items-start justify-between gap-2">
                    <div>
                        <h3 class="font-semibold text-lg">{clinic.name.clone()}</h3>
                        {clinic.category.clone().map(|c| view! {
                            <p class="text-sm text-base-content/60">{c}</p>
                        })}
                    </div>
                    {clinic.is_open_now().map(|open| {
                        let (badge, label) = if open {
                            ("badge badge-success", "Open now")
                        } else {
                            ("badge badge-ghost", "Closed")
                        };
                        view! { <span class=badge>{label}</span> }
                    })}
                </div>
                <div class="space-y-1 text-sm text-base-content/70">
                    {clinic.address.clone().map(|address| view! {
                        <div class="flex items-start gap-2">
                            <MapPin attr:class="h-4 w-4 mt-0.5 shrink-0" />
                            <span>{address}</span>
                        </div>
                    })}
                    {clinic.phone.clone().map(|phone| view! {
                        <div class="flex items-center gap-2">
                            <Phone attr:class="h-4 w-4 shrink-0" />
                            <a href=format!("tel:{}", phone) class="link" on:click=|ev| ev.stop_propagation()>
                                {phone.clone()}
                            </a>
                        </div>
                    })}
                    {clinic.rating.map(|rating| view! {
                        <div class="flex items-center gap-2">
                            <Star attr:class="h-4 w-4 shrink-0 text-warning" />
                            <span>
                                {format!("{:.1}", rating)}
                                {clinic.total_ratings.map(|n| format!(" ({} reviews)", n))}
                            </span>
                        </div>
                    })}
                    {clinic.hours_summary().map(str::to_string).map(|line| view! {
                        <div class="flex items-start gap-2">
                            <Clock attr:class="h-4 w-4 mt-0.5 shrink-0" />
                            <span>{line}</span>
                        </div>
                    })}
                </div>
                {directions.map(|url| view! {
                    <div class="card-actions justify-end">
                        <a
                            href=url
                            target="_blank"
                            rel="noopener noreferrer"
                            class="btn btn-primary btn-sm gap-2"
                            on:click=|ev| ev.stop_propagation()
                        >
                            <Navigation attr:class="h-4 w-4" />
                            "Get Directions"
                        </a>
                    </div>
                })}
            </div>
        </div>
    }
}

/// 附近诊所：地图与列表共享同一个发现流程
#[component]
pub fn ClinicsPage() -> impl IntoView {
    let app = use_app();
    let config = app.config();
    let discovery: StoredValue<Discovery, LocalStorage> =
        StoredValue::new_local(Discovery::new(
            BrowserGeolocator,
            app.api(),
            DiscoverySettings {
                default_location: config.default_location,
                radius_m: config.clinic_radius_m,
            },
        ));

    let state = RwSignal::new(DiscoveryView::default());
    discovery.with_value(|d| {
        d.watch(move |view| {
            // 页面卸载后仍可能有在途回调
            let _ = state.try_set(view.clone());
        })
    });

    let run = move |refresh: bool| {
        let d = discovery.get_value();
        spawn_local(async move {
            if refresh {
                d.refresh().await;
            } else {
                d.relocate().await;
            }
        });
    };

    {
        let d = discovery.get_value();
        spawn_local(async move { d.mount().await });
    }

    let busy = move || state.with(DiscoveryView::is_busy);
    let map_error = Signal::derive(move || state.with(|v| v.map_error.clone()));

    view! {
        <div class="max-w-7xl mx-auto p-4 md:p-8 space-y-6">
            <div class="flex flex-col md:flex-row md:items-end md:justify-between gap-4">
                <div>
                    <h1 class="text-3xl font-bold">"Find Nearby Clinics"</h1>
                    <p class="text-base-content/70">"Locate healthcare facilities and hospitals in your area"</p>
                </div>
                <div class="flex gap-2">
                    <button class="btn btn-outline gap-2" disabled=busy on:click=move |_| run(false)>
                        <Navigation attr:class="h-4 w-4" />
                        "Use My Location"
                    </button>
                    <button class="btn btn-primary gap-2" disabled=busy on:click=move |_| run(true)>
                        <RefreshCw attr:class="h-4 w-4" />
                        "Refresh"
                    </button>
                </div>
            </div>

            <Show when=move || state.with(|v| v.used_fallback)>
                <div role="alert" class="alert alert-info">
                    <MapPin attr:class="h-5 w-5" />
                    <span>{FALLBACK_NOTICE}</span>
                </div>
            </Show>

            <Show when=move || state.with(|v| v.error.is_some())>
                <div role="alert" class="alert alert-error">
                    <AlertCircle attr:class="h-5 w-5" />
                    <span>{move || state.with(|v| v.error.clone().unwrap_or_default())}</span>
                    <button class="btn btn-sm" on:click=move |_| run(true)>"Retry"</button>
                </div>
            </Show>

            <div class="grid grid-cols-1 lg:grid-cols-5 gap-6">
                <div class="lg:col-span-3">
                    <ClinicMap discovery=discovery map_error=map_error />
                </div>

                <div class="lg:col-span-2 space-y-4 lg:max-h-[500px] lg:overflow-y-auto">
                    <Show when=busy>
                        <div class="flex items-center gap-2 text-base-content/60">
                            <span class="loading loading-spinner loading-sm"></span>
                            {move || state.with(|v| match v.phase {
                                DiscoveryPhase::LocatingUser => "Getting your location...",
                                _ => "Searching for nearby clinics...",
                            })}
                        </div>
                    </Show>
                    {move || state.with(|v| v.notice.clone()).map(|notice| view! {
                        <p class="text-center text-base-content/60 py-8">{notice}</p>
                    })}
                    {move || {
                        let clinics = state.with(|v| v.clinics.clone());
                        clinics
                            .into_iter()
                            .enumerate()
                            .map(|(i, clinic)| {
                                let selected = Signal::derive(move || state.with(|v| v.selected == Some(i)));
                                let on_pick = Callback::new(move |()| discovery.with_value(|d| d.activate(i)));
                                view! { <ClinicCard clinic=clinic selected=selected on_pick=on_pick /> }
                            })
                            .collect_view()
                    }}
                </div>
            </div>
        </div>
    }
}
