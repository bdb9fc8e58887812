use crate::appointments::upcoming;
use crate::components::appointment_form::AppointmentForm;
use crate::components::icons::{CalendarIcon, Clock, MapPin, Trash2};
use crate::context::{today, use_app};
use leptos::prelude::*;
use leptos::task::spawn_local;
use medisight_shared::Appointment;

#[derive(Debug, Clone, PartialEq)]
enum ListState {
    Loading,
    Loaded(Vec<Appointment>),
    Failed,
}

#[component]
fn AppointmentItem(appointment: Appointment, on_cancel: Callback<String>) -> impl IntoView {
    let id = appointment.id.clone();
    view! {
        <div class="p-4 border border-base-300 rounded-lg space-y-2">
            <div class="flex items-start justify-between gap-2">
                <div>
                    <p class="font-semibold">{appointment.doctor_name}</p>
                    <p class="text-sm text-base-content/60">{appointment.specialty}</p>
                </div>
                <button
                    class="btn btn-ghost btn-xs btn-square text-error"
                    title="Cancel appointment"
                    on:click=move |_| on_cancel.run(id.clone())
                >
                    <Trash2 attr:class="h-4 w-4" />
                </button>
            </div>
            <div class="space-y-1 text-sm text-base-content/70">
                <div class="flex items-center gap-2">
                    <CalendarIcon attr:class="h-4 w-4" />
                    <span>{appointment.date}</span>
                </div>
                <div class="flex items-center gap-2">
                    <Clock attr:class="h-4 w-4" />
                    <span>{appointment.time}</span>
                </div>
                <div class="flex items-center gap-2">
                    <MapPin attr:class="h-4 w-4" />
                    <span>{appointment.clinic_name}</span>
                </div>
            </div>
        </div>
    }
}

#[component]
pub fn AppointmentsPage() -> impl IntoView {
    let app = use_app();
    let (list, set_list) = signal(ListState::Loading);
    let reload = RwSignal::new(0u32);

    Effect::new(move |_| {
        reload.track();
        let Some(uid) = app.uid() else {
            return;
        };
        let api = app.api();
        spawn_local(async move {
            let next = match api.list_appointments(&uid, None).await {
                Ok(all) => ListState::Loaded(upcoming(&all, today())),
                Err(e) => {
                    log::error!("[Appointments] {}", e);
                    ListState::Failed
                }
            };
            let _ = set_list.try_set(next);
        });
    });

    let on_booked = Callback::new(move |()| reload.update(|n| *n += 1));

    let on_cancel = Callback::new(move |id: String| {
        let api = app.api();
        spawn_local(async move {
            match api.cancel_appointment(&id).await {
                Ok(()) => {
                    app.notifier.success("Appointment cancelled");
                    let _ = reload.try_update(|n| *n += 1);
                }
                Err(e) => {
                    log::error!("[Appointments] {}", e);
                    app.notifier.error("Failed to cancel appointment");
                }
            }
        });
    });

    view! {
        <div class="max-w-6xl mx-auto p-4 md:p-8">
            <div class="mb-8">
                <h1 class="text-3xl font-bold">"Appointments"</h1>
                <p class="text-base-content/70">"Manage your healthcare appointments"</p>
            </div>

            <div class="grid grid-cols-1 lg:grid-cols-3 gap-8">
                <div class="lg:col-span-2">
                    <AppointmentForm on_booked=on_booked />
                </div>

                <div class="card bg-base-100 shadow h-fit">
                    <div class="card-body">
                        <h2 class="card-title">"Upcoming Appointments"</h2>
                        <p class="text-sm text-base-content/60">"Your scheduled consultations"</p>
                        {move || match list.get() {
                            ListState::Loading => view! {
                                <div class="flex justify-center py-8">
                                    <span class="loading loading-spinner"></span>
                                </div>
                            }
                            .into_any(),
                            ListState::Failed => view! {
                                <p class="text-sm text-error text-center py-8">"Failed to load appointments"</p>
                            }
                            .into_any(),
                            ListState::Loaded(items) if items.is_empty() => view! {
                                <p class="text-sm text-base-content/60 text-center py-8">"No upcoming appointments"</p>
                            }
                            .into_any(),
                            ListState::Loaded(items) => view! {
                                <div class="space-y-4">
                                    {items
                                        .into_iter()
                                        .map(|a| view! { <AppointmentItem appointment=a on_cancel=on_cancel /> })
                                        .collect_view()}
                                </div>
                            }
                            .into_any(),
                        }}
                    </div>
                </div>
            </div>
        </div>
    }
}
