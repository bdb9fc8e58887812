use crate::appointments::{BookingForm, DOCTORS, TIME_SLOTS};
use crate::context::{today, use_app};
use leptos::prelude::*;
use leptos::task::spawn_local;

#[component]
pub fn AppointmentForm(
    /// 预约成功后调用，由父组件重新加载列表
    #[prop(into)]
    on_booked: Callback<()>,
) -> impl IntoView {
    let app = use_app();
    let (doctor, set_doctor) = signal(Option::<usize>::None);
    let (date, set_date) = signal(String::new());
    let (time, set_time) = signal(String::new());
    let (notes, set_notes) = signal(String::new());
    let (submitting, set_submitting) = signal(false);

    let reset = move || {
        let form = BookingForm::default();
        set_doctor.set(form.doctor);
        set_date.set(form.date);
        set_time.set(form.time);
        set_notes.set(form.notes);
    };

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let Some(uid) = app.uid() else {
            app.notifier.error("Please log in to book an appointment");
            return;
        };
        let form = BookingForm {
            doctor: doctor.get_untracked(),
            date: date.get_untracked(),
            time: time.get_untracked(),
            clinic_name: String::new(),
            notes: notes.get_untracked(),
        };
        let request = match form.to_request(&uid, today()) {
            Ok(request) => request,
            Err(e) => {
                app.notifier.error(e.to_string());
                return;
            }
        };

        set_submitting.set(true);
        let api = app.api();
        spawn_local(async move {
            match api.create_appointment(&request).await {
                Ok(receipt) => {
                    log::info!("[Appointments] Booked {:?}", receipt.id);
                    app.notifier.success("Appointment booked successfully!");
                    reset();
                    on_booked.run(());
                }
                Err(e) => {
                    log::error!("[Appointments] {}", e);
                    app.notifier.error("Failed to book appointment. Please try again.");
                }
            }
            set_submitting.set(false);
        });
    };

    view! {
        <div class="card bg-base-100 shadow-xl">
            <form class="card-body space-y-2" on:submit=on_submit>
                <h2 class="card-title">"Book an Appointment"</h2>
                <p class="text-base-content/60">"Schedule a consultation with our healthcare professionals"</p>

                <label class="form-control">
                    <span class="label label-text">"Select Doctor *"</span>
                    <select
                        class="select select-bordered"
                        prop:value=move || doctor.get().map(|i| i.to_string()).unwrap_or_default()
                        on:change=move |ev| set_doctor.set(event_target_value(&ev).parse().ok())
                    >
                        <option value="" disabled selected=move || doctor.get().is_none()>
                            "Choose a doctor"
                        </option>
                        {DOCTORS
                            .iter()
                            .enumerate()
                            .map(|(i, d)| view! { <option value=i.to_string()>{d.label()}</option> })
                            .collect_view()}
                    </select>
                </label>

                <label class="form-control">
                    <span class="label label-text">"Select Date *"</span>
                    <input
                        type="date"
                        class="input input-bordered"
                        min=move || today().format("%Y-%m-%d").to_string()
                        prop:value=date
                        on:input=move |ev| set_date.set(event_target_value(&ev))
                    />
                </label>

                <label class="form-control">
                    <span class="label label-text">"Select Time *"</span>
                    <select
                        class="select select-bordered"
                        prop:value=time
                        on:change=move |ev| set_time.set(event_target_value(&ev))
                    >
                        <option value="" disabled selected=move || time.get().is_empty()>
                            "Choose a time slot"
                        </option>
                        {TIME_SLOTS
                            .iter()
                            .map(|slot| view! { <option value=*slot>{*slot}</option> })
                            .collect_view()}
                    </select>
                </label>

                <label class="form-control">
                    <span class="label label-text">"Additional Notes (Optional)"</span>
                    <textarea
                        class="textarea textarea-bordered"
                        rows="4"
                        placeholder="Describe your symptoms or concerns..."
                        prop:value=notes
                        on:input=move |ev| set_notes.set(event_target_value(&ev))
                    ></textarea>
                </label>

                <button type="submit" class="btn btn-primary w-full mt-4" disabled=move || submitting.get()>
                    {move || if submitting.get() {
                        view! { <span class="loading loading-spinner"></span> "Booking..." }.into_any()
                    } else {
                        "Book Appointment".into_any()
                    }}
                </button>
            </form>
        </div>
    }
}
