use crate::{
    data::{StudentId, parse_seat_num},
    error::{GradRegError, GradRegResult},
    maud_conveniences::{AlertKind, alert},
    registration::{RegistrationOutcome, register},
    state::GradRegState,
    store::RecordStore,
};
use axum::{Form, extract::State};
use maud::{Markup, html};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct ConfirmForm {
    pub student_id: String,
    pub seat_num: String,
}

/// Swapped into `#outcome` by htmx, which drops non-2xx bodies, so every outcome and every
/// error is a 200 with its own alert.
pub async fn post_register<S: RecordStore>(
    State(state): State<GradRegState<S>>,
    Form(ConfirmForm {
        student_id,
        seat_num,
    }): Form<ConfirmForm>,
) -> Markup {
    match confirm_registration(&state, &student_id, &seat_num).await {
        Ok(outcome) => outcome_view(&outcome),
        Err(GradRegError::StoreUnavailable) => html! {
            (alert(AlertKind::Warning, "Not registered yet.", "We couldn't reach the registration records just now. Please press Confirm Register again in a moment."))
            (look_up_again())
        },
        Err(e @ (GradRegError::EmptyStudentId | GradRegError::InvalidSeatNumber { .. })) => {
            warn!(?e, "Malformed registration confirmation");
            html! {
                (alert(AlertKind::Error, "Not registered.", e.to_string()))
                (look_up_again())
            }
        }
        Err(e) => {
            error!(?e, "Error confirming registration");
            html! {
                (alert(AlertKind::Error, "Not registered.", "Something went wrong recording your registration. Please look yourself up again and retry."))
                (look_up_again())
            }
        }
    }
}

async fn confirm_registration<S: RecordStore>(
    state: &GradRegState<S>,
    student_id: &str,
    seat_num: &str,
) -> GradRegResult<RegistrationOutcome> {
    let student_id = StudentId::parse(student_id)?;
    let seat_num = parse_seat_num(seat_num)?;

    register(
        state.store(),
        student_id.as_str(),
        seat_num,
        state.channel_tag(),
    )
    .await
}

fn outcome_view(outcome: &RegistrationOutcome) -> Markup {
    match outcome {
        RegistrationOutcome::Registered(registration) => html! {
            (alert(AlertKind::Success, "Registered successfully! 🎉", html! {
                "Recorded at " (registration.at.strftime("%Y-%m-%d %H:%M:%S UTC").to_string()) "."
            }))
        },
        RegistrationOutcome::AlreadyRegistered => html! {
            (alert(AlertKind::Info, "All done.", "This student is already registered."))
        },
        RegistrationOutcome::SeatMismatch => html! {
            (alert(AlertKind::Error, "Not registered.", "Seat number does not match our record."))
            (look_up_again())
        },
        RegistrationOutcome::NotFound => html! {
            (alert(AlertKind::Error, "Not registered.", "Student not found."))
            (look_up_again())
        },
    }
}

fn look_up_again() -> Markup {
    html! {
        a href="/" class="text-blue-200 underline" {"Look up again"}
    }
}
