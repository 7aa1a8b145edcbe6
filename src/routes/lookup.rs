use crate::{
    data::{Candidate, CandidateState, StudentId, parse_seat_num},
    error::{GradRegError, GradRegResult},
    maud_conveniences::{AlertKind, alert, errors_list, subtitle},
    registration::lookup,
    routes::index::{lookup_form, page_card},
    state::GradRegState,
    store::RecordStore,
};
use axum::{Form, extract::State, http::StatusCode};
use bitflags::bitflags;
use maud::{Markup, Render, html};
use serde::Deserialize;

bitflags! {
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    struct LookupFormError: u8 {
        const EMPTY_STUDENT_ID = 0b0000_0001;
        const INVALID_SEAT_NUM = 0b0000_0010;
    }
}

impl LookupFormError {
    pub fn as_nice_list(&self) -> impl Iterator<Item = &'static str> {
        self.iter().filter_map(|x| match x {
            Self::EMPTY_STUDENT_ID => Some("Please enter a Student ID."),
            Self::INVALID_SEAT_NUM => {
                Some("Please enter your seat number as a whole number from 1.")
            }
            _ => None,
        })
    }
}

#[derive(Deserialize)]
pub struct LookupForm {
    pub student_id: String,
    pub seat_num: String,
}

/// Looks the student up and works out whether to offer them the register button.
pub async fn post_lookup<S: RecordStore>(
    State(state): State<GradRegState<S>>,
    Form(LookupForm {
        student_id,
        seat_num,
    }): Form<LookupForm>,
) -> GradRegResult<(StatusCode, Markup)> {
    let parsed_id = StudentId::parse(&student_id);
    let parsed_seat_num = parse_seat_num(&seat_num);

    let mut errors = LookupFormError::empty();
    if parsed_id.is_err() {
        errors |= LookupFormError::EMPTY_STUDENT_ID;
    }
    if parsed_seat_num.is_err() {
        errors |= LookupFormError::INVALID_SEAT_NUM;
    }

    let refill = lookup_form(Some(student_id.trim()), Some(seat_num.trim()));

    let (Ok(student_id), Ok(claimed_seat_num)) = (parsed_id, parsed_seat_num) else {
        return Ok((
            StatusCode::BAD_REQUEST,
            state.render(page_card(html! {
                (errors_list(None, errors.as_nice_list()))
                (refill)
            })),
        ));
    };

    let record = match lookup(state.store(), student_id.as_str()).await {
        Ok(record) => record,
        Err(GradRegError::StudentNotFound { .. }) => {
            return Ok((
                StatusCode::NOT_FOUND,
                state.render(page_card(html! {
                    (alert(AlertKind::Error, "Not found.", "No student found with that ID."))
                    (refill)
                })),
            ));
        }
        Err(GradRegError::StoreUnavailable) => {
            return Ok((
                StatusCode::SERVICE_UNAVAILABLE,
                state.render(page_card(html! {
                    (alert(AlertKind::Warning, "Please try again later.", "We couldn't reach the registration records just now."))
                    (refill)
                })),
            ));
        }
        Err(e) => return Err(e),
    };

    let candidate = Candidate::new(student_id, claimed_seat_num, record);
    Ok((StatusCode::OK, state.render(page_card(candidate_view(&candidate)))))
}

fn candidate_view(candidate: &Candidate) -> Markup {
    match candidate.state() {
        CandidateState::SeatMismatch => html! {
            (alert(AlertKind::Warning, "Check your seat.", "Seat number does not match. Please recheck."))
            (lookup_form(Some(candidate.student_id.as_str()), None))
        },
        CandidateState::AlreadyRegistered => html! {
            (subtitle("Record Preview"))
            (candidate.record.render())
            (alert(AlertKind::Info, "All done.", "Already registered ✅"))
            a href="/" class="text-blue-200 underline" {"Look up someone else"}
        },
        CandidateState::Confirmable => html! {
            (subtitle("Record Preview"))
            (candidate.record.render())
            div id="outcome" {
                form hx-post="/register" hx-target="#outcome" hx-swap="innerHTML" method="post" action="/register" {
                    input type="hidden" name="student_id" value=(candidate.student_id.as_str()) {}
                    input type="hidden" name="seat_num" value=(candidate.claimed_seat_num) {}
                    button type="submit" class="bg-green-600 hover:bg-green-800 font-bold py-2 px-4 rounded w-full" {
                        "Confirm Register"
                    }
                }
            }
        },
    }
}
