use crate::{
    maud_conveniences::{form_submit_button, simple_form_element, subtitle, title},
    state::GradRegState,
    store::RecordStore,
};
use axum::extract::State;
use maud::{Markup, html};

/// The lookup form, optionally refilled with what was typed last time.
pub fn lookup_form(student_id: Option<&str>, seat_num: Option<&str>) -> Markup {
    html! {
        form method="post" action="/lookup" {
            (simple_form_element("student_id", "Student ID", true, None, student_id))
            (simple_form_element("seat_num", "Seat Number", true, Some("number"), seat_num))
            (form_submit_button(Some("Lookup")))
        }
    }
}

pub fn page_card(contents: Markup) -> Markup {
    html! {
        div class="bg-gray-800 p-8 rounded shadow-md max-w-md w-full" {
            (title("Graduation Registration"))
            (contents)
        }
    }
}

pub async fn get_index<S: RecordStore>(State(state): State<GradRegState<S>>) -> Markup {
    state.render(page_card(html! {
        (subtitle("Enter your Student ID and Seat Number to mark yourself as registered."))
        (lookup_form(None, None))
    }))
}
