use crate::error::{EmptyStudentIdSnafu, GradRegResult};
use jiff::Timestamp;
use maud::{Markup, Render, html};
use snafu::ensure;
use std::fmt::{Display, Formatter};

/// A student identifier as typed into the lookup form, trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StudentId(String);

impl StudentId {
    pub fn parse(raw: &str) -> GradRegResult<Self> {
        let trimmed = raw.trim();
        ensure!(!trimmed.is_empty(), EmptyStudentIdSnafu);
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StudentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Written exactly once, by the registration transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub at: Timestamp,
    pub via: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    pub id: StudentId,
    pub name: String,
    pub course: String,
    pub award: String,
    pub image_path: Option<String>,
    pub seat_num: i32,
    pub registration: Option<Registration>,
}

impl StudentRecord {
    pub const fn is_registered(&self) -> bool {
        self.registration.is_some()
    }
}

impl Render for StudentRecord {
    fn render(&self) -> Markup {
        let row = |label: &str, value: Markup| {
            html! {
                p class="text-gray-200 font-semibold" {
                    (label) ": "
                    span class="font-medium" {(value)}
                }
            }
        };

        html! {
            div class="rounded-lg shadow-md overflow-hidden bg-gray-700 p-4 mb-4" {
                h2 class="text-xl font-semibold mb-2" {(self.name)}
                (row("Student ID", html! {(self.id.as_str())}))
                (row("Course", html! {(self.course)}))
                (row("Award", html! {(self.award)}))
                (row("Seat Number", html! {(self.seat_num)}))
                @if let Some(image_path) = &self.image_path {
                    (row("Photo", html! {
                        a href=(image_path) target="_blank" class="text-blue-200 underline" {(image_path)}
                    }))
                }
                (row("Registered", html! {
                    @match &self.registration {
                        Some(Registration { at, via }) => {
                            "Yes, at " (at.strftime("%Y-%m-%d %H:%M:%S UTC").to_string()) " via " (via)
                        }
                        None => { "No" }
                    }
                }))
            }
        }
    }
}
