use maud::{Markup, Render, html};

pub fn title(s: impl Render) -> Markup {
    html! {
        h1 class="text-2xl font-semibold mb-4" {(s)}
    }
}

pub fn subtitle(s: impl Render) -> Markup {
    html! {
        h2 class="text-lg text-gray-300 mb-4" {(s)}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Error,
    Warning,
    Info,
    Success,
}

impl AlertKind {
    const fn classes(self) -> &'static str {
        match self {
            Self::Error => "bg-red-100 border border-red-400 text-red-700",
            Self::Warning => "bg-yellow-100 border border-yellow-400 text-yellow-800",
            Self::Info => "bg-blue-100 border border-blue-400 text-blue-800",
            Self::Success => "bg-green-100 border border-green-400 text-green-800",
        }
    }
}

pub fn alert(kind: AlertKind, heading: &str, body: impl Render) -> Markup {
    html! {
        div role="alert" data-alert=(format!("{kind:?}").to_lowercase()) class={(kind.classes()) " px-4 py-3 rounded relative mb-4"} {
            strong class="font-bold" {(heading)}
            " "
            span class="block sm:inline" {(body)}
        }
    }
}

pub fn errors_list<'a>(heading: Option<&str>, errors: impl Iterator<Item = &'a str>) -> Markup {
    html! {
        div role="alert" data-alert="error" class={(AlertKind::Error.classes()) " px-4 py-3 rounded relative mb-4"} {
            strong class="font-bold" {(heading.unwrap_or("Please fix the following:"))}
            ul class="list-disc list-inside" {
                @for error in errors {
                    li {(error)}
                }
            }
        }
    }
}

pub fn simple_form_element(
    id: &'static str,
    label: &'static str,
    required: bool,
    ty: Option<&'static str>,
    value: Option<&str>,
) -> Markup {
    form_element(
        id,
        label,
        html! {
            input required[required] type=(ty.unwrap_or("text")) id=(id) name=(id) value=[value] class="shadow appearance-none border rounded w-full py-2 px-3 leading-tight focus:outline-none focus:shadow-outline bg-gray-700 border-gray-600" {}
        },
    )
}

pub fn form_element(id: &'static str, label: &'static str, input: Markup) -> Markup {
    html! {
        div class="mb-4" {
            label for=(id) class="block text-sm font-bold mb-2 text-gray-300" {(label)}
            (input)
        }
    }
}

pub fn form_submit_button(text: Option<&str>) -> Markup {
    html! {
        div class="flex items-center justify-between" {
            button type="submit" class="bg-blue-500 hover:bg-blue-700 font-bold py-2 px-4 rounded focus:outline-none focus:shadow-outline" {
                (text.unwrap_or("Submit"))
            }
        }
    }
}
