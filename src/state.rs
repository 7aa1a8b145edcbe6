use crate::{config::AppConfig, store::RecordStore};
use maud::{DOCTYPE, Markup, html};
use std::sync::Arc;

#[derive(Debug)]
pub struct GradRegState<S> {
    store: Arc<S>,
    config: Arc<AppConfig>,
}

//derive(Clone) would want `S: Clone`
impl<S> Clone for GradRegState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: RecordStore> GradRegState<S> {
    pub fn new(store: S, config: Arc<AppConfig>) -> Self {
        Self {
            store: Arc::new(store),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn channel_tag(&self) -> &str {
        &self.config.channel_tag
    }

    #[allow(clippy::unused_self)] //in case self is ever needed :)
    pub fn render(&self, markup: Markup) -> Markup {
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="UTF-8" {}
                    meta name="viewport" content="width=device-width, initial-scale=1.0" {}
                    script src="https://unpkg.com/htmx.org@2.0.4" integrity="sha384-HGfztofotfshcF7+8n44JQL2oJmowVChPTg48S+jvZoztPfvwD79OC/LTtG6dMp+" crossorigin="anonymous" {}
                    script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4" {}
                    title { "Graduation Registration" }
                }
                body class="bg-gray-900 min-h-screen flex flex-col items-center justify-center text-white" {
                    (markup)
                }
            }
        }
    }
}
