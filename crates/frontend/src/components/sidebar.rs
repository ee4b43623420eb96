use dioxus::prelude::*;

use crate::theme::{self, Theme};
use crate::Route;

#[component]
pub fn Sidebar() -> Element {
    let mut theme_signal = theme::use_theme();
    let current = *theme_signal.read();
    let toggle_label = match current {
        Theme::Light => "☾ Dark mode",
        Theme::Dark => "☀ Light mode",
    };

    rsx! {
        nav { class: "sidebar",
            Link { class: "brand", to: Route::Dashboard {},
                span { class: "brand-mark", "⚓" }
                span { "Yacht Work Orders" }
            }
            ul { class: "nav-links",
                li { Link { to: Route::Dashboard {}, active_class: "active", "Dashboard" } }
                li { Link { to: Route::Projects {}, active_class: "active", "Projects" } }
            }
            button {
                class: "theme-toggle secondary",
                onclick: move |_| {
                    let next = theme_signal.read().toggled();
                    theme_signal.set(next);
                    theme::save(next);
                },
                "{toggle_label}"
            }
        }
    }
}
