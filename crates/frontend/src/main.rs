mod api;
mod components;
mod coords;
mod pages;
mod theme;

use dioxus::prelude::*;

use components::sidebar::Sidebar;
use pages::dashboard::Dashboard;
use pages::project::ProjectPage;
use pages::projects::Projects;

#[derive(Routable, Clone, PartialEq)]
enum Route {
    #[layout(Shell)]
    #[route("/")]
    Dashboard {},
    #[route("/projects")]
    Projects {},
    #[route("/projects/:id")]
    ProjectPage { id: String },
}

/// Sidebar plus the routed page, themed from the shared theme signal.
#[component]
fn Shell() -> Element {
    let theme = theme::use_theme();
    let class = format!("app theme-{}", theme.read().as_str());
    rsx! {
        div { class: "{class}",
            Sidebar {}
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}

const CSS: Asset = asset!("/assets/main.css");
const FAVICON: Asset = asset!("/assets/favicon.svg");

#[allow(non_snake_case)]
fn App() -> Element {
    theme::use_theme_provider();
    rsx! {
        document::Link { rel: "icon", r#type: "image/svg+xml", href: FAVICON }
        document::Stylesheet { href: CSS }
        document::Title { "Yacht Work Orders" }
        Router::<Route> {}
    }
}

fn main() {
    launch(App);
}
