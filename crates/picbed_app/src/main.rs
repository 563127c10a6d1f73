//! Picbed web client
//!
//! Leptos CSR front end for the picbed image host. Build and serve with:
//!   cd crates/picbed_app
//!   trunk serve --open
//!
//! Set `PICBED_API_URL` at build time to point at an API that is not
//! served under `/api` on the same origin.

mod app;
mod pages;

fn main() {
    console_error_panic_hook::set_once();
    _ = console_log::init_with_level(log::Level::Debug);

    leptos::mount::mount_to_body(app::App);
}
