//! Application root component.

use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

use picbed_client::{HttpConfig, StoreProvider};

use crate::pages::{IndexPage, LoginPage, LogoutPage, NotFound, RegisterPage};

/// Root application component.
///
/// Paths mirror `picbed_client::ROUTES`.
#[component]
pub fn App() -> impl IntoView {
    view! {
        <StoreProvider http=HttpConfig::from_env()>
            <Router>
                <Routes fallback=NotFound>
                    <Route path=path!("/") view=IndexPage/>
                    <Route path=path!("/login") view=LoginPage/>
                    <Route path=path!("/register") view=RegisterPage/>
                    <Route path=path!("/logout") view=LogoutPage/>
                </Routes>
            </Router>
        </StoreProvider>
    }
}
