use leptos::prelude::*;
use serde_json::Value;

use crate::error::SelectError;
use crate::provider::StoreContext;
use crate::router::{self, Navigation};
use crate::select::IntoSelection;

/// Hook to access the store context.
///
/// # Panics
///
/// Panics if called outside of a `StoreProvider` context.
pub fn use_store() -> StoreContext {
    expect_context::<StoreContext>()
}

/// Hook to read one store field reactively.
///
/// The memo only notifies when this field's value changes, not on every
/// store write.
///
/// # Example
///
/// ```rust,ignore
/// use picbed_client::use_state_field;
///
/// #[component]
/// fn SiteTitle() -> impl IntoView {
///     let site_name = use_state_field("site_name");
///     view! { <h1>{move || site_name.get().as_str().unwrap_or_default().to_string()}</h1> }
/// }
/// ```
pub fn use_state_field(key: impl Into<String>) -> Memo<Value> {
    let ctx = use_store();
    let key = key.into();
    Memo::new(move |_| ctx.field(&key))
}

/// Hook to read `isLogin` reactively.
pub fn use_is_login() -> Memo<bool> {
    let ctx = use_store();
    Memo::new(move |_| {
        ctx.track();
        ctx.store.is_login()
    })
}

/// Hook version of [`Store::map_state`](crate::Store::map_state): one memo per
/// selected key, in selection order.
///
/// # Example
///
/// ```rust,ignore
/// use picbed_client::{use_mapped_state, AliasMap};
///
/// #[component]
/// fn Greeting() -> impl IntoView {
///     let mapped = use_mapped_state(
///         AliasMap::new().derive("display", |s, _| s.nickname.to_uppercase().into()),
///     )
///     .expect("valid selection");
///     let display = mapped[0].1;
///     view! { <span>{move || display.get().to_string()}</span> }
/// }
/// ```
pub fn use_mapped_state(
    selection: impl IntoSelection<()>,
) -> Result<Vec<(String, Memo<Value>)>, SelectError> {
    let ctx = use_store();
    let mapped = ctx.store.map_state(selection)?;
    Ok(mapped
        .into_accessors()
        .into_iter()
        .map(|(key, accessor)| {
            let ctx = ctx.clone();
            let memo = Memo::new(move |_| {
                ctx.track();
                accessor.get(&())
            });
            (key, memo)
        })
        .collect())
}

/// Hook returning a callback that refetches the site configuration.
pub fn use_fetch_config() -> impl Fn() + Clone + Send + Sync + 'static {
    let ctx = use_store();
    move || ctx.spawn_fetch_config()
}

/// Hook to take one navigation step through the route table, running its
/// side effect against the store.
pub fn use_route_navigation(path: &str) -> Navigation {
    let ctx = use_store();
    router::navigate(path, &ctx.store)
}
