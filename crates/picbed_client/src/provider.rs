use leptos::prelude::*;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{ApiClient, HttpConfig};
use crate::store::Store;

/// Context giving views access to the global store.
///
/// Provided by [`StoreProvider`], consumed through [`use_store`](crate::use_store)
/// and the other hooks.
#[derive(Clone)]
pub struct StoreContext {
    /// The live store
    pub store: Store,
    /// Defaults for every API request
    pub http: HttpConfig,
    /// Bumped on every store change so reactive readers re-run
    version: RwSignal<u64>,
}

impl StoreContext {
    /// Subscribe to the current reactive owner.
    pub fn track(&self) {
        self.version.track();
    }

    /// Read one field, tracking store changes.
    pub fn field(&self, key: &str) -> Value {
        self.version.track();
        self.store.field(key)
    }

    /// Build an API client with the configured defaults.
    pub fn api(&self) -> Result<ApiClient, ApiError> {
        ApiClient::new(self.http.clone())
    }

    /// Run [`Store::fetch_config`] in the background.
    pub fn spawn_fetch_config(&self) {
        let store = self.store.clone();
        let api = self.api();
        leptos::task::spawn_local(async move {
            match api {
                Ok(api) => store.fetch_config(&api).await,
                Err(e) => log::error!("[StoreProvider] Failed to build API client: {}", e),
            }
        });
    }
}

/// Provider component that creates the global store and provides [`StoreContext`].
///
/// # Example
///
/// ```rust,ignore
/// use picbed_client::StoreProvider;
///
/// #[component]
/// pub fn App() -> impl IntoView {
///     view! {
///         <StoreProvider>
///             <MyAppUI />
///         </StoreProvider>
///     }
/// }
/// ```
#[component]
pub fn StoreProvider(
    /// Store to provide (default: seeded from browser storage)
    #[prop(optional)]
    store: Option<Store>,
    /// HTTP defaults (default: `HttpConfig::from_env()`)
    #[prop(optional)]
    http: Option<HttpConfig>,
    /// Whether to fetch the site configuration on mount (default: true)
    #[prop(optional)]
    fetch_config: Option<bool>,
    /// Child components
    children: Children,
) -> impl IntoView {
    let store = store.unwrap_or_default();
    let http = http.unwrap_or_else(HttpConfig::from_env);
    let version = RwSignal::new(0u64);

    // The signal is gone once the provider unmounts; try_update skips the write then.
    let id = store.subscribe(move |change| {
        log::debug!("[StoreProvider] {} = {}", change.key, change.value);
        let _ = version.try_update(|v| *v = v.wrapping_add(1));
    });
    let subscribed = store.clone();
    on_cleanup(move || {
        subscribed.unsubscribe(id);
    });

    let ctx = StoreContext {
        store,
        http,
        version,
    };
    provide_context(ctx.clone());

    if fetch_config.unwrap_or(true) {
        ctx.spawn_fetch_config();
    }

    children()
}
