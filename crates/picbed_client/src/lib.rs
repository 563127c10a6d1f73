//! # Picbed Client
//!
//! Reactive browser client for the picbed image host, with Leptos integration.
//!
//! ## Features
//!
//! - **Global store**: one live [`GlobalState`] shared by every view, with
//!   explicit subscribe/notify on each field change
//! - **Persistence**: state seeded from `localStorage` through a
//!   [`PersistedStorage`] adapter that never fails its caller
//! - **Site config**: [`Store::fetch_config`] merges `GET /api/spa` into the state
//! - **Field selection**: [`Store::map_state`] builds named accessors that
//!   always read the latest value
//! - **Routing**: a small route table with a side-effecting `/logout`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use leptos::prelude::*;
//! use picbed_client::{StoreProvider, use_state_field, use_store};
//!
//! #[component]
//! fn App() -> impl IntoView {
//!     view! {
//!         <StoreProvider>
//!             <Header/>
//!         </StoreProvider>
//!     }
//! }
//!
//! #[component]
//! fn Header() -> impl IntoView {
//!     let site_name = use_state_field("site_name");
//!     let ctx = use_store();
//!     let logout = move |_| ctx.store.clear_login();
//!
//!     view! {
//!         <h1>{move || site_name.get().as_str().unwrap_or_default().to_string()}</h1>
//!         <button on:click=logout>"Log out"</button>
//!     }
//! }
//! ```
//!
//! Outside of Leptos the store is a plain handle:
//!
//! ```rust,ignore
//! use picbed_client::{ApiClient, HttpConfig, Store};
//!
//! let store = Store::new();
//! store.set_login("session-id");
//! let api = ApiClient::new(HttpConfig::from_env())?;
//! store.fetch_config(&api).await;
//! ```

// Module declarations
mod error;
mod hooks;
mod provider;
mod select;
mod state;
mod store;

pub mod http;
pub mod router;
pub mod storage;

// Re-exports
pub use error::{ApiError, SelectError, StateError, StorageError};
pub use http::{ApiClient, HttpConfig, HttpTransport, ReqwestTransport};
pub use router::{Navigation, Route, RouteDef, ViewLoad, ROUTES};
pub use select::{
    Accessor, AliasMap, Derivation, FieldDescriptor, IntoSelection, MappedState, Selection,
    SelectionItem, Selector, normalize,
};
pub use state::{GlobalState, is_truthy};
pub use storage::{MemoryStorage, PersistedStorage, StorageBackend, get_storage, set_storage};
pub use store::{CONFIG_PATH, STATE_STORAGE_KEY, StateChange, Store, SubscriptionId};

pub use hooks::{
    use_fetch_config, use_is_login, use_mapped_state, use_route_navigation, use_state_field,
    use_store,
};
pub use provider::{StoreContext, StoreProvider};
