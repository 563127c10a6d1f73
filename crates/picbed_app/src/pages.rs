//! Route views.

use leptos::prelude::*;
use leptos_router::components::{Redirect, A};
use serde_json::{json, Value};

use picbed_client::{
    use_is_login, use_mapped_state, use_route_navigation, use_state_field, use_store, AliasMap,
    Navigation, Route, Selection,
};

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[component]
pub fn IndexPage() -> impl IntoView {
    let site_name = use_state_field("site_name");
    let bulletin = use_state_field("bulletin");
    let is_login = use_is_login();

    let greeting = use_mapped_state(Selection::AliasMap(AliasMap::new().derive(
        "greeting",
        |s, _: &()| {
            let name = if s.nickname.is_empty() { &s.username } else { &s.nickname };
            Value::from(format!("Hi, {}", name))
        },
    )))
    .ok()
    .and_then(|mapped| mapped.into_iter().next().map(|(_, memo)| memo));

    view! {
        <main class="index">
            <h1>{move || text(&site_name.get())}</h1>
            <Show when=move || !bulletin.get().as_str().unwrap_or_default().is_empty()>
                <p class="bulletin">{move || text(&bulletin.get())}</p>
            </Show>
            <Show
                when=move || is_login.get()
                fallback=|| view! {
                    <nav>
                        <A href="/login">"Log in"</A>
                        " "
                        <A href="/register">"Register"</A>
                    </nav>
                }
            >
                <nav>
                    <span>{move || greeting.map(|g| text(&g.get())).unwrap_or_default()}</span>
                    " "
                    <A href="/logout">"Log out"</A>
                </nav>
            </Show>
        </main>
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let site_name = use_state_field("site_name");

    view! {
        <main class="login">
            <h1>{move || format!("Log in to {}", text(&site_name.get()))}</h1>
            <A href="/register">"Create an account"</A>
        </main>
    }
}

#[component]
pub fn RegisterPage() -> impl IntoView {
    let ctx = use_store();
    let (username, set_username) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (message, set_message) = signal(None::<String>);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let api = match ctx.api() {
            Ok(api) => api,
            Err(e) => {
                log::error!("[RegisterPage] {}", e);
                set_message.set(Some(e.to_string()));
                return;
            }
        };
        let username = username.get_untracked();
        let password = password.get_untracked();
        leptos::task::spawn_local(async move {
            let form = [("username", username.as_str()), ("password", password.as_str())];
            match api.post_form("/register", &form).await {
                Ok(body) if body.get("code") == Some(&json!(0)) => {
                    set_message.set(Some("Registered, you can log in now.".to_string()));
                }
                Ok(body) => {
                    let msg = body
                        .get("msg")
                        .and_then(Value::as_str)
                        .unwrap_or("Registration failed");
                    set_message.set(Some(msg.to_string()));
                }
                Err(e) => {
                    log::error!("[RegisterPage] {}", e);
                    set_message.set(Some(e.to_string()));
                }
            }
        });
    };

    view! {
        <main class="register">
            <h1>"Register"</h1>
            <form on:submit=on_submit>
                <input
                    type="text"
                    placeholder="Username"
                    prop:value=username
                    on:input=move |ev| set_username.set(event_target_value(&ev))
                />
                <input
                    type="password"
                    placeholder="Password"
                    prop:value=password
                    on:input=move |ev| set_password.set(event_target_value(&ev))
                />
                <button type="submit">"Register"</button>
            </form>
            <p class="message">{move || message.get().unwrap_or_default()}</p>
        </main>
    }
}

/// Clears the login flag, then sends the visitor home.
#[component]
pub fn LogoutPage() -> impl IntoView {
    let to = match use_route_navigation(Route::Logout.path()) {
        Navigation::Redirect(to) => to,
        _ => Route::Index.path(),
    };
    view! { <Redirect path=to/> }
}

#[component]
pub fn NotFound() -> impl IntoView {
    view! { <p>"Page not found."</p> }
}
