//! Route table for the client.
//!
//! The table is plain data; [`navigate`] applies the one side effect it
//! carries (`/logout` clears the login flag before redirecting home).

use crate::store::Store;

/// Views the client can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Index,
    Login,
    Register,
    Logout,
}

/// How a route gets its view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewLoad {
    /// Bundled with the entry point.
    Eager,
    /// Loaded the first time the route is visited.
    Lazy,
    /// No view; the route only redirects.
    Redirect,
}

/// One row of the route table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteDef {
    pub path: &'static str,
    pub name: Option<&'static str>,
    pub route: Route,
    pub load: ViewLoad,
}

pub const ROUTES: &[RouteDef] = &[
    RouteDef {
        path: "/",
        name: Some("Index"),
        route: Route::Index,
        load: ViewLoad::Eager,
    },
    RouteDef {
        path: "/login",
        name: Some("Login"),
        route: Route::Login,
        load: ViewLoad::Lazy,
    },
    RouteDef {
        path: "/register",
        name: Some("Register"),
        route: Route::Register,
        load: ViewLoad::Lazy,
    },
    RouteDef {
        path: "/logout",
        name: None,
        route: Route::Logout,
        load: ViewLoad::Redirect,
    },
];

/// Upper bound on redirects followed by [`resolve`].
const MAX_REDIRECTS: usize = 8;

/// Outcome of one navigation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    Render(&'static RouteDef),
    Redirect(&'static str),
    NotFound,
}

impl Route {
    pub fn def(self) -> &'static RouteDef {
        ROUTES
            .iter()
            .find(|def| def.route == self)
            .unwrap_or(&ROUTES[0])
    }

    pub fn path(self) -> &'static str {
        self.def().path
    }
}

/// Look up the table row for `path`. One trailing slash is ignored.
pub fn match_path(path: &str) -> Option<&'static RouteDef> {
    let path = match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    };
    ROUTES.iter().find(|def| def.path == path)
}

/// Take one navigation step to `path`, running the route's side effect.
pub fn navigate(path: &str, store: &Store) -> Navigation {
    let Some(def) = match_path(path) else {
        log::warn!("[router] No route for '{}'", path);
        return Navigation::NotFound;
    };
    match def.route {
        Route::Logout => {
            store.clear_login();
            Navigation::Redirect(Route::Index.path())
        }
        _ => Navigation::Render(def),
    }
}

/// Navigate to `path`, following redirects to the view that ends up shown.
pub fn resolve(path: &str, store: &Store) -> Navigation {
    let mut next = navigate(path, store);
    for _ in 0..MAX_REDIRECTS {
        match next {
            Navigation::Redirect(to) => next = navigate(to, store),
            _ => return next,
        }
    }
    log::error!("[router] Too many redirects starting at '{}'", path);
    Navigation::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PersistedStorage;

    fn store() -> Store {
        Store::with_storage(PersistedStorage::with_backend("picbed-router-test", None))
    }

    #[test]
    fn test_table_shape() {
        let paths: Vec<_> = ROUTES.iter().map(|def| def.path).collect();
        assert_eq!(paths, vec!["/", "/login", "/register", "/logout"]);

        assert_eq!(Route::Index.def().load, ViewLoad::Eager);
        assert_eq!(Route::Login.def().load, ViewLoad::Lazy);
        assert_eq!(Route::Register.def().load, ViewLoad::Lazy);
        assert_eq!(Route::Logout.def().load, ViewLoad::Redirect);
        assert_eq!(Route::Logout.def().name, None);
    }

    #[test]
    fn test_match_path() {
        assert_eq!(match_path("/").map(|d| d.route), Some(Route::Index));
        assert_eq!(match_path("/login").map(|d| d.route), Some(Route::Login));
        assert_eq!(match_path("/register/").map(|d| d.route), Some(Route::Register));
        assert_eq!(match_path("/upload"), None);
        assert_eq!(match_path(""), None);
    }

    #[test]
    fn test_render_routes_have_no_side_effect() {
        let store = store();
        store.set_login("abc");

        assert_eq!(navigate("/login", &store), Navigation::Render(Route::Login.def()));
        assert!(store.is_login());
    }

    #[test]
    fn test_logout_clears_login_and_redirects_home() {
        let store = store();
        store.set_login("abc");

        assert_eq!(navigate("/logout", &store), Navigation::Redirect("/"));
        assert!(!store.is_login());
        assert_eq!(store.field("sessionId"), serde_json::json!("abc"));
    }

    #[test]
    fn test_resolve_follows_redirect() {
        let store = store();
        store.set_login("abc");

        assert_eq!(resolve("/logout", &store), Navigation::Render(Route::Index.def()));
        assert!(!store.is_login());
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        let store = store();
        assert_eq!(navigate("/admin", &store), Navigation::NotFound);
        assert_eq!(resolve("/admin", &store), Navigation::NotFound);
    }
}
