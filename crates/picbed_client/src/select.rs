//! Named accessors over store fields.
//!
//! A [`Selection`] says which fields a view wants and under which names.
//! [`Store::map_state`] turns it into a [`MappedState`]: one accessor per
//! name, each re-reading the live state whenever it is called.
//!
//! ```rust,ignore
//! use picbed_client::{AliasMap, Selection, Store};
//!
//! let store = Store::new();
//! let mapped = store.map_state(Selection::FieldList(vec![
//!     "site_name".into(),
//!     AliasMap::new()
//!         .field("title", "site_name")
//!         .derive("display", |s, _ctx: &()| s.nickname.to_uppercase().into())
//!         .into(),
//! ]))?;
//!
//! let title = mapped.read("title", &());
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::SelectError;
use crate::state::GlobalState;
use crate::store::Store;

/// Derivation over the live state and the caller's own context.
pub type Derivation<C> = Arc<dyn Fn(&GlobalState, &C) -> Value + Send + Sync>;

/// Where an accessor gets its value from.
pub enum Selector<C = ()> {
    /// Read the named field.
    Field(String),
    /// Compute a value from the state and the caller's context.
    Derive(Derivation<C>),
}

impl<C> Clone for Selector<C> {
    fn clone(&self) -> Self {
        match self {
            Selector::Field(name) => Selector::Field(name.clone()),
            Selector::Derive(f) => Selector::Derive(f.clone()),
        }
    }
}

impl<C> fmt::Debug for Selector<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Selector::Derive(_) => f.write_str("Derive(..)"),
        }
    }
}

/// Ordered alias → selector entries.
pub struct AliasMap<C = ()> {
    entries: Vec<(String, Selector<C>)>,
}

impl<C> AliasMap<C> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Expose field `name` as `alias`.
    pub fn field(mut self, alias: impl Into<String>, name: impl Into<String>) -> Self {
        self.insert(alias.into(), Selector::Field(name.into()));
        self
    }

    /// Expose the result of `f` as `alias`.
    pub fn derive(
        mut self,
        alias: impl Into<String>,
        f: impl Fn(&GlobalState, &C) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.insert(alias.into(), Selector::Derive(Arc::new(f)));
        self
    }

    /// Insert or replace `alias`. A replaced alias keeps its original position.
    pub fn insert(&mut self, alias: String, selector: Selector<C>) {
        match self.entries.iter_mut().find(|(key, _)| *key == alias) {
            Some(entry) => entry.1 = selector,
            None => self.entries.push((alias, selector)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C> Default for AliasMap<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for AliasMap<C> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<C> fmt::Debug for AliasMap<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

/// One entry of a [`Selection::FieldList`].
#[derive(Clone, Debug)]
pub enum SelectionItem<C = ()> {
    /// Field exposed under its own name.
    Field(String),
    /// Several aliased entries.
    Aliases(AliasMap<C>),
}

impl<C> From<&str> for SelectionItem<C> {
    fn from(name: &str) -> Self {
        SelectionItem::Field(name.to_string())
    }
}

impl<C> From<String> for SelectionItem<C> {
    fn from(name: String) -> Self {
        SelectionItem::Field(name)
    }
}

impl<C> From<AliasMap<C>> for SelectionItem<C> {
    fn from(map: AliasMap<C>) -> Self {
        SelectionItem::Aliases(map)
    }
}

/// The fields a caller wants accessors for.
#[derive(Clone, Debug)]
pub enum Selection<C = ()> {
    SingleField(String),
    FieldList(Vec<SelectionItem<C>>),
    AliasMap(AliasMap<C>),
}

/// A normalized `{ key, val }` pair.
#[derive(Clone, Debug)]
pub struct FieldDescriptor<C = ()> {
    pub key: String,
    pub val: Selector<C>,
}

/// Flatten a selection into descriptors: list order first, then alias
/// insertion order within each alias map.
pub fn normalize<C>(selection: Selection<C>) -> Vec<FieldDescriptor<C>> {
    let items = match selection {
        Selection::SingleField(name) => vec![SelectionItem::Field(name)],
        Selection::FieldList(items) => items,
        Selection::AliasMap(map) => vec![SelectionItem::Aliases(map)],
    };
    let mut descriptors = Vec::new();
    for item in items {
        match item {
            SelectionItem::Field(name) => descriptors.push(FieldDescriptor {
                key: name.clone(),
                val: Selector::Field(name),
            }),
            SelectionItem::Aliases(map) => descriptors.extend(
                map.entries
                    .into_iter()
                    .map(|(key, val)| FieldDescriptor { key, val }),
            ),
        }
    }
    descriptors
}

/// Anything [`Store::map_state`] accepts.
pub trait IntoSelection<C = ()> {
    fn into_selection(self) -> Result<Selection<C>, SelectError>;
}

impl<C> IntoSelection<C> for Selection<C> {
    fn into_selection(self) -> Result<Selection<C>, SelectError> {
        Ok(self)
    }
}

impl<C> IntoSelection<C> for AliasMap<C> {
    fn into_selection(self) -> Result<Selection<C>, SelectError> {
        Ok(Selection::AliasMap(self))
    }
}

impl<C> IntoSelection<C> for &str {
    fn into_selection(self) -> Result<Selection<C>, SelectError> {
        Ok(Selection::SingleField(self.to_string()))
    }
}

impl<C> IntoSelection<C> for String {
    fn into_selection(self) -> Result<Selection<C>, SelectError> {
        Ok(Selection::SingleField(self))
    }
}

impl<C> IntoSelection<C> for Vec<&str> {
    fn into_selection(self) -> Result<Selection<C>, SelectError> {
        Ok(Selection::FieldList(self.into_iter().map(SelectionItem::from).collect()))
    }
}

/// Selections written as JSON: a string, an array of strings and alias
/// objects, or an alias object whose values are field names.
///
/// Any other shape is rejected with [`SelectError::InvalidType`].
impl<C> IntoSelection<C> for Value {
    fn into_selection(self) -> Result<Selection<C>, SelectError> {
        match self {
            Value::String(name) => Ok(Selection::SingleField(name)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(name) => Ok(SelectionItem::Field(name)),
                    Value::Object(map) => alias_map_from_json(map).map(SelectionItem::Aliases),
                    other => Err(invalid(&other)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Selection::FieldList),
            Value::Object(map) => alias_map_from_json(map).map(Selection::AliasMap),
            other => Err(invalid(&other)),
        }
    }
}

fn alias_map_from_json<C>(map: serde_json::Map<String, Value>) -> Result<AliasMap<C>, SelectError> {
    let mut aliases = AliasMap::new();
    for (alias, value) in map {
        match value {
            Value::String(name) => aliases.insert(alias, Selector::Field(name)),
            other => return Err(invalid(&other)),
        }
    }
    Ok(aliases)
}

fn invalid(value: &Value) -> SelectError {
    let kind = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    SelectError::InvalidType(format!("expected a field name, list or alias object, got {}", kind))
}

/// Reads one selected value from the live state.
pub struct Accessor<C = ()> {
    store: Store,
    val: Selector<C>,
}

impl<C> Accessor<C> {
    /// Current value. Field selectors read `state[name]`; derivations are
    /// called with the live state and `ctx`.
    pub fn get(&self, ctx: &C) -> Value {
        match &self.val {
            Selector::Field(name) => self.store.field(name),
            Selector::Derive(f) => {
                let state = self.store.snapshot();
                f(&state, ctx)
            }
        }
    }

    pub fn selector(&self) -> &Selector<C> {
        &self.val
    }
}

impl<C> Clone for Accessor<C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            val: self.val.clone(),
        }
    }
}

/// Accessors produced by [`Store::map_state`], in selection order.
pub struct MappedState<C = ()> {
    accessors: Vec<(String, Accessor<C>)>,
}

impl<C> MappedState<C> {
    pub(crate) fn new(store: Store, selection: Selection<C>) -> Self {
        let mut mapped = Self {
            accessors: Vec::new(),
        };
        for FieldDescriptor { key, val } in normalize(selection) {
            let accessor = Accessor {
                store: store.clone(),
                val,
            };
            // A later entry with the same key replaces the earlier one.
            match mapped.accessors.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = accessor,
                None => mapped.accessors.push((key, accessor)),
            }
        }
        mapped
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.accessors.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Accessor<C>> {
        self.accessors
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, accessor)| accessor)
    }

    /// Shorthand for `get(key)` followed by [`Accessor::get`].
    pub fn read(&self, key: &str, ctx: &C) -> Option<Value> {
        self.get(key).map(|accessor| accessor.get(ctx))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Accessor<C>)> {
        self.accessors.iter().map(|(key, accessor)| (key.as_str(), accessor))
    }

    pub fn into_accessors(self) -> Vec<(String, Accessor<C>)> {
        self.accessors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PersistedStorage;
    use serde_json::json;

    fn store() -> Store {
        Store::with_storage(PersistedStorage::with_backend("picbed-select-test", None))
    }

    #[test]
    fn test_single_field_reads_live_value() {
        let store = store();
        store.set_field("username", json!("neo"));

        let mapped = store.map_state::<()>("username").unwrap();
        assert_eq!(mapped.keys().collect::<Vec<_>>(), vec!["username"]);

        let username = mapped.get("username").unwrap();
        assert_eq!(username.get(&()), json!("neo"));

        store.set_field("username", json!("trinity"));
        assert_eq!(username.get(&()), json!("trinity"));
    }

    #[test]
    fn test_derivation_sees_live_state() {
        let store = store();
        store.set_field("nickname", json!("morpheus"));

        let mapped = store
            .map_state(AliasMap::new().derive("display", |s, _: &()| {
                Value::from(s.nickname.to_uppercase())
            }))
            .unwrap();

        assert_eq!(mapped.read("display", &()), Some(json!("MORPHEUS")));
        store.set_field("nickname", json!("oracle"));
        assert_eq!(mapped.read("display", &()), Some(json!("ORACLE")));
    }

    #[test]
    fn test_derivation_receives_caller_context() {
        struct Header {
            greeting: &'static str,
        }

        let store = store();
        store.set_field("nickname", json!("neo"));

        let mapped = store
            .map_state(AliasMap::new().derive("welcome", |s: &GlobalState, ctx: &Header| {
                Value::from(format!("{}, {}", ctx.greeting, s.nickname))
            }))
            .unwrap();

        let header = Header { greeting: "Hello" };
        assert_eq!(mapped.read("welcome", &header), Some(json!("Hello, neo")));
    }

    #[test]
    fn test_list_preserves_order() {
        let store = store();
        let selection: Selection = Selection::FieldList(vec![
            "site_name".into(),
            AliasMap::new()
                .field("isLoggedIn", "isLogin")
                .field("title", "site_name")
                .into(),
            "logo".into(),
        ]);

        let mapped = store.map_state(selection).unwrap();
        assert_eq!(
            mapped.keys().collect::<Vec<_>>(),
            vec!["site_name", "isLoggedIn", "title", "logo"]
        );
        assert_eq!(mapped.read("isLoggedIn", &()), Some(json!(false)));
        store.set_login("abc");
        assert_eq!(mapped.read("isLoggedIn", &()), Some(json!(true)));
    }

    #[test]
    fn test_normalize_descriptors() {
        let descriptors = normalize::<()>(Selection::FieldList(vec![
            "email".into(),
            AliasMap::new().field("mail", "email").into(),
        ]));

        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].key, "email");
        assert!(matches!(&descriptors[0].val, Selector::Field(name) if name == "email"));
        assert_eq!(descriptors[1].key, "mail");
        assert!(matches!(&descriptors[1].val, Selector::Field(name) if name == "email"));
    }

    #[test]
    fn test_vec_of_names() {
        let store = store();
        let mapped = store.map_state::<()>(vec!["avatar", "email"]).unwrap();
        assert_eq!(mapped.len(), 2);
        assert_eq!(mapped.read("email", &()), Some(json!("")));
        assert_eq!(mapped.read("missing", &()), None);
    }

    #[test]
    fn test_json_selection() {
        let store = store();
        store.set_field("bulletin", json!("hi"));

        let mapped = store
            .map_state::<()>(json!(["logo", {"notice": "bulletin", "icon": "favicon"}]))
            .unwrap();
        assert_eq!(mapped.keys().collect::<Vec<_>>(), vec!["logo", "notice", "icon"]);
        assert_eq!(mapped.read("notice", &()), Some(json!("hi")));

        let mapped = store.map_state::<()>(json!("bulletin")).unwrap();
        assert_eq!(mapped.read("bulletin", &()), Some(json!("hi")));
    }

    #[test]
    fn test_json_alias_map_keeps_key_order() {
        let store = store();
        let mapped = store
            .map_state::<()>(json!({"zeta": "logo", "alpha": "favicon", "mid": "bulletin"}))
            .unwrap();
        assert_eq!(mapped.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_invalid_type_is_rejected() {
        let store = store();
        for bad in [json!(42), json!(null), json!(true), json!([7]), json!({"a": 1})] {
            let err = store.map_state::<()>(bad.clone()).err();
            assert!(
                matches!(err, Some(SelectError::InvalidType(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_unknown_field_reads_null() {
        let store = store();
        let mapped = store.map_state::<()>("nope").unwrap();
        assert_eq!(mapped.read("nope", &()), Some(Value::Null));
    }

    #[test]
    fn test_duplicate_keys_keep_last() {
        let store = store();
        store.set_field("logo", json!("l.png"));
        store.set_field("favicon", json!("f.ico"));

        let mapped = store
            .map_state::<()>(json!([{"img": "logo"}, {"img": "favicon"}]))
            .unwrap();
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped.read("img", &()), Some(json!("f.ico")));
    }
}
