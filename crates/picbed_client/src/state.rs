use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StateError;

/// Session and UI state shared by every view.
///
/// Serializes with the same key names the server and the persisted snapshot
/// use. Keys that are not one of the known fields are kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalState {
    // session
    #[serde(rename = "isLogin")]
    pub is_login: bool,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    #[serde(rename = "sessionId")]
    pub session_id: String,

    // site config, filled by `Store::fetch_config`
    pub beian: String,
    pub bg_mg: String,
    pub bg_mobile: String,
    pub bulletin: String,
    pub favicon: String,
    pub logo: String,
    pub site_name: String,

    // profile
    pub avatar: String,
    pub email: String,
    pub nickname: String,
    pub username: String,

    /// Any other key written into the state.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GlobalState {
    /// Names of the known fields, in declaration order.
    pub const FIELDS: &'static [&'static str] = &[
        "isLogin",
        "isAdmin",
        "sessionId",
        "beian",
        "bg_mg",
        "bg_mobile",
        "bulletin",
        "favicon",
        "logo",
        "site_name",
        "avatar",
        "email",
        "nickname",
        "username",
    ];

    /// Defaults with `snapshot` shallow-merged on top.
    ///
    /// Stored values win key by key. A known key holding a value of the wrong
    /// type is logged and skipped. Anything but a JSON object is ignored.
    pub fn from_snapshot(snapshot: Option<Value>) -> Self {
        let mut state = Self::default();
        match snapshot {
            Some(Value::Object(map)) => {
                for (key, value) in map {
                    if let Err(e) = state.assign(&key, value) {
                        log::warn!("[GlobalState] Ignoring persisted value: {}", e);
                    }
                }
            }
            Some(other) => {
                log::warn!("[GlobalState] Ignoring non-object snapshot: {}", other);
            }
            None => {}
        }
        state
    }

    /// Current value of `key`, or `Value::Null` when nothing is stored there.
    pub fn field(&self, key: &str) -> Value {
        match key {
            "isLogin" => Value::Bool(self.is_login),
            "isAdmin" => Value::Bool(self.is_admin),
            _ => match self.string_field(key) {
                Some(s) => Value::String(s.clone()),
                None => self.extra.get(key).cloned().unwrap_or(Value::Null),
            },
        }
    }

    /// Write `value` into `key`.
    ///
    /// Known fields are type checked; `null` resets them to their default.
    /// Returns whether the stored value changed.
    pub fn assign(&mut self, key: &str, value: Value) -> Result<bool, StateError> {
        match key {
            "isLogin" => assign_bool(&mut self.is_login, key, value),
            "isAdmin" => assign_bool(&mut self.is_admin, key, value),
            _ => match self.string_field_mut(key) {
                Some(slot) => assign_string(slot, key, value),
                None => {
                    if self.extra.get(key) == Some(&value) {
                        return Ok(false);
                    }
                    self.extra.insert(key.to_string(), value);
                    Ok(true)
                }
            },
        }
    }

    fn string_field(&self, key: &str) -> Option<&String> {
        let field = match key {
            "sessionId" => &self.session_id,
            "beian" => &self.beian,
            "bg_mg" => &self.bg_mg,
            "bg_mobile" => &self.bg_mobile,
            "bulletin" => &self.bulletin,
            "favicon" => &self.favicon,
            "logo" => &self.logo,
            "site_name" => &self.site_name,
            "avatar" => &self.avatar,
            "email" => &self.email,
            "nickname" => &self.nickname,
            "username" => &self.username,
            _ => return None,
        };
        Some(field)
    }

    fn string_field_mut(&mut self, key: &str) -> Option<&mut String> {
        let field = match key {
            "sessionId" => &mut self.session_id,
            "beian" => &mut self.beian,
            "bg_mg" => &mut self.bg_mg,
            "bg_mobile" => &mut self.bg_mobile,
            "bulletin" => &mut self.bulletin,
            "favicon" => &mut self.favicon,
            "logo" => &mut self.logo,
            "site_name" => &mut self.site_name,
            "avatar" => &mut self.avatar,
            "email" => &mut self.email,
            "nickname" => &mut self.nickname,
            "username" => &mut self.username,
            _ => return None,
        };
        Some(field)
    }
}

fn assign_bool(slot: &mut bool, key: &str, value: Value) -> Result<bool, StateError> {
    let next = match value {
        Value::Bool(b) => b,
        Value::Null => false,
        _ => {
            return Err(StateError::FieldType {
                field: key.to_string(),
                expected: "boolean",
            });
        }
    };
    let changed = *slot != next;
    *slot = next;
    Ok(changed)
}

fn assign_string(slot: &mut String, key: &str, value: Value) -> Result<bool, StateError> {
    let next = match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        _ => {
            return Err(StateError::FieldType {
                field: key.to_string(),
                expected: "string",
            });
        }
    };
    if *slot == next {
        return Ok(false);
    }
    *slot = next;
    Ok(true)
}

/// JavaScript truthiness of a JSON value.
///
/// `null`, `false`, `0` and `""` are falsy; arrays and objects are always
/// truthy, even when empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_known_field_is_defined_by_default() {
        let state = GlobalState::default();
        for key in GlobalState::FIELDS {
            assert_ne!(state.field(key), Value::Null, "field {} is undefined", key);
        }
        assert_eq!(state.field("isLogin"), json!(false));
        assert_eq!(state.field("site_name"), json!(""));
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let mut state = GlobalState::default();
        state.is_login = true;
        state.session_id = "abc".to_string();
        state.extra.insert("upload_limit".to_string(), json!(10));

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["isLogin"], json!(true));
        assert_eq!(value["sessionId"], json!("abc"));
        assert_eq!(value["bg_mobile"], json!(""));
        assert_eq!(value["upload_limit"], json!(10));
        assert!(value.get("is_login").is_none());
        assert!(value.get("extra").is_none());
    }

    #[test]
    fn test_snapshot_overrides_defaults() {
        let state = GlobalState::from_snapshot(Some(json!({
            "isLogin": true,
            "sessionId": "s-1",
            "nickname": "neo",
        })));

        assert!(state.is_login);
        assert_eq!(state.session_id, "s-1");
        assert_eq!(state.nickname, "neo");
        assert_eq!(state.username, "");
        assert!(!state.is_admin);
    }

    #[test]
    fn test_snapshot_with_wrong_types_keeps_defaults() {
        let state = GlobalState::from_snapshot(Some(json!({
            "isLogin": "yes",
            "email": 42,
            "logo": "/static/logo.png",
        })));

        assert!(!state.is_login);
        assert_eq!(state.email, "");
        assert_eq!(state.logo, "/static/logo.png");
    }

    #[test]
    fn test_non_object_snapshot_is_ignored() {
        assert_eq!(GlobalState::from_snapshot(Some(json!([1, 2]))), GlobalState::default());
        assert_eq!(GlobalState::from_snapshot(None), GlobalState::default());
    }

    #[test]
    fn test_assign_reports_changes() {
        let mut state = GlobalState::default();

        assert_eq!(state.assign("site_name", json!("Foo")), Ok(true));
        assert_eq!(state.assign("site_name", json!("Foo")), Ok(false));
        assert_eq!(state.assign("isAdmin", json!(true)), Ok(true));
        assert_eq!(state.assign("isAdmin", json!(null)), Ok(true));
        assert!(!state.is_admin);
    }

    #[test]
    fn test_assign_rejects_wrong_type() {
        let mut state = GlobalState::default();
        let err = state.assign("isLogin", json!(1)).unwrap_err();
        assert_eq!(
            err,
            StateError::FieldType {
                field: "isLogin".to_string(),
                expected: "boolean",
            }
        );
        assert!(state.assign("avatar", json!(["x"])).is_err());
    }

    #[test]
    fn test_unknown_keys_go_to_extra() {
        let mut state = GlobalState::default();
        assert_eq!(state.assign("upload_exts", json!(["png", "jpg"])), Ok(true));
        assert_eq!(state.field("upload_exts"), json!(["png", "jpg"]));
        assert_eq!(state.field("missing"), Value::Null);
    }

    #[test]
    fn test_truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!is_truthy(&falsy), "{} should be falsy", falsy);
        }
        for truthy in [json!(true), json!(1), json!(-2.5), json!("0"), json!([]), json!({})] {
            assert!(is_truthy(&truthy), "{} should be truthy", truthy);
        }
    }
}
