use serde_json::Value as Json;

use super::{Realm, Value};

impl Realm {
    /// Build realm values from a JSON document: objects become ordinary
    /// objects (document key order), arrays become arrays.
    pub fn import_json(&mut self, json: &Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::string(s),
            Json::Array(xs) => {
                let items: Vec<Value> = xs.iter().map(|x| self.import_json(x)).collect();
                Value::Object(self.new_array(items))
            }
            Json::Object(map) => {
                let obj = self.new_object();
                for (k, v) in map {
                    let v = self.import_json(v);
                    self.set(obj, k.as_str(), v);
                }
                Value::Object(obj)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn objects_keep_document_order() {
        let mut realm = Realm::new();
        let value = realm.import_json(&json!({"z": 1, "a": [true, null], "m": "x"}));
        let obj = value.as_object().unwrap();
        let keys: Vec<String> = realm.own_keys(obj).iter().map(ToString::to_string).collect();
        assert_eq!(keys, ["z", "a", "m"]);
        let a = realm.get(obj, "a").unwrap().as_object().unwrap();
        assert!(realm.is_array(a));
        assert_eq!(realm.get(a, "length").unwrap().as_number(), Some(2.0));
    }
}
