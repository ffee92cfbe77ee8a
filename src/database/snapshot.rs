use serde_json::Value;

/// Untyped payload delivered by database listeners, analogous to the SDK `DataSnapshot`.
///
/// Values may carry priority metadata in the `{".value": …, ".priority": …}` wire shape; the
/// traversal helpers look through it.
#[derive(Clone, Debug, PartialEq)]
pub struct DataSnapshot {
    key: Option<String>,
    value: Value,
}

impl DataSnapshot {
    pub fn new(key: Option<String>, value: Value) -> Self {
        Self { key, value }
    }

    /// Snapshot of the node called `key`.
    pub fn keyed(key: impl Into<String>, value: Value) -> Self {
        Self::new(Some(key.into()), value)
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn exists(&self) -> bool {
        !self.value.is_null()
    }

    /// The data without priority metadata.
    pub fn data(&self) -> &Value {
        extract_data_ref(&self.value)
    }

    pub fn priority(&self) -> Option<&Value> {
        self.value.as_object().and_then(|obj| obj.get(".priority"))
    }

    /// Returns a snapshot for the provided relative path; missing nodes yield a null value.
    pub fn child(&self, relative_path: &str) -> DataSnapshot {
        let segments = split_path(relative_path);
        let key = segments
            .last()
            .map(|segment| segment.to_string())
            .or_else(|| self.key.clone());
        let value = get_value_at_path(&self.value, &segments).unwrap_or(Value::Null);
        DataSnapshot { key, value }
    }

    pub fn has_child(&self, relative_path: &str) -> bool {
        get_value_at_path(&self.value, &split_path(relative_path))
            .map(|value| !value.is_null())
            .unwrap_or(false)
    }

    pub fn has_children(&self) -> bool {
        self.size() > 0
    }

    /// Number of direct children.
    pub fn size(&self) -> usize {
        match self.data() {
            Value::Object(map) => map.keys().filter(|key| !is_metadata_key(key)).count(),
            Value::Array(array) => array.len(),
            _ => 0,
        }
    }

    /// Direct children in key order; array elements are keyed by index.
    pub fn children(&self) -> Vec<DataSnapshot> {
        match self.data() {
            Value::Object(map) => map
                .iter()
                .filter(|(key, _)| !is_metadata_key(key))
                .map(|(key, value)| DataSnapshot::keyed(key.clone(), value.clone()))
                .collect(),
            Value::Array(array) => array
                .iter()
                .enumerate()
                .map(|(index, value)| DataSnapshot::keyed(index.to_string(), value.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn is_metadata_key(key: &str) -> bool {
    key == ".priority" || key == ".value"
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect()
}

fn extract_data_ref(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|obj| obj.get(".value"))
        .unwrap_or(value)
}

fn get_value_at_path(root: &Value, segments: &[&str]) -> Option<Value> {
    let mut current = root;
    for segment in segments {
        current = match extract_data_ref(current) {
            Value::Object(map) => map.get(*segment)?,
            Value::Array(array) => array.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> DataSnapshot {
        DataSnapshot::keyed(
            "users",
            json!({
                "ada": { "name": "Ada", "age": 36 },
                "bob": { ".value": { "name": "Bob" }, ".priority": 2 },
            }),
        )
    }

    #[test]
    fn child_traverses_nested_paths() {
        let snapshot = users();
        let name = snapshot.child("ada/name");
        assert_eq!(name.key(), Some("name"));
        assert_eq!(name.value(), &json!("Ada"));
        assert!(!snapshot.child("carol").exists());
    }

    #[test]
    fn child_looks_through_priority_wrappers() {
        let snapshot = users();
        assert!(snapshot.has_child("bob/name"));
        assert_eq!(snapshot.child("bob").priority(), Some(&json!(2)));
        assert_eq!(snapshot.child("bob").data(), &json!({ "name": "Bob" }));
    }

    #[test]
    fn children_are_keyed() {
        let snapshot = users();
        let keys: Vec<_> = snapshot
            .children()
            .into_iter()
            .map(|child| child.key().unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["ada", "bob"]);
        assert_eq!(snapshot.size(), 2);

        let list = DataSnapshot::keyed("list", json!(["x", "y"]));
        assert_eq!(list.children()[1], DataSnapshot::keyed("1", json!("y")));
        assert!(!DataSnapshot::new(None, json!(3)).has_children());
    }
}
