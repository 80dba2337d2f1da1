use serde::Deserialize;

/// Where a store's resource lives.
///
/// Deserializable so it can sit in an application's config file:
///
/// ```rust
/// use remodel::store::StoreOptions;
///
/// let options: StoreOptions = serde_json::from_str(r#"{ "model_name": "person" }"#).unwrap();
/// assert_eq!(options.base_path, "/api");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    pub base_path: String,
    /// Overrides the resource's `MODEL_NAME`.
    pub model_name: Option<String>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            base_path: "/api".to_string(),
            model_name: None,
        }
    }
}

impl StoreOptions {
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }
}
