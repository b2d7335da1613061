use url::form_urlencoded;

/// Flat key/value parameter set for a single tracking request.
///
/// Keys keep their insertion order, so two builds from the same tracker
/// state produce the same query string.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryParams {
    params: Vec<(String, String)>,
    suffix: Option<String>,
}

impl QueryParams {
    pub fn new() -> Self {
        QueryParams {
            params: Vec::new(),
            suffix: None,
        }
    }

    pub fn push<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.params.push((key.into(), value.into()));
    }

    /// Returns the value of the first parameter with the given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Appends a raw string verbatim to the encoded query, without escaping.
    pub(crate) fn set_suffix<T: Into<String>>(&mut self, suffix: T) {
        self.suffix = Some(suffix.into());
    }

    /// Percent-encodes the parameter set into a query string.
    ///
    /// The debug suffix, if any, is appended verbatim at the end.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.params {
            serializer.append_pair(key, value);
        }
        let mut query = serializer.finish();
        if let Some(suffix) = &self.suffix {
            query.push_str(suffix);
        }
        query
    }
}
