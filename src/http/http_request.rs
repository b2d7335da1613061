use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub headers: HashMap<String, String>,
}

impl HttpRequest {
    pub fn new() -> Self {
        HttpRequest {
            method: String::from("GET"),
            headers: HashMap::new(),
        }
    }

    /// Builds a default GET request equal to:
    ///
    /// HttpRequest::new().method("GET")
    pub fn get() -> Self {
        HttpRequest::new().method("GET")
    }

    pub fn method<T: AsRef<str>>(mut self, method: T) -> Self {
        self.method = method.as_ref().to_uppercase();
        self
    }

    pub fn header<T: AsRef<str>>(mut self, key: T, value: T) -> Self {
        self.headers.insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }
}

impl Default for HttpRequest {
    fn default() -> Self {
        HttpRequest::new()
    }
}
