use url::form_urlencoded;

use crate::utils::error::Error;

/// Query builder for the Matomo reporting (analytics) HTTP API.
///
/// Parameters keep their insertion order; setting an existing key replaces
/// its value in place so the built query stays deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsQuery {
    parameters: Vec<(String, String)>,
    api_url: Option<String>,
}

impl AnalyticsQuery {
    pub fn new() -> Self {
        AnalyticsQuery {
            parameters: vec![(String::from("module"), String::from("API"))],
            api_url: None,
        }
    }

    /// Sets the reporting API URL, the root of the Matomo install.
    pub fn set_api_url<T: Into<String>>(&mut self, api_url: T) {
        self.api_url = Some(api_url.into());
    }

    /// Sets a query parameter, replacing an earlier value for the same key.
    pub fn set_parameter<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = value.into();
        if let Some(existing) = self.parameters.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            self.parameters.push((key, value));
        }
    }

    /// Returns the value of a query parameter, if set.
    pub fn get_parameter(&self, key: &str) -> Option<&str> {
        self.parameters.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Removes a query parameter.
    pub fn remove_parameter(&mut self, key: &str) {
        self.parameters.retain(|(k, _)| k != key);
    }

    /// Sets the API method to call, e.g. `VisitsSummary.get`.
    pub fn set_method<T: Into<String>>(&mut self, method: T) {
        self.set_parameter("method", method);
    }

    pub fn set_id_site(&mut self, id_site: u32) {
        self.set_parameter("idSite", id_site.to_string());
    }

    pub fn set_date<T: Into<String>>(&mut self, date: T) {
        self.set_parameter("date", date);
    }

    pub fn set_period<T: Into<String>>(&mut self, period: T) {
        self.set_parameter("period", period);
    }

    pub fn set_format<T: Into<String>>(&mut self, format: T) {
        self.set_parameter("format", format);
    }

    pub fn set_filter_limit(&mut self, filter_limit: u32) {
        self.set_parameter("filter_limit", filter_limit.to_string());
    }

    /// Sets the segment to request, see the Matomo segmentation docs.
    pub fn set_segment<T: Into<String>>(&mut self, segment: T) {
        self.set_parameter("segment", segment);
    }

    /// Returns the full request URL.
    ///
    /// Fails with [`Error::Configuration`] when the API URL was not set.
    pub fn query_url(&self) -> Result<String, Error> {
        let api_url = self
            .api_url
            .as_ref()
            .ok_or_else(|| Error::Configuration("API URL not set".to_string()))?;
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.parameters {
            serializer.append_pair(key, value);
        }
        Ok(format!("{}?{}", api_url, serializer.finish()))
    }
}

impl Default for AnalyticsQuery {
    fn default() -> Self {
        AnalyticsQuery::new()
    }
}
