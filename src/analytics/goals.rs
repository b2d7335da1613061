use crate::analytics::analytics_query::AnalyticsQuery;

/// Page attribute a goal is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchAttribute {
    Url,
    Title,
    File,
    ExternalWebsite,
    Manually,
}

impl MatchAttribute {
    pub fn name(&self) -> &'static str {
        match self {
            MatchAttribute::Url => "url",
            MatchAttribute::Title => "title",
            MatchAttribute::File => "file",
            MatchAttribute::ExternalWebsite => "external_website",
            MatchAttribute::Manually => "manually",
        }
    }
}

/// How a goal pattern is compared to the matched attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternType {
    Regex,
    Contains,
    Exact,
}

impl PatternType {
    pub fn name(&self) -> &'static str {
        match self {
            PatternType::Regex => "regex",
            PatternType::Contains => "contains",
            PatternType::Exact => "exact",
        }
    }
}

/// Query builder for the reporting API `Goals` plugin.
///
/// Builds [`AnalyticsQuery`] values for goal management; send them with
/// [`AnalyticsClient`](crate::analytics::analytics_client::AnalyticsClient).
pub struct Goals {
    api_url: String,
}

impl Goals {
    pub fn new<T: Into<String>>(api_url: T) -> Self {
        Goals { api_url: api_url.into() }
    }

    fn query(&self, method: &str, id_site: u32) -> AnalyticsQuery {
        let mut query = AnalyticsQuery::new();
        query.set_api_url(self.api_url.as_str());
        query.set_method(method);
        query.set_id_site(id_site);
        query
    }

    /// Builds a `Goals.addGoal` query creating a goal on the given site.
    ///
    /// The response body carries the ID of the new goal.
    pub fn add_goal<N, P, A>(
        &self,
        id_site: u32,
        name: N,
        match_attribute: MatchAttribute,
        pattern: P,
        pattern_type: PatternType,
        token_auth: A,
    ) -> AnalyticsQuery
    where
        N: Into<String>,
        P: Into<String>,
        A: Into<String>,
    {
        let mut query = self.query("Goals.addGoal", id_site);
        query.set_parameter("name", name);
        query.set_parameter("matchAttribute", match_attribute.name());
        query.set_parameter("pattern", pattern);
        query.set_parameter("patternType", pattern_type.name());
        query.set_parameter("token_auth", token_auth);
        query
    }

    /// Builds a `Goals.deleteGoal` query removing a goal from the given site.
    pub fn delete_goal(&self, id_site: u32, id_goal: u32) -> AnalyticsQuery {
        let mut query = self.query("Goals.deleteGoal", id_site);
        query.set_parameter("idGoal", id_goal.to_string());
        query
    }
}
