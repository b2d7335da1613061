use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveTime, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha512};

use crate::http::http_client::HttpClient;
use crate::http::http_client_config::HttpClientConfig;
use crate::http::http_request::HttpRequest;
use crate::tracking::custom_variable::{CustomVariable, Scope, Value};
use crate::tracking::ecommerce::{EcommerceBlock, EcommerceItem, EcommerceTotals};
use crate::tracking::plugins::Plugin;
use crate::tracking::query::QueryParams;
use crate::tracking::response::TrackResponse;
use crate::tracking::tracker_config::TrackerConfig;
use crate::utils::error::Error;

/// Tracking API protocol version.
const API_VERSION: u32 = 1;

/// Length of a visitor ID.
const LENGTH_VISITOR_ID: usize = 16;

const VISITOR_ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Type of a tracked download or outlink action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    Download,
    Link,
}

impl ActionType {
    pub fn from_name(name: &str) -> Result<ActionType, Error> {
        match name {
            "download" => Ok(ActionType::Download),
            "link" => Ok(ActionType::Link),
            _ => Err(Error::InvalidParameter(format!("illegal action parameter {}", name))),
        }
    }

    pub fn query_key(self) -> &'static str {
        match self {
            ActionType::Download => "download",
            ActionType::Link => "link",
        }
    }
}

/// Campaign attribution carried over from an earlier visit.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributionInfo {
    pub campaign_name: String,
    pub campaign_keyword: String,
    pub referral_timestamp: DateTime<Utc>,
    pub referral_url: String,
}

#[derive(Debug, Clone, PartialEq)]
struct EventBlock {
    category: String,
    action: String,
    name: Option<String>,
    value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
struct SearchBlock {
    query: String,
    category: Option<String>,
    count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
struct ContentBlock {
    name: String,
    piece: Option<String>,
    target: Option<String>,
    interaction: Option<String>,
}

/// Accumulates per-visit and per-action tracking attributes, serializes them
/// into the flat parameter set the tracking endpoint expects and performs the
/// HTTP GET.
///
/// One tracker models one logical visitor session. It can be reused for
/// several tracking calls, mutating fields between calls; the random visitor
/// ID stays stable for the lifetime of the instance unless
/// [`set_new_visitor_id`](Tracker::set_new_visitor_id) is called, so repeated
/// calls correlate under one visitor. Visitor ID persistence across visits is
/// the caller's responsibility.
pub struct Tracker {
    config: TrackerConfig,
    client: HttpClient,
    site_id: u32,
    visitor_id: String,
    forced_visitor_id: Option<String>,
    user_id: Option<String>,
    page_url: Option<String>,
    referrer: Option<String>,
    action_name: Option<String>,
    ip: Option<String>,
    user_agent: Option<String>,
    accept_language: Option<String>,
    request_cookie: Option<String>,
    local_time: NaiveTime,
    send_image: Option<bool>,
    has_cookies: bool,
    resolution: Option<(u32, u32)>,
    visit_variables: BTreeMap<u32, CustomVariable>,
    page_variables: BTreeMap<u32, CustomVariable>,
    event_variables: BTreeMap<u32, CustomVariable>,
    dimensions: BTreeMap<u32, String>,
    plugins: BTreeMap<Plugin, u32>,
    attribution_info: Option<AttributionInfo>,
    ecommerce_items: Vec<EcommerceItem>,
    ecommerce: Option<EcommerceBlock>,
    goal: Option<(u32, Option<f64>)>,
    action: Option<(ActionType, String)>,
    event: Option<EventBlock>,
    search: Option<SearchBlock>,
    content: Option<ContentBlock>,
    debug_suffix: Option<String>,
    cache_buster: u32,
    rng: StdRng,
}

impl Tracker {
    /// Creates a tracker for the given site with an OS-seeded random source.
    pub fn new(site_id: u32, config: TrackerConfig) -> Self {
        Tracker::with_rng(site_id, config, StdRng::from_os_rng())
    }

    /// Creates a tracker with a caller-supplied random source.
    ///
    /// Lets tests run with a deterministic visitor ID and cache buster:
    ///
    /// Tracker::with_rng(1, TrackerConfig::new(), StdRng::seed_from_u64(42))
    pub fn with_rng(site_id: u32, config: TrackerConfig, mut rng: StdRng) -> Self {
        let visitor_id = Self::random_visitor_id(&mut rng);
        let cache_buster = rng.random_range(0..100_000);
        let client = HttpClient::new(HttpClientConfig::new().verify_tls(config.verify_tls));

        Tracker {
            config,
            client,
            site_id,
            visitor_id,
            forced_visitor_id: None,
            user_id: None,
            page_url: None,
            referrer: None,
            action_name: None,
            ip: None,
            user_agent: None,
            accept_language: None,
            request_cookie: None,
            local_time: Local::now().time(),
            send_image: None,
            has_cookies: false,
            resolution: None,
            visit_variables: BTreeMap::new(),
            page_variables: BTreeMap::new(),
            event_variables: BTreeMap::new(),
            dimensions: BTreeMap::new(),
            plugins: BTreeMap::new(),
            attribution_info: None,
            ecommerce_items: Vec::new(),
            ecommerce: None,
            goal: None,
            action: None,
            event: None,
            search: None,
            content: None,
            debug_suffix: None,
            cache_buster,
            rng,
        }
    }

    /// Sets the tracking endpoint URL. Required before any request can be sent.
    pub fn set_api_url<T: Into<String>>(&mut self, api_url: T) {
        self.config.api_url = Some(api_url.into());
    }

    /// Sets the auth token for the request. The token can be viewed in the
    /// user management section of the Matomo install.
    pub fn set_token_auth<T: Into<String>>(&mut self, token_auth: T) {
        self.config.token_auth = Some(token_auth.into());
    }

    /// Sets the URL being tracked.
    pub fn set_url<T: Into<String>>(&mut self, url: T) {
        self.page_url = Some(url.into());
    }

    /// Sets the referrer URL.
    pub fn set_url_referrer<T: Into<String>>(&mut self, referrer: T) {
        self.referrer = Some(referrer.into());
    }

    /// Sets the page title as it will appear in reports.
    pub fn set_action_name<T: Into<String>>(&mut self, action_name: T) {
        self.action_name = Some(action_name.into());
    }

    /// Sets a hierarchical page title, joined with `/`.
    pub fn set_page_titles(&mut self, titles: &[&str]) {
        self.action_name = Some(titles.join("/"));
    }

    /// Sets the visitor IP as seen by the server.
    ///
    /// The server only honors this when an auth token is also present, which
    /// is a server-side policy this client cannot enforce. The value is
    /// passed through unconditionally.
    pub fn set_ip<T: Into<String>>(&mut self, ip: T) {
        self.ip = Some(ip.into());
    }

    /// Sets the user agent forwarded with the request.
    pub fn set_user_agent<T: Into<String>>(&mut self, user_agent: T) {
        self.user_agent = Some(user_agent.into());
    }

    /// Sets the browser language, forwarded as the Accept-Language header.
    /// The endpoint uses it to guess the visitor's origin when GeoIP is not
    /// enabled.
    pub fn set_browser_language<T: Into<String>>(&mut self, language: T) {
        self.accept_language = Some(language.into());
    }

    /// Sets a cookie forwarded verbatim with the request.
    pub fn set_request_cookie<T: Into<String>>(&mut self, cookie: T) {
        self.request_cookie = Some(cookie.into());
    }

    /// Call this if the tracked browser supports cookies.
    pub fn set_browser_has_cookies(&mut self) {
        self.has_cookies = true;
    }

    /// Controls whether the endpoint should reply with a tracking gif or an
    /// empty 204 response.
    pub fn set_send_image(&mut self, send_image: bool) {
        self.send_image = Some(send_image);
    }

    /// Sets the visitor's screen resolution.
    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.resolution = Some((width, height));
    }

    /// Sets the local time serialized into the `h`/`m`/`s` fields.
    /// Defaults to the wall clock at construction.
    pub fn set_local_time(&mut self, time: NaiveTime) {
        self.local_time = time;
    }

    /// Overrides the visit date and time for the tracking request, in UTC.
    ///
    /// Requires setting the auth token for the server to honor it.
    pub fn set_force_visit_date_time(&mut self, datetime: DateTime<Utc>) {
        self.local_time = datetime.time();
    }

    /// Forces the visitor ID for this session.
    ///
    /// Fails with [`Error::InvalidParameter`] when the ID is not exactly
    /// 16 characters long.
    pub fn set_visitor_id<T: Into<String>>(&mut self, visitor_id: T) -> Result<(), Error> {
        let visitor_id = visitor_id.into();
        if visitor_id.chars().count() != LENGTH_VISITOR_ID {
            return Err(Error::InvalidParameter(format!(
                "set_visitor_id() expects a visitor ID of length {}",
                LENGTH_VISITOR_ID
            )));
        }
        self.forced_visitor_id = Some(visitor_id);
        Ok(())
    }

    /// Derives a forced visitor ID from an arbitrary input string via
    /// SHA-512, so opaque identifiers can be correlated without being leaked.
    pub fn set_visitor_id_hash(&mut self, input: &str) {
        self.forced_visitor_id = Some(Self::hash_id(input));
    }

    /// Regenerates the random visitor ID, starting a new synthetic visit.
    pub fn set_new_visitor_id(&mut self) {
        self.visitor_id = Self::random_visitor_id(&mut self.rng);
    }

    /// Returns the forced visitor ID if one was set, the random per-instance
    /// ID otherwise.
    pub fn get_visitor_id(&self) -> &str {
        self.forced_visitor_id.as_deref().unwrap_or(&self.visitor_id)
    }

    /// Sets the ID of the authenticated end user, distinct from the visitor ID.
    pub fn set_user_id<T: Into<String>>(&mut self, user_id: T) {
        self.user_id = Some(user_id.into());
    }

    /// Derives the user ID from an arbitrary input string via SHA-512.
    pub fn set_user_id_hash(&mut self, input: &str) {
        self.user_id = Some(Self::hash_id(input));
    }

    /// Sets a custom variable in slot 1-5 of the given scope
    /// (`visit`, `page` or `event`).
    pub fn set_custom_variable<T: Into<Value>>(&mut self, slot_id: u32, name: &str, value: T, scope: &str) -> Result<(), Error> {
        if !(1..=5).contains(&slot_id) {
            return Err(Error::InvalidParameter(format!(
                "custom variable slot ID must be 1-5, {} given",
                slot_id
            )));
        }
        let scope = Scope::from_name(scope)?;
        self.variables_mut(scope).insert(slot_id, CustomVariable::new(name, value));
        Ok(())
    }

    /// Returns the custom variable stored in the given slot and scope.
    pub fn get_custom_variable(&self, slot_id: u32, scope: &str) -> Result<Option<&CustomVariable>, Error> {
        let scope = Scope::from_name(scope)?;
        Ok(self.variables(scope).get(&slot_id))
    }

    /// Sets a custom dimension by index, serialized as `dimension{index}`.
    pub fn set_dimension<T: Into<String>>(&mut self, index: u32, value: T) {
        self.dimensions.insert(index, value.into());
    }

    /// Sets the plugins supported by the visitor's browser, as
    /// (plugin name, version) pairs.
    ///
    /// Fails with [`Error::Configuration`] when any name is not a recognized
    /// plugin; no partial state is retained in that case.
    pub fn set_plugins<'a, I>(&mut self, plugins: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (&'a str, u32)>,
    {
        let mut validated = Vec::new();
        for (name, version) in plugins {
            validated.push((Plugin::from_name(name)?, version));
        }
        self.plugins.extend(validated);
        Ok(())
    }

    /// Sets the attribution info for the visit, so that subsequent goal
    /// conversions are attributed to the right referrer, timestamp, campaign
    /// name and keyword.
    pub fn set_attribution_info(&mut self, info: AttributionInfo) {
        self.attribution_info = Some(info);
    }

    /// Marks the request as a download or outlink action
    /// (`action_type` is `"download"` or `"link"`).
    pub fn set_track_action(&mut self, action_url: &str, action_type: &str) -> Result<(), Error> {
        let action_type = ActionType::from_name(action_type)?;
        self.action = Some((action_type, action_url.to_string()));
        Ok(())
    }

    /// Marks the request as a goal conversion.
    ///
    /// An ecommerce order or cart update set on the same tracker takes
    /// precedence, as both serialize through the `idgoal` key.
    pub fn set_track_goal(&mut self, goal_id: u32, revenue: Option<f64>) {
        self.goal = Some((goal_id, revenue));
    }

    /// Marks the request as an event. Category and action must not be empty.
    pub fn set_track_event(&mut self, category: &str, action: &str, name: Option<&str>, value: Option<f64>) -> Result<(), Error> {
        if category.is_empty() {
            return Err(Error::InvalidParameter("event category must not be empty".to_string()));
        }
        if action.is_empty() {
            return Err(Error::InvalidParameter("event action must not be empty".to_string()));
        }
        self.event = Some(EventBlock {
            category: category.to_string(),
            action: action.to_string(),
            name: name.map(str::to_string),
            value,
        });
        Ok(())
    }

    /// Marks the request as a site search.
    ///
    /// A count of 0 files the query under "No Result Search Keyword".
    pub fn set_track_search(&mut self, query: &str, category: Option<&str>, count: Option<u64>) -> Result<(), Error> {
        if query.is_empty() {
            return Err(Error::InvalidParameter("search query must not be empty".to_string()));
        }
        self.search = Some(SearchBlock {
            query: query.to_string(),
            category: category.map(str::to_string),
            count,
        });
        Ok(())
    }

    /// Marks the request as a content impression or interaction.
    /// The content name must not be empty.
    pub fn set_track_content(
        &mut self,
        name: &str,
        piece: Option<&str>,
        target: Option<&str>,
        interaction: Option<&str>,
    ) -> Result<(), Error> {
        if name.is_empty() {
            return Err(Error::InvalidParameter("content name must not be empty".to_string()));
        }
        self.content = Some(ContentBlock {
            name: name.to_string(),
            piece: piece.map(str::to_string),
            target: target.map(str::to_string),
            interaction: interaction.map(str::to_string),
        });
        Ok(())
    }

    /// Adds an item to the pending ecommerce order or cart.
    ///
    /// Items are keyed by SKU: re-adding a SKU replaces the earlier entry in
    /// place. The item list is cleared after an order or cart update has been
    /// tracked.
    pub fn add_ecommerce_item(&mut self, item: EcommerceItem) {
        if let Some(existing) = self.ecommerce_items.iter_mut().find(|existing| existing.sku == item.sku) {
            *existing = item;
        } else {
            self.ecommerce_items.push(item);
        }
    }

    /// Marks the request as an ecommerce order with the given unique order ID,
    /// used by the server to avoid re-recording an order on page reload.
    pub fn set_ecommerce_order<T: Into<String>>(&mut self, order_id: T, totals: EcommerceTotals) -> Result<(), Error> {
        let order_id = order_id.into();
        if order_id.is_empty() {
            return Err(Error::InvalidParameter("ecommerce order requires an order ID".to_string()));
        }
        self.ecommerce = Some(EcommerceBlock::Order { order_id, totals });
        Ok(())
    }

    /// Marks the request as a cart update. All items currently in the cart
    /// must have been re-added via [`add_ecommerce_item`](Tracker::add_ecommerce_item).
    pub fn set_ecommerce_cart_update(&mut self, grand_total: f64) {
        self.ecommerce = Some(EcommerceBlock::CartUpdate { grand_total });
    }

    /// Tags the current page view as a product or category page view, through
    /// page scope custom variables.
    pub fn set_ecommerce_view(&mut self, sku: Option<&str>, name: Option<&str>, category: Option<&[&str]>, price: Option<f64>) {
        let category = match category {
            Some(category) => serde_json::to_string(category).expect("category list serializes to JSON"),
            None => String::new(),
        };
        self.page_variables.insert(5, CustomVariable::new("_pkc", category));
        if let Some(price) = price {
            self.page_variables.insert(2, CustomVariable::new("_pkp", price));
        }
        // On a category page do not record "Product name not defined".
        if let (Some(sku), Some(name)) = (sku, name) {
            self.page_variables.insert(3, CustomVariable::new("_pks", sku));
            self.page_variables.insert(4, CustomVariable::new("_pkn", name));
        }
    }

    /// Appends a raw string verbatim to the built query, without escaping.
    /// An escape hatch for marking test requests, not validated.
    pub fn set_debug_string_append<T: Into<String>>(&mut self, suffix: T) {
        self.debug_suffix = Some(suffix.into());
    }

    /// Serializes the accumulated state into the flat parameter set the
    /// tracking endpoint expects.
    ///
    /// The result is deterministic: keys appear in a fixed documented order
    /// and repeated calls without intervening setters yield an identical set.
    /// The cache buster is only regenerated by the `do_track_*` and
    /// [`execute`](Tracker::execute) calls.
    pub fn build_query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        query.push("idsite", self.site_id.to_string());
        query.push("rec", "1");
        query.push("apiv", API_VERSION.to_string());
        query.push("rand", self.cache_buster.to_string());
        if let Some(url) = &self.page_url {
            query.push("url", url);
        }
        if let Some(referrer) = &self.referrer {
            query.push("urlref", referrer);
        }
        if let Some(action_name) = &self.action_name {
            query.push("action_name", action_name);
        }
        query.push("id", &self.visitor_id);
        if let Some(forced) = &self.forced_visitor_id {
            query.push("cid", forced);
        }
        if let Some(user_id) = &self.user_id {
            query.push("uid", user_id);
        }
        query.push("h", self.local_time.hour().to_string());
        query.push("m", self.local_time.minute().to_string());
        query.push("s", self.local_time.second().to_string());
        if let Some(ip) = &self.ip {
            query.push("cip", ip);
        }
        if let Some(token_auth) = &self.config.token_auth {
            query.push("token_auth", token_auth);
        }
        if self.has_cookies {
            query.push("cookie", "1");
        }
        if let Some(send_image) = self.send_image {
            query.push("send_image", if send_image { "1" } else { "0" });
        }
        if let Some((width, height)) = self.resolution {
            query.push("res", format!("{}x{}", width, height));
        }
        for scope in [Scope::Page, Scope::Visit, Scope::Event] {
            let variables = self.variables(scope);
            if !variables.is_empty() {
                query.push(scope.query_key(), Self::encode_variables(variables));
            }
        }
        for (index, value) in &self.dimensions {
            query.push(format!("dimension{}", index), value);
        }
        for (plugin, version) in &self.plugins {
            query.push(plugin.short_code(), version.to_string());
        }
        if let Some(info) = &self.attribution_info {
            query.push("_rcn", &info.campaign_name);
            query.push("_rck", &info.campaign_keyword);
            query.push("_refts", info.referral_timestamp.timestamp().to_string());
            query.push("_ref", &info.referral_url);
        }
        if let Some((action_type, action_url)) = &self.action {
            query.push(action_type.query_key(), action_url);
        }
        match &self.ecommerce {
            Some(EcommerceBlock::Order { order_id, totals }) => {
                query.push("idgoal", "0");
                query.push("ec_id", order_id);
                query.push("revenue", totals.grand_total.to_string());
                if let Some(sub_total) = totals.sub_total {
                    query.push("ec_st", sub_total.to_string());
                }
                if let Some(tax) = totals.tax {
                    query.push("ec_tx", tax.to_string());
                }
                if let Some(shipping) = totals.shipping {
                    query.push("ec_sh", shipping.to_string());
                }
                if let Some(discount) = totals.discount {
                    query.push("ec_dt", discount.to_string());
                }
                self.push_ecommerce_items(&mut query);
            }
            Some(EcommerceBlock::CartUpdate { grand_total }) => {
                query.push("idgoal", "0");
                query.push("revenue", grand_total.to_string());
                self.push_ecommerce_items(&mut query);
            }
            None => {
                if let Some((goal_id, revenue)) = self.goal {
                    query.push("idgoal", goal_id.to_string());
                    if let Some(revenue) = revenue {
                        query.push("revenue", revenue.to_string());
                    }
                }
            }
        }
        if let Some(event) = &self.event {
            query.push("e_c", &event.category);
            query.push("e_a", &event.action);
            if let Some(name) = &event.name {
                query.push("e_n", name);
            }
            if let Some(value) = event.value {
                query.push("e_v", value.to_string());
            }
        }
        if let Some(search) = &self.search {
            query.push("search", &search.query);
            if let Some(category) = &search.category {
                query.push("search_cat", category);
            }
            if let Some(count) = search.count {
                query.push("search_count", count.to_string());
            }
        }
        if let Some(content) = &self.content {
            query.push("c_n", &content.name);
            if let Some(piece) = &content.piece {
                query.push("c_p", piece);
            }
            if let Some(target) = &content.target {
                query.push("c_t", target);
            }
            if let Some(interaction) = &content.interaction {
                query.push("c_i", interaction);
            }
        }
        if let Some(suffix) = &self.debug_suffix {
            query.set_suffix(suffix);
        }
        query
    }

    /// Issues the tracking request with the currently accumulated state.
    ///
    /// Fails with [`Error::Configuration`] when no endpoint URL is
    /// configured. Transport and timeout failures are reported through the
    /// returned [`TrackResponse`], never as errors.
    pub async fn execute(&mut self) -> Result<TrackResponse, Error> {
        let api_url = self
            .config
            .api_url
            .clone()
            .ok_or_else(|| Error::Configuration("API URL not set".to_string()))?;
        self.cache_buster = self.rng.random_range(0..100_000);

        let query = self.build_query();
        let url = format!("{}?{}", api_url, query.encode());

        let mut request = HttpRequest::get();
        if let Some(user_agent) = &self.user_agent {
            request = request.header("User-Agent", user_agent.as_str());
        }
        if let Some(language) = &self.accept_language {
            request = request.header("Accept-Language", language.as_str());
        }
        if let Some(cookie) = &self.request_cookie {
            request = request.header("Cookie", cookie.as_str());
        }

        let response = match tokio::time::timeout(self.config.timeout, self.client.send(&url, request)).await {
            Ok(Ok(response)) => TrackResponse::from_http(response),
            Ok(Err(error)) => {
                tracing::warn!(url = %api_url, "tracking request failed: {:?}", error);
                TrackResponse::failed()
            }
            Err(_) => {
                tracing::warn!(url = %api_url, timeout = ?self.config.timeout, "tracking request timed out");
                TrackResponse::timed_out()
            }
        };
        Ok(response)
    }

    /// Tracks a page view under the given document title.
    pub async fn do_track_page_view(&mut self, document_title: &str) -> Result<TrackResponse, Error> {
        if !document_title.is_empty() {
            self.action_name = Some(document_title.to_string());
        }
        self.execute().await
    }

    /// Tracks a download or outlink
    /// (`action_type` is `"download"` or `"link"`).
    pub async fn do_track_action(&mut self, action_url: &str, action_type: &str) -> Result<TrackResponse, Error> {
        self.set_track_action(action_url, action_type)?;
        let response = self.execute().await;
        self.action = None;
        response
    }

    /// Tracks an event.
    pub async fn do_track_event(&mut self, category: &str, action: &str, name: Option<&str>, value: Option<f64>) -> Result<TrackResponse, Error> {
        self.set_track_event(category, action, name, value)?;
        let response = self.execute().await;
        self.event = None;
        response
    }

    /// Tracks a site search query.
    pub async fn do_track_site_search(&mut self, query: &str, category: Option<&str>, count: Option<u64>) -> Result<TrackResponse, Error> {
        self.set_track_search(query, category, count)?;
        let response = self.execute().await;
        self.search = None;
        response
    }

    /// Tracks a content impression, or an interaction when one is given.
    pub async fn do_track_content(
        &mut self,
        name: &str,
        piece: Option<&str>,
        target: Option<&str>,
        interaction: Option<&str>,
    ) -> Result<TrackResponse, Error> {
        self.set_track_content(name, piece, target, interaction)?;
        let response = self.execute().await;
        self.content = None;
        response
    }

    /// Records a goal conversion.
    pub async fn do_track_goal(&mut self, goal_id: u32, revenue: Option<f64>) -> Result<TrackResponse, Error> {
        self.set_track_goal(goal_id, revenue);
        let response = self.execute().await;
        self.goal = None;
        response
    }

    /// Tracks an ecommerce order. Items must have been added via
    /// [`add_ecommerce_item`](Tracker::add_ecommerce_item) first; the item
    /// list is cleared afterwards.
    pub async fn do_track_ecommerce_order<T: Into<String>>(&mut self, order_id: T, totals: EcommerceTotals) -> Result<TrackResponse, Error> {
        self.set_ecommerce_order(order_id, totals)?;
        let response = self.execute().await;
        self.ecommerce = None;
        self.ecommerce_items.clear();
        response
    }

    /// Tracks a cart update. On every update all items in the cart must be
    /// re-added first, including items from the previous cart; the item list
    /// is cleared afterwards.
    pub async fn do_track_ecommerce_cart_update(&mut self, grand_total: f64) -> Result<TrackResponse, Error> {
        self.set_ecommerce_cart_update(grand_total);
        let response = self.execute().await;
        self.ecommerce = None;
        self.ecommerce_items.clear();
        response
    }

    fn variables(&self, scope: Scope) -> &BTreeMap<u32, CustomVariable> {
        match scope {
            Scope::Visit => &self.visit_variables,
            Scope::Page => &self.page_variables,
            Scope::Event => &self.event_variables,
        }
    }

    fn variables_mut(&mut self, scope: Scope) -> &mut BTreeMap<u32, CustomVariable> {
        match scope {
            Scope::Visit => &mut self.visit_variables,
            Scope::Page => &mut self.page_variables,
            Scope::Event => &mut self.event_variables,
        }
    }

    fn push_ecommerce_items(&self, query: &mut QueryParams) {
        if !self.ecommerce_items.is_empty() {
            let items = serde_json::to_string(&self.ecommerce_items).expect("ecommerce items serialize to JSON");
            query.push("ec_items", items);
        }
    }

    // JSON object mapping slot ID to [name, value].
    fn encode_variables(variables: &BTreeMap<u32, CustomVariable>) -> String {
        let map: BTreeMap<String, &CustomVariable> = variables
            .iter()
            .map(|(slot_id, variable)| (slot_id.to_string(), variable))
            .collect();
        serde_json::to_string(&map).expect("custom variables serialize to JSON")
    }

    fn random_visitor_id(rng: &mut StdRng) -> String {
        (0..LENGTH_VISITOR_ID)
            .map(|_| VISITOR_ID_CHARSET[rng.random_range(0..VISITOR_ID_CHARSET.len())] as char)
            .collect()
    }

    fn hash_id(input: &str) -> String {
        let digest = Sha512::digest(input.as_bytes());
        hex::encode(digest)[..LENGTH_VISITOR_ID].to_string()
    }
}
