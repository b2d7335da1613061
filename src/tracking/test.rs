use std::time::Duration;

use chrono::NaiveTime;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::tracking::custom_variable::Value;
use crate::tracking::ecommerce::{EcommerceItem, EcommerceTotals};
use crate::tracking::tracker::{AttributionInfo, Tracker};
use crate::tracking::tracker_config::TrackerConfig;
use crate::utils::error::Error;

fn tracker() -> Tracker {
    Tracker::with_rng(1, TrackerConfig::new(), StdRng::seed_from_u64(42))
}

/// Accepts a single connection, replies with the given status line and hands
/// back the raw request head for assertions.
async fn serve_once(listener: TcpListener, status_line: &'static str) -> tokio::sync::oneshot::Receiver<String> {
    let (sender, receiver) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut buffer = [0u8; 1024];
        loop {
            let bytes = stream.read(&mut buffer).await.unwrap();
            head.extend_from_slice(&buffer[..bytes]);
            if bytes == 0 || head.windows(4).any(|window| window == b"\r\n\r\n") {
                break;
            }
        }
        let response = format!("HTTP/1.1 {}\r\ncontent-length: 0\r\n\r\n", status_line);
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.flush().await.unwrap();
        sender.send(String::from_utf8_lossy(&head).to_string()).unwrap();
    });
    receiver
}

fn query_of(head: &str) -> Vec<(String, String)> {
    let request_line = head.lines().next().unwrap();
    let target = request_line.split_whitespace().nth(1).unwrap();
    let query = target.split_once('?').unwrap().1;
    url::form_urlencoded::parse(query.as_bytes()).into_owned().collect()
}

#[test]
fn visitor_id_must_be_sixteen_characters() {
    let mut tracker = tracker();
    assert!(matches!(tracker.set_visitor_id("short"), Err(Error::InvalidParameter(_))));
    assert!(matches!(tracker.set_visitor_id("12345678901234567"), Err(Error::InvalidParameter(_))));

    tracker.set_visitor_id("ABCDEF1234567890").unwrap();
    assert_eq!(tracker.get_visitor_id(), "ABCDEF1234567890");
}

#[test]
fn random_visitor_id_is_stable_and_well_formed() {
    let tracker = tracker();
    let visitor_id = tracker.get_visitor_id().to_string();
    assert_eq!(visitor_id.len(), 16);
    assert!(visitor_id.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));

    // Same seed, same identity.
    let other = Tracker::with_rng(1, TrackerConfig::new(), StdRng::seed_from_u64(42));
    assert_eq!(other.get_visitor_id(), visitor_id);

    // Identity is stable across builds until explicitly regenerated.
    let mut tracker = tracker;
    assert_eq!(tracker.build_query().get("id"), Some(visitor_id.as_str()));
    tracker.set_new_visitor_id();
    assert_ne!(tracker.get_visitor_id(), visitor_id);
    assert_eq!(tracker.get_visitor_id().len(), 16);
}

#[test]
fn visitor_and_user_id_hashing() {
    let mut tracker = tracker();
    tracker.set_visitor_id_hash("account-42");
    assert_eq!(tracker.get_visitor_id().len(), 16);

    let mut other = self::tracker();
    other.set_visitor_id_hash("account-42");
    assert_eq!(other.get_visitor_id(), tracker.get_visitor_id());

    tracker.set_user_id_hash("account-42");
    let query = tracker.build_query();
    assert_eq!(query.get("uid").unwrap().len(), 16);
    assert_eq!(query.get("uid"), Some(tracker.get_visitor_id()));
}

#[test]
fn custom_variable_scope_is_validated() {
    let mut tracker = tracker();
    let result = tracker.set_custom_variable(1, "key", "value", "session");
    assert!(matches!(result, Err(Error::InvalidParameter(_))));

    for scope in ["visit", "page", "event"] {
        tracker.set_custom_variable(1, "key", "value", scope).unwrap();
        let variable = tracker.get_custom_variable(1, scope).unwrap().unwrap();
        assert_eq!(variable.name(), "key");
        assert_eq!(variable.value(), &Value::Text(String::from("value")));
    }
}

#[test]
fn custom_variable_slot_is_validated() {
    let mut tracker = tracker();
    assert!(matches!(tracker.set_custom_variable(0, "key", "value", "visit"), Err(Error::InvalidParameter(_))));
    assert!(matches!(tracker.set_custom_variable(6, "key", "value", "visit"), Err(Error::InvalidParameter(_))));
}

#[test]
fn custom_variables_serialize_per_scope() {
    let mut tracker = tracker();
    tracker.set_custom_variable(1, "page_key", "page_value", "page").unwrap();
    tracker.set_custom_variable(2, "visit_key", "visit_value", "visit").unwrap();
    tracker.set_custom_variable(3, "event_key", true, "event").unwrap();

    let query = tracker.build_query();
    assert_eq!(query.get("cvar"), Some(r#"{"1":["page_key","page_value"]}"#));
    assert_eq!(query.get("_cvar"), Some(r#"{"2":["visit_key","visit_value"]}"#));
    assert_eq!(query.get("e_cvar"), Some(r#"{"3":["event_key",true]}"#));
}

#[test]
fn unknown_plugin_is_rejected_without_partial_state() {
    let mut tracker = tracker();
    let result = tracker.set_plugins([("flash", 6), ("shockwave", 1)]);
    assert!(matches!(result, Err(Error::Configuration(_))));

    let query = tracker.build_query();
    assert_eq!(query.get("fla"), None);
}

#[test]
fn known_plugins_serialize_under_short_codes() {
    let mut tracker = tracker();
    tracker.set_plugins([("flash", 6), ("silverlight", 5), ("quick_time", 2)]).unwrap();

    let query = tracker.build_query();
    assert_eq!(query.get("fla"), Some("6"));
    assert_eq!(query.get("ag"), Some("5"));
    assert_eq!(query.get("qt"), Some("2"));
}

#[test]
fn resolution_round_trip() {
    let mut tracker = tracker();
    tracker.set_resolution(5760, 1080);
    assert_eq!(tracker.build_query().get("res"), Some("5760x1080"));
}

#[test]
fn ecommerce_items_round_trip() {
    let mut tracker = tracker();
    tracker.add_ecommerce_item(
        EcommerceItem::new("1", "Book", vec![String::from("c"), String::from("books")], 9.99, 5).unwrap(),
    );
    tracker.add_ecommerce_item(
        EcommerceItem::new("2", "Car", vec![String::from("c"), String::from("cars")], 5.25, 3).unwrap(),
    );
    tracker.set_ecommerce_order("A-1000", EcommerceTotals::new(55.2).sub_total(45.95).tax(5.45).shipping(4.56).discount(0.76)).unwrap();

    let query = tracker.build_query();
    assert_eq!(query.get("idgoal"), Some("0"));
    assert_eq!(query.get("ec_id"), Some("A-1000"));
    assert_eq!(query.get("revenue"), Some("55.2"));
    assert_eq!(query.get("ec_st"), Some("45.95"));
    assert_eq!(query.get("ec_tx"), Some("5.45"));
    assert_eq!(query.get("ec_sh"), Some("4.56"));
    assert_eq!(query.get("ec_dt"), Some("0.76"));

    let items: serde_json::Value = serde_json::from_str(query.get("ec_items").unwrap()).unwrap();
    let expected = serde_json::json!([
        ["1", "Book", ["c", "books"], 9.99, 5],
        ["2", "Car", ["c", "cars"], 5.25, 3],
    ]);
    assert_eq!(items, expected);
}

#[test]
fn ecommerce_item_replaces_existing_sku() {
    let mut tracker = tracker();
    tracker.add_ecommerce_item(EcommerceItem::new("1", "Book", vec![String::from("books")], 9.99, 5).unwrap());
    tracker.add_ecommerce_item(EcommerceItem::new("1", "Book 2nd edition", vec![String::from("books")], 19.99, 1).unwrap());
    tracker.set_ecommerce_cart_update(19.99);

    let items: serde_json::Value = serde_json::from_str(tracker.build_query().get("ec_items").unwrap()).unwrap();
    assert_eq!(items, serde_json::json!([["1", "Book 2nd edition", ["books"], 19.99, 1]]));
}

#[test]
fn ecommerce_item_requires_all_fields() {
    assert!(matches!(EcommerceItem::new("", "Book", vec![String::from("books")], 9.99, 1), Err(Error::InvalidParameter(_))));
    assert!(matches!(EcommerceItem::new("1", "", vec![String::from("books")], 9.99, 1), Err(Error::InvalidParameter(_))));
    assert!(matches!(EcommerceItem::new("1", "Book", vec![], 9.99, 1), Err(Error::InvalidParameter(_))));
    assert!(matches!(EcommerceItem::new("1", "Book", vec![String::from("books")], -1.0, 1), Err(Error::InvalidParameter(_))));
    assert!(matches!(EcommerceItem::new("1", "Book", vec![String::from("books")], 9.99, 0), Err(Error::InvalidParameter(_))));
}

#[test]
fn ecommerce_view_sets_page_variables() {
    let mut tracker = tracker();
    tracker.set_ecommerce_view(Some("1"), Some("Book"), Some(&["c", "books"]), Some(9.99));

    assert_eq!(tracker.get_custom_variable(3, "page").unwrap().unwrap().name(), "_pks");
    assert_eq!(tracker.get_custom_variable(4, "page").unwrap().unwrap().name(), "_pkn");
    assert_eq!(tracker.get_custom_variable(5, "page").unwrap().unwrap().value(), &Value::Text(String::from(r#"["c","books"]"#)));
    assert_eq!(tracker.get_custom_variable(2, "page").unwrap().unwrap().value(), &Value::Number(9.99));
}

#[test]
fn action_type_is_validated() {
    let mut tracker = tracker();
    let result = tracker.set_track_action("http://example.org/file.zip", "upload");
    assert!(matches!(result, Err(Error::InvalidParameter(_))));

    tracker.set_track_action("http://example.org/file.zip", "download").unwrap();
    assert_eq!(tracker.build_query().get("download"), Some("http://example.org/file.zip"));

    tracker.set_track_action("http://example.org/", "link").unwrap();
    let query = tracker.build_query();
    assert_eq!(query.get("link"), Some("http://example.org/"));
    assert_eq!(query.get("download"), None);
}

#[test]
fn build_query_is_idempotent() {
    let mut tracker = tracker();
    tracker.set_url("http://site.example/page");
    tracker.set_resolution(1920, 1080);
    tracker.set_custom_variable(1, "key", "value", "visit").unwrap();

    let first = tracker.build_query();
    let second = tracker.build_query();
    assert_eq!(first, second);
    assert_eq!(first.encode(), second.encode());
}

#[test]
fn mandatory_fields_are_present() {
    let mut tracker = tracker();
    tracker.set_url("http://site.example/page");
    tracker.set_local_time(NaiveTime::from_hms_opt(12, 34, 56).unwrap());

    let query = tracker.build_query();
    assert_eq!(query.get("idsite"), Some("1"));
    assert_eq!(query.get("rec"), Some("1"));
    assert_eq!(query.get("apiv"), Some("1"));
    assert!(query.get("rand").is_some());
    assert_eq!(query.get("url"), Some("http://site.example/page"));
    assert_eq!(query.get("h"), Some("12"));
    assert_eq!(query.get("m"), Some("34"));
    assert_eq!(query.get("s"), Some("56"));
}

#[test]
fn attribution_info_serializes_discrete_keys() {
    let mut tracker = tracker();
    tracker.set_attribution_info(AttributionInfo {
        campaign_name: String::from("CAMPAIGN NAME"),
        campaign_keyword: String::from("CAMPAIGN KEYWORD"),
        referral_timestamp: chrono::DateTime::from_timestamp(1_368_906_243, 0).unwrap(),
        referral_url: String::from("http://referrer.example/page"),
    });

    let query = tracker.build_query();
    assert_eq!(query.get("_rcn"), Some("CAMPAIGN NAME"));
    assert_eq!(query.get("_rck"), Some("CAMPAIGN KEYWORD"));
    assert_eq!(query.get("_refts"), Some("1368906243"));
    assert_eq!(query.get("_ref"), Some("http://referrer.example/page"));
}

#[test]
fn goal_serializes_id_and_revenue() {
    let mut tracker = tracker();
    tracker.set_track_goal(3, Some(42.5));

    let query = tracker.build_query();
    assert_eq!(query.get("idgoal"), Some("3"));
    assert_eq!(query.get("revenue"), Some("42.5"));
}

#[test]
fn event_block_is_validated_and_serialized() {
    let mut tracker = tracker();
    assert!(matches!(tracker.set_track_event("", "Play", None, None), Err(Error::InvalidParameter(_))));
    assert!(matches!(tracker.set_track_event("Videos", "", None, None), Err(Error::InvalidParameter(_))));

    tracker.set_track_event("Videos", "Play", Some("Trailer"), Some(1.5)).unwrap();
    let query = tracker.build_query();
    assert_eq!(query.get("e_c"), Some("Videos"));
    assert_eq!(query.get("e_a"), Some("Play"));
    assert_eq!(query.get("e_n"), Some("Trailer"));
    assert_eq!(query.get("e_v"), Some("1.5"));
}

#[test]
fn site_search_serializes_count_zero() {
    let mut tracker = tracker();
    assert!(matches!(tracker.set_track_search("", None, None), Err(Error::InvalidParameter(_))));

    tracker.set_track_search("rust tracking", Some("docs"), Some(0)).unwrap();
    let query = tracker.build_query();
    assert_eq!(query.get("search"), Some("rust tracking"));
    assert_eq!(query.get("search_cat"), Some("docs"));
    assert_eq!(query.get("search_count"), Some("0"));
}

#[test]
fn content_block_serializes_discrete_keys() {
    let mut tracker = tracker();
    assert!(matches!(tracker.set_track_content("", None, None, None), Err(Error::InvalidParameter(_))));

    tracker.set_track_content("Ad Foo Bar", Some("/path/ad.jpg"), Some("http://landing.example"), Some("click")).unwrap();
    let query = tracker.build_query();
    assert_eq!(query.get("c_n"), Some("Ad Foo Bar"));
    assert_eq!(query.get("c_p"), Some("/path/ad.jpg"));
    assert_eq!(query.get("c_t"), Some("http://landing.example"));
    assert_eq!(query.get("c_i"), Some("click"));
}

#[test]
fn dimensions_serialize_by_index() {
    let mut tracker = tracker();
    tracker.set_dimension(1, "beta");
    tracker.set_dimension(4, "dark mode");

    let query = tracker.build_query();
    assert_eq!(query.get("dimension1"), Some("beta"));
    assert_eq!(query.get("dimension4"), Some("dark mode"));
}

#[test]
fn debug_suffix_is_appended_verbatim() {
    let mut tracker = tracker();
    tracker.set_debug_string_append("&debug=1");

    let encoded = tracker.build_query().encode();
    assert!(encoded.ends_with("&debug=1"));
}

#[test]
fn browser_state_fields_serialize() {
    let mut tracker = tracker();
    tracker.set_browser_has_cookies();
    tracker.set_send_image(false);
    tracker.set_ip("192.0.2.10");
    tracker.set_token_auth("secret-token");
    tracker.set_user_id("user-7");
    tracker.set_page_titles(&["Shop", "Books", "Rust"]);

    let query = tracker.build_query();
    assert_eq!(query.get("cookie"), Some("1"));
    assert_eq!(query.get("send_image"), Some("0"));
    assert_eq!(query.get("cip"), Some("192.0.2.10"));
    assert_eq!(query.get("token_auth"), Some("secret-token"));
    assert_eq!(query.get("uid"), Some("user-7"));
    assert_eq!(query.get("action_name"), Some("Shop/Books/Rust"));
}

#[tokio::test]
async fn execute_without_api_url_is_a_configuration_error() {
    let mut tracker = tracker();
    let result = tracker.execute().await;
    assert!(matches!(result, Err(Error::Configuration(_))));
}

#[tokio::test]
async fn page_view_end_to_end() {
    let _ = tracing_subscriber::fmt().try_init();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let head = serve_once(listener, "200 OK").await;

    let config = TrackerConfig::new().api_url(format!("http://{}/track", address));
    let mut tracker = Tracker::new(1, config);
    tracker.set_url("http://site.example/page");
    tracker.set_user_agent("matomo-tracking-test");

    let response = tracker.do_track_page_view("Home").await.unwrap();
    assert!(response.ok);
    assert!(!response.error);
    assert_eq!(response.status, Some(200));

    let head = head.await.unwrap();
    assert!(head.starts_with("GET /track?"));
    let params = query_of(&head);
    assert!(params.contains(&(String::from("idsite"), String::from("1"))));
    assert!(params.contains(&(String::from("rec"), String::from("1"))));
    assert!(params.contains(&(String::from("url"), String::from("http://site.example/page"))));
    assert!(params.contains(&(String::from("action_name"), String::from("Home"))));
}

#[tokio::test]
async fn ecommerce_order_end_to_end_clears_items() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let head = serve_once(listener, "204 No Content").await;

    let config = TrackerConfig::new().api_url(format!("http://{}/track", address));
    let mut tracker = Tracker::new(1, config);
    tracker.add_ecommerce_item(EcommerceItem::new("1", "Book", vec![String::from("books")], 9.99, 5).unwrap());

    let response = tracker.do_track_ecommerce_order("A-1000", EcommerceTotals::new(49.95)).await.unwrap();
    assert!(response.ok);
    assert_eq!(response.status, Some(204));

    let params = query_of(&head.await.unwrap());
    assert!(params.iter().any(|(key, _)| key == "ec_items"));

    // Items do not leak into the next request.
    assert_eq!(tracker.build_query().get("ec_items"), None);
    assert_eq!(tracker.build_query().get("idgoal"), None);
}

#[tokio::test]
async fn timeout_is_reported_as_data() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    // Accept the connection but never answer.
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        drop(stream);
    });

    let config = TrackerConfig::new()
        .api_url(format!("http://{}/track", address))
        .timeout(Duration::from_millis(200));
    let mut tracker = Tracker::new(1, config);

    let response = tracker.execute().await.unwrap();
    assert!(!response.ok);
    assert!(response.error);
    assert!(response.timed_out);
    assert_eq!(response.status, None);
}

#[tokio::test]
async fn connection_failure_is_reported_as_data() {
    // Bind and drop to find a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let config = TrackerConfig::new().api_url(format!("http://{}/track", address));
    let mut tracker = Tracker::new(1, config);

    let response = tracker.execute().await.unwrap();
    assert!(!response.ok);
    assert!(response.error);
    assert!(!response.timed_out);
    assert_eq!(response.status, None);
}
