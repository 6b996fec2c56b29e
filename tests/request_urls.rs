//! Wire-level checks of the calls the client issues.

use ebay_catalog::batch::BatchOptions;
use ebay_catalog::config::Config;
use ebay_catalog::ebay::{Catalog, EbayClient, Properties, Transport};
use serde_json::json;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn catalog(server: &MockServer, mode: Transport) -> Catalog<EbayClient> {
    let config = Config { app_id: "TestApp".to_string(), mode, ..Config::default() };
    let client = EbayClient::with_base_url(&config, Some(server.uri())).unwrap();
    Catalog::new(client, BatchOptions::default())
}

#[tokio::test]
async fn test_multiple_items_in_one_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("callname", "GetMultipleItems"))
        .and(query_param("version", "525"))
        .and(query_param("responseencoding", "JSON"))
        .and(query_param("ItemID", "110,220,330"))
        .and(query_param("IncludeSelector", "Details"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Ack": "Success",
            "Item": [{"ItemID": "110"}, {"ItemID": "220"}, {"ItemID": "330"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = catalog(&server, Transport::Json);
    let props = Properties::new().with("IncludeSelector", "Details");

    let response = catalog.get_items(["110", "220", "330"], &props).await.unwrap();
    assert_eq!(response.get("Item").and_then(|items| items.as_array()).map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_finding_search_with_padding() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("SERVICE-VERSION", "1.0.0"))
        .and(query_param("OPERATION-NAME", "findItemsByKeywords"))
        .and(query_param("SECURITY-APPNAME", "TestApp"))
        .and(query_param("RESPONSE-DATA-FORMAT", "JSON"))
        .and(query_param("keywords", "harry potter & co"))
        .and(query_param("callback", "JSONP0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"JSONP0({"findItemsByKeywordsResponse":[{"ack":["Success"],"searchResult":[]}]})"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = catalog(&server, Transport::Jsonp);

    let response = catalog.search_by_keywords("harry potter & co", &Properties::new()).await.unwrap();
    assert!(response.contains_key("findItemsByKeywordsResponse"));
}

#[tokio::test]
async fn test_category_lookup_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("callname", "GetCategoryInfo"))
        .and(query_param("appid", "TestApp"))
        .and(query_param("CategoryID", "267"))
        .and(query_param("IncludeSelector", "ChildCategories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Ack": "Success",
            "Version": "525",
            "CategoryArray": {"Category": [{"CategoryID": "267"}]},
            "CategoryCount": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = catalog(&server, Transport::Json);
    let props = Properties::new().with("IncludeSelector", "ChildCategories");

    let delivery = catalog.get_categories(["267"], &props).await.unwrap();
    let response = delivery.as_one().unwrap();

    let keys: Vec<_> = response.fields().keys().cloned().collect();
    assert_eq!(keys, vec!["CategoryArray", "CategoryCount"]);
}
