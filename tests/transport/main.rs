//! HTTP transport integration tests.
//!
//! Starts an axum server and exercises it with reqwest.

#![cfg(feature = "http")]

use catalog_rust::{http, Catalog, CatalogConfig, InMemoryEntityStore};
use serde_json::{json, Value};

/// Bind to port 0 and return the actual address.
async fn start_server(config: CatalogConfig) -> String {
    let app = http::router(Catalog::new(InMemoryEntityStore::new()), config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn dune() -> Value {
    json!({
        "title": "Dune",
        "category": "scifi",
        "language": "en",
        "publisher": "Ace",
        "current_amount": 10,
        "paperback_price": 9.99
    })
}

async fn create_book(client: &reqwest::Client, base: &str, body: &Value) -> Value {
    let resp = client
        .post(format!("{base}/v1/books"))
        .json(body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn ping() {
    let base = start_server(CatalogConfig::default()).await;
    let resp = reqwest::get(format!("{base}/ping")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "pong");
}

#[tokio::test]
async fn book_lifecycle() {
    let base = start_server(CatalogConfig::default()).await;
    let client = reqwest::Client::new();

    let created = create_book(&client, &base, &dune()).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["version"], 1);
    assert_eq!(created["sold_amount"], 0);
    assert_eq!(created.get("average_score"), Some(&Value::Null));

    let resp = client
        .get(format!("{base}/v1/books/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let fetched: Value = resp.json().await.unwrap();
    assert_eq!(fetched["title"], "Dune");

    let mut changes = dune();
    changes["title"] = json!("Dune Messiah");
    changes["version"] = json!(1);
    let resp = client
        .put(format!("{base}/v1/books/{id}"))
        .json(&changes)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["title"], "Dune Messiah");
    assert_eq!(updated["version"], 2);

    // Same payload again: version 1 is stale now.
    let resp = client
        .put(format!("{base}/v1/books/{id}"))
        .json(&changes)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());

    let resp = client
        .delete(format!("{base}/v1/books/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .get(format!("{base}/v1/books/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], format!("book id {id} is not found"));
}

#[tokio::test]
async fn fill_and_sale() {
    let base = start_server(CatalogConfig::default()).await;
    let client = reqwest::Client::new();
    let id = create_book(&client, &base, &dune()).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let resp = client
        .put(format!("{base}/v1/books/{id}/sale"))
        .json(&json!({ "amount": 4 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let sold: Value = resp.json().await.unwrap();
    assert_eq!(sold["current_amount"], 6);
    assert_eq!(sold["sold_amount"], 4);

    let resp = client
        .put(format!("{base}/v1/books/{id}/sale"))
        .json(&json!({ "amount": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "insufficient stock, only 6 items left");

    let resp = client
        .put(format!("{base}/v1/books/{id}/fill"))
        .json(&json!({ "amount": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let filled: Value = resp.json().await.unwrap();
    assert_eq!(filled["current_amount"], 11);
    assert_eq!(filled["version"], 3);

    for body in [json!({ "amount": 0 }), json!({ "amount": -2 }), json!({})] {
        let resp = client
            .put(format!("{base}/v1/books/{id}/fill"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "payload {body}");
    }

    let resp = client
        .put(format!("{base}/v1/books/missing/sale"))
        .json(&json!({ "amount": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn invalid_book_is_rejected() {
    let base = start_server(CatalogConfig::default()).await;
    let client = reqwest::Client::new();

    let mut body = dune();
    body["publisher"] = json!("   ");
    let resp = client
        .post(format!("{base}/v1/books"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("{base}/v1/books"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn list_clamps_page_size() {
    let base = start_server(CatalogConfig::default().with_max_page_size(3)).await;
    let client = reqwest::Client::new();
    for title in ["A", "B", "C", "D"] {
        let mut body = dune();
        body["title"] = json!(title);
        create_book(&client, &base, &body).await;
    }

    let resp = client
        .get(format!("{base}/v1/books?size=50&sort=title&order=desc"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["total"], 4);
    assert_eq!(page["size"], 3);
    assert_eq!(page["data"][0]["title"], "D");

    let resp = client
        .get(format!("{base}/v1/books?size=oops&offset=oops&title=B"))
        .send()
        .await
        .unwrap();
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["data"][0]["title"], "B");

    let resp = client
        .get(format!("{base}/v1/books?sort=synopsis"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn reviews_and_reports() {
    let base = start_server(CatalogConfig::default()).await;
    let client = reqwest::Client::new();
    let id = create_book(&client, &base, &dune()).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let mut review_ids = Vec::new();
    for score in [2, 4] {
        let resp = client
            .post(format!("{base}/v1/books/{id}/reviews"))
            .json(&json!({ "score": score, "description": "ok" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let review: Value = resp.json().await.unwrap();
        review_ids.push(review["id"].as_str().unwrap().to_string());
    }

    let book: Value = client
        .get(format!("{base}/v1/books/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(book["average_score"], 3.0);

    let reviews: Value = client
        .get(format!("{base}/v1/books/{id}/reviews"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reviews.as_array().unwrap().len(), 2);

    let resp = client
        .put(format!("{base}/v1/books/{id}/reviews/{}", review_ids[0]))
        .json(&json!({ "score": 5, "description": "better", "version": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .get(format!("{base}/v1/books/other/reviews/{}", review_ids[0]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .delete(format!("{base}/v1/books/{id}/reviews/{}", review_ids[1]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .post(format!("{base}/v1/books/missing/reviews"))
        .json(&json!({ "score": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    client
        .put(format!("{base}/v1/books/{id}/sale"))
        .json(&json!({ "amount": 2 }))
        .send()
        .await
        .unwrap();
    let report: Value = client
        .get(format!("{base}/v1/reports/best-selling-books"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report, json!([{ "title": "Dune", "total_sale_amount": 2 }]));

    let report: Value = client
        .get(format!("{base}/v1/reports/best-selling-categories"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        report,
        json!([{ "category": "scifi", "total_sale_amount": 2 }])
    );
}
