mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn only_the_owner_may_change_a_product() -> Result<()> {
    let server = common::spawn_server().await?;
    let alice = server.user("alice@example.com").await?;
    let bob = server.user("bob@example.com").await?;

    let pen = server.create_product(&alice, json!({ "name": "Pen", "price": 2.5 })).await?;
    let url = server.url(&format!("/products/{}", pen["id"].as_str().unwrap_or_default()));

    // Any authenticated account can read
    let res = server.client.get(&url).bearer_auth(&bob.token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let seen = res.json::<Value>().await?;
    assert_eq!(seen["name"], "Pen");
    assert_eq!(seen["is_owner"], false);

    let res = server
        .client
        .put(&url)
        .bearer_auth(&bob.token)
        .json(&json!({ "price": 0.01 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "error": "You do not have permission to update this product" })
    );

    let res = server.client.delete(&url).bearer_auth(&bob.token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "error": "You do not have permission to delete this product" })
    );

    // Nothing changed
    let res = server.client.get(&url).bearer_auth(&alice.token).send().await?;
    let unchanged = res.json::<Value>().await?;
    assert_eq!(unchanged["price"], 2.5);
    assert_eq!(unchanged["is_owner"], true);
    assert_eq!(server.store.len().await, 1);

    Ok(())
}

#[tokio::test]
async fn list_filters_by_owner() -> Result<()> {
    let server = common::spawn_server().await?;
    let alice = server.user("alice@example.com").await?;
    let bob = server.user("bob@example.com").await?;

    server.create_product(&alice, json!({ "name": "Pen", "price": 2.5 })).await?;
    server.create_product(&bob, json!({ "name": "Stapler", "price": 12 })).await?;

    let res = server
        .client
        .get(server.url(&format!("/products?user_id={}", alice.id)))
        .bearer_auth(&bob.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let rows = res.json::<Vec<Value>>().await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Pen");
    assert_eq!(rows[0]["is_owner"], false);

    let res = server
        .client
        .get(server.url("/products"))
        .bearer_auth(&bob.token)
        .send()
        .await?;
    let all = res.json::<Vec<Value>>().await?;
    assert_eq!(all.len(), 2);
    assert_eq!(all.iter().filter(|p| p["is_owner"] == true).count(), 1);

    Ok(())
}
