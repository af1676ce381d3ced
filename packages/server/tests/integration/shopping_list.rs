use serde_json::json;

use crate::common::{TestApp, routes};

fn body_lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

#[tokio::test]
async fn cart_ingredients_are_summed_and_sorted_by_name() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice").await;
    let flour = app.seed_ingredient("flour", "g").await;
    let sugar = app.seed_ingredient("sugar", "g").await;
    let egg = app.seed_ingredient("egg", "pcs").await;
    let a = app
        .create_recipe(&alice.token, "A", &[(flour, 200), (sugar, 50)])
        .await;
    let b = app
        .create_recipe(&alice.token, "B", &[(flour, 100), (egg, 2)])
        .await;
    for id in [a, b] {
        let res = app
            .post(&routes::shopping_cart(id), &json!({}), Some(&alice.token))
            .await;
        assert_eq!(res.status, 201);
    }

    let res = app.get(routes::DOWNLOAD_SHOPPING_CART, Some(&alice.token)).await;

    assert_eq!(res.status, 200);
    assert_eq!(
        res.content_disposition.as_deref(),
        Some("attachment; filename=\"shop_list.txt\"")
    );
    let lines = body_lines(&res.text);
    assert_eq!(lines[1], "Shopping list");
    assert_eq!(&lines[3..6], &["egg: 2pcs", "flour: 300g", "sugar: 50g"]);
    assert!(lines.last().unwrap().starts_with("Foodgram."));
}

#[tokio::test]
async fn empty_cart_yields_header_and_signature_only() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice").await;

    let res = app.get(routes::DOWNLOAD_SHOPPING_CART, Some(&alice.token)).await;

    assert_eq!(res.status, 200);
    let lines: Vec<&str> = body_lines(&res.text)
        .into_iter()
        .filter(|l| !l.is_empty())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "Shopping list");
    assert!(lines[2].starts_with("Foodgram."));
}

#[tokio::test]
async fn only_the_callers_cart_is_counted() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice").await;
    let bob = app.create_authenticated_user("bob").await;
    let flour = app.seed_ingredient("flour", "g").await;
    let id = app.create_recipe(&alice.token, "Bread", &[(flour, 500)]).await;
    app.post(&routes::shopping_cart(id), &json!({}), Some(&alice.token))
        .await;

    let res = app.get(routes::DOWNLOAD_SHOPPING_CART, Some(&bob.token)).await;

    assert!(!res.text.contains("flour"));
}

#[tokio::test]
async fn download_requires_authentication() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::DOWNLOAD_SHOPPING_CART, None).await;

    assert_eq!(res.status, 401);
}
