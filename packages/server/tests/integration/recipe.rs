use serde_json::json;

use crate::common::{PUBLIC_URL, TestApp, recipe_body, routes};

fn lines(body: &serde_json::Value) -> Vec<(i64, i64)> {
    let mut out: Vec<(i64, i64)> = body["ingredients"]
        .as_array()
        .expect("recipe has ingredients")
        .iter()
        .map(|i| (i["id"].as_i64().unwrap(), i["amount"].as_i64().unwrap()))
        .collect();
    out.sort();
    out
}

mod create {
    use super::*;

    #[tokio::test]
    async fn created_ingredient_set_reads_back_exactly() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let flour = app.seed_ingredient("flour", "g").await;
        let sugar = app.seed_ingredient("sugar", "g").await;
        let egg = app.seed_ingredient("egg", "pcs").await;

        let submitted = [(flour, 1), (sugar, 32767), (egg, 3)];
        let res = app
            .post(routes::RECIPES, &recipe_body("Cake", &submitted), Some(&alice.token))
            .await;
        assert_eq!(res.status, 201, "create failed: {}", res.text);
        assert_eq!(res.body["author"]["id"], alice.id);
        assert_eq!(res.body["is_favorited"], false);

        let read = app.get(&routes::recipe(res.id()), None).await;
        assert_eq!(read.status, 200);
        let mut expected: Vec<(i64, i64)> = submitted
            .iter()
            .map(|(id, amount)| (*id as i64, *amount))
            .collect();
        expected.sort();
        assert_eq!(lines(&read.body), expected);
        assert!(read.body["ingredients"][0]["measurement_unit"].is_string());
    }

    #[tokio::test]
    async fn repeated_ingredient_is_rejected_regardless_of_amounts() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let flour = app.seed_ingredient("flour", "g").await;

        for (a, b) in [(10, 10), (1, 500)] {
            let res = app
                .post(
                    routes::RECIPES,
                    &recipe_body("Bread", &[(flour, a), (flour, b)]),
                    Some(&alice.token),
                )
                .await;
            assert_eq!(res.status, 400);
            assert_eq!(res.body["field"], "ingredients");
        }
    }

    #[tokio::test]
    async fn amount_bounds() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let flour = app.seed_ingredient("flour", "g").await;

        for bad in [0, 32768] {
            let res = app
                .post(
                    routes::RECIPES,
                    &recipe_body(&format!("Bad {bad}"), &[(flour, bad)]),
                    Some(&alice.token),
                )
                .await;
            assert_eq!(res.status, 400, "amount {bad} accepted");
            assert_eq!(res.body["field"], "amount");
        }

        for good in [1, 32767] {
            let res = app
                .post(
                    routes::RECIPES,
                    &recipe_body(&format!("Good {good}"), &[(flour, good)]),
                    Some(&alice.token),
                )
                .await;
            assert_eq!(res.status, 201, "amount {good} rejected: {}", res.text);
        }
    }

    #[tokio::test]
    async fn empty_or_unknown_ingredients_are_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let empty = app
            .post(routes::RECIPES, &recipe_body("Air", &[]), Some(&alice.token))
            .await;
        assert_eq!(empty.status, 400);
        assert_eq!(empty.body["field"], "ingredients");

        let unknown = app
            .post(routes::RECIPES, &recipe_body("Ghost", &[(4242, 1)]), Some(&alice.token))
            .await;
        assert_eq!(unknown.status, 400);
        assert_eq!(unknown.body["field"], "ingredients");
    }

    #[tokio::test]
    async fn duplicate_name_for_the_same_author_conflicts() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let flour = app.seed_ingredient("flour", "g").await;

        app.create_recipe(&alice.token, "Bread", &[(flour, 500)]).await;

        let dup = app
            .post(routes::RECIPES, &recipe_body("Bread", &[(flour, 400)]), Some(&alice.token))
            .await;
        assert_eq!(dup.status, 409);
        assert_eq!(dup.body["code"], "CONFLICT");

        let other_author = app
            .post(routes::RECIPES, &recipe_body("Bread", &[(flour, 400)]), Some(&bob.token))
            .await;
        assert_eq!(other_author.status, 201);
    }

    #[tokio::test]
    async fn anonymous_create_is_unauthorized() {
        let app = TestApp::spawn().await;
        let flour = app.seed_ingredient("flour", "g").await;

        let res = app
            .post(routes::RECIPES, &recipe_body("Bread", &[(flour, 1)]), None)
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn ingredient_list_is_replaced_not_merged() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let flour = app.seed_ingredient("flour", "g").await;
        let sugar = app.seed_ingredient("sugar", "g").await;
        let milk = app.seed_ingredient("milk", "ml").await;
        let id = app
            .create_recipe(&alice.token, "Pancakes", &[(flour, 200), (sugar, 30)])
            .await;

        let res = app
            .patch(
                &routes::recipe(id),
                &json!({"ingredients": [{"id": milk, "amount": 250}, {"id": flour, "amount": 150}]}),
                Some(&alice.token),
            )
            .await;
        assert_eq!(res.status, 200, "update failed: {}", res.text);
        assert_eq!(res.body["name"], "Pancakes");

        let read = app.get(&routes::recipe(id), None).await;
        let mut expected = vec![(milk as i64, 250), (flour as i64, 150)];
        expected.sort();
        assert_eq!(lines(&read.body), expected);
    }

    #[tokio::test]
    async fn scalar_fields_change_only_when_given() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let flour = app.seed_ingredient("flour", "g").await;
        let id = app.create_recipe(&alice.token, "Bread", &[(flour, 500)]).await;

        let res = app
            .patch(
                &routes::recipe(id),
                &json!({"cooking_time": 45, "ingredients": [{"id": flour, "amount": 500}]}),
                Some(&alice.token),
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["cooking_time"], 45);
        assert_eq!(res.body["name"], "Bread");
        assert_eq!(res.body["text"], "Mix everything and cook.");
    }

    #[tokio::test]
    async fn update_without_ingredients_is_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let flour = app.seed_ingredient("flour", "g").await;
        let id = app.create_recipe(&alice.token, "Bread", &[(flour, 500)]).await;

        let res = app
            .patch(&routes::recipe(id), &json!({"ingredients": []}), Some(&alice.token))
            .await;
        assert_eq!(res.status, 400);

        let read = app.get(&routes::recipe(id), None).await;
        assert_eq!(lines(&read.body), vec![(flour as i64, 500)]);
    }

    #[tokio::test]
    async fn non_owner_cannot_update_but_admin_can() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let admin = app.create_user_with_role("root", "admin").await;
        let flour = app.seed_ingredient("flour", "g").await;
        let id = app.create_recipe(&alice.token, "Bread", &[(flour, 500)]).await;
        let body = json!({"name": "Stolen", "ingredients": [{"id": flour, "amount": 1}]});

        let res = app.patch(&routes::recipe(id), &body, Some(&bob.token)).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let res = app.patch(&routes::recipe(id), &body, Some(&admin.token)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["author"]["id"], alice.id);
    }

    #[tokio::test]
    async fn non_owner_is_forbidden_before_body_validation() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let flour = app.seed_ingredient("flour", "g").await;
        let id = app.create_recipe(&alice.token, "Bread", &[(flour, 500)]).await;

        let res = app
            .patch(&routes::recipe(id), &json!({"ingredients": []}), Some(&bob.token))
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn missing_recipe_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let flour = app.seed_ingredient("flour", "g").await;

        let res = app
            .patch(
                &routes::recipe(999),
                &json!({"ingredients": [{"id": flour, "amount": 1}]}),
                Some(&alice.token),
            )
            .await;

        assert_eq!(res.status, 404);
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn list_is_newest_first_and_filters_by_author() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let flour = app.seed_ingredient("flour", "g").await;
        let first = app.create_recipe(&alice.token, "First", &[(flour, 1)]).await;
        let second = app.create_recipe(&bob.token, "Second", &[(flour, 1)]).await;
        let third = app.create_recipe(&alice.token, "Third", &[(flour, 1)]).await;

        let all = app.get(routes::RECIPES, None).await;
        assert_eq!(all.status, 200);
        let ids: Vec<i64> = all.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![third as i64, second as i64, first as i64]);
        assert_eq!(all.body["pagination"]["total"], 3);

        let by_alice = app
            .get(&format!("{}?author={}", routes::RECIPES, alice.id), None)
            .await;
        assert_eq!(by_alice.body["pagination"]["total"], 2);
    }

    #[tokio::test]
    async fn page_far_past_the_end_is_empty() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let flour = app.seed_ingredient("flour", "g").await;
        app.create_recipe(&alice.token, "Bread", &[(flour, 1)]).await;

        let res = app
            .get(&format!("{}?page={}&limit=100", routes::RECIPES, u64::MAX), None)
            .await;
        assert_eq!(res.status, 200, "list failed: {}", res.text);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 0);
        assert_eq!(res.body["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn collection_filters_follow_the_caller() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let flour = app.seed_ingredient("flour", "g").await;
        let liked = app.create_recipe(&alice.token, "Liked", &[(flour, 1)]).await;
        app.create_recipe(&alice.token, "Other", &[(flour, 1)]).await;

        app.post(&routes::favorite(liked), &json!({}), Some(&bob.token)).await;

        let res = app
            .get(&format!("{}?is_favorited=1", routes::RECIPES), Some(&bob.token))
            .await;
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["id"], liked);
        assert_eq!(res.body["data"][0]["is_favorited"], true);

        let anonymous = app
            .get(&format!("{}?is_favorited=1", routes::RECIPES), None)
            .await;
        assert_eq!(anonymous.body["pagination"]["total"], 2);

        let alice_view = app
            .get(&format!("{}?is_favorited=1", routes::RECIPES), Some(&alice.token))
            .await;
        assert_eq!(alice_view.body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn get_link_uses_the_public_url() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let flour = app.seed_ingredient("flour", "g").await;
        let id = app.create_recipe(&alice.token, "Bread", &[(flour, 1)]).await;

        let res = app.get(&routes::get_link(id), None).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["short-link"], format!("{PUBLIC_URL}/recipes/{id}"));
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn owner_deletes_and_recipe_is_gone() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let flour = app.seed_ingredient("flour", "g").await;
        let id = app.create_recipe(&alice.token, "Bread", &[(flour, 1)]).await;
        app.post(&routes::shopping_cart(id), &json!({}), Some(&bob.token)).await;

        let forbidden = app.delete(&routes::recipe(id), Some(&bob.token)).await;
        assert_eq!(forbidden.status, 403);

        let res = app.delete(&routes::recipe(id), Some(&alice.token)).await;
        assert_eq!(res.status, 204);

        let read = app.get(&routes::recipe(id), None).await;
        assert_eq!(read.status, 404);

        let list = app.get(routes::DOWNLOAD_SHOPPING_CART, Some(&bob.token)).await;
        assert!(!list.text.contains("flour"));
    }
}
