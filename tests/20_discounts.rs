mod common;

use anyhow::Result;
use chrono::Duration;
use rust_decimal::Decimal;
use serde_json::json;

use common::discount_body;
use discountify::client::{ApiClient, ClientError};
use discountify::database::models::{Discount, DiscountListing, Shop};

#[tokio::test]
async fn sale_scenario_shows_on_both_boards() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = common::client(server)?;
    let shop_name = common::unique("A");
    let shop = common::signed_in_shop(&client, &shop_name, "X").await?;

    let created: Discount = client
        .post(
            "/api/discounts/add",
            &json!({
                "shop_id": shop.id,
                "title": "Sale",
                "discount_percentage": 20,
                "category": "Clothing",
                "start_date": "2025-01-01",
                "end_date": "2025-01-31"
            }),
        )
        .await?;
    assert_eq!(created.shop_id, shop.id);

    let mine: Vec<DiscountListing> = client.get("/api/discounts/my").await?;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].discount.title, "Sale");

    let board: Vec<DiscountListing> = client.get("/api/discounts").await?;
    let listed = board
        .iter()
        .find(|l| l.discount.id == created.id)
        .expect("discount on the public board");
    assert_eq!(listed.shop_name, shop_name);
    assert_eq!(listed.city, "X");
    Ok(())
}

#[tokio::test]
async fn create_then_get_round_trips() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = common::client(server)?;
    common::signed_in_shop(&client, "Round Trip", "Berlin").await?;

    let created: Discount = client
        .post(
            "/api/discounts/add",
            &discount_body("Spring deal", json!("12.5"), "2025-03-01", "2025-03-31"),
        )
        .await?;

    let fetched: DiscountListing = client.get(&format!("/api/discounts/{}", created.id)).await?;
    assert_eq!(fetched.discount, created);
    assert_eq!(fetched.discount.discount_percentage, Decimal::new(125, 1));
    assert_eq!(fetched.discount.start_date.to_string(), "2025-03-01");
    assert_eq!(fetched.city, "Berlin");
    Ok(())
}

#[tokio::test]
async fn zero_percent_is_accepted() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = common::client(server)?;
    common::signed_in_shop(&client, "Zero", "X").await?;

    let created: Discount = client
        .post(
            "/api/discounts/add",
            &discount_body("Free gift", json!(0), "2025-01-01", "2025-01-02"),
        )
        .await?;
    assert!(created.discount_percentage.is_zero());
    Ok(())
}

#[tokio::test]
async fn out_of_range_percentages_are_never_stored() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = common::client(server)?;
    common::signed_in_shop(&client, "Greedy", "X").await?;

    for pct in [json!(150), json!(-5), json!("abc")] {
        let err = client
            .post::<_, Discount>(
                "/api/discounts/add",
                &discount_body("Too much", pct.clone(), "2025-01-01", "2025-01-31"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400), "percentage {}", pct);
    }

    let mine: Vec<DiscountListing> = client.get("/api/discounts/my").await?;
    assert!(mine.is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_shop_reference_is_rejected() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = common::client(server)?;
    let shop = common::signed_in_shop(&client, "Ghost", "X").await?;
    let token = client.token();

    let _: Shop = client.delete(&format!("/api/shops/{}", shop.id)).await?;
    assert!(client.token().is_none());

    // A token issued before the delete still verifies, but its shop is gone
    client.set_token(token);
    let err = client
        .post::<_, Discount>(
            "/api/discounts/add",
            &discount_body("Orphan", json!(10), "2025-01-01", "2025-01-31"),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ClientError::Api {
            status: 409,
            message: "Invalid shop_id".to_string()
        }
    );
    Ok(())
}

#[tokio::test]
async fn deleting_a_shop_removes_its_discounts() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = common::client(server)?;
    let shop = common::signed_in_shop(&client, "Closing", "X").await?;

    let mut ids = Vec::new();
    for title in ["One", "Two"] {
        let d: Discount = client
            .post("/api/discounts/add", &discount_body(title, json!(5), "2025-01-01", "2025-01-31"))
            .await?;
        ids.push(d.id);
    }

    let _: Shop = client.delete(&format!("/api/shops/{}", shop.id)).await?;

    let board: Vec<DiscountListing> = client.get("/api/discounts").await?;
    assert!(board.iter().all(|l| !ids.contains(&l.discount.id)));
    assert!(board.iter().all(|l| l.discount.shop_id != shop.id));
    Ok(())
}

#[tokio::test]
async fn search_matches_title_or_shop_name() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = common::client(server)?;
    let tag = uuid::Uuid::new_v4().simple().to_string();

    let summer_shop = common::client(server)?;
    common::signed_in_shop(&summer_shop, &format!("SUMMER Outlet {}", tag), "X").await?;
    let by_shop: Discount = summer_shop
        .post("/api/discounts/add", &discount_body("Shoes", json!(15), "2025-06-01", "2025-06-30"))
        .await?;

    common::signed_in_shop(&client, "Plain", "X").await?;
    let by_title: Discount = client
        .post(
            "/api/discounts/add",
            &discount_body(&format!("Big Summer sale {}", tag), json!(30), "2025-06-01", "2025-08-31"),
        )
        .await?;
    let unrelated: Discount = client
        .post(
            "/api/discounts/add",
            &discount_body(&format!("Winter clearance {}", tag), json!(40), "2025-12-01", "2025-12-31"),
        )
        .await?;

    let results: Vec<DiscountListing> = client
        .get_with_query("/api/discounts", &[("search", "summer".to_string())])
        .await?;
    let ids: Vec<i32> = results.iter().map(|l| l.discount.id).collect();
    assert!(ids.contains(&by_shop.id));
    assert!(ids.contains(&by_title.id));
    assert!(!ids.contains(&unrelated.id));
    for listing in &results {
        let haystack = format!("{} {}", listing.discount.title, listing.shop_name).to_lowercase();
        assert!(haystack.contains("summer"), "unexpected match: {:?}", listing);
    }

    let sorted = results
        .windows(2)
        .all(|w| w[0].discount.start_date <= w[1].discount.start_date);
    assert!(sorted, "public board is ordered by start date");
    Ok(())
}

#[tokio::test]
async fn search_wildcards_are_literal() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = common::client(server)?;
    common::signed_in_shop(&client, "Literal", "X").await?;
    let tag = uuid::Uuid::new_v4().simple().to_string();
    let _: Discount = client
        .post("/api/discounts/add", &discount_body(&tag, json!(5), "2025-01-01", "2025-01-31"))
        .await?;

    let results: Vec<DiscountListing> = client
        .get_with_query("/api/discounts", &[("search", format!("{}%", tag))])
        .await?;
    assert!(results.is_empty());
    Ok(())
}

#[tokio::test]
async fn update_and_delete_a_missing_discount_is_404() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = common::client(server)?;
    common::signed_in_shop(&client, "Nobody Home", "X").await?;

    let err = client
        .put::<_, Discount>(
            "/api/discounts/2147483647",
            &discount_body("Nothing", json!(10), "2025-01-01", "2025-01-31"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));

    let err = client
        .delete::<Discount>("/api/discounts/2147483647")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    Ok(())
}

#[tokio::test]
async fn only_the_owner_may_change_a_discount() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let owner = common::client(server)?;
    let other = common::client(server)?;
    common::signed_in_shop(&owner, "Owner", "X").await?;
    common::signed_in_shop(&other, "Other", "Y").await?;

    let d: Discount = owner
        .post("/api/discounts/add", &discount_body("Mine", json!(10), "2025-01-01", "2025-01-31"))
        .await?;

    let err = other
        .put::<_, Discount>(
            &format!("/api/discounts/{}", d.id),
            &discount_body("Stolen", json!(90), "2025-01-01", "2025-01-31"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));

    let err = other
        .delete::<Discount>(&format!("/api/discounts/{}", d.id))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));

    let updated: Discount = owner
        .put(
            &format!("/api/discounts/{}", d.id),
            &discount_body("Mine, improved", json!(25), "2025-01-01", "2025-02-28"),
        )
        .await?;
    assert_eq!(updated.title, "Mine, improved");
    assert_eq!(updated.discount_percentage, Decimal::new(25, 0));

    let deleted: Discount = owner.delete(&format!("/api/discounts/{}", d.id)).await?;
    assert_eq!(deleted.id, d.id);
    Ok(())
}

/// Ids of public listings matching `query`, in board order
async fn board_ids(client: &ApiClient, query: &[(&str, &str)]) -> Result<Vec<i32>> {
    let pairs: Vec<(&str, String)> = query.iter().map(|(k, v)| (*k, v.to_string())).collect();
    let listings: Vec<DiscountListing> = client.get_with_query("/api/discounts", &pairs).await?;
    Ok(listings.iter().map(|l| l.discount.id).collect())
}

#[tokio::test]
async fn date_category_and_city_filters_compose() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = common::client(server)?;
    let tag = uuid::Uuid::new_v4().simple().to_string();
    common::signed_in_shop(&client, "Calendar", &format!("Lakeside {}", tag)).await?;
    let today = common::database_today().await?;

    let add = |title: &'static str, category: String, from: i64, to: i64| {
        let client = client.clone();
        async move {
            let created: Discount = client
                .post(
                    "/api/discounts/add",
                    &json!({
                        "title": title,
                        "discount_percentage": 10,
                        "category": category,
                        "start_date": (today + Duration::days(from)).to_string(),
                        "end_date": (today + Duration::days(to)).to_string(),
                    }),
                )
                .await?;
            Ok::<_, anyhow::Error>(created.id)
        }
    };
    let now = add("Today only", format!("Food_x {}", tag), 0, 0).await?;
    let tmrw = add("Tomorrow only", format!("food {}", tag), 1, 1).await?;
    let later = add("Next week", format!("Boxes {}", tag), 5, 10).await?;
    let far = add("Next month", format!("Seafood {}", tag), 30, 40).await?;

    // Every query is pinned to this test's shop by its city
    let city = format!("LAKESIDE {}", tag.to_uppercase());
    let city = city.as_str();

    assert_eq!(board_ids(&client, &[("city", city)]).await?, [now, tmrw, later, far]);
    assert_eq!(board_ids(&client, &[("city", city), ("date", "today")]).await?, [now]);
    assert_eq!(board_ids(&client, &[("city", city), ("date", "tomorrow")]).await?, [tmrw]);
    assert_eq!(board_ids(&client, &[("city", city), ("date", "week")]).await?, [now, tmrw, later]);

    assert_eq!(board_ids(&client, &[("city", city), ("category", "food")]).await?, [now, tmrw, far]);
    // `_` matches itself, not any character
    assert_eq!(board_ids(&client, &[("city", city), ("category", "_x")]).await?, [now]);

    let combined = [("city", city), ("category", "FOOD"), ("date", "week"), ("search", "only")];
    assert_eq!(board_ids(&client, &combined).await?, [now, tmrw]);
    let narrowed = [("city", city), ("category", "food"), ("date", "tomorrow"), ("search", "only")];
    assert_eq!(board_ids(&client, &narrowed).await?, [tmrw]);

    let elsewhere = format!("elsewhere {}", tag);
    assert!(board_ids(&client, &[("city", elsewhere.as_str())]).await?.is_empty());
    Ok(())
}
