mod common;

use anyhow::Result;

use discountify::client::{
    AuthStore, DiscountFormPatch, DiscountStore, NoticeLevel, ShopFormPatch, ShopStore,
};
use discountify::filter::DiscountFilter;

#[tokio::test]
async fn auth_store_follows_the_session() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = common::client(server)?;
    let (shop, email) = common::register_shop(&client, "Store Shop", "X").await?;
    let auth = AuthStore::new(client.clone());

    assert!(auth.check_auth().await.is_none());
    assert!(!auth.state().is_authenticated());

    let err = auth.login(&email, "wrong-password").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(auth.state().error.as_deref(), Some("Invalid email or password"));

    auth.login(&email, common::PASSWORD).await?;
    let principal = auth.check_auth().await.expect("signed in");
    assert_eq!(principal.id, shop.id);

    auth.logout().await;
    assert!(!auth.state().is_authenticated());
    assert!(client.token().is_none());
    Ok(())
}

#[tokio::test]
async fn shop_store_register_rejects_mismatched_passwords_locally() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let store = ShopStore::new(common::client(server)?);

    store.set_form(ShopFormPatch {
        shop_name: Some("Typo Shop".into()),
        email: Some(common::unique_email("typo")),
        city: Some("X".into()),
        password: Some(common::PASSWORD.into()),
        confirm_password: Some("something-else".into()),
        ..Default::default()
    });
    let err = store.register().await.unwrap_err();
    assert_eq!(err.status(), None);
    assert_eq!(err.user_message(""), "Passwords do not match");
    Ok(())
}

#[tokio::test]
async fn discount_store_adds_and_refreshes_the_dashboard() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = common::client(server)?;
    common::signed_in_shop(&client, "Dashboard", "X").await?;
    let store = DiscountStore::new(client);

    assert!(store.fetch_my_discounts(None).await?.is_empty());

    store.set_form(DiscountFormPatch {
        title: Some("Weekend offer".into()),
        discount_percentage: Some("15".into()),
        category: Some("Food".into()),
        start_date: Some("2025-05-01".into()),
        end_date: Some("2025-05-03".into()),
        ..Default::default()
    });
    let added = store.add_discount().await?;

    let state = store.state();
    assert_eq!(state.discounts.len(), 1);
    assert_eq!(state.discounts[0].discount.id, added.id);
    assert!(state.form.title.is_empty(), "form resets after add");
    assert!(state
        .notices
        .iter()
        .any(|n| n.level == NoticeLevel::Success && n.message == "Discount added successfully"));

    store.delete_discount(added.id).await?;
    assert!(store.state().discounts.is_empty());
    Ok(())
}

#[tokio::test]
async fn discount_store_board_filters_by_search() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = common::client(server)?;
    common::signed_in_shop(&client, "Searchable", "X").await?;
    let store = DiscountStore::new(client);
    let tag = uuid::Uuid::new_v4().simple().to_string();

    store.set_form(DiscountFormPatch {
        title: Some(format!("Tagged {}", tag)),
        discount_percentage: Some("5".into()),
        category: Some("Books".into()),
        start_date: Some("2025-01-01".into()),
        end_date: Some("2025-01-31".into()),
        ..Default::default()
    });
    let added = store.add_discount().await?;

    let found = store.fetch_discounts(DiscountFilter::search(tag)).await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].discount.id, added.id);
    assert_eq!(store.state().discounts, found);
    Ok(())
}
