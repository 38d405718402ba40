use super::*;

#[tokio::test]
async fn test_complete_product_lifecycle() -> anyhow::Result<()> {
    let ctx = create_test_context().await?;
    mount_page(
        &ctx.server,
        "/headphones",
        price_page(r#"<div class="product-price">$ 120.00</div>"#),
    )
    .await;
    mount_page(
        &ctx.server,
        "/kettle",
        price_page(r#"<span id="deal">1.299,00 €</span>"#),
    )
    .await;

    // 1. Add two products, one with an explicit selector
    let headphones = ctx
        .manager
        .add(new_product("Headphones", &format!("{}/headphones", ctx.server.uri()), 100.0))
        .await?;
    assert_eq!(headphones.current_price, Some(120.0));
    assert_eq!(headphones.price_history.len(), 1);

    let mut kettle = new_product("Kettle", &format!("{}/kettle", ctx.server.uri()), 1500.0);
    kettle.locator = Some("#deal".to_string());
    kettle.thousands_separator = ThousandsSeparator::Dot;
    let kettle = ctx.manager.add(kettle).await?;
    assert_eq!(kettle.current_price, Some(1299.0));

    // 2. Both are listed in insertion order
    let products = ctx.manager.list().await;
    let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Headphones", "Kettle"]);

    // 3. Adding the same url again is refused
    let duplicate = ctx
        .manager
        .add(new_product("Headphones again", &headphones.url, 50.0))
        .await;
    assert!(duplicate.is_err());
    assert_eq!(ctx.manager.list().await.len(), 2);

    // 4. Out of range removal changes nothing
    assert!(ctx.manager.remove(0).await.is_err());
    assert!(ctx.manager.remove(3).await.is_err());
    assert_eq!(ctx.manager.list().await.len(), 2);

    // 5. Remove the first one
    let removed = ctx.manager.remove(1).await?;
    assert_eq!(removed.name, "Headphones");

    let remaining = ctx.manager.list().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "Kettle");

    Ok(())
}

#[tokio::test]
async fn test_add_with_unreachable_price() -> anyhow::Result<()> {
    let ctx = create_test_context().await?;
    mount_page(&ctx.server, "/sold-out", price_page("<p>Sold out</p>")).await;

    // No price element: the product is still tracked, just unobserved
    let product = ctx
        .manager
        .add(new_product("Sold out", &format!("{}/sold-out", ctx.server.uri()), 10.0))
        .await?;
    assert!(product.current_price.is_none());
    assert!(!product.is_observed());

    // Page missing entirely: same outcome
    let product = ctx
        .manager
        .add(new_product("Gone", &format!("{}/gone", ctx.server.uri()), 10.0))
        .await?;
    assert!(product.current_price.is_none());

    assert_eq!(ctx.manager.list().await.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_persisted_file_format() -> anyhow::Result<()> {
    let ctx = create_test_context().await?;
    mount_page(
        &ctx.server,
        "/cafetera",
        price_page(r#"<span class="andes-money-amount__fraction">45,99</span>"#),
    )
    .await;

    ctx.manager
        .add(new_product("Cafetera exprés", &format!("{}/cafetera", ctx.server.uri()), 50.0))
        .await?;

    let text = std::fs::read_to_string(&ctx.config.storage.products_file)?;
    assert!(text.contains("Cafetera exprés"));
    assert!(text.starts_with("[\n    {\n        \"name\""));

    let json: serde_json::Value = serde_json::from_str(&text)?;
    let record = &json[0];
    assert_eq!(record["target_price"], 50.0);
    assert!(record["selector_css"].is_null());
    assert_eq!(record["thousands_separator"], ",");
    assert_eq!(record["current_price"], 45.99);
    assert_eq!(record["price_history"][0]["price"], 45.99);

    let added = record["added_date"].as_str().unwrap_or_default();
    assert!(chrono::NaiveDateTime::parse_from_str(added, "%Y-%m-%d %H:%M:%S").is_ok());
    let observed = record["price_history"][0]["date"].as_str().unwrap_or_default();
    assert!(chrono::NaiveDateTime::parse_from_str(observed, "%Y-%m-%d %H:%M:%S").is_ok());

    Ok(())
}

#[tokio::test]
async fn test_existing_file_is_read() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tracked_products.json");
    std::fs::write(
        &path,
        r#"[
    {
        "name": "Old lamp",
        "url": "https://shop.example/lamp",
        "target_price": 30,
        "selector_css": null,
        "added_date": "2024-01-05 08:30:00",
        "current_price": 35.5,
        "price_history": [
            {"date": "2024-01-05 08:30:00", "price": 35.5}
        ]
    }
]"#,
    )?;

    let store = ProductStore::new(&path);
    let products = store.try_load()?;
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].thousands_separator, ThousandsSeparator::Comma);
    assert_eq!(products[0].current_price, Some(35.5));

    // Rewriting what was read changes no field
    store.save(&products)?;
    assert_eq!(store.try_load()?, products);

    Ok(())
}
