use super::*;
use price_notifier::models::HISTORY_CAPACITY;

#[tokio::test]
async fn test_price_drop_triggers_alert() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let server = MockServer::start().await;
    let config = get_test_config(dir.path());

    // First response is the price on add, the rest are served on refresh
    Mock::given(method("GET"))
        .and(path("/headphones"))
        .respond_with(ResponseTemplate::new(200).set_body_string(price_page(r#"<span class="price">120</span>"#)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/headphones", price_page(r#"<span class="price">99.50</span>"#)).await;

    let manager = ProductManager::from_config(&config)?;
    manager
        .add(new_product("Headphones", &format!("{}/headphones", server.uri()), 100.0))
        .await?;

    let report = manager.refresh_all().await;

    assert!(report.persisted);
    assert_eq!(report.observed, 1);
    assert_eq!(report.triggered.len(), 1);
    assert_eq!(report.triggered[0].current_price, Some(99.5));

    let stored = manager.list().await;
    assert_eq!(stored[0].current_price, Some(99.5));
    assert_eq!(stored[0].price_history.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_failures_do_not_affect_other_products() -> anyhow::Result<()> {
    let ctx = create_test_context().await?;
    let uri = ctx.server.uri();
    mount_page(&ctx.server, "/ok", price_page(r#"<span class="money">10</span>"#)).await;
    mount_page(&ctx.server, "/no-price", price_page("<p>Coming soon</p>")).await;
    mount_page(&ctx.server, "/no-number", price_page(r#"<span class="price">Ask us</span>"#)).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&ctx.server)
        .await;

    for page in ["ok", "no-price", "no-number", "broken"] {
        ctx.manager
            .add(new_product(page, &format!("{}/{}", uri, page), 50.0))
            .await?;
    }

    let report = ctx.manager.refresh_all().await;

    assert_eq!(report.observed, 1);
    assert_eq!(report.failures.len(), 3);
    assert_eq!(report.triggered.len(), 1);
    assert_eq!(report.triggered[0].name, "ok");

    let stored = ctx.manager.list().await;
    assert_eq!(stored[0].price_history.len(), 2);
    for product in &stored[1..] {
        assert!(product.current_price.is_none());
        assert!(product.price_history.is_empty());
    }

    Ok(())
}

#[tokio::test]
async fn test_history_is_capped_over_many_refreshes() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let fetcher = Arc::new(CountingFetcher::default());
    let manager = create_manager_with(fetcher.clone(), dir.path(), 4);

    manager
        .add(new_product("Counter", "https://shop.example/counter", 1000.0))
        .await?;

    for _ in 0..35 {
        let report = manager.refresh_all().await;
        assert!(report.persisted);
    }

    // One observation on add plus one per refresh
    assert_eq!(fetcher.fetch_count(), 36);

    let stored = manager.list().await;
    let history: Vec<f64> = stored[0].price_history.iter().map(|e| e.price).collect();
    assert_eq!(history.len(), HISTORY_CAPACITY);
    // Oldest entries were dropped first
    assert_eq!(history.first().copied(), Some(6.0));
    assert_eq!(history.last().copied(), Some(35.0));
    assert_eq!(stored[0].current_price, Some(35.0));

    Ok(())
}

#[tokio::test]
async fn test_cancelled_refresh_keeps_completed_observations() -> anyhow::Result<()> {
    let ctx = create_test_context().await?;
    let uri = ctx.server.uri();
    mount_page(&ctx.server, "/fast", price_page(r#"<span class="price">15</span>"#)).await;

    // Add both while every page is fast
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_body_string(price_page(r#"<span class="price">40</span>"#)))
        .up_to_n_times(1)
        .mount(&ctx.server)
        .await;
    ctx.manager.add(new_product("Fast", &format!("{}/fast", uri), 20.0)).await?;
    ctx.manager.add(new_product("Slow", &format!("{}/slow", uri), 20.0)).await?;

    mount_slow_page(
        &ctx.server,
        "/slow",
        price_page(r#"<span class="price">5</span>"#),
        Duration::from_secs(5),
    )
    .await;

    let report = ctx
        .manager
        .refresh_all_with_shutdown(tokio::time::sleep(Duration::from_millis(500)))
        .await;

    assert!(report.cancelled);
    assert!(report.persisted);
    assert_eq!(report.observed, 1);
    assert_eq!(report.triggered.len(), 1);
    assert_eq!(report.triggered[0].name, "Fast");

    let stored = ctx.manager.list().await;
    assert_eq!(stored[0].price_history.len(), 2);
    // The slow product keeps what it had before the pass
    assert_eq!(stored[1].current_price, Some(40.0));
    assert_eq!(stored[1].price_history.len(), 1);

    Ok(())
}
