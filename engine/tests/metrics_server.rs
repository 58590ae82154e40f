mod common;

use chaingate_engine::metrics_server::router;

use common::*;

#[tokio::test]
async fn serves_metrics_and_health() {
    let h = Harness::new(config());
    let (_, w) = h.link(1);
    h.chain.found(&w, &cid("a"), tx(1), 98, 3);
    h.engine.scheduler.run_cycle().await.unwrap();

    let app = router(h.engine.metrics.clone(), h.engine.scheduler.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let metrics = reqwest::get(format!("http://{addr}/metrics"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains("chaingate_verifications_total 1"));
    assert!(metrics.contains("chaingate_cycles_run_total 1"));

    let health: serde_json::Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["cycles"]["total_runs"], 1);
    assert_eq!(health["cycles"]["currently_running"], false);
}
