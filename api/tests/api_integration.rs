//! Router-level tests driven through `tower::ServiceExt::oneshot`

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use compost_api::{create_app, ApiState};
use compost_core::{
    Ledger, LedgerConfig, LedgerSnapshot, ManualClock, Share, StaticReputation, TokenBank, WAD,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

const DEPLOY: u64 = 1_700_000_000;
const OWNER: &str = "0xowner";
const TOKEN: &str = "0xtoken";

struct TestApp {
    state: ApiState,
    bank: Arc<TokenBank>,
    clock: Arc<ManualClock>,
}

impl TestApp {
    fn new() -> Self {
        let bank = Arc::new(TokenBank::new());
        let mut shares = HashMap::new();
        shares.insert("0xalice".to_string(), Share::new(1, 4).unwrap());
        let oracle = Arc::new(StaticReputation::new(shares));

        let mut config = LedgerConfig::with_owner(OWNER);
        config.deploy_time = Some(DEPLOY);
        config.sale_period_seconds = 3_600;
        config.daily_mint = 10 * WAD;

        let ledger = Ledger::new(&config, DEPLOY, bank.clone(), oracle).unwrap();
        let clock = Arc::new(ManualClock::new(DEPLOY));
        let state = ApiState::new(ledger, clock.clone());

        Self { state, bank, clock }
    }

    fn app(&self) -> Router {
        create_app(self.state.clone())
    }

    fn fund(&self, depositor: &str, amount: u128) {
        self.bank.fund(TOKEN, depositor, "compost-ledger", amount);
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        send(self.app(), request).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(self.app(), request).await
    }

    async fn deposit(&self, depositor: &str, amount: u128) -> (StatusCode, Value) {
        self.post(
            "/deposits",
            json!({
                "token": TOKEN,
                "depositor": depositor,
                "amount": amount.to_string(),
            }),
        )
        .await
    }
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    app.clock.advance(3 * 3_600);

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["current_period"], 3);
}

#[tokio::test]
async fn test_deposit_and_list() {
    let app = TestApp::new();
    app.fund("0xalice", 5 * WAD);

    let (status, body) = app.deposit("0xalice", 2 * WAD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["num_deposits"], 1);
    assert_eq!(body["amount"], (2 * WAD).to_string());

    let (_, body) = app.get("/tokens").await;
    assert_eq!(body["tokens"], json!([TOKEN]));

    let (_, body) = app.get(&format!("/tokens/{}/deposits", TOKEN)).await;
    assert_eq!(body["num_deposits"], 1);
    assert_eq!(body["outstanding"], (2 * WAD).to_string());
    assert_eq!(body["deposits"][0]["depositor"], "0xalice");

    let (status, body) = app.get(&format!("/tokens/{}/deposits/0", TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount"], (2 * WAD).to_string());

    let (status, body) = app.get(&format!("/tokens/{}/deposits/1", TOKEN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_deposit_without_allowance() {
    let app = TestApp::new();
    app.bank.mint(TOKEN, "0xalice", WAD);

    let (status, body) = app.deposit("0xalice", WAD).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "transfer_failed");

    let (status, body) = app.deposit("0xalice", 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_amount");
}

#[tokio::test]
async fn test_sell_throttled_per_period() {
    let app = TestApp::new();
    app.fund("0xalice", 2 * WAD);
    app.deposit("0xalice", 2 * WAD).await;

    let uri = format!("/tokens/{}/sell", TOKEN);
    let (status, body) = app.post(&uri, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], WAD.to_string());
    assert_eq!(body["period"], 0);

    let (status, body) = app.post(&uri, json!({})).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "sale_too_soon");

    app.clock.advance(3_600);
    let (status, body) = app.post(&uri, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], WAD.to_string());
    assert_eq!(body["remaining_deposits"], 0);

    app.clock.advance(3_600);
    let (status, body) = app.post(&uri, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "no_token_deposits");
}

#[tokio::test]
async fn test_income_queries() {
    let app = TestApp::new();
    app.fund("0xalice", 10 * WAD);
    app.deposit("0xalice", 10 * WAD).await;

    let uri = format!("/tokens/{}/sell", TOKEN);
    for _ in 0..3 {
        app.post(&uri, json!({})).await;
        app.clock.advance(3_600);
    }

    let (_, body) = app.get("/periods/current").await;
    assert_eq!(body["current_period"], 3);
    assert_eq!(body["periods_per_day"], 24);

    let (status, body) = app.get("/income/daily").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["daily_income"], (3 * WAD).to_string());

    let (_, body) = app.get("/income/periods").await;
    assert_eq!(body["from"], 0);
    assert_eq!(
        body["incomes"],
        json!([WAD.to_string(), WAD.to_string(), WAD.to_string()])
    );

    let (_, body) = app.get("/income/periods?from=1&limit=1").await;
    assert_eq!(body["from"], 1);
    assert_eq!(body["incomes"], json!([WAD.to_string()]));

    let (status, _) = app.get("/income/periods?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_requires_owner() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/admin/sale-period",
            json!({ "caller": "0xmallory", "seconds": 60 }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "unauthorized");

    let (status, body) = app
        .post(
            "/admin/sale-period",
            json!({ "caller": OWNER, "seconds": 86_401 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "interval_too_long");

    let (status, body) = app
        .post("/admin/sale-period", json!({ "caller": OWNER, "seconds": 1_800 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sale_period_seconds"], 1_800);

    let (_, body) = app.get("/periods/current").await;
    assert_eq!(body["periods_per_day"], 48);
}

#[tokio::test]
async fn test_admin_setters_and_owner_transfer() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/admin/sale-amount",
            json!({ "caller": OWNER, "amount": (2 * WAD).to_string() }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sale_amount"], (2 * WAD).to_string());

    let (status, _) = app
        .post(
            "/admin/payout-frequency",
            json!({ "caller": OWNER, "seconds": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post("/admin/owner", json!({ "caller": OWNER, "new_owner": "0xnew" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner"], "0xnew");

    let (status, _) = app
        .post(
            "/admin/daily-mint",
            json!({ "caller": OWNER, "amount": "1" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_payout_cycle() {
    let app = TestApp::new();

    let (_, body) = app.get("/payout").await;
    assert_eq!(body["time_to_payout"], 604_800);

    let (status, body) = app.post("/payout/initiate", json!({})).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "payout_too_soon");

    app.clock.advance(604_800);
    let (status, body) = app.post("/payout/initiate", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount"], (70 * WAD).to_string());
    assert_eq!(body["time_to_payout"], 604_800);

    let (status, body) = app
        .post("/payout/claim", json!({ "recipient": "0xalice" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recipient"], "0xalice");

    let (status, body) = app
        .post("/payout/claim", json!({ "recipient": "0xalice" }))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "oracle_failed");
}

#[tokio::test]
async fn test_event_polling() {
    let app = TestApp::new();
    app.fund("0xalice", WAD);
    app.fund("0xbob", WAD);
    app.deposit("0xalice", WAD).await;
    app.deposit("0xbob", WAD).await;

    let (_, body) = app.get("/events").await;
    assert_eq!(body["events"].as_array().unwrap().len(), 2);
    assert_eq!(body["next"], 2);
    assert_eq!(body["events"][0]["event"]["type"], "tokens_deposited");

    app.post(&format!("/tokens/{}/sell", TOKEN), json!({})).await;

    let (_, body) = app.get("/events?since=2").await;
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["sequence"], 2);
    assert_eq!(events[0]["event"]["type"], "tokens_composted");
    assert_eq!(events[0]["event"]["depositor"], "0xalice");
}

#[tokio::test]
async fn test_mutations_are_snapshotted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let mut app = TestApp::new();
    app.state = app.state.clone().with_snapshot_path(&path);
    app.fund("0xalice", 2 * WAD);

    app.get("/tokens").await;
    assert!(!path.exists());

    app.deposit("0xalice", 2 * WAD).await;
    let snapshot = LedgerSnapshot::load(&path).unwrap();
    assert_eq!(snapshot.deposits.num_deposits(TOKEN), 1);

    // Failed mutations leave the previous snapshot in place
    let (status, _) = app
        .post("/admin/sale-amount", json!({ "caller": "0xmallory", "amount": "5" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(LedgerSnapshot::load(&path).unwrap(), snapshot);
}

#[tokio::test]
async fn test_event_paging() {
    let app = TestApp::new();
    app.fund("0xalice", 5 * WAD);
    for _ in 0..5 {
        app.deposit("0xalice", WAD).await;
    }

    let (status, body) = app.get("/events?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1]["sequence"], 1);
    assert_eq!(body["next"], 2);
    assert_eq!(body["oldest"], 0);

    let (_, body) = app.get("/events?since=4&limit=2").await;
    assert_eq!(body["events"].as_array().unwrap().len(), 1);
    assert_eq!(body["next"], 5);

    let (_, body) = app.get("/events?since=9").await;
    assert!(body["events"].as_array().unwrap().is_empty());
    assert_eq!(body["next"], 5);

    let (status, body) = app.get("/events?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = app.get("/events?limit=1001").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_failed_snapshot_still_reports_commit() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();

    let mut app = TestApp::new();
    app.state = app
        .state
        .clone()
        .with_snapshot_path(blocker.join("ledger.json"));
    app.fund("0xalice", WAD);

    let (status, body) = app.deposit("0xalice", WAD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["num_deposits"], 1);
    assert_eq!(app.bank.balance_of(TOKEN, "0xalice"), 0);

    let (_, body) = app.get("/health").await;
    assert_eq!(body["status"], "degraded");
    assert!(body["persistence_error"].is_string());

    // Retrying is refused by the token service rather than charging twice
    let (status, _) = app.deposit("0xalice", WAD).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let (_, body) = app.get(&format!("/tokens/{}/deposits", TOKEN)).await;
    assert_eq!(body["num_deposits"], 1);

    // A working path clears the flag on the next commit
    app.state = app.state.clone().with_snapshot_path(dir.path().join("ledger.json"));
    app.fund("0xalice", WAD);
    let (status, _) = app.deposit("0xalice", WAD).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/health").await;
    assert_eq!(body["status"], "ok");
    assert!(body.get("persistence_error").is_none());
}
