//! End-to-end login flows through the public `ScanGate` API.

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use scangate::prelude::*;
use scangate::replies;
use scangate_session::ManualClock;
use scangate_wechat::{EVENT_SCAN, EVENT_SUBSCRIBE, MSG_TYPE_EVENT, WeChatError};

// =========================================================================
// Test fixtures
// =========================================================================

/// Records every request and answers with a fixed ticket.
#[derive(Default)]
struct RecordingIssuer {
    requests: Arc<Mutex<Vec<QrCodeRequest>>>,
}

impl QrCodeIssuer for RecordingIssuer {
    async fn issue(&self, request: &QrCodeRequest) -> Result<QrCodeTicket, ScanGateError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(QrCodeTicket {
            ticket: "TICKET123".into(),
            expire_seconds: request.expire_seconds,
            url: "http://weixin.qq.com/q/abc".into(),
            ..QrCodeTicket::default()
        })
    }
}

/// Fails the way an issuer without an access token would.
struct OfflineIssuer;

impl QrCodeIssuer for OfflineIssuer {
    async fn issue(&self, _request: &QrCodeRequest) -> Result<QrCodeTicket, ScanGateError> {
        Err(ScanGateError::QrCodeIssue("access token unavailable".into()))
    }
}

/// Answers with a WeChat error code.
struct RejectingIssuer;

impl QrCodeIssuer for RejectingIssuer {
    async fn issue(&self, _request: &QrCodeRequest) -> Result<QrCodeTicket, ScanGateError> {
        Ok(QrCodeTicket {
            error_code: 40001,
            error_message: "invalid credential".into(),
            ..QrCodeTicket::default()
        })
    }
}

const T0: u64 = 1_700_000_000;

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        SystemTime::UNIX_EPOCH + Duration::from_secs(T0),
    ))
}

fn gate_with<Q: QrCodeIssuer>(clock: &Arc<ManualClock>, issuer: Q) -> ScanGate<Q> {
    ScanGateBuilder::new()
        .wechat_token("s3cret")
        .clock(clock.clone())
        .build(issuer)
}

fn scan(scene_id: &str, openid: &str) -> InboundMessage {
    InboundMessage {
        to_user_name: "gh_account".into(),
        from_user_name: openid.into(),
        create_time: T0 as i64,
        msg_type: MSG_TYPE_EVENT.into(),
        event: EVENT_SCAN.into(),
        event_key: scene_id.into(),
        ..InboundMessage::default()
    }
}

fn subscribe(scene_id: &str, openid: &str) -> InboundMessage {
    InboundMessage {
        event: EVENT_SUBSCRIBE.into(),
        event_key: format!("qrscene_{scene_id}"),
        ..scan(scene_id, openid)
    }
}

// =========================================================================
// Happy path
// =========================================================================

#[tokio::test]
async fn test_scan_login_full_flow() {
    let clock = clock();
    let gate = gate_with(&clock, RecordingIssuer::default());

    let login = gate.create_login_qrcode().await.unwrap();
    assert_eq!(
        login.qrcode_url,
        "https://mp.weixin.qq.com/cgi-bin/showqrcode?ticket=TICKET123"
    );
    assert_eq!(login.expire_seconds, 600);
    assert!(login.scene_id.starts_with("login_1700000000_"));

    let status = gate.login_status(&login.login_token).unwrap();
    assert_eq!(status.status, SessionStatus::Pending);
    assert!(status.wechat_user.is_none());
    assert!(status.auth_code.is_none());

    clock.advance(Duration::from_secs(30));
    let reply = gate.handle_message(&scan(&login.scene_id, "oUser123"));
    assert_eq!(reply.content, replies::SCAN_SUCCESS);
    assert_eq!(reply.to_user_name, "oUser123");

    let status = gate.login_status(&login.login_token).unwrap();
    assert_eq!(status.status, SessionStatus::Success);
    assert_eq!(status.wechat_user, Some(WeChatUserInfo::new("oUser123")));
    let auth_code = status.auth_code.unwrap();
    assert_eq!(auth_code.len(), 32);

    assert_eq!(gate.redeem_auth_code(&auth_code).unwrap(), "oUser123");
    // Redeeming doesn't consume the code.
    assert_eq!(gate.redeem_auth_code(&auth_code).unwrap(), "oUser123");
}

#[tokio::test]
async fn test_first_follow_logs_in() {
    let clock = clock();
    let gate = gate_with(&clock, RecordingIssuer::default());
    let login = gate.create_login_qrcode().await.unwrap();

    let reply = gate.handle_message(&subscribe(&login.scene_id, "oFollower"));

    assert_eq!(reply.content, replies::FOLLOW_SUCCESS);
    let status = gate.login_status(&login.login_token).unwrap();
    assert_eq!(status.wechat_user.unwrap().openid, "oFollower");
}

#[tokio::test]
async fn test_issuer_receives_session_scene_and_ttl() {
    let clock = clock();
    let issuer = RecordingIssuer::default();
    let requests = Arc::clone(&issuer.requests);
    let gate = ScanGateBuilder::new()
        .clock(clock.clone())
        .session_config(SessionConfig {
            session_ttl: Duration::from_secs(300),
            ..SessionConfig::default()
        })
        .build(issuer);

    let login = gate.create_login_qrcode().await.unwrap();

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].scene(), login.scene_id);
    assert_eq!(requests[0].expire_seconds, 300);
    assert_eq!(requests[0].action_name, "QR_STR_SCENE");
    assert_eq!(login.expire_seconds, 300);
}

// =========================================================================
// Expiry
// =========================================================================

#[tokio::test]
async fn test_expired_session_rejects_poll_and_scan() {
    let clock = clock();
    let gate = gate_with(&clock, RecordingIssuer::default());
    let login = gate.create_login_qrcode().await.unwrap();

    clock.advance(Duration::from_secs(11 * 60));

    assert!(matches!(
        gate.login_status(&login.login_token),
        Err(ScanGateError::InvalidLoginToken)
    ));
    let reply = gate.handle_message(&scan(&login.scene_id, "oLate"));
    assert_eq!(reply.content, replies::SCAN_EXPIRED);
    assert_eq!(gate.active_session_count(), 0);
}

#[tokio::test]
async fn test_auth_code_dies_with_its_session() {
    let clock = clock();
    let gate = gate_with(&clock, RecordingIssuer::default());
    let login = gate.create_login_qrcode().await.unwrap();
    gate.handle_message(&scan(&login.scene_id, "oUser"));
    let code = gate
        .login_status(&login.login_token)
        .unwrap()
        .auth_code
        .unwrap();

    clock.advance(Duration::from_secs(601));

    assert!(matches!(
        gate.redeem_auth_code(&code),
        Err(ScanGateError::InvalidAuthCode)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_started_gate_sweeps_expired_sessions() {
    let clock = clock();
    let mut gate = ScanGateBuilder::new()
        .clock(clock.clone())
        .session_config(SessionConfig {
            session_ttl: Duration::from_secs(120),
            sweep_interval: Duration::from_secs(60),
        })
        .build(RecordingIssuer::default());
    gate.start();
    gate.create_login_qrcode().await.unwrap();
    gate.create_login_qrcode().await.unwrap();

    clock.advance(Duration::from_secs(121));
    tokio::time::sleep(Duration::from_secs(61)).await;

    assert_eq!(gate.store().sweep_expired(), 0);
    assert_eq!(gate.active_session_count(), 0);
    gate.shutdown().await;
    assert!(!gate.is_running());
}

// =========================================================================
// Rejections
// =========================================================================

#[tokio::test]
async fn test_login_status_rejects_empty_and_unknown_tokens() {
    let gate = gate_with(&clock(), RecordingIssuer::default());

    assert!(matches!(
        gate.login_status(""),
        Err(ScanGateError::MissingParameter("login_token"))
    ));
    assert!(matches!(
        gate.login_status("no-such-token"),
        Err(ScanGateError::InvalidLoginToken)
    ));
}

#[tokio::test]
async fn test_redeem_rejects_malformed_and_pending_codes() {
    let clock = clock();
    let gate = gate_with(&clock, RecordingIssuer::default());
    gate.create_login_qrcode().await.unwrap();

    assert!(matches!(
        gate.redeem_auth_code(""),
        Err(ScanGateError::MissingParameter("auth_code"))
    ));
    assert!(matches!(
        gate.redeem_auth_code("short"),
        Err(ScanGateError::MalformedAuthCode(5))
    ));
    // Well-formed but never issued to a successful session.
    assert!(matches!(
        gate.redeem_auth_code(&"0".repeat(32)),
        Err(ScanGateError::InvalidAuthCode)
    ));
}

#[tokio::test]
async fn test_issuer_failure_surfaces() {
    let clock = clock();
    let gate = gate_with(&clock, OfflineIssuer);

    let err = gate.create_login_qrcode().await.unwrap_err();

    assert!(matches!(err, ScanGateError::QrCodeIssue(_)));
    let resp: ApiResponse<QrLogin> = Err(err).into();
    assert!(!resp.success);
    assert_eq!(resp.message, "创建登录二维码失败");
}

#[tokio::test]
async fn test_wechat_error_code_surfaces() {
    let gate = gate_with(&clock(), RejectingIssuer);

    let err = gate.create_login_qrcode().await.unwrap_err();

    assert!(matches!(
        err,
        ScanGateError::WeChat(WeChatError::Api { code: 40001, .. })
    ));
}

// =========================================================================
// Signatures
// =========================================================================

#[test]
fn test_verify_signature_with_configured_token() {
    let gate = gate_with(&clock(), RecordingIssuer::default());
    let sig = scangate_wechat::signature("s3cret", "1700000000", "nonce42");

    assert!(gate.verify_signature(&sig, "1700000000", "nonce42"));
    assert!(!gate.verify_signature(&sig, "1700000001", "nonce42"));
    assert!(!gate.verify_signature("", "1700000000", "nonce42"));
}
