//! Walks one scan-to-login round trip without a network: the QR issuer
//! is faked and the WeChat push is built by hand.
//!
//! ```text
//! RUST_LOG=debug cargo run -p scan-login
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use scangate::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// ---------------------------------------------------------------------------
// Offline issuer
// ---------------------------------------------------------------------------

/// Hands out tickets derived from the scene, as if WeChat had answered.
struct OfflineIssuer;

impl QrCodeIssuer for OfflineIssuer {
    async fn issue(&self, request: &QrCodeRequest) -> Result<QrCodeTicket, ScanGateError> {
        Ok(QrCodeTicket {
            ticket: format!("offline-{}", request.scene()),
            expire_seconds: request.expire_seconds,
            url: format!("http://weixin.qq.com/q/{}", request.scene()),
            ..QrCodeTicket::default()
        })
    }
}

fn print_json<T: serde::Serialize>(label: &str, value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{label}:\n{json}\n"),
        Err(e) => tracing::error!(error = %e, "failed to encode {label}"),
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let token = std::env::var("WECHAT_TOKEN").unwrap_or_else(|_| "scangate-demo".into());
    let mut gate = ScanGateBuilder::new()
        .wechat_token(token.clone())
        .build(OfflineIssuer);
    gate.start();

    // Browser: ask for a QR code.
    let login = match gate.create_login_qrcode().await {
        Ok(login) => {
            print_json("create_login_qrcode", &ApiResponse::ok(&login));
            login
        }
        Err(e) => {
            print_json("create_login_qrcode", &ApiResponse::<()>::fail(e.user_message()));
            tracing::error!(error = %e, "demo cannot continue");
            gate.shutdown().await;
            return;
        }
    };

    // Browser: first poll, nobody has scanned yet.
    print_json(
        "login_status (before scan)",
        &ApiResponse::from(gate.login_status(&login.login_token)),
    );

    // WeChat: the user scans; the push arrives signed.
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
        .to_string();
    let nonce = "demo-nonce";
    let sig = scangate_wechat::signature(&token, &timestamp, nonce);
    if !gate.verify_signature(&sig, &timestamp, nonce) {
        tracing::error!("signature check failed");
        gate.shutdown().await;
        return;
    }
    let push = InboundMessage {
        to_user_name: "gh_demo_account".into(),
        from_user_name: "oDemoUser".into(),
        msg_type: scangate_wechat::MSG_TYPE_EVENT.into(),
        event: scangate_wechat::EVENT_SCAN.into(),
        event_key: login.scene_id.clone(),
        ..InboundMessage::default()
    };
    print_json("reply to wechat", &gate.handle_message(&push));

    // Browser: second poll picks up the auth code.
    let auth_code = match gate.login_status(&login.login_token) {
        Ok(status) => {
            print_json("login_status (after scan)", &ApiResponse::ok(&status));
            status.auth_code
        }
        Err(e) => {
            print_json("login_status (after scan)", &ApiResponse::<()>::fail(e.user_message()));
            None
        }
    };

    // Backend: trade the code for the open id.
    if let Some(code) = auth_code {
        print_json("redeem_auth_code", &ApiResponse::from(gate.redeem_auth_code(&code)));
    }

    gate.shutdown().await;
}
