// Telegram notifier against a local mock server

use mockito::Matcher;
use serde_json::json;
use trend_signal_bot::clients::{ActionLink, Notifier, NotifyError};
use trend_signal_bot::config::TelegramConfig;
use trend_signal_bot::TelegramNotifier;

fn notifier_for(server: &mockito::ServerGuard) -> TelegramNotifier {
    TelegramNotifier::from_config(&TelegramConfig {
        api_url: server.url(),
        bot_token: "123:abc".to_string(),
        chat_id: "42".to_string(),
    })
    .unwrap()
}

#[tokio::test]
async fn test_send_posts_message_with_keyboard() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/bot123:abc/sendMessage")
        .match_body(Matcher::PartialJson(json!({
            "chat_id": "42",
            "text": "<b>BULLISH XBTUSD</b>",
            "parse_mode": "HTML",
            "reply_markup": {
                "inline_keyboard": [[{ "text": "Chart", "url": "https://charts.test/XBTUSD" }]]
            }
        })))
        .with_status(200)
        .with_body(r#"{"ok": true, "result": {}}"#)
        .create_async()
        .await;

    notifier_for(&server)
        .send(
            "42",
            "<b>BULLISH XBTUSD</b>",
            &[ActionLink::new("Chart", "https://charts.test/XBTUSD")],
        )
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_rejection_carries_description() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/bot123:abc/sendMessage")
        .with_status(400)
        .with_body(r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#)
        .create_async()
        .await;

    let err = notifier_for(&server).send("42", "hello", &[]).await.unwrap_err();

    match err {
        NotifyError::Rejected { status, description } => {
            assert_eq!(status, 400);
            assert!(description.contains("chat not found"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_token_is_not_configured() {
    let result = TelegramNotifier::from_config(&TelegramConfig::default());
    assert!(matches!(result, Err(NotifyError::NotConfigured(_))));
}
