use anyhow::Result;
use axum::{http::StatusCode, routing::post, Extension, Json, Router};
use cart_recovery::app::{DispatchUseCase, QualifyUseCase};
use cart_recovery::config::{Config, DispatchConfig, PayloadConfig, PayloadField};
use cart_recovery::error::LeadError;
use cart_recovery::infra::http_client::ReqwestWebhook;
use cart_recovery::ingest::TableFormat;
use cart_recovery::payload::build_payload;
use serde_json::Value;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const REPORT: &str = "\
Codigo Cliente,Cliente,Fone Fixo,Quant. Pedidos Enviados,Status,N. Pedido,Valor Total
1,Ana Souza,(11) 98888-7777,0,Pedido Salvo,5001,150.00
2,Bruno Lima,(21) 3333-4444,0,Pedido Salvo,5003,
3,Carla Dias,(31) 97777-6666,0,Pedido Salvo,5004,45.00
4,Davi Rocha,(41) 96666-5555,3,Pedido Salvo,5005,12.00
";

#[derive(Default)]
struct Received {
    bodies: Mutex<Vec<Value>>,
}

/// Starts a webhook stand-in on an ephemeral port that answers every POST with
/// `status` after `delay`.
fn spawn_webhook(status: StatusCode, delay: Duration) -> Result<(String, Arc<Received>)> {
    let received = Arc::new(Received::default());
    let app = Router::new()
        .route(
            "/webhook/leads",
            post(move |Extension(rx): Extension<Arc<Received>>, Json(body): Json<Value>| async move {
                rx.bodies.lock().unwrap().push(body);
                tokio::time::sleep(delay).await;
                (status, "ok")
            }),
        )
        .layer(Extension(received.clone()));

    let listener = TcpListener::bind("127.0.0.1:0")?;
    listener.set_nonblocking(true)?;
    let addr = listener.local_addr()?;
    let server = hyper::Server::from_tcp(listener)?.serve(app.into_make_service());
    tokio::spawn(server);

    Ok((format!("http://{}/webhook/leads", addr), received))
}

fn qualified_payload(config: &Config) -> Result<Vec<cart_recovery::payload::PayloadItem>> {
    let outcome = QualifyUseCase::from_config(config.clone()).run_bytes(REPORT.as_bytes(), TableFormat::Csv)?;
    Ok(build_payload(&outcome.qualified, &config.payload)?)
}

fn dispatcher(url: String, timeout_seconds: u64) -> DispatchUseCase {
    DispatchUseCase::new(
        Arc::new(ReqwestWebhook::new()),
        DispatchConfig { destination_url: url, timeout_seconds },
    )
}

#[tokio::test]
async fn success_reports_exactly_n_records() -> Result<()> {
    let (url, received) = spawn_webhook(StatusCode::OK, Duration::ZERO)?;
    let items = qualified_payload(&Config::default())?;
    assert_eq!(items.len(), 3);

    let report = dispatcher(url, 10).dispatch(&items).await?;
    assert_eq!(report.records_sent, 3);
    assert_eq!(report.status, 200);

    let bodies = received.bodies.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    let sent = bodies[0].as_array().expect("payload is a JSON array");
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0]["Fone Fixo"], "5511988887777");
    // missing total value is sent as an empty string
    assert_eq!(sent[1]["Valor Total"], "");
    Ok(())
}

#[tokio::test]
async fn created_status_counts_as_success() -> Result<()> {
    let (url, _) = spawn_webhook(StatusCode::CREATED, Duration::ZERO)?;
    let items = qualified_payload(&Config::default())?;
    let report = dispatcher(url, 10).dispatch(&items).await?;
    assert_eq!(report.status, 201);
    Ok(())
}

#[tokio::test]
async fn server_error_is_reported_once_without_retry() -> Result<()> {
    let (url, received) = spawn_webhook(StatusCode::INTERNAL_SERVER_ERROR, Duration::ZERO)?;
    let items = qualified_payload(&Config::default())?;

    match dispatcher(url, 10).dispatch(&items).await {
        Err(LeadError::WebhookStatus { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected WebhookStatus, got {:?}", other),
    }
    assert_eq!(received.bodies.lock().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn slow_webhook_times_out_as_transport_error() -> Result<()> {
    let (url, received) = spawn_webhook(StatusCode::OK, Duration::from_secs(5))?;
    let items = qualified_payload(&Config::default())?;

    let result = dispatcher(url, 1).dispatch(&items).await;
    assert!(matches!(result, Err(LeadError::Transport(_))));
    assert_eq!(received.bodies.lock().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn refused_connection_is_transport_error() -> Result<()> {
    // bind then drop to get a port nothing listens on
    let port = TcpListener::bind("127.0.0.1:0")?.local_addr()?.port();
    let items = qualified_payload(&Config::default())?;
    let result = dispatcher(format!("http://127.0.0.1:{}/webhook/leads", port), 5).dispatch(&items).await;
    assert!(matches!(result, Err(LeadError::Transport(_))));
    Ok(())
}

#[tokio::test]
async fn configured_field_names_reach_the_webhook() -> Result<()> {
    let (url, received) = spawn_webhook(StatusCode::OK, Duration::ZERO)?;
    let mut config = Config::default();
    config.qualifier.dedup_column = Some("N. Pedido".into());
    config.payload = PayloadConfig {
        fields: vec![
            PayloadField { column: "N. Pedido".into(), field: "id_pedido".into() },
            PayloadField { column: "Cliente".into(), field: "nome_cliente".into() },
            PayloadField { column: "Fone Fixo".into(), field: "Telefone".into() },
            PayloadField { column: "Valor Total".into(), field: "valor_total".into() },
        ],
    };

    let items = qualified_payload(&config)?;
    dispatcher(url, 10).dispatch(&items).await?;

    let bodies = received.bodies.lock().unwrap();
    let first = &bodies[0][0];
    assert_eq!(first["id_pedido"], 5001);
    assert_eq!(first["nome_cliente"], "Ana Souza");
    assert_eq!(first["Telefone"], "5511988887777");
    assert_eq!(first["valor_total"], 150.0);
    assert!(first.get("Status").is_none());
    Ok(())
}
