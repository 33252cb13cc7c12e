//! Integration tests for convergence, retry and timeout behaviour.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::fixtures::{deployment, service, service_path, DEPLOYMENTS, SERVICES};
use deckhand_engine::{
    EngineError, ExistencePoller, KindRegistry, MockTransport, Resource, ResourceFactory,
    ResourceHandle, Scope,
};
use reqwest::Method;

fn handle(transport: &Arc<MockTransport>, poller: ExistencePoller) -> ResourceHandle {
    ResourceFactory::new(KindRegistry::kubernetes(), transport.clone(), poller)
        .create_handle(service("api"), &Scope::namespace("prod"))
        .unwrap()
}

fn fast_poller() -> ExistencePoller {
    ExistencePoller::new(Duration::from_secs(5), Duration::from_millis(500))
}

#[tokio::test(start_paused = true)]
async fn exists_is_true_right_after_create() {
    let transport = Arc::new(MockTransport::new());
    transport
        .on_status(Method::POST, SERVICES, [201])
        .on_status(Method::GET, service_path("api"), [404, 404, 404, 200]);

    let api = handle(&transport, fast_poller());
    api.create().await.unwrap();
    assert!(api.exists().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn exists_is_false_right_after_delete() {
    let transport = Arc::new(MockTransport::new());
    transport
        .on_status(Method::DELETE, service_path("api"), [200])
        .on_status(Method::GET, service_path("api"), [200, 200, 404]);

    let api = handle(&transport, fast_poller());
    api.delete().await.unwrap();
    assert!(!api.exists().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn create_survives_one_conflict() {
    let transport = Arc::new(MockTransport::new());
    transport
        .on_status(Method::POST, SERVICES, [409, 201])
        .on_status(Method::GET, service_path("api"), [200]);

    handle(&transport, fast_poller()).create().await.unwrap();
    assert_eq!(transport.count(&Method::POST, SERVICES), 2);
}

#[tokio::test(start_paused = true)]
async fn create_fails_after_two_server_errors() {
    let transport = Arc::new(MockTransport::new());
    transport.on_status(Method::POST, SERVICES, [500, 500, 201]);

    let err = handle(&transport, fast_poller()).create().await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Transient {
            operation: "create",
            status: 500,
            ..
        }
    ));
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn delete_times_out_when_object_lingers() {
    let transport = Arc::new(MockTransport::new());
    transport
        .on_status(Method::DELETE, service_path("api"), [200])
        .on_status(Method::GET, service_path("api"), [200]);

    let err = handle(&transport, fast_poller()).delete().await.unwrap_err();
    match err {
        EngineError::ConvergenceTimeout {
            message, operation, ..
        } => {
            assert!(message.contains("Service 'api' in namespace 'prod'"));
            assert_eq!(operation, "delete");
        }
        other => panic!("expected timeout, got {other:?}"),
    }

    let polls = transport.count(&Method::GET, &service_path("api"));
    assert!((10..=11).contains(&polls), "polled {polls} times");
}

#[tokio::test(start_paused = true)]
async fn default_budget_polls_about_six_hundred_times() {
    let transport = Arc::new(MockTransport::new());
    transport.on_status(Method::POST, DEPLOYMENTS, [201]);

    let web = ResourceFactory::new(
        KindRegistry::kubernetes(),
        transport.clone(),
        ExistencePoller::default(),
    )
    .create_handle(deployment("web"), &Scope::namespace("prod"))
    .unwrap();

    let err = web.create().await.unwrap_err();
    assert!(err.is_timeout());

    let polls = transport.count(
        &Method::GET,
        "/apis/apps/v1/namespaces/prod/deployments/web",
    );
    assert!((600..=601).contains(&polls), "polled {polls} times");
}

#[tokio::test(start_paused = true)]
async fn transient_error_while_polling_is_retried() {
    let transport = Arc::new(MockTransport::new());
    transport
        .on_status(Method::POST, SERVICES, [201])
        .on_status(Method::GET, service_path("api"), [404, 500, 200]);

    handle(&transport, fast_poller()).create().await.unwrap();
    assert_eq!(transport.count(&Method::GET, &service_path("api")), 3);
}
