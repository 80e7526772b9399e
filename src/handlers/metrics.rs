use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, instrument};

use crate::observability::Metrics;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Scrape endpoint for the storefront registry.
///
/// Besides the HTTP and database series this exposes the catalog, cart and
/// checkout operation counters and `orders_created_total` per payment method.
#[instrument(name = "metrics_handler", skip(metrics))]
pub async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> Response {
    let metrics_text = match metrics.encode() {
        Ok(text) => text,
        Err(e) => {
            error!(error = %e, "Failed to encode storefront metrics");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response();
        }
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        metrics_text,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    async fn scrape(metrics: Arc<Metrics>) -> (StatusCode, String, String) {
        let app = Router::new()
            .route("/metrics", get(metrics_handler))
            .with_state(metrics);

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_scrape_after_cash_on_delivery_order() {
        let metrics = Arc::new(Metrics::new().unwrap());

        metrics.record_cart_operation("add_item", true);
        metrics.record_checkout_operation("create", true);
        metrics.record_order_created("CashOnDelivery");
        metrics.record_order_created("CashOnDelivery");

        let (status, content_type, body) = scrape(metrics).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, PROMETHEUS_CONTENT_TYPE);
        assert!(body.contains(r#"orders_created_total{payment_method="CashOnDelivery"} 2"#));
        assert!(body.contains(r#"cart_operations_total{operation="add_item",status="success"} 1"#));
        assert!(body.contains("checkout_operations_total"));
    }

    #[tokio::test]
    async fn test_scrape_includes_catalog_reads() {
        let metrics = Arc::new(Metrics::new().unwrap());

        metrics.record_http_request("GET", "/api/categories/:id/products", 200, 0.042);
        metrics.record_database_operation("list_products", "catalog_product", true, 0.011);
        metrics.record_catalog_operation("list_products", false);

        let (_, _, body) = scrape(metrics).await;

        assert!(body.contains("http_requests_total"));
        assert!(body.contains(r#"table="catalog_product""#));
        assert!(body.contains(r#"catalog_operations_total{operation="list_products",status="error"} 1"#));
    }
}
