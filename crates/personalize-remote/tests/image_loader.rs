//! HTTP contract tests for the image loader.

use personalize_remote::{HttpImageLoader, ImageLoader, RemoteError};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn loader_for(server: &MockServer) -> HttpImageLoader {
    HttpImageLoader::new()
        .expect("loader")
        .with_base_url(Url::parse(&server.uri()).expect("mock uri"))
}

#[tokio::test]
async fn test_image_content_type_loads() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images/hero.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(vec![0xff, 0xd8]),
        )
        .mount(&server)
        .await;

    loader_for(&server)
        .load("/images/hero.jpg")
        .await
        .expect("image");
}

#[tokio::test]
async fn test_missing_content_type_is_not_an_image() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images/hero.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xd8]))
        .mount(&server)
        .await;

    let err = loader_for(&server)
        .load("/images/hero.jpg")
        .await
        .unwrap_err();
    match err {
        RemoteError::NotAnImage { src, content_type } => {
            assert_eq!(src, "/images/hero.jpg");
            assert!(content_type.is_empty());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_html_response_is_not_an_image() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
        .mount(&server)
        .await;

    let err = loader_for(&server).load("/missing.jpg").await.unwrap_err();
    assert!(matches!(err, RemoteError::NotAnImage { .. }));
}
