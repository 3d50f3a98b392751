//! Calls that decode the response body as JSON

use std::collections::HashMap;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::http::client::HttpClient;
use crate::types::{BodyMode, CallOptions, Params};
use crate::Result;

/// Form-encoded call whose response is decoded into `T`
///
/// When `options.debug_writer` is set the raw body is copied to it as
/// `body: <bytes>\n` before decoding.
pub async fn http_call_json<T: DeserializeOwned>(
    client: &HttpClient,
    url: &str,
    method: &str,
    params: impl Into<Params>,
    headers: &HashMap<String, String>,
    options: &CallOptions,
) -> Result<(StatusCode, T)> {
    call_json(client, url, method, params.into(), headers, BodyMode::Form, options).await
}

/// JSON-encoded call whose response is decoded into `T`
pub async fn json_call_json<T: DeserializeOwned>(
    client: &HttpClient,
    url: &str,
    method: &str,
    params: impl Into<Params>,
    headers: &HashMap<String, String>,
    options: &CallOptions,
) -> Result<(StatusCode, T)> {
    call_json(client, url, method, params.into(), headers, BodyMode::Json, options).await
}

async fn call_json<T: DeserializeOwned>(
    client: &HttpClient,
    url: &str,
    method: &str,
    params: Params,
    headers: &HashMap<String, String>,
    mode: BodyMode,
    options: &CallOptions,
) -> Result<(StatusCode, T)> {
    // The decoder tees the body; the transport must not tee it again.
    let mut streaming = options.clone().without_body_read();
    streaming.debug_writer = None;
    let response = client
        .call(url, method, params, headers, mode, &streaming)
        .await?;

    let status = response.status();
    let value = response.json(options.debug_writer.as_ref()).await?;
    Ok((status, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::client::HttpClientConfig;
    use crate::http::error::TransportError;
    use crate::http::response::Response;
    use crate::http::transport::{Transport, TransportRequest};
    use crate::Error;
    use async_trait::async_trait;
    use bytes::Bytes;
    use reqwest::header::HeaderMap;
    use serde::Deserialize;
    use std::sync::{Arc, Mutex};

    struct FixedBody(&'static [u8]);

    #[async_trait]
    impl Transport for FixedBody {
        async fn execute(
            &self,
            request: TransportRequest<'_>,
        ) -> std::result::Result<Response, TransportError> {
            Ok(Response::buffered(
                StatusCode::CREATED,
                request.url,
                HeaderMap::new(),
                Bytes::from_static(self.0),
            ))
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    fn client(body: &'static [u8]) -> HttpClient {
        HttpClient::with_transport(Arc::new(FixedBody(body)), HttpClientConfig::default())
    }

    #[tokio::test]
    async fn test_decodes_body_and_keeps_status() {
        let (status, item): (StatusCode, Item) = json_call_json(
            &client(br#"{"id":7}"#),
            "http://api.example/items",
            "POST",
            Params::Text("x".into()),
            &HashMap::new(),
            &CallOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(item, Item { id: 7 });
    }

    #[tokio::test]
    async fn test_debug_writer_receives_body_once() {
        let sink = Arc::new(Mutex::new(Vec::<u8>::new()));
        let writer: crate::types::DebugWriter = sink.clone();
        let options = CallOptions::default().with_debug_writer(writer);

        let _: (StatusCode, Item) = http_call_json(
            &client(br#"{"id":1}"#),
            "http://api.example/items",
            "GET",
            Params::Empty,
            &HashMap::new(),
            &options,
        )
        .await
        .unwrap();

        let written = sink.lock().unwrap().clone();
        assert_eq!(written, b"body: {\"id\":1}\n");
    }

    #[tokio::test]
    async fn test_invalid_json_is_json_error() {
        let err = http_call_json::<Item>(
            &client(b"not json"),
            "http://api.example/items",
            "GET",
            Params::Empty,
            &HashMap::new(),
            &CallOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
    }
}
