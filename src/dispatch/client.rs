use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use bytes::Bytes;
use tower::Service;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Transport backed by one shared [`reqwest::Client`] and its connection pool.
#[derive(Debug, Clone)]
pub struct DefaultHttpClient {
    client: reqwest::Client,
}
impl DefaultHttpClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().user_agent(APP_USER_AGENT).build()?;
        Ok(Self { client })
    }
}

impl Service<http::Request<Bytes>> for DefaultHttpClient {
    type Response = http::Response<Bytes>;
    type Error = reqwest::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.client.poll_ready(cx)
    }

    fn call(&mut self, request: http::Request<Bytes>) -> Self::Future {
        match request.try_into() {
            Ok(req) => {
                let fut = self.client.call(req);
                Box::pin(async {
                    let res = fut.await?;
                    let (status, version, headers) = (res.status(), res.version(), res.headers().clone());
                    let mut response = http::Response::new(res.bytes().await?);
                    *response.status_mut() = status;
                    *response.version_mut() = version;
                    *response.headers_mut() = headers;
                    Ok(response)
                })
            }
            Err(e) => Box::pin(async { Err(e) }),
        }
    }
}
