//! Plain-HTTP scan endpoint.

use alloc::format;
use alloc::string::String;
use alloc::vec;
use defmt::{debug, info};
use embassy_net::dns::DnsSocket;
use embassy_net::tcp::client::{TcpClient, TcpClientState};
use embassy_net::Stack;
use reqwless::client::HttpClient;
use reqwless::headers::ContentType;
use reqwless::request::{Method, RequestBuilder};
use weighstation::{HttpReply, ScanEndpoint, ScanRequest, TransportError};

/// Response headers plus the (small) JSON reply.
const RX_BUF_LEN: usize = 4096;

pub struct HttpEndpoint {
    stack: Stack<'static>,
    base_url: String,
}

impl HttpEndpoint {
    pub fn new(stack: Stack<'static>, base_url: impl Into<String>) -> Self {
        Self {
            stack,
            base_url: base_url.into(),
        }
    }
}

impl ScanEndpoint for HttpEndpoint {
    async fn post(&mut self, request: &ScanRequest) -> Result<HttpReply, TransportError> {
        let url = request.url(&self.base_url);
        info!("http: POST {=str}", url.as_str());

        let state: TcpClientState<1, 1024, 1024> = TcpClientState::new();
        let tcp = TcpClient::new(self.stack, &state);
        let dns = DnsSocket::new(self.stack);
        let mut client = HttpClient::new(&tcp, &dns);
        let mut rx = vec![0u8; RX_BUF_LEN];

        let mut req = client
            .request(Method::POST, &url)
            .await
            .map_err(transport)?
            .body(b"{}".as_slice())
            .content_type(ContentType::ApplicationJson);
        let response = req.send(&mut rx).await.map_err(transport)?;
        let status = response.status.0;
        let body = response.body().read_to_end().await.map_err(transport)?.to_vec();
        debug!("http: {=u16}, {=usize} byte body", status, body.len());

        Ok(HttpReply { status, body })
    }
}

fn transport(err: reqwless::Error) -> TransportError {
    TransportError::new(format!("{:?}", err))
}
