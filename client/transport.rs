use async_trait::async_trait;
use prost::Message;
use protos::longrunning::{
    CancelOperationRequest, DeleteOperationRequest, GetOperationRequest, ListOperationsRequest,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UnixStream;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::metadata::MetadataMap;
use tonic::transport::{Channel, Endpoint, Uri};
use tonic::{Request, Response, Status};

use crate::LroError;

/// Placeholder authority for channels whose connector ignores the URI.
static UDS_AUTHORITY: &str = "http://lro.local";

static GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

/// The unary methods of `google.longrunning.Operations`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    GetOperation,
    ListOperations,
    CancelOperation,
    DeleteOperation,
}

impl Method {
    pub fn path(&self) -> &'static str {
        match self {
            Method::GetOperation => "/google.longrunning.Operations/GetOperation",
            Method::ListOperations => "/google.longrunning.Operations/ListOperations",
            Method::CancelOperation => "/google.longrunning.Operations/CancelOperation",
            Method::DeleteOperation => "/google.longrunning.Operations/DeleteOperation",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Issues one unary call: a method, an encodable request and a decodable
/// response. Wire format, connection handling and authentication all live
/// behind this trait.
#[async_trait]
pub trait Transport: Clone + Send + Sync + 'static {
    async fn unary<Req, Resp>(
        &self,
        method: Method,
        request: Request<Req>,
    ) -> Result<Response<Resp>, Status>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static;
}

/// gRPC over a tonic [`Channel`].
#[derive(Clone, Debug)]
pub struct GrpcTransport {
    channel: Channel,
}

impl GrpcTransport {
    pub fn new(channel: Channel) -> Self {
        GrpcTransport { channel }
    }

    /// Connect to `host`, either `http(s)://host:port` or `unix:///path/to.sock`.
    pub async fn connect(host: &str) -> Result<Self, LroError> {
        let channel = match host.strip_prefix("unix://") {
            Some(path) => {
                let path = path.to_string();
                Endpoint::from_static(UDS_AUTHORITY)
                    .connect_with_connector(tower::service_fn(move |_: Uri| {
                        UnixStream::connect(path.clone())
                    }))
                    .await?
            }
            None => {
                let uri = Uri::from_str(host)
                    .map_err(|e| LroError::Config(format!("host {host:?}: {e}")))?;
                Endpoint::from(uri).connect().await?
            }
        };
        Ok(GrpcTransport::new(channel))
    }
}

#[async_trait]
impl Transport for GrpcTransport {
    async fn unary<Req, Resp>(
        &self,
        method: Method,
        request: Request<Req>,
    ) -> Result<Response<Resp>, Status>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| Status::unknown(format!("Service was not ready: {e}")))?;
        let codec = tonic::codec::ProstCodec::<Req, Resp>::default();
        grpc.unary(request, PathAndQuery::from_static(method.path()), codec)
            .await
    }
}

/// Calls an in-process [`protos::Operations`] implementation.
///
/// Requests and responses still go through protobuf encoding, so the server
/// sees exactly the bytes a remote peer would have sent.
pub struct LocalTransport<S> {
    service: Arc<S>,
}

impl<S> Clone for LocalTransport<S> {
    fn clone(&self) -> Self {
        LocalTransport {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S: protos::Operations> LocalTransport<S> {
    pub fn new(service: S) -> Self {
        LocalTransport {
            service: Arc::new(service),
        }
    }

    pub fn from_arc(service: Arc<S>) -> Self {
        LocalTransport { service }
    }
}

fn recode<A: Message, B: Message + Default>(message: &A) -> Result<B, Status> {
    B::decode(message.encode_to_vec().as_slice())
        .map_err(|e| Status::internal(format!("Failed to decode message: {e}")))
}

fn recode_request<A: Message, B: Message + Default>(
    request: Request<A>,
) -> Result<Request<B>, Status> {
    let mut decoded = Request::new(recode(request.get_ref())?);
    *decoded.metadata_mut() = request.metadata().clone();
    Ok(decoded)
}

fn recode_response<A: Message, B: Message + Default>(
    response: Response<A>,
) -> Result<Response<B>, Status> {
    let mut decoded = Response::new(recode(response.get_ref())?);
    *decoded.metadata_mut() = response.metadata().clone();
    Ok(decoded)
}

/// Decode the `grpc-timeout` header that [`Request::set_timeout`] writes.
fn grpc_timeout(metadata: &MetadataMap) -> Option<Duration> {
    let value = metadata.get(GRPC_TIMEOUT_HEADER)?.to_str().ok()?;
    let (amount, unit) = value.split_at(value.len().checked_sub(1)?);
    let amount: u64 = amount.parse().ok()?;
    match unit {
        "H" => Some(Duration::from_secs(amount * 60 * 60)),
        "M" => Some(Duration::from_secs(amount * 60)),
        "S" => Some(Duration::from_secs(amount)),
        "m" => Some(Duration::from_millis(amount)),
        "u" => Some(Duration::from_micros(amount)),
        "n" => Some(Duration::from_nanos(amount)),
        _ => None,
    }
}

impl<S: protos::Operations> LocalTransport<S> {
    async fn dispatch<Req, Resp>(
        &self,
        method: Method,
        request: Request<Req>,
    ) -> Result<Response<Resp>, Status>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        let service = &self.service;
        match method {
            Method::GetOperation => {
                let request = recode_request::<_, GetOperationRequest>(request)?;
                recode_response(service.get_operation(request).await?)
            }
            Method::ListOperations => {
                let request = recode_request::<_, ListOperationsRequest>(request)?;
                recode_response(service.list_operations(request).await?)
            }
            Method::CancelOperation => {
                let request = recode_request::<_, CancelOperationRequest>(request)?;
                recode_response(service.cancel_operation(request).await?)
            }
            Method::DeleteOperation => {
                let request = recode_request::<_, DeleteOperationRequest>(request)?;
                recode_response(service.delete_operation(request).await?)
            }
        }
    }
}

#[async_trait]
impl<S: protos::Operations> Transport for LocalTransport<S> {
    async fn unary<Req, Resp>(
        &self,
        method: Method,
        request: Request<Req>,
    ) -> Result<Response<Resp>, Status>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        // Nothing on the wire enforces the deadline here, so do it locally.
        match grpc_timeout(request.metadata()) {
            Some(timeout) => tokio::time::timeout(timeout, self.dispatch(method, request))
                .await
                .map_err(|_| {
                    Status::deadline_exceeded(format!("{method} timed out after {timeout:?}"))
                })?,
            None => self.dispatch(method, request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_back_the_timeout_tonic_writes() {
        for timeout in [
            Duration::from_millis(50),
            Duration::from_secs(3),
            Duration::from_secs(2 * 60 * 60),
        ] {
            let mut request = Request::new(());
            request.set_timeout(timeout);
            assert_eq!(grpc_timeout(request.metadata()), Some(timeout));
        }
        assert_eq!(grpc_timeout(Request::new(()).metadata()), None);
    }

    #[test]
    fn ignores_malformed_timeouts() {
        for value in ["", "10", "10x", "abcS"] {
            let mut request = Request::new(());
            request
                .metadata_mut()
                .insert(GRPC_TIMEOUT_HEADER, value.parse().unwrap());
            assert_eq!(grpc_timeout(request.metadata()), None, "{value:?}");
        }
    }
}
