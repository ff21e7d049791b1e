//! Client for the `google.longrunning.Operations` API.
//!
//! [`OperationsClient`] turns each typed request into exactly one unary call on
//! a [`Transport`] and hands back a [`Call`]: await it for the response, or give
//! it a completion handler. The client keeps no state besides its transport and
//! default [`CallOptions`], so clones can be shared freely between tasks.
//!
//! ```no_run
//! # async fn example() -> Result<(), lro_client::LroError> {
//! use lro_client::{ClientConfig, OperationsClient};
//! use protos::longrunning::GetOperationRequest;
//!
//! let client = OperationsClient::connect(&ClientConfig::new("http://127.0.0.1:50051")).await?;
//! let operation = client
//!     .get_operation(GetOperationRequest { name: "operations/1234".into() }, None)
//!     .await?;
//! println!("{} done={}", operation.name, operation.done);
//! # Ok(())
//! # }
//! ```

use prost::Message;
use protos::longrunning::{
    CancelOperationRequest, DeleteOperationRequest, GetOperationRequest, ListOperationsRequest,
    ListOperationsResponse, Operation,
};
use std::sync::Arc;
use tonic::Request;
use tracing::Instrument;

mod call;
mod config;
mod error;
mod options;
mod poll;
mod state;
mod transport;

pub use call::{Call, CallCanceller};
pub use config::ClientConfig;
pub use error::LroError;
pub use options::{CallOptions, API_KEY_HEADER, CLIENT_ID_HEADER};
pub use state::OperationState;
pub use transport::{GrpcTransport, LocalTransport, Method, Transport};

#[derive(Clone, Debug)]
pub struct OperationsClient<T = GrpcTransport> {
    transport: T,
    defaults: Arc<CallOptions>,
}

impl OperationsClient<GrpcTransport> {
    /// Connect to the host named in `config`, using its headers and timeout as
    /// defaults for every call.
    pub async fn connect(config: &ClientConfig) -> Result<Self, LroError> {
        let defaults = config.call_options()?;
        let transport = GrpcTransport::connect(&config.host).await?;
        Ok(OperationsClient::with_options(transport, defaults))
    }
}

impl<T: Transport> OperationsClient<T> {
    pub fn new(transport: T) -> Self {
        OperationsClient::with_options(transport, CallOptions::default())
    }

    pub fn with_options(transport: T, defaults: CallOptions) -> Self {
        OperationsClient {
            transport,
            defaults: Arc::new(defaults),
        }
    }

    pub fn defaults(&self) -> &CallOptions {
        &self.defaults
    }

    fn call<Req, Resp>(&self, method: Method, message: Req, options: Option<CallOptions>) -> Call<Resp>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        let mut request = Request::new(message);
        if let Err(err) = self.defaults.merge(options).apply(&mut request) {
            return Call::ready(Err(err));
        }

        let transport = self.transport.clone();
        let span = tracing::info_span!("lro call", %method);
        Call::spawn(
            async move {
                tracing::debug!("sending request");
                let response = transport.unary(method, request).await.map_err(|status| {
                    tracing::debug!(code = ?status.code(), "call failed");
                    LroError::from(status)
                })?;
                Ok(response.into_inner())
            }
            .instrument(span),
        )
    }

    /// Gets the latest state of a long-running operation.
    pub fn get_operation(
        &self,
        request: GetOperationRequest,
        options: Option<CallOptions>,
    ) -> Call<Operation> {
        self.call(Method::GetOperation, request, options)
    }

    /// Lists operations that match the filter in the request.
    ///
    /// A server without listing support fails with [`LroError::Unimplemented`]
    /// rather than returning an empty page.
    pub fn list_operations(
        &self,
        request: ListOperationsRequest,
        options: Option<CallOptions>,
    ) -> Call<ListOperationsResponse> {
        self.call(Method::ListOperations, request, options)
    }

    /// Starts best-effort cancellation of an operation. Success only means the
    /// server accepted the request; poll [`Self::get_operation`] to see how the
    /// operation ended.
    pub fn cancel_operation(
        &self,
        request: CancelOperationRequest,
        options: Option<CallOptions>,
    ) -> Call<()> {
        self.call(Method::CancelOperation, request, options)
    }

    /// Tells the server the client is no longer interested in the operation.
    /// The operation keeps running.
    pub fn delete_operation(
        &self,
        request: DeleteOperationRequest,
        options: Option<CallOptions>,
    ) -> Call<()> {
        self.call(Method::DeleteOperation, request, options)
    }
}
