use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tonic::transport::Channel;
use tonic::Request;
use tonic::Response;
use tonic::Status;
use tracing::debug;

use crate::proto::v1::datastore_client::DatastoreClient;
use crate::proto::v1::datastore_server::Datastore;
use crate::proto::v1::AllocateIdsRequest;
use crate::proto::v1::AllocateIdsResponse;
use crate::proto::v1::BeginTransactionRequest;
use crate::proto::v1::BeginTransactionResponse;
use crate::proto::v1::CommitRequest;
use crate::proto::v1::CommitResponse;
use crate::proto::v1::LookupRequest;
use crate::proto::v1::LookupResponse;
use crate::proto::v1::ReserveIdsRequest;
use crate::proto::v1::ReserveIdsResponse;
use crate::proto::v1::RollbackRequest;
use crate::proto::v1::RollbackResponse;
use crate::proto::v1::RunAggregationQueryRequest;
use crate::proto::v1::RunAggregationQueryResponse;
use crate::proto::v1::RunQueryRequest;
use crate::proto::v1::RunQueryResponse;
use crate::server::connect;
use crate::server::TestServer;
use crate::Result;

/// Hook applied to a received request before comparison, normalizing
/// non-deterministic fields such as generated ids.
pub type AdjustFn = Box<dyn Fn(&mut DatastoreRequest) + Send + Sync>;

/// A request to any of the Datastore service methods.
#[derive(Debug, Clone, PartialEq)]
pub enum DatastoreRequest {
    Lookup(LookupRequest),
    RunQuery(RunQueryRequest),
    RunAggregationQuery(RunAggregationQueryRequest),
    BeginTransaction(BeginTransactionRequest),
    Commit(CommitRequest),
    Rollback(RollbackRequest),
    AllocateIds(AllocateIdsRequest),
    ReserveIds(ReserveIdsRequest),
}

impl DatastoreRequest {
    /// Name of the service method the request belongs to.
    pub fn method(&self) -> &'static str {
        match self {
            DatastoreRequest::Lookup(_) => "lookup",
            DatastoreRequest::RunQuery(_) => "run_query",
            DatastoreRequest::RunAggregationQuery(_) => "run_aggregation_query",
            DatastoreRequest::BeginTransaction(_) => "begin_transaction",
            DatastoreRequest::Commit(_) => "commit",
            DatastoreRequest::Rollback(_) => "rollback",
            DatastoreRequest::AllocateIds(_) => "allocate_ids",
            DatastoreRequest::ReserveIds(_) => "reserve_ids",
        }
    }
}

impl From<LookupRequest> for DatastoreRequest {
    fn from(req: LookupRequest) -> Self {
        DatastoreRequest::Lookup(req)
    }
}
impl From<RunQueryRequest> for DatastoreRequest {
    fn from(req: RunQueryRequest) -> Self {
        DatastoreRequest::RunQuery(req)
    }
}
impl From<RunAggregationQueryRequest> for DatastoreRequest {
    fn from(req: RunAggregationQueryRequest) -> Self {
        DatastoreRequest::RunAggregationQuery(req)
    }
}
impl From<BeginTransactionRequest> for DatastoreRequest {
    fn from(req: BeginTransactionRequest) -> Self {
        DatastoreRequest::BeginTransaction(req)
    }
}
impl From<CommitRequest> for DatastoreRequest {
    fn from(req: CommitRequest) -> Self {
        DatastoreRequest::Commit(req)
    }
}
impl From<RollbackRequest> for DatastoreRequest {
    fn from(req: RollbackRequest) -> Self {
        DatastoreRequest::Rollback(req)
    }
}
impl From<AllocateIdsRequest> for DatastoreRequest {
    fn from(req: AllocateIdsRequest) -> Self {
        DatastoreRequest::AllocateIds(req)
    }
}
impl From<ReserveIdsRequest> for DatastoreRequest {
    fn from(req: ReserveIdsRequest) -> Self {
        DatastoreRequest::ReserveIds(req)
    }
}

/// A reply from any of the Datastore service methods.
#[derive(Debug, Clone, PartialEq)]
pub enum DatastoreReply {
    Lookup(LookupResponse),
    RunQuery(RunQueryResponse),
    RunAggregationQuery(RunAggregationQueryResponse),
    BeginTransaction(BeginTransactionResponse),
    Commit(CommitResponse),
    Rollback(RollbackResponse),
    AllocateIds(AllocateIdsResponse),
    ReserveIds(ReserveIdsResponse),
}

impl DatastoreReply {
    /// Name of the service method the reply belongs to.
    pub fn method(&self) -> &'static str {
        match self {
            DatastoreReply::Lookup(_) => "lookup",
            DatastoreReply::RunQuery(_) => "run_query",
            DatastoreReply::RunAggregationQuery(_) => "run_aggregation_query",
            DatastoreReply::BeginTransaction(_) => "begin_transaction",
            DatastoreReply::Commit(_) => "commit",
            DatastoreReply::Rollback(_) => "rollback",
            DatastoreReply::AllocateIds(_) => "allocate_ids",
            DatastoreReply::ReserveIds(_) => "reserve_ids",
        }
    }
}

impl From<LookupResponse> for DatastoreReply {
    fn from(resp: LookupResponse) -> Self {
        DatastoreReply::Lookup(resp)
    }
}
impl From<RunQueryResponse> for DatastoreReply {
    fn from(resp: RunQueryResponse) -> Self {
        DatastoreReply::RunQuery(resp)
    }
}
impl From<RunAggregationQueryResponse> for DatastoreReply {
    fn from(resp: RunAggregationQueryResponse) -> Self {
        DatastoreReply::RunAggregationQuery(resp)
    }
}
impl From<BeginTransactionResponse> for DatastoreReply {
    fn from(resp: BeginTransactionResponse) -> Self {
        DatastoreReply::BeginTransaction(resp)
    }
}
impl From<CommitResponse> for DatastoreReply {
    fn from(resp: CommitResponse) -> Self {
        DatastoreReply::Commit(resp)
    }
}
impl From<RollbackResponse> for DatastoreReply {
    fn from(resp: RollbackResponse) -> Self {
        DatastoreReply::Rollback(resp)
    }
}
impl From<AllocateIdsResponse> for DatastoreReply {
    fn from(resp: AllocateIdsResponse) -> Self {
        DatastoreReply::AllocateIds(resp)
    }
}
impl From<ReserveIdsResponse> for DatastoreReply {
    fn from(resp: ReserveIdsResponse) -> Self {
        DatastoreReply::ReserveIds(resp)
    }
}

/// One scripted interaction: the request the client is expected to send and
/// the reply the mock serves for it.
struct Expectation {
    want: Option<DatastoreRequest>,
    reply: std::result::Result<DatastoreReply, Status>,
    adjust: Option<AdjustFn>,
}

/// Scripted Datastore mock for validating the requests a client produces.
///
/// Expectations are consumed strictly in FIFO order, one per incoming call.
/// Script the queue before traffic starts; the internal lock guards
/// individual pops only, not whole-test phases, so mutating the queue while
/// calls are in flight is unsupported.
#[derive(Default)]
pub struct MockDatastore {
    queue: Mutex<VecDeque<Expectation>>,
}

impl MockDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a (request, reply) expectation.
    ///
    /// The incoming request is compared structurally with `want`; pass
    /// `None` to disable the check. The reply is either a response message
    /// or a [`Status`] to fail the RPC with.
    pub fn queue(
        &self,
        want: Option<DatastoreRequest>,
        reply: std::result::Result<DatastoreReply, Status>,
    ) {
        self.push(Expectation {
            want,
            reply,
            adjust: None,
        });
    }

    /// Like [`MockDatastore::queue`], but `adjust` runs on the received
    /// request before the comparison, e.g. to zero out randomly generated
    /// fields.
    pub fn queue_adjust(
        &self,
        want: Option<DatastoreRequest>,
        reply: std::result::Result<DatastoreReply, Status>,
        adjust: impl Fn(&mut DatastoreRequest) + Send + Sync + 'static,
    ) {
        self.push(Expectation {
            want,
            reply,
            adjust: Some(Box::new(adjust)),
        });
    }

    /// Drops all pending expectations, so the mock can be reused between
    /// test cases.
    pub fn reset(&self) {
        self.queue.lock().clear();
    }

    /// Number of expectations not yet consumed.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    fn push(&self, expectation: Expectation) {
        self.queue.lock().push_back(expectation);
    }

    /// Pops the next expectation and validates `got` against it.
    ///
    /// # Panics
    ///
    /// When the queue is empty. A call arriving with nothing scripted is a
    /// test-setup defect, not a runtime condition.
    fn pop(&self, mut got: DatastoreRequest) -> std::result::Result<DatastoreReply, Status> {
        let Some(expectation) = self.queue.lock().pop_front() else {
            panic!("MockDatastore: out of expectations, saw {}", got.method());
        };

        if let Some(want) = expectation.want {
            if let Some(adjust) = &expectation.adjust {
                adjust(&mut got);
            }

            if got != want {
                return Err(Status::unknown(format!(
                    "MockDatastore: bad {} request\n-got\n+want\n-{:#?}\n+{:#?}",
                    got.method(),
                    got,
                    want,
                )));
            }
        }

        debug!("MockDatastore: consumed one {} expectation", got.method());
        expectation.reply
    }
}

fn reply_type_mismatch(method: &'static str, reply: &DatastoreReply) -> Status {
    Status::internal(format!(
        "MockDatastore: queued {} reply served to {}",
        reply.method(),
        method,
    ))
}

#[tonic::async_trait]
impl Datastore for MockDatastore {
    async fn lookup(
        &self,
        request: Request<LookupRequest>,
    ) -> std::result::Result<Response<LookupResponse>, Status> {
        match self.pop(request.into_inner().into())? {
            DatastoreReply::Lookup(resp) => Ok(Response::new(resp)),
            other => Err(reply_type_mismatch("lookup", &other)),
        }
    }

    async fn run_query(
        &self,
        request: Request<RunQueryRequest>,
    ) -> std::result::Result<Response<RunQueryResponse>, Status> {
        match self.pop(request.into_inner().into())? {
            DatastoreReply::RunQuery(resp) => Ok(Response::new(resp)),
            other => Err(reply_type_mismatch("run_query", &other)),
        }
    }

    async fn run_aggregation_query(
        &self,
        request: Request<RunAggregationQueryRequest>,
    ) -> std::result::Result<Response<RunAggregationQueryResponse>, Status> {
        match self.pop(request.into_inner().into())? {
            DatastoreReply::RunAggregationQuery(resp) => Ok(Response::new(resp)),
            other => Err(reply_type_mismatch("run_aggregation_query", &other)),
        }
    }

    async fn begin_transaction(
        &self,
        request: Request<BeginTransactionRequest>,
    ) -> std::result::Result<Response<BeginTransactionResponse>, Status> {
        match self.pop(request.into_inner().into())? {
            DatastoreReply::BeginTransaction(resp) => Ok(Response::new(resp)),
            other => Err(reply_type_mismatch("begin_transaction", &other)),
        }
    }

    async fn commit(
        &self,
        request: Request<CommitRequest>,
    ) -> std::result::Result<Response<CommitResponse>, Status> {
        match self.pop(request.into_inner().into())? {
            DatastoreReply::Commit(resp) => Ok(Response::new(resp)),
            other => Err(reply_type_mismatch("commit", &other)),
        }
    }

    async fn rollback(
        &self,
        request: Request<RollbackRequest>,
    ) -> std::result::Result<Response<RollbackResponse>, Status> {
        match self.pop(request.into_inner().into())? {
            DatastoreReply::Rollback(resp) => Ok(Response::new(resp)),
            other => Err(reply_type_mismatch("rollback", &other)),
        }
    }

    async fn allocate_ids(
        &self,
        request: Request<AllocateIdsRequest>,
    ) -> std::result::Result<Response<AllocateIdsResponse>, Status> {
        match self.pop(request.into_inner().into())? {
            DatastoreReply::AllocateIds(resp) => Ok(Response::new(resp)),
            other => Err(reply_type_mismatch("allocate_ids", &other)),
        }
    }

    async fn reserve_ids(
        &self,
        request: Request<ReserveIdsRequest>,
    ) -> std::result::Result<Response<ReserveIdsResponse>, Status> {
        match self.pop(request.into_inner().into())? {
            DatastoreReply::ReserveIds(resp) => Ok(Response::new(resp)),
            other => Err(reply_type_mismatch("reserve_ids", &other)),
        }
    }
}

/// Builds the whole harness in one call: a [`TestServer`] serving a fresh
/// mock, plus a client connected to it.
///
/// Dropping the returned server stops it; call [`MockDatastore::reset`]
/// between test cases sharing one harness.
pub async fn new_mock_datastore() -> Result<(DatastoreClient<Channel>, Arc<MockDatastore>, TestServer)> {
    let mut server = TestServer::bind().await?;
    let mock = Arc::new(MockDatastore::new());
    server.start(Arc::clone(&mock)).await?;

    let channel = connect(&server.addr()).await?;
    Ok((DatastoreClient::new(channel), mock, server))
}
