use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tonic::codec::CompressionEncoding;
use tonic::transport::Channel;
use tonic_health::server::health_reporter;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::mock::MockDatastore;
use crate::proto::v1::datastore_server::DatastoreServer;
use crate::Error;
use crate::Result;

/// An in-process gRPC server, listening on the local loopback interface.
///
/// Servers are for testing only and are not intended to be used in
/// production code.
///
/// To create one, bind a listener, then register the mock and start
/// serving:
///
/// ```ignore
/// let mut srv = TestServer::bind().await?;
/// srv.start(mock).await?;
/// let channel = connect(&srv.addr()).await?;
/// ```
///
/// The bound address is fixed for the server's lifetime. Closing is
/// terminal: a closed server cannot be restarted.
pub struct TestServer {
    addr: SocketAddr,
    listener: Option<TcpListener>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Binds a listener on a system-chosen loopback port.
    pub async fn bind() -> Result<Self> {
        Self::bind_port(0).await
    }

    /// Binds a listener on a specific loopback port.
    pub async fn bind_port(port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let addr = listener.local_addr()?;
        debug!("test server bound on {addr}");

        Ok(Self {
            addr,
            listener: Some(listener),
            shutdown_tx: None,
        })
    }

    /// `host:port` of the bound socket.
    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    /// Numeric port of the bound socket.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// `http://host:port` form accepted by [`Channel::from_shared`].
    pub fn uri(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Registers `mock` as the Datastore handler and starts accepting
    /// connections.
    ///
    /// The accept loop runs on a detached task; serving errors after this
    /// returns are logged, not propagated. The health service reports the
    /// Datastore service as SERVING so readiness probes work against the
    /// mock as they would against a real server.
    pub async fn start(&mut self, mock: Arc<MockDatastore>) -> Result<()> {
        let listener = self.listener.take().ok_or(Error::AlreadyStarted)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        let (mut health_reporter, health_service) = health_reporter();
        health_reporter.set_serving::<DatastoreServer<MockDatastore>>().await;

        let addr = self.addr;
        tokio::spawn(async move {
            let served = tonic::transport::Server::builder()
                .add_service(health_service)
                .add_service(
                    DatastoreServer::from_arc(mock)
                        .accept_compressed(CompressionEncoding::Gzip)
                        .send_compressed(CompressionEncoding::Gzip),
                )
                .serve_with_incoming_shutdown(
                    tokio_stream::wrappers::TcpListenerStream::new(listener),
                    async {
                        shutdown_rx.await.ok();
                    },
                )
                .await;
            if let Err(e) = served {
                error!("test server on {addr} stopped serving: {e}");
            }
        });

        info!("test server serving on {}", self.addr);
        Ok(())
    }

    /// Stops serving and releases the socket.
    pub fn close(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.listener = None;
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.close();
    }
}

/// Opens a plaintext client channel to `addr` (a `host:port` string).
pub async fn connect(addr: &str) -> Result<Channel> {
    let channel = Channel::from_shared(format!("http://{addr}"))?.connect().await?;
    Ok(channel)
}
