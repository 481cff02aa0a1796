//! Test utilities and mocks for Sockrelay
//!
//! A fake upstream SOCKS5 proxy and client-side helpers shared by the
//! integration tests.

#![allow(dead_code)]

use sockrelay::RelayConfig;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub const TEST_USERNAME: &str = "testuser";
pub const TEST_PASSWORD: &str = "testpass";

/// How the fake upstream answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamBehavior {
    /// Accept username/password, then echo every byte
    Echo,
    /// Select "no authentication" instead of username/password
    SelectNoAuth,
    /// Reject every credential
    RejectCredentials,
    /// Authenticate, then close the connection
    CloseAfterAuth,
}

/// Fake upstream SOCKS5 proxy
pub struct FakeUpstream {
    pub addr: SocketAddr,
    authenticated: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl FakeUpstream {
    /// Start a fake upstream on an ephemeral localhost port
    pub async fn start(behavior: UpstreamBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let authenticated = Arc::new(AtomicUsize::new(0));
        let counter = authenticated.clone();

        let task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let counter = counter.clone();
                tokio::spawn(async move {
                    let _ = serve_upstream(stream, behavior, counter).await;
                });
            }
        });

        FakeUpstream {
            addr,
            authenticated,
            task,
        }
    }

    /// Connections that passed authentication so far
    pub fn authenticated(&self) -> usize {
        self.authenticated.load(Ordering::SeqCst)
    }

    /// Relay configuration pointing at this upstream, listening on localhost
    pub fn relay_config(&self) -> RelayConfig {
        let mut config = RelayConfig::new(
            self.addr.ip().to_string(),
            self.addr.port(),
            TEST_USERNAME,
            TEST_PASSWORD,
            Some(0),
        );
        config.listen.bind_addr = IpAddr::V4(Ipv4Addr::LOCALHOST);
        config
    }
}

impl Drop for FakeUpstream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_upstream(
    mut stream: TcpStream,
    behavior: UpstreamBehavior,
    authenticated: Arc<AtomicUsize>,
) -> std::io::Result<()> {
    let mut greeting = [0u8; 4];
    stream.read_exact(&mut greeting).await?;
    assert_eq!(greeting, [0x05, 0x02, 0x00, 0x02]);

    if behavior == UpstreamBehavior::SelectNoAuth {
        stream.write_all(&[0x05, 0x00]).await?;
        return Ok(());
    }
    stream.write_all(&[0x05, 0x02]).await?;

    let mut header = [0u8; 2];
    stream.read_exact(&mut header).await?;
    assert_eq!(header[0], 0x01);
    let mut username = vec![0u8; header[1] as usize];
    stream.read_exact(&mut username).await?;
    let mut plen = [0u8; 1];
    stream.read_exact(&mut plen).await?;
    let mut password = vec![0u8; plen[0] as usize];
    stream.read_exact(&mut password).await?;

    let valid = username == TEST_USERNAME.as_bytes() && password == TEST_PASSWORD.as_bytes();
    if behavior == UpstreamBehavior::RejectCredentials || !valid {
        stream.write_all(&[0x05, 0x01]).await?;
        return Ok(());
    }
    stream.write_all(&[0x05, 0x00]).await?;
    authenticated.fetch_add(1, Ordering::SeqCst);

    if behavior == UpstreamBehavior::CloseAfterAuth {
        return Ok(());
    }

    let (mut reader, mut writer) = stream.split();
    tokio::io::copy(&mut reader, &mut writer).await?;
    Ok(())
}

/// Connect to the relay and complete the no-auth negotiation
pub async fn connect_client(port: u16) -> TcpStream {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    stream.write_all(&[0x05, 0x01, 0x00]).await.unwrap();

    let mut reply = [0u8; 2];
    within(stream.read_exact(&mut reply)).await.unwrap();
    assert_eq!(reply, [0x05, 0x00]);
    stream
}

/// Assert the peer closed the stream (EOF or reset) without sending data
pub async fn assert_closed(stream: &mut TcpStream) {
    let mut buf = [0u8; 16];
    match within(stream.read(&mut buf)).await {
        Ok(0) | Err(_) => {}
        Ok(n) => panic!("expected closed stream, got {} bytes: {:?}", n, &buf[..n]),
    }
}

/// Fail the test if `fut` takes longer than a couple of seconds
pub async fn within<F: std::future::Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(2), fut)
        .await
        .expect("operation timed out")
}
