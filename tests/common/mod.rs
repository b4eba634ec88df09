//! Shared utilities for integration testing.
//!
//! Every helper binds an ephemeral port and returns the address plus a log of
//! what it saw, so tests can assert which hop a request went through.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Request lines (or destinations) observed by a mock.
pub type Seen = Arc<Mutex<Vec<String>>>;

pub fn seen(log: &Seen) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Read an HTTP request head and return its lines.
async fn read_request_head(socket: &mut TcpStream) -> Vec<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf)
        .lines()
        .take_while(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read an HTTP request head and return its first line.
async fn read_request_line(socket: &mut TcpStream) -> String {
    read_request_head(socket).await.into_iter().next().unwrap_or_default()
}

async fn write_response(socket: &mut TcpStream, status: u16, body: &str) {
    let response = format!(
        "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Start a mock backend that answers every request with `status` and `body`.
pub async fn start_mock_backend(status: u16, body: &'static str) -> (SocketAddr, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log: Seen = Arc::default();
    let seen_by_task = log.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let log = seen_by_task.clone();
            tokio::spawn(async move {
                let line = read_request_line(&mut socket).await;
                log.lock().unwrap().push(line);
                write_response(&mut socket, status, body).await;
            });
        }
    });

    (addr, log)
}

/// Start a backend that accepts connections and never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _held = socket;
                tokio::time::sleep(Duration::from_secs(60)).await;
            });
        }
    });
    addr
}

/// Address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Start a mock HTTP forward proxy.
///
/// It records the request line (absolute-form for proxied plain HTTP) and
/// answers itself instead of forwarding.
pub async fn start_http_proxy(body: &'static str) -> (SocketAddr, Seen) {
    start_mock_backend(200, body).await
}

/// Start a mock HTTP forward proxy that records its `Proxy-Authorization`
/// header (or `<none>`) for every request.
pub async fn start_auth_recording_proxy(body: &'static str) -> (SocketAddr, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log: Seen = Arc::default();
    let seen_by_task = log.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let log = seen_by_task.clone();
            tokio::spawn(async move {
                let head = read_request_head(&mut socket).await;
                let auth = head
                    .iter()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("proxy-authorization")
                            .then(|| value.trim().to_string())
                    })
                    .unwrap_or_else(|| "<none>".to_string());
                log.lock().unwrap().push(auth);
                write_response(&mut socket, 200, body).await;
            });
        }
    });

    (addr, log)
}

/// Start a mock HTTP proxy for TLS targets.
///
/// Records the `CONNECT host:port` request line and refuses the tunnel, so
/// no TLS handshake is attempted.
pub async fn start_connect_proxy() -> (SocketAddr, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log: Seen = Arc::default();
    let seen_by_task = log.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let log = seen_by_task.clone();
            tokio::spawn(async move {
                let line = read_request_line(&mut socket).await;
                log.lock().unwrap().push(line);
                let _ = socket
                    .write_all(b"HTTP/1.1 502 Bad Gateway\r\nContent-Length: 0\r\n\r\n")
                    .await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, log)
}

/// Start a mock SOCKS4 proxy.
///
/// Records `ip:port` of each CONNECT, then answers the tunnelled HTTP request.
pub async fn start_socks4_proxy(body: &'static str) -> (SocketAddr, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log: Seen = Arc::default();
    let seen_by_task = log.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let log = seen_by_task.clone();
            tokio::spawn(async move {
                if let Some(destination) = socks4_handshake(&mut socket).await {
                    log.lock().unwrap().push(destination);
                    let _ = read_request_line(&mut socket).await;
                    write_response(&mut socket, 200, body).await;
                }
            });
        }
    });

    (addr, log)
}

async fn socks4_handshake(socket: &mut TcpStream) -> Option<String> {
    // VN, CD, DSTPORT, DSTIP, USERID, NUL
    let mut head = [0u8; 8];
    socket.read_exact(&mut head).await.ok()?;
    if head[0] != 4 || head[1] != 1 {
        return None;
    }
    let port = u16::from_be_bytes([head[2], head[3]]);
    let ip = std::net::Ipv4Addr::new(head[4], head[5], head[6], head[7]);
    let mut byte = [0u8; 1];
    loop {
        socket.read_exact(&mut byte).await.ok()?;
        if byte[0] == 0 {
            break;
        }
    }
    socket.write_all(&[0, 0x5A, 0, 0, 0, 0, 0, 0]).await.ok()?;
    Some(format!("{}:{}", ip, port))
}

/// Start a mock SOCKS5 proxy (no auth, or username/password when offered).
///
/// Destinations are logged as `host:port`, prefixed with `user:pass@` when the
/// client authenticated.
///
/// Records `host:port` of each CONNECT, then plays the target and answers
/// the tunnelled HTTP request with `body`.
pub async fn start_socks5_proxy(body: &'static str) -> (SocketAddr, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log: Seen = Arc::default();
    let seen_by_task = log.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let log = seen_by_task.clone();
            tokio::spawn(async move {
                if let Some(destination) = socks5_handshake(&mut socket).await {
                    log.lock().unwrap().push(destination);
                    let _ = read_request_line(&mut socket).await;
                    write_response(&mut socket, 200, body).await;
                }
            });
        }
    });

    (addr, log)
}

async fn socks5_handshake(socket: &mut TcpStream) -> Option<String> {
    // Greeting: VER, NMETHODS, METHODS
    let mut greeting = [0u8; 2];
    socket.read_exact(&mut greeting).await.ok()?;
    if greeting[0] != 5 {
        return None;
    }
    let mut methods = vec![0u8; greeting[1] as usize];
    socket.read_exact(&mut methods).await.ok()?;

    let credentials = if methods.contains(&2) {
        socket.write_all(&[5, 2]).await.ok()?;
        // Username/password subnegotiation: VER, ULEN, UNAME, PLEN, PASSWD
        let mut ver_len = [0u8; 2];
        socket.read_exact(&mut ver_len).await.ok()?;
        let mut user = vec![0u8; ver_len[1] as usize];
        socket.read_exact(&mut user).await.ok()?;
        let mut plen = [0u8; 1];
        socket.read_exact(&mut plen).await.ok()?;
        let mut pass = vec![0u8; plen[0] as usize];
        socket.read_exact(&mut pass).await.ok()?;
        socket.write_all(&[1, 0]).await.ok()?;
        format!(
            "{}:{}@",
            String::from_utf8_lossy(&user),
            String::from_utf8_lossy(&pass)
        )
    } else {
        socket.write_all(&[5, 0]).await.ok()?;
        String::new()
    };

    // Request: VER, CMD, RSV, ATYP, DST.ADDR, DST.PORT
    let mut head = [0u8; 4];
    socket.read_exact(&mut head).await.ok()?;
    let host = match head[3] {
        1 => {
            let mut ip = [0u8; 4];
            socket.read_exact(&mut ip).await.ok()?;
            std::net::Ipv4Addr::from(ip).to_string()
        }
        3 => {
            let mut len = [0u8; 1];
            socket.read_exact(&mut len).await.ok()?;
            let mut name = vec![0u8; len[0] as usize];
            socket.read_exact(&mut name).await.ok()?;
            String::from_utf8_lossy(&name).to_string()
        }
        4 => {
            let mut ip = [0u8; 16];
            socket.read_exact(&mut ip).await.ok()?;
            std::net::Ipv6Addr::from(ip).to_string()
        }
        _ => return None,
    };
    let mut port = [0u8; 2];
    socket.read_exact(&mut port).await.ok()?;
    let port = u16::from_be_bytes(port);

    socket.write_all(&[5, 0, 0, 1, 0, 0, 0, 0, 0, 0]).await.ok()?;
    Some(format!("{}{}:{}", credentials, host, port))
}
