//! 传输层抽象
//!
//! `LinkTransport` 允许在实际运行时使用 TCP，在测试时使用 Mock 实现
//! （记录帧、注入发送失败）。
//!
//! 帧总是通过一次 `send_frame` 整体发送；实现方必须保证要么发出完整帧，
//! 要么返回错误。

use crate::config::Endpoint;
use crate::error::ClientError;
use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::debug;

/// 链路发送接口
pub trait LinkTransport: Send {
    /// 发送一个完整的长度前缀帧
    fn send_frame(&mut self, frame: &[u8]) -> io::Result<()>;

    /// 关闭连接
    ///
    /// 客户端保证只调用一次，且在心跳线程退出之后调用。
    fn shutdown(&mut self) -> io::Result<()>;

    /// 对端描述（用于日志）
    fn peer(&self) -> String {
        "unknown".to_string()
    }
}

/// TCP 传输
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    peer: SocketAddr,
}

impl TcpTransport {
    /// 连接到端点
    ///
    /// 依次尝试解析出的每个地址，连接阶段以 `timeout` 为上限；成功后把
    /// 同一超时应用到读写，并关闭 Nagle。不重试。
    ///
    /// # 错误
    /// - `ClientError::Connect`: 解析失败、拒绝连接、不可达或超时
    pub fn connect(endpoint: &Endpoint, timeout: Duration) -> Result<Self, ClientError> {
        let connect_err = |source: io::Error| ClientError::Connect {
            endpoint: endpoint.to_string(),
            source,
        };

        let addrs = (endpoint.host.as_str(), endpoint.port)
            .to_socket_addrs()
            .map_err(connect_err)?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    return Self::from_stream(stream, timeout).map_err(connect_err);
                },
                Err(e) => {
                    debug!("Connect to {} failed: {}", addr, e);
                    last_err = Some(e);
                },
            }
        }

        Err(connect_err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "endpoint resolved to no addresses")
        })))
    }

    /// 包装已建立的连接并应用超时
    pub fn from_stream(stream: TcpStream, timeout: Duration) -> io::Result<Self> {
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        Ok(Self { stream, peer })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl LinkTransport for TcpTransport {
    fn send_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.stream.write_all(frame)?;
        self.stream.flush()
    }

    fn shutdown(&mut self) -> io::Result<()> {
        match self.stream.shutdown(Shutdown::Both) {
            // 对端已先行关闭
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }

    fn peer(&self) -> String {
        self.peer.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;

    #[test]
    fn test_connect_refused() {
        // 绑定后立即释放，得到一个当前无人监听的端口
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = TcpTransport::connect(
            &Endpoint::new("127.0.0.1", port),
            Duration::from_millis(500),
        )
        .unwrap_err();
        assert!(err.is_connect_error(), "unexpected error: {}", err);
    }

    #[test]
    fn test_send_frame_and_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut transport =
            TcpTransport::connect(&Endpoint::new("127.0.0.1", port), Duration::from_secs(1))
                .unwrap();
        let (mut server, _) = listener.accept().unwrap();

        transport.send_frame(b"\x04\x00\x00\x00exit").unwrap();
        transport.shutdown().unwrap();

        let mut received = Vec::new();
        server.read_to_end(&mut received).unwrap();
        assert_eq!(received, b"\x04\x00\x00\x00exit");
        assert_eq!(transport.peer(), format!("127.0.0.1:{}", port));
    }
}
