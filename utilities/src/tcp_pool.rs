use crate::result::Result;
use once_cell::sync::Lazy;

pub static TCP_CONNECTION_POOL: Lazy<TcpPool> = Lazy::new(TcpPool::new);

#[derive(Debug, Default)]
pub struct TcpPool {}
impl TcpPool {
    pub fn new() -> Self {
        Self {}
    }
    pub async fn get_connection(&self, tcp_address: &str) -> Result<tokio::net::TcpStream> {
        tokio::net::TcpStream::connect(tcp_address)
            .await
            .map_err(|e| {
                format!("Error while connecting to stream at {tcp_address:?} {e:?}").into()
            })
    }
}
