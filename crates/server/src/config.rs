use clap::Parser;

/// Bind settings; the defaults match the browser extension's.
#[derive(Parser, Debug, Clone)]
#[command(name = "deepfake-server", version, about = "Placeholder deepfake scoring endpoint")]
pub struct ServerConfig {
    /// Interface or host name to listen on
    #[arg(long, env = "DEEPFAKE_SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// TCP port to listen on
    #[arg(long, env = "DEEPFAKE_SERVER_PORT", default_value_t = 8000)]
    pub port: u16,
}

impl ServerConfig {
    /// `host:port`, resolved by the listener so host names work too.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
