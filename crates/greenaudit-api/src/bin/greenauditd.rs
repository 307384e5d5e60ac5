use std::io;

use greenaudit_api::AuditServer;

fn main() -> io::Result<()> {
    let server = AuditServer::from_env()
        .map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, msg))?;
    let addr =
        std::env::var("GREENAUDIT_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:3001".to_string());
    server.serve_http(&addr)
}
