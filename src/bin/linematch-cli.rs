use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

#[derive(Parser)]
#[command(name = "linematch-cli")]
#[command(about = "Send one query to a linematch server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "127.0.0.1:44445")]
    address: String,

    /// Connect over TLS
    #[arg(long, requires = "ca_cert")]
    tls: bool,

    /// PEM file with the CA certificate(s) to trust
    #[arg(long)]
    ca_cert: Option<PathBuf>,

    /// Name to verify in the server certificate
    #[arg(long, default_value = "localhost")]
    server_name: String,

    /// The line to look up
    query: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let stream = TcpStream::connect(&cli.address).await?;

    let response = match cli.ca_cert.as_deref().filter(|_| cli.tls) {
        Some(ca_cert) => {
            let connector = tls_connector(ca_cert)?;
            let name = ServerName::try_from(cli.server_name.clone())?;
            let stream = connector.connect(name, stream).await?;
            exchange(stream, &cli.query).await?
        }
        None => exchange(stream, &cli.query).await?,
    };

    print!("{response}");
    Ok(())
}

fn tls_connector(ca_cert: &Path) -> Result<TlsConnector, Box<dyn std::error::Error>> {
    let mut roots = RootCertStore::empty();
    let mut reader = BufReader::new(File::open(ca_cert)?);
    for cert in rustls_pemfile::certs(&mut reader) {
        roots.add(cert?)?;
    }

    let config = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()?
    .with_root_certificates(roots)
    .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}

async fn exchange<S>(mut stream: S, query: &str) -> std::io::Result<String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(query.as_bytes()).await?;
    stream.flush().await?;

    let mut response = String::new();
    stream.read_to_string(&mut response).await?;
    Ok(response)
}
