use std::{env, io, net::IpAddr, path::PathBuf};

use clap::Parser;
use quickupload::{net, Config, Server, UploadApp};
use tracing::info;

#[derive(Parser)]
#[command(name = "quickupload")]
#[command(about = "Upload a file to this machine from any browser on the network")]
#[command(version)]
struct Cli {
    /// The port the server listens on
    #[arg(short, long, default_value_t = 5000)]
    port: u16,

    /// Host address to bind on
    #[arg(short = 'a', long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Directory to save the uploaded files at, created if missing
    /// [default: the working directory]
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let directory = match cli.directory {
        Some(directory) => directory,
        None => env::current_dir()?,
    };

    let config = Config {
        host: cli.host,
        port: cli.port,
        directory,
    };
    config.ensure_directory()?;

    let server = Server::try_bind((config.host, config.port))?;
    info!(
        "starting server on http://{}:{}",
        net::interface_ip(),
        config.port
    );

    server.serve(UploadApp::new(config))
}
