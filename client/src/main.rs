use clap::{Parser, Subcommand};

use client::command_runner::CommandRunner;
use client::namenode_service::NamenodeService;
use utilities::logger::{self, info};
use utilities::result::Result;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Client for the distributed file system")]
struct Args {
    /// Namenode address as host:port
    #[arg(long, default_value = "127.0.0.1:8000")]
    namenode: String,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug, Clone)]
enum Cmd {
    /// Upload a local file
    Upload {
        local_path: String,
        /// Name in the namespace; defaults to the local file name
        #[arg(long)]
        remote: Option<String>,
    },
    /// Download a file
    Download {
        remote_filename: String,
        /// Local target path; defaults to the remote name
        #[arg(long)]
        local: Option<String>,
    },
    /// List all files
    List,
    /// Delete a file
    Delete { remote_filename: String },
    /// Show a file record with live replica locations
    Info { remote_filename: String },
    /// Show datanode liveness and capacity
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = logger::init_logger("Client", "client_0");
    let args = Args::parse();
    let runner = CommandRunner::new(NamenodeService::new(args.namenode));

    match args.cmd {
        Cmd::Upload { local_path, remote } => {
            let remote_file_name = match remote {
                Some(name) => name,
                None => std::path::Path::new(&local_path)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .ok_or_else(|| format!("Cannot derive a remote name from {local_path}"))?,
            };
            let message = runner.upload(local_path, remote_file_name).await?;
            println!("{message}");
        }
        Cmd::Download {
            remote_filename,
            local,
        } => {
            let local_path = local.unwrap_or_else(|| remote_filename.clone());
            let message = runner.download(remote_filename, local_path).await?;
            println!("{message}");
        }
        Cmd::List => {
            let listing = runner.list().await?;
            info!(files = listing.files.len(), "Listed files");
            for file in listing.files {
                println!(
                    "{}\t{} bytes\t{} chunks\tcreated_at={}",
                    file.filename, file.filesize, file.chunk_count, file.created_at
                );
            }
        }
        Cmd::Delete { remote_filename } => {
            let message = runner.delete(remote_filename).await?;
            println!("{message}");
        }
        Cmd::Info { remote_filename } => {
            let details = runner.info(&remote_filename).await?;
            println!(
                "{}\t{} bytes\tchunk_size={}\treplication={}",
                details.filename, details.filesize, details.chunk_size, details.replication_factor
            );
            for chunk in details.chunks {
                let live: Vec<_> = chunk
                    .datanodes
                    .iter()
                    .map(|datanode| datanode.node_id.as_str())
                    .collect();
                println!(
                    "  {}\trecorded=[{}]\tlive=[{}]",
                    chunk.chunk_id,
                    chunk.locations.join(","),
                    live.join(",")
                );
            }
        }
        Cmd::Status => {
            let summary = runner.status().await?;
            println!(
                "files={} total_bytes={}",
                summary.total_files, summary.total_bytes
            );
            for datanode in summary.datanodes {
                println!(
                    "{}\t{}:{}\t{}\t{} chunks\t{}/{} bytes free",
                    datanode.node_id,
                    datanode.host,
                    datanode.port,
                    if datanode.alive { "alive" } else { "dead" },
                    datanode.chunk_count,
                    datanode.available_space,
                    datanode.total_space
                );
            }
        }
    }
    Ok(())
}
