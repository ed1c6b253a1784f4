use clap::Parser;
use gariban_utils::error::Result;
use gariban_utils::store::LocalStore;
use gariban_utils::userdata::render;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gariban-userdata")]
#[command(author, version, about = "Render RDBOX user-data from the saved cluster collection")]
struct Args {
    /// Path to the userdatas store (default: the per-user config dir)
    #[arg(long)]
    store: Option<PathBuf>,

    /// List the saved clusters instead of rendering
    #[arg(long)]
    list: bool,

    /// Cluster index to render (default: the current cluster)
    #[arg(long)]
    cluster: Option<usize>,

    /// Write the rendered user-data here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,

    /// Log file path (logging disabled if not specified)
    #[arg(long)]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging only if log file is specified
    if let Some(ref log_path) = args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .ok();

        if let Some(file) = file {
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"));

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .init();

            info!("Starting gariban-userdata");
        }
    }

    let store = match args.store {
        Some(path) => LocalStore::at(path),
        None => LocalStore::new(),
    };

    let mut collection = store.read_all().await?;

    if args.list {
        for (index, cluster) in collection.clusters.iter().enumerate() {
            let marker = if index == collection.current_cluster {
                "*"
            } else {
                " "
            };
            println!(
                "{marker} {index}: {} ({}) updated {}",
                cluster.cluster_meta.id,
                if cluster.cluster_meta.is_simple {
                    "simple"
                } else {
                    "full"
                },
                cluster.info.update_date
            );
        }
        return Ok(());
    }

    if let Some(index) = args.cluster {
        if index >= collection.clusters.len() {
            eprintln!("no cluster #{index} in {:?}", store.path());
            std::process::exit(1);
        }
        collection.current_cluster = index;
    }

    if collection.clusters.is_empty() {
        eprintln!("no clusters saved yet in {:?}", store.path());
        std::process::exit(1);
    }

    let rendered = render::dump(&mut collection)?;

    match args.out {
        Some(path) => {
            tokio::fs::write(&path, rendered.combined_text.as_bytes()).await?;
            info!("Wrote user-data to {:?}", path);
        }
        None => print!("{}", rendered.combined_text),
    }

    Ok(())
}
