use std::path::PathBuf;
use tenebra_node::run_node;

#[tokio::main]
async fn main() {
    let path = std::env::var("TENEBRA_CONFIG").ok().map(PathBuf::from);
    if let Err(e) = run_node(path.as_deref()).await {
        eprintln!("node failed: {e:?}");
        std::process::exit(1);
    }
}
