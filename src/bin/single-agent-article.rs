use std::process::ExitCode;

use schreibwerk::{cli, Topology};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::main(Topology::Unified).await
}
