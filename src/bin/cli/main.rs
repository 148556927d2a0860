use clap::Parser;

#[tokio::main]
async fn main() {
    let args = sefer::config::StartArgs::parse();

    let state = match sefer::app::state::AppState::new(&args) {
        Ok(state) => state,
        Err(e) => {
            e.print();
            std::process::exit(1);
        }
    };

    if let Err(e) = sefer::cli::run(args.command, state).await {
        e.print();
        eprintln!("{} failed: {e}", e.stage());
        std::process::exit(1);
    }
}
