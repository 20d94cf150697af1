use clap::Parser;
use log::{error, info, LevelFilter};

mod args;
mod rcv;

fn main() {
    let args = args::Args::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();

    info!("Starting rcvingest version {}", env!("CARGO_PKG_VERSION"));
    let res = rcv::run_ingestion(args.config, args.out, args.reference, args.strict);
    let code = match res {
        Ok(()) => 0,
        Err(e) => {
            error!("An error occured: {}", e);
            eprintln!("An error occured: {}", e);
            1
        }
    };
    log::logger().flush();
    std::process::exit(code);
}
