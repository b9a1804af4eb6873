use clap::Parser;
use waymap::app::args::Args;
use waymap::app::pipeline;

fn main() {
    env_logger::init();
    let args = Args::parse();
    match pipeline::run(&args) {
        Ok(exit) => std::process::exit(exit),
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    }
}
