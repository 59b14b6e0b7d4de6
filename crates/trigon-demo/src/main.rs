use clap::Parser;

use trigon_engine::logging::init_logging;
use trigon_engine::window::Runtime;

mod cli;
mod scene;

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    init_logging(args.logging_config());

    log::info!(
        "trigon demo: {:?}{}",
        args.mode,
        if args.wireframe { " (wireframe)" } else { "" }
    );

    Runtime::run(
        args.runtime_config(),
        args.gpu_init(),
        scene::HelloScene::new(args.scene_config()),
    )
}
