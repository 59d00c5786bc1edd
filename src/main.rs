use go_redirect::build::generate;
use go_redirect::cli;
use go_redirect::config::Config;
use go_redirect::logging::init_logging;
use std::error::Error;
use std::process;
use tracing::info;

fn main() {
    let matches = cli::app().get_matches();
    if let Err(e) = init_logging(cli::verbosity(&matches)) {
        eprintln!("error: initializing logging: {}", e);
        process::exit(1);
    }

    if let Err(e) = run(&matches) {
        eprintln!("error: {}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        process::exit(1);
    }
}

fn run(matches: &clap::ArgMatches) -> Result<(), Box<dyn Error>> {
    let config = Config::from_settings(cli::settings(matches))?;
    let summary = generate(&config)?;
    info!(
        pages = summary.pages,
        submodules = summary.submodules,
        skipped = summary.skipped.len(),
        cname = summary.cname,
        output = %config.output_directory.display(),
        "done"
    );
    Ok(())
}
