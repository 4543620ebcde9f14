/// labelkit command line entry point
fn main() {
    use clap::Parser;
    use labelkit::cli::{self, Args};
    use labelkit::config::AppConfig;

    let args = Args::parse();
    let mut config = AppConfig::load_from_default_path().unwrap_or_default();

    let level = args.log_level.unwrap_or(config.preferences.log_level);
    env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .parse_default_env()
        .init();

    match cli::run(&args, &mut config) {
        Ok(summary) => {
            println!("{}", summary);
            if let Err(e) = config.save_to_default_path() {
                log::warn!("Failed to save configuration: {}", e);
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
