use ar_composer::cli::{run_headless, CliArgs};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = match CliArgs::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("[cli] {err}");
            std::process::exit(2);
        }
    };
    match run_headless(&args) {
        Ok(summary) => {
            println!(
                "{} ('{}'): {} vertices, {} clips",
                summary.asset_id,
                summary.model_name,
                summary.vertex_count,
                summary.clips.len()
            );
            for (index, clip) in summary.clips.iter().enumerate() {
                let marker = if summary.current_clip == Some(index) { "*" } else { " " };
                println!("  {marker} [{index}] {clip}");
            }
        }
        Err(err) => {
            eprintln!("Application error: {err:?}");
            std::process::exit(1);
        }
    }
}
