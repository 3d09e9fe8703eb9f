use strava_setup::app;
use strava_setup::shared::errors::SetupError;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match app::run(args) {
        Ok(()) => {}
        Err(SetupError::Cancelled) => {
            eprintln!("Cancelled.");
            std::process::exit(130);
        }
        Err(err) => {
            eprintln!("ERROR: {err}");
            std::process::exit(err.exit_code());
        }
    }
}
