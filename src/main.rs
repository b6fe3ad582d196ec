use rand::Rng;
use speedometer::{Speedometer, SpeedometerCommand, SpeedometerConfig};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SpeedometerConfig::builder()
        .title("Speedometer".to_string())
        .font_data(load_label_font().unwrap_or_default())
        .build();
    let mut speedometer = Speedometer::new(config);

    if std::env::args().any(|arg| arg == "--demo") {
        // a background driver pressing the pedals at random intervals
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let mut rng = rand::rng();
            loop {
                if sender.send(SpeedometerCommand::Drive).is_err() {
                    break;
                }
                thread::sleep(Duration::from_millis(rng.random_range(4000..10000)));
                if sender.send(SpeedometerCommand::StopDrive).is_err() {
                    break;
                }
                thread::sleep(Duration::from_millis(rng.random_range(3000..7000)));
            }
        });
        println!("Demo mode: the needle drives and stops on its own.");
        speedometer.show_with_commands(receiver)
    } else {
        println!("Space: drive, S: stop drive");
        speedometer.show()
    }
}

/// Find usable TTF bytes for the dial numbers. The crate bundles no font;
/// without one the gauge still works, just unlabeled.
fn load_label_font() -> Option<Vec<u8>> {
    const CANDIDATES: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];
    if let Ok(path) = std::env::var("SPEEDOMETER_FONT") {
        match std::fs::read(&path) {
            Ok(data) => return Some(data),
            Err(error) => {
                tracing::warn!(%path, %error, "could not read SPEEDOMETER_FONT");
            }
        }
    }
    for path in CANDIDATES {
        if let Ok(data) = std::fs::read(path) {
            tracing::debug!(path, "loaded label font");
            return Some(data);
        }
    }
    tracing::warn!("no label font found, dial numbers will not be drawn");
    None
}
