pub mod models;
pub mod rul;
pub mod score;
pub mod serve;

use std::path::Path;

use rulcast_core::{HealthScoreRequest, ModelRegistry, ScoringConfig};

pub fn base_config(time_window: i64, smooth_window: usize) -> ScoringConfig {
    ScoringConfig {
        time_window_days: time_window,
        smooth_window,
        ..ScoringConfig::default()
    }
}

/// Load the artifact registry or exit with a diagnostic.
fn load_registry(dir: &str) -> ModelRegistry {
    match ModelRegistry::load_dir(Path::new(dir)) {
        Ok(registry) => registry,
        Err(err) => fail(&format!("cannot load model directory `{dir}`: {err}")),
    }
}

/// Read and parse a request file or exit with a diagnostic.
fn read_request(path: &str) -> HealthScoreRequest {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => fail(&format!("cannot read `{path}`: {err}")),
    };
    match HealthScoreRequest::from_json_str(&raw) {
        Ok(request) => request,
        Err(err) => fail(&format!("invalid request in `{path}`: {err}")),
    }
}

/// Pretty-print the response to stdout or write it to `output`.
fn emit(response: &impl serde::Serialize, output: Option<&str>) {
    let rendered = match serde_json::to_string_pretty(response) {
        Ok(rendered) => rendered,
        Err(err) => fail(&format!("cannot serialize response: {err}")),
    };
    match output {
        Some(path) => {
            if let Err(err) = std::fs::write(path, rendered) {
                fail(&format!("cannot write `{path}`: {err}"));
            }
            println!("response written to {path}");
        }
        None => println!("{rendered}"),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}
