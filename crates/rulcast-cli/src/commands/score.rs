use rulcast_core::{ScoringConfig, calculate_health_score};

pub fn run(input: &str, models: &str, output: Option<&str>, config: ScoringConfig) {
    let registry = super::load_registry(models);
    let request = super::read_request(input);

    match calculate_health_score(request, &registry, &config) {
        Ok(response) => super::emit(&response, output),
        Err(err) => super::fail(&format!("scoring failed: {err}")),
    }
}
