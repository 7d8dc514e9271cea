use rulcast_core::{ScoringConfig, add_rul_prediction, calculate_health_score};

pub fn run(input: &str, models: &str, output: Option<&str>, config: ScoringConfig) {
    let registry = super::load_registry(models);
    let request = super::read_request(input);

    match calculate_health_score(request, &registry, &config) {
        Ok(mut response) => {
            add_rul_prediction(&mut response, &config);
            let predicted = response.rul_prediction.as_deref().unwrap_or(&[]).len();
            log::info!(
                "rul: {predicted} unit(s) predicted over a {}-record trend window",
                config.required_trend_record()
            );
            super::emit(&response, output);
        }
        Err(err) => super::fail(&format!("scoring failed: {err}")),
    }
}
