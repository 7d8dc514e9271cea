pub fn run(dir: &str) {
    let registry = super::load_registry(dir);
    let bundles = registry.list();

    if bundles.is_empty() {
        println!("no model artifacts in `{dir}`");
        return;
    }

    println!("{} model bundle(s) in `{dir}`:", bundles.len());
    for bundle in bundles {
        println!(
            "  {:<24} vhms_prep: {} stage(s), pap_prep: {} stage(s), scoring: {} stage(s)",
            bundle.model_id(),
            bundle.vhms_prep.stages.len(),
            bundle.pap_prep.stages.len(),
            bundle.scoring.stages.len(),
        );
    }
}
