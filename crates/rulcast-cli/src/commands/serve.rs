use rulcast_core::ScoringConfig;

pub fn run(host: &str, port: u16, models: &str) {
    let registry = super::load_registry(models);
    let base = format!("http://{host}:{port}");

    println!("rulcast server v{}", rulcast_core::VERSION);
    println!("   {base}");
    println!("   {} model bundle(s) loaded", registry.len());
    println!();
    println!("   Endpoints:");
    println!("     GET  /                       API index (try: curl {base})");
    println!("     POST /api/v1/health-score    Smoothed health-score series");
    println!("     POST /api/v1/rul             Health score + RUL predictions");
    println!("     GET  /health                 Registry health check");
    println!();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => super::fail(&format!("cannot start runtime: {err}")),
    };
    if let Err(err) = rt.block_on(rulcast_server::run_server(
        registry,
        ScoringConfig::default(),
        host,
        port,
    )) {
        super::fail(&format!("server exited: {err}"));
    }
}
