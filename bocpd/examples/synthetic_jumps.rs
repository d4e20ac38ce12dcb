//! Detect level shifts in a synthetic Gaussian series.
//!
//! Run with `RUST_LOG=bocpd=debug` to see every engagement and change point.

use bocpd::generators::level_shifts;
use bocpd::{ChangepointDetector, DetectorConfig};
use rand::{rngs::SmallRng, SeedableRng};

fn main() -> Result<(), Box<dyn std::error::Error + 'static>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bocpd=info".parse()?),
        )
        .init();

    let mut rng = SmallRng::seed_from_u64(0xABCD);

    println!("Generating sequence");
    let seq = level_shifts(
        &mut rng,
        &[(250, 0.0), (250, 10.0), (250, -10.0), (250, 0.0)],
    )?;

    let config = DetectorConfig::default();
    println!("Creating detector with {config:?}");
    let mut cpd = ChangepointDetector::from_config(&config)?;

    for x in &seq {
        if let Some(cp) = cpd.update(*x)? {
            println!("change point at {cp} (declared at step {:?})", cpd.time());
        }
    }

    let active = cpd.run_lengths().iter().filter(|r| r.is_some()).count();
    println!(
        "{} change points over {} steps, {active} steps with a run length",
        cpd.changepoints().len(),
        seq.len(),
    );
    println!("changepoints: {:?}", cpd.changepoints());

    Ok(())
}
