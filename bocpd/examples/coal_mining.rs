//! Most likely run length through the UK coal mining disasters series.

use bocpd::generators::coal_mining_incidents;
use bocpd::{Bocpd, ConstantHazard, PoissonGamma};

fn main() -> Result<(), Box<dyn std::error::Error + 'static>> {
    let mut cpd =
        Bocpd::new(ConstantHazard::new(100.0)?, PoissonGamma::new(1.0, 1.0)?);

    for (year, count) in (1851..).zip(coal_mining_incidents()) {
        cpd.update(f64::from(count))?;
        let (run_length, p) = cpd.most_likely_run_length();
        println!("{year}\t{count}\t{run_length}\t{p:.3}");
    }

    Ok(())
}
