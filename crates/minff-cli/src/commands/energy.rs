use crate::cli::EnergyArgs;
use crate::error::Result;
use crate::system::SystemDescription;
use minff::core::forcefield::term::EnergyBreakdown;
use std::fmt::Write as _;
use tracing::info;

pub fn run(args: EnergyArgs) -> Result<()> {
    info!("Loading system from {:?}", &args.input);
    let system = SystemDescription::from_file(&args.input)?;
    let fields = system.build_force_fields()?;

    for (index, field) in fields.iter().enumerate() {
        let breakdown = field.calc_energy_breakdown()?;
        if fields.len() > 1 {
            println!("Conformer {}:", index + 1);
        }
        print!("{}", format_breakdown(&breakdown));
    }
    Ok(())
}

fn format_breakdown(breakdown: &EnergyBreakdown) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  {:<22}{:>16.6}", "total", breakdown.total());
    for (index, term) in breakdown.terms().iter().enumerate() {
        let label = format!("#{} {}", index + 1, term.name);
        let _ = writeln!(out, "  {:<22}{:>16.6}", label, term.energy);
    }
    let kinds = breakdown.by_name();
    if kinds.len() > 1 {
        for (name, energy) in kinds {
            let _ = writeln!(out, "  {:<22}{:>16.6}", format!("sum {}", name), energy);
        }
    }
    out
}
