//! Check command - validates definitions without touching the network

use clap::Args;
use tracing::warn;

use super::{bootstrap, load_registries, DefinitionArgs};
use crate::domain::test_case::validate_definition;

/// Arguments for the check command
#[derive(Args, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub source: DefinitionArgs,
}

pub async fn run(args: CheckArgs) -> anyhow::Result<()> {
    let config = bootstrap();
    let (extractors, units) = load_registries(&config, &args.source)?;

    let mut invalid = 0;
    for unit in units.units() {
        let definition = unit.definition();

        if let Err(e) = validate_definition(definition) {
            invalid += 1;
            println!("{}: {}", unit.name(), e);
            continue;
        }

        for key in definition.add_ie() {
            if !extractors.contains(key) {
                invalid += 1;
                println!("{}: unknown extractor in add_ie: {}", unit.name(), key);
            }
        }
    }

    if invalid > 0 {
        warn!(invalid, "Invalid test definitions");
        anyhow::bail!("{} of {} test definitions are invalid", invalid, units.len());
    }

    println!("{} test definitions OK", units.len());
    Ok(())
}
