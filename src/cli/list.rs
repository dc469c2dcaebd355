//! List command - prints every synthesized unit

use clap::Args;

use super::{bootstrap, load_registries, DefinitionArgs};
use crate::infrastructure::harness::TestRegistry;

/// Arguments for the list command
#[derive(Args, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub source: DefinitionArgs,

    /// Only units of this extractor
    #[arg(short, long)]
    pub extractor: Option<String>,
}

pub async fn run(args: ListArgs) -> anyhow::Result<()> {
    let config = bootstrap();
    let (_, units) = load_registries(&config, &args.source)?;

    let keys = match &args.extractor {
        Some(key) => vec![key.as_str()],
        None => units.extractor_keys(),
    };

    for key in keys {
        for unit in units.units_for(key) {
            let mut line = format!("{}\t{}", unit.identity(), unit.definition().url());
            if let Some(reason) = unit.definition().skip() {
                line.push_str(&format!("\t(skip: {})", reason));
            }
            println!("{}", line);
        }
        println!("{}", TestRegistry::suite_name(key));
    }

    Ok(())
}
