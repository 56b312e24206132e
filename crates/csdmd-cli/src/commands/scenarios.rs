use crate::cli::ScenariosArgs;
use crate::config::resolve_layout;
use crate::error::Result;
use csdmd::core::scenario::ScenarioName;
use csdmd::engine::error::ScenarioError;
use std::path::Path;

pub async fn run(args: ScenariosArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    for name in list_scenarios(&args, &cwd)? {
        println!("{}", name);
    }
    Ok(())
}

fn list_scenarios(args: &ScenariosArgs, cwd: &Path) -> Result<Vec<ScenarioName>> {
    if args.builtin {
        return Ok(ScenarioName::builtin());
    }
    let layout = resolve_layout(None, args.examples_dir.clone(), cwd);
    let names = layout
        .discover()
        .map_err(|source| ScenarioError::Discovery {
            path: layout.examples_dir.clone(),
            source,
        })?;
    Ok(names)
}
