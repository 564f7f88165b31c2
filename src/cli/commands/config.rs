//! Configuration command implementations

use anyhow::{Result, bail};

use crate::cli::{ConfigCommands, Output};
use crate::config::ExecutorSettings;

/// Execute config commands
pub fn execute(cmd: ConfigCommands, custom_config: Option<&str>, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { format } => show(custom_config, &format, output),
        ConfigCommands::Validate => validate(custom_config, output),
    }
}

fn show(custom_config: Option<&str>, format: &str, output: &Output) -> Result<()> {
    let settings = ExecutorSettings::load_with_custom_config(custom_config)?;

    match format {
        "json" => output.raw(&serde_json::to_string_pretty(&settings)?),
        "text" => {
            output.header("Executor Settings");
            let max_tasks = match settings.max_parallel_index_tasks {
                0 => "0 (auto)".to_string(),
                n => n.to_string(),
            };
            let scheduler = match settings.scheduler_threads {
                0 => "shared pool".to_string(),
                n => format!("{n} dedicated threads"),
            };
            output.table_row("max_parallel_index_tasks", &max_tasks);
            output.table_row("thread_percentage", &format!("{}%", settings.thread_percentage));
            output.table_row("scheduler_threads", &scheduler);
            output.table_row("database", settings.database.as_deref().unwrap_or("-"));
            output.table_row("resolved parallelism", &settings.resolved_parallelism().to_string());
        }
        other => bail!("Unsupported format '{other}', expected 'text' or 'json'"),
    }

    Ok(())
}

fn validate(custom_config: Option<&str>, output: &Output) -> Result<()> {
    let settings = ExecutorSettings::load_with_custom_config(custom_config)?;
    settings.execution_config()?;

    output.success("Configuration is valid");
    output.verbose(&format!("Resolved parallelism: {}", settings.resolved_parallelism()));
    Ok(())
}
