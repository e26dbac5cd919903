//! `libreassistant plugins` — list the registered plugins.

use libreassistant_config::AppConfig;

pub fn run() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let registry = libreassistant_plugins::default_registry(config.file_io_root());

    println!("Registered plugins ({}):", registry.len());
    for descriptor in registry.list() {
        println!();
        println!("  {}", descriptor.id);
        println!("    {}", descriptor.description);
        println!(
            "    example input: {}",
            serde_json::to_string(&descriptor.input_example)?
        );
        let timeout = config.orchestrator.plugin_timeout_for(&descriptor.id);
        println!("    timeout: {}s", timeout.as_secs());
    }

    Ok(())
}
