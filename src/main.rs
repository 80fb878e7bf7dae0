use anyhow::Result;
use dbmanager::config::AppConfig;
use dbmanager::console::Console;
use dbmanager::logging::init_tracing;
use dbmanager::scenario::run_scripted_sequence;
use dbmanager::services::{ConnectionManager, CsvBridge, RecordStore, SchemaDefinition};

fn main() -> Result<()> {
    init_tracing()?;

    let config = AppConfig::load()?;
    let headless = matches!(
        std::env::args().skip(1).collect::<Vec<_>>().as_slice(),
        [arg] if arg == "test"
    );

    smol::block_on(async {
        let schema = SchemaDefinition::new(&config.table_name)?;
        let manager = ConnectionManager::new(config.descriptors(), schema, config.mode);

        let probe = manager.establish().await;
        if probe.ok {
            tracing::info!("{} mode: {}", probe.mode, probe.detail);
        } else {
            tracing::error!("{} mode unavailable: {}", probe.mode, probe.detail);
        }

        let store = RecordStore::new(manager);
        let bridge = CsvBridge::new(store.clone());

        if headless {
            run_scripted_sequence(&store, &bridge, &config.csv_path).await?;
        } else {
            Console::new(store, bridge, config.csv_path.clone()).run().await?;
        }
        Ok::<(), anyhow::Error>(())
    })
}
