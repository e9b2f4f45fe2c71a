use anyhow::{Context, anyhow};
use secrets_apdu_transport_pcsc::{PcscDeviceManager, PcscReader};

/// Find a reader with a specific name
pub fn find_reader_by_name(
    manager: &PcscDeviceManager,
    reader_name: &str,
) -> anyhow::Result<PcscReader> {
    let readers = manager.list_readers()?;

    readers
        .into_iter()
        .find(|r| r.name() == reader_name)
        .with_context(|| format!("Reader '{reader_name}' not found"))
}

/// List all available readers
pub fn list_readers(manager: &PcscDeviceManager) -> anyhow::Result<()> {
    let readers = manager.list_readers()?;

    println!("Available readers:");
    for (i, reader) in readers.iter().enumerate() {
        let status = if reader.has_card() {
            "card present"
        } else {
            "no card"
        };
        println!("{}. {} ({})", i + 1, reader.name(), status);
    }

    Ok(())
}

/// Find a reader with a card inserted
pub fn find_reader_with_card(manager: &PcscDeviceManager) -> anyhow::Result<PcscReader> {
    manager
        .list_readers()?
        .into_iter()
        .find(PcscReader::has_card)
        .ok_or_else(|| anyhow!("No card found in any reader!"))
}
