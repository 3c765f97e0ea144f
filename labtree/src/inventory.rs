//! Inventory tagging: marks suggested equipment the lab already stocks.
//!
//! The lab is assumed to own the common automation hardware, so a broad
//! keyword list over node names decides `in_inventory`. Tagging happens when
//! a candidate is accepted into the tree, never inside the oracle.

/// Common lab-automation hardware keywords; case-insensitive substring match.
const INVENTORY_KEYWORDS: &[&str] = &[
    "Robot", "Arm", "Gripper", "Pipette", "Handler", "Dispenser", "Washer",
    "Centrifuge", "Incubator", "Cytomat", "Peeler", "Sealer", "Reader",
    "Microscope", "Imager", "Camera", "Conveyor", "Track", "Hotel", "Storage",
    "PC", "Server", "Controller", "Barcode", "Scanner", "Printer", "Pump",
    "Reservoir", "Shaker", "Mixer", "Heater", "Cooler", "Magnet", "Cycler",
    "PCR",
];

/// Returns true when the equipment name matches a stocked-hardware keyword.
pub fn in_inventory(name: &str) -> bool {
    let lower = name.to_lowercase();
    INVENTORY_KEYWORDS
        .iter()
        .any(|kw| lower.contains(&kw.to_lowercase()))
}
