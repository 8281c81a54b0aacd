//! Product IDs of the analog-input family that supports external calibration.

/// `(product_id, product_name)` in the order products are advertised.
pub const AI16_FAMILY: &[(u16, &str)] = &[
    (0x8040, "USB-AI16-16A"),
    (0x8041, "USB-AI16-16E"),
    (0x8042, "USB-AI12-16A"),
    (0x8043, "USB-AI12-16"),
    (0x8044, "USB-AI12-16E"),
    (0x8045, "USB-AI16-64MA"),
    (0x8046, "USB-AI16-64ME"),
    (0x8047, "USB-AI12-64MA"),
    (0x8048, "USB-AI12-64M"),
    (0x8049, "USB-AI12-64ME"),
];

pub fn supported_product_ids() -> Vec<u16> {
    AI16_FAMILY.iter().map(|(id, _)| *id).collect()
}

pub fn supported_product_names() -> Vec<&'static str> {
    AI16_FAMILY.iter().map(|(_, name)| *name).collect()
}

pub fn product_name(product_id: u16) -> Option<&'static str> {
    AI16_FAMILY
        .iter()
        .find(|(id, _)| *id == product_id)
        .map(|(_, name)| *name)
}
