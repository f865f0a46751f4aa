//! Upstream firmware distribution contract.

/// A place the car can fetch firmware from when its local history is
/// empty. The HTTP (or other transport) client lives outside this
/// crate; the car only sees payloads and signatures.
pub trait FirmwareSource: Send + Sync {
    /// Fetch the current `(payload, signature)` pair for a car.
    fn fetch(&self, car_id: &str) -> anyhow::Result<(String, String)>;
}
