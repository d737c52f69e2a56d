use super::HeatmapError;

/// Motion-heatmap collaborator driven by the batch driver.
///
/// Implementations are built once from the division grid and the ordered
/// frame paths, then asked to generate their output exactly once.
pub trait Heatmap {
    /// Build the heatmap and write it wherever the implementation writes.
    fn generate(&mut self) -> Result<(), HeatmapError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}
