// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and traits describing a training run.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Epoch metrics, running accumulator, results history, watermark
pub mod metrics;

// The seam between the epoch driver and the model owner
pub mod traits;
