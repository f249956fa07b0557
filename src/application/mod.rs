// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: each use case tells the data,
// ml and infra layers what to do, in order.
//
// Rules for this layer:
//   - No tensor math or model code here
//   - No printing (that's Layer 1)
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Full training run: data → model → epochs → checkpoints → curves
pub mod train_use_case;

// Score a saved checkpoint on a labelled image folder
pub mod evaluate_use_case;
