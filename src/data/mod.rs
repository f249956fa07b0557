// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from an image folder on disk to tensor batches.
//
//   class folders of images
//       │
//       ▼
//   ImageFolderLoader  → decodes, resizes, labels by folder name
//       │
//       ▼
//   split_train_val    → only when no separate test folder exists
//       │
//       ▼
//   ImageDataset       → implements Burn's Dataset trait
//       │
//       ▼
//   ImageBatcher       → stacks samples into [N, C, H, W] + [N]
//       │
//       ▼
//   DataLoader         → shuffled for training, fixed for testing
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Loads class-per-folder image sets using the image crate
pub mod loader;

/// Implements Burn's Dataset trait for decoded images
pub mod dataset;

/// Implements Burn's Batcher trait and builds the two loaders
pub mod batcher;

/// Seeded shuffle-and-split into train/test sets
pub mod splitter;
