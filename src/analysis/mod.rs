pub mod cache;
pub mod classifier;
pub mod fingerprint;
pub mod fusion;
pub mod heuristics;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod preprocess;

pub use cache::FingerprintCache;
pub use classifier::{ClassifierAdapter, ImageClassifier, ModelLoader, Prediction, UnavailableModel};
pub use fingerprint::Fingerprint;
pub use fusion::{fuse, Fusion, SubjectVerdict};
pub use heuristics::PixelSignals;
