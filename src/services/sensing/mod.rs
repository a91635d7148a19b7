//! Device-side adapters behind the cascade's collaborator traits

pub mod fusion;
pub mod location;
pub mod motion;
pub mod provider;
pub mod stack;
pub mod wifi;

pub use fusion::{InferenceFusion, PlaceholderFusion};
pub use location::LlmLocationAnalyzer;
pub use motion::{classify_magnitude, SyntheticMotionDetector};
pub use provider::DeviceSourceProvider;
pub use stack::SensingStack;
pub use wifi::{parse_ssid_list, CommandWifiScanner, StaticNetworkScanner};
