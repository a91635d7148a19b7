//! Prompt templates for the location and fusion stages.

/// Prompt asking the model to place a set of visible Wi-Fi networks
pub fn location_prompt(networks: &[String]) -> String {
    format!(
        "Based on the following WiFi network names, analyze where this location might be:\n\
         {}\n\
         Provide a brief analysis of the likely location.",
        networks.join("\n")
    )
}

/// Prompt asking the model to describe the activity behind motion and location context
pub fn fusion_prompt(motion: &str, location: &str) -> String {
    format!(
        "Given the following data, describe the most likely activity in exactly 20 words:\n\
         Motion: {}\n\
         Location: {}",
        motion, location
    )
}
