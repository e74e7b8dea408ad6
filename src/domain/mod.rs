// Error taxonomy
pub mod errors;

// Measurement values and labels
pub mod measurement;

// Tool output decoding
pub mod payload;

// Port interfaces
pub mod ports;

// Configured measurement targets
pub mod target;
