pub mod binary_check;
pub mod mock;
pub mod observability;
pub mod speedtest_cli;

pub use mock::{MockResponse, MockSpeedtestRunner};
pub use speedtest_cli::SpeedtestCli;
