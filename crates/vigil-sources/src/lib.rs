pub mod battery;
pub mod error;
pub mod resource;
pub mod runner;
pub mod runtime;

pub use error::SourceError;
pub use resource::{ResourceSampler, SysinfoSampler};
pub use runner::{GitHubConfig, GitHubRunnerDirectory, RunnerDirectory};
pub use runtime::{DockerConfig, DockerRuntimeClient, RuntimeClient};
