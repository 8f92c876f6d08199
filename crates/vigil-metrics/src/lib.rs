pub mod aggregator;
pub mod clock;
pub mod dispatcher;
pub mod evaluator;
pub mod history;

pub use aggregator::{HealthAggregator, HealthInputs};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatcher::{AlertDispatcher, DispatcherConfig};
pub use evaluator::{evaluate_resources, evaluate_runners, evaluate_runtime, Thresholds};
pub use history::MetricHistory;
