pub mod manager;
pub mod message;
pub mod notifier;
pub mod providers;
pub mod worker;

pub use manager::NotifyManager;
pub use message::{NotifyLevel, NotifyMessage};
pub use notifier::{Notifier, NotifierError};
pub use providers::{SlackConfig, SlackNotifier, WebhookConfig, WebhookNotifier};
pub use worker::{notify_channel, NotifyQueue, NotifyWorker};
