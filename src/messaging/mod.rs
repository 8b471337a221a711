// Messaging - lock-free plumbing between control and audio threads

pub mod channels;
pub mod command;
pub mod notification;

pub use channels::{
    create_command_channel, create_notification_channel, CommandConsumer, CommandProducer,
    NotificationConsumer, NotificationProducer,
};
pub use command::Command;
pub use notification::{Notification, NotificationCategory, NotificationLevel};
