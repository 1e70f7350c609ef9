//! CLI subcommands

pub mod matcher;
pub mod render;
pub mod settings;

use console::style;
use stagepanel_common::{Notification, NotificationKind};

/// Print a toast to the terminal
pub fn print_toast(toast: &Notification) {
    match toast.kind {
        NotificationKind::Success => println!("{} {}", style("✔").green().bold(), toast.message),
        NotificationKind::Danger => eprintln!("{} {}", style("✘").red().bold(), toast.message),
    }
}
