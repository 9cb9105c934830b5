use colored::Colorize;
use siblink_core::Notifier;

/// Prints user-facing notices to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        println!("{} {}", "siblink:".cyan().bold(), message);
    }
}
