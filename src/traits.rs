/// Trait for printing messages to the console, allowing for testable output
pub trait MessageHandler {
    fn print(&self, message: &str);
    fn eprint(&self, message: &str);
}

/// Default implementation that calls println!/eprintln!
pub struct DefaultMessageHandler;

impl MessageHandler for DefaultMessageHandler {
    fn print(&self, message: &str) {
        println!("{}", message);
    }

    fn eprint(&self, message: &str) {
        eprintln!("{}", message);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingMessageHandler;
    use super::*;

    #[test]
    fn test_default_message_handler() {
        let handler: Box<dyn MessageHandler> = Box::new(DefaultMessageHandler);
        handler.print("Test message");
        handler.eprint("Test error message");
    }

    #[test]
    fn test_recording_message_handler() {
        let handler = RecordingMessageHandler::default();

        handler.print("Hello");
        handler.eprint("World");

        assert_eq!(*handler.printed.borrow(), vec!["Hello".to_string()]);
        assert_eq!(*handler.eprinted.borrow(), vec!["World".to_string()]);
    }
}
