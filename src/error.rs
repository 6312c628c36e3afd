/// Serve Error
#[derive(Debug)]
pub struct Error {
    message: String,
}

impl Error {
    /// Wrap anything printable
    ///
    /// Custom request handlers use this to report a fault; the serve loop
    /// answers such faults with a 500 carrying the message.
    pub fn new(message: impl ToString) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.message.fmt(fmt)
    }
}

impl std::error::Error for Error {}
