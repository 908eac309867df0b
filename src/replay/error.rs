use thiserror::Error;

/// Errors raised when sampling a replay store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("Replay store holds {stored} transitions, cannot sample {requested}")]
    Underfull { stored: usize, requested: usize },

    #[error("Cannot sample an empty batch")]
    EmptyBatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underfull_display() {
        let e = BufferError::Underfull {
            stored: 3,
            requested: 8,
        };
        assert_eq!(e.to_string(), "Replay store holds 3 transitions, cannot sample 8");
    }

    #[test]
    fn empty_batch_display() {
        assert_eq!(BufferError::EmptyBatch.to_string(), "Cannot sample an empty batch");
    }
}
