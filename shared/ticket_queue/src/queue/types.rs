/// Largest batch SQS returns from one receive call
pub const MAX_BATCH_SIZE: i32 = 10;

/// Longest long-poll wait SQS accepts
pub const MAX_WAIT_TIME_SECONDS: i32 = 20;

/// A message leased from a queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Raw message body
    pub body: String,
    /// Receipt handle for deleting the message while the lease is held
    pub receipt_handle: String,
    /// Message ID
    pub message_id: String,
    /// Approximate number of times the message has been received
    pub receive_count: Option<u32>,
}

/// Clamps a requested batch size to the range SQS accepts
#[must_use]
pub const fn clamp_batch_size(max_messages: i32) -> i32 {
    if max_messages < 1 {
        1
    } else if max_messages > MAX_BATCH_SIZE {
        MAX_BATCH_SIZE
    } else {
        max_messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_batch_size() {
        assert_eq!(clamp_batch_size(0), 1);
        assert_eq!(clamp_batch_size(1), 1);
        assert_eq!(clamp_batch_size(7), 7);
        assert_eq!(clamp_batch_size(25), MAX_BATCH_SIZE);
    }
}
