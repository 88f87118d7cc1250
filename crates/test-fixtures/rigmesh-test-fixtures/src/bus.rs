//! Recording message bus.

use rigmesh_model_core::{Address, MessageError, MessageSender, ModelNotification};

#[derive(Default)]
pub struct RecordingSender {
    pub sent: Vec<(Address, Address, ModelNotification)>,
    /// When set, every send fails with `InvalidAddress`.
    pub fail: bool,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageSender for RecordingSender {
    fn send(
        &mut self,
        sender: Address,
        receiver: Address,
        message: ModelNotification,
    ) -> Result<(), MessageError> {
        if self.fail {
            return Err(MessageError::InvalidAddress);
        }
        self.sent.push((sender, receiver, message));
        Ok(())
    }
}
