//! Events that drive the session

use crate::directory::ContactId;
use crate::scheduler::ReplyTask;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Composer events
    DraftChanged {
        text: String,
    },
    /// Commit the current draft (send button or Enter)
    Send,

    // Selection events
    Select {
        contact_id: ContactId,
    },
    ClearSelection,

    // Scheduler events
    ReplyDue {
        task: ReplyTask,
    },
}
