use atlas_model::NodeId;

/// Where a work item sits in its lifecycle. Items begin pending, pass
/// through in-flight while a worker owns them, and end done or failed.
/// Cancellation leaves undispatched items pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkState {
    #[default]
    Pending,
    InFlight,
    Done,
    Failed,
}

impl WorkState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// One unit of summarization work bound to exactly one node. Results are
/// matched back by `id`, never by completion order.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub id: NodeId,
    pub input: String,
    pub state: WorkState,
    pub attempts: u32,
    pub result: Option<String>,
}

impl WorkItem {
    #[must_use]
    pub fn new(id: NodeId, input: impl Into<String>) -> Self {
        Self {
            id,
            input: input.into(),
            state: WorkState::Pending,
            attempts: 0,
            result: None,
        }
    }
}
