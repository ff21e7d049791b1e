use protos::longrunning::{operation, Operation};
use protos::rpc;

/// What a snapshot of an operation says about its outcome.
#[derive(Clone, Debug, PartialEq)]
pub enum OperationState {
    Running,
    Succeeded(prost_types::Any),
    Failed(rpc::Status),
}

impl OperationState {
    pub fn is_done(&self) -> bool {
        !matches!(self, OperationState::Running)
    }

    /// Finished because somebody cancelled it.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, OperationState::Failed(status) if status.code == rpc::Code::Cancelled as i32)
    }
}

impl From<&Operation> for OperationState {
    fn from(operation: &Operation) -> Self {
        if !operation.done {
            return OperationState::Running;
        }
        match &operation.result {
            Some(operation::Result::Response(response)) => OperationState::Succeeded(response.clone()),
            Some(operation::Result::Error(status)) => OperationState::Failed(status.clone()),
            // Done without a payload: nothing went wrong, there is just nothing to return.
            None => OperationState::Succeeded(prost_types::Any::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfinished_operations_are_running() {
        let op = Operation {
            name: "operations/a".into(),
            done: false,
            ..Default::default()
        };
        assert_eq!(OperationState::from(&op), OperationState::Running);
        assert!(!OperationState::from(&op).is_done());
    }

    #[test]
    fn result_union_maps_to_outcome() {
        let response = prost_types::Any {
            type_url: "type.googleapis.com/google.protobuf.Duration".into(),
            value: vec![8, 1],
        };
        let op = Operation {
            done: true,
            result: Some(operation::Result::Response(response.clone())),
            ..Default::default()
        };
        assert_eq!(OperationState::from(&op), OperationState::Succeeded(response));

        let cancelled = rpc::Status {
            code: rpc::Code::Cancelled.into(),
            message: "cancelled".into(),
            details: vec![],
        };
        let op = Operation {
            done: true,
            result: Some(operation::Result::Error(cancelled.clone())),
            ..Default::default()
        };
        let state = OperationState::from(&op);
        assert!(state.is_done());
        assert!(state.is_cancelled());
        assert_eq!(state, OperationState::Failed(cancelled));
    }

    #[test]
    fn done_without_result_is_an_empty_success() {
        let op = Operation {
            done: true,
            ..Default::default()
        };
        assert_eq!(
            OperationState::from(&op),
            OperationState::Succeeded(prost_types::Any::default())
        );
    }
}
