use thiserror::Error;

/// Malformed task graphs. These abort the planning pass.
///
/// Not finding a plan is not an error; see [`crate::PlanAttempt::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("compound task `{task}` produced no methods")]
    NoMethods { task: String },

    #[error("decomposition snapshot owner #{node} is not an expanded compound task")]
    NotCompound { node: usize },

    #[error("task #{node} was visited after its operator was built")]
    Finalized { node: usize },

    #[error("plan entry #{node} is not a primitive task")]
    NotPrimitive { node: usize },
}

pub type Result<T> = std::result::Result<T, PlanError>;
