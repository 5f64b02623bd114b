//! Pipeline stages and run states.

use std::fmt;

/// One step of the deployment pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Locate,
    Authenticate,
    Deploy,
    Activate,
    Verify,
}

impl Stage {
    /// Stages in execution order.
    pub const ALL: [Self; 5] = [
        Self::Locate,
        Self::Authenticate,
        Self::Deploy,
        Self::Activate,
        Self::Verify,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Locate => "locate",
            Self::Authenticate => "authenticate",
            Self::Deploy => "deploy",
            Self::Activate => "activate",
            Self::Verify => "verify",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a pipeline run is.
///
/// Runs move strictly forward through the working states; `Done` and
/// `Failed` are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Locating,
    Authenticating,
    Deploying,
    Activating,
    Verifying,
    Done,
    Failed(Stage),
}

impl PipelineState {
    /// The state entered when `stage` starts.
    #[must_use]
    pub const fn running(stage: Stage) -> Self {
        match stage {
            Stage::Locate => Self::Locating,
            Stage::Authenticate => Self::Authenticating,
            Stage::Deploy => Self::Deploying,
            Stage::Activate => Self::Activating,
            Stage::Verify => Self::Verifying,
        }
    }

    /// The stage being worked on, if any.
    #[must_use]
    pub const fn stage(self) -> Option<Stage> {
        match self {
            Self::Locating => Some(Stage::Locate),
            Self::Authenticating => Some(Stage::Authenticate),
            Self::Deploying => Some(Stage::Deploy),
            Self::Activating => Some(Stage::Activate),
            Self::Verifying => Some(Stage::Verify),
            Self::Idle | Self::Done | Self::Failed(_) => None,
        }
    }

    /// The state that follows a successful step, `None` from a terminal state.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Locating),
            Self::Locating => Some(Self::Authenticating),
            Self::Authenticating => Some(Self::Deploying),
            Self::Deploying => Some(Self::Activating),
            Self::Activating => Some(Self::Verifying),
            Self::Verifying => Some(Self::Done),
            Self::Done | Self::Failed(_) => None,
        }
    }

    /// The state after a failure in the current stage.
    ///
    /// A failure before any stage started is attributed to locating.
    #[must_use]
    pub const fn fail(self) -> Self {
        match self {
            Self::Done | Self::Failed(_) => self,
            Self::Idle => Self::Failed(Stage::Locate),
            _ => match self.stage() {
                Some(stage) => Self::Failed(stage),
                None => self,
            },
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Locating => f.write_str("locating"),
            Self::Authenticating => f.write_str("authenticating"),
            Self::Deploying => f.write_str("deploying"),
            Self::Activating => f.write_str("activating"),
            Self::Verifying => f.write_str("verifying"),
            Self::Done => f.write_str("done"),
            Self::Failed(stage) => write!(f, "failed({stage})"),
        }
    }
}
