use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What happens after a stage fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Keep running the remaining stages of the playbook.
    ContinueStages,
    /// Stop the current playbook; later playbooks still run.
    #[default]
    AbortPlaybook,
    /// Stop the current playbook and skip every playbook after it.
    AbortRun,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::ContinueStages => "continue-stages",
            FailurePolicy::AbortPlaybook => "abort-playbook",
            FailurePolicy::AbortRun => "abort-run",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "continue-stages" => Ok(FailurePolicy::ContinueStages),
            "abort-playbook" => Ok(FailurePolicy::AbortPlaybook),
            "abort-run" => Ok(FailurePolicy::AbortRun),
            other => Err(format!(
                "unknown failure policy '{other}' (expected continue-stages, abort-playbook or abort-run)"
            )),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExecutorConfig {
    pub failure_policy: FailurePolicy,
}
