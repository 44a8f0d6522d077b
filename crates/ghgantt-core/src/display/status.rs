//! One-line status messages.

use std::fmt;

/// Outcome of a command that has nothing richer to show.
pub struct OperationStatus {
    pub message: String,
    pub success: bool,
}

impl OperationStatus {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.success { "**OK**" } else { "**Error**" };
        writeln!(f, "{prefix} {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_status_prefix() {
        let ok = OperationStatus::success("Wrote config.yaml");
        assert_eq!(ok.to_string(), "**OK** Wrote config.yaml\n");

        let failed = OperationStatus::failure("Project not reachable");
        assert!(failed.to_string().starts_with("**Error**"));
    }
}
