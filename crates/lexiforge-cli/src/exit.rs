//! Error to exit-code mapping.

use lexiforge_core::PipelineError;

/// Full pipeline completion.
pub const EXIT_SUCCESS: i32 = 0;
/// Stage or storage failure during the run.
pub const EXIT_PIPELINE_ERROR: i32 = 1;
/// Configuration or vocabulary error, reported before any external call.
pub const EXIT_SETUP_ERROR: i32 = 2;

/// Map a pipeline error to the process exit code.
pub fn exit_code_for_error(err: &PipelineError) -> i32 {
    if err.is_setup_error() {
        EXIT_SETUP_ERROR
    } else {
        EXIT_PIPELINE_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_errors_exit_two() {
        let err = PipelineError::Config {
            message: "bad".into(),
        };
        assert_eq!(exit_code_for_error(&err), EXIT_SETUP_ERROR);
        let err = PipelineError::UnsupportedBackend {
            backend: "dalle".into(),
        };
        assert_eq!(exit_code_for_error(&err), EXIT_SETUP_ERROR);
    }

    #[test]
    fn test_stage_errors_exit_one() {
        let err = PipelineError::generation("猫", "backend down");
        assert_eq!(exit_code_for_error(&err), EXIT_PIPELINE_ERROR);
    }
}
