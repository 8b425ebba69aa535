//! Human-readable error descriptions for stderr diagnostics.

use dtwin_core::error::EngineError;

/// Map an `eyre::Report` to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(ee) = err.downcast_ref::<EngineError>() {
        return match ee {
            EngineError::InvalidScenario(msg) => format!(
                "What happened: the scenario built from the request is internally inconsistent ({msg}).\nLikely causes: a hand-built scenario bypassed the request sanitizer.\nHow to fix: submit the request through the normal `--request` path rather than constructing a scenario directly."
            ),
            EngineError::NonFiniteState { field, step } => format!(
                "What happened: {field} went non-finite at step {step}.\nLikely causes: extreme tuning or disturbance values drove the plant model out of its numeric range.\nHow to fix: moderate the offending gain/tuning/disturbance amplitude and rerun."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("no such file") || lower.contains("read request") {
        return format!(
            "What happened: the request file could not be read.\nLikely causes: wrong path or missing permissions.\nHow to fix: check --request and try again. Original: {msg}"
        );
    }

    if lower.contains("parse request") {
        return format!(
            "What happened: the request body did not parse.\nLikely causes: malformed TOML/JSON or the wrong --format was forced.\nHow to fix: validate the request body, or drop --format to infer it from the file extension. Original: {msg}"
        );
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!("Something went wrong.{cause}\nHow to fix: re-run with --log-level=debug for details. Original: {msg}")
}

/// Exit code for a fatal CLI-level error. The engine itself never aborts a
/// well-formed request; any nonzero exit here means the request could not be
/// read, parsed, or run at all.
pub fn exit_code_for_error(_err: &eyre::Report) -> i32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_are_humanized_with_their_own_fields() {
        let err = eyre::Report::new(EngineError::NonFiniteState { field: "TT106", step: 12 });
        let text = humanize(&err);
        assert!(text.contains("TT106"));
        assert!(text.contains("step 12"));
    }

    #[test]
    fn unrecognized_errors_fall_back_to_a_generic_message() {
        let err = eyre::eyre!("some unexpected failure");
        let text = humanize(&err);
        assert!(text.contains("Something went wrong"));
    }
}
