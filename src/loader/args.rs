//! Compiler argument rewriting.

/// Compiler flag that turns off the compiler's built-in validation.
pub const DISABLE_VALIDATION_ARG: &str = "-Vd";

/// Copy `args` and append `-Vd`.
///
/// The caller's list is left untouched. Applying this twice yields two
/// `-Vd` flags; callers inject once per forwarded call.
pub fn add_disable_validation_arg<S: AsRef<str>>(args: &[S]) -> Vec<String> {
    let mut new_args = Vec::with_capacity(args.len() + 1);
    new_args.extend(args.iter().map(|arg| arg.as_ref().to_string()));
    new_args.push(DISABLE_VALIDATION_ARG.to_string());
    new_args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_flag() {
        let original = vec!["-O2".to_string(), "-E".to_string()];
        let injected = add_disable_validation_arg(&original);

        assert_eq!(injected, vec!["-O2", "-E", "-Vd"]);
        assert_eq!(original, vec!["-O2", "-E"]);
    }

    #[test]
    fn test_empty_arguments() {
        let injected = add_disable_validation_arg::<&str>(&[]);
        assert_eq!(injected, vec!["-Vd"]);
    }

    #[test]
    fn test_appended_after_existing_flag() {
        // Appended even when already present.
        let injected = add_disable_validation_arg(&["-Vd", "-Zi"]);
        assert_eq!(injected, vec!["-Vd", "-Zi", "-Vd"]);
    }

    #[test]
    fn test_double_injection_is_not_detected() {
        let once = add_disable_validation_arg(&["-O3"]);
        let twice = add_disable_validation_arg(&once);
        assert_eq!(twice, vec!["-O3", "-Vd", "-Vd"]);
    }
}
