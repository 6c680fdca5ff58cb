//! Pipeline logging helpers.
//!
//! Thin wrappers over the `log` facade. The binary installs `env_logger`;
//! library users bring their own logger.

/// Prefix `message` with one step of indentation per nesting level
/// (a row's failures under the row).
fn indented(message: &str, indent: u8) -> String {
    format!("{}{}", "   ".repeat(indent as usize), message)
}

pub fn log_debug(msg: impl Into<String>) {
    log::debug!("{}", msg.into());
}

pub fn log_info(msg: impl Into<String>) {
    log::info!("{}", msg.into());
}

pub fn log_success(msg: impl Into<String>) {
    log::info!("✓ {}", msg.into());
}

pub fn log_warning(msg: impl Into<String>) {
    log::warn!("{}", msg.into());
}

pub fn log_warning_indent(msg: impl Into<String>, indent: u8) {
    log::warn!("{}", indented(&msg.into(), indent));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indentation() {
        assert_eq!(indented("row 2", 0), "row 2");
        assert_eq!(indented("1 invalid cell", 2), "      1 invalid cell");
    }

    #[test]
    fn test_helpers_without_logger() {
        log_debug("nobody listens");
        log_success(String::from("done"));
        log_warning_indent("row 3", 1);
    }
}
