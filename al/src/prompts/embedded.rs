//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Default persona used when no persona file is configured
pub const PERSONA: &str = include_str!("../../prompts/persona.pmt");

/// System prompt wrapper around the persona
pub const SYSTEM: &str = include_str!("../../prompts/system.pmt");

/// First user turn of every session
pub const TASK: &str = include_str!("../../prompts/task.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "persona" => Some(PERSONA),
        "system" => Some(SYSTEM),
        "task" => Some(TASK),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded_known() {
        assert!(get_embedded("persona").unwrap().contains("software engineer"));
        assert!(get_embedded("system").unwrap().contains("{{persona}}"));
        assert!(get_embedded("task").unwrap().contains("{{task}}"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("plan").is_none());
    }
}
