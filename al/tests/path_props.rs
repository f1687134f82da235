//! Property tests for workspace path resolution

use std::path::Path;

use agentloop::tools::{ToolError, resolve_path};
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_][a-zA-Z0-9_.-]{0,11}"
}

proptest! {
    #[test]
    fn any_parent_segment_is_rejected(
        mut parts in prop::collection::vec(segment(), 0..6),
        at in 0usize..6,
    ) {
        let at = at.min(parts.len());
        parts.insert(at, "..".to_string());
        let relative = parts.join("/");

        let result = resolve_path(Path::new("/srv/ws/session_1"), &relative);
        prop_assert!(matches!(result, Err(ToolError::PathEscape { .. })), "accepted {}", relative);
    }

    #[test]
    fn plain_paths_stay_under_root(parts in prop::collection::vec(segment(), 1..6)) {
        let root = Path::new("/srv/ws/session_1");
        let relative = parts.join("/");

        let resolved = resolve_path(root, &relative).unwrap();
        prop_assert!(resolved.starts_with(root));
        prop_assert_eq!(resolved, root.join(&relative));
    }

    #[test]
    fn absolute_paths_are_rejected(parts in prop::collection::vec(segment(), 0..4)) {
        let absolute = format!("/{}", parts.join("/"));
        prop_assert!(resolve_path(Path::new("/srv/ws"), &absolute).is_err());
    }
}
