//! the fixed action-to-permission lookup table.

use quadscale_types::Permission;

/// the verb part of an action.
///
/// actions may arrive as bare verbs (`"access"`), dotted
/// (`"service.access"`), or as literal permissions (`"service:access"`);
/// the verb is always the last segment.
pub fn action_verb(action: &str) -> &str {
    action
        .rsplit(['.', ':'])
        .next()
        .unwrap_or(action)
}

/// translate an action/resource verb to the canonical [`Permission`].
///
/// an action that already contains `:` is treated as a literal
/// permission tag. dotted actions (`"service.access"`) translate the
/// namespace directly. bare service/realm/user/cross-realm verbs map
/// through the fixed table below. anything else returns `None`,
/// meaning no permission is required - callers allow such requests
/// unconditionally. this fail-open default is intentional and covered
/// by tests; see the engine docs before relying on it.
pub fn action_to_permission(action: &str) -> Option<Permission> {
    if action.contains(':') {
        return Some(Permission::new(action));
    }

    if let Some((namespace, verb)) = action.split_once('.') {
        return match namespace {
            "service" | "realm" | "user" | "crossrealm" | "cross-realm" => {
                Some(Permission::new(format!("{}:{}", namespace, verb)))
            }
            _ => None,
        };
    }

    match action {
        "list" => Some(Permission::new("service:list")),
        "view" => Some(Permission::new("service:view")),
        "access" => Some(Permission::new("service:access")),
        "register" => Some(Permission::new("service:register")),
        "unregister" => Some(Permission::new("service:unregister")),
        "admin" => Some(Permission::new("realm:admin")),
        "manage" => Some(Permission::new("realm:manage")),
        "federate" => Some(Permission::new("realm:federate")),
        "trust" => Some(Permission::new("realm:trust")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_permission_passes_through() {
        assert_eq!(
            action_to_permission("service:access"),
            Some(Permission::new("service:access"))
        );
        assert_eq!(
            action_to_permission("custom:thing"),
            Some(Permission::new("custom:thing"))
        );
    }

    #[test]
    fn dotted_actions_translate() {
        assert_eq!(
            action_to_permission("service.access"),
            Some(Permission::new("service:access"))
        );
        assert_eq!(
            action_to_permission("realm.federate"),
            Some(Permission::new("realm:federate"))
        );
    }

    #[test]
    fn bare_verbs_use_the_table() {
        assert_eq!(
            action_to_permission("register"),
            Some(Permission::new("service:register"))
        );
        assert_eq!(
            action_to_permission("admin"),
            Some(Permission::new("realm:admin"))
        );
    }

    #[test]
    fn unknown_actions_require_no_permission() {
        assert_eq!(action_to_permission("dance"), None);
        assert_eq!(action_to_permission("frobnicate.widget"), None);
    }

    #[test]
    fn verb_extraction() {
        assert_eq!(action_verb("service.access"), "access");
        assert_eq!(action_verb("service:register"), "register");
        assert_eq!(action_verb("view"), "view");
    }
}
