// User and group resolution for privilege drop
use nix::unistd::{Group, Uid, User};

use hostexec_core::domain::{GroupSpec, LaunchOptions, UserSpec};
use hostexec_core::{ProcessError, Result};

/// Numeric ids a child should run under
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity {
    pub uid: Option<u32>,
    pub gid: Option<u32>,
}

impl Identity {
    pub fn is_empty(&self) -> bool {
        self.uid.is_none() && self.gid.is_none()
    }
}

/// Resolve a user name or uid to a uid
///
/// Numeric ids are taken as-is; they need not exist in the passwd database.
pub fn resolve_user(user: &UserSpec) -> Result<u32> {
    match user {
        UserSpec::Id(uid) => Ok(*uid),
        UserSpec::Name(name) => User::from_name(name)
            .map_err(|e| ProcessError::UserLookup(format!("cannot look up user '{}': {}", name, e)))?
            .map(|u| u.uid.as_raw())
            .ok_or_else(|| ProcessError::UserLookup(format!("no such user '{}'", name))),
    }
}

/// Resolve a group name or gid to a gid
pub fn resolve_group(group: &GroupSpec) -> Result<u32> {
    match group {
        GroupSpec::Id(gid) => Ok(*gid),
        GroupSpec::Name(name) => Group::from_name(name)
            .map_err(|e| ProcessError::UserLookup(format!("cannot look up group '{}': {}", name, e)))?
            .map(|g| g.gid.as_raw())
            .ok_or_else(|| ProcessError::UserLookup(format!("no such group '{}'", name))),
    }
}

/// Ids requested by the launch options
///
/// A user without a group keeps the caller's gid.
pub fn resolve_identity(options: &LaunchOptions) -> Result<Identity> {
    Ok(Identity {
        uid: options.user.as_ref().map(resolve_user).transpose()?,
        gid: options.group.as_ref().map(resolve_group).transpose()?,
    })
}

/// Name for `uid`, or the number when it has no passwd entry
pub fn user_name(uid: u32) -> String {
    match User::from_uid(Uid::from_raw(uid)) {
        Ok(Some(user)) => user.name,
        _ => uid.to_string(),
    }
}

pub fn running_as_root() -> bool {
    Uid::effective().is_root()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ids_pass_through() {
        assert_eq!(resolve_user(&UserSpec::Id(4242)).unwrap(), 4242);
        assert_eq!(resolve_group(&GroupSpec::Id(4242)).unwrap(), 4242);
    }

    #[test]
    fn test_root_resolves_to_zero() {
        assert_eq!(resolve_user(&UserSpec::from("root")).unwrap(), 0);
        assert_eq!(user_name(0), "root");
    }

    #[test]
    fn test_unknown_user_is_lookup_error() {
        let err = resolve_user(&UserSpec::from("no-such-user-hostexec")).unwrap_err();
        assert!(matches!(err, ProcessError::UserLookup(_)));
        let err = resolve_group(&GroupSpec::from("no-such-group-hostexec")).unwrap_err();
        assert!(err.to_string().contains("no-such-group-hostexec"));
    }

    #[test]
    fn test_identity_from_options() {
        let identity = resolve_identity(&LaunchOptions::new()).unwrap();
        assert!(identity.is_empty());

        let identity = resolve_identity(&LaunchOptions::new().run_as(1000u32)).unwrap();
        assert_eq!(identity, Identity { uid: Some(1000), gid: None });
    }

    #[test]
    fn test_unknown_uid_renders_numeric() {
        assert_eq!(user_name(3_999_999), "3999999");
    }

    #[test]
    fn test_root_check_matches_euid() {
        assert_eq!(running_as_root(), nix::unistd::geteuid().as_raw() == 0);
    }
}
