//! Admin privilege check.

/// Decides whether a handle belongs to an administrator.
pub trait Authorizer: Send + Sync {
    /// Whether `handle` is an admin. Users without a handle never are.
    fn is_admin(&self, handle: Option<&str>) -> bool;
}

/// Fixed allowlist of admin handles.
///
/// Matching ignores case and a leading `@`.
#[derive(Debug, Clone, Default)]
pub struct AdminAllowlist {
    handles: Vec<String>,
}

impl AdminAllowlist {
    /// Build an allowlist from handles.
    pub fn new<I, S>(handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            handles: handles
                .into_iter()
                .map(|h| normalize(h.as_ref()))
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// Number of admins.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether nobody is an admin.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Authorizer for AdminAllowlist {
    fn is_admin(&self, handle: Option<&str>) -> bool {
        let Some(handle) = handle else {
            return false;
        };
        let clean = normalize(handle);
        !clean.is_empty() && self.handles.iter().any(|h| *h == clean)
    }
}

fn normalize(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_lowercase()
}
