/// Identity of the running build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub revision: i64,
    pub version: &'static str,
}

impl BuildInfo {
    /// Build information baked in at compile time. `RELCHECK_REVISION` holds
    /// the build's revision number; builds without it report revision 0 and
    /// therefore see every published release as newer.
    #[must_use]
    pub fn current() -> Self {
        Self {
            revision: parse_revision(option_env!("RELCHECK_REVISION")),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    #[must_use]
    pub fn with_revision(revision: i64) -> Self {
        Self {
            revision,
            ..Self::current()
        }
    }
}

fn parse_revision(raw: Option<&str>) -> i64 {
    raw.and_then(|value| value.trim().parse().ok()).unwrap_or(0)
}
