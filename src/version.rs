//! Build version derived from source control metadata.

/// `<commit time>-<revision>`, suffixed with `-dirty` when the working tree
/// had local modifications at build time. Falls back to the package version
/// when the build had no git metadata.
pub fn version() -> String {
    format_version(
        option_env!("FARM_VCS_TIME"),
        option_env!("FARM_VCS_REVISION"),
        option_env!("FARM_VCS_MODIFIED") == Some("true"),
    )
}

fn format_version(time: Option<&str>, revision: Option<&str>, modified: bool) -> String {
    let (Some(time), Some(revision)) = (time, revision) else {
        return env!("CARGO_PKG_VERSION").to_string();
    };
    if modified {
        format!("{time}-{revision}-dirty")
    } else {
        format!("{time}-{revision}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_version() {
        let time = Some("2024-05-02T10:00:00Z");
        let rev = Some("4f2a9c1");
        assert_eq!(format_version(time, rev, false), "2024-05-02T10:00:00Z-4f2a9c1");
        assert_eq!(format_version(time, rev, true), "2024-05-02T10:00:00Z-4f2a9c1-dirty");
        assert_eq!(format_version(None, rev, true), env!("CARGO_PKG_VERSION"));
    }
}
