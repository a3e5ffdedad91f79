use shadow_rs::shadow;
use tracing::info;

shadow!(build);

pub fn log_version_info() {
    info!("{}", short_version_info());
    info!(
        "Build date: {} ({}, profiling {})",
        build::BUILD_TIME_2822,
        build::BUILD_RUST_CHANNEL,
        if cfg!(feature = "profiling") { "on" } else { "off" }
    );
}

pub fn short_version_info() -> String {
    format!(
        "{} {} ({}@{}{})",
        build::PROJECT_NAME,
        build::PKG_VERSION,
        build::BRANCH,
        build::SHORT_COMMIT,
        if build::GIT_CLEAN { "" } else { "+dirty" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_version_info() {
        let info = short_version_info();
        assert!(info.starts_with("viewport-query-cli "), "{info}");
        assert!(info.contains(build::PKG_VERSION));
        assert_eq!(build::PKG_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
