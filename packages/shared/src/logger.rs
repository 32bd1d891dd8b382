//! Logging setup utilities for the Belltower binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build the default filter directive for the given crate targets.
///
/// Targets are crate names as they appear in `tracing` metadata, so dashes
/// are converted to underscores (`belltower-server` -> `belltower_server`).
pub fn default_directive(targets: &[&str], default_log_level: &str) -> String {
    targets
        .iter()
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The level applies to every crate listed in `targets`. It can be overridden
/// with the `RUST_LOG` environment variable.
///
/// # Examples
///
/// ```no_run
/// use belltower_shared::logger::setup_logger;
///
/// setup_logger(&["belltower-server", "belltower-shared"], "debug");
/// ```
pub fn setup_logger(targets: &[&str], default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(targets, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_normalizes_crate_names() {
        // テスト項目: クレート名のハイフンがアンダースコアに変換される
        // given (前提条件):
        let targets = ["belltower-server", "belltower-shared"];

        // when (操作):
        let directive = default_directive(&targets, "debug");

        // then (期待する結果):
        assert_eq!(directive, "belltower_server=debug,belltower_shared=debug");
    }

    #[test]
    fn test_default_directive_with_single_target() {
        // テスト項目: 単一ターゲットの場合、区切り文字なしで生成される
        // given (前提条件):
        let targets = ["belltower_client"];

        // when (操作):
        let directive = default_directive(&targets, "info");

        // then (期待する結果):
        assert_eq!(directive, "belltower_client=info");
    }
}
