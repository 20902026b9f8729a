//! Filter lifecycle integration tests
//!
//! Tests the full recipe filter flow:
//! - Process matching ahead of validation
//! - Exit code classification and reporter callbacks
//! - Aggregation across many recipes
//! - Host rules rejecting the host up front

mod common;

use common::*;
use preflight_filter::version::WINDOWS_VERSION_UNIDENTIFIED;
use preflight_filter::{CancellationToken, FilterError, Outcome, RecipeState};

#[cfg(unix)]
mod validation_commands {
    use super::*;

    #[tokio::test]
    async fn test_matching_process_with_passing_check_is_kept() {
        let fixture = RunnerFixture::new();
        let recipe = RecipeBuilder::new()
            .process_match("php-fpm")
            .validation("exit 0")
            .build();
        let host = HostBuilder::linux().process("php-fpm", "php-fpm").build();

        let result = fixture
            .runner
            .evaluate_all(&CancellationToken::new(), &[recipe], &host)
            .await;

        assert!(result.is_ok(), "Expected Ok, got {:?}", result);
        assert_callbacks(&fixture.stats, 0, 0);
    }

    #[tokio::test]
    async fn test_detected_exit_code_reports_detected() {
        let fixture = RunnerFixture::new();
        let recipe = RecipeBuilder::new()
            .process_match("apache2")
            .validation("exit 132")
            .build();
        let host = HostBuilder::linux().process("apache2", "apache2").build();

        let outcome = fixture
            .runner
            .evaluate(&CancellationToken::new(), &recipe, &host)
            .await;

        assert!(matches!(outcome, Outcome::DetectedUnsupported { .. }));
        assert_callbacks(&fixture.stats, 1, 0);
    }

    #[tokio::test]
    async fn test_other_exit_code_reports_unsupported() {
        let fixture = RunnerFixture::new();
        let recipe = RecipeBuilder::new()
            .process_match("apache2")
            .validation("exit 1")
            .build();
        let host = HostBuilder::linux().process("apache2", "apache2").build();

        let report = expect_excluded(
            fixture
                .runner
                .evaluate_all(&CancellationToken::new(), &[recipe], &host)
                .await,
        );

        assert_eq!(report.len(), 1);
        assert_excluded_as(&report, "test-recipe", RecipeState::Unsupported);
        assert_callbacks(&fixture.stats, 0, 1);
    }

    #[tokio::test]
    async fn test_check_output_does_not_affect_verdict() {
        let fixture = RunnerFixture::new();
        let recipe = RecipeBuilder::new().validation("echo 1234").build();

        let result = fixture
            .runner
            .evaluate_all(&CancellationToken::new(), &[recipe], &HostBuilder::linux().build())
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_command_excludes_recipe() {
        let fixture = RunnerFixture::new();
        let recipe = RecipeBuilder::new().validation("bogus command").build();

        let result = fixture
            .runner
            .evaluate_all(&CancellationToken::new(), &[recipe], &HostBuilder::linux().build())
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_output_becomes_status_message() {
        let fixture = RunnerFixture::new();
        let recipe = RecipeBuilder::new()
            .validation("echo 'MySQL 5.5 is too old' >&2; exit 132")
            .build();

        let outcome = fixture
            .runner
            .evaluate(&CancellationToken::new(), &recipe, &HostBuilder::linux().build())
            .await;

        assert_eq!(
            outcome,
            Outcome::DetectedUnsupported {
                message: "MySQL 5.5 is too old".to_string()
            }
        );
        let statuses = fixture.reporter.statuses();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].event.message, "MySQL 5.5 is too old");
        assert_eq!(statuses[0].event.recipe_name, "test-recipe");
    }

    #[tokio::test]
    async fn test_check_sees_host_context() {
        let fixture = RunnerFixture::new();
        let recipe = RecipeBuilder::new()
            .process_match("mysqld")
            .validation(r#"[ "$PREFLIGHT_OS" = linux ] && [ "$PREFLIGHT_RECIPE_NAME" = mysql ] || exit 1"#)
            .name("mysql")
            .build();
        let host = HostBuilder::linux()
            .process("mysqld", "/usr/sbin/mysqld --daemonize")
            .build();

        let outcome = fixture
            .runner
            .evaluate(&CancellationToken::new(), &recipe, &host)
            .await;

        assert_eq!(outcome, Outcome::Compatible);
    }
}

#[cfg(unix)]
mod aggregation {
    use super::*;

    fn mixed_recipes() -> Vec<preflight_core::Recipe> {
        vec![
            RecipeBuilder::new().name("ok-one").validation("exit 0").build(),
            RecipeBuilder::new().name("detected").validation("exit 132").build(),
            RecipeBuilder::new().name("ok-two").build(),
            RecipeBuilder::new().name("unsupported").validation("exit 3").build(),
            RecipeBuilder::new()
                .name("no-process")
                .process_match("redis-server")
                .build(),
            RecipeBuilder::new().name("ok-three").validation("true").build(),
        ]
    }

    #[tokio::test]
    async fn test_report_lists_every_excluded_recipe() {
        let fixture = RunnerFixture::new();

        let report = expect_excluded(
            fixture
                .runner
                .evaluate_all(&CancellationToken::new(), &mixed_recipes(), &HostBuilder::linux().build())
                .await,
        );

        assert_eq!(report.names(), vec!["detected", "unsupported", "no-process"]);
        assert_excluded_as(&report, "detected", RecipeState::DetectedUnsupported);
        assert_excluded_as(&report, "unsupported", RecipeState::Unsupported);
        assert_excluded_as(&report, "no-process", RecipeState::ProcessMatchFailed);
        assert_callbacks(&fixture.stats, 1, 2);
    }

    #[tokio::test]
    async fn test_summary_keeps_compatible_recipes_in_order() {
        let fixture = RunnerFixture::new();

        let summary = fixture
            .runner
            .filter_compatible(&CancellationToken::new(), &mixed_recipes(), &HostBuilder::linux().build())
            .await
            .unwrap();

        let names: Vec<&str> = summary.compatible().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ok-one", "ok-two", "ok-three"]);
        assert!(!summary.all_compatible());
    }

    #[tokio::test]
    async fn test_concurrent_run_matches_sequential_run() {
        let sequential = RunnerFixture::new();
        let concurrent = RunnerFixture::with_concurrency(4);
        let host = HostBuilder::linux().build();
        let token = CancellationToken::new();

        let seq_report = expect_excluded(
            sequential
                .runner
                .evaluate_all(&token, &mixed_recipes(), &host)
                .await,
        );
        let con_report = expect_excluded(
            concurrent
                .runner
                .evaluate_all(&token, &mixed_recipes(), &host)
                .await,
        );

        assert_eq!(seq_report, con_report);
        assert_callbacks(&concurrent.stats, 1, 2);
    }

    #[tokio::test]
    async fn test_exclusion_count_ignores_input_order() {
        let mut recipes = mixed_recipes();
        recipes.reverse();
        let fixture = RunnerFixture::new();

        let report = expect_excluded(
            fixture
                .runner
                .evaluate_all(&CancellationToken::new(), &recipes, &HostBuilder::linux().build())
                .await,
        );

        assert_eq!(report.len(), 3);
        assert_eq!(report.names(), vec!["no-process", "unsupported", "detected"]);
    }

    #[tokio::test]
    async fn test_empty_recipe_list_succeeds() {
        let fixture = RunnerFixture::new();

        let result = fixture
            .runner
            .evaluate_all(&CancellationToken::new(), &[], &HostBuilder::linux().build())
            .await;

        assert!(result.is_ok());
        assert_callbacks(&fixture.stats, 0, 0);
    }
}

mod host_rules {
    use super::*;

    #[tokio::test]
    async fn test_supported_windows_host_runs_recipes() {
        let fixture = RunnerFixture::new();
        let recipe = RecipeBuilder::new().build();

        let result = fixture
            .runner
            .evaluate_all(
                &CancellationToken::new(),
                &[recipe],
                &HostBuilder::windows("10.0.17763").build(),
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_unidentified_windows_version_rejects_host() {
        let fixture = RunnerFixture::new();
        let recipe = RecipeBuilder::new().build();

        let result = fixture
            .runner
            .evaluate_all(
                &CancellationToken::new(),
                &[recipe],
                &HostBuilder::windows("six.one").build(),
            )
            .await;

        match result {
            Err(FilterError::HostIncompatible { messages }) => {
                assert_eq!(messages, vec![WINDOWS_VERSION_UNIDENTIFIED.to_string()]);
            }
            other => panic!("Expected HostIncompatible, got {:?}", other),
        }
        assert_callbacks(&fixture.stats, 0, 0);
        assert!(fixture.reporter.statuses().is_empty());
    }

    #[test]
    fn test_host_error_message() {
        let err = FilterError::HostIncompatible {
            messages: vec!["first".to_string(), "second".to_string()],
        };
        assert_eq!(err.to_string(), "Host is not supported: first; second");
        assert!(err.report().is_none());
    }
}
