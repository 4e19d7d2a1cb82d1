use farm_client_core::{GuardDecision, RoleGuard};
use rstest::rstest;

use crate::helpers::TestContext;

#[rstest]
#[case::session_only(RoleGuard::new())]
#[case::section(RoleGuard::section("livestock"))]
#[case::section_and_action(RoleGuard::section("reports").action("export"))]
fn no_session_always_falls_back(#[case] guard: RoleGuard) {
    let test_context = TestContext::new();

    assert_eq!(guard.decide(&test_context.context), GuardDecision::Fallback);
    assert_eq!(guard.render_or_nothing(&test_context.context, || "content"), None);
}

#[rstest]
#[case::session_only(RoleGuard::new(), true)]
#[case::allowed_section(RoleGuard::section("livestock"), true)]
#[case::allowed_action(RoleGuard::section("livestock").action("view"), true)]
#[case::denied_action(RoleGuard::section("livestock").action("delete"), false)]
#[case::denied_section(RoleGuard::section("finances"), false)]
#[case::action_without_section_access(RoleGuard::section("finances").action("view"), false)]
#[tokio::test]
async fn standard_user(#[case] guard: RoleGuard, #[case] expected_render: bool) {
    // Arrange
    let test_context = TestContext::new();
    test_context.login_standard().await;

    // Act
    let actual = guard.render(&test_context.context, || "content", || "fallback");

    // Assert
    let expected = if expected_render { "content" } else { "fallback" };
    assert_eq!(actual, expected);
    assert_eq!(
        guard.decide(&test_context.context).is_render(),
        expected_render
    );
}

#[rstest]
#[case::users(RoleGuard::section("users"))]
#[case::export(RoleGuard::section("reports").action("export"))]
#[case::unlisted(RoleGuard::section("weather").action("forecast"))]
#[tokio::test]
async fn admin_sees_everything(#[case] guard: RoleGuard) {
    let test_context = TestContext::new();
    test_context.login_admin().await;

    assert_eq!(guard.render_or_nothing(&test_context.context, || 42), Some(42));
}

#[tokio::test]
async fn guard_follows_session_changes() {
    let test_context = TestContext::new();
    let guard = RoleGuard::section("dashboard");
    assert!(!guard.decide(&test_context.context).is_render());

    test_context.login_standard().await;
    assert!(guard.decide(&test_context.context).is_render());

    test_context.context.logout();
    assert!(!guard.decide(&test_context.context).is_render());
}
