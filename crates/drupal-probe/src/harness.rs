//! Test harness for running test suites.
//!
//! Tests run one after another. Every registered [`TestModule`] gets its
//! lifecycle hooks around each test and around the whole suite, which is
//! where entity cleanup and watchdog checks happen.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::result::{ProbeError, ProbeResult};

/// Lifecycle hooks of a suite module. Every hook defaults to a no-op.
pub trait TestModule {
    /// Name used in logs and hook failure messages
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called once before the first test
    fn before_suite(&mut self) -> ProbeResult<()> {
        Ok(())
    }

    /// Called before each test
    fn before(&mut self, _test: &str) -> ProbeResult<()> {
        Ok(())
    }

    /// Called after each test, whether it passed or not
    fn after(&mut self, _test: &str) -> ProbeResult<()> {
        Ok(())
    }

    /// Called after a failed test, before [`after`](Self::after)
    fn failed(&mut self, _test: &str, _error: &ProbeError) -> ProbeResult<()> {
        Ok(())
    }

    /// Called once after the last test
    fn after_suite(&mut self) -> ProbeResult<()> {
        Ok(())
    }
}

impl<T: TestModule> TestModule for Rc<RefCell<T>> {
    fn name(&self) -> &str {
        std::any::type_name::<T>()
    }

    fn before_suite(&mut self) -> ProbeResult<()> {
        self.borrow_mut().before_suite()
    }

    fn before(&mut self, test: &str) -> ProbeResult<()> {
        self.borrow_mut().before(test)
    }

    fn after(&mut self, test: &str) -> ProbeResult<()> {
        self.borrow_mut().after(test)
    }

    fn failed(&mut self, test: &str, error: &ProbeError) -> ProbeResult<()> {
        self.borrow_mut().failed(test, error)
    }

    fn after_suite(&mut self) -> ProbeResult<()> {
        self.borrow_mut().after_suite()
    }
}

type TestBody = Box<dyn FnMut() -> ProbeResult<()>>;

/// A single test case
pub struct TestCase {
    /// Test name
    pub name: String,
    body: TestBody,
}

impl TestCase {
    /// Create a new test case
    #[must_use]
    pub fn new(name: impl Into<String>, body: impl FnMut() -> ProbeResult<()> + 'static) -> Self {
        Self {
            name: name.into(),
            body: Box::new(body),
        }
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase").field("name", &self.name).finish_non_exhaustive()
    }
}

/// A test suite containing multiple tests
#[derive(Debug)]
pub struct TestSuite {
    /// Suite name
    pub name: String,
    /// Tests in this suite
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    /// Create a new test suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: Vec::new(),
        }
    }

    /// Add a test case
    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    /// Add a test from a closure
    #[must_use]
    pub fn with_test(
        mut self,
        name: impl Into<String>,
        body: impl FnMut() -> ProbeResult<()> + 'static,
    ) -> Self {
        self.add_test(TestCase::new(name, body));
        self
    }

    /// Get the number of tests
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.tests.len()
    }
}

/// Result of running a single test
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test name
    pub name: String,
    /// Whether test passed
    pub passed: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// Test duration
    pub duration: Duration,
}

impl TestResult {
    /// Create a passing test result
    #[must_use]
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            error: None,
            duration: Duration::ZERO,
        }
    }

    /// Create a failing test result
    #[must_use]
    pub fn fail(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            error: Some(error.into()),
            duration: Duration::ZERO,
        }
    }

    /// Set duration
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Results from running a test suite
#[derive(Debug, Clone)]
pub struct SuiteResults {
    /// Suite name
    pub suite_name: String,
    /// Individual test results
    pub results: Vec<TestResult>,
    /// Failures of suite-level hooks
    pub suite_errors: Vec<String>,
    /// Total duration
    pub duration: Duration,
}

impl SuiteResults {
    /// Check if all tests and suite hooks passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.suite_errors.is_empty() && self.results.iter().all(|r| r.passed)
    }

    /// Count passed tests
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Count failed tests
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    /// Get total test count
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Get failed tests
    #[must_use]
    pub fn failures(&self) -> Vec<&TestResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }
}

fn hook_error(module: &dyn TestModule, hook: &str, error: &ProbeError) -> String {
    format!("{} {hook}: {error}", module.name())
}

/// Test harness for running suites
#[derive(Debug, Default)]
pub struct TestHarness {
    /// Whether to stop on first failure
    pub fail_fast: bool,
}

impl TestHarness {
    /// Create a new test harness
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable fail-fast mode
    #[must_use]
    pub const fn with_fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    /// Run a test suite with the given modules
    pub fn run(&self, suite: &mut TestSuite, modules: &mut [&mut dyn TestModule]) -> SuiteResults {
        let start = Instant::now();
        let mut results = Vec::with_capacity(suite.tests.len());
        let mut suite_errors = Vec::new();

        tracing::info!(suite = %suite.name, tests = suite.tests.len(), "running suite");

        for module in modules.iter_mut() {
            if let Err(e) = module.before_suite() {
                suite_errors.push(hook_error(&**module, "before_suite", &e));
            }
        }

        if suite_errors.is_empty() {
            for test in &mut suite.tests {
                let result = Self::run_test(test, modules);
                let failed = !result.passed;
                results.push(result);
                if failed && self.fail_fast {
                    tracing::warn!(test = %test.name, "stopping after first failure");
                    break;
                }
            }
        } else {
            for test in &suite.tests {
                results.push(TestResult::fail(&test.name, "suite setup failed"));
            }
        }

        for module in modules.iter_mut() {
            if let Err(e) = module.after_suite() {
                suite_errors.push(hook_error(&**module, "after_suite", &e));
            }
        }

        SuiteResults {
            suite_name: suite.name.clone(),
            results,
            suite_errors,
            duration: start.elapsed(),
        }
    }

    fn run_test(test: &mut TestCase, modules: &mut [&mut dyn TestModule]) -> TestResult {
        let start = Instant::now();
        let mut errors = Vec::new();

        let mut outcome = Ok(());
        for module in modules.iter_mut() {
            if let Err(e) = module.before(&test.name) {
                errors.push(hook_error(&**module, "before", &e));
                outcome = Err(e);
                break;
            }
        }
        if outcome.is_ok() {
            outcome = (test.body)();
            if let Err(e) = &outcome {
                errors.push(e.to_string());
            }
        }

        if let Err(e) = &outcome {
            tracing::debug!(test = %test.name, error = %e, "test failed");
            for module in modules.iter_mut() {
                if let Err(hook) = module.failed(&test.name, e) {
                    errors.push(hook_error(&**module, "failed", &hook));
                }
            }
        }
        for module in modules.iter_mut() {
            if let Err(e) = module.after(&test.name) {
                errors.push(hook_error(&**module, "after", &e));
            }
        }

        let result = if errors.is_empty() {
            TestResult::pass(&test.name)
        } else {
            TestResult::fail(&test.name, errors.join("\n"))
        };
        result.with_duration(start.elapsed())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        calls: Vec<String>,
        fail_after: bool,
    }

    impl TestModule for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn before_suite(&mut self) -> ProbeResult<()> {
            self.calls.push("before_suite".into());
            Ok(())
        }

        fn before(&mut self, test: &str) -> ProbeResult<()> {
            self.calls.push(format!("before:{test}"));
            Ok(())
        }

        fn after(&mut self, test: &str) -> ProbeResult<()> {
            self.calls.push(format!("after:{test}"));
            if self.fail_after {
                Err(ProbeError::assertion("dirty"))
            } else {
                Ok(())
            }
        }

        fn failed(&mut self, test: &str, _error: &ProbeError) -> ProbeResult<()> {
            self.calls.push(format!("failed:{test}"));
            Ok(())
        }

        fn after_suite(&mut self) -> ProbeResult<()> {
            self.calls.push("after_suite".into());
            Ok(())
        }
    }

    mod suite_tests {
        use super::*;

        #[test]
        fn test_suite_creation() {
            let suite = TestSuite::new("forms").with_test("a", || Ok(()));
            assert_eq!(suite.name, "forms");
            assert_eq!(suite.test_count(), 1);
        }

        #[test]
        fn test_test_case_debug_omits_body() {
            let case = TestCase::new("a", || Ok(()));
            assert!(format!("{case:?}").contains("\"a\""));
        }
    }

    mod result_tests {
        use super::*;

        #[test]
        fn test_pass_and_fail() {
            assert!(TestResult::pass("a").passed);
            let fail = TestResult::fail("b", "boom");
            assert!(!fail.passed);
            assert_eq!(fail.error.as_deref(), Some("boom"));
        }
    }

    mod harness_tests {
        use super::*;

        #[test]
        fn test_hook_order_for_passing_and_failing_tests() {
            let mut suite = TestSuite::new("s")
                .with_test("ok", || Ok(()))
                .with_test("bad", || Err(ProbeError::assertion("nope")));
            let mut recorder = Recorder::default();
            let results = TestHarness::new().run(&mut suite, &mut [&mut recorder]);

            assert_eq!(results.passed_count(), 1);
            assert_eq!(results.failed_count(), 1);
            assert_eq!(
                recorder.calls,
                vec![
                    "before_suite",
                    "before:ok",
                    "after:ok",
                    "before:bad",
                    "failed:bad",
                    "after:bad",
                    "after_suite",
                ]
            );
        }

        #[test]
        fn test_after_hook_failure_fails_test() {
            let mut suite = TestSuite::new("s").with_test("ok", || Ok(()));
            let mut recorder = Recorder {
                fail_after: true,
                ..Recorder::default()
            };
            let results = TestHarness::new().run(&mut suite, &mut [&mut recorder]);
            assert!(!results.all_passed());
            assert!(results.failures()[0].error.as_deref().unwrap().contains("recorder after"));
        }

        #[test]
        fn test_fail_fast_still_runs_suite_hooks() {
            let mut suite = TestSuite::new("s")
                .with_test("bad", || Err(ProbeError::assertion("nope")))
                .with_test("never", || Ok(()));
            let mut recorder = Recorder::default();
            let results = TestHarness::new().with_fail_fast().run(&mut suite, &mut [&mut recorder]);
            assert_eq!(results.total(), 1);
            assert_eq!(recorder.calls.last().map(String::as_str), Some("after_suite"));
        }

        #[test]
        fn test_shared_module_through_rc() {
            let shared = Rc::new(RefCell::new(Recorder::default()));
            let mut handle = Rc::clone(&shared);
            let mut suite = TestSuite::new("s").with_test("ok", || Ok(()));
            let _ = TestHarness::new().run(&mut suite, &mut [&mut handle]);
            assert_eq!(shared.borrow().calls.len(), 4);
        }
    }
}
