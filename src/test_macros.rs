//! Declarative macros for command tests.
//!
//! Every command takes entity files as positional arguments, so the CLI
//! macros are keyed on a `files:` list. Parsing only checks that the files
//! exist; `Cargo.toml` is a convenient stand-in. Execute macros write real
//! entity JSON to a temp file. Output macros take an `rstest` fixture.

/// Parse `schemagen <command> <argv..>` with the real argument definitions.
#[cfg(test)]
pub(crate) fn parse_command(
    command: &str,
    argv: &[&str],
) -> Result<crate::commands::Command, clap::Error> {
    use clap::Parser;
    let mut full = vec!["schemagen", command];
    full.extend_from_slice(argv);
    crate::cli::Args::try_parse_from(full).map(|args| args.command)
}

/// Assert the fields a command gets when only its files are given.
#[macro_export]
macro_rules! cli_defaults_test {
    (
        command: $cmd:literal,
        variant: $variant:ident,
        files: [$($file:literal),+],
        defaults: { $($field:ident : $expected:expr),* $(,)? } $(,)?
    ) => {
        #[rstest]
        fn test_defaults() {
            let parsed = $crate::test_macros::parse_command($cmd, &[$($file),+])
                .expect(concat!($cmd, " should parse with only files"));
            let $crate::commands::Command::$variant(cmd) = parsed else {
                panic!(concat!("parsed into the wrong command, wanted ", stringify!($variant)));
            };
            $(
                assert_eq!(cmd.$field, $expected, concat!("default of --", stringify!($field)));
            )*
        }
    };
}

/// Assert one field after parsing files plus extra flags.
#[macro_export]
macro_rules! cli_option_test {
    (
        command: $cmd:literal,
        variant: $variant:ident,
        test_name: $test_name:ident,
        files: [$($file:literal),+],
        args: [$($arg:literal),*],
        field: $field:ident,
        expected: $expected:expr $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            let parsed = $crate::test_macros::parse_command($cmd, &[$($file,)+ $($arg),*])
                .expect("arguments should parse");
            let $crate::commands::Command::$variant(cmd) = parsed else {
                panic!(concat!("parsed into the wrong command, wanted ", stringify!($variant)));
            };
            assert_eq!(cmd.$field, $expected, concat!("value of ", stringify!($field)));
        }
    };
}

/// Assert that a command refuses to run without its file argument and
/// names the placeholder in the error.
#[macro_export]
macro_rules! cli_missing_files_test {
    (
        command: $cmd:literal,
        test_name: $test_name:ident,
        placeholder: $placeholder:literal $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            let err = $crate::test_macros::parse_command($cmd, &[])
                .expect_err(concat!($cmd, " without files should not parse"));
            assert!(
                err.to_string().contains($placeholder),
                "error should name {}: {}",
                $placeholder,
                err
            );
        }
    };
}

/// Assert that an argument list is rejected.
#[macro_export]
macro_rules! cli_error_test {
    (
        command: $cmd:literal,
        test_name: $test_name:ident,
        args: [$($arg:literal),+] $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            assert!($crate::test_macros::parse_command($cmd, &[$($arg),+]).is_err());
        }
    };
}

// =============================================================================
// Execute Test Macros
// =============================================================================

/// Write entity JSON to a temp file, build a command from its path, run it
/// with the default config and hand the result to `check`.
///
/// ```ignore
/// execute_file_test! {
///     test_name: test_compiles_user,
///     json: USER_JSON,
///     cmd: |path| TableCmd { file: path, entity: None, dialect: None, flavor: None },
///     check: |result| { assert_eq!(result.table, "user"); },
/// }
/// ```
#[macro_export]
macro_rules! execute_file_test {
    (
        test_name: $test_name:ident,
        json: $json:expr,
        cmd: |$path:ident| $cmd:expr,
        check: |$result:ident| $body:block $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            let file = $crate::test_utils::create_temp_json_file($json);
            let $path = file.path().to_path_buf();
            let $result = $crate::test_utils::execute_cmd($cmd).expect("Command should succeed");
            $body
        }
    };
}

/// Like `execute_file_test!`, but the command must fail with a message
/// containing `error_contains`.
#[macro_export]
macro_rules! execute_error_test {
    (
        test_name: $test_name:ident,
        json: $json:expr,
        cmd: |$path:ident| $cmd:expr,
        error_contains: $needle:literal $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            let file = $crate::test_utils::create_temp_json_file($json);
            let $path = file.path().to_path_buf();
            let err = $crate::test_utils::execute_cmd($cmd).expect_err("Command should fail");
            assert!(
                err.to_string().contains($needle),
                "Error '{}' should contain '{}'",
                err,
                $needle
            );
        }
    };
}

// =============================================================================
// Output Test Macros
// =============================================================================

/// Compare the rendering of a fixture with an expected string. Without
/// `format:` the human-readable form is used.
#[macro_export]
macro_rules! output_table_test {
    (
        test_name: $test_name:ident,
        fixture: $fixture:ident,
        fixture_type: $fixture_type:ty,
        expected: $expected:expr,
        format: $format:ident $(,)?
    ) => {
        #[rstest]
        fn $test_name($fixture: $fixture_type) {
            use $crate::output::{OutputFormat, Outputable};
            assert_eq!($fixture.format(OutputFormat::$format), $expected);
        }
    };
    (
        test_name: $test_name:ident,
        fixture: $fixture:ident,
        fixture_type: $fixture_type:ty,
        expected: $expected:expr $(,)?
    ) => {
        $crate::output_table_test! {
            test_name: $test_name,
            fixture: $fixture,
            fixture_type: $fixture_type,
            expected: $expected,
            format: Table,
        }
    };
}

/// Check the human-readable form for substrings when the exact text would
/// make the test brittle.
#[macro_export]
macro_rules! output_table_contains_test {
    (
        test_name: $test_name:ident,
        fixture: $fixture:ident,
        fixture_type: $fixture_type:ty,
        contains: [$($needle:literal),* $(,)?] $(,)?
    ) => {
        #[rstest]
        fn $test_name($fixture: $fixture_type) {
            use $crate::output::Outputable;
            let rendered = $fixture.to_table();
            $(
                assert!(rendered.contains($needle), "missing {:?} in:\n{}", $needle, rendered);
            )*
        }
    };
}

/// Parse the JSON rendering and compare top-level fields.
///
/// ```ignore
/// output_json_test! {
///     test_name: test_format_json,
///     fixture: user_result,
///     fixture_type: TableResult,
///     assertions: { "table": "user", "dialect": "sql" },
/// }
/// ```
#[macro_export]
macro_rules! output_json_test {
    (
        test_name: $test_name:ident,
        fixture: $fixture:ident,
        fixture_type: $fixture_type:ty,
        assertions: { $($field:literal : $expected:expr),* $(,)? } $(,)?
    ) => {
        #[rstest]
        fn $test_name($fixture: $fixture_type) {
            use $crate::output::{OutputFormat, Outputable};
            let json: serde_json::Value =
                serde_json::from_str(&$fixture.format(OutputFormat::Json))
                    .expect("JSON output should parse");
            $(
                assert_eq!(json[$field], $expected, concat!("JSON field ", $field));
            )*
        }
    };
}

/// Check the toon rendering for substrings.
#[macro_export]
macro_rules! output_toon_test {
    (
        test_name: $test_name:ident,
        fixture: $fixture:ident,
        fixture_type: $fixture_type:ty,
        contains: [$($needle:literal),* $(,)?] $(,)?
    ) => {
        #[rstest]
        fn $test_name($fixture: $fixture_type) {
            use $crate::output::{OutputFormat, Outputable};
            let rendered = $fixture.format(OutputFormat::Toon);
            $(
                assert!(rendered.contains($needle), "missing {:?} in:\n{}", $needle, rendered);
            )*
        }
    };
}
