//! CLI parsing tests for migrate command using the test DSL.

#[cfg(test)]
mod tests {
    use crate::schema::SqlFlavor;
    use rstest::rstest;
    use std::path::PathBuf;

    crate::cli_missing_files_test! {
        command: "migrate",
        test_name: test_migrate_requires_files,
        placeholder: "<FILES>",
    }

    crate::cli_error_test! {
        command: "migrate",
        test_name: test_migrate_files_must_exist,
        args: ["missing.json", "--version", "v2"],
    }

    crate::cli_defaults_test! {
        command: "migrate",
        variant: Migrate,
        files: ["Cargo.toml"],
        defaults: {
            version: None,
            flavor: None,
            out_dir: None,
        },
    }

    crate::cli_option_test! {
        command: "migrate",
        variant: Migrate,
        test_name: test_migrate_with_version,
        files: ["Cargo.toml"],
        args: ["-v", "2024_06_01"],
        field: version,
        expected: Some("2024_06_01".to_string()),
    }

    crate::cli_option_test! {
        command: "migrate",
        variant: Migrate,
        test_name: test_migrate_with_out_dir,
        files: ["Cargo.toml"],
        args: ["--out-dir", "migrations"],
        field: out_dir,
        expected: Some(PathBuf::from("migrations")),
    }

    crate::cli_option_test! {
        command: "migrate",
        variant: Migrate,
        test_name: test_migrate_with_flavor,
        files: ["Cargo.toml"],
        args: ["--flavor", "mysql"],
        field: flavor,
        expected: Some(SqlFlavor::MySql),
    }
}
