//! CLI parsing tests for schema command using the test DSL.

#[cfg(test)]
mod tests {
    use crate::schema::{Dialect, SqlFlavor};
    use rstest::rstest;
    use std::path::PathBuf;

    crate::cli_missing_files_test! {
        command: "schema",
        test_name: test_schema_requires_files,
        placeholder: "<FILES>",
    }

    crate::cli_error_test! {
        command: "schema",
        test_name: test_schema_files_must_exist,
        args: ["Cargo.toml", "missing_b.json"],
    }

    crate::cli_defaults_test! {
        command: "schema",
        variant: Schema,
        files: ["Cargo.toml"],
        defaults: {
            dialect: None,
            flavor: None,
        },
    }

    crate::cli_option_test! {
        command: "schema",
        variant: Schema,
        test_name: test_schema_accepts_several_files,
        files: ["Cargo.toml", "src/lib.rs"],
        args: [],
        field: files,
        expected: vec![PathBuf::from("Cargo.toml"), PathBuf::from("src/lib.rs")],
    }

    crate::cli_option_test! {
        command: "schema",
        variant: Schema,
        test_name: test_schema_with_dialect,
        files: ["Cargo.toml"],
        args: ["-d", "seaorm"],
        field: dialect,
        expected: Some(Dialect::SeaOrm),
    }

    crate::cli_option_test! {
        command: "schema",
        variant: Schema,
        test_name: test_schema_with_flavor,
        files: ["Cargo.toml"],
        args: ["-f", "mysql"],
        field: flavor,
        expected: Some(SqlFlavor::MySql),
    }
}
